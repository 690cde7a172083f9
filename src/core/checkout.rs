//! Checkout bridge between the cart and the payment provider.
//!
//! One attempt runs `Idle -> OrderCreated -> Captured -> Persisted`, or ends in `Failed`.
//! The cart is cleared only after the order record is written. If the write fails the
//! money is already captured, which is reported as [`Error::PostPaymentPersist`] and
//! leaves the cart intact.

use crate::{
    core::{activity, cart::CartStore, order::find_by_payment_id},
    entities::{OrderStatus, order, order::OrderItems, order::ShippingColumn, user},
    errors::{Error, Result},
    models::ShippingAddress,
    store::{Collection, RemoteStore},
};
use chrono::NaiveDateTime;
use sea_orm::{ActiveModelTrait, Set};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

/// Amount and currency sent to the provider when an order is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Amount with exactly two decimals, e.g. `"20.00"`
    pub amount: String,
    /// ISO currency code
    pub currency: String,
}

/// Postal address reported by the provider for the payer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayerAddress {
    /// First address line
    pub address_line_1: Option<String>,
    /// City
    pub admin_area_2: Option<String>,
    /// State / region
    pub admin_area_1: Option<String>,
    /// Postal code
    pub postal_code: Option<String>,
    /// Country code
    pub country_code: Option<String>,
}

impl From<PayerAddress> for ShippingAddress {
    fn from(address: PayerAddress) -> Self {
        Self {
            street: address.address_line_1,
            city: address.admin_area_2,
            state: address.admin_area_1,
            postal_code: address.postal_code,
            country: address.country_code,
        }
    }
}

/// Payer as reported in the capture response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payer {
    /// Given name
    pub given_name: String,
    /// Surname
    pub surname: Option<String>,
    /// Email
    pub email: Option<String>,
    /// Address, when the provider collected one
    pub address: Option<PayerAddress>,
}

/// Capture response delivered with the approval callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureDetails {
    /// Provider order/payment identifier
    pub provider_order_id: String,
    /// Who paid
    pub payer: Payer,
}

/// Third-party payment widget.
pub trait PaymentProvider {
    /// Creates a provider-side order and returns its identifier.
    fn create_order(&self, request: &PaymentRequest) -> impl Future<Output = Result<String>> + Send;
}

/// Where the current checkout attempt stands.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutState {
    /// No attempt in progress
    Idle,
    /// The provider accepted an order for `total`
    OrderCreated {
        /// Provider identifier
        provider_order_id: String,
        /// Amount sent to the provider
        total: f64,
    },
    /// The provider reported a capture; the order is being written
    Captured {
        /// Provider identifier
        provider_order_id: String,
    },
    /// The order record exists and the cart was cleared
    Persisted {
        /// Stored order id
        order_id: i64,
    },
    /// The attempt failed
    Failed {
        /// Why
        reason: String,
        /// Payment was taken but no order was written
        needs_reconciliation: bool,
    },
}

/// Runs checkout attempts for one shopper.
#[derive(Debug)]
pub struct CheckoutBridge {
    currency: String,
    retry_delay: Duration,
    state: CheckoutState,
}

impl CheckoutBridge {
    /// New bridge in `Idle`.
    pub fn new(currency: impl Into<String>, retry_delay: Duration) -> Self {
        Self {
            currency: currency.into(),
            retry_delay,
            state: CheckoutState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Asks the provider to create an order for `cart_total`.
    ///
    /// # Errors
    /// - [`Error::InvalidAmount`] when the total is zero, negative or not finite; the
    ///   provider is not contacted
    /// - [`Error::PaymentCapture`] when the provider rejects the order
    pub async fn create_order<P: PaymentProvider>(
        &mut self,
        provider: &P,
        cart_total: f64,
    ) -> Result<String> {
        if cart_total <= 0.0 || !cart_total.is_finite() {
            return Err(Error::InvalidAmount { amount: cart_total });
        }
        let request = PaymentRequest {
            amount: format!("{cart_total:.2}"),
            currency: self.currency.clone(),
        };
        match provider.create_order(&request).await {
            Ok(provider_order_id) => {
                info!(%provider_order_id, amount = %request.amount, "Payment order created");
                self.state = CheckoutState::OrderCreated {
                    provider_order_id: provider_order_id.clone(),
                    total: cart_total,
                };
                Ok(provider_order_id)
            }
            Err(e) => {
                let reason = e.to_string();
                self.state = CheckoutState::Failed {
                    reason: reason.clone(),
                    needs_reconciliation: false,
                };
                Err(Error::PaymentCapture { message: reason })
            }
        }
    }

    /// Records the order for an approved payment, then clears the cart.
    ///
    /// A repeated approval for a payment that already has an order returns that order
    /// and writes nothing new.
    ///
    /// # Errors
    /// [`Error::PostPaymentPersist`] if the order cannot be written. The cart is kept.
    pub async fn on_approve(
        &mut self,
        store: &RemoteStore,
        cart: &mut CartStore,
        customer: &user::Model,
        capture: CaptureDetails,
        now: NaiveDateTime,
    ) -> Result<order::Model> {
        let payment_id = capture.provider_order_id.clone();
        let total = match &self.state {
            CheckoutState::OrderCreated {
                provider_order_id,
                total,
            } if *provider_order_id == payment_id => *total,
            _ => cart.totals().amount,
        };
        self.state = CheckoutState::Captured {
            provider_order_id: payment_id.clone(),
        };

        match persist_order(store, cart, customer, capture, total, now).await {
            Ok((order, created)) => {
                if created {
                    cart.clear();
                    if let Err(e) =
                        activity::record_purchase(store, customer, &order.items.0, total, now).await
                    {
                        warn!(order_id = order.id, "Failed to log purchase activity: {e}");
                    }
                } else {
                    warn!(%payment_id, order_id = order.id, "Duplicate approval ignored");
                }
                self.state = CheckoutState::Persisted { order_id: order.id };
                Ok(order)
            }
            Err(source) => {
                error!(%payment_id, "Payment captured but order not recorded: {source}");
                self.state = CheckoutState::Failed {
                    reason: source.to_string(),
                    needs_reconciliation: true,
                };
                Err(Error::PostPaymentPersist {
                    payment_id,
                    source: Box::new(source),
                })
            }
        }
    }

    /// Handles a provider error. The cart is untouched; returns how long to wait before
    /// offering the payment button again.
    pub fn on_error(&mut self, message: &str) -> Duration {
        warn!("Payment provider error: {message}");
        self.state = CheckoutState::Failed {
            reason: message.to_string(),
            needs_reconciliation: false,
        };
        self.retry_delay
    }

    /// Handles the shopper cancelling the payment. The cart is untouched.
    pub fn on_cancel(&mut self) {
        info!("Payment cancelled");
        self.state = CheckoutState::Idle;
    }
}

async fn persist_order(
    store: &RemoteStore,
    cart: &CartStore,
    customer: &user::Model,
    capture: CaptureDetails,
    total: f64,
    now: NaiveDateTime,
) -> Result<(order::Model, bool)> {
    if let Some(existing) = find_by_payment_id(store, &capture.provider_order_id).await? {
        return Ok((existing, false));
    }

    let order = order::ActiveModel {
        customer_id: Set(customer.id),
        customer_name: Set(customer.name.clone()),
        customer_email: Set(customer.email.clone()),
        customer_phone: Set(customer.phone.clone()),
        items: Set(OrderItems(cart.items().to_vec())),
        total: Set(total),
        status: Set(OrderStatus::Pending),
        payment_id: Set(capture.provider_order_id),
        shipping_address: Set(capture
            .payer
            .address
            .map(|a| ShippingColumn(ShippingAddress::from(a)))),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(store.db())
    .await
    .map_err(|e| Error::remote_write(Collection::Orders, e))?;

    info!(order_id = order.id, total, "Order recorded");
    store.publish_after_write(Collection::Orders).await;
    Ok((order, true))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::models::CartKey;
    use crate::storage::{LocalStorage, MemoryStorage};
    use crate::test_utils::{ScriptedProvider, at, capture, create_test_user, product_model, setup_test_store};
    use sea_orm::ConnectionTrait;
    use std::sync::Arc;

    fn cart_with_one_line() -> CartStore {
        let storage: Arc<dyn LocalStorage> = Arc::new(MemoryStorage::new());
        let mut cart = CartStore::load(storage);
        cart.add_item(&product_model(1, "Runner", "shoes", 10.0), "42", "Black", 2);
        cart
    }

    fn bridge() -> CheckoutBridge {
        CheckoutBridge::new("USD", Duration::from_millis(1000))
    }

    #[tokio::test]
    async fn test_create_order_formats_amount() -> Result<()> {
        let provider = ScriptedProvider::approving("pay-1");
        let mut bridge = bridge();

        let id = bridge.create_order(&provider, 20.0).await?;

        assert_eq!(id, "pay-1");
        assert_eq!(
            provider.requests(),
            vec![PaymentRequest {
                amount: "20.00".into(),
                currency: "USD".into()
            }]
        );
        assert!(matches!(bridge.state(), CheckoutState::OrderCreated { total, .. } if *total == 20.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_cart_never_reaches_provider() {
        let provider = ScriptedProvider::approving("pay-1");
        let mut bridge = bridge();

        let result = bridge.create_order(&provider, 0.0).await;

        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        assert!(provider.requests().is_empty());
        assert_eq!(bridge.state(), &CheckoutState::Idle);
    }

    #[tokio::test]
    async fn test_provider_rejection_is_payment_error() {
        let provider = ScriptedProvider::failing("card declined");
        let mut bridge = bridge();

        let result = bridge.create_order(&provider, 5.0).await;

        assert!(matches!(result, Err(Error::PaymentCapture { .. })));
        assert!(matches!(
            bridge.state(),
            CheckoutState::Failed { needs_reconciliation: false, .. }
        ));
    }

    #[tokio::test]
    async fn test_approval_records_order_then_clears_cart() -> Result<()> {
        let store = setup_test_store().await?;
        let customer = create_test_user(&store, "Alice").await?;
        let mut cart = cart_with_one_line();
        let frozen = cart.items().to_vec();
        let provider = ScriptedProvider::approving("pay-1");
        let mut bridge = bridge();

        bridge.create_order(&provider, cart.totals().amount).await?;
        let order = bridge
            .on_approve(&store, &mut cart, &customer, capture("pay-1"), at(5))
            .await?;

        assert_eq!(order.total, 20.0);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.0, frozen);
        assert_eq!(order.customer_id, customer.id);
        assert_eq!(order.payment_id, "pay-1");
        assert_eq!(
            order.shipping_address.as_ref().unwrap().0.city.as_deref(),
            Some("Springfield")
        );
        assert!(cart.is_empty());
        assert_eq!(bridge.state(), &CheckoutState::Persisted { order_id: order.id });

        let log = store.activities();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].total, Some(20.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_order_write_keeps_cart_and_needs_reconciliation() -> Result<()> {
        let store = setup_test_store().await?;
        let customer = create_test_user(&store, "Alice").await?;
        let mut cart = cart_with_one_line();
        let provider = ScriptedProvider::approving("pay-1");
        let mut bridge = bridge();
        bridge.create_order(&provider, 20.0).await?;

        store.db().execute_unprepared("DROP TABLE orders").await?;
        let result = bridge
            .on_approve(&store, &mut cart, &customer, capture("pay-1"), at(5))
            .await;

        let err = result.unwrap_err();
        assert!(err.requires_reconciliation());
        assert!(matches!(&err, Error::PostPaymentPersist { payment_id, .. } if payment_id == "pay-1"));
        assert_eq!(cart.items().len(), 1);
        assert!(cart.get(&CartKey::new(1, "42", "Black")).is_some());
        assert!(matches!(
            bridge.state(),
            CheckoutState::Failed { needs_reconciliation: true, .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_repeated_approval_does_not_duplicate_order() -> Result<()> {
        let store = setup_test_store().await?;
        let customer = create_test_user(&store, "Alice").await?;
        let mut cart = cart_with_one_line();
        let provider = ScriptedProvider::approving("pay-1");
        let mut bridge = bridge();
        bridge.create_order(&provider, 20.0).await?;

        let first = bridge
            .on_approve(&store, &mut cart, &customer, capture("pay-1"), at(5))
            .await?;
        cart.add_item(&product_model(2, "Lamp", "home", 5.0), "Small", "Red", 1);
        let second = bridge
            .on_approve(&store, &mut cart, &customer, capture("pay-1"), at(6))
            .await?;

        assert_eq!(first.id, second.id);
        assert_eq!(store.orders().len(), 1);
        assert_eq!(store.activities().len(), 1);
        // The line added after the first approval is not swept away
        assert_eq!(cart.items().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_snapshot_reload_failure_still_clears_cart() -> Result<()> {
        let store = setup_test_store().await?;
        let customer = create_test_user(&store, "Alice").await?;
        let mut cart = cart_with_one_line();
        let provider = ScriptedProvider::approving("pay-1");
        let mut bridge = bridge();
        bridge.create_order(&provider, 20.0).await?;

        // Every real order drags in a row whose items cannot be decoded, so the
        // orders snapshot can no longer be reloaded once the insert commits.
        store
            .db()
            .execute_unprepared(
                "CREATE TRIGGER corrupt_orders AFTER INSERT ON orders \
                 WHEN NEW.payment_id NOT LIKE 'corrupt-%' BEGIN \
                 INSERT INTO orders (customer_id, customer_name, customer_email, customer_phone, \
                 items, total, status, payment_id, created_at) VALUES (NEW.customer_id, 'x', 'x', \
                 'x', 'not json', 0, 'pending', 'corrupt-' || NEW.payment_id, NEW.created_at); END",
            )
            .await?;
        assert!(store.refresh(Collection::Orders).await.is_ok());

        let order = bridge
            .on_approve(&store, &mut cart, &customer, capture("pay-1"), at(5))
            .await?;

        assert!(store.refresh(Collection::Orders).await.is_err());
        assert!(cart.is_empty());
        assert_eq!(bridge.state(), &CheckoutState::Persisted { order_id: order.id });
        let recorded = find_by_payment_id(&store, "pay-1").await?.unwrap();
        assert_eq!(recorded.id, order.id);
        assert_eq!(recorded.total, 20.0);
        Ok(())
    }

    #[test]
    fn test_error_and_cancel_leave_cart_alone() {
        let cart = cart_with_one_line();
        let mut bridge = bridge();

        let delay = bridge.on_error("popup closed by provider");
        assert_eq!(delay, Duration::from_millis(1000));
        bridge.on_cancel();

        assert_eq!(bridge.state(), &CheckoutState::Idle);
        assert_eq!(cart.totals().amount, 20.0);
    }
}
