//! Shopper storefront: catalog, cart, registration and checkout for one device.

use crate::{
    app::{failure_notice, now},
    config::shop::ShopConfig,
    core::{
        activity,
        cart::CartStore,
        catalog::{Catalog, CategoryFilter, Lightbox},
        checkout::{CaptureDetails, CheckoutBridge, CheckoutState, PaymentProvider},
        options::{COLORS, size_options_for},
        session::{Registration, SessionRegistry},
    },
    entities::{CartAction, product},
    errors::{Error, Result},
    models::{CartItem, CartKey, format_price},
    storage::LocalStorage,
    store::RemoteStore,
    view::{CartPanel, Fragment, LightboxView, NoticeLevel, ProductCard, ViewSync},
};
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

/// Something the shopper did.
#[derive(Debug, Clone)]
pub enum Intent {
    /// Add units of a product in a size and colour
    AddToCart {
        /// Product id
        product_id: i64,
        /// Size option
        size: String,
        /// Colour option
        color: String,
        /// Units to add; 0 counts as 1
        quantity: u32,
    },
    /// The +/- controls on a cart line
    SetQuantity {
        /// Line
        key: CartKey,
        /// New quantity; zero or less removes the line
        quantity: i64,
    },
    /// The remove button on a cart line
    RemoveFromCart {
        /// Line
        key: CartKey,
    },
    /// Category button or search box
    Filter {
        /// Category part
        category: CategoryFilter,
        /// Raw search text
        term: String,
    },
    /// Clears the search text, keeping the category
    ClearSearch,
    /// Registration form submitted
    Register(Registration),
    /// Image clicked in the grid
    OpenLightbox {
        /// Product id
        product_id: i64,
        /// Image index
        index: usize,
    },
    /// Next image
    LightboxNext,
    /// Previous image
    LightboxPrev,
    /// Close the viewer
    CloseLightbox,
    /// Payment button clicked
    BeginCheckout,
    /// Provider approved and captured the payment
    PaymentApproved(CaptureDetails),
    /// Provider reported an error
    PaymentFailed(String),
    /// Shopper closed the payment window
    PaymentCancelled,
}

impl Intent {
    const fn name(&self) -> &'static str {
        match self {
            Self::AddToCart { .. } => "add_to_cart",
            Self::SetQuantity { .. } => "set_quantity",
            Self::RemoveFromCart { .. } => "remove_from_cart",
            Self::Filter { .. } => "filter",
            Self::ClearSearch => "clear_search",
            Self::Register(_) => "register",
            Self::OpenLightbox { .. } => "open_lightbox",
            Self::LightboxNext => "lightbox_next",
            Self::LightboxPrev => "lightbox_prev",
            Self::CloseLightbox => "close_lightbox",
            Self::BeginCheckout => "begin_checkout",
            Self::PaymentApproved(_) => "payment_approved",
            Self::PaymentFailed(_) => "payment_failed",
            Self::PaymentCancelled => "payment_cancelled",
        }
    }
}

/// Everything one shopper's device holds, and the view it renders to.
#[derive(Debug)]
pub struct Storefront<P> {
    store: RemoteStore,
    provider: P,
    shop_name: String,
    catalog: Catalog,
    cart: CartStore,
    session: SessionRegistry,
    checkout: CheckoutBridge,
    lightbox: Option<Lightbox>,
    retry_at: Option<Instant>,
    view: ViewSync,
}

impl<P: PaymentProvider> Storefront<P> {
    /// Loads the device's cart and current user from `storage`.
    pub fn new(
        store: RemoteStore,
        storage: Arc<dyn LocalStorage>,
        provider: P,
        shop: &ShopConfig,
        view: ViewSync,
    ) -> Self {
        Self {
            store,
            provider,
            shop_name: shop.name.clone(),
            catalog: Catalog::new(shop.catalog_order),
            cart: CartStore::load(Arc::clone(&storage)),
            session: SessionRegistry::load(storage),
            checkout: CheckoutBridge::new(shop.currency.clone(), shop.payment_retry_delay()),
            lightbox: None,
            retry_at: None,
            view,
        }
    }

    /// The cart.
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// The catalog projection.
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The device's session.
    pub const fn session(&self) -> &SessionRegistry {
        &self.session
    }

    /// Where the current checkout attempt stands.
    pub const fn checkout_state(&self) -> &CheckoutState {
        self.checkout.state()
    }

    /// App load: heartbeat for a known user, then a full render.
    pub async fn start(&mut self, now: NaiveDateTime) {
        self.session.heartbeat(&self.store, now).await;
        let products = self.store.products();
        self.on_products(&products);
        self.render_user();
        self.render_cart();
    }

    /// A new product snapshot arrived.
    pub fn on_products(&mut self, products: &[product::Model]) {
        self.catalog.replace_snapshot(products);
        let gone = self
            .lightbox
            .as_ref()
            .is_some_and(|open| self.catalog.find(open.product_id).is_none());
        if gone {
            debug!("Product removed, closing lightbox");
            self.lightbox = None;
            self.render_lightbox();
        }
        self.render_grid();
    }

    /// Runs one intent. Failures are rendered as notices.
    pub async fn dispatch(&mut self, intent: Intent, now: NaiveDateTime) {
        let name = intent.name();
        debug!(intent = name, "Dispatching");
        if let Err(e) = self.handle(intent, now).await {
            let notice = failure_notice(name, &e);
            self.view.render(notice);
        }
    }

    /// Follows product snapshots and intents until the intent channel closes.
    pub async fn run(mut self, mut intents: mpsc::Receiver<Intent>) {
        let mut products = self.store.subscribe_products();
        self.start(now()).await;
        info!("Storefront started");

        loop {
            tokio::select! {
                biased;
                changed = products.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = products.borrow_and_update().clone();
                    self.on_products(&snapshot);
                }
                () = sleep_until(self.retry_at.unwrap_or_else(Instant::now)), if self.retry_at.is_some() => {
                    self.retry_at = None;
                    self.render_cart();
                }
                intent = intents.recv() => match intent {
                    Some(intent) => self.dispatch(intent, now()).await,
                    None => break,
                },
            }
        }

        info!("Storefront closed");
        self.view.detach();
    }

    async fn handle(&mut self, intent: Intent, now: NaiveDateTime) -> Result<()> {
        match intent {
            Intent::AddToCart {
                product_id,
                size,
                color,
                quantity,
            } => self.add_to_cart(product_id, &size, &color, quantity, now).await,
            Intent::SetQuantity { key, quantity } => {
                let removed = self.cart.set_quantity(&key, quantity);
                self.render_cart();
                if let Some(line) = removed {
                    let quantity = line.quantity;
                    self.log_line(CartAction::Remove, &line, quantity, now).await;
                }
                Ok(())
            }
            Intent::RemoveFromCart { key } => {
                let removed = self.cart.remove_item(&key);
                self.render_cart();
                if let Some(line) = removed {
                    let quantity = line.quantity;
                    self.log_line(CartAction::Remove, &line, quantity, now).await;
                }
                Ok(())
            }
            Intent::Filter { category, term } => {
                self.catalog.apply_filter(category, &term);
                self.render_grid();
                Ok(())
            }
            Intent::ClearSearch => {
                self.catalog.clear_search();
                self.render_grid();
                Ok(())
            }
            Intent::Register(form) => {
                let user = self.session.register(&self.store, &form, now).await?;
                self.render_user();
                self.view.render(Fragment::notice(
                    NoticeLevel::Info,
                    format!("Welcome, {}!", user.name),
                ));
                Ok(())
            }
            Intent::OpenLightbox { product_id, index } => {
                let product = self
                    .catalog
                    .find(product_id)
                    .ok_or(Error::ProductNotFound { id: product_id })?;
                self.lightbox = Lightbox::open(product, index);
                self.render_lightbox();
                Ok(())
            }
            Intent::LightboxNext => {
                if let Some(lightbox) = self.lightbox.as_mut() {
                    lightbox.next();
                }
                self.render_lightbox();
                Ok(())
            }
            Intent::LightboxPrev => {
                if let Some(lightbox) = self.lightbox.as_mut() {
                    lightbox.prev();
                }
                self.render_lightbox();
                Ok(())
            }
            Intent::CloseLightbox => {
                self.lightbox = None;
                self.render_lightbox();
                Ok(())
            }
            Intent::BeginCheckout => self.begin_checkout().await,
            Intent::PaymentApproved(capture) => self.complete_checkout(capture, now).await,
            Intent::PaymentFailed(message) => {
                let delay = self.checkout.on_error(&message);
                self.schedule_retry(delay);
                Err(Error::PaymentCapture { message })
            }
            Intent::PaymentCancelled => {
                self.checkout.on_cancel();
                self.view
                    .render(Fragment::notice(NoticeLevel::Info, "Payment cancelled"));
                Ok(())
            }
        }
    }

    async fn add_to_cart(
        &mut self,
        product_id: i64,
        size: &str,
        color: &str,
        quantity: u32,
        now: NaiveDateTime,
    ) -> Result<()> {
        let product = self
            .catalog
            .find(product_id)
            .cloned()
            .ok_or(Error::ProductNotFound { id: product_id })?;
        let options = size_options_for(&product.category);
        if !options.contains(size) {
            return Err(Error::validation(format!("Please choose a {}", options.label)));
        }
        if !COLORS.contains(&color) {
            return Err(Error::validation("Please choose a colour"));
        }

        let line = self.cart.add_item(&product, size, color, quantity);
        self.render_cart();
        self.view.render(Fragment::notice(
            NoticeLevel::Info,
            format!("{} added to cart", product.name),
        ));
        self.log_line(CartAction::Add, &line, quantity.max(1), now).await;
        Ok(())
    }

    async fn log_line(&self, action: CartAction, line: &CartItem, quantity: u32, now: NaiveDateTime) {
        let Some(user) = self.session.current() else {
            return;
        };
        if let Err(e) = activity::record_line(&self.store, user, action, line, quantity, now).await {
            warn!(user_id = user.id, ?action, "Failed to log cart activity: {e}");
        }
    }

    async fn begin_checkout(&mut self) -> Result<()> {
        if self.session.current().is_none() {
            self.view.render(Fragment::RegistrationPrompt { open: true });
            return Err(Error::validation("Please register before checking out"));
        }
        let amount = self.cart.totals().amount;
        match self.checkout.create_order(&self.provider, amount).await {
            Ok(provider_order_id) => {
                debug!(%provider_order_id, "Awaiting payment approval");
                Ok(())
            }
            Err(e @ Error::PaymentCapture { .. }) => {
                let delay = self.checkout.on_error(&e.to_string());
                self.schedule_retry(delay);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn complete_checkout(&mut self, capture: CaptureDetails, now: NaiveDateTime) -> Result<()> {
        let customer = self
            .session
            .current()
            .cloned()
            .ok_or_else(|| Error::validation("Please register before checking out"))?;
        let result = self
            .checkout
            .on_approve(&self.store, &mut self.cart, &customer, capture, now)
            .await;
        self.render_cart();
        let order = result?;
        self.view.render(Fragment::notice(
            NoticeLevel::Info,
            format!("Thank you {}! Order #{} confirmed.", customer.name, order.id),
        ));
        Ok(())
    }

    fn schedule_retry(&mut self, delay: Duration) {
        self.retry_at = Some(Instant::now() + delay);
        self.view.render(Fragment::PaymentButton(None));
        self.view.render(Fragment::PaymentRetry(delay));
    }

    fn render_grid(&mut self) {
        let cards = self.catalog.visible().iter().map(ProductCard::from_product).collect();
        self.view.render(Fragment::ProductGrid(cards));
    }

    fn render_cart(&mut self) {
        let panel = CartPanel::from_cart(&self.cart);
        let button = (panel.checkout_enabled && self.retry_at.is_none())
            .then(|| format_price(self.cart.totals().amount));
        self.view.render(Fragment::CartPanel(panel));
        self.view.render(Fragment::PaymentButton(button));
    }

    fn render_user(&mut self) {
        let (badge, open) = match self.session.current() {
            Some(user) => (user.name.clone(), false),
            None => (self.shop_name.clone(), true),
        };
        self.view.render(Fragment::UserBadge(badge));
        self.view.render(Fragment::RegistrationPrompt { open });
    }

    fn render_lightbox(&mut self) {
        let view = self.lightbox.as_ref().map(LightboxView::from);
        self.view.render(Fragment::Lightbox(view));
    }
}
