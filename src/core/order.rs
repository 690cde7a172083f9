//! Order business logic.
//!
//! Orders are written by the checkout bridge and afterwards only touched from the admin
//! console: status changes and deletion. Status changes are unrestricted, any status
//! may follow any other, including reopening delivered or cancelled orders.

use crate::{
    entities::{Order, OrderStatus, order},
    errors::{Error, Result},
    store::{Collection, RemoteStore},
};
use sea_orm::{ActiveValue::Unchanged, Set, prelude::*};
use tracing::info;

/// Looks up the order recorded for a provider payment.
pub async fn find_by_payment_id(
    store: &RemoteStore,
    payment_id: &str,
) -> Result<Option<order::Model>> {
    Order::find()
        .filter(order::Column::PaymentId.eq(payment_id))
        .one(store.db())
        .await
        .map_err(Into::into)
}

/// Sets an order's status.
///
/// # Errors
/// - [`Error::OrderNotFound`] if no order has this id
/// - [`Error::RemoteWrite`] if the update fails
pub async fn set_order_status(
    store: &RemoteStore,
    order_id: i64,
    status: OrderStatus,
) -> Result<order::Model> {
    if Order::find_by_id(order_id).one(store.db()).await?.is_none() {
        return Err(Error::OrderNotFound { id: order_id });
    }

    let updated = order::ActiveModel {
        id: Unchanged(order_id),
        status: Set(status),
        ..Default::default()
    }
    .update(store.db())
    .await
    .map_err(|e| Error::remote_write(Collection::Orders, e))?;

    info!(order_id, %status, "Order status changed");
    store.publish_after_write(Collection::Orders).await;
    Ok(updated)
}

/// Deletes an order.
///
/// # Errors
/// - [`Error::OrderNotFound`] if no order has this id
/// - [`Error::RemoteWrite`] if the delete fails
pub async fn delete_order(store: &RemoteStore, order_id: i64) -> Result<()> {
    let result = Order::delete_by_id(order_id)
        .exec(store.db())
        .await
        .map_err(|e| Error::remote_write(Collection::Orders, e))?;
    if result.rows_affected == 0 {
        return Err(Error::OrderNotFound { id: order_id });
    }
    info!(order_id, "Deleted order");
    store.publish_after_write(Collection::Orders).await;
    Ok(())
}
