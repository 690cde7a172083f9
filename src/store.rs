//! Remote document store with live snapshots.
//!
//! The store is a SeaORM connection plus one `watch` channel per collection. Every
//! write made through this crate republishes the full contents of the touched
//! collection, so subscribers always see a complete snapshot and never a diff.
//! A receiver obtained late still starts from the latest snapshot.

use crate::entities::{CartActivity, Order, Product, User, cart_activity, order, product, user};
use crate::errors::Result;
use sea_orm::{DatabaseConnection, EntityTrait, Iterable, PrimaryKeyToColumn, QueryOrder};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

/// Full contents of a collection at one point in time.
pub type Snapshot<T> = Arc<Vec<T>>;

/// The named collections in the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Catalog products
    Products,
    /// Registered shoppers
    Users,
    /// Paid orders
    Orders,
    /// Cart activity log
    CartActivities,
}

impl Collection {
    /// Every collection.
    pub const ALL: [Self; 4] = [
        Self::Products,
        Self::Users,
        Self::Orders,
        Self::CartActivities,
    ];
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Products => "products",
            Self::Users => "users",
            Self::Orders => "orders",
            Self::CartActivities => "cart_activities",
        })
    }
}

struct Channels {
    products: watch::Sender<Snapshot<product::Model>>,
    users: watch::Sender<Snapshot<user::Model>>,
    orders: watch::Sender<Snapshot<order::Model>>,
    activities: watch::Sender<Snapshot<cart_activity::Model>>,
}

/// Handle to the remote store. Cheap to clone; clones share the same channels.
#[derive(Clone)]
pub struct RemoteStore {
    db: DatabaseConnection,
    channels: Arc<Channels>,
}

impl fmt::Debug for RemoteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStore").finish_non_exhaustive()
    }
}

impl RemoteStore {
    /// Wraps a connection whose tables already exist and loads the first snapshot of
    /// every collection.
    pub async fn open(db: DatabaseConnection) -> Result<Self> {
        let channels = Channels {
            products: watch::Sender::new(Arc::new(load::<Product>(&db).await?)),
            users: watch::Sender::new(Arc::new(load::<User>(&db).await?)),
            orders: watch::Sender::new(Arc::new(load::<Order>(&db).await?)),
            activities: watch::Sender::new(Arc::new(load::<CartActivity>(&db).await?)),
        };
        debug!("Remote store opened with initial snapshots");
        Ok(Self {
            db,
            channels: Arc::new(channels),
        })
    }

    /// Underlying connection, for queries and writes.
    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Live snapshots of the product collection.
    #[must_use]
    pub fn subscribe_products(&self) -> watch::Receiver<Snapshot<product::Model>> {
        self.channels.products.subscribe()
    }

    /// Live snapshots of the user collection.
    #[must_use]
    pub fn subscribe_users(&self) -> watch::Receiver<Snapshot<user::Model>> {
        self.channels.users.subscribe()
    }

    /// Live snapshots of the order collection.
    #[must_use]
    pub fn subscribe_orders(&self) -> watch::Receiver<Snapshot<order::Model>> {
        self.channels.orders.subscribe()
    }

    /// Live snapshots of the cart activity log.
    #[must_use]
    pub fn subscribe_activities(&self) -> watch::Receiver<Snapshot<cart_activity::Model>> {
        self.channels.activities.subscribe()
    }

    /// Latest product snapshot without subscribing.
    #[must_use]
    pub fn products(&self) -> Snapshot<product::Model> {
        self.channels.products.borrow().clone()
    }

    /// Latest user snapshot without subscribing.
    #[must_use]
    pub fn users(&self) -> Snapshot<user::Model> {
        self.channels.users.borrow().clone()
    }

    /// Latest order snapshot without subscribing.
    #[must_use]
    pub fn orders(&self) -> Snapshot<order::Model> {
        self.channels.orders.borrow().clone()
    }

    /// Latest activity snapshot without subscribing.
    #[must_use]
    pub fn activities(&self) -> Snapshot<cart_activity::Model> {
        self.channels.activities.borrow().clone()
    }

    /// Re-reads `collection` and pushes the full result to every subscriber.
    ///
    /// Called after each write. Also usable to pick up changes made by another
    /// client sharing the same database.
    pub async fn refresh(&self, collection: Collection) -> Result<()> {
        let count = match collection {
            Collection::Products => publish::<Product>(&self.db, &self.channels.products).await?,
            Collection::Users => publish::<User>(&self.db, &self.channels.users).await?,
            Collection::Orders => publish::<Order>(&self.db, &self.channels.orders).await?,
            Collection::CartActivities => {
                publish::<CartActivity>(&self.db, &self.channels.activities).await?
            }
        };
        trace!(%collection, count, "Published snapshot");
        Ok(())
    }

    /// Republishes `collection` after a write that has already been committed.
    ///
    /// The write stands even if the reload fails, so the failure is only logged and
    /// subscribers keep the previous snapshot until the next successful refresh.
    pub async fn publish_after_write(&self, collection: Collection) {
        if let Err(e) = self.refresh(collection).await {
            warn!(%collection, "Write committed but snapshot reload failed: {e}");
        }
    }

    /// Refreshes every collection.
    pub async fn refresh_all(&self) -> Result<()> {
        for collection in Collection::ALL {
            self.refresh(collection).await?;
        }
        Ok(())
    }
}

async fn load<E>(db: &DatabaseConnection) -> Result<Vec<E::Model>>
where
    E: EntityTrait,
{
    let mut query = E::find();
    for key in E::PrimaryKey::iter() {
        query = query.order_by_asc(key.into_column());
    }
    query.all(db).await.map_err(Into::into)
}

async fn publish<E>(db: &DatabaseConnection, tx: &watch::Sender<Snapshot<E::Model>>) -> Result<usize>
where
    E: EntityTrait,
{
    let docs = load::<E>(db).await?;
    let count = docs.len();
    tx.send_replace(Arc::new(docs));
    Ok(count)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{create_test_product, setup_test_store};

    #[tokio::test]
    async fn test_open_starts_with_empty_snapshots() -> Result<()> {
        let store = setup_test_store().await?;
        assert!(store.products().is_empty());
        assert!(store.users().is_empty());
        assert!(store.orders().is_empty());
        assert!(store.activities().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_write_publishes_full_snapshot() -> Result<()> {
        let store = setup_test_store().await?;
        let mut rx = store.subscribe_products();

        create_test_product(&store, "Sneaker", "shoes", 40.0).await?;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        create_test_product(&store, "Lamp", "home", 25.0).await?;
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].name, "Sneaker");
        assert_eq!(snapshot[1].name, "Lamp");
        Ok(())
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_current_snapshot() -> Result<()> {
        let store = setup_test_store().await?;
        create_test_product(&store, "Sneaker", "shoes", 40.0).await?;

        let rx = store.subscribe_products();
        assert_eq!(rx.borrow().len(), 1);
        Ok(())
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::Products.to_string(), "products");
        assert_eq!(Collection::CartActivities.to_string(), "cart_activities");
    }
}
