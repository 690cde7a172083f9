//! Admin console: login gate, catalog and order maintenance, live dashboard.

use crate::{
    app::{failure_notice, now},
    core::{
        admin::{AdminAggregator, AdminGate},
        order,
        product::{self, NewProduct},
    },
    entities::OrderStatus,
    errors::Result,
    store::{Collection, RemoteStore},
    view::{Fragment, NoticeLevel, ProductCard, ViewSync},
};
use chrono::NaiveDateTime;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Something the operator did.
#[derive(Debug, Clone)]
pub enum AdminIntent {
    /// Password submitted
    Login(String),
    /// Log out button
    Logout,
    /// Product form submitted
    CreateProduct(NewProduct),
    /// Delete button on a product
    DeleteProduct(i64),
    /// Delete button on an order
    DeleteOrder(i64),
    /// Status selector on an order
    SetOrderStatus {
        /// Order id
        order_id: i64,
        /// New status
        status: OrderStatus,
    },
    /// Reload every collection
    Refresh,
}

impl AdminIntent {
    const fn name(&self) -> &'static str {
        match self {
            Self::Login(_) => "login",
            Self::Logout => "logout",
            Self::CreateProduct(_) => "create_product",
            Self::DeleteProduct(_) => "delete_product",
            Self::DeleteOrder(_) => "delete_order",
            Self::SetOrderStatus { .. } => "set_order_status",
            Self::Refresh => "refresh",
        }
    }
}

/// Admin state plus the view it renders to.
#[derive(Debug)]
pub struct AdminConsole {
    store: RemoteStore,
    gate: AdminGate,
    aggregator: AdminAggregator,
    view: ViewSync,
}

impl AdminConsole {
    /// New console; nothing is rendered until [`AdminConsole::start`].
    pub fn new(store: RemoteStore, gate: AdminGate, view: ViewSync) -> Self {
        Self {
            store,
            gate,
            aggregator: AdminAggregator::new(),
            view,
        }
    }

    /// Current aggregates.
    pub const fn aggregator(&self) -> &AdminAggregator {
        &self.aggregator
    }

    /// Takes the current snapshot of every collection and renders the login screen or
    /// the dashboard.
    pub fn start(&mut self, now: NaiveDateTime) {
        for collection in Collection::ALL {
            self.take_snapshot(collection);
        }
        let authenticated = self.gate.is_authenticated(now);
        self.view.render(Fragment::AdminLogin {
            open: !authenticated,
        });
        if authenticated {
            self.render_all(now);
        }
    }

    /// Runs one intent. Failures are rendered as notices.
    pub async fn dispatch(&mut self, intent: AdminIntent, now: NaiveDateTime) {
        let name = intent.name();
        debug!(intent = name, "Dispatching");
        if let Err(e) = self.handle(intent, now).await {
            let notice = failure_notice(name, &e);
            self.view.render(notice);
        }
    }

    /// Follows all four collections and intents until the intent channel closes.
    pub async fn run(mut self, mut intents: mpsc::Receiver<AdminIntent>) {
        let mut products = self.store.subscribe_products();
        let mut users = self.store.subscribe_users();
        let mut orders = self.store.subscribe_orders();
        let mut activities = self.store.subscribe_activities();
        self.start(now());
        info!("Admin console started");

        loop {
            tokio::select! {
                biased;
                Ok(()) = products.changed() => {
                    let snapshot = products.borrow_and_update().clone();
                    self.aggregator.set_products(snapshot);
                    self.render_collection(Collection::Products, now());
                }
                Ok(()) = users.changed() => {
                    let snapshot = users.borrow_and_update().clone();
                    self.aggregator.set_users(snapshot);
                    self.render_collection(Collection::Users, now());
                }
                Ok(()) = orders.changed() => {
                    let snapshot = orders.borrow_and_update().clone();
                    self.aggregator.set_orders(snapshot);
                    self.render_collection(Collection::Orders, now());
                }
                Ok(()) = activities.changed() => {
                    let snapshot = activities.borrow_and_update().clone();
                    self.aggregator.set_activities(snapshot);
                    self.render_collection(Collection::CartActivities, now());
                }
                intent = intents.recv() => match intent {
                    Some(intent) => self.dispatch(intent, now()).await,
                    None => break,
                },
            }
        }

        info!("Admin console closed");
        self.view.detach();
    }

    async fn handle(&mut self, intent: AdminIntent, now: NaiveDateTime) -> Result<()> {
        match intent {
            AdminIntent::Login(password) => {
                self.gate.login(&password, now)?;
                self.view.render(Fragment::AdminLogin { open: false });
                self.render_all(now);
                Ok(())
            }
            AdminIntent::Logout => {
                self.gate.logout()?;
                self.view.render(Fragment::AdminLogin { open: true });
                Ok(())
            }
            other => {
                self.gate.require(now)?;
                self.mutate(other, now).await
            }
        }
    }

    async fn mutate(&mut self, intent: AdminIntent, now: NaiveDateTime) -> Result<()> {
        match intent {
            AdminIntent::CreateProduct(fields) => {
                let created = product::create_product(&self.store, fields, now).await?;
                self.sync(Collection::Products, now);
                self.view.render(Fragment::notice(
                    NoticeLevel::Info,
                    format!("Product {} added", created.name),
                ));
            }
            AdminIntent::DeleteProduct(id) => {
                product::delete_product(&self.store, id).await?;
                self.sync(Collection::Products, now);
            }
            AdminIntent::DeleteOrder(id) => {
                order::delete_order(&self.store, id).await?;
                self.sync(Collection::Orders, now);
            }
            AdminIntent::SetOrderStatus { order_id, status } => {
                order::set_order_status(&self.store, order_id, status).await?;
                self.sync(Collection::Orders, now);
            }
            AdminIntent::Refresh => {
                self.store.refresh_all().await?;
                for collection in Collection::ALL {
                    self.take_snapshot(collection);
                }
                self.render_all(now);
            }
            AdminIntent::Login(_) | AdminIntent::Logout => {}
        }
        Ok(())
    }

    fn take_snapshot(&mut self, collection: Collection) {
        match collection {
            Collection::Products => self.aggregator.set_products(self.store.products()),
            Collection::Users => self.aggregator.set_users(self.store.users()),
            Collection::Orders => self.aggregator.set_orders(self.store.orders()),
            Collection::CartActivities => self.aggregator.set_activities(self.store.activities()),
        }
    }

    fn sync(&mut self, collection: Collection, now: NaiveDateTime) {
        self.take_snapshot(collection);
        self.render_collection(collection, now);
    }

    fn render_collection(&mut self, collection: Collection, now: NaiveDateTime) {
        if !self.gate.is_authenticated(now) {
            return;
        }
        let fragment = match collection {
            Collection::Products => Fragment::AdminProducts(
                self.aggregator
                    .products()
                    .iter()
                    .map(ProductCard::from_product)
                    .collect(),
            ),
            Collection::Users => Fragment::AdminUsers(self.aggregator.users(now)),
            Collection::Orders => Fragment::AdminOrders(self.aggregator.orders()),
            Collection::CartActivities => Fragment::AdminCarts(self.aggregator.carts()),
        };
        self.view.render(fragment);
        self.view.render(Fragment::Dashboard(self.aggregator.stats(now)));
    }

    fn render_all(&mut self, now: NaiveDateTime) {
        for collection in Collection::ALL {
            self.render_collection(collection, now);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::admin::DashboardStats;
    use crate::errors::Error;
    use crate::storage::MemoryStorage;
    use crate::test_utils::{at, create_test_order, create_test_user, new_product, setup_test_store};
    use crate::view::RecordingSink;
    use std::sync::Arc;

    fn console(store: &RemoteStore, recorder: &RecordingSink) -> AdminConsole {
        let gate = AdminGate::new(Some("s3cret".into()), Arc::new(MemoryStorage::new()));
        AdminConsole::new(store.clone(), gate, ViewSync::new(recorder.clone()))
    }

    fn last_stats(recorder: &RecordingSink) -> Option<DashboardStats> {
        recorder.last(|f| match f {
            Fragment::Dashboard(stats) => Some(*stats),
            _ => None,
        })
    }

    #[tokio::test]
    async fn test_login_reveals_dashboard() -> Result<()> {
        let store = setup_test_store().await?;
        create_test_user(&store, "Alice").await?;
        let recorder = RecordingSink::new();
        let mut admin = console(&store, &recorder);

        admin.start(at(0));
        assert!(recorder.fragments().contains(&Fragment::AdminLogin { open: true }));
        assert!(last_stats(&recorder).is_none());

        admin.dispatch(AdminIntent::Login("guess".into()), at(0)).await;
        assert!(last_stats(&recorder).is_none());

        admin.dispatch(AdminIntent::Login("s3cret".into()), at(0)).await;
        assert_eq!(last_stats(&recorder).unwrap().total_users, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_mutations_require_login() -> Result<()> {
        let store = setup_test_store().await?;
        let recorder = RecordingSink::new();
        let mut admin = console(&store, &recorder);
        admin.start(at(0));

        admin
            .dispatch(AdminIntent::CreateProduct(new_product("Lamp", "home", 20.0)), at(1))
            .await;

        assert!(store.products().is_empty());
        let notice = recorder.last(|f| match f {
            Fragment::Notice { message, .. } => Some(message.clone()),
            _ => None,
        });
        assert_eq!(notice, Some(Error::AdminAuth.to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_product_and_order_maintenance() -> Result<()> {
        let store = setup_test_store().await?;
        let order = create_test_order(&store, "pay-1", 40.0).await?;
        let recorder = RecordingSink::new();
        let mut admin = console(&store, &recorder);
        admin.start(at(0));
        admin.dispatch(AdminIntent::Login("s3cret".into()), at(0)).await;

        admin
            .dispatch(AdminIntent::CreateProduct(new_product("Lamp", "home", 20.0)), at(1))
            .await;
        assert_eq!(last_stats(&recorder).unwrap().total_products, 1);

        admin
            .dispatch(
                AdminIntent::SetOrderStatus {
                    order_id: order.id,
                    status: OrderStatus::Shipped,
                },
                at(2),
            )
            .await;
        let orders = recorder.last(|f| match f {
            Fragment::AdminOrders(orders) => Some(orders.clone()),
            _ => None,
        });
        assert_eq!(orders.unwrap()[0].status, OrderStatus::Shipped);

        admin.dispatch(AdminIntent::DeleteOrder(order.id), at(3)).await;
        let stats = last_stats(&recorder).unwrap();
        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.total_revenue, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_session_expiry_hides_updates() -> Result<()> {
        let store = setup_test_store().await?;
        let recorder = RecordingSink::new();
        let mut admin = console(&store, &recorder);
        admin.start(at(0));
        admin.dispatch(AdminIntent::Login("s3cret".into()), at(0)).await;
        let rendered = recorder.fragments().len();

        admin.dispatch(AdminIntent::Refresh, at(25 * 60)).await;

        let fragments = recorder.fragments();
        assert_eq!(fragments.len(), rendered + 1);
        assert!(matches!(fragments.last(), Some(Fragment::Notice { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_run_recomputes_on_shopper_activity() -> Result<()> {
        let store = setup_test_store().await?;
        let recorder = RecordingSink::new();
        let admin = console(&store, &recorder);
        let (tx, rx) = mpsc::channel(8);

        let driver = async {
            tx.send(AdminIntent::Login("s3cret".into())).await.unwrap();
            create_test_user(&store, "Alice").await?;
            create_test_user(&store, "Bob").await?;
            drop(tx);
            Ok::<(), Error>(())
        };
        let ((), driven) = tokio::join!(admin.run(rx), driver);
        driven?;

        assert_eq!(last_stats(&recorder).unwrap().total_users, 2);
        Ok(())
    }
}
