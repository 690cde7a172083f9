//! Admin console logic: the login gate and the read-only aggregates.
//!
//! The aggregator keeps the latest snapshot of every collection and recomputes all
//! statistics from scratch whenever any of them changes. Snapshots of different
//! collections arrive in no particular order, so a figure spanning two collections can
//! briefly mix old and new data until the next snapshot lands.

use crate::{
    core::{
        activity::{DerivedCart, derive_carts},
        session::is_active,
    },
    entities::{cart_activity, order, product, user},
    errors::{Error, Result},
    storage::{ADMIN_SESSION_KEY, LocalStorage, read_json, write_json},
    store::Snapshot,
};
use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::{info, warn};

/// Hours an admin login stays valid.
pub const SESSION_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
struct AdminSession {
    started_at: NaiveDateTime,
}

/// Shared-password gate for the admin console, with a device-local 24 hour session.
#[derive(Debug)]
pub struct AdminGate {
    password: Option<String>,
    storage: Arc<dyn LocalStorage>,
}

impl AdminGate {
    /// Gate checking against `password`. With `None` every login fails.
    pub fn new(password: Option<String>, storage: Arc<dyn LocalStorage>) -> Self {
        Self { password, storage }
    }

    /// Starts a session when `attempt` matches the configured password.
    ///
    /// # Errors
    /// [`Error::AdminAuth`] on a wrong password or when none is configured.
    pub fn login(&self, attempt: &str, now: NaiveDateTime) -> Result<()> {
        match &self.password {
            Some(password) if password == attempt => {
                write_json(
                    self.storage.as_ref(),
                    ADMIN_SESSION_KEY,
                    &AdminSession { started_at: now },
                )?;
                info!("Admin logged in");
                Ok(())
            }
            _ => {
                warn!("Rejected admin login");
                Err(Error::AdminAuth)
            }
        }
    }

    /// True while a session started less than 24 hours before `now` exists.
    #[must_use]
    pub fn is_authenticated(&self, now: NaiveDateTime) -> bool {
        read_json::<AdminSession>(self.storage.as_ref(), ADMIN_SESSION_KEY).is_some_and(|s| {
            now.signed_duration_since(s.started_at) < TimeDelta::hours(SESSION_HOURS)
        })
    }

    /// Fails with [`Error::AdminAuth`] unless authenticated.
    pub fn require(&self, now: NaiveDateTime) -> Result<()> {
        if self.is_authenticated(now) {
            Ok(())
        } else {
            Err(Error::AdminAuth)
        }
    }

    /// Ends the session.
    pub fn logout(&self) -> Result<()> {
        self.storage.remove(ADMIN_SESSION_KEY)
    }
}

/// Dashboard figures.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DashboardStats {
    /// Products in the catalog
    pub total_products: usize,
    /// Registered users
    pub total_users: usize,
    /// Users seen in the last 24 hours
    pub active_users: usize,
    /// Carts (rebuilt from the activity log) holding at least one line
    pub active_carts: usize,
    /// Orders recorded
    pub total_orders: usize,
    /// Sum of order totals
    pub total_revenue: f64,
    /// Units sold across all orders
    pub total_products_sold: u64,
}

/// A user row with its activity badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    /// The user
    pub user: user::Model,
    /// Seen in the last 24 hours
    pub active: bool,
}

/// Latest snapshot of every collection plus the derived admin views.
#[derive(Debug, Default)]
pub struct AdminAggregator {
    products: Snapshot<product::Model>,
    users: Snapshot<user::Model>,
    orders: Snapshot<order::Model>,
    activities: Snapshot<cart_activity::Model>,
}

impl AdminAggregator {
    /// Aggregator with empty snapshots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the product snapshot.
    pub fn set_products(&mut self, snapshot: Snapshot<product::Model>) {
        self.products = snapshot;
    }

    /// Replaces the user snapshot.
    pub fn set_users(&mut self, snapshot: Snapshot<user::Model>) {
        self.users = snapshot;
    }

    /// Replaces the order snapshot.
    pub fn set_orders(&mut self, snapshot: Snapshot<order::Model>) {
        self.orders = snapshot;
    }

    /// Replaces the activity snapshot.
    pub fn set_activities(&mut self, snapshot: Snapshot<cart_activity::Model>) {
        self.activities = snapshot;
    }

    /// Recomputes every dashboard figure.
    #[must_use]
    pub fn stats(&self, now: NaiveDateTime) -> DashboardStats {
        DashboardStats {
            total_products: self.products.len(),
            total_users: self.users.len(),
            active_users: self.users.iter().filter(|u| is_active(u, now)).count(),
            active_carts: self.carts().iter().filter(|c| c.is_active()).count(),
            total_orders: self.orders.len(),
            total_revenue: self.orders.iter().map(|o| o.total).sum(),
            total_products_sold: self.orders.iter().map(order::Model::units).sum(),
        }
    }

    /// Products in store order.
    #[must_use]
    pub fn products(&self) -> &[product::Model] {
        &self.products
    }

    /// Users with their Active/Inactive badge.
    #[must_use]
    pub fn users(&self, now: NaiveDateTime) -> Vec<UserRow> {
        self.users
            .iter()
            .map(|u| UserRow {
                active: is_active(u, now),
                user: u.clone(),
            })
            .collect()
    }

    /// Orders, newest first.
    #[must_use]
    pub fn orders(&self) -> Vec<order::Model> {
        let mut orders = self.orders.to_vec();
        orders.sort_by_key(|o| Reverse((o.created_at, o.id)));
        orders
    }

    /// Per-user carts rebuilt from the activity log.
    #[must_use]
    pub fn carts(&self) -> Vec<DerivedCart> {
        derive_carts(&self.activities)
    }
}
