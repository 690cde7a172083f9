//! Cart activity trail.
//!
//! Shopper cart changes are appended to the remote activity log so operators can see
//! what is sitting in carts. The log is the only remote view of device carts, so the
//! admin side rebuilds per-user carts from it.

use crate::{
    entities::{CartAction, cart_activity, order::OrderItems, user},
    errors::{Error, Result},
    models::CartItem,
    store::{Collection, RemoteStore},
};
use chrono::NaiveDateTime;
use sea_orm::{ActiveModelTrait, Set};
use std::collections::BTreeMap;

/// Appends an `add` or `remove` entry for one cart line.
pub async fn record_line(
    store: &RemoteStore,
    user: &user::Model,
    action: CartAction,
    line: &CartItem,
    quantity: u32,
    now: NaiveDateTime,
) -> Result<()> {
    cart_activity::ActiveModel {
        user_id: Set(user.id),
        user_name: Set(user.name.clone()),
        user_email: Set(user.email.clone()),
        action: Set(action),
        product_id: Set(Some(line.product_id())),
        product_name: Set(Some(line.name.clone())),
        quantity: Set(Some(i32::try_from(quantity).unwrap_or(i32::MAX))),
        size: Set(Some(line.key.size.clone())),
        color: Set(Some(line.key.color.clone())),
        items: Set(None),
        total: Set(None),
        timestamp: Set(now),
        ..Default::default()
    }
    .insert(store.db())
    .await
    .map_err(|e| Error::remote_write(Collection::CartActivities, e))?;
    store.publish_after_write(Collection::CartActivities).await;
    Ok(())
}

/// Appends a `purchase` entry with the lines bought and the amount charged.
pub async fn record_purchase(
    store: &RemoteStore,
    user: &user::Model,
    items: &[CartItem],
    total: f64,
    now: NaiveDateTime,
) -> Result<()> {
    cart_activity::ActiveModel {
        user_id: Set(user.id),
        user_name: Set(user.name.clone()),
        user_email: Set(user.email.clone()),
        action: Set(CartAction::Purchase),
        product_id: Set(None),
        product_name: Set(None),
        quantity: Set(None),
        size: Set(None),
        color: Set(None),
        items: Set(Some(OrderItems(items.to_vec()))),
        total: Set(Some(total)),
        timestamp: Set(now),
        ..Default::default()
    }
    .insert(store.db())
    .await
    .map_err(|e| Error::remote_write(Collection::CartActivities, e))?;
    store.publish_after_write(Collection::CartActivities).await;
    Ok(())
}

/// One line of a cart rebuilt from the activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedLine {
    /// Product id
    pub product_id: i64,
    /// Product name as last logged
    pub product_name: String,
    /// Size option
    pub size: String,
    /// Colour option
    pub color: String,
    /// Net quantity, always positive
    pub quantity: i64,
}

/// A user's cart as reconstructed from the activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedCart {
    /// Owning user
    pub user_id: i64,
    /// User name as last logged
    pub user_name: String,
    /// User email as last logged
    pub user_email: String,
    /// Lines with a positive net quantity
    pub lines: Vec<DerivedLine>,
    /// Time of the user's latest activity
    pub last_activity: NaiveDateTime,
}

impl DerivedCart {
    /// A cart is active while it holds at least one line.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.lines.is_empty()
    }

    /// Units across all lines.
    #[must_use]
    pub fn units(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

type LineKey = (i64, String, String);

struct Replay {
    user_name: String,
    user_email: String,
    lines: BTreeMap<LineKey, (String, i64)>,
    last_activity: NaiveDateTime,
}

/// Replays the activity log into one cart per user, ordered by user id.
///
/// `add` increments, `remove` decrements (dropping lines at zero) and `purchase`
/// empties the cart. Quantity edits made on the device are never logged, so the result
/// can disagree with what the shopper actually holds.
#[must_use]
pub fn derive_carts(activities: &[cart_activity::Model]) -> Vec<DerivedCart> {
    let mut ordered: Vec<&cart_activity::Model> = activities.iter().collect();
    ordered.sort_by_key(|a| (a.timestamp, a.id));

    let mut carts: BTreeMap<i64, Replay> = BTreeMap::new();
    for activity in ordered {
        let replay = carts.entry(activity.user_id).or_insert_with(|| Replay {
            user_name: String::new(),
            user_email: String::new(),
            lines: BTreeMap::new(),
            last_activity: activity.timestamp,
        });
        replay.user_name.clone_from(&activity.user_name);
        replay.user_email.clone_from(&activity.user_email);
        replay.last_activity = activity.timestamp;

        match activity.action {
            CartAction::Purchase => replay.lines.clear(),
            CartAction::Add | CartAction::Remove => {
                let Some(product_id) = activity.product_id else {
                    continue;
                };
                let key = (
                    product_id,
                    activity.size.clone().unwrap_or_default(),
                    activity.color.clone().unwrap_or_default(),
                );
                let quantity = i64::from(activity.quantity.unwrap_or(1));
                let delta = if activity.action == CartAction::Add {
                    quantity
                } else {
                    -quantity
                };
                let name = activity.product_name.clone().unwrap_or_default();
                let entry = replay.lines.entry(key.clone()).or_insert((name, 0));
                entry.1 += delta;
                if entry.1 <= 0 {
                    replay.lines.remove(&key);
                }
            }
        }
    }

    carts
        .into_iter()
        .map(|(user_id, replay)| DerivedCart {
            user_id,
            user_name: replay.user_name,
            user_email: replay.user_email,
            lines: replay
                .lines
                .into_iter()
                .map(|((product_id, size, color), (product_name, quantity))| DerivedLine {
                    product_id,
                    product_name,
                    size,
                    color,
                    quantity,
                })
                .collect(),
            last_activity: replay.last_activity,
        })
        .collect()
}
