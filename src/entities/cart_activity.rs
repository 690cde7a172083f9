//! Cart activity entity - append-only trail of what shoppers do with their carts.
//!
//! The device owns the real cart; this log is what the admin console sees of it.

use super::order::OrderItems;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

/// What happened to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum CartAction {
    /// A line was added or incremented
    #[sea_orm(string_value = "add")]
    Add,
    /// A line was removed
    #[sea_orm(string_value = "remove")]
    Remove,
    /// The cart was checked out
    #[sea_orm(string_value = "purchase")]
    Purchase,
}

/// Cart activity database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cart_activities")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Acting user
    pub user_id: i64,
    /// User name at the time
    pub user_name: String,
    /// User email at the time
    pub user_email: String,
    /// Kind of activity
    pub action: CartAction,
    /// Product touched (add/remove only)
    pub product_id: Option<i64>,
    /// Product name touched (add/remove only)
    pub product_name: Option<String>,
    /// Quantity added or removed (add/remove only)
    pub quantity: Option<i32>,
    /// Size option (add/remove only)
    pub size: Option<String>,
    /// Colour option (add/remove only)
    pub color: Option<String>,
    /// Lines bought (purchase only)
    pub items: Option<OrderItems>,
    /// Amount paid (purchase only)
    pub total: Option<f64>,
    /// When the activity was recorded
    pub timestamp: DateTime,
}

/// Activities have no modelled relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
