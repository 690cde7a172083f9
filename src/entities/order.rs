//! Order entity - written once when the payment provider approves a checkout.
//!
//! The line items are a frozen copy of the cart at approval time. Only the status
//! changes afterwards, and only from the admin console.

use crate::models::{CartItem, ShippingAddress};
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Frozen cart lines, stored as JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct OrderItems(pub Vec<CartItem>);

/// Shipping address column, stored as JSON.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ShippingColumn(pub ShippingAddress);

/// Order lifecycle status. Any status may be set from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Paid, awaiting processing
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Accepted by the shop
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    /// Handed to the carrier
    #[sea_orm(string_value = "shipped")]
    Shipped,
    /// Received by the customer
    #[sea_orm(string_value = "delivered")]
    Delivered,
    /// Cancelled
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        })
    }
}

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Id of the user who paid
    pub customer_id: i64,
    /// Customer name at checkout
    pub customer_name: String,
    /// Customer email at checkout
    pub customer_email: String,
    /// Customer phone at checkout
    pub customer_phone: String,
    /// Frozen cart lines
    pub items: OrderItems,
    /// Amount charged by the payment provider
    pub total: f64,
    /// Current status
    pub status: OrderStatus,
    /// Provider payment identifier, one order per payment
    #[sea_orm(unique)]
    pub payment_id: String,
    /// Shipping address reported by the provider, if any
    pub shipping_address: Option<ShippingColumn>,
    /// When the order was written
    pub created_at: DateTime,
}

impl Model {
    /// Number of units across all lines.
    #[must_use]
    pub fn units(&self) -> u64 {
        self.items.0.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

/// Orders have no modelled relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
