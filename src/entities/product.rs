//! Product entity - an item in the shop catalog.
//!
//! Products are created and deleted from the admin console and are never mutated
//! by shoppers. The first image is the thumbnail; the list may be empty.

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ordered image URLs, stored as a JSON array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ImageList(pub Vec<String>);

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier, assigned by the store
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Current selling price
    pub price: f64,
    /// Price before discount, 0 when there is none
    pub original_price: f64,
    /// Category name (see [`crate::models::Category`])
    pub category: String,
    /// Image URLs, first one is the thumbnail
    pub images: ImageList,
    /// Optional long description
    pub description: Option<String>,
    /// When the product was created
    pub created_at: DateTime,
}

impl Model {
    /// First image, if any.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        self.images.0.first().map(String::as_str)
    }
}

/// Products have no relations; orders keep frozen copies of cart lines instead.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
