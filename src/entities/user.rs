//! User entity - an anonymous shopper registered with name, email and phone.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier, assigned once at registration
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Email address (not unique, the same address may register twice)
    pub email: String,
    /// Phone number
    pub phone: String,
    /// When the user registered
    pub registered_at: DateTime,
    /// Last heartbeat, absent for records written by older clients
    pub last_activity: Option<DateTime>,
    /// Flag written with every heartbeat
    pub is_active: bool,
}

/// Users have no modelled relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
