//! Entity module - SeaORM definitions for the remote store's collections.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod cart_activity;
pub mod order;
pub mod product;
pub mod user;

// Re-export specific types to avoid conflicts
pub use cart_activity::{
    CartAction, Column as CartActivityColumn, Entity as CartActivity, Model as CartActivityModel,
};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel, OrderStatus};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
