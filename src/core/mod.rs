//! Core business logic - framework-agnostic shop operations.
//!
//! Nothing here knows about rendering. The `app` layer turns intents into calls on
//! these modules and pushes the results to views.

/// Cart activity log and the admin-side cart reconstruction
pub mod activity;
/// Admin login gate and dashboard aggregates
pub mod admin;
/// Local cart store
pub mod cart;
/// Catalog projection: ordering, filtering, lightbox
pub mod catalog;
/// Checkout bridge to the payment provider
pub mod checkout;
/// Per-category size options
pub mod options;
/// Order status and deletion
pub mod order;
/// Product creation, deletion and seeding
pub mod product;
/// Shopper registration and heartbeat
pub mod session;
