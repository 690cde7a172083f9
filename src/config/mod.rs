/// Admin credential from environment variables
pub mod admin;

/// Database configuration and connection management
pub mod database;

/// Shop settings and seed catalog from config.toml
pub mod shop;
