//! Shop configuration loading from config.toml
//!
//! The `[shop]` table holds deployment settings (name, currency, catalog ordering,
//! payment retry delay, where local device state lives). The `[[products]]` array is
//! the seed catalog written to the store when the products collection is empty.

use crate::core::catalog::CatalogOrder;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Deployment settings
    #[serde(default)]
    pub shop: ShopConfig,
    /// Seed catalog
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// Deployment settings for one shop.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ShopConfig {
    /// Name shown when no shopper is registered
    pub name: String,
    /// ISO currency code sent to the payment provider
    pub currency: String,
    /// How the catalog orders products
    pub catalog_order: CatalogOrder,
    /// Delay before the payment button is offered again after a provider error
    pub payment_retry_delay_ms: u64,
    /// Directory for the device's local storage files
    pub storage_dir: PathBuf,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            name: "Storefront".to_string(),
            currency: "USD".to_string(),
            catalog_order: CatalogOrder::Newest,
            payment_retry_delay_ms: 1000,
            storage_dir: PathBuf::from("data/local"),
        }
    }
}

impl ShopConfig {
    /// Payment retry delay as a `Duration`.
    #[must_use]
    pub const fn payment_retry_delay(&self) -> Duration {
        Duration::from_millis(self.payment_retry_delay_ms)
    }
}

/// A product to seed into an empty catalog.
#[derive(Debug, Deserialize, Clone)]
pub struct ProductSeed {
    /// Product name
    pub name: String,
    /// Selling price
    pub price: f64,
    /// Price before discount
    #[serde(default)]
    pub original_price: f64,
    /// Category name
    pub category: String,
    /// Image URLs
    #[serde(default)]
    pub images: Vec<String>,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// Loads shop configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML syntax is invalid or a
/// required field is missing.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from ./config.toml, or defaults when the file does not exist.
pub fn load_default_config() -> Result<Config> {
    let path = Path::new("config.toml");
    if path.exists() {
        load_config(path)
    } else {
        tracing::info!("No config.toml found, using default shop settings");
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_shop_config() {
        let toml_str = r#"
            [shop]
            name = "Marc's"
            currency = "EUR"
            catalog_order = "shuffle"
            payment_retry_delay_ms = 250

            [[products]]
            name = "Running shoe"
            price = 49.99
            original_price = 79.99
            category = "shoes"
            images = ["https://img.example/shoe.jpg"]

            [[products]]
            name = "Lamp"
            price = 20.0
            category = "home"
            description = "Warm light"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.shop.name, "Marc's");
        assert_eq!(config.shop.currency, "EUR");
        assert_eq!(config.shop.catalog_order, CatalogOrder::Shuffle);
        assert_eq!(config.shop.payment_retry_delay(), Duration::from_millis(250));
        assert_eq!(config.products.len(), 2);
        assert_eq!(config.products[0].original_price, 79.99);
        assert!(config.products[1].images.is_empty());
        assert_eq!(config.products[1].description.as_deref(), Some("Warm light"));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.shop.currency, "USD");
        assert_eq!(config.shop.catalog_order, CatalogOrder::Newest);
        assert_eq!(config.shop.payment_retry_delay_ms, 1000);
        assert!(config.products.is_empty());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = parse_config("[shop\nname=");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
