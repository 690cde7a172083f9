//! Value types shared between the local cart, the order records and the views.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Product categories the shop knows about.
///
/// Products carry their category as free text in the store; anything not listed
/// here falls back to [`Category::Default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Apparel
    Clothing,
    /// Footwear
    Shoes,
    /// Electronics
    Electronics,
    /// Home goods
    Home,
    /// Sports gear
    Sports,
    /// Beauty products
    Beauty,
    /// Hair extensions and wigs
    Hair,
    /// Fallback for unknown categories
    Default,
}

impl Category {
    /// Every category, in the order the filter buttons show them.
    pub const ALL: [Self; 8] = [
        Self::Clothing,
        Self::Shoes,
        Self::Electronics,
        Self::Home,
        Self::Sports,
        Self::Beauty,
        Self::Hair,
        Self::Default,
    ];

    /// Maps a stored category name to a known category, falling back to `Default`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == name)
            .unwrap_or(Self::Default)
    }

    /// Name used in the store and in filter buttons.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clothing => "clothing",
            Self::Shoes => "shoes",
            Self::Electronics => "electronics",
            Self::Home => "home",
            Self::Sports => "sports",
            Self::Beauty => "beauty",
            Self::Hair => "hair",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a cart line: the same product in another size or colour is another line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CartKey {
    /// Product id in the remote store
    pub product_id: i64,
    /// Selected size/variant
    pub size: String,
    /// Selected colour
    pub color: String,
}

impl CartKey {
    /// Builds a key from its parts.
    pub fn new(product_id: i64, size: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            product_id,
            size: size.into(),
            color: color.into(),
        }
    }
}

impl fmt::Display for CartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.product_id, self.size, self.color)
    }
}

/// One line of the shopper's cart.
///
/// `price` is captured when the line is created and never refreshed from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Line identity
    pub key: CartKey,
    /// Product name at add time
    pub name: String,
    /// Unit price at add time
    pub price: f64,
    /// Thumbnail at add time
    #[serde(default)]
    pub image: Option<String>,
    /// Product category at add time, used to label the size option
    #[serde(default)]
    pub category: Option<String>,
    /// Always at least 1
    pub quantity: u32,
}

impl CartItem {
    /// Product id of this line.
    #[must_use]
    pub const fn product_id(&self) -> i64 {
        self.key.product_id
    }

    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Shipping address extracted from the payment provider's capture response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Street line
    pub street: Option<String>,
    /// City
    pub city: Option<String>,
    /// State / region
    pub state: Option<String>,
    /// Postal code
    pub postal_code: Option<String>,
    /// ISO country code
    pub country: Option<String>,
}

/// Formats an amount the way the shop displays prices, e.g. `$12.50`.
#[must_use]
pub fn format_price(amount: f64) -> String {
    format!("${amount:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_name_falls_back_to_default() {
        assert_eq!(Category::from_name("shoes"), Category::Shoes);
        assert_eq!(Category::from_name("hair"), Category::Hair);
        assert_eq!(Category::from_name("toys"), Category::Default);
        assert_eq!(Category::from_name("Shoes"), Category::Default);
    }

    #[test]
    fn test_cart_key_display() {
        let key = CartKey::new(7, "M", "Black");
        assert_eq!(key.to_string(), "7-M-Black");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(10.0), "$10.00");
        assert_eq!(format_price(19.999), "$20.00");
    }
}
