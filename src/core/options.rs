//! Size/variant options offered when adding a product to the cart.
//!
//! Fixed lookup keyed by category. Unknown categories get the default set.

use crate::models::Category;

/// Colours offered for every product.
pub const COLORS: [&str; 12] = [
    "White", "Black", "Red", "Blue", "Green", "Yellow", "Pink", "Purple", "Orange", "Grey",
    "Brown", "Beige",
];

const CLOTHING: &[&str] = &["XS", "S", "M", "L", "XL", "XXL", "XXXL"];
const SHOES: &[&str] = &[
    "36", "37", "38", "39", "40", "41", "42", "43", "44", "45", "46",
];
const ELECTRONICS: &[&str] = &["Standard", "Small", "Medium", "Large", "Extra Large"];
const HOME: &[&str] = &["Small", "Medium", "Large", "Custom"];
const SPORTS: &[&str] = &["XS", "S", "M", "L", "XL", "XXL"];
const BEAUTY: &[&str] = &["100ml", "200ml", "250ml", "500ml", "1L"];
const HAIR: &[&str] = &[
    "12\"", "14\"", "16\"", "18\"", "20\"", "22\"", "24\"", "26\"", "28\"", "30\"", "32\"",
    "34\"", "36\"",
];
const DEFAULT: &[&str] = &["Unique", "Standard", "Personalized"];

/// Options and their label for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeOptions {
    /// Label shown next to the size selector
    pub label: &'static str,
    /// Selectable values, in display order
    pub values: &'static [&'static str],
}

impl SizeOptions {
    /// True when `value` is one of the offered sizes.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(&value)
    }
}

/// Size options for `category`.
#[must_use]
pub const fn size_options(category: Category) -> SizeOptions {
    let values = match category {
        Category::Clothing => CLOTHING,
        Category::Shoes => SHOES,
        Category::Electronics => ELECTRONICS,
        Category::Home => HOME,
        Category::Sports => SPORTS,
        Category::Beauty => BEAUTY,
        Category::Hair => HAIR,
        Category::Default => DEFAULT,
    };
    SizeOptions {
        label: size_label(category),
        values,
    }
}

/// Size options for a category stored as text.
#[must_use]
pub fn size_options_for(category: &str) -> SizeOptions {
    size_options(Category::from_name(category))
}

/// Label for the size selector of `category`.
#[must_use]
pub const fn size_label(category: Category) -> &'static str {
    match category {
        Category::Hair => "Length (inches)",
        Category::Shoes => "Shoe size",
        Category::Beauty => "Volume",
        _ => "Size/Model",
    }
}
