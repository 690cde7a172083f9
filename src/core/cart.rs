//! Local cart store.
//!
//! The cart lives on the shopper's device. Lines are keyed by (product, size, colour)
//! and carry the price seen when they were added. Every mutation rewrites the whole
//! cart to local storage; a cart that cannot be read back starts empty.

use crate::entities::product;
use crate::models::{CartItem, CartKey};
use crate::storage::{CART_KEY, LocalStorage, read_json, write_json};
use std::sync::Arc;
use tracing::{debug, error};

/// Derived cart totals, computed on every call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CartTotals {
    /// Sum of quantities
    pub item_count: u64,
    /// Sum of `price * quantity`
    pub amount: f64,
}

/// The shopper's in-progress cart.
#[derive(Debug)]
pub struct CartStore {
    items: Vec<CartItem>,
    storage: Arc<dyn LocalStorage>,
}

impl CartStore {
    /// Loads the persisted cart, or starts empty if there is none or it is unreadable.
    pub fn load(storage: Arc<dyn LocalStorage>) -> Self {
        let items: Vec<CartItem> = read_json(storage.as_ref(), CART_KEY).unwrap_or_default();
        debug!(lines = items.len(), "Loaded cart");
        Self { items, storage }
    }

    /// Current lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// True when the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Line with `key`, if present.
    #[must_use]
    pub fn get(&self, key: &CartKey) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.key == key)
    }

    /// Adds `quantity` units of `product` in the given size and colour.
    ///
    /// An existing line with the same key is incremented and keeps its original price.
    /// A quantity of 0 counts as 1. Returns the resulting line.
    pub fn add_item(
        &mut self,
        product: &product::Model,
        size: &str,
        color: &str,
        quantity: u32,
    ) -> CartItem {
        let quantity = quantity.max(1);
        let key = CartKey::new(product.id, size, color);
        let line = if let Some(existing) = self.items.iter_mut().find(|i| i.key == key) {
            existing.quantity = existing.quantity.saturating_add(quantity);
            existing.clone()
        } else {
            let line = CartItem {
                key,
                name: product.name.clone(),
                price: product.price,
                image: product.thumbnail().map(str::to_string),
                category: Some(product.category.clone()),
                quantity,
            };
            self.items.push(line.clone());
            line
        };
        self.persist();
        line
    }

    /// Sets the quantity of a line. Zero or less removes it; unknown keys are ignored.
    ///
    /// Returns the removed line when the quantity dropped to zero.
    pub fn set_quantity(&mut self, key: &CartKey, quantity: i64) -> Option<CartItem> {
        if quantity <= 0 {
            return self.remove_item(key);
        }
        let line = self.items.iter_mut().find(|i| &i.key == key)?;
        line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        self.persist();
        None
    }

    /// Removes a line. Returns it, or `None` if there was no such line.
    pub fn remove_item(&mut self, key: &CartKey) -> Option<CartItem> {
        let position = self.items.iter().position(|i| &i.key == key)?;
        let removed = self.items.remove(position);
        self.persist();
        Some(removed)
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    /// Item count and amount, recomputed from the lines.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.items.iter().fold(CartTotals::default(), |acc, item| CartTotals {
            item_count: acc.item_count + u64::from(item.quantity),
            amount: acc.amount + item.line_total(),
        })
    }

    fn persist(&self) {
        if let Err(e) = write_json(self.storage.as_ref(), CART_KEY, &self.items) {
            error!("Failed to persist cart: {e}");
        }
    }
}
