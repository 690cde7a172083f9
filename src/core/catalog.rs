//! Catalog projection.
//!
//! Holds the latest product snapshot in presentation order and the subset that passes
//! the shopper's current filter. Each snapshot replaces everything; there is no
//! incremental diffing.

use crate::entities::product;
use crate::models::Category;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::cmp::Reverse;
use tracing::trace;

/// How products are ordered for display.
///
/// `Shuffle` reorders on every snapshot, so products can move while a shopper is
/// looking at them. `Newest` is stable between snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogOrder {
    /// Creation time descending, ties broken by id descending
    #[default]
    Newest,
    /// Fresh random order per snapshot
    Shuffle,
}

/// Category part of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Everything passes
    #[default]
    All,
    /// Only products in this category
    Only(Category),
}

impl CategoryFilter {
    /// Parses a filter button value: `"all"` or a category name.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value == "all" {
            Self::All
        } else {
            Self::Only(Category::from_name(value))
        }
    }

    fn matches(self, product: &product::Model) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => Category::from_name(&product.category) == category,
        }
    }
}

/// Active catalog filter. Both parts must match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filter {
    /// Category part
    pub category: CategoryFilter,
    /// Lower-cased, trimmed search term; empty matches everything
    term: String,
}

impl Filter {
    /// Builds a filter, normalising the search term.
    #[must_use]
    pub fn new(category: CategoryFilter, term: &str) -> Self {
        Self {
            category,
            term: term.trim().to_lowercase(),
        }
    }

    /// Normalised search term.
    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    /// True when `product` passes both the category and the search term.
    #[must_use]
    pub fn matches(&self, product: &product::Model) -> bool {
        self.category.matches(product) && self.matches_term(product)
    }

    fn matches_term(&self, product: &product::Model) -> bool {
        if self.term.is_empty() {
            return true;
        }
        product.name.to_lowercase().contains(&self.term)
            || product
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&self.term))
    }
}

/// Products in presentation order plus the filtered view of them.
#[derive(Debug, Default)]
pub struct Catalog {
    order: CatalogOrder,
    products: Vec<product::Model>,
    filter: Filter,
    visible: Vec<product::Model>,
}

impl Catalog {
    /// Empty catalog using `order`.
    #[must_use]
    pub fn new(order: CatalogOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    /// Replaces the whole product set, reorders it and reapplies the current filter.
    pub fn replace_snapshot(&mut self, docs: &[product::Model]) {
        self.replace_snapshot_with_rng(docs, &mut rand::thread_rng());
    }

    /// Like [`Catalog::replace_snapshot`] with a caller supplied RNG for `Shuffle`.
    pub fn replace_snapshot_with_rng<R: Rng + ?Sized>(
        &mut self,
        docs: &[product::Model],
        rng: &mut R,
    ) {
        let mut products = docs.to_vec();
        match self.order {
            CatalogOrder::Newest => products.sort_by_key(|p| Reverse((p.created_at, p.id))),
            CatalogOrder::Shuffle => products.shuffle(rng),
        }
        self.products = products;
        self.recompute();
    }

    /// Sets the filter and returns the products that pass it.
    pub fn apply_filter(&mut self, category: CategoryFilter, term: &str) -> &[product::Model] {
        self.filter = Filter::new(category, term);
        self.recompute();
        &self.visible
    }

    /// Clears the search term, keeping the category.
    pub fn clear_search(&mut self) -> &[product::Model] {
        let category = self.filter.category;
        self.apply_filter(category, "")
    }

    /// Current filter.
    #[must_use]
    pub const fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Every loaded product in presentation order.
    #[must_use]
    pub fn products(&self) -> &[product::Model] {
        &self.products
    }

    /// Products passing the current filter, in presentation order.
    #[must_use]
    pub fn visible(&self) -> &[product::Model] {
        &self.visible
    }

    /// Loaded product with `id`.
    #[must_use]
    pub fn find(&self, id: i64) -> Option<&product::Model> {
        self.products.iter().find(|p| p.id == id)
    }

    fn recompute(&mut self) {
        self.visible = self
            .products
            .iter()
            .filter(|p| self.filter.matches(p))
            .cloned()
            .collect();
        trace!(
            loaded = self.products.len(),
            visible = self.visible.len(),
            "Catalog filter recomputed"
        );
    }
}

/// Image viewer state for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lightbox {
    /// Product being viewed
    pub product_id: i64,
    /// Product name
    pub title: String,
    /// Description, shown only when present
    pub description: Option<String>,
    images: Vec<String>,
    index: usize,
}

impl Lightbox {
    /// Opens on `product` at image `index`. Products without images cannot be opened.
    #[must_use]
    pub fn open(product: &product::Model, index: usize) -> Option<Self> {
        let images = product.images.0.clone();
        if images.is_empty() {
            return None;
        }
        let index = index.min(images.len() - 1);
        Some(Self {
            product_id: product.id,
            title: product.name.clone(),
            description: product.description.clone().filter(|d| !d.is_empty()),
            images,
            index,
        })
    }

    /// Image being shown.
    #[must_use]
    pub fn current(&self) -> &str {
        self.images.get(self.index).map_or("", String::as_str)
    }

    /// Position of the current image.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Number of images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Always false, an open lightbox has at least one image.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Moves to the next image, wrapping to the first.
    pub fn next(&mut self) -> &str {
        self.index = (self.index + 1) % self.images.len();
        self.current()
    }

    /// Moves to the previous image, wrapping to the last.
    pub fn prev(&mut self) -> &str {
        self.index = self.index.checked_sub(1).unwrap_or(self.images.len() - 1);
        self.current()
    }
}
