//! View sync: renderable view-models and the sink they are pushed to.
//!
//! Coordinators rebuild the affected [`Fragment`]s after every state change and hand
//! them to a [`ViewSink`]. A detached sink turns rendering into a no-op, which covers
//! snapshots that arrive after the view went away.

use crate::{
    core::{
        activity::DerivedCart,
        admin::{DashboardStats, UserRow},
        cart::CartStore,
        catalog::Lightbox,
        options::size_options_for,
    },
    entities::{order, product},
    models::{CartKey, format_price},
};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{info, trace};

/// Shown when a product has no image.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/200?text=Missing+Image";

/// One product tile in the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCard {
    /// Product id
    pub id: i64,
    /// Product name
    pub name: String,
    /// Category name
    pub category: String,
    /// First image or the placeholder
    pub thumbnail: String,
    /// Selling price, e.g. `$12.00`
    pub price_label: String,
    /// Crossed-out price, only when there is one
    pub original_price_label: Option<String>,
    /// Discount badge, only when positive
    pub discount_percent: Option<i64>,
}

impl ProductCard {
    /// Builds the card for `product`.
    #[must_use]
    pub fn from_product(product: &product::Model) -> Self {
        let has_original = product.original_price > 0.0;
        Self {
            id: product.id,
            name: product.name.clone(),
            category: product.category.clone(),
            thumbnail: product.thumbnail().unwrap_or(PLACEHOLDER_IMAGE).to_string(),
            price_label: format_price(product.price),
            original_price_label: has_original.then(|| format_price(product.original_price)),
            discount_percent: discount_percent(product.price, product.original_price),
        }
    }
}

/// `round((original - price) / original * 100)` when that is positive.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // rounded percentage of two prices
pub fn discount_percent(price: f64, original_price: f64) -> Option<i64> {
    if original_price <= 0.0 {
        return None;
    }
    let percent = ((original_price - price) / original_price * 100.0).round() as i64;
    (percent > 0).then_some(percent)
}

/// One line in the cart panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineView {
    /// Line identity, used by the +/- and remove controls
    pub key: CartKey,
    /// Product name
    pub name: String,
    /// Thumbnail or the placeholder
    pub image: String,
    /// Label for the size option (depends on category)
    pub size_label: &'static str,
    /// Unit price label
    pub price_label: String,
    /// Quantity
    pub quantity: u32,
}

/// The cart side panel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartPanel {
    /// Lines in cart order
    pub lines: Vec<CartLineView>,
    /// Badge count
    pub item_count: u64,
    /// Total label, e.g. `$20.00`
    pub total_label: String,
    /// Whether the payment button is offered
    pub checkout_enabled: bool,
}

impl CartPanel {
    /// Builds the panel from the cart's current lines.
    #[must_use]
    pub fn from_cart(cart: &CartStore) -> Self {
        let totals = cart.totals();
        Self {
            lines: cart
                .items()
                .iter()
                .map(|item| CartLineView {
                    key: item.key.clone(),
                    name: item.name.clone(),
                    image: item.image.clone().unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
                    size_label: size_options_for(item.category.as_deref().unwrap_or_default())
                        .label,
                    price_label: format_price(item.price),
                    quantity: item.quantity,
                })
                .collect(),
            item_count: totals.item_count,
            total_label: format_price(totals.amount),
            checkout_enabled: totals.amount > 0.0,
        }
    }
}

/// Lightbox contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightboxView {
    /// Image URL being shown
    pub image: String,
    /// Product name
    pub title: String,
    /// Description, only when the product has one
    pub description: Option<String>,
    /// 1-based position, e.g. 2 of 3
    pub position: (usize, usize),
}

impl From<&Lightbox> for LightboxView {
    fn from(lightbox: &Lightbox) -> Self {
        Self {
            image: lightbox.current().to_string(),
            title: lightbox.title.clone(),
            description: lightbox.description.clone(),
            position: (lightbox.index() + 1, lightbox.len()),
        }
    }
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Confirmation, e.g. "added to cart"
    Info,
    /// The action failed and can be retried
    Error,
    /// Payment taken but no order recorded; needs an operator
    Critical,
}

/// Everything a view can be asked to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Product grid; empty means "no products found"
    ProductGrid(Vec<ProductCard>),
    /// Cart side panel
    CartPanel(CartPanel),
    /// Name shown in the header
    UserBadge(String),
    /// Registration modal; blocks until a user registers
    RegistrationPrompt {
        /// Whether the modal is shown
        open: bool,
    },
    /// Lightbox, `None` when closed
    Lightbox(Option<LightboxView>),
    /// Payment button for the given amount, `None` to remove it
    PaymentButton(Option<String>),
    /// Payment button will be offered again after this delay
    PaymentRetry(Duration),
    /// Toast or alert
    Notice {
        /// Severity
        level: NoticeLevel,
        /// Text
        message: String,
    },
    /// Admin login screen vs dashboard
    AdminLogin {
        /// Whether the login screen is shown
        open: bool,
    },
    /// Admin dashboard figures
    Dashboard(DashboardStats),
    /// Admin product list
    AdminProducts(Vec<ProductCard>),
    /// Admin user list
    AdminUsers(Vec<UserRow>),
    /// Admin order list, newest first
    AdminOrders(Vec<order::Model>),
    /// Admin cart list
    AdminCarts(Vec<DerivedCart>),
}

impl Fragment {
    /// Convenience constructor for a notice.
    pub fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self::Notice {
            level,
            message: message.into(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::ProductGrid(_) => "product_grid",
            Self::CartPanel(_) => "cart_panel",
            Self::UserBadge(_) => "user_badge",
            Self::RegistrationPrompt { .. } => "registration_prompt",
            Self::Lightbox(_) => "lightbox",
            Self::PaymentButton(_) => "payment_button",
            Self::PaymentRetry(_) => "payment_retry",
            Self::Notice { .. } => "notice",
            Self::AdminLogin { .. } => "admin_login",
            Self::Dashboard(_) => "dashboard",
            Self::AdminProducts(_) => "admin_products",
            Self::AdminUsers(_) => "admin_users",
            Self::AdminOrders(_) => "admin_orders",
            Self::AdminCarts(_) => "admin_carts",
        }
    }
}

/// Receives fragments to draw.
pub trait ViewSink: Send {
    /// Draws or replaces one fragment.
    fn render(&mut self, fragment: Fragment);
}

/// Pushes fragments to an attached sink, or drops them once detached.
#[derive(Default)]
pub struct ViewSync {
    sink: Option<Box<dyn ViewSink>>,
}

impl std::fmt::Debug for ViewSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewSync")
            .field("attached", &self.sink.is_some())
            .finish()
    }
}

impl ViewSync {
    /// Sync attached to `sink`.
    pub fn new(sink: impl ViewSink + 'static) -> Self {
        Self {
            sink: Some(Box::new(sink)),
        }
    }

    /// Drops the sink; later renders are ignored.
    pub fn detach(&mut self) {
        self.sink = None;
    }

    /// Whether a sink is attached.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.sink.is_some()
    }

    /// Renders `fragment` if a sink is attached.
    pub fn render(&mut self, fragment: Fragment) {
        match self.sink.as_mut() {
            Some(sink) => {
                trace!(fragment = fragment.name(), "Rendering");
                sink.render(fragment);
            }
            None => trace!(fragment = fragment.name(), "View detached, render skipped"),
        }
    }
}

/// Sink that logs every fragment. Used by the headless binary to render the admin console.
#[derive(Debug, Default)]
pub struct TracingSink;

impl ViewSink for TracingSink {
    fn render(&mut self, fragment: Fragment) {
        info!(fragment = fragment.name(), "{fragment:?}");
    }
}

/// Sink that keeps every fragment; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    fragments: Arc<Mutex<Vec<Fragment>>>,
}

impl RecordingSink {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything rendered so far.
    #[must_use]
    pub fn fragments(&self) -> Vec<Fragment> {
        self.fragments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent fragment matching `pick`.
    pub fn last<T>(&self, pick: impl Fn(&Fragment) -> Option<T>) -> Option<T> {
        self.fragments().iter().rev().find_map(pick)
    }
}

impl ViewSink for RecordingSink {
    fn render(&mut self, fragment: Fragment) {
        self.fragments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(fragment);
    }
}
