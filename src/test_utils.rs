//! Shared test utilities for the storefront.
//!
//! This module provides helpers for setting up an in-memory store and creating test
//! entities with sensible defaults.

use crate::{
    config::database::create_tables,
    core::{
        checkout::{CaptureDetails, Payer, PayerAddress, PaymentProvider, PaymentRequest},
        product::{self, NewProduct},
        session::{Registration, SessionRegistry},
    },
    entities::{OrderStatus, order, order::OrderItems, product::ImageList},
    errors::{Error, Result},
    models::{CartItem, CartKey},
    storage::MemoryStorage,
    store::{Collection, RemoteStore},
};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use sea_orm::{ActiveModelTrait, Set};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

/// Creates an in-memory `SQLite` store with all tables initialized.
/// This is the standard setup for all store-backed tests.
pub async fn setup_test_store() -> Result<RemoteStore> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    create_tables(&db).await?;
    RemoteStore::open(db).await
}

/// Fixed test clock: 2025-01-01 12:00 plus `minutes`.
pub fn at(minutes: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap_or_default()
        + TimeDelta::minutes(minutes)
}

/// Product model that never touched a store.
///
/// # Defaults
/// * `original_price`: 0 (no discount)
/// * `images`: one image named after the id
/// * `description`: None
pub fn product_model(id: i64, name: &str, category: &str, price: f64) -> crate::entities::product::Model {
    crate::entities::product::Model {
        id,
        name: name.to_string(),
        price,
        original_price: 0.0,
        category: category.to_string(),
        images: ImageList(vec![format!("https://img.test/{id}.jpg")]),
        description: None,
        created_at: at(0),
    }
}

/// Admin form input with one image and no description.
pub fn new_product(name: &str, category: &str, price: f64) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        price,
        original_price: 0.0,
        category: category.to_string(),
        images: vec!["https://img.test/product.jpg".to_string()],
        description: None,
    }
}

/// Creates a product in the store, created at [`at(0)`](at).
pub async fn create_test_product(
    store: &RemoteStore,
    name: &str,
    category: &str,
    price: f64,
) -> Result<crate::entities::product::Model> {
    product::create_product(store, new_product(name, category, price), at(0)).await
}

/// Registers a user named `name` with email `<name>@example.com`.
pub async fn create_test_user(store: &RemoteStore, name: &str) -> Result<crate::entities::user::Model> {
    let mut session = SessionRegistry::load(Arc::new(MemoryStorage::new()));
    let email = format!("{}@example.com", name.to_lowercase());
    session
        .register(store, &Registration::new(name, email, "555-0100"), at(0))
        .await
}

/// Cart line with size `M` and colour `Black`.
pub fn line(product_id: i64, name: &str, price: f64, quantity: u32) -> CartItem {
    CartItem {
        key: CartKey::new(product_id, "M", "Black"),
        name: name.to_string(),
        price,
        image: None,
        category: Some("clothing".to_string()),
        quantity,
    }
}

/// Pending order model that never touched a store.
pub fn order_model(id: i64, items: Vec<CartItem>, total: f64, created_at: NaiveDateTime) -> order::Model {
    order::Model {
        id,
        customer_id: 1,
        customer_name: "Alice".to_string(),
        customer_email: "alice@example.com".to_string(),
        customer_phone: "555-0100".to_string(),
        items: OrderItems(items),
        total,
        status: OrderStatus::Pending,
        payment_id: format!("pay-{id}"),
        shipping_address: None,
        created_at,
    }
}

/// Writes a pending order with one line straight to the store.
pub async fn create_test_order(store: &RemoteStore, payment_id: &str, total: f64) -> Result<order::Model> {
    let order = order::ActiveModel {
        customer_id: Set(1),
        customer_name: Set("Alice".to_string()),
        customer_email: Set("alice@example.com".to_string()),
        customer_phone: Set("555-0100".to_string()),
        items: Set(OrderItems(vec![line(1, "Runner", total, 1)])),
        total: Set(total),
        status: Set(OrderStatus::Pending),
        payment_id: Set(payment_id.to_string()),
        shipping_address: Set(None),
        created_at: Set(at(0)),
        ..Default::default()
    }
    .insert(store.db())
    .await?;
    store.refresh(Collection::Orders).await?;
    Ok(order)
}

/// Capture response for `payment_id`, shipped to Springfield.
pub fn capture(payment_id: &str) -> CaptureDetails {
    CaptureDetails {
        provider_order_id: payment_id.to_string(),
        payer: Payer {
            given_name: "Alice".to_string(),
            surname: Some("Smith".to_string()),
            email: Some("alice@example.com".to_string()),
            address: Some(PayerAddress {
                address_line_1: Some("1 Main St".to_string()),
                admin_area_2: Some("Springfield".to_string()),
                admin_area_1: Some("IL".to_string()),
                postal_code: Some("62701".to_string()),
                country_code: Some("US".to_string()),
            }),
        },
    }
}

/// Payment provider that answers every request the same way and records requests.
#[derive(Debug, Clone)]
pub struct ScriptedProvider {
    outcome: std::result::Result<String, String>,
    requests: Arc<Mutex<Vec<PaymentRequest>>>,
}

impl ScriptedProvider {
    /// Provider that creates orders with id `provider_order_id`.
    pub fn approving(provider_order_id: &str) -> Self {
        Self {
            outcome: Ok(provider_order_id.to_string()),
            requests: Arc::default(),
        }
    }

    /// Provider that rejects every order with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            requests: Arc::default(),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PaymentProvider for ScriptedProvider {
    fn create_order(&self, request: &PaymentRequest) -> impl Future<Output = Result<String>> + Send {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        let outcome = self
            .outcome
            .clone()
            .map_err(|message| Error::PaymentCapture { message });
        async move { outcome }
    }
}
