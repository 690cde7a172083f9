//! Product business logic - admin-side catalog maintenance.
//!
//! Products are created and deleted from the admin console (and seeded from config on
//! first run). Every successful write republishes the product snapshot.

use crate::{
    config::shop::ProductSeed,
    entities::{Product, product, product::ImageList},
    errors::{Error, Result},
    store::{Collection, RemoteStore},
};
use chrono::NaiveDateTime;
use sea_orm::{PaginatorTrait, Set, prelude::*};
use tracing::info;

/// Fields for a new product, as entered in the admin form.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    /// Product name
    pub name: String,
    /// Selling price
    pub price: f64,
    /// Price before discount, 0 for none
    pub original_price: f64,
    /// Category name
    pub category: String,
    /// Image URLs; blank entries are dropped
    pub images: Vec<String>,
    /// Optional description; blank counts as none
    pub description: Option<String>,
}

impl From<ProductSeed> for NewProduct {
    fn from(seed: ProductSeed) -> Self {
        Self {
            name: seed.name,
            price: seed.price,
            original_price: seed.original_price,
            category: seed.category,
            images: seed.images,
            description: seed.description,
        }
    }
}

fn validate_amount(amount: f64) -> Result<f64> {
    if amount < 0.0 || !amount.is_finite() {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(amount)
}

/// Creates a product; the store assigns its id.
///
/// # Errors
/// - [`Error::Validation`] if the name or category is blank
/// - [`Error::InvalidAmount`] if a price is negative or not finite
/// - [`Error::RemoteWrite`] if the insert fails
pub async fn create_product(
    store: &RemoteStore,
    fields: NewProduct,
    now: NaiveDateTime,
) -> Result<product::Model> {
    if fields.name.trim().is_empty() {
        return Err(Error::validation("Product name cannot be empty"));
    }
    if fields.category.trim().is_empty() {
        return Err(Error::validation("Product category cannot be empty"));
    }
    let price = validate_amount(fields.price)?;
    let original_price = validate_amount(fields.original_price)?;

    let images = fields
        .images
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect();

    let product = product::ActiveModel {
        name: Set(fields.name.trim().to_string()),
        price: Set(price),
        original_price: Set(original_price),
        category: Set(fields.category.trim().to_string()),
        images: Set(ImageList(images)),
        description: Set(fields.description.filter(|d| !d.trim().is_empty())),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(store.db())
    .await
    .map_err(|e| Error::remote_write(Collection::Products, e))?;

    info!(product_id = product.id, name = %product.name, "Created product");
    store.publish_after_write(Collection::Products).await;
    Ok(product)
}

/// Deletes a product. Carts and orders keep their own copies of its details.
///
/// # Errors
/// - [`Error::ProductNotFound`] if no product has this id
/// - [`Error::RemoteWrite`] if the delete fails
pub async fn delete_product(store: &RemoteStore, product_id: i64) -> Result<()> {
    let result = Product::delete_by_id(product_id)
        .exec(store.db())
        .await
        .map_err(|e| Error::remote_write(Collection::Products, e))?;
    if result.rows_affected == 0 {
        return Err(Error::ProductNotFound { id: product_id });
    }
    info!(product_id, "Deleted product");
    store.publish_after_write(Collection::Products).await;
    Ok(())
}

/// Inserts `seeds` when the products collection is empty. Returns how many were added.
pub async fn seed_catalog(
    store: &RemoteStore,
    seeds: &[ProductSeed],
    now: NaiveDateTime,
) -> Result<usize> {
    if Product::find().count(store.db()).await? > 0 {
        return Ok(0);
    }
    for seed in seeds {
        create_product(store, NewProduct::from(seed.clone()), now).await?;
    }
    Ok(seeds.len())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::{at, new_product, setup_test_store};

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let store = setup_test_store().await?;

        let blank = NewProduct {
            name: "  ".to_string(),
            ..new_product("x", "home", 1.0)
        };
        assert!(matches!(
            create_product(&store, blank, at(0)).await,
            Err(Error::Validation { .. })
        ));

        let negative = new_product("Lamp", "home", -1.0);
        assert!(matches!(
            create_product(&store, negative, at(0)).await,
            Err(Error::InvalidAmount { amount }) if amount == -1.0
        ));

        let nan_original = NewProduct {
            original_price: f64::NAN,
            ..new_product("Lamp", "home", 1.0)
        };
        assert!(matches!(
            create_product(&store, nan_original, at(0)).await,
            Err(Error::InvalidAmount { .. })
        ));

        let no_category = new_product("Lamp", " ", 1.0);
        assert!(matches!(
            create_product(&store, no_category, at(0)).await,
            Err(Error::Validation { .. })
        ));

        assert!(store.products().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_cleans_fields() -> Result<()> {
        let store = setup_test_store().await?;
        let fields = NewProduct {
            images: vec!["a.jpg".into(), " ".into(), String::new(), "b.jpg".into()],
            description: Some("   ".into()),
            ..new_product(" Lamp ", "home", 20.0)
        };

        let product = create_product(&store, fields, at(0)).await?;

        assert_eq!(product.name, "Lamp");
        assert_eq!(product.images, ImageList(vec!["a.jpg".into(), "b.jpg".into()]));
        assert!(product.description.is_none());
        assert_eq!(store.products().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product() -> Result<()> {
        let store = setup_test_store().await?;
        let product = create_product(&store, new_product("Lamp", "home", 20.0), at(0)).await?;

        delete_product(&store, product.id).await?;
        assert!(store.products().is_empty());

        let again = delete_product(&store, product.id).await;
        assert!(matches!(again, Err(Error::ProductNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_only_fills_empty_catalog() -> Result<()> {
        let store = setup_test_store().await?;
        let seeds = vec![ProductSeed {
            name: "Runner".into(),
            price: 50.0,
            original_price: 70.0,
            category: "shoes".into(),
            images: vec!["r.jpg".into()],
            description: None,
        }];

        assert_eq!(seed_catalog(&store, &seeds, at(0)).await?, 1);
        assert_eq!(seed_catalog(&store, &seeds, at(1)).await?, 0);
        assert_eq!(store.products().len(), 1);
        assert_eq!(store.products()[0].original_price, 70.0);
        Ok(())
    }
}
