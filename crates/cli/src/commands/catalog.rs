//! Catalog browsing commands.
//!
//! List fetches recover from backend failures by rendering an empty list
//! after logging; only a direct product lookup surfaces its error.

use bramble_core::{CategoryId, Money};
use bramble_storefront::catalog::{CatalogClient, Product};
use bramble_storefront::config::StorefrontConfig;
use bramble_storefront::error::Result;
use rust_decimal::Decimal;

/// List a page of products.
pub async fn list_products(config: &StorefrontConfig, page: u32) -> Result<()> {
    let catalog = CatalogClient::new(config)?;

    let products = match catalog.products(page).await {
        Ok(products) => products,
        Err(e) => {
            tracing::warn!("Failed to fetch products: {e}");
            Vec::new()
        }
    };

    render_product_list(&products);
    Ok(())
}

/// Show one product in detail.
pub async fn show_product(config: &StorefrontConfig, slug: &str) -> Result<()> {
    let catalog = CatalogClient::new(config)?;
    let product = catalog.product_by_slug(slug).await?;

    tracing::info!("{} ({})", product.name, Money::usd(product.price));
    tracing::info!("  Category: {}", product.category.name);
    if !product.description.is_empty() {
        tracing::info!("  {}", product.description);
    }
    for spec in &product.attributes {
        let options: Vec<String> = spec
            .values
            .iter()
            .map(|option| format!("{} (+{})", option.value, Money::usd(option.price)))
            .collect();
        tracing::info!("  {}: {}", spec.key, options.join(", "));
    }

    let related = match catalog
        .related_products(&product.id, &product.category.id)
        .await
    {
        Ok(related) => related,
        Err(e) => {
            tracing::warn!("Failed to fetch related products: {e}");
            Vec::new()
        }
    };
    if !related.is_empty() {
        tracing::info!("Similar products:");
        render_product_list(&related);
    }

    Ok(())
}

/// List all categories.
pub async fn list_categories(config: &StorefrontConfig) -> Result<()> {
    let catalog = CatalogClient::new(config)?;

    let categories = match catalog.categories().await {
        Ok(categories) => categories,
        Err(e) => {
            tracing::warn!("Failed to fetch categories: {e}");
            Vec::new()
        }
    };

    for category in &categories {
        tracing::info!("{} ({})", category.name, category.id);
    }
    tracing::info!("{} categories", categories.len());
    Ok(())
}

/// Search products by category and price range.
pub async fn search(
    config: &StorefrontConfig,
    categories: Vec<String>,
    min: Option<Decimal>,
    max: Option<Decimal>,
    page: u32,
) -> Result<()> {
    let catalog = CatalogClient::new(config)?;

    let category_ids: Vec<CategoryId> = categories.into_iter().map(CategoryId::new).collect();
    let price_range = match (min, max) {
        (Some(min), Some(max)) => Some((min, max)),
        (Some(min), None) => Some((min, Decimal::MAX)),
        (None, Some(max)) => Some((Decimal::ZERO, max)),
        (None, None) => None,
    };

    let products = match catalog
        .filtered_products(&category_ids, price_range, page)
        .await
    {
        Ok(products) => products,
        Err(e) => {
            tracing::warn!("Failed to search products: {e}");
            Vec::new()
        }
    };

    render_product_list(&products);
    Ok(())
}

fn render_product_list(products: &[Product]) {
    for product in products {
        tracing::info!(
            "{}  {}  [{}]  {}",
            product.slug,
            Money::usd(product.price),
            product.category.name,
            product.name
        );
    }
    tracing::info!("{} product(s)", products.len());
}
