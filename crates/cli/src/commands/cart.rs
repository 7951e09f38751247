//! Cart commands.
//!
//! The cart is opened from the configured file, mutated through the store
//! contract, and left persisted by the store itself.

use bramble_core::{LineItemId, Money, ProductId};
use bramble_storefront::cart::{
    CartStore, FileCartStorage, ProductSnapshot, SelectedAttribute, default_selection, pricing,
};
use bramble_storefront::catalog::CatalogClient;
use bramble_storefront::config::StorefrontConfig;
use bramble_storefront::error::{AppError, Result};

fn open_cart(config: &StorefrontConfig) -> CartStore<FileCartStorage> {
    CartStore::open(FileCartStorage::new(&config.cart_path))
}

/// Show the cart with line prices and the total.
pub fn show(config: &StorefrontConfig) {
    let cart = open_cart(config);

    if cart.is_empty() {
        tracing::info!("Your cart is empty");
        return;
    }

    for item in cart.items() {
        let selection: Vec<String> = item
            .selected_attributes
            .iter()
            .map(|(key, selected)| format!("{key}={}", selected.value))
            .collect();
        let selection = if selection.is_empty() {
            String::new()
        } else {
            format!("  [{}]", selection.join(", "))
        };

        tracing::info!(
            "{}  {}  {}{}",
            item.line_id,
            Money::usd(pricing::line_item_price(item)),
            item.product.name,
            selection
        );
    }

    tracing::info!(
        "{} item(s), total {}",
        pricing::item_count(cart.items()),
        Money::usd(pricing::cart_total(cart.items()))
    );
}

/// Add a product to the cart by slug.
///
/// Unspecified attributes default to the product's first option, the same
/// preselection the product page shows.
pub async fn add(config: &StorefrontConfig, slug: &str, attrs: &[String]) -> Result<()> {
    let catalog = CatalogClient::new(config)?;
    let product = catalog.product_by_slug(slug).await?;

    let mut selected = default_selection(&product.attributes);
    for raw in attrs {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| AppError::BadRequest(format!("expected key=value, got \"{raw}\"")))?;

        let spec = product.attribute(key).ok_or_else(|| {
            AppError::BadRequest(format!("product has no attribute \"{key}\""))
        })?;
        let option = spec.option(value).ok_or_else(|| {
            AppError::BadRequest(format!("attribute \"{key}\" has no option \"{value}\""))
        })?;

        selected.insert(key.to_string(), SelectedAttribute::from(option));
    }

    let mut cart = open_cart(config);
    let line_id = cart.add(ProductSnapshot::from(&product), selected)?;

    tracing::info!("Added {} to cart (line {line_id})", product.name);
    tracing::info!(
        "{} item(s), total {}",
        cart.len(),
        Money::usd(pricing::cart_total(cart.items()))
    );
    Ok(())
}

/// Remove every line item for a product.
pub fn remove(config: &StorefrontConfig, product_id: &str) -> Result<()> {
    let mut cart = open_cart(config);
    let removed = cart.remove_product(&ProductId::new(product_id))?;

    if removed == 0 {
        tracing::info!("No items for product {product_id}");
    } else {
        tracing::info!("Removed {removed} item(s)");
    }
    Ok(())
}

/// Remove one line item.
pub fn remove_line(config: &StorefrontConfig, line_id: LineItemId) -> Result<()> {
    let mut cart = open_cart(config);

    if cart.remove_line(line_id)? {
        tracing::info!("Removed line {line_id}");
    } else {
        tracing::info!("No line {line_id} in cart");
    }
    Ok(())
}

/// Change an attribute selection on every line item for a product.
///
/// A product that is not in the cart is a no-op, matching the store
/// contract.
pub fn set_attribute(
    config: &StorefrontConfig,
    product_id: &str,
    key: &str,
    value: &str,
) -> Result<()> {
    let mut cart = open_cart(config);
    let product_id = ProductId::new(product_id);

    // The option's price delta comes from the snapshot the cart already
    // holds; no catalog round trip.
    let Some(item) = cart
        .items()
        .iter()
        .find(|item| item.product.id == product_id)
    else {
        tracing::info!("No items for product {product_id}");
        return Ok(());
    };

    let option = item
        .product
        .attribute(key)
        .and_then(|spec| spec.option(value))
        .ok_or_else(|| {
            AppError::BadRequest(format!("no option \"{value}\" for attribute \"{key}\""))
        })?;
    let selected = SelectedAttribute::from(option);

    let updated = cart.update_attribute(&product_id, key, selected)?;
    tracing::info!("Updated {updated} item(s): {key}={value}");
    tracing::info!("Total {}", Money::usd(pricing::cart_total(cart.items())));
    Ok(())
}

/// Empty the cart.
pub fn clear(config: &StorefrontConfig) -> Result<()> {
    let mut cart = open_cart(config);
    cart.clear()?;
    tracing::info!("Cart cleared");
    Ok(())
}
