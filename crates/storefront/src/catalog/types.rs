//! Domain types for the catalog API.
//!
//! These mirror the backend's JSON shapes. Prices arrive as JSON numbers
//! and are decoded into [`Decimal`] so downstream arithmetic stays exact.

use bramble_core::{CategoryId, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Category Types
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Backend category ID.
    pub id: CategoryId,
    /// Display name (e.g., "Electronics").
    pub name: String,
    /// URL slug, when the backend provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

// =============================================================================
// Product Types
// =============================================================================

/// A product as served by the catalog API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Backend product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// URL slug used to fetch the product detail.
    pub slug: String,
    /// Long-form description.
    #[serde(default)]
    pub description: String,
    /// Base price before any attribute selection.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Category the product belongs to.
    pub category: Category,
    /// Variant attributes, in the order the merchant defined them.
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
    /// Units in stock, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
}

impl Product {
    /// Look up an attribute spec by key.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|spec| spec.key == key)
    }
}

/// A variant attribute on a product (e.g., "Size").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSpec {
    /// Attribute key, unique within a product.
    pub key: String,
    /// Options the customer can choose from, in merchant order.
    #[serde(default)]
    pub values: Vec<AttributeOption>,
}

impl AttributeSpec {
    /// Look up an option by its value.
    #[must_use]
    pub fn option(&self, value: &str) -> Option<&AttributeOption> {
        self.values.iter().find(|option| option.value == value)
    }
}

/// One choosable option of a variant attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeOption {
    /// Option value (e.g., "Large").
    pub value: String,
    /// Price delta added to the product's base price when selected.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}
