//! Cart data types.
//!
//! A line item snapshots the product it was added from, so later catalog
//! edits do not rewrite carts that are already persisted. The snapshot
//! keeps the attribute specs; attribute updates are validated against them.

use std::collections::BTreeMap;

use bramble_core::{LineItemId, ProductId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::types::{AttributeOption, AttributeSpec, Product};

/// The chosen option for one attribute key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedAttribute {
    /// Chosen option value (e.g., "Large").
    pub value: String,
    /// Price delta carried by the chosen option.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl From<&AttributeOption> for SelectedAttribute {
    fn from(option: &AttributeOption) -> Self {
        Self {
            value: option.value.clone(),
            price: option.price,
        }
    }
}

/// The slice of a product a cart line item keeps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    /// Backend product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: String,
    /// Base price at the time the item was added.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Attribute specs at the time the item was added.
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
}

impl ProductSnapshot {
    /// Look up an attribute spec by key.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|spec| spec.key == key)
    }
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: product.price,
            attributes: product.attributes.clone(),
        }
    }
}

/// One entry in the cart: one unit of a product with a specific attribute
/// selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// Locally assigned line identifier.
    pub line_id: LineItemId,
    /// Product snapshot taken at add time.
    pub product: ProductSnapshot,
    /// Selected attribute per key. Keys always name a spec on the
    /// snapshot; values are always one of that spec's options.
    #[serde(default)]
    pub selected_attributes: BTreeMap<String, SelectedAttribute>,
}

/// The persisted on-disk shape of the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCart {
    /// Line items, in add order.
    pub items: Vec<CartLineItem>,
    /// When the cart was last written.
    pub updated_at: DateTime<Utc>,
}

/// Build the default selection for a set of attribute specs: the first
/// option of every spec, the way the product page preselects variants.
/// Specs without options contribute nothing.
#[must_use]
pub fn default_selection(specs: &[AttributeSpec]) -> BTreeMap<String, SelectedAttribute> {
    specs
        .iter()
        .filter_map(|spec| {
            spec.values
                .first()
                .map(|option| (spec.key.clone(), SelectedAttribute::from(option)))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn spec(key: &str, options: &[(&str, i64)]) -> AttributeSpec {
        AttributeSpec {
            key: key.to_string(),
            values: options
                .iter()
                .map(|(value, cents)| AttributeOption {
                    value: (*value).to_string(),
                    price: Decimal::new(*cents, 2),
                })
                .collect(),
        }
    }

    #[test]
    fn test_default_selection_picks_first_options() {
        let specs = vec![
            spec("Size", &[("Regular", 0), ("Large", 500)]),
            spec("Color", &[("Black", 0), ("Red", 150)]),
        ];

        let selected = default_selection(&specs);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected["Size"].value, "Regular");
        assert_eq!(selected["Color"].price, Decimal::ZERO);
    }

    #[test]
    fn test_default_selection_skips_empty_specs() {
        let specs = vec![spec("Engraving", &[])];
        assert!(default_selection(&specs).is_empty());
    }

    #[test]
    fn test_line_item_round_trip() {
        let item = CartLineItem {
            line_id: LineItemId::new(),
            product: ProductSnapshot {
                id: ProductId::new("p1"),
                name: "Canvas Tote".to_string(),
                slug: "canvas-tote".to_string(),
                price: Decimal::new(2000, 2),
                attributes: vec![spec("Size", &[("Regular", 0), ("Large", 500)])],
            },
            selected_attributes: BTreeMap::from([(
                "Size".to_string(),
                SelectedAttribute {
                    value: "Large".to_string(),
                    price: Decimal::new(500, 2),
                },
            )]),
        };

        let json = serde_json::to_string(&item).unwrap();
        let back: CartLineItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }
}
