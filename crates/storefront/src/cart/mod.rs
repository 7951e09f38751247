//! The cart store.
//!
//! One store instance owns the in-memory cart and its storage backend.
//! Every mutation writes through before returning, so the persisted
//! document always equals the in-memory state - there is no
//! eventual-consistency window. Rehydration happens in [`CartStore::open`]
//! and never fails: an absent or malformed document is an empty cart.
//!
//! Line items are identified two ways. Each line carries a locally
//! assigned [`LineItemId`], which `remove_line` and
//! `update_line_attribute` key off. The product-id operations
//! (`remove_product`, `update_attribute`) act on **every** line for that
//! product, the behavior the rest of the flow was built around.

pub mod pricing;
pub mod storage;
pub mod types;

pub use storage::{CartStorage, FileCartStorage, MemoryCartStorage, StorageError};
pub use types::{
    CartLineItem, PersistedCart, ProductSnapshot, SelectedAttribute, default_selection,
};

use std::collections::BTreeMap;

use bramble_core::{LineItemId, ProductId};
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Selection names an attribute the product does not have.
    #[error("product {product} has no attribute \"{key}\"")]
    UnknownAttribute { product: ProductId, key: String },

    /// Selection names an option the attribute does not offer.
    #[error("attribute \"{key}\" has no option \"{value}\"")]
    UnknownOption { key: String, value: String },

    /// Persisting the mutation failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The cart: an ordered sequence of line items plus a storage backend.
#[derive(Debug)]
pub struct CartStore<S> {
    items: Vec<CartLineItem>,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Open the cart, rehydrating from storage.
    ///
    /// Never fails: storage errors and malformed content both yield an
    /// empty cart after a logged warning.
    pub fn open(storage: S) -> Self {
        let items = match storage.load() {
            Ok(Some(persisted)) => {
                debug!(items = persisted.items.len(), "cart rehydrated");
                persisted.items
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read persisted cart, starting empty");
                Vec::new()
            }
        };

        Self { items, storage }
    }

    /// Line items in add order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Number of line items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a line item with an explicit attribute selection.
    ///
    /// Adding the same product twice yields two line items; there is no
    /// dedup.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection does not match the product's
    /// attribute specs, or if persisting fails.
    pub fn add(
        &mut self,
        product: ProductSnapshot,
        selected: BTreeMap<String, SelectedAttribute>,
    ) -> Result<LineItemId, CartError> {
        for (key, selection) in &selected {
            validate_selection(&product, key, &selection.value)?;
        }

        let line_id = LineItemId::new();
        self.items.push(CartLineItem {
            line_id,
            product,
            selected_attributes: selected,
        });
        self.persist()?;
        Ok(line_id)
    }

    /// Append a line item with the default selection: the first option of
    /// every attribute spec.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn add_with_defaults(&mut self, product: ProductSnapshot) -> Result<LineItemId, CartError> {
        let selected = default_selection(&product.attributes);
        self.add(product, selected)
    }

    /// Remove every line item for a product, whatever its selection.
    ///
    /// Returns how many line items were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn remove_product(&mut self, product_id: &ProductId) -> Result<usize, StorageError> {
        let before = self.items.len();
        self.items.retain(|item| item.product.id != *product_id);
        let removed = before - self.items.len();
        self.persist()?;
        Ok(removed)
    }

    /// Remove exactly one line item.
    ///
    /// Returns whether a line item with that ID existed.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn remove_line(&mut self, line_id: LineItemId) -> Result<bool, StorageError> {
        let before = self.items.len();
        self.items.retain(|item| item.line_id != line_id);
        let removed = before != self.items.len();
        self.persist()?;
        Ok(removed)
    }

    /// Set an attribute selection on every line item for a product.
    ///
    /// A product ID with no line items is a no-op, not an error. Returns
    /// how many line items were updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection does not match the snapshot's
    /// attribute specs, or if persisting fails.
    pub fn update_attribute(
        &mut self,
        product_id: &ProductId,
        key: &str,
        selected: SelectedAttribute,
    ) -> Result<usize, CartError> {
        // All snapshots of one product carry the same specs; validating
        // against the first match covers the rest.
        if let Some(item) = self.items.iter().find(|item| item.product.id == *product_id) {
            validate_selection(&item.product, key, &selected.value)?;
        }

        let mut updated = 0;
        for item in self
            .items
            .iter_mut()
            .filter(|item| item.product.id == *product_id)
        {
            item.selected_attributes
                .insert(key.to_string(), selected.clone());
            updated += 1;
        }

        self.persist()?;
        Ok(updated)
    }

    /// Set an attribute selection on exactly one line item.
    ///
    /// Returns whether a line item with that ID existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection does not match the snapshot's
    /// attribute specs, or if persisting fails.
    pub fn update_line_attribute(
        &mut self,
        line_id: LineItemId,
        key: &str,
        selected: SelectedAttribute,
    ) -> Result<bool, CartError> {
        let Some(item) = self.items.iter_mut().find(|item| item.line_id == line_id) else {
            self.persist()?;
            return Ok(false);
        };

        validate_selection(&item.product, key, &selected.value)?;
        item.selected_attributes.insert(key.to_string(), selected);
        self.persist()?;
        Ok(true)
    }

    /// Empty the cart and remove the persisted document.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted document cannot be removed.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.items.clear();
        self.storage.clear()
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        self.storage.save(&PersistedCart {
            items: self.items.clone(),
            updated_at: Utc::now(),
        })
    }
}

fn validate_selection(
    product: &ProductSnapshot,
    key: &str,
    value: &str,
) -> Result<(), CartError> {
    let spec = product
        .attribute(key)
        .ok_or_else(|| CartError::UnknownAttribute {
            product: product.id.clone(),
            key: key.to_string(),
        })?;

    if spec.option(value).is_none() {
        return Err(CartError::UnknownOption {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}
