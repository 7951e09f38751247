//! Cart persistence.
//!
//! The cart lives in one JSON document at a well-known path. The storage
//! seam is a trait so the store can be tested against an in-memory fake
//! and so the persistence step stays a single swappable dependency.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::warn;

use super::types::PersistedCart;

/// Errors that can occur while persisting the cart.
///
/// Unreadable *content* is not an error: a corrupt document rehydrates as
/// an absent cart. Only I/O and serialization failures surface here.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cart could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable storage for the cart.
pub trait CartStorage {
    /// Read the persisted cart.
    ///
    /// Returns `Ok(None)` when nothing is persisted or the content is
    /// malformed; malformed content is logged and treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error only for I/O failures.
    fn load(&self) -> Result<Option<PersistedCart>, StorageError>;

    /// Write the cart, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be serialized or written.
    fn save(&mut self, cart: &PersistedCart) -> Result<(), StorageError>;

    /// Remove the persisted cart entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal fails.
    fn clear(&mut self) -> Result<(), StorageError>;
}

/// Cart storage backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct FileCartStorage {
    path: PathBuf,
}

impl FileCartStorage {
    /// Create storage rooted at the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file path this storage writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStorage for FileCartStorage {
    fn load(&self) -> Result<Option<PersistedCart>, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&raw) {
            Ok(cart) => Ok(Some(cart)),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "persisted cart is malformed, starting empty"
                );
                Ok(None)
            }
        }
    }

    fn save(&mut self, cart: &PersistedCart) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let raw = serde_json::to_string_pretty(cart)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory cart storage for tests.
///
/// Clones share the same backing slot, so a test can hold a handle and
/// inspect what the store persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryCartStorage {
    /// Create empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the raw persisted content, bypassing serialization.
    pub fn set_raw(&self, raw: impl Into<String>) {
        *self.lock() = Some(raw.into());
    }

    /// The raw persisted content, if any.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Result<Option<PersistedCart>, StorageError> {
        let Some(raw) = self.lock().clone() else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(cart) => Ok(Some(cart)),
            Err(e) => {
                warn!(error = %e, "persisted cart is malformed, starting empty");
                Ok(None)
            }
        }
    }

    fn save(&mut self, cart: &PersistedCart) -> Result<(), StorageError> {
        let raw = serde_json::to_string(cart)?;
        *self.lock() = Some(raw);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        *self.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn empty_cart() -> PersistedCart {
        PersistedCart {
            items: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    fn temp_cart_path() -> PathBuf {
        std::env::temp_dir().join(format!("bramble-cart-test-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_file_storage_round_trip() {
        let path = temp_cart_path();
        let mut storage = FileCartStorage::new(&path);

        let cart = empty_cart();
        storage.save(&cart).unwrap();

        let loaded = storage.load().unwrap().unwrap();
        assert_eq!(loaded, cart);

        storage.clear().unwrap();
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_file_storage_missing_file_is_empty() {
        let storage = FileCartStorage::new(temp_cart_path());
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_file_storage_corrupt_content_is_empty() {
        let path = temp_cart_path();
        std::fs::write(&path, "{ not json").unwrap();

        let mut storage = FileCartStorage::new(&path);
        assert!(storage.load().unwrap().is_none());

        storage.clear().unwrap();
    }

    #[test]
    fn test_file_storage_clear_is_idempotent() {
        let mut storage = FileCartStorage::new(temp_cart_path());
        storage.clear().unwrap();
        storage.clear().unwrap();
    }

    #[test]
    fn test_memory_storage_shares_slot_across_clones() {
        let storage = MemoryCartStorage::new();
        let mut writer = storage.clone();

        writer.save(&empty_cart()).unwrap();
        assert!(storage.raw().is_some());
        assert!(storage.load().unwrap().is_some());

        writer.clear().unwrap();
        assert!(storage.raw().is_none());
    }

    #[test]
    fn test_memory_storage_corrupt_content_is_empty() {
        let storage = MemoryCartStorage::new();
        storage.set_raw("]]]");
        assert!(storage.load().unwrap().is_none());
    }
}
