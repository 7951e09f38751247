//! Unified error handling.
//!
//! Provides a unified `AppError` for binaries that drive the whole flow.
//! Library modules keep their own error types; this is the roll-up the
//! CLI returns from a command.

use thiserror::Error;

use crate::cart::{CartError, StorageError};
use crate::catalog::CatalogError;
use crate::checkout::{CheckoutError, OrderError, PaymentError};
use crate::config::ConfigError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Catalog API operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Cart mutation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Cart persistence failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Checkout flow failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Payment gateway operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Orders API operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
