//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_API_BASE_URL` - Base URL of the storefront backend API
//!
//! ## Optional
//! - `STOREFRONT_CART_PATH` - Path of the persisted cart file
//!   (default: `bramble-cart.json`)
//! - `STOREFRONT_HTTP_TIMEOUT_SECS` - Request timeout in seconds
//!   (default: 30)
//! - `STOREFRONT_CUSTOMER_EMAIL` - Email of the signed-in customer
//! - `STOREFRONT_DELIVERY_ADDRESS` - Delivery address used at checkout
//! - `STOREFRONT_AUTH_TOKEN` - Bearer token for authenticated endpoints

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_CART_PATH: &str = "bramble-cart.json";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the backend REST API. Always ends with a slash so
    /// relative joins append instead of replacing the last path segment.
    pub api_base_url: Url,
    /// Path of the persisted cart file.
    pub cart_path: PathBuf,
    /// Timeout applied to every outgoing HTTP request.
    pub http_timeout: Duration,
    /// The customer this client acts for.
    pub customer: CustomerProfile,
}

/// The customer identity carried by this client.
///
/// The token is minted elsewhere; this client only forwards it. Checkout
/// preconditions read the address and token, nothing else does.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone, Default)]
pub struct CustomerProfile {
    /// Customer email, if signed in.
    pub email: Option<String>,
    /// Delivery address used at checkout.
    pub delivery_address: Option<String>,
    /// Bearer token for authenticated endpoints.
    pub auth_token: Option<SecretString>,
}

impl CustomerProfile {
    /// Whether the customer is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }
}

impl std::fmt::Debug for CustomerProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerProfile")
            .field("email", &self.email)
            .field("delivery_address", &self.delivery_address)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(&get_required_env("STOREFRONT_API_BASE_URL")?)
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_API_BASE_URL".to_string(), e))?;

        let cart_path = PathBuf::from(get_env_or_default("STOREFRONT_CART_PATH", DEFAULT_CART_PATH));

        let timeout_secs = get_env_or_default(
            "STOREFRONT_HTTP_TIMEOUT_SECS",
            &DEFAULT_HTTP_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        let customer = CustomerProfile {
            email: get_optional_env("STOREFRONT_CUSTOMER_EMAIL"),
            delivery_address: get_optional_env("STOREFRONT_DELIVERY_ADDRESS"),
            auth_token: get_optional_env("STOREFRONT_AUTH_TOKEN").map(SecretString::from),
        };

        Ok(Self {
            api_base_url,
            cart_path,
            http_timeout: Duration::from_secs(timeout_secs),
            customer,
        })
    }
}

/// Parse and normalize an API base URL.
///
/// A trailing slash is appended when missing; `Url::join` treats the last
/// segment of a slashless base as a file name and would drop it.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let candidate = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };

    let url = Url::parse(&candidate).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err("URL cannot be used as a base".to_string());
    }
    Ok(url)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
