//! Catalog API client.
//!
//! # Architecture
//!
//! - Plain REST over `reqwest`; the backend is the source of truth - NO
//!   local sync, direct API calls
//! - In-memory caching via `moka` for catalog reads (5 minute TTL)
//! - Filtered queries bypass the cache, like any search
//!
//! # Example
//!
//! ```rust,ignore
//! use bramble_storefront::catalog::CatalogClient;
//!
//! let catalog = CatalogClient::new(&config)?;
//! let product = catalog.product_by_slug("canvas-tote").await?;
//! let related = catalog
//!     .related_products(&product.id, &product.category.id)
//!     .await?;
//! ```

mod cache;
pub mod types;

pub use types::{AttributeOption, AttributeSpec, Category, Product};

use std::sync::Arc;
use std::time::Duration;

use bramble_core::{CategoryId, ProductId};
use moka::future::Cache;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::StorefrontConfig;

use cache::CacheValue;

const CACHE_CAPACITY: u64 = 1000;
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Client for the storefront catalog API.
///
/// Product and category reads are cached for 5 minutes.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<String, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, CatalogError> {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.api_base_url.clone(),
                cache,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, CatalogError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Get a page of the product list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, page: u32) -> Result<Vec<Product>, CatalogError> {
        let cache_key = format!("products:{page}");

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let mut url = self.endpoint("catalog/products")?;
        url.query_pairs_mut().append_pair("page", &page.to_string());

        let response = self.inner.client.get(url).send().await?;
        let products: Vec<Product> = read_json(response).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get a product by its slug, attributes included.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request
    /// fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn product_by_slug(&self, slug: &str) -> Result<Product, CatalogError> {
        let cache_key = format!("product:{slug}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&format!("catalog/products/{slug}"))?;
        let response = self.inner.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(format!("product: {slug}")));
        }

        let product: Product = read_json(response).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get products related to the given product within a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn related_products(
        &self,
        product_id: &ProductId,
        category_id: &CategoryId,
    ) -> Result<Vec<Product>, CatalogError> {
        let url = self.endpoint(&format!(
            "catalog/products/{product_id}/related/{category_id}"
        ))?;
        let response = self.inner.client.get(url).send().await?;
        read_json(response).await
    }

    /// Get all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        let cache_key = "categories".to_string();

        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = self.endpoint("catalog/categories")?;
        let response = self.inner.client.get(url).send().await?;
        let categories: Vec<Category> = read_json(response).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// Get the total number of products in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn product_count(&self) -> Result<u64, CatalogError> {
        let url = self.endpoint("catalog/product-count")?;
        let response = self.inner.client.get(url).send().await?;
        let count: CountResponse = read_json(response).await?;
        Ok(count.total)
    }

    /// Get products filtered by category and price range.
    ///
    /// Filtered queries are not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, categories, price_range))]
    pub async fn filtered_products(
        &self,
        categories: &[CategoryId],
        price_range: Option<(Decimal, Decimal)>,
        page: u32,
    ) -> Result<Vec<Product>, CatalogError> {
        let url = self.endpoint("catalog/product-filters")?;

        let body = FilterRequest {
            categories: categories.to_vec(),
            price_range: price_range.map(|(min, max)| PriceRangeFilter { min, max }),
            page,
        };

        let response = self.inner.client.post(url).json(&body).send().await?;
        read_json(response).await
    }
}

/// Wire shape of the product count endpoint.
#[derive(Debug, serde::Deserialize)]
struct CountResponse {
    total: u64,
}

/// Request body of the product filter endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FilterRequest {
    categories: Vec<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price_range: Option<PriceRangeFilter>,
    page: u32,
}

#[derive(Debug, Serialize)]
struct PriceRangeFilter {
    #[serde(with = "rust_decimal::serde::float")]
    min: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    max: Decimal,
}

/// Check the response status and decode a JSON body.
///
/// Reads the body as text first so decode failures can be logged with
/// context instead of vanishing into a bare error.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, CatalogError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(CatalogError::Api {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse catalog response"
        );
        CatalogError::Parse(e.to_string())
    })
}
