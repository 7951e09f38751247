//! Order submission and history.
//!
//! Orders are created by redeeming a payment nonce together with the cart
//! contents. The gateway is a trait so the checkout coordinator tests
//! against a fake; the HTTP implementation posts to the backend.

use bramble_core::{Money, OrderId, OrderStatus};
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::cart::CartLineItem;
use crate::checkout::gateway::PaymentNonce;
use crate::config::{CustomerProfile, StorefrontConfig};

/// Errors from the orders API.
#[derive(Debug, Error)]
pub enum OrderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// No auth token to call an authenticated endpoint with.
    #[error("customer is not signed in")]
    Unauthenticated,

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Confirmation returned when an order is created; also the row shape of
/// the order-history view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    /// Backend order ID.
    pub order_id: OrderId,
    /// Current fulfillment status.
    pub status: OrderStatus,
    /// Charged total.
    pub total: Money,
    /// When the order was placed.
    pub placed_at: DateTime<Utc>,
}

/// Order creation and history against the backend.
#[allow(async_fn_in_trait)]
pub trait OrderGateway {
    /// Redeem a nonce and the cart contents for a new order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects or fails the submission.
    async fn submit(
        &self,
        nonce: &PaymentNonce,
        items: &[CartLineItem],
        customer: &CustomerProfile,
    ) -> Result<OrderConfirmation, OrderError>;

    /// Fetch the customer's order history, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    async fn history(&self, customer: &CustomerProfile) -> Result<Vec<OrderConfirmation>, OrderError>;
}

/// Order gateway backed by the backend's orders endpoints.
#[derive(Clone)]
pub struct HttpOrderGateway {
    client: reqwest::Client,
    orders_url: Url,
}

impl HttpOrderGateway {
    /// Create an orders client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build or the endpoint
    /// URL is invalid.
    pub fn new(config: &StorefrontConfig) -> Result<Self, OrderError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            client,
            orders_url: config.api_base_url.join("orders")?,
        })
    }
}

impl OrderGateway for HttpOrderGateway {
    #[instrument(skip_all, fields(items = items.len()))]
    async fn submit(
        &self,
        nonce: &PaymentNonce,
        items: &[CartLineItem],
        customer: &CustomerProfile,
    ) -> Result<OrderConfirmation, OrderError> {
        let token = customer
            .auth_token
            .as_ref()
            .ok_or(OrderError::Unauthenticated)?;

        let body = OrderRequest {
            nonce: nonce.as_str(),
            cart: items,
        };

        let response = self
            .client
            .post(self.orders_url.clone())
            .bearer_auth(token.expose_secret())
            .json(&body)
            .send()
            .await?;

        read_json(response).await
    }

    #[instrument(skip_all)]
    async fn history(
        &self,
        customer: &CustomerProfile,
    ) -> Result<Vec<OrderConfirmation>, OrderError> {
        let token = customer
            .auth_token
            .as_ref()
            .ok_or(OrderError::Unauthenticated)?;

        let response = self
            .client
            .get(self.orders_url.clone())
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        read_json(response).await
    }
}

/// Wire shape of order creation.
#[derive(Debug, Serialize)]
struct OrderRequest<'a> {
    nonce: &'a str,
    cart: &'a [CartLineItem],
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, OrderError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(OrderError::Api {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }

    serde_json::from_str(&body).map_err(|e| OrderError::Parse(e.to_string()))
}
