//! Payment gateway capability.
//!
//! The real payment provider is an opaque third-party widget; the
//! coordinator only ever needs two things from it - a client token and a
//! single-use nonce - so that is the whole trait. The HTTP implementation
//! talks to the backend's token endpoint and the gateway's tokenize
//! endpoint.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::StorefrontConfig;

/// Errors from the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned an error response.
    #[error("Gateway error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A gateway client token, fetched once per checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientToken(String);

impl ClientToken {
    /// Wrap a raw token value.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single-use payment nonce.
///
/// Implements `Debug` manually so the value never lands in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct PaymentNonce(String);

impl PaymentNonce {
    /// Wrap a raw nonce value.
    #[must_use]
    pub fn new(nonce: impl Into<String>) -> Self {
        Self(nonce.into())
    }

    /// The raw nonce value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PaymentNonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PaymentNonce").field(&"[REDACTED]").finish()
    }
}

/// Narrow capability interface over the payment provider.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Fetch a client token for this checkout session.
    ///
    /// # Errors
    ///
    /// Returns an error if the token service is unavailable.
    async fn client_token(&self) -> Result<ClientToken, PaymentError>;

    /// Exchange the client token for a single-use payment nonce.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the payment method.
    async fn request_nonce(&self, token: &ClientToken) -> Result<PaymentNonce, PaymentError>;
}

/// Payment gateway backed by the backend's payment endpoints.
#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    token_url: Url,
    nonce_url: Url,
}

impl HttpPaymentGateway {
    /// Create a gateway client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build or the endpoint
    /// URLs are invalid.
    pub fn new(config: &StorefrontConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            client,
            token_url: config.api_base_url.join("payment/token")?,
            nonce_url: config.api_base_url.join("payment/nonce")?,
        })
    }
}

impl PaymentGateway for HttpPaymentGateway {
    #[instrument(skip(self))]
    async fn client_token(&self) -> Result<ClientToken, PaymentError> {
        let response = self.client.get(self.token_url.clone()).send().await?;
        let body: TokenResponse = read_json(response).await?;
        Ok(ClientToken::new(body.client_token))
    }

    #[instrument(skip(self, token))]
    async fn request_nonce(&self, token: &ClientToken) -> Result<PaymentNonce, PaymentError> {
        let body = NonceRequest {
            client_token: token.as_str(),
        };
        let response = self
            .client
            .post(self.nonce_url.clone())
            .json(&body)
            .send()
            .await?;
        let body: NonceResponse = read_json(response).await?;
        Ok(PaymentNonce::new(body.nonce))
    }
}

/// Wire shape of the token endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    client_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NonceRequest<'a> {
    client_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct NonceResponse {
    nonce: String,
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, PaymentError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(PaymentError::Api {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }

    serde_json::from_str(&body).map_err(|e| PaymentError::Parse(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_debug_is_redacted() {
        let nonce = PaymentNonce::new("fake-valid-nonce");
        let debug_output = format!("{nonce:?}");
        assert!(!debug_output.contains("fake-valid-nonce"));
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn test_token_response_shape() {
        let body: TokenResponse =
            serde_json::from_str("{\"clientToken\": \"sandbox-token\"}").unwrap();
        assert_eq!(body.client_token, "sandbox-token");
    }

    #[test]
    fn test_payment_error_display() {
        let err = PaymentError::Api {
            status: 422,
            message: "card declined".to_string(),
        };
        assert_eq!(err.to_string(), "Gateway error: 422 - card declined");
    }
}
