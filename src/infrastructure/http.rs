//! HTTP transport for the tokenization endpoints.
//!
//! Wraps a `reqwest::Client` built once from [`CheckoutConfig`]. The public
//! key travels as the raw `Authorization` header value. Any status is a
//! response as far as this adapter is concerned; classification happens in
//! the pipeline.

use crate::config::CheckoutConfig;
use crate::domain::ports::TokenTransport;
use crate::domain::token::{
    CardTokenizationRequest, RawResponse, TransportError, WalletTokenizationRequest,
};
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct HttpTokenTransport {
    client: reqwest::Client,
    card_url: String,
    wallet_url: String,
}

impl HttpTokenTransport {
    pub fn new(config: &CheckoutConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CheckoutError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            card_url: config.environment.card_token_url(),
            wallet_url: config.environment.wallet_token_url(),
        })
    }

    /// Points both endpoints at `base_url` instead of the environment's host.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.card_url = format!("{base}/v2/tokens/card");
        self.wallet_url = format!("{base}/tokens");
        self
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        api_key: &str,
        body: &B,
    ) -> std::result::Result<RawResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, api_key)
            .json(body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::MalformedResponse {
                status,
                reason: format!("failed to read body: {e}"),
            })?;
        tracing::debug!(url, status, "token endpoint responded");
        Ok(RawResponse::new(status, body))
    }
}

fn map_send_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::Connection(e.to_string())
    } else {
        TransportError::Request(e.to_string())
    }
}

#[async_trait]
impl TokenTransport for HttpTokenTransport {
    async fn submit_card(
        &self,
        api_key: &str,
        request: &CardTokenizationRequest,
    ) -> std::result::Result<RawResponse, TransportError> {
        self.post(&self.card_url, api_key, request).await
    }

    async fn submit_wallet(
        &self,
        api_key: &str,
        request: &WalletTokenizationRequest,
    ) -> std::result::Result<RawResponse, TransportError> {
        self.post(&self.wallet_url, api_key, request).await
    }
}
