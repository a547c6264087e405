//! Async HTTP transport
//!
//! The client core never talks to the network directly; it hands a
//! [`RequestSpec`] to a [`Transport`] and gets back a status code and a raw
//! body. [`ReqwestTransport`] is the production implementation; tests swap
//! in counting or canned transports.
//!
//! Timeouts and the user agent are transport configuration, not client
//! configuration — the core exposes no retry or cancellation policy.

use crate::error::{Error, Result};
use crate::request::RequestSpec;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// A raw transport-level response
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: Bytes,
}

/// Asynchronous request dispatch.
///
/// An implementation that cannot produce a response object at all should
/// return [`Error::NullResponse`]; a JSON `null` body is a valid empty
/// result and must be returned as a normal response instead.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Dispatch one request and await its response
    async fn send(&self, request: &RequestSpec) -> Result<RawResponse>;
}

/// Configuration for the reqwest-backed transport
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("dbflare-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Production transport backed by a pooled reqwest client
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with default configuration
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    /// Create a transport with custom configuration
    pub fn with_config(config: TransportConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &RequestSpec) -> Result<RawResponse> {
        let url = request.resolve_url()?;
        let mut req = self.client.request(request.method.clone(), url.clone());

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            req = req
                .header("content-type", "application/json;charset=UTF-8")
                .body(body.clone());
        }

        let response = req.send().await.map_err(Error::Http)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(Error::Http)?;
        debug!(%url, method = %request.method, status, "dispatched request");

        Ok(RawResponse { status, body })
    }
}
