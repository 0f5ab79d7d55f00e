//! HTTP transport boundary.
//!
//! The ceremony protocol only needs "send this JSON, give me the status and
//! the JSON back". [`HttpTransport`] is that call; [`ReqwestTransport`] is the
//! native implementation and the browser binding provides a `fetch` one.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Transport-level failure: nothing usable came back from the server.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("HTTP transport error: {0}")]
    Other(String),
}

#[cfg(feature = "network")]
impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            Self::Body(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// A JSON `POST` request; every relying-party call carries a body.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn post(url: Url, body: Value) -> Self {
        Self {
            url,
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header with `name`, compared case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and parsed body. An empty or non-JSON body is `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Parse a response body leniently: anything that is not JSON becomes null.
pub fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes).unwrap_or(Value::Null)
}

/// Generic request/response call to the relying party.
#[async_trait(?Send)]
pub trait HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Settings for the native HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Request timeout. Does not cover the user prompt, which is not HTTP.
    pub timeout: Duration,
    /// Refuse plain-HTTP relying parties.
    pub https_only: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            https_only: true,
        }
    }
}

#[cfg(feature = "network")]
pub use reqwest_impl::ReqwestTransport;

#[cfg(feature = "network")]
mod reqwest_impl {
    use std::time::Instant;

    use async_trait::async_trait;
    use reqwest::Client;
    use tracing::{debug, instrument, warn};

    use super::{
        parse_body, HttpRequest, HttpResponse, HttpTransport, TransportConfig, TransportError,
    };
    use crate::error::{PasswordlessError, Result};

    /// `reqwest`-backed transport with timeout and TLS enforcement.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: Client,
    }

    impl ReqwestTransport {
        /// Create a new HTTP client with the given configuration.
        pub fn new(config: &TransportConfig) -> Result<Self> {
            let client = Client::builder()
                .timeout(config.timeout)
                .https_only(config.https_only)
                .build()
                .map_err(|e| {
                    PasswordlessError::Config(format!("Failed to create HTTP client: {e}"))
                })?;

            Ok(Self { client })
        }
    }

    #[async_trait(?Send)]
    impl HttpTransport for ReqwestTransport {
        #[instrument(
            level = "debug",
            skip_all,
            fields(url = %request.url)
        )]
        async fn send(
            &self,
            request: HttpRequest,
        ) -> std::result::Result<HttpResponse, TransportError> {
            let start = Instant::now();

            let mut builder = self.client.post(request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &request.body {
                builder = builder.body(body.to_string());
            }

            let response = builder.send().await.map_err(|e| {
                let latency_ms = start.elapsed().as_millis();
                warn!(error = %e, latency_ms = latency_ms as u64, "Request failed");
                TransportError::from(e)
            })?;

            let status = response.status();
            let bytes = response.bytes().await?;

            let latency_ms = start.elapsed().as_millis();
            debug!(status = %status, latency_ms = latency_ms as u64, "Received HTTP response");

            Ok(HttpResponse::new(status.as_u16(), parse_body(&bytes)))
        }
    }
}
