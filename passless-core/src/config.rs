//! Client configuration.
//!
//! A [`ClientConfig`] is built once and handed to the client by value. There
//! are no setters on a live client: changing anything means building a new
//! config and calling `PasswordlessClient::reconfigure`.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{PasswordlessError, Result};
use crate::hint::HintStorage;
use crate::transport::TransportConfig;

/// What `register` does when the relying party rejects the completion call.
///
/// Historically this failure was logged and swallowed while every other
/// phase failure propagated. `Swallow` keeps that behaviour; `Report` makes
/// registration behave like sign-in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompleteFailurePolicy {
    Report,
    #[default]
    Swallow,
}

/// Immutable client configuration.
#[derive(Clone, PartialEq)]
pub struct ClientConfig {
    /// Base address of the relying-party service; endpoints resolve under it.
    pub api_url: Url,
    /// Sent in the `ApiKey` header on every call.
    pub api_key: String,
    /// Origin the ceremonies run for (`https://app.example.com`).
    pub origin: String,
    /// Relying-party identifier (`app.example.com`).
    pub rp_id: String,
    pub hint_storage: HintStorage,
    pub on_register_complete_failure: CompleteFailurePolicy,
    pub transport: TransportConfig,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("origin", &self.origin)
            .field("rp_id", &self.rp_id)
            .field("hint_storage", &self.hint_storage)
            .field(
                "on_register_complete_failure",
                &self.on_register_complete_failure,
            )
            .field("transport", &self.transport)
            .finish()
    }
}

impl ClientConfig {
    /// Create a configuration; the RP id defaults to the origin's host.
    pub fn new(api_url: &str, api_key: impl Into<String>, origin: &str) -> Result<Self> {
        let mut api_url = Url::parse(api_url)
            .map_err(|e| PasswordlessError::Config(format!("Invalid API URL '{api_url}': {e}")))?;
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }

        let parsed_origin = Url::parse(origin)
            .map_err(|e| PasswordlessError::Config(format!("Invalid origin '{origin}': {e}")))?;
        let rp_id = parsed_origin
            .host_str()
            .ok_or_else(|| PasswordlessError::Config(format!("Origin '{origin}' has no host")))?
            .to_string();

        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(PasswordlessError::Config("API key must not be empty".into()));
        }

        Ok(Self {
            api_url,
            api_key,
            origin: parsed_origin.origin().ascii_serialization(),
            rp_id,
            hint_storage: HintStorage::default(),
            on_register_complete_failure: CompleteFailurePolicy::default(),
            transport: TransportConfig::default(),
        })
    }

    /// Create configuration from environment variables.
    ///
    /// Required: `PASSLESS_API_URL`, `PASSLESS_API_KEY`, `PASSLESS_ORIGIN`
    /// Optional: `PASSLESS_RP_ID`, `PASSLESS_HINT_FILE`,
    /// `PASSLESS_STRICT_REGISTRATION`, `PASSLESS_TIMEOUT_SECS`,
    /// `PASSLESS_ALLOW_HTTP`
    pub fn from_env() -> Result<Self> {
        let api_url = required_env("PASSLESS_API_URL")?;
        let api_key = required_env("PASSLESS_API_KEY")?;
        let origin = required_env("PASSLESS_ORIGIN")?;

        let mut config = Self::new(&api_url, api_key, &origin)?;

        if let Ok(rp_id) = std::env::var("PASSLESS_RP_ID") {
            config = config.with_rp_id(rp_id);
        }

        if let Ok(path) = std::env::var("PASSLESS_HINT_FILE") {
            config = config.with_hint_storage(HintStorage::File {
                path: PathBuf::from(path),
            });
        }

        if env_flag("PASSLESS_STRICT_REGISTRATION") {
            config = config.with_register_complete_failure(CompleteFailurePolicy::Report);
        }

        let mut transport = TransportConfig::default();
        if let Some(secs) = std::env::var("PASSLESS_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            transport.timeout = Duration::from_secs(secs);
        }
        transport.https_only = !env_flag("PASSLESS_ALLOW_HTTP");

        Ok(config.with_transport(transport))
    }

    pub fn with_rp_id(mut self, rp_id: impl Into<String>) -> Self {
        self.rp_id = rp_id.into();
        self
    }

    pub fn with_hint_storage(mut self, hint_storage: HintStorage) -> Self {
        self.hint_storage = hint_storage;
        self
    }

    pub fn with_register_complete_failure(mut self, policy: CompleteFailurePolicy) -> Self {
        self.on_register_complete_failure = policy;
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Resolve an endpoint path (`register/begin`) against the base address.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.api_url
            .join(path)
            .map_err(|e| PasswordlessError::Config(format!("Invalid endpoint '{path}': {e}")))
    }
}

fn required_env(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| PasswordlessError::Config(format!("{name} environment variable not set")))
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
