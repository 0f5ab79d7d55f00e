//! Begin/complete ceremony protocol.
//!
//! Both ceremonies follow the same linear shape:
//!
//! ```text
//! begin (relying party) -> Begun -> platform create/get -> PlatformInvoked -> complete -> Completed
//! ```
//!
//! Each state is a value consumed by the next transition, so a ceremony can
//! neither skip a phase nor run one twice. Nothing is retried: the first
//! failure ends the ceremony.
//!
//! - `registration` - credential creation (`register/begin`, `register/complete`)
//! - `signin` - assertion (`signin/begin`, `signin/complete`)
//! - `wire` - JSON shapes exchanged with the relying party

pub mod registration;
pub mod signin;
pub mod wire;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Ceremony, PasswordlessError, Result};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

use wire::{BeginResponse, CompleteRequest};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "ApiKey";

/// Server-issued correlation token for one ceremony.
///
/// Not `Clone`: it is moved into the single complete call that echoes it.
#[derive(Debug, PartialEq, Eq)]
pub struct Session(String);

impl Session {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Calls to the relying-party service for one client configuration.
pub(crate) struct RelyingPartyApi<'a> {
    config: &'a ClientConfig,
    transport: &'a dyn HttpTransport,
}

impl<'a> RelyingPartyApi<'a> {
    pub(crate) fn new(config: &'a ClientConfig, transport: &'a dyn HttpTransport) -> Self {
        Self { config, transport }
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        self.config
    }

    /// POST a JSON body. `Err` carries a human-readable reason; non-success
    /// statuses come back as `Ok` for the caller to classify.
    async fn post(&self, path: &str, body: Value) -> std::result::Result<HttpResponse, String> {
        let url = self.config.endpoint(path).map_err(|e| e.to_string())?;

        let request = HttpRequest::post(url, body)
            .header("Accept", "application/json")
            .header(API_KEY_HEADER, self.config.api_key.as_str())
            .header("Content-Type", "application/json");

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| e.to_string())?;

        debug!(path, status = response.status, "Relying party responded");
        Ok(response)
    }

    /// Phase 1: obtain options and a session.
    pub(crate) async fn begin<O: DeserializeOwned>(
        &self,
        ceremony: Ceremony,
        path: &str,
        body: impl Serialize,
    ) -> Result<(O, Session)> {
        let failed = |reason: String| PasswordlessError::BeginFailed { ceremony, reason };

        let body = to_json(body)?;
        let response = self.post(path, body).await.map_err(failed)?;
        if !response.is_success() {
            return Err(failed(describe_failure(&response)));
        }

        let begin: BeginResponse<O> = serde_json::from_value(response.body)
            .map_err(|e| failed(format!("Malformed begin response: {e}")))?;

        Ok((begin.data, Session(begin.session_id)))
    }

    /// Phase 5: hand the adapted credential back with its session.
    pub(crate) async fn complete(
        &self,
        ceremony: Ceremony,
        path: &str,
        credential: impl Serialize,
        session: Session,
    ) -> Result<Value> {
        let failed = |reason: String| PasswordlessError::CompleteFailed { ceremony, reason };

        let body = to_json(CompleteRequest {
            response: credential,
            session_id: session.as_str(),
            rp_id: &self.config.rp_id,
            origin: &self.config.origin,
        })?;

        let response = self.post(path, body).await.map_err(failed)?;
        if !response.is_success() {
            return Err(failed(describe_failure(&response)));
        }

        Ok(response.body)
    }
}

fn to_json(body: impl Serialize) -> Result<Value> {
    serde_json::to_value(body)
        .map_err(|e| PasswordlessError::Encoding(format!("Failed to serialize request: {e}")))
}

/// `status 409: <title>` using whichever message field the server sent.
fn describe_failure(response: &HttpResponse) -> String {
    let message = ["title", "message", "error", "detail"]
        .iter()
        .find_map(|key| response.body.get(*key).and_then(Value::as_str));

    match message {
        Some(message) => format!("status {}: {message}", response.status),
        None => format!("status {}", response.status),
    }
}
