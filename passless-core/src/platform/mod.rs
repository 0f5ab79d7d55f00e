//! Platform public-key credential provider boundary.
//!
//! The platform is the only party that talks to an authenticator: it shows
//! the biometric/PIN/security-key prompt and hands back a credential. This
//! module defines the native (raw byte buffer) shapes it consumes and
//! produces, and the [`PlatformCredentials`] trait implemented by:
//!
//! - **MockPlatform** - deterministic software authenticator (tests, CLI `--mock`)
//! - **BrowserPlatform** - `navigator.credentials`, in the `passless-wasm` crate

mod mock;

pub use mock::MockPlatform;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error reported by the platform provider, kept verbatim for diagnostics.
///
/// `name` follows the DOMException naming used by browsers
/// (`NotAllowedError`, `InvalidStateError`, `AbortError`, ...).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{name}: {message}")]
pub struct PlatformError {
    pub name: String,
    pub message: String,
}

impl PlatformError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// The user dismissed the prompt, or the platform timed out.
    pub fn not_allowed(message: impl Into<String>) -> Self {
        Self::new("NotAllowedError", message)
    }

    /// The authenticator already holds a credential from the exclusion list.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new("InvalidStateError", message)
    }
}

/// Relying-party entity. Carries no binary data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelyingParty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// User entity with a decoded user handle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    pub id: Vec<u8>,
    pub name: String,
    pub display_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Credential descriptor with a decoded credential id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialDescriptor {
    #[serde(rename = "type")]
    pub credential_type: String,
    pub id: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transports: Option<Vec<String>>,
}

/// Authenticator selection policy. An unset attachment is omitted entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Options for "create credential", with every binary field decoded.
///
/// Serializes to the `publicKey` member of the platform's creation options
/// (byte fields as numeric arrays, to be swapped for native buffers by the
/// binding).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialCreationOptions {
    pub challenge: Vec<u8>,
    pub rp: RelyingParty,
    pub user: UserEntity,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_credentials: Vec<CredentialDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticator_selection: Option<AuthenticatorSelection>,
    /// `pubKeyCredParams`, `timeout`, `attestation`, `extensions`, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Options for "get credential", with every binary field decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequestOptions {
    pub challenge: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rp_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow_credentials: Vec<CredentialDescriptor>,
    /// `timeout`, `userVerification`, `extensions`, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Registration-specific part of a platform credential.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttestationResponse {
    pub client_data_json: Vec<u8>,
    pub attestation_object: Vec<u8>,
    pub transports: Vec<String>,
}

/// Sign-in-specific part of a platform credential.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssertionResponse {
    pub client_data_json: Vec<u8>,
    pub authenticator_data: Vec<u8>,
    pub signature: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
}

/// A credential handed back by the platform after user approval.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformCredential<R> {
    pub id: String,
    pub raw_id: Vec<u8>,
    pub credential_type: String,
    pub response: R,
    pub authenticator_attachment: Option<String>,
    pub client_extension_results: Value,
}

/// Platform public-key credential provider.
///
/// `create` and `get` are where the user is prompted; they may suspend for
/// as long as the platform lets the prompt stay open. The trait is not
/// `Send`: providers run on a single-threaded executor (the browser event
/// loop, or a current-thread runtime).
#[async_trait(?Send)]
pub trait PlatformCredentials {
    /// Whether the provider is actually usable in this runtime.
    fn is_supported(&self) -> bool {
        true
    }

    /// Whether a built-in, user-verifying authenticator is available.
    async fn is_platform_authenticator_available(&self) -> bool;

    /// Create a new credential (registration).
    async fn create(
        &self,
        options: CredentialCreationOptions,
    ) -> Result<PlatformCredential<AttestationResponse>, PlatformError>;

    /// Produce an assertion with an existing credential (sign-in).
    async fn get(
        &self,
        options: CredentialRequestOptions,
    ) -> Result<PlatformCredential<AssertionResponse>, PlatformError>;
}
