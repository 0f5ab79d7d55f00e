//! JSON shapes exchanged with the relying party.
//!
//! Options arrive with binary fields as [`BinaryValue`]; everything the client
//! does not interpret is captured in `extra` and forwarded untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codec::BinaryValue;
use crate::platform::RelyingParty;

#[derive(Debug, Serialize)]
pub struct BeginRegistrationRequest<'a> {
    pub token: &'a str,
    #[serde(rename = "RPID")]
    pub rp_id: &'a str,
    #[serde(rename = "Origin")]
    pub origin: &'a str,
}

#[derive(Debug, Serialize)]
pub struct BeginSigninRequest<'a> {
    pub username: &'a str,
    #[serde(rename = "RPID")]
    pub rp_id: &'a str,
    #[serde(rename = "Origin")]
    pub origin: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CompleteRequest<'a, R> {
    pub response: R,
    #[serde(rename = "sessionId")]
    pub session_id: &'a str,
    #[serde(rename = "RPID")]
    pub rp_id: &'a str,
    #[serde(rename = "Origin")]
    pub origin: &'a str,
}

/// `{data: <options>, sessionId}` returned by both begin endpoints.
#[derive(Debug, Deserialize)]
pub struct BeginResponse<O> {
    pub data: O,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Server-issued registration options, binary fields still encoded.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationOptionsJson {
    pub challenge: BinaryValue,
    #[serde(default)]
    pub rp: RelyingParty,
    pub user: UserJson,
    #[serde(default)]
    pub exclude_credentials: Option<Vec<DescriptorJson>>,
    #[serde(default)]
    pub authenticator_selection: Option<AuthenticatorSelectionJson>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserJson {
    pub id: BinaryValue,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DescriptorJson {
    #[serde(rename = "type", default = "public_key")]
    pub credential_type: String,
    pub id: BinaryValue,
    #[serde(default)]
    pub transports: Option<Vec<String>>,
}

fn public_key() -> String {
    "public-key".to_string()
}

/// `authenticatorAttachment` may be absent or explicitly null; both land in
/// `None` here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelectionJson {
    #[serde(default)]
    pub authenticator_attachment: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Server-issued sign-in options, binary fields still encoded.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptionsJson {
    pub challenge: BinaryValue,
    #[serde(default)]
    pub rp_id: Option<String>,
    #[serde(default)]
    pub allow_credentials: Option<Vec<DescriptorJson>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Registration credential as sent to `register/complete`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCredentialJson {
    pub id: String,
    pub raw_id: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<String>,
    pub extensions: Value,
    pub response: AttestationResponseJson,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationResponseJson {
    pub attestation_object: String,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transports: Vec<String>,
}

/// Assertion credential as sent to `signin/complete`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionCredentialJson {
    pub id: String,
    pub raw_id: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<String>,
    pub extensions: Value,
    pub response: AssertionResponseJson,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResponseJson {
    pub authenticator_data: String,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<String>,
}
