//! Mock platform authenticator for testing.

use async_trait::async_trait;
use serde_json::json;
use sha3::{Digest, Sha3_256};

use super::{
    AssertionResponse, AttestationResponse, CredentialCreationOptions, CredentialRequestOptions,
    PlatformCredential, PlatformCredentials, PlatformError,
};
use crate::codec;

/// Authenticator data flags: user present + user verified.
const FLAGS_UP_UV: u8 = 0x05;

/// Mock platform authenticator.
///
/// WARNING: Do not use in production - credential ids, attestation objects
/// and signatures are deterministic digests of the seed, not real key
/// material. A relying party that verifies attestations will reject them.
///
/// The credential for an account is derived from `(seed, rp id, user id)`, so
/// registering the same account twice trips the exclusion list exactly like
/// a real authenticator would.
#[derive(Debug, Clone)]
pub struct MockPlatform {
    seed: u64,
    refuse: bool,
    platform_authenticator: bool,
}

impl MockPlatform {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            refuse: false,
            platform_authenticator: true,
        }
    }

    /// Create a mock with default seed for simple tests.
    pub fn default_test() -> Self {
        Self::new(0xDEADBEEF_CAFEBABE)
    }

    /// A mock whose user dismisses every prompt.
    pub fn refusing(mut self) -> Self {
        self.refuse = true;
        self
    }

    /// Report no built-in authenticator (roaming keys only).
    pub fn without_platform_authenticator(mut self) -> Self {
        self.platform_authenticator = false;
        self
    }

    /// Credential id this mock creates for an account.
    pub fn credential_id(&self, rp_id: &str, user_id: &[u8]) -> Vec<u8> {
        self.digest(&[b"credential", rp_id.as_bytes(), user_id])
    }

    fn digest(&self, parts: &[&[u8]]) -> Vec<u8> {
        let mut hasher = Sha3_256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(b"passless-mock-authenticator");
        for part in parts {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        hasher.finalize().to_vec()
    }

    fn client_data(kind: &str, challenge: &[u8], rp_id: &str) -> Vec<u8> {
        json!({
            "type": kind,
            "challenge": codec::encode(challenge),
            "origin": format!("https://{rp_id}"),
            "crossOrigin": false,
        })
        .to_string()
        .into_bytes()
    }

    fn check_consent(&self) -> Result<(), PlatformError> {
        if self.refuse {
            return Err(PlatformError::not_allowed(
                "The operation either timed out or was not allowed.",
            ));
        }
        Ok(())
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::default_test()
    }
}

#[async_trait(?Send)]
impl PlatformCredentials for MockPlatform {
    async fn is_platform_authenticator_available(&self) -> bool {
        self.platform_authenticator
    }

    async fn create(
        &self,
        options: CredentialCreationOptions,
    ) -> Result<PlatformCredential<AttestationResponse>, PlatformError> {
        self.check_consent()?;

        let rp_id = options.rp.id.as_deref().unwrap_or("localhost");
        let raw_id = self.credential_id(rp_id, &options.user.id);

        if options
            .exclude_credentials
            .iter()
            .any(|excluded| excluded.id == raw_id)
        {
            return Err(PlatformError::invalid_state(
                "The user attempted to register an authenticator that contains one of the credentials already registered with the relying party.",
            ));
        }

        let client_data_json = Self::client_data("webauthn.create", &options.challenge, rp_id);
        let attestation_object = self.digest(&[
            b"attestation",
            raw_id.as_slice(),
            client_data_json.as_slice(),
        ]);

        Ok(PlatformCredential {
            id: codec::encode(&raw_id),
            raw_id,
            credential_type: "public-key".into(),
            response: AttestationResponse {
                client_data_json,
                attestation_object,
                transports: vec!["internal".into()],
            },
            authenticator_attachment: Some("platform".into()),
            client_extension_results: json!({}),
        })
    }

    async fn get(
        &self,
        options: CredentialRequestOptions,
    ) -> Result<PlatformCredential<AssertionResponse>, PlatformError> {
        self.check_consent()?;

        let rp_id = options.rp_id.as_deref().unwrap_or("localhost");

        // Empty allow list means a discoverable credential: the mock answers
        // with the one it would have created for an anonymous handle.
        let (raw_id, user_handle) = match options.allow_credentials.first() {
            Some(allowed) => (allowed.id.clone(), None),
            None => {
                let handle = self.digest(&[b"user-handle", rp_id.as_bytes()]);
                (self.credential_id(rp_id, &handle), Some(handle))
            }
        };

        let client_data_json = Self::client_data("webauthn.get", &options.challenge, rp_id);

        let mut authenticator_data = Sha3_256::digest(rp_id.as_bytes()).to_vec();
        authenticator_data.push(FLAGS_UP_UV);
        authenticator_data.extend_from_slice(&1u32.to_be_bytes());

        let client_data_hash = Sha3_256::digest(&client_data_json);
        let signature = self.digest(&[
            b"signature",
            raw_id.as_slice(),
            authenticator_data.as_slice(),
            client_data_hash.as_slice(),
        ]);

        Ok(PlatformCredential {
            id: codec::encode(&raw_id),
            raw_id,
            credential_type: "public-key".into(),
            response: AssertionResponse {
                client_data_json,
                authenticator_data,
                signature,
                user_handle,
            },
            authenticator_attachment: Some("platform".into()),
            client_extension_results: json!({}),
        })
    }
}
