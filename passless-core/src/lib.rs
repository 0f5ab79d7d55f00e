//! Passless Core - client-side passwordless (WebAuthn) ceremony orchestration
//!
//! This crate drives the two public-key credential ceremonies between a
//! remote relying-party service and the local platform credential provider:
//!
//! - **Registration**: enrollment token → new credential
//! - **Sign-in**: username (or none) → assertion → relying-party payload
//!
//! Each ceremony is begin (relying party) → platform prompt → complete
//! (relying party), with every binary field converted between URL-safe
//! base64 text and raw bytes at the boundary.
//!
//! # Features
//!
//! - `network` (default): [`ReqwestTransport`], a native HTTP transport.
//!   Disable it for `wasm32` builds and inject a transport instead.
//!
//! # Example
//!
//! ```no_run
//! use passless_core::{ClientConfig, MockPlatform, PasswordlessClient};
//!
//! # async fn example() -> passless_core::Result<()> {
//! let config = ClientConfig::from_env()?;
//!
//! // Use the mock authenticator for testing (in the browser, use the
//! // navigator.credentials provider from passless-wasm)
//! let client = PasswordlessClient::builder(config)
//!     .platform(MockPlatform::default())
//!     .build()?;
//!
//! if client.has_passwordless_hint() {
//!     let payload = client.signin("").await?;
//!     println!("signed in: {payload}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod capability;
pub mod ceremony;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod hint;
pub mod platform;
pub mod transport;

// Re-export main types for convenience
pub use ceremony::registration::RegistrationOutcome;
pub use ceremony::{Session, API_KEY_HEADER};
pub use client::{ClientBuilder, PasswordlessClient};
pub use codec::BinaryValue;
pub use config::{ClientConfig, CompleteFailurePolicy};
pub use error::{Ceremony, PasswordlessError, Result};
pub use hint::{
    FileHintStore, HintStorage, HintStore, MemoryHintStore, HINT_NAME, HINT_TTL,
};
pub use platform::{
    AssertionResponse, AttestationResponse, CredentialCreationOptions, CredentialRequestOptions,
    MockPlatform, PlatformCredential, PlatformCredentials, PlatformError,
};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, TransportConfig, TransportError};

// Network-dependent exports (not available in Wasm)
#[cfg(feature = "network")]
pub use transport::ReqwestTransport;
