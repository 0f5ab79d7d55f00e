//! Client facade: the single entry point for applications.

use serde_json::Value;
use tracing::debug;

use crate::capability;
use crate::ceremony::registration::{self, RegistrationOutcome};
use crate::ceremony::{signin, RelyingPartyApi};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::hint::{self, HintStore};
use crate::platform::PlatformCredentials;
use crate::transport::HttpTransport;

/// Passwordless client composing configuration, the relying-party transport,
/// the platform credential provider and the hint store.
///
/// # Example
///
/// ```no_run
/// use passless_core::{ClientConfig, MockPlatform, PasswordlessClient};
///
/// # async fn example() -> passless_core::Result<()> {
/// let config = ClientConfig::new(
///     "https://api.example.com/passwordless",
///     "my-api-key",
///     "https://app.example.com",
/// )?;
///
/// let client = PasswordlessClient::builder(config)
///     .platform(MockPlatform::default())
///     .build()?;
///
/// let outcome = client.register("enrollment-token").await?;
/// println!("registered {}", outcome.credential_id());
///
/// let payload = client.signin("alice").await?;
/// println!("relying party said {payload}");
/// # Ok(())
/// # }
/// ```
pub struct PasswordlessClient {
    config: ClientConfig,
    transport: Box<dyn HttpTransport>,
    platform: Option<Box<dyn PlatformCredentials>>,
    hints: Box<dyn HintStore>,
}

impl PasswordlessClient {
    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder {
            config,
            transport: None,
            platform: None,
            hints: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Swap the configuration, keeping the collaborators.
    ///
    /// A hint store derived from the old configuration is kept as well;
    /// rebuild the client to change storage strategy.
    pub fn reconfigure(mut self, config: ClientConfig) -> Self {
        debug!(?config, "Client reconfigured");
        self.config = config;
        self
    }

    pub fn is_supported(&self) -> bool {
        capability::is_supported(self.platform.as_deref())
    }

    pub async fn is_platform_authenticator_available(&self) -> bool {
        capability::is_platform_authenticator_available(self.platform.as_deref()).await
    }

    /// Fail with `UnsupportedEnvironment` unless public-key credentials work here.
    pub fn assert_supported(&self) -> Result<()> {
        capability::assert_supported(self.platform.as_deref()).map(|_| ())
    }

    /// Whether a ceremony has completed on this device before. Advisory only.
    pub fn has_passwordless_hint(&self) -> bool {
        hint::has_hint(self.hints.as_ref())
    }

    /// Register a new credential for the enrollment `token`.
    ///
    /// Begin, platform and encoding failures always propagate. A rejected
    /// completion follows `ClientConfig::on_register_complete_failure`.
    pub async fn register(&self, token: &str) -> Result<RegistrationOutcome> {
        let platform = capability::assert_supported(self.platform.as_deref())?;
        registration::run(
            &self.api(),
            platform,
            self.hints.as_ref(),
            self.config.on_register_complete_failure,
            token,
        )
        .await
    }

    /// Sign in as `username` (may be empty for discoverable credentials) and
    /// return the relying party's `data` payload.
    pub async fn signin(&self, username: &str) -> Result<Value> {
        let platform = capability::assert_supported(self.platform.as_deref())?;
        signin::run(&self.api(), platform, self.hints.as_ref(), username).await
    }

    fn api(&self) -> RelyingPartyApi<'_> {
        RelyingPartyApi::new(&self.config, self.transport.as_ref())
    }
}

impl std::fmt::Debug for PasswordlessClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordlessClient")
            .field("config", &self.config)
            .field("platform", &self.platform.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`PasswordlessClient`].
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Box<dyn HttpTransport>>,
    platform: Option<Box<dyn PlatformCredentials>>,
    hints: Option<Box<dyn HintStore>>,
}

impl ClientBuilder {
    pub fn transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn platform(mut self, platform: impl PlatformCredentials + 'static) -> Self {
        self.platform = Some(Box::new(platform));
        self
    }

    pub fn hint_store(mut self, hints: impl HintStore + 'static) -> Self {
        self.hints = Some(Box::new(hints));
        self
    }

    pub fn build(self) -> Result<PasswordlessClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport(&self.config)?,
        };
        let hints = self
            .hints
            .unwrap_or_else(|| self.config.hint_storage.create());

        Ok(PasswordlessClient {
            config: self.config,
            transport,
            platform: self.platform,
            hints,
        })
    }
}

#[cfg(feature = "network")]
fn default_transport(config: &ClientConfig) -> Result<Box<dyn HttpTransport>> {
    let transport = crate::transport::ReqwestTransport::new(&config.transport)?;
    Ok(Box::new(transport))
}

#[cfg(not(feature = "network"))]
fn default_transport(_config: &ClientConfig) -> Result<Box<dyn HttpTransport>> {
    Err(crate::error::PasswordlessError::Config(
        "No HTTP transport configured and the `network` feature is disabled".into(),
    ))
}
