//! Common utility functions shared across CLI commands.

use std::time::Duration;

use anyhow::{Context, Result};
use passless_core::{
    ClientConfig, CompleteFailurePolicy, HintStorage, MockPlatform, PasswordlessClient,
    PasswordlessError, TransportConfig,
};
use serde_json::Value;
use tracing::debug;

use crate::ConnectionArgs;

/// Where command results go.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    /// Print a JSON document (pretty) to stdout.
    pub fn print_json(&self, value: &Value) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        println!("{text}");
        Ok(())
    }
}

/// Hint storage strategy: a file when one is configured, memory otherwise.
pub fn hint_storage(args: &ConnectionArgs) -> HintStorage {
    match &args.hint_file {
        Some(path) => HintStorage::File { path: path.clone() },
        None => HintStorage::Memory,
    }
}

fn required<'a>(value: &'a Option<String>, flag: &str, env: &str) -> Result<&'a str> {
    value.as_deref().ok_or_else(|| {
        PasswordlessError::Config(format!("Missing --{flag} (or {env} environment variable)"))
            .into()
    })
}

/// Build the client configuration from flags and environment.
pub fn build_config(args: &ConnectionArgs) -> Result<ClientConfig> {
    let api_url = required(&args.api_url, "api-url", "PASSLESS_API_URL")?;
    let api_key = required(&args.api_key, "api-key", "PASSLESS_API_KEY")?;
    let origin = required(&args.origin, "origin", "PASSLESS_ORIGIN")?;

    let mut config = ClientConfig::new(api_url, api_key, origin)?
        .with_hint_storage(hint_storage(args))
        .with_transport(TransportConfig {
            timeout: Duration::from_secs(args.timeout_secs),
            https_only: !args.allow_http,
        });

    if let Some(rp_id) = &args.rp_id {
        config = config.with_rp_id(rp_id.clone());
    }
    if args.strict {
        config = config.with_register_complete_failure(CompleteFailurePolicy::Report);
    }

    debug!(?config, "Built client configuration");
    Ok(config)
}

/// Build a client. Without `--mock` there is no native authenticator, so
/// ceremonies fail the capability check.
pub fn build_client(args: &ConnectionArgs, mock: bool) -> Result<PasswordlessClient> {
    let config = build_config(args)?;
    let builder = PasswordlessClient::builder(config);

    let builder = if mock {
        debug!("Using MOCK authenticator");
        builder.platform(MockPlatform::default())
    } else {
        builder
    };

    builder.build().context("Failed to build client")
}
