//! Status command implementation.
//!
//! Reports what the ceremonies would find on this machine without talking
//! to the relying party, so no connection settings are required.

use anyhow::Result;
use colored::Colorize;
use passless_core::{capability, hint, MockPlatform, PlatformCredentials};
use serde_json::json;

use crate::utils::{self, Output};
use crate::ConnectionArgs;

/// Execute the status command.
pub async fn execute(args: &ConnectionArgs, mock: bool, output: Output) -> Result<()> {
    let mock_platform = MockPlatform::default();
    let platform = mock.then_some(&mock_platform as &dyn PlatformCredentials);

    let supported = capability::is_supported(platform);
    let platform_authenticator = capability::is_platform_authenticator_available(platform).await;

    let hints = utils::hint_storage(args).create();
    let has_hint = hint::has_hint(hints.as_ref());

    if output.json {
        return output.print_json(&json!({
            "supported": supported,
            "platformAuthenticator": platform_authenticator,
            "hint": has_hint,
        }));
    }

    let yes_no = |value: bool| {
        if value {
            "yes".green()
        } else {
            "no".red()
        }
    };

    println!();
    println!("{}", "Passwordless status".bold());
    println!();
    println!("   {} {}", "Credentials supported:".dimmed(), yes_no(supported));
    println!(
        "   {} {}",
        "Platform authenticator:".dimmed(),
        yes_no(platform_authenticator)
    );
    println!("   {} {}", "Passwordless hint:".dimmed(), yes_no(has_hint));
    if !supported {
        println!();
        println!(
            "   {}",
            "No native authenticator access; use --mock for testing".yellow()
        );
    }

    Ok(())
}
