//! Sign-in command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::json;
use tracing::info;

use crate::utils::{self, Output};
use crate::ConnectionArgs;

/// Execute the signin command.
pub async fn execute(
    args: &ConnectionArgs,
    mock: bool,
    username: &str,
    output: Output,
) -> Result<()> {
    let client = utils::build_client(args, mock)?;

    if mock && !output.json {
        eprintln!("{}", "Using MOCK authenticator (not a security device!)".yellow());
    }

    let payload = client.signin(username).await?;
    info!("Signin command finished");

    if output.json {
        return output.print_json(&json!({"status": "signed_in", "data": payload}));
    }

    let pretty = serde_json::to_string_pretty(&payload).context("Failed to format payload")?;

    println!();
    println!("{}", "Signed in!".green().bold());
    println!();
    if !username.is_empty() {
        println!("   {} {}", "Account:".dimmed(), username);
    }
    println!("   {} {}", "Relying party:".dimmed(), client.config().rp_id);
    println!("   {} {}", "Payload:".dimmed(), pretty);

    Ok(())
}
