//! Register command implementation.

use anyhow::Result;
use colored::Colorize;
use passless_core::RegistrationOutcome;
use serde_json::json;
use tracing::info;

use crate::utils::{self, Output};
use crate::ConnectionArgs;

/// Execute the register command.
pub async fn execute(args: &ConnectionArgs, mock: bool, token: &str, output: Output) -> Result<()> {
    let client = utils::build_client(args, mock)?;

    if mock && !output.json {
        eprintln!("{}", "Using MOCK authenticator (not a security device!)".yellow());
    }

    let outcome = client.register(token).await?;
    info!(credential_id = outcome.credential_id(), "Register command finished");

    if output.json {
        let document = match &outcome {
            RegistrationOutcome::Registered { credential_id } => json!({
                "status": "registered",
                "credentialId": credential_id,
            }),
            RegistrationOutcome::CompletionFailed {
                credential_id,
                reason,
            } => json!({
                "status": "completion_failed",
                "credentialId": credential_id,
                "reason": reason,
            }),
        };
        return output.print_json(&document);
    }

    println!();
    match &outcome {
        RegistrationOutcome::Registered { credential_id } => {
            println!("{}", "Passkey registered!".green().bold());
            println!();
            println!("   {} {}", "Credential:".dimmed(), credential_id);
            println!("   {} {}", "Relying party:".dimmed(), client.config().rp_id);
        }
        RegistrationOutcome::CompletionFailed {
            credential_id,
            reason,
        } => {
            println!(
                "{}",
                "Passkey created, but the relying party did not confirm it"
                    .yellow()
                    .bold()
            );
            println!();
            println!("   {} {}", "Credential:".dimmed(), credential_id);
            println!("   {} {}", "Reason:".dimmed(), reason);
            println!(
                "   {} {}",
                "Hint:".dimmed(),
                "rerun with --strict to treat this as an error"
            );
        }
    }

    Ok(())
}
