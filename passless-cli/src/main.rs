//! Passless CLI - passwordless (WebAuthn) registration and sign-in client.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage error (missing or invalid configuration)
  65  Data error (malformed encoding, credential already registered)
  69  Unavailable (relying party unreachable or failing, no authenticator)
  77  Permission denied (rejected API key, prompt dismissed)";

#[derive(Parser)]
#[command(name = "passless")]
#[command(author, version, about = "Passwordless (WebAuthn) ceremony client", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Use the deterministic mock authenticator (for testing)
    #[arg(long, global = true)]
    mock: bool,

    /// Print machine-readable JSON instead of human output
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Relying-party connection settings. Flags override environment variables.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Base URL of the relying-party API
    #[arg(long, env = "PASSLESS_API_URL", global = true)]
    pub api_url: Option<String>,

    /// API key sent in the ApiKey header
    #[arg(long, env = "PASSLESS_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Origin the ceremonies run for (https://app.example.com)
    #[arg(long, env = "PASSLESS_ORIGIN", global = true)]
    pub origin: Option<String>,

    /// Relying-party id (defaults to the origin's host)
    #[arg(long, env = "PASSLESS_RP_ID", global = true)]
    pub rp_id: Option<String>,

    /// Persist the passwordless hint in this JSON file
    #[arg(long, env = "PASSLESS_HINT_FILE", global = true)]
    pub hint_file: Option<PathBuf>,

    /// Fail registration when the relying party rejects the completion
    #[arg(long, global = true)]
    pub strict: bool,

    /// HTTP request timeout in seconds
    #[arg(long, env = "PASSLESS_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// Allow a plain-HTTP relying party (local testing only)
    #[arg(long, global = true)]
    pub allow_http: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new passkey for an enrollment token
    Register {
        /// Enrollment token issued by the relying party
        #[arg(long)]
        token: String,
    },

    /// Sign in with a registered passkey
    Signin {
        /// Account name (omit for discoverable credentials)
        #[arg(long, default_value = "")]
        username: String,
    },

    /// Show authenticator capability and the passwordless hint
    Status,

    /// Encode hex bytes as unpadded base64url
    Encode {
        /// Bytes as hex (e.g. fbff)
        #[arg(value_name = "HEX")]
        hex: String,
    },

    /// Decode base64url text to hex bytes
    Decode {
        /// base64url text, padding optional
        #[arg(value_name = "TEXT")]
        text: String,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let output = utils::Output { json: cli.json };

    match cli.command {
        Commands::Register { token } => {
            commands::register::execute(&cli.connection, cli.mock, &token, output).await
        }
        Commands::Signin { username } => {
            commands::signin::execute(&cli.connection, cli.mock, &username, output).await
        }
        Commands::Status => commands::status::execute(&cli.connection, cli.mock, output).await,
        Commands::Encode { hex } => commands::codec::encode(&hex, output),
        Commands::Decode { text } => commands::codec::decode(&text, output),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit = match run(cli).await {
        Ok(()) => ExitCode::success(),
        Err(err) => ExitCode::from_anyhow(&err),
    };

    if let Some(message) = &exit.message {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }
    std::process::exit(exit.code);
}
