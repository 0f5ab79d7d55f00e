//! Exit codes following sysexits.h conventions.
//!
//! These codes provide semantic meaning for different failure modes,
//! enabling scripts and CI systems to handle errors appropriately.

use passless_core::PasswordlessError;

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (missing or invalid configuration).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (malformed encoding, credential already registered).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Service unavailable (relying party, authenticator).
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const UNAVAILABLE: i32 = 69;

/// Permission denied (API key rejected, user dismissed the prompt).
/// Maps to EX_NOPERM from sysexits.h.
pub const PERMISSION_DENIED: i32 = 77;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let code = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<PasswordlessError>())
            .map_or(GENERAL_ERROR, classify);

        let mut message = format!("{err:#}");
        if let Some(detail) = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<PasswordlessError>())
            .and_then(PasswordlessError::platform_detail)
        {
            message.push_str(&format!(" ({detail})"));
        }

        Self {
            code,
            message: Some(message),
        }
    }
}

fn classify(err: &PasswordlessError) -> i32 {
    match err {
        PasswordlessError::Config(_) => USAGE_ERROR,
        PasswordlessError::Encoding(_) => DATA_ERROR,
        PasswordlessError::UnsupportedEnvironment => UNAVAILABLE,
        PasswordlessError::BeginFailed { reason, .. }
        | PasswordlessError::CompleteFailed { reason, .. } => {
            if reason.starts_with("status 401") || reason.starts_with("status 403") {
                PERMISSION_DENIED
            } else {
                UNAVAILABLE
            }
        }
        PasswordlessError::PlatformCreate(detail) | PasswordlessError::PlatformGet(detail) => {
            match detail.name.as_str() {
                "NotAllowedError" | "AbortError" => PERMISSION_DENIED,
                "InvalidStateError" => DATA_ERROR,
                _ => GENERAL_ERROR,
            }
        }
        PasswordlessError::HintStorage(_) => GENERAL_ERROR,
    }
}
