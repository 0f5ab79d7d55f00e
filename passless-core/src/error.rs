use thiserror::Error;

use crate::platform::PlatformError;

/// Which ceremony a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ceremony {
    Registration,
    Signin,
}

impl std::fmt::Display for Ceremony {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registration => write!(f, "registration"),
            Self::Signin => write!(f, "sign-in"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PasswordlessError {
    #[error("Public-key credentials are not supported in this environment")]
    UnsupportedEnvironment,

    #[error("Failed to begin {ceremony}: {reason}")]
    BeginFailed { ceremony: Ceremony, reason: String },

    #[error("Credential creation failed: this account may already be registered with this authenticator")]
    PlatformCreate(PlatformError),

    #[error("Credential retrieval failed: the request was cancelled or no registered credential was available")]
    PlatformGet(PlatformError),

    #[error("Failed to complete {ceremony}: {reason}")]
    CompleteFailed { ceremony: Ceremony, reason: String },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Hint storage error: {0}")]
    HintStorage(String),
}

impl PasswordlessError {
    /// The platform's original error, for the two platform invocation failures.
    pub fn platform_detail(&self) -> Option<&PlatformError> {
        match self {
            Self::PlatformCreate(detail) | Self::PlatformGet(detail) => Some(detail),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PasswordlessError>;
