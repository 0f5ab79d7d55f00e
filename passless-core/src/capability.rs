//! Runtime capability checks run before any ceremony.

use crate::error::{PasswordlessError, Result};
use crate::platform::PlatformCredentials;

/// True iff a usable public-key credential provider is present.
pub fn is_supported(platform: Option<&dyn PlatformCredentials>) -> bool {
    platform.is_some_and(|platform| platform.is_supported())
}

/// True iff credentials are supported and a built-in user-verifying
/// authenticator (Touch ID, Windows Hello, ...) is available.
pub async fn is_platform_authenticator_available(platform: Option<&dyn PlatformCredentials>) -> bool {
    match platform {
        Some(platform) if platform.is_supported() => {
            platform.is_platform_authenticator_available().await
        }
        _ => false,
    }
}

/// Fail with [`PasswordlessError::UnsupportedEnvironment`] unless credentials
/// are supported; otherwise hand back the usable provider.
pub fn assert_supported(
    platform: Option<&dyn PlatformCredentials>,
) -> Result<&dyn PlatformCredentials> {
    match platform {
        Some(platform) if platform.is_supported() => Ok(platform),
        _ => Err(PasswordlessError::UnsupportedEnvironment),
    }
}
