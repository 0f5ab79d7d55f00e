//! Registration ceremony: create a new credential for an enrollment token.

use tracing::{debug, error, info, instrument};

use super::wire::{
    AttestationResponseJson, BeginRegistrationRequest, CreationOptionsJson,
    RegistrationCredentialJson,
};
use super::{RelyingPartyApi, Session};
use crate::codec::{self, decode_value};
use crate::config::CompleteFailurePolicy;
use crate::error::{Ceremony, PasswordlessError, Result};
use crate::hint::{self, HintStore};
use crate::platform::{
    AttestationResponse, AuthenticatorSelection, CredentialCreationOptions, CredentialDescriptor,
    PlatformCredential, PlatformCredentials, UserEntity,
};

const BEGIN_PATH: &str = "register/begin";
const COMPLETE_PATH: &str = "register/complete";

/// How a registration that reached the platform ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The relying party accepted the new credential.
    Registered { credential_id: String },
    /// The platform created a credential but the relying party rejected the
    /// completion, and the client is configured to swallow that failure.
    /// The platform-side credential is not rolled back.
    CompletionFailed {
        credential_id: String,
        reason: String,
    },
}

impl RegistrationOutcome {
    pub fn credential_id(&self) -> &str {
        match self {
            Self::Registered { credential_id } | Self::CompletionFailed { credential_id, .. } => {
                credential_id
            }
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered { .. })
    }
}

/// Options received, session held, platform not yet asked.
struct Begun {
    options: CreationOptionsJson,
    session: Session,
}

/// The platform produced a credential; the relying party has not seen it.
struct PlatformInvoked {
    credential: PlatformCredential<AttestationResponse>,
    session: Session,
}

/// Run the full registration ceremony.
#[instrument(level = "info", skip_all, fields(ceremony = "registration"))]
pub(crate) async fn run(
    api: &RelyingPartyApi<'_>,
    platform: &dyn PlatformCredentials,
    hints: &dyn HintStore,
    policy: CompleteFailurePolicy,
    token: &str,
) -> Result<RegistrationOutcome> {
    let begun = begin(api, token).await?;
    debug!("Registration begun");

    let invoked = invoke_platform(begun, platform).await?;
    debug!(credential_id = %invoked.credential.id, "Platform created credential");

    let credential_id = invoked.credential.id.clone();
    match complete(api, invoked).await {
        Ok(()) => {
            hint::record_success(hints);
            info!(credential_id = %credential_id, "Registration completed");
            Ok(RegistrationOutcome::Registered { credential_id })
        }
        Err(e) => match policy {
            CompleteFailurePolicy::Report => Err(e),
            CompleteFailurePolicy::Swallow => {
                error!(
                    error = %e,
                    credential_id = %credential_id,
                    "Registration completion failed; platform credential was kept"
                );
                Ok(RegistrationOutcome::CompletionFailed {
                    credential_id,
                    reason: e.to_string(),
                })
            }
        },
    }
}

async fn begin(api: &RelyingPartyApi<'_>, token: &str) -> Result<Begun> {
    let config = api.config();
    let (options, session) = api
        .begin(
            Ceremony::Registration,
            BEGIN_PATH,
            BeginRegistrationRequest {
                token,
                rp_id: &config.rp_id,
                origin: &config.origin,
            },
        )
        .await?;

    Ok(Begun { options, session })
}

async fn invoke_platform(
    begun: Begun,
    platform: &dyn PlatformCredentials,
) -> Result<PlatformInvoked> {
    let options = adapt_options(begun.options)?;

    let credential = platform
        .create(options)
        .await
        .map_err(PasswordlessError::PlatformCreate)?;

    Ok(PlatformInvoked {
        credential,
        session: begun.session,
    })
}

async fn complete(api: &RelyingPartyApi<'_>, invoked: PlatformInvoked) -> Result<()> {
    let credential = adapt_response(invoked.credential);
    api.complete(
        Ceremony::Registration,
        COMPLETE_PATH,
        credential,
        invoked.session,
    )
    .await?;
    Ok(())
}

/// Decode every binary field and normalize the selection policy.
pub(crate) fn adapt_options(options: CreationOptionsJson) -> Result<CredentialCreationOptions> {
    let exclude_credentials = options
        .exclude_credentials
        .unwrap_or_default()
        .into_iter()
        .map(|descriptor| {
            Ok(CredentialDescriptor {
                credential_type: descriptor.credential_type,
                id: decode_value(descriptor.id)?,
                transports: descriptor.transports,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // Platforms reject an explicit null attachment but accept its absence.
    let authenticator_selection =
        options
            .authenticator_selection
            .map(|selection| AuthenticatorSelection {
                authenticator_attachment: selection.authenticator_attachment,
                extra: selection.extra,
            });

    Ok(CredentialCreationOptions {
        challenge: decode_value(options.challenge)?,
        rp: options.rp,
        user: UserEntity {
            id: decode_value(options.user.id)?,
            name: options.user.name,
            display_name: options.user.display_name,
            extra: options.user.extra,
        },
        exclude_credentials,
        authenticator_selection,
        extra: options.extra,
    })
}

/// Encode the platform's buffers into the completion wire shape.
pub(crate) fn adapt_response(
    credential: PlatformCredential<AttestationResponse>,
) -> RegistrationCredentialJson {
    RegistrationCredentialJson {
        id: credential.id,
        raw_id: codec::encode(&credential.raw_id),
        credential_type: credential.credential_type,
        authenticator_attachment: credential.authenticator_attachment,
        extensions: credential.client_extension_results,
        response: AttestationResponseJson {
            attestation_object: codec::encode(&credential.response.attestation_object),
            client_data_json: codec::encode(&credential.response.client_data_json),
            transports: credential.response.transports,
        },
    }
}
