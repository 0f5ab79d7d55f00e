//! Sign-in ceremony: assert possession of a registered credential.

use serde_json::Value;
use tracing::{debug, info, instrument};

use super::wire::{
    AssertionCredentialJson, AssertionResponseJson, BeginSigninRequest, RequestOptionsJson,
};
use super::{RelyingPartyApi, Session};
use crate::codec::{self, decode_value};
use crate::error::{Ceremony, PasswordlessError, Result};
use crate::hint::{self, HintStore};
use crate::platform::{
    AssertionResponse, CredentialDescriptor, CredentialRequestOptions, PlatformCredential,
    PlatformCredentials,
};

const BEGIN_PATH: &str = "signin/begin";
const COMPLETE_PATH: &str = "signin/complete";

struct Begun {
    options: RequestOptionsJson,
    session: Session,
}

struct PlatformInvoked {
    credential: PlatformCredential<AssertionResponse>,
    session: Session,
}

/// Run the full sign-in ceremony and return the relying party's `data`
/// payload (`null` when it sent none).
#[instrument(level = "info", skip_all, fields(ceremony = "signin"))]
pub(crate) async fn run(
    api: &RelyingPartyApi<'_>,
    platform: &dyn PlatformCredentials,
    hints: &dyn HintStore,
    username: &str,
) -> Result<Value> {
    let begun = begin(api, username).await?;
    debug!("Sign-in begun");

    let invoked = invoke_platform(begun, platform).await?;
    debug!(credential_id = %invoked.credential.id, "Platform produced assertion");

    let body = complete(api, invoked).await?;
    hint::record_success(hints);
    info!("Sign-in completed");

    Ok(match body {
        Value::Object(mut fields) => fields.remove("data").unwrap_or(Value::Null),
        _ => Value::Null,
    })
}

async fn begin(api: &RelyingPartyApi<'_>, username: &str) -> Result<Begun> {
    let config = api.config();
    let (options, session) = api
        .begin(
            Ceremony::Signin,
            BEGIN_PATH,
            BeginSigninRequest {
                username,
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
        .get(options)
        .await
        .map_err(PasswordlessError::PlatformGet)?;

    Ok(PlatformInvoked {
        credential,
        session: begun.session,
    })
}

async fn complete(api: &RelyingPartyApi<'_>, invoked: PlatformInvoked) -> Result<Value> {
    let credential = adapt_response(invoked.credential);
    api.complete(Ceremony::Signin, COMPLETE_PATH, credential, invoked.session)
        .await
}

pub(crate) fn adapt_options(options: RequestOptionsJson) -> Result<CredentialRequestOptions> {
    let allow_credentials = options
        .allow_credentials
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

    Ok(CredentialRequestOptions {
        challenge: decode_value(options.challenge)?,
        rp_id: options.rp_id,
        allow_credentials,
        extra: options.extra,
    })
}

pub(crate) fn adapt_response(
    credential: PlatformCredential<AssertionResponse>,
) -> AssertionCredentialJson {
    let response = credential.response;
    AssertionCredentialJson {
        id: credential.id,
        raw_id: codec::encode(&credential.raw_id),
        credential_type: credential.credential_type,
        authenticator_attachment: credential.authenticator_attachment,
        extensions: credential.client_extension_results,
        response: AssertionResponseJson {
            authenticator_data: codec::encode(&response.authenticator_data),
            client_data_json: codec::encode(&response.client_data_json),
            signature: codec::encode(&response.signature),
            user_handle: response.user_handle.as_deref().map(codec::encode),
        },
    }
}
