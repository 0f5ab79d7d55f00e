//! `navigator.credentials` as a platform credential provider.

use async_trait::async_trait;
use js_sys::{Array, Promise};
use passless_core::platform::CredentialDescriptor;
use passless_core::{
    AssertionResponse, AttestationResponse, CredentialCreationOptions, CredentialRequestOptions,
    PlatformCredential, PlatformCredentials, PlatformError,
};
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::js;

/// Browser platform provider.
pub struct BrowserPlatform {
    credentials: JsValue,
    public_key_credential: JsValue,
}

impl BrowserPlatform {
    /// Look up `navigator.credentials` and `PublicKeyCredential`; `None`
    /// outside a browser window.
    pub fn detect() -> Option<Self> {
        let global: JsValue = js_sys::global().into();
        let credentials = js::get(&js::get(&global, "navigator"), "credentials");
        if credentials.is_undefined() || credentials.is_null() {
            return None;
        }

        Some(Self {
            credentials,
            public_key_credential: js::get(&global, "PublicKeyCredential"),
        })
    }

    async fn call(&self, method: &str, public_key: JsValue) -> Result<JsValue, PlatformError> {
        let options = js::empty_object();
        js::set(&options, "publicKey", &public_key).map_err(platform_error)?;

        let promise: Promise = js::call_method(&self.credentials, method, &[options])
            .map_err(platform_error)?
            .dyn_into()
            .map_err(|_| {
                PlatformError::new("TypeError", format!("{method} did not return a promise"))
            })?;

        let credential = JsFuture::from(promise).await.map_err(platform_error)?;
        if credential.is_null() || credential.is_undefined() {
            return Err(PlatformError::not_allowed("No credential was returned"));
        }
        Ok(credential)
    }
}

#[async_trait(?Send)]
impl PlatformCredentials for BrowserPlatform {
    fn is_supported(&self) -> bool {
        self.public_key_credential.is_function()
            && js::has_method(&self.credentials, "create")
            && js::has_method(&self.credentials, "get")
    }

    async fn is_platform_authenticator_available(&self) -> bool {
        let Ok(promise) = js::call_method(
            &self.public_key_credential,
            "isUserVerifyingPlatformAuthenticatorAvailable",
            &[],
        ) else {
            return false;
        };

        match promise.dyn_into::<Promise>() {
            Ok(promise) => JsFuture::from(promise)
                .await
                .ok()
                .and_then(|available| available.as_bool())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn create(
        &self,
        options: CredentialCreationOptions,
    ) -> Result<PlatformCredential<AttestationResponse>, PlatformError> {
        let public_key = creation_options_to_js(&options)?;
        let credential = self.call("create", public_key).await?;
        let response = js::get(&credential, "response");

        let transports = js::call_method(&response, "getTransports", &[])
            .ok()
            .map(|list| {
                Array::from(&list)
                    .iter()
                    .filter_map(|transport| transport.as_string())
                    .collect()
            })
            .unwrap_or_default();

        credential_from_js(
            &credential,
            AttestationResponse {
                client_data_json: buffer(&response, "clientDataJSON")?,
                attestation_object: buffer(&response, "attestationObject")?,
                transports,
            },
        )
    }

    async fn get(
        &self,
        options: CredentialRequestOptions,
    ) -> Result<PlatformCredential<AssertionResponse>, PlatformError> {
        let public_key = request_options_to_js(&options)?;
        let credential = self.call("get", public_key).await?;
        let response = js::get(&credential, "response");

        credential_from_js(
            &credential,
            AssertionResponse {
                client_data_json: buffer(&response, "clientDataJSON")?,
                authenticator_data: buffer(&response, "authenticatorData")?,
                signature: buffer(&response, "signature")?,
                user_handle: js::bytes(&js::get(&response, "userHandle")),
            },
        )
    }
}

fn platform_error(error: JsValue) -> PlatformError {
    let (name, message) = js::error_parts(&error);
    PlatformError::new(name, message)
}

fn encoding_error(message: impl Into<String>) -> PlatformError {
    PlatformError::new("EncodingError", message)
}

/// Serialize the options and swap every byte field for a `Uint8Array`.
fn creation_options_to_js(options: &CredentialCreationOptions) -> Result<JsValue, PlatformError> {
    let public_key = options_to_js(options)?;
    js::set(&public_key, "challenge", &js::uint8_array(&options.challenge))
        .map_err(platform_error)?;
    js::set(
        &js::get(&public_key, "user"),
        "id",
        &js::uint8_array(&options.user.id),
    )
    .map_err(platform_error)?;
    set_descriptor_ids(&public_key, "excludeCredentials", &options.exclude_credentials)?;
    Ok(public_key)
}

fn request_options_to_js(options: &CredentialRequestOptions) -> Result<JsValue, PlatformError> {
    let public_key = options_to_js(options)?;
    js::set(&public_key, "challenge", &js::uint8_array(&options.challenge))
        .map_err(platform_error)?;
    set_descriptor_ids(&public_key, "allowCredentials", &options.allow_credentials)?;
    Ok(public_key)
}

fn options_to_js(options: &impl serde::Serialize) -> Result<JsValue, PlatformError> {
    let value = serde_json::to_value(options).map_err(|e| encoding_error(e.to_string()))?;
    js::to_js(&value).map_err(platform_error)
}

fn set_descriptor_ids(
    public_key: &JsValue,
    key: &str,
    descriptors: &[CredentialDescriptor],
) -> Result<(), PlatformError> {
    let list = js::get(public_key, key);
    if !Array::is_array(&list) {
        return Ok(());
    }
    let list = Array::from(&list);
    for (index, descriptor) in descriptors.iter().enumerate() {
        js::set(&list.get(index as u32), "id", &js::uint8_array(&descriptor.id))
            .map_err(platform_error)?;
    }
    Ok(())
}

fn buffer(response: &JsValue, key: &str) -> Result<Vec<u8>, PlatformError> {
    js::bytes(&js::get(response, key))
        .ok_or_else(|| encoding_error(format!("response.{key} is not a buffer")))
}

fn credential_from_js<R>(
    credential: &JsValue,
    response: R,
) -> Result<PlatformCredential<R>, PlatformError> {
    let extensions = js::call_method(credential, "getClientExtensionResults", &[])
        .map(|results| js::to_json(&results))
        .unwrap_or(Value::Object(Default::default()));

    Ok(PlatformCredential {
        id: js::get_string(credential, "id")
            .ok_or_else(|| encoding_error("credential.id is not a string"))?,
        raw_id: buffer(credential, "rawId")?,
        credential_type: js::get_string(credential, "type").unwrap_or_else(|| "public-key".into()),
        response,
        authenticator_attachment: js::get_string(credential, "authenticatorAttachment"),
        client_extension_results: extensions,
    })
}
