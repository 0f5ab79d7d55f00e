//! WebAssembly bindings for passwordless (WebAuthn) ceremonies.
//!
//! This module wires the ceremony client to the browser: `navigator.credentials`
//! for the authenticator, `fetch` for the relying party and `document.cookie`
//! for the passwordless hint.

use std::rc::Rc;

use js_sys::{Promise, Uint8Array};
use passless_core::{
    codec, ClientConfig, CompleteFailurePolicy, PasswordlessClient, PasswordlessError,
    RegistrationOutcome,
};
use serde_json::json;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

mod hint;
mod js;
mod platform;
mod transport;

pub use hint::CookieHintStore;
pub use platform::BrowserPlatform;
pub use transport::FetchTransport;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Stable identifier of an error variant, exposed as `error.kind`.
fn error_kind(err: &PasswordlessError) -> &'static str {
    match err {
        PasswordlessError::UnsupportedEnvironment => "UnsupportedEnvironment",
        PasswordlessError::BeginFailed { .. } => "BeginFailed",
        PasswordlessError::PlatformCreate(_) => "PlatformCreate",
        PasswordlessError::PlatformGet(_) => "PlatformGet",
        PasswordlessError::CompleteFailed { .. } => "CompleteFailed",
        PasswordlessError::Encoding(_) => "Encoding",
        PasswordlessError::Config(_) => "Config",
        PasswordlessError::HintStorage(_) => "HintStorage",
    }
}

/// Extra properties attached to a thrown error: `kind` and, for platform
/// failures, the platform's own `{name, message}` as `platformError`.
fn error_details(err: &PasswordlessError) -> serde_json::Value {
    let mut details = json!({ "kind": error_kind(err) });
    if let Some(detail) = err.platform_detail() {
        details["platformError"] = json!({
            "name": detail.name,
            "message": detail.message,
        });
    }
    details
}

fn annotate(error: &js_sys::Error, err: &PasswordlessError) -> Result<(), JsValue> {
    let details: js_sys::Object = js::to_js(&error_details(err))?.dyn_into()?;
    js_sys::Object::assign(error, &details);
    Ok(())
}

/// Convert to a JS `Error` named `PasswordlessError`.
fn to_js_error(err: PasswordlessError) -> JsValue {
    let error = js_sys::Error::new(&err.to_string());
    error.set_name("PasswordlessError");
    if let Err(e) = annotate(&error, &err) {
        web_sys::console::warn_2(&JsValue::from_str("passless: failed to annotate error"), &e);
    }
    error.into()
}

fn option_string(options: &JsValue, key: &str) -> Option<String> {
    if options.is_object() {
        js::get_string(options, key)
    } else {
        None
    }
}

/// Browser passwordless client.
///
/// ```js
/// const client = new PasswordlessClient("https://api.example.com/passwordless", apiKey);
/// if (client.isSupported()) {
///   const outcome = await client.register(token);
///   const payload = await client.signin("alice");
/// }
/// ```
#[wasm_bindgen(js_name = PasswordlessClient)]
pub struct WasmPasswordlessClient {
    inner: Rc<PasswordlessClient>,
}

#[wasm_bindgen(js_class = PasswordlessClient)]
impl WasmPasswordlessClient {
    /// Create a client.
    ///
    /// `options` may carry `origin` (default `location.origin`), `rpId`
    /// (default: the origin's host) and `strictRegistration`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        api_url: &str,
        api_key: &str,
        options: JsValue,
    ) -> Result<WasmPasswordlessClient, JsValue> {
        let global: JsValue = js_sys::global().into();
        let origin = option_string(&options, "origin")
            .or_else(|| js::get_string(&js::get(&global, "location"), "origin"))
            .ok_or_else(|| {
                to_js_error(PasswordlessError::Config(
                    "No origin given and location.origin is unavailable".into(),
                ))
            })?;

        let mut config = ClientConfig::new(api_url, api_key, &origin).map_err(to_js_error)?;
        if let Some(rp_id) = option_string(&options, "rpId") {
            config = config.with_rp_id(rp_id);
        }
        if options.is_object() && js::get(&options, "strictRegistration").as_bool() == Some(true) {
            config = config.with_register_complete_failure(CompleteFailurePolicy::Report);
        }

        let hints = CookieHintStore::detect().ok_or_else(|| {
            to_js_error(PasswordlessError::HintStorage(
                "document.cookie is unavailable in this context".into(),
            ))
        })?;

        let builder = PasswordlessClient::builder(config)
            .transport(FetchTransport)
            .hint_store(hints);
        let builder = match BrowserPlatform::detect() {
            Some(platform) => builder.platform(platform),
            None => {
                web_sys::console::warn_1(&JsValue::from_str(
                    "passless: navigator.credentials is unavailable; ceremonies will fail",
                ));
                builder
            }
        };

        let inner = builder.build().map_err(to_js_error)?;
        Ok(Self {
            inner: Rc::new(inner),
        })
    }

    #[wasm_bindgen(getter)]
    pub fn origin(&self) -> String {
        self.inner.config().origin.clone()
    }

    #[wasm_bindgen(getter, js_name = rpId)]
    pub fn rp_id(&self) -> String {
        self.inner.config().rp_id.clone()
    }

    /// Whether public-key credentials are usable in this browser.
    #[wasm_bindgen(js_name = isSupported)]
    pub fn is_supported(&self) -> bool {
        self.inner.is_supported()
    }

    /// Resolves to whether a built-in user-verifying authenticator exists.
    #[wasm_bindgen(js_name = isPlatformAuthenticatorAvailable)]
    pub fn is_platform_authenticator_available(&self) -> Promise {
        let inner = Rc::clone(&self.inner);
        future_to_promise(async move {
            Ok(JsValue::from_bool(
                inner.is_platform_authenticator_available().await,
            ))
        })
    }

    /// Whether a ceremony has completed in this browser before. Advisory only.
    #[wasm_bindgen(js_name = hasPasswordlessHint)]
    pub fn has_passwordless_hint(&self) -> bool {
        self.inner.has_passwordless_hint()
    }

    /// Register a passkey; resolves to `{status, credentialId, reason?}`.
    pub fn register(&self, token: String) -> Promise {
        let inner = Rc::clone(&self.inner);
        future_to_promise(async move {
            let outcome = inner.register(&token).await.map_err(to_js_error)?;
            let document = match outcome {
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
            js::to_js(&document)
        })
    }

    /// Sign in; resolves to the relying party's `data` payload (or `null`).
    pub fn signin(&self, username: Option<String>) -> Promise {
        let inner = Rc::clone(&self.inner);
        future_to_promise(async move {
            let payload = inner
                .signin(username.as_deref().unwrap_or_default())
                .await
                .map_err(to_js_error)?;
            js::to_js(&payload)
        })
    }
}

/// Encode bytes as unpadded base64url.
#[wasm_bindgen]
pub fn encode(bytes: &[u8]) -> String {
    codec::encode(bytes)
}

/// Decode base64url (or standard base64) text into bytes.
#[wasm_bindgen]
pub fn decode(text: &str) -> Result<Uint8Array, JsValue> {
    codec::decode(text)
        .map(|bytes| Uint8Array::from(bytes.as_slice()))
        .map_err(to_js_error)
}

/// Get the library version.
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
