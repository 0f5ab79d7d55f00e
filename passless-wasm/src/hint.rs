//! `document.cookie` as the hint store.

use std::time::Duration;

use passless_core::{HintStore, PasswordlessError, Result};
use wasm_bindgen::JsValue;

use crate::js;

/// Cookie-backed hint store (`path=/`, `SameSite=Lax`, `Secure`).
#[derive(Debug, Clone)]
pub struct CookieHintStore {
    document: JsValue,
}

impl CookieHintStore {
    /// `None` when there is no `document` (workers, non-browser hosts).
    pub fn detect() -> Option<Self> {
        let document = js::get(&js_sys::global().into(), "document");
        if document.is_undefined() || document.is_null() {
            return None;
        }
        Some(Self { document })
    }

    fn cookie_jar(&self) -> Result<String> {
        js::get_string(&self.document, "cookie")
            .ok_or_else(|| PasswordlessError::HintStorage("document.cookie is not readable".into()))
    }
}

/// Build the `document.cookie` assignment for one entry.
fn set_cookie_string(
    name: &str,
    value: &str,
    ttl: Option<Duration>,
    encode: impl Fn(&str) -> String,
) -> String {
    let mut cookie = format!("{}={}; path=/; SameSite=Lax; Secure", encode(name), encode(value));
    if let Some(ttl) = ttl {
        cookie.push_str(&format!("; max-age={}", ttl.as_secs()));
    }
    cookie
}

/// Find `name` in a `document.cookie` string (`a=1; b=2`).
fn find_cookie(jar: &str, name: &str, decode: impl Fn(&str) -> String) -> Option<String> {
    jar.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| decode(key) == name)
        .map(|(_, value)| decode(value))
}

fn uri_encode(text: &str) -> String {
    js_sys::encode_uri_component(text).into()
}

fn uri_decode(text: &str) -> String {
    js_sys::decode_uri_component(text)
        .ok()
        .and_then(|decoded| decoded.as_string())
        .unwrap_or_else(|| text.to_string())
}

impl HintStore for CookieHintStore {
    fn set(&self, name: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let cookie = set_cookie_string(name, value, ttl, uri_encode);
        js::set(&self.document, "cookie", &JsValue::from_str(&cookie)).map_err(|e| {
            PasswordlessError::HintStorage(format!(
                "Failed to write cookie: {}",
                js::error_parts(&e).1
            ))
        })
    }

    fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(find_cookie(&self.cookie_jar()?, name, uri_decode))
    }
}
