//! The global `fetch` as the relying-party transport.

use async_trait::async_trait;
use js_sys::Promise;
use passless_core::transport::parse_body;
use passless_core::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::js;

/// `fetch`-backed transport. Timeouts and TLS are the browser's business.
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchTransport;

fn transport_error(error: JsValue) -> TransportError {
    let (name, message) = js::error_parts(&error);
    match name.as_str() {
        "AbortError" | "TimeoutError" => TransportError::Timeout(message),
        // fetch rejects with a TypeError for network failures and CORS
        "TypeError" => TransportError::Connect(message),
        _ => TransportError::Other(format!("{name}: {message}")),
    }
}

async fn await_promise(value: JsValue) -> Result<JsValue, JsValue> {
    let promise: Promise = value.dyn_into()?;
    JsFuture::from(promise).await
}

#[async_trait(?Send)]
impl HttpTransport for FetchTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let init = js::empty_object();
        let headers = js::empty_object();
        for (name, value) in &request.headers {
            js::set(&headers, name, &JsValue::from_str(value)).map_err(transport_error)?;
        }
        js::set(&init, "method", &JsValue::from_str("POST"))
            .map_err(transport_error)?;
        js::set(&init, "headers", &headers).map_err(transport_error)?;
        if let Some(body) = &request.body {
            js::set(&init, "body", &JsValue::from_str(&body.to_string()))
                .map_err(transport_error)?;
        }

        let global: JsValue = js_sys::global().into();
        let pending = js::call_method(
            &global,
            "fetch",
            &[JsValue::from_str(request.url.as_str()), init],
        )
        .map_err(transport_error)?;
        let response = await_promise(pending).await.map_err(transport_error)?;

        let status = js::get(&response, "status")
            .as_f64()
            .ok_or_else(|| TransportError::Other("fetch response has no status".into()))?
            as u16;

        let text = js::call_method(&response, "text", &[]).map_err(transport_error)?;
        let text = await_promise(text)
            .await
            .map_err(|e| TransportError::Body(js::error_parts(&e).1))?
            .as_string()
            .unwrap_or_default();

        Ok(HttpResponse::new(status, parse_body(text.as_bytes())))
    }
}
