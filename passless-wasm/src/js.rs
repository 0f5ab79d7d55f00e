//! Small reflection helpers over `js-sys`.

use js_sys::{Array, ArrayBuffer, Function, Object, Reflect, Uint8Array, JSON};
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};

/// `target[key]`, with a missing or throwing lookup read as `undefined`.
pub fn get(target: &JsValue, key: &str) -> JsValue {
    Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

pub fn set(target: &JsValue, key: &str, value: &JsValue) -> Result<(), JsValue> {
    Reflect::set(target, &JsValue::from_str(key), value).map(|_| ())
}

pub fn get_string(target: &JsValue, key: &str) -> Option<String> {
    get(target, key).as_string()
}

/// `target[name](...args)` when `target[name]` is a function.
pub fn call_method(target: &JsValue, name: &str, args: &[JsValue]) -> Result<JsValue, JsValue> {
    let method: Function = get(target, name)
        .dyn_into()
        .map_err(|_| JsValue::from_str(&format!("{name} is not a function")))?;

    let args: Array = args.iter().collect();
    method.apply(target, &args)
}

pub fn has_method(target: &JsValue, name: &str) -> bool {
    get(target, name).is_function()
}

/// Copy an `ArrayBuffer` or typed array into a byte vector.
pub fn bytes(value: &JsValue) -> Option<Vec<u8>> {
    if value.is_instance_of::<ArrayBuffer>() {
        Some(Uint8Array::new(value).to_vec())
    } else if ArrayBuffer::is_view(value) {
        let buffer = get(value, "buffer");
        let offset = get(value, "byteOffset").as_f64().unwrap_or(0.0) as u32;
        let length = get(value, "byteLength").as_f64().unwrap_or(0.0) as u32;
        Some(Uint8Array::new_with_byte_offset_and_length(&buffer, offset, length).to_vec())
    } else {
        None
    }
}

pub fn uint8_array(bytes: &[u8]) -> JsValue {
    Uint8Array::from(bytes).into()
}

pub fn to_js(value: &Value) -> Result<JsValue, JsValue> {
    JSON::parse(&value.to_string())
}

/// Round-trip a JS value through `JSON.stringify`. `undefined` becomes null.
pub fn to_json(value: &JsValue) -> Value {
    if value.is_undefined() {
        return Value::Null;
    }
    JSON::stringify(value)
        .ok()
        .and_then(|text| text.as_string())
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or(Value::Null)
}

pub fn empty_object() -> JsValue {
    Object::new().into()
}

/// The `name` and `message` of a thrown value (usually a `DOMException`).
pub fn error_parts(error: &JsValue) -> (String, String) {
    let name = get_string(error, "name").unwrap_or_else(|| "Error".to_string());
    let message = get_string(error, "message")
        .or_else(|| error.as_string())
        .unwrap_or_default();
    (name, message)
}
