//! Binary field codec for the wire/platform boundary.
//!
//! Relying parties send challenges and credential identifiers as URL-safe
//! base64 with the padding stripped; platform authenticators work on raw byte
//! buffers. Every binary field crossing that boundary goes through [`decode`]
//! on the way in and [`encode`] on the way out.
//!
//! ```
//! use passless_core::codec;
//!
//! let text = codec::encode([0xfbu8, 0xff]);
//! assert_eq!(text, "-_8");
//! assert_eq!(codec::decode(&text).unwrap(), vec![0xfb, 0xff]);
//! ```

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{PasswordlessError, Result};

/// Standard alphabet, padding optional on input.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A binary field as it may appear on the wire or be handed over by a caller.
///
/// Deserialization is untagged: JSON strings become [`BinaryValue::Text`],
/// arrays of numbers become [`BinaryValue::Numbers`], anything else is kept
/// as [`BinaryValue::Other`] so that decoding reports an encoding error
/// instead of failing the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BinaryValue {
    /// URL-safe base64 text.
    Text(String),
    /// Ordinary numeric array, one element per byte.
    Numbers(Vec<serde_json::Number>),
    /// Already a byte buffer.
    Bytes(Vec<u8>),
    /// Any other JSON shape. Never decodes.
    Other(serde_json::Value),
}

impl From<&str> for BinaryValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for BinaryValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<u8>> for BinaryValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// Encode bytes as URL-safe base64 without padding.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes.as_ref())
}

/// Decode URL-safe (or standard) base64 text, with or without padding.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let normalized: String = text
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    STANDARD_LENIENT
        .decode(normalized.as_bytes())
        .map_err(|e| PasswordlessError::Encoding(format!("invalid base64url text: {e}")))
}

/// Decode any binary field shape into a byte buffer.
///
/// Text is decoded, byte buffers pass through unchanged, numeric arrays are
/// materialized element by element.
pub fn decode_value(value: BinaryValue) -> Result<Vec<u8>> {
    match value {
        BinaryValue::Text(text) => decode(&text),
        BinaryValue::Bytes(bytes) => Ok(bytes),
        BinaryValue::Numbers(numbers) => numbers_to_bytes(&numbers),
        BinaryValue::Other(other) => Err(PasswordlessError::Encoding(format!(
            "expected base64url text or a byte array, found {}",
            json_kind(&other)
        ))),
    }
}

/// Encode a bytes-like value. Text is not bytes-like and is rejected.
pub fn encode_value(value: &BinaryValue) -> Result<String> {
    match value {
        BinaryValue::Bytes(bytes) => Ok(encode(bytes)),
        BinaryValue::Numbers(numbers) => numbers_to_bytes(numbers).map(encode),
        BinaryValue::Text(_) => Err(PasswordlessError::Encoding(
            "cannot encode text: expected a byte buffer or numeric array".into(),
        )),
        BinaryValue::Other(other) => Err(PasswordlessError::Encoding(format!(
            "cannot encode {}: expected a byte buffer or numeric array",
            json_kind(other)
        ))),
    }
}

fn numbers_to_bytes(numbers: &[serde_json::Number]) -> Result<Vec<u8>> {
    numbers
        .iter()
        .enumerate()
        .map(|(index, number)| {
            number
                .as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .ok_or_else(|| {
                    PasswordlessError::Encoding(format!(
                        "element {index} ({number}) is not a byte value"
                    ))
                })
        })
        .collect()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
