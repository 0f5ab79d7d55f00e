//! Encode and decode commands for binary fields.

use anyhow::Result;
use passless_core::{codec, PasswordlessError};
use serde_json::json;

use crate::utils::Output;

/// Hex bytes to unpadded base64url.
pub fn encode(hex_input: &str, output: Output) -> Result<()> {
    let bytes = hex::decode(hex_input.trim())
        .map_err(|e| PasswordlessError::Encoding(format!("Invalid hex input: {e}")))?;
    let text = codec::encode(&bytes);

    if output.json {
        return output.print_json(&json!({"hex": hex::encode(&bytes), "base64url": text}));
    }
    println!("{text}");
    Ok(())
}

/// base64url (or standard base64) text to hex bytes.
pub fn decode(text: &str, output: Output) -> Result<()> {
    let bytes = codec::decode(text.trim())?;

    if output.json {
        return output.print_json(&json!({
            "base64url": codec::encode(&bytes),
            "hex": hex::encode(&bytes),
            "length": bytes.len(),
        }));
    }
    println!("{}", hex::encode(&bytes));
    Ok(())
}
