#![no_main]

//! Fuzz target for begin-response parsing
//!
//! Exercises the untagged binary field deserialization with arbitrary JSON.
//! Malformed documents and binary fields must surface as errors, never
//! panics.
//!
//! Run with: cargo +nightly fuzz run fuzz_begin_response

use libfuzzer_sys::fuzz_target;
use passless_core::ceremony::wire::{BeginResponse, CreationOptionsJson, RequestOptionsJson};
use passless_core::codec;

fuzz_target!(|data: &[u8]| {
    if let Ok(begin) = serde_json::from_slice::<BeginResponse<CreationOptionsJson>>(data) {
        let _ = codec::decode_value(begin.data.challenge);
        let _ = codec::decode_value(begin.data.user.id);
        for descriptor in begin.data.exclude_credentials.unwrap_or_default() {
            let _ = codec::decode_value(descriptor.id);
        }
    }

    if let Ok(begin) = serde_json::from_slice::<BeginResponse<RequestOptionsJson>>(data) {
        let _ = codec::decode_value(begin.data.challenge);
    }
});
