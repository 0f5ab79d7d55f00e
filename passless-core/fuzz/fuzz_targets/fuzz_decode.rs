#![no_main]

//! Fuzz target for codec::decode()
//!
//! Arbitrary text must either decode or fail with an encoding error, and
//! anything that decodes must survive a round trip through encode.
//!
//! Run with: cargo +nightly fuzz run fuzz_decode

use libfuzzer_sys::fuzz_target;
use passless_core::codec;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(bytes) = codec::decode(text) {
        let encoded = codec::encode(&bytes);
        assert!(!encoded.contains(['+', '/', '=']));
        assert_eq!(codec::decode(&encoded).ok(), Some(bytes));
    }
});
