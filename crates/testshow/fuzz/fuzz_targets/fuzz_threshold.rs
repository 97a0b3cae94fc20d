#![no_main]

//! Fuzz target for threshold parsing
//!
//! Arbitrary strings must either parse or be rejected, never panic.

use libfuzzer_sys::fuzz_target;
use testshow::config::parse_threshold;

fuzz_target!(|data: &str| {
    let _ = parse_threshold(data);
});
