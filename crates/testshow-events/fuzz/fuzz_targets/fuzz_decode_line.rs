// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for single-line event decoding
//!
//! This fuzzes `decode_line`, which must classify every input as an event,
//! a blank line, a damaged record or non-structured input without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;

use testshow_events::decode_line;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let _ = decode_line(input);
    }
});
