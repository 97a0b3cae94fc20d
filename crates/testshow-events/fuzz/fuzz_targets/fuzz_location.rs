// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for location extraction
//!
//! `extract_location_in_package` scans arbitrary free text and must never
//! panic or return a location without a line number.

#![no_main]

use libfuzzer_sys::fuzz_target;

use testshow_events::rules::extract_location_in_package;

fuzz_target!(|input: (&str, &str)| {
    let (line, package) = input;
    if let Some(location) = extract_location_in_package(line, package) {
        let (_, line_no) = location.rsplit_once(':').expect("location has a colon");
        assert!(line_no.parse::<u32>().is_ok());
    }
});
