// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for event reduction
//!
//! Feeds structured events in arbitrary order into the `StateStore` and
//! checks that folding and summarizing never panic.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use testshow_events::prelude::*;

#[derive(Debug, Arbitrary)]
struct FuzzEvent {
    action: u8,
    package: u8,
    test: String,
    elapsed: f64,
    output: String,
    import_path: String,
}

const ACTIONS: [Action; 8] = [
    Action::Run,
    Action::Output,
    Action::Pass,
    Action::Fail,
    Action::Skip,
    Action::BuildOutput,
    Action::BuildFail,
    Action::Other,
];

fuzz_target!(|events: Vec<FuzzEvent>| {
    let store = StateStore::new();
    for raw in events {
        let action = ACTIONS[usize::from(raw.action) % ACTIONS.len()];
        let package = ["", "pkg", "github.com/u/r/pkg"][usize::from(raw.package) % 3];
        let event = Event::new(action, package, raw.test)
            .with_elapsed(raw.elapsed)
            .with_output(raw.output)
            .with_import_path(raw.import_path);
        let _ = store.apply(&event);
    }

    let snapshot = store.snapshot();
    let _ = SummaryStats::collect(&snapshot.packages, &snapshot.results);
});
