#![no_main]

//! Fuzz target for rendering arbitrary event streams
//!
//! Every line is decoded and folded, every notice rendered, then the summary
//! is rendered in the selected mode. Nothing may panic.

use std::time::{Duration, Instant};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use testshow::config::{DisplayConfig, Mode};
use testshow::display::{Display, TerminalDisplay};
use testshow_events::prelude::*;

#[derive(Debug, Arbitrary)]
struct RenderInput {
    mode: u8,
    threshold_ms: u16,
    colorize: bool,
    lines: Vec<String>,
}

fuzz_target!(|input: RenderInput| {
    let mode = match input.mode % 3 {
        0 => Mode::Interactive,
        1 => Mode::Slow,
        _ => Mode::Plain,
    };
    let mut display = TerminalDisplay::new(
        std::io::sink(),
        DisplayConfig {
            mode,
            threshold: Duration::from_millis(u64::from(input.threshold_ms)),
            colorize: input.colorize,
        },
    );
    let store = StateStore::new();
    let start = Instant::now();

    for line in &input.lines {
        let Ok(Some(event)) = decode_line(line) else {
            continue;
        };
        match store.apply(&event) {
            Some(Notice::TestFinished { result, success }) => {
                let _ = display.show_test_result(&result, success);
            }
            Some(Notice::PackageFailed { package, output }) => {
                let _ = display.show_package_failure(&package, &output);
            }
            Some(Notice::BuildFailed { result }) => {
                let _ = display.show_test_result(&result, false);
            }
            None => {}
        }
        let _ = display.show_progress(&store.snapshot_packages(), store.has_started(), start);
    }

    let snapshot = store.snapshot();
    let _ = display.show_final_results(&snapshot.packages, &snapshot.results, start);
});
