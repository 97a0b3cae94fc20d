// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Benchmarks for terminal rendering

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::io;
use std::time::{Duration, Instant};
use testshow::config::{DisplayConfig, Mode};
use testshow::display::{Display, TerminalDisplay};
use testshow_events::prelude::*;

fn folded_store(packages: usize, tests: usize) -> StateStore {
    let store = StateStore::new();
    for p in 0..packages {
        let pkg = format!("github.com/acme/bench/pkg{p}");
        for t in 0..tests {
            let name = format!("TestCase{t}");
            store.apply(&Event::new(Action::Run, &pkg, &name));
            store.apply(
                &Event::new(Action::Output, &pkg, &name)
                    .with_output(format!("    case_test.go:{t}: checking\n")),
            );
            let action = if t % 10 == 0 { Action::Fail } else { Action::Pass };
            store.apply(&Event::new(action, &pkg, &name).with_elapsed(t as f64 / 100.0));
        }
        store.apply(&Event::new(Action::Fail, &pkg, "").with_elapsed(1.0));
    }
    store
}

fn display(mode: Mode, colorize: bool) -> TerminalDisplay<io::Sink> {
    TerminalDisplay::new(
        io::sink(),
        DisplayConfig {
            mode,
            threshold: Duration::from_millis(500),
            colorize,
        },
    )
}

fn bench_final_results(c: &mut Criterion) {
    let snapshot = folded_store(10, 100).snapshot();
    let mut group = c.benchmark_group("final_results");
    for (label, mode, colorize) in [
        ("interactive_color", Mode::Interactive, true),
        ("slow", Mode::Slow, false),
        ("plain", Mode::Plain, false),
    ] {
        group.bench_function(label, |b| {
            let mut display = display(mode, colorize);
            let start = Instant::now();
            b.iter(|| {
                display
                    .show_final_results(
                        black_box(&snapshot.packages),
                        black_box(&snapshot.results),
                        start,
                    )
                    .expect("sink never fails")
            });
        });
    }
    group.finish();
}

fn bench_progress(c: &mut Criterion) {
    let snapshot = folded_store(10, 100).snapshot();
    c.bench_function("show_progress", |b| {
        let mut display = display(Mode::Interactive, true);
        let start = Instant::now();
        b.iter(|| {
            display
                .show_progress(black_box(&snapshot.packages), true, start)
                .expect("sink never fails");
        });
    });
}

fn bench_failure(c: &mut Criterion) {
    let snapshot = folded_store(1, 10).snapshot();
    let failure = snapshot
        .results
        .values()
        .find(|result| result.failed && result.test.starts_with("Test"))
        .cloned()
        .expect("synthetic stream has a failure");
    c.bench_function("show_test_result_failure", |b| {
        let mut display = display(Mode::Interactive, true);
        b.iter(|| {
            display
                .show_test_result(black_box(&failure), false)
                .expect("sink never fails");
        });
    });
}

criterion_group!(benches, bench_final_results, bench_progress, bench_failure);
criterion_main!(benches);
