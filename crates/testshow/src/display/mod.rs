// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! The rendering boundary
//!
//! The runner and the progress ticker only talk to a [`Display`]; the
//! terminal renderer in [`terminal`] is the implementation the binary uses.

use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use testshow_events::{PackagesSnapshot, ResultsSnapshot, TestResult, Verdict};

use crate::config::DisplayConfig;

pub mod terminal;

pub use terminal::TerminalDisplay;

/// Everything the core can ask a renderer to do.
///
/// Write failures are returned rather than swallowed; the ticker logs and
/// carries on, the runner treats them as fatal.
pub trait Display: Send {
    /// Replace the display configuration
    fn set_config(&mut self, config: DisplayConfig);

    /// Render the periodic progress view
    fn show_progress(
        &mut self,
        packages: &PackagesSnapshot,
        has_started: bool,
        start: Instant,
    ) -> io::Result<()>;

    /// Render one finished test; `success` is false only for failures
    fn show_test_result(&mut self, result: &TestResult, success: bool) -> io::Result<()>;

    /// Render a package-level failure and its output
    fn show_package_failure(&mut self, package: &str, output: &[String]) -> io::Result<()>;

    /// Render the end-of-run summary and return the verdict it shows
    fn show_final_results(
        &mut self,
        packages: &PackagesSnapshot,
        results: &ResultsSnapshot,
        start: Instant,
    ) -> io::Result<Verdict>;

    /// Render usage guidance
    fn show_help(&mut self) -> io::Result<()>;

    /// Erase the in-place progress line
    fn clear_line(&mut self) -> io::Result<()>;

    /// Tell the user the input was not a structured event stream
    fn show_bad_input(&mut self) -> io::Result<()>;

    /// Tell the user the run was interrupted
    fn show_interrupted(&mut self) -> io::Result<()>;

    /// Put the terminal into live-display state (hide the cursor)
    fn prepare_terminal(&mut self) -> io::Result<()>;

    /// Undo [`Display::prepare_terminal`]
    fn restore_terminal(&mut self) -> io::Result<()>;
}

/// Lock a shared display.
///
/// Renders never leave a display half-updated in a way that matters, so a
/// poisoned lock is recovered rather than propagated.
pub(crate) fn lock<D: ?Sized>(display: &Mutex<D>) -> MutexGuard<'_, D> {
    display.lock().unwrap_or_else(PoisonError::into_inner)
}
