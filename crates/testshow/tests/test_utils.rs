// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Test utilities for testshow integration tests
//!
//! This module provides:
//! - A cloneable in-memory writer the renderer can own while tests read it
//! - Helpers that drive a full run over in-memory input

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use testshow::config::{DisplayConfig, Mode};
use testshow::display::TerminalDisplay;
use testshow::error::RunError;
use testshow::runner::{RunOutcome, Runner};
use testshow_events::StateStore;

// ============================================================================
// Shared output buffer
// ============================================================================

/// An in-memory writer whose clones share one buffer
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Everything written so far, as text
    pub fn contents(&self) -> String {
        let bytes = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8(bytes.clone()).expect("renderer output should be UTF-8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Run harness
// ============================================================================

/// Display configuration without color, for stable assertions
pub fn display_config(mode: Mode) -> DisplayConfig {
    DisplayConfig {
        mode,
        threshold: Duration::from_millis(500),
        colorize: false,
    }
}

/// A runner wired to a fresh store and a renderer writing to `buffer`
#[allow(dead_code)]
pub fn test_runner(
    config: DisplayConfig,
    buffer: &SharedBuffer,
) -> (
    Runner<StateStore, TerminalDisplay<SharedBuffer>>,
    Arc<StateStore>,
) {
    let store = Arc::new(StateStore::new());
    let display = Arc::new(Mutex::new(TerminalDisplay::new(buffer.clone(), config)));
    (Runner::new(Arc::clone(&store), display), store)
}

/// Run the whole pipeline over `input` and return the outcome and output
#[allow(dead_code)]
pub async fn run_lines(config: DisplayConfig, input: &str) -> (Result<RunOutcome, RunError>, String) {
    let buffer = SharedBuffer::default();
    let (mut runner, _) = test_runner(config, &buffer);
    let result = runner.run(input.as_bytes()).await;
    (result, buffer.contents())
}
