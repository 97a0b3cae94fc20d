// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! testshow library
//!
//! The pieces behind the `testshow` binary: command-line configuration, the
//! rendering boundary and its terminal implementation, the periodic progress
//! ticker and the streaming coordinator. Exposed as a library so the whole
//! pipeline can be driven from tests with in-memory input and output.

pub mod config;
pub mod display;
pub mod error;
pub mod progress;
pub mod runner;

pub use config::{Config, DisplayConfig, Mode};
pub use display::{Display, TerminalDisplay};
pub use error::RunError;
pub use runner::{Phase, RunOutcome, Runner};
