// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! testshow-events: event reduction for testshow
//!
//! This library crate turns the line-delimited JSON stream produced by
//! `go test -json` into aggregate per-test and per-package state that can be
//! read safely while the stream is still being consumed.
//!
//! # Example
//!
//! ```
//! use testshow_events::prelude::*;
//!
//! let store = StateStore::new();
//! for line in [
//!     r#"{"Action":"run","Package":"example","Test":"TestAdd"}"#,
//!     r#"{"Action":"pass","Package":"example","Test":"TestAdd","Elapsed":0.01}"#,
//! ] {
//!     if let Some(event) = decode_line(line).unwrap() {
//!         store.apply(&event);
//!     }
//! }
//!
//! let snapshot = store.snapshot();
//! let stats = SummaryStats::collect(&snapshot.packages, &snapshot.results);
//! assert_eq!(stats.passed, 1);
//! ```

pub mod error;
pub mod event;
pub mod result;
pub mod rules;
pub mod store;
pub mod summary;

pub use error::EventsError;
pub use event::{Action, Event, decode_line};
pub use result::{
    BUILD_SENTINEL, PACKAGE_SENTINEL, PackageState, ResultKey, TestOutcome, TestResult,
};
pub use store::{EventProcessor, Notice, PackagesSnapshot, ResultsSnapshot, Snapshot, StateStore};
pub use summary::{PackageStatus, SummaryStats, Verdict};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::EventsError;
    pub use crate::event::{Action, Event, decode_line};
    pub use crate::result::{PackageState, ResultKey, TestOutcome, TestResult};
    pub use crate::store::{EventProcessor, Notice, Snapshot, StateStore};
    pub use crate::summary::{SummaryStats, Verdict};
}
