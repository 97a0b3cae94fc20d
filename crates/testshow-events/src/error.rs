// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for testshow-events

use thiserror::Error;

/// Errors that can occur while decoding the event stream
#[derive(Debug, Error)]
pub enum EventsError {
    /// A line looked like a record but was not valid JSON for an event
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A line carries no structural marker at all
    #[error("Input is not structured event data: {line}")]
    NotStructured {
        /// The offending line, trimmed
        line: String,
    },
}

impl EventsError {
    /// Whether this error means the stream is not in the expected format
    /// at all, as opposed to a single damaged record.
    #[must_use]
    pub fn is_not_structured(&self) -> bool {
        matches!(self, Self::NotStructured { .. })
    }
}
