// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for a formatting run

use thiserror::Error;

/// Errors that end a run without a summary
#[derive(Debug, Error)]
pub enum RunError {
    /// The input is not a `go test -json` stream at all
    #[error("Input is not in JSON format: {line}")]
    BadInput {
        /// First non-empty line of the input
        line: String,
    },

    /// Reading the input or writing the report failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunError {
    /// Process exit status for this error
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        1
    }
}
