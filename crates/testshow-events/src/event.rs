// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Wire records emitted by `go test -json`
//!
//! Each line of the stream is one JSON object describing a single fact about
//! the test run. Records are decoded into [`Event`] values and never mutated
//! afterwards; the [`StateStore`](crate::store::StateStore) folds them into
//! aggregate state.
//!
//! # Example
//!
//! ```
//! use testshow_events::event::{Action, decode_line};
//!
//! let line = r#"{"Action":"run","Package":"example.com/m","Test":"TestAdd"}"#;
//! let event = decode_line(line).unwrap().expect("non-empty line");
//! assert_eq!(event.action, Action::Run);
//! assert_eq!(event.test, "TestAdd");
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EventsError;

/// One observed fact from the test run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    /// When the runner emitted the record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    /// What happened
    #[serde(default)]
    pub action: Action,
    /// Owning package import path
    #[serde(default)]
    pub package: String,
    /// Test name; empty for package-scope events
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub test: String,
    /// Elapsed seconds, present on completion events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<f64>,
    /// One line of captured output, including its trailing newline
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
    /// Import path for build-phase events that precede package association
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub import_path: String,
}

/// The action carried by an [`Event`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// A test started running
    Run,
    /// A line of output was produced
    Output,
    /// A test or package passed
    Pass,
    /// A test or package failed
    Fail,
    /// A test or package was skipped
    Skip,
    /// Compiler output produced while building a package
    BuildOutput,
    /// A package failed to build
    BuildFail,
    /// Any action the reducer does not act on (`start`, `pause`, `cont`, `bench`, ...)
    #[default]
    #[serde(other)]
    Other,
}

impl Action {
    /// Whether this action completes a test or package
    #[must_use]
    pub fn is_completion(self) -> bool {
        matches!(self, Self::Pass | Self::Fail | Self::Skip)
    }

    /// Whether this action belongs to the build phase
    #[must_use]
    pub fn is_build(self) -> bool {
        matches!(self, Self::BuildOutput | Self::BuildFail)
    }

    /// The wire spelling of this action
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Output => "output",
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Skip => "skip",
            Self::BuildOutput => "build-output",
            Self::BuildFail => "build-fail",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Event {
    /// Create an event for the given action, package and test
    #[must_use]
    pub fn new(action: Action, package: impl Into<String>, test: impl Into<String>) -> Self {
        Self {
            action,
            package: package.into(),
            test: test.into(),
            ..Self::default()
        }
    }

    /// Attach elapsed seconds
    #[must_use]
    pub fn with_elapsed(mut self, elapsed: f64) -> Self {
        self.elapsed = Some(elapsed);
        self
    }

    /// Attach an output line
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Attach a build-phase import path
    #[must_use]
    pub fn with_import_path(mut self, import_path: impl Into<String>) -> Self {
        self.import_path = import_path.into();
        self
    }

    /// Whether this event refers to a single test rather than a package
    #[must_use]
    pub fn is_test_scope(&self) -> bool {
        !self.test.is_empty()
    }

    /// Package a build-phase event belongs to.
    ///
    /// The import path of a test binary carries a bracketed suffix
    /// (`example.com/m [example.com/m.test]`) which is dropped.
    #[must_use]
    pub fn build_package(&self) -> Option<&str> {
        let path = match self.import_path.find(" [") {
            Some(idx) => &self.import_path[..idx],
            None => self.import_path.as_str(),
        };
        (!path.is_empty()).then_some(path)
    }
}

/// Decode one line of the event stream.
///
/// Returns `Ok(None)` for blank lines.
///
/// # Errors
///
/// Returns [`EventsError::NotStructured`] when the line fails to decode and
/// has no opening brace at all, and [`EventsError::JsonParse`] for any other
/// decode failure.
pub fn decode_line(line: &str) -> Result<Option<Event>, EventsError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match serde_json::from_str(trimmed) {
        Ok(event) => Ok(Some(event)),
        Err(_) if !trimmed.contains('{') => Err(EventsError::NotStructured {
            line: trimmed.to_string(),
        }),
        Err(e) => Err(EventsError::JsonParse(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn test_decode_full_record() {
        let line = r#"{"Time":"2024-01-01T00:00:00.5+09:00","Action":"pass","Package":"example","Test":"TestAdd","Elapsed":0.01}"#;
        let event = decode_line(line).expect("decode").expect("some");
        assert_eq!(event.action, Action::Pass);
        assert_eq!(event.package, "example");
        assert_eq!(event.test, "TestAdd");
        assert_eq!(event.elapsed, Some(0.01));
        assert!(event.time.is_some());
    }

    #[test]
    fn test_decode_unknown_action_is_other() {
        for action in ["start", "pause", "cont", "bench", "something-new"] {
            let line = format!(r#"{{"Action":"{action}","Package":"p"}}"#);
            let event = decode_line(&line).expect("decode").expect("some");
            assert_eq!(event.action, Action::Other, "for action {action}");
        }
    }

    #[test]
    fn test_decode_build_actions() {
        let line = r#"{"ImportPath":"example/broken [example/broken.test]","Action":"build-output","Output":"broken.go:3:1: syntax error\n"}"#;
        let event = decode_line(line).expect("decode").expect("some");
        assert_eq!(event.action, Action::BuildOutput);
        assert_eq!(event.build_package(), Some("example/broken"));

        let line = r#"{"ImportPath":"example/broken","Action":"build-fail"}"#;
        let event = decode_line(line).expect("decode").expect("some");
        assert_eq!(event.action, Action::BuildFail);
        assert_eq!(event.build_package(), Some("example/broken"));
    }

    #[test]
    fn test_decode_blank_line() {
        assert!(decode_line("").expect("blank").is_none());
        assert!(decode_line("   \t").expect("blank").is_none());
    }

    #[test]
    fn test_decode_plain_text_is_not_structured() {
        let err = decode_line("ok  \texample\t0.002s").expect_err("should fail");
        assert!(err.is_not_structured());
    }

    #[test]
    fn test_decode_broken_json_is_parse_error() {
        let err = decode_line(r#"{"Action":"run","#).expect_err("should fail");
        assert!(!err.is_not_structured());
        assert!(matches!(err, EventsError::JsonParse(_)));
    }

    #[test]
    fn test_missing_fields_default() {
        let event = decode_line("{}").expect("decode").expect("some");
        assert_eq!(event, Event::default());
        assert!(!event.is_test_scope());
        assert_eq!(event.build_package(), None);
    }

    #[test]
    fn test_builder_helpers() {
        let event = Event::new(Action::Output, "pkg", "TestA").with_output("hello\n");
        assert!(event.is_test_scope());
        assert_eq!(event.output, "hello\n");
        assert_eq!(Action::BuildFail.to_string(), "build-fail");
        assert!(Action::Skip.is_completion());
        assert!(!Action::Output.is_completion());
        assert!(Action::BuildOutput.is_build());
    }
}
