//! Accumulated per-test and per-package state

use std::fmt;

use serde::{Deserialize, Serialize};

/// Test name of the record synthesized when a package fails as a whole
pub const PACKAGE_SENTINEL: &str = "[PACKAGE]";

/// Test name of the record collecting build diagnostics for a package
pub const BUILD_SENTINEL: &str = "[BUILD]";

/// Identity of a [`TestResult`]: the owning package and the test name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResultKey {
    /// Package import path
    pub package: String,
    /// Test name, possibly containing `/`-separated subtest segments
    pub test: String,
}

impl ResultKey {
    /// Create a key from its parts
    #[must_use]
    pub fn new(package: impl Into<String>, test: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            test: test.into(),
        }
    }
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.test)
    }
}

/// Accumulated state for one (package, test) pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Package import path
    pub package: String,
    /// Test name
    pub test: String,
    /// A `pass` event arrived
    pub passed: bool,
    /// A `fail` event arrived
    pub failed: bool,
    /// A `skip` event arrived
    pub skipped: bool,
    /// Elapsed seconds reported by the completion event
    pub elapsed: f64,
    /// Captured output lines, in arrival order
    pub output: Vec<String>,
    /// A `run` event arrived
    pub started: bool,
    /// Counted as running: a `run` arrived and its completion has not
    pub in_progress: bool,
    /// First `file:line` found in the output; never overwritten once set
    pub location: Option<String>,
    /// Whether subtests of this test have been seen
    pub has_subtest: bool,
}

impl TestResult {
    /// Create an empty result for the given identity
    #[must_use]
    pub fn new(package: impl Into<String>, test: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            test: test.into(),
            ..Self::default()
        }
    }

    /// The identity of this result
    #[must_use]
    pub fn key(&self) -> ResultKey {
        ResultKey::new(self.package.clone(), self.test.clone())
    }

    /// The settled outcome, if any completion event arrived.
    ///
    /// Failure wins over skip, which wins over pass.
    #[must_use]
    pub fn outcome(&self) -> Option<TestOutcome> {
        if self.failed {
            Some(TestOutcome::Failed)
        } else if self.skipped {
            Some(TestOutcome::Skipped)
        } else if self.passed {
            Some(TestOutcome::Passed)
        } else {
            None
        }
    }

    /// Whether this is the synthetic package-failure record
    #[must_use]
    pub fn is_package_sentinel(&self) -> bool {
        self.test == PACKAGE_SENTINEL
    }

    /// Whether this is the synthetic build-diagnostics record
    #[must_use]
    pub fn is_build_sentinel(&self) -> bool {
        self.test == BUILD_SENTINEL
    }
}

/// Possible test outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestOutcome {
    /// Test passed
    Passed,
    /// Test failed
    Failed,
    /// Test was skipped
    Skipped,
}

/// Accumulated state for one package
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageState {
    /// Package import path
    pub name: String,
    /// Tests started, plus synthetic package-level failures
    pub total: usize,
    /// Leaf tests passed
    pub passed: usize,
    /// Leaf tests failed, plus package-level failures
    pub failed: usize,
    /// Leaf tests skipped
    pub skipped: usize,
    /// Tests started but not yet completed
    pub running: usize,
    /// Elapsed seconds reported by the package completion event
    pub elapsed: f64,
    /// Package-scope output lines
    pub output: Vec<String>,
    /// Failures attributable to a single test
    pub individual_test_failed: usize,
}

impl PackageState {
    /// Create an empty package state
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Number of tests that reached a terminal outcome
    #[must_use]
    pub fn completed(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}
