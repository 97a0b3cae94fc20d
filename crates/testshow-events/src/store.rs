// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! The state store
//!
//! [`StateStore`] owns the map of test results and the map of package states
//! and is the only place they are mutated. Every event is folded under a
//! single write lock; every read hands out a copy taken under the read lock,
//! so a concurrent renderer never observes a half-applied event.
//!
//! # Example
//!
//! ```
//! use testshow_events::event::{Action, Event};
//! use testshow_events::store::{EventProcessor, StateStore};
//!
//! let store = StateStore::new();
//! store.apply(&Event::new(Action::Run, "example", "TestAdd"));
//! store.apply(&Event::new(Action::Pass, "example", "TestAdd").with_elapsed(0.01));
//!
//! let packages = store.snapshot_packages();
//! assert_eq!(packages["example"].passed, 1);
//! ```

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::event::{Action, Event};
use crate::result::{BUILD_SENTINEL, PACKAGE_SENTINEL, PackageState, ResultKey, TestResult};
use crate::rules;

/// Snapshot of all test results, keyed by identity
pub type ResultsSnapshot = BTreeMap<ResultKey, TestResult>;

/// Snapshot of all package states, keyed by package name
pub type PackagesSnapshot = BTreeMap<String, PackageState>;

/// Something that folding an event produced and that deserves an immediate
/// render. Carries copies taken atomically with the fold itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// A test reached pass, fail or skip
    TestFinished {
        /// The result as of this event
        result: TestResult,
        /// False only for failures
        success: bool,
    },
    /// A package failed in a way that is not explained by its test failures
    PackageFailed {
        /// Package import path
        package: String,
        /// Package-scope output accumulated so far
        output: Vec<String>,
    },
    /// A package failed to build and its diagnostics record exists
    BuildFailed {
        /// The `[BUILD]` result
        result: TestResult,
    },
}

/// Folds events into aggregate state and hands out snapshots.
///
/// The coordinator only depends on this trait, so the reduction can be
/// swapped or observed in tests without a terminal attached.
pub trait EventProcessor: Send + Sync {
    /// Fold one event into the state
    fn apply(&self, event: &Event) -> Option<Notice>;

    /// Copy of every test result
    fn snapshot_results(&self) -> ResultsSnapshot;

    /// Copy of every package state
    fn snapshot_packages(&self) -> PackagesSnapshot;

    /// Whether any test has started
    fn has_started(&self) -> bool;

    /// Packages and results copied under one lock acquisition
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            packages: self.snapshot_packages(),
            results: self.snapshot_results(),
            has_started: self.has_started(),
        }
    }
}

/// A consistent copy of the whole store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Package states
    pub packages: PackagesSnapshot,
    /// Test results
    pub results: ResultsSnapshot,
    /// Whether any test has started
    pub has_started: bool,
}

#[derive(Debug, Default)]
struct Inner {
    results: ResultsSnapshot,
    packages: PackagesSnapshot,
    has_started: bool,
}

/// The default [`EventProcessor`], guarded by a single reader-writer lock
#[derive(Debug, Default)]
pub struct StateStore {
    inner: RwLock<Inner>,
}

impl StateStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Every critical section leaves both maps consistent, so a poisoned lock
    // still guards valid data.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventProcessor for StateStore {
    fn apply(&self, event: &Event) -> Option<Notice> {
        trace!(action = %event.action, package = %event.package, test = %event.test, "applying event");
        self.write().apply(event)
    }

    fn snapshot_results(&self) -> ResultsSnapshot {
        self.read().results.clone()
    }

    fn snapshot_packages(&self) -> PackagesSnapshot {
        self.read().packages.clone()
    }

    fn has_started(&self) -> bool {
        self.read().has_started
    }

    fn snapshot(&self) -> Snapshot {
        let inner = self.read();
        Snapshot {
            packages: inner.packages.clone(),
            results: inner.results.clone(),
            has_started: inner.has_started,
        }
    }
}

impl Inner {
    fn apply(&mut self, event: &Event) -> Option<Notice> {
        if event.action.is_build() {
            return self.apply_build(event);
        }

        if event.package.is_empty() {
            debug!(action = %event.action, "ignoring event without a package");
            return None;
        }

        if !self.packages.contains_key(&event.package) {
            self.packages
                .insert(event.package.clone(), PackageState::new(&event.package));
        }

        if event.is_test_scope() {
            self.apply_test(event)
        } else {
            self.apply_package(event)
        }
    }

    fn apply_test(&mut self, event: &Event) -> Option<Notice> {
        let key = ResultKey::new(&event.package, &event.test);
        self.results
            .entry(key.clone())
            .or_insert_with(|| TestResult::new(&event.package, &event.test));

        if let Some(parent) = rules::parent_test_name(&event.test) {
            if let Some(parent) = self.results.get_mut(&ResultKey::new(&event.package, parent)) {
                parent.has_subtest = true;
            }
        }

        // Asked only now: subtests may have appeared after the parent started.
        let is_parent = event.action.is_completion()
            && rules::has_subtests(&self.results, &event.package, &event.test);

        let pkg = self.packages.get_mut(&event.package)?;
        let result = self.results.get_mut(&key)?;

        match event.action {
            Action::Run => {
                result.started = true;
                self.has_started = true;
                if !result.in_progress {
                    result.in_progress = true;
                    pkg.running += 1;
                    pkg.total += 1;
                }
                None
            }
            Action::Output => {
                result.output.push(event.output.clone());
                if result.location.is_none() {
                    result.location =
                        rules::extract_location_in_package(&event.output, &event.package);
                }
                None
            }
            Action::Pass | Action::Fail | Action::Skip => {
                match event.action {
                    Action::Pass => result.passed = true,
                    Action::Fail => result.failed = true,
                    _ => result.skipped = true,
                }
                result.elapsed = event.elapsed.unwrap_or_default();

                // A completion without a matching `run` counts its own total.
                let was_running = std::mem::take(&mut result.in_progress);
                if was_running {
                    pkg.running = pkg.running.saturating_sub(1);
                }

                if is_parent {
                    // Only leaf subtests count; the parent leaves the totals.
                    result.has_subtest = true;
                    if was_running {
                        pkg.total = pkg.total.saturating_sub(1);
                    }
                } else {
                    if !was_running {
                        pkg.total += 1;
                    }
                    match event.action {
                        Action::Pass => pkg.passed += 1,
                        Action::Fail => {
                            pkg.failed += 1;
                            pkg.individual_test_failed += 1;
                        }
                        _ => pkg.skipped += 1,
                    }
                }

                Some(Notice::TestFinished {
                    result: result.clone(),
                    success: event.action != Action::Fail,
                })
            }
            _ => None,
        }
    }

    fn apply_package(&mut self, event: &Event) -> Option<Notice> {
        let pkg = self.packages.get_mut(&event.package)?;

        match event.action {
            Action::Output => {
                pkg.output.push(event.output.clone());
                None
            }
            Action::Pass => {
                pkg.elapsed = event.elapsed.unwrap_or_default();
                None
            }
            Action::Fail => {
                pkg.elapsed = event.elapsed.unwrap_or_default();
                let build_reported = self
                    .results
                    .contains_key(&ResultKey::new(&event.package, BUILD_SENTINEL));
                self.results.insert(
                    ResultKey::new(&event.package, PACKAGE_SENTINEL),
                    TestResult {
                        failed: true,
                        elapsed: pkg.elapsed,
                        output: pkg.output.clone(),
                        ..TestResult::new(&event.package, PACKAGE_SENTINEL)
                    },
                );

                // A build failure was already counted and shown by its own event.
                if build_reported || !rules::is_displayable_package_failure(pkg) {
                    return None;
                }

                debug!(package = %event.package, "package-level failure");
                pkg.total += 1;
                pkg.failed += 1;
                Some(Notice::PackageFailed {
                    package: event.package.clone(),
                    output: pkg.output.clone(),
                })
            }
            _ => None,
        }
    }

    fn apply_build(&mut self, event: &Event) -> Option<Notice> {
        let Some(name) = event.build_package() else {
            debug!(action = %event.action, "ignoring build event without an import path");
            return None;
        };
        let name = name.to_string();

        let pkg = self
            .packages
            .entry(name.clone())
            .or_insert_with(|| PackageState::new(&name));
        let key = ResultKey::new(&name, BUILD_SENTINEL);

        match event.action {
            Action::BuildOutput => {
                pkg.output.push(event.output.clone());

                let result = self.results.entry(key).or_insert_with(|| TestResult {
                    failed: true,
                    ..TestResult::new(&name, BUILD_SENTINEL)
                });
                result.output.push(event.output.clone());
                if result.location.is_none() {
                    result.location = rules::extract_location_in_package(&event.output, &name);
                }
                None
            }
            Action::BuildFail => {
                pkg.failed += 1;
                pkg.total += 1;
                debug!(package = %name, "build failed");
                self.results
                    .get(&key)
                    .map(|result| Notice::BuildFailed {
                        result: result.clone(),
                    })
            }
            _ => None,
        }
    }
}
