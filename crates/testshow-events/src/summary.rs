// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Run-level statistics derived from a snapshot
//!
//! Everything here is a pure function of the package and result snapshots,
//! shared by every display mode so the live view, the summary and the exit
//! code never disagree about what failed.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::result::{PACKAGE_SENTINEL, PackageState, ResultKey, TestResult};
use crate::rules;
use crate::store::{PackagesSnapshot, ResultsSnapshot};

/// Totals across every package
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Tests started, plus package-level failures
    pub total: usize,
    /// Tests passed
    pub passed: usize,
    /// Tests and packages failed
    pub failed: usize,
    /// Tests skipped
    pub skipped: usize,
    /// Tests still running
    pub running: usize,
    /// Whether any package has something to report in the failure summary
    pub has_failures: bool,
}

impl SummaryStats {
    /// Sum the packages and check each for a reportable failure
    #[must_use]
    pub fn collect(packages: &PackagesSnapshot, results: &ResultsSnapshot) -> Self {
        let mut stats = Self::default();
        for pkg in packages.values() {
            stats.total += pkg.total;
            stats.passed += pkg.passed;
            stats.failed += pkg.failed;
            stats.skipped += pkg.skipped;
            stats.running += pkg.running;

            if pkg.failed > 0 || has_package_failure(pkg, results) {
                stats.has_failures = true;
            }
        }
        stats
    }

    /// The overall verdict of the run
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        if self.failed > 0 || self.has_failures {
            Verdict::Failed
        } else {
            Verdict::Passed
        }
    }
}

/// Whether the run as a whole succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// No test or package failed
    Passed,
    /// At least one test or package failed
    Failed,
}

impl Verdict {
    /// Process exit code for this verdict
    #[must_use]
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Passed => 0,
            Self::Failed => 1,
        }
    }
}

/// How a package appears in the failure summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageStatus {
    /// At least one individual test failed
    Fail,
    /// The package failed without any individual test failing
    PackageFail,
}

/// Whether the package has a failed `[PACKAGE]` record that qualifies as a
/// displayable package failure
#[must_use]
pub fn has_package_failure(pkg: &PackageState, results: &ResultsSnapshot) -> bool {
    results
        .get(&ResultKey::new(&pkg.name, PACKAGE_SENTINEL))
        .is_some_and(|sentinel| sentinel.failed && rules::is_displayable_package_failure(pkg))
}

/// Summary status of a package, or `None` if it has nothing to report
#[must_use]
pub fn package_status(pkg: &PackageState, results: &ResultsSnapshot) -> Option<PackageStatus> {
    let package_failure = has_package_failure(pkg, results);
    if pkg.failed == 0 && !package_failure {
        return None;
    }

    if pkg.individual_test_failed == 0 {
        Some(PackageStatus::PackageFail)
    } else {
        Some(PackageStatus::Fail)
    }
}

/// Individually failed tests of a package, in name order.
///
/// Excludes the `[PACKAGE]` record and parents whose subtests are reported
/// instead.
pub fn failed_tests<'a>(
    package: &'a str,
    results: &'a ResultsSnapshot,
) -> impl Iterator<Item = &'a TestResult> + 'a {
    results
        .range(ResultKey::new(package, "")..)
        .take_while(move |(key, _)| key.package == package)
        .map(|(_, result)| result)
        .filter(|result| result.failed && !result.is_package_sentinel() && !result.has_subtest)
}

/// Whether an elapsed time exceeds the slow threshold.
///
/// A zero threshold disables slow classification.
#[must_use]
pub fn is_slow(elapsed_secs: f64, threshold: Duration) -> bool {
    !threshold.is_zero() && elapsed_secs > threshold.as_secs_f64()
}

/// Slow tests grouped by package, slowest first within each package
#[must_use]
pub fn slow_tests(
    results: &ResultsSnapshot,
    threshold: Duration,
) -> BTreeMap<String, Vec<&TestResult>> {
    let mut by_package: BTreeMap<String, Vec<&TestResult>> = BTreeMap::new();
    for result in results.values() {
        if result.has_subtest || result.is_package_sentinel() {
            continue;
        }
        if is_slow(result.elapsed, threshold) {
            by_package
                .entry(result.package.clone())
                .or_default()
                .push(result);
        }
    }

    for tests in by_package.values_mut() {
        tests.sort_by(|a, b| b.elapsed.total_cmp(&a.elapsed));
    }
    by_package
}

/// Number of packages that recorded at least one test
#[must_use]
pub fn packages_with_tests(packages: &PackagesSnapshot) -> usize {
    packages.values().filter(|pkg| pkg.total > 0).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn result(pkg: &str, test: &str, elapsed: f64, failed: bool) -> (ResultKey, TestResult) {
        (
            ResultKey::new(pkg, test),
            TestResult {
                elapsed,
                failed,
                passed: !failed,
                ..TestResult::new(pkg, test)
            },
        )
    }

    #[test]
    fn test_collect_sums_packages() {
        let packages: PackagesSnapshot = [
            (
                "a".to_string(),
                PackageState {
                    total: 3,
                    passed: 2,
                    skipped: 1,
                    ..PackageState::new("a")
                },
            ),
            (
                "b".to_string(),
                PackageState {
                    total: 2,
                    passed: 1,
                    failed: 1,
                    individual_test_failed: 1,
                    ..PackageState::new("b")
                },
            ),
        ]
        .into_iter()
        .collect();

        let stats = SummaryStats::collect(&packages, &ResultsSnapshot::new());
        assert_eq!(
            stats,
            SummaryStats {
                total: 5,
                passed: 3,
                failed: 1,
                skipped: 1,
                running: 0,
                has_failures: true,
            }
        );
        assert_eq!(stats.verdict(), Verdict::Failed);
        assert_eq!(stats.verdict().exit_code(), 1);
    }

    #[test]
    fn test_empty_run_passes() {
        let stats = SummaryStats::collect(&PackagesSnapshot::new(), &ResultsSnapshot::new());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.verdict(), Verdict::Passed);
        assert_eq!(stats.verdict().exit_code(), 0);
    }

    #[test]
    fn test_package_status() {
        let mut results = ResultsSnapshot::new();
        let ok = PackageState {
            total: 2,
            passed: 2,
            ..PackageState::new("ok")
        };
        assert_eq!(package_status(&ok, &results), None);

        let test_fail = PackageState {
            total: 2,
            passed: 1,
            failed: 1,
            individual_test_failed: 1,
            ..PackageState::new("tf")
        };
        assert_eq!(package_status(&test_fail, &results), Some(PackageStatus::Fail));

        let build_fail = PackageState {
            total: 1,
            failed: 1,
            output: vec!["# bf [build failed]\n".to_string()],
            ..PackageState::new("bf")
        };
        results.insert(
            ResultKey::new("bf", PACKAGE_SENTINEL),
            TestResult {
                failed: true,
                ..TestResult::new("bf", PACKAGE_SENTINEL)
            },
        );
        assert!(has_package_failure(&build_fail, &results));
        assert_eq!(
            package_status(&build_fail, &results),
            Some(PackageStatus::PackageFail)
        );
    }

    #[test]
    fn test_failed_tests_excludes_sentinel_and_parents() {
        let mut results: ResultsSnapshot = [
            result("a", "TestOk", 0.1, false),
            result("a", "TestBad", 0.1, true),
            result("a", "TestParent", 0.1, true),
            result("a", "TestParent/child", 0.1, true),
            result("a", PACKAGE_SENTINEL, 0.1, true),
            result("b", "TestOther", 0.1, true),
        ]
        .into_iter()
        .collect();
        results
            .get_mut(&ResultKey::new("a", "TestParent"))
            .expect("parent")
            .has_subtest = true;

        let names: Vec<&str> = failed_tests("a", &results)
            .map(|r| r.test.as_str())
            .collect();
        assert_eq!(names, ["TestBad", "TestParent/child"]);
    }

    #[test]
    fn test_is_slow() {
        let threshold = Duration::from_millis(500);
        assert!(is_slow(0.6, threshold));
        assert!(!is_slow(0.5, threshold));
        assert!(!is_slow(0.1, threshold));
        assert!(!is_slow(10.0, Duration::ZERO));
    }

    #[test]
    fn test_slow_tests_grouped_and_sorted() {
        let results: ResultsSnapshot = [
            result("a", "TestFast", 0.1, false),
            result("a", "TestSlow", 0.8, false),
            result("a", "TestSlower", 1.2, true),
            result("b", "TestSlowB", 0.9, false),
            result("b", PACKAGE_SENTINEL, 5.0, true),
        ]
        .into_iter()
        .collect();

        let slow = slow_tests(&results, Duration::from_millis(500));
        let a: Vec<&str> = slow["a"].iter().map(|r| r.test.as_str()).collect();
        let b: Vec<&str> = slow["b"].iter().map(|r| r.test.as_str()).collect();
        assert_eq!(a, ["TestSlower", "TestSlow"]);
        assert_eq!(b, ["TestSlowB"]);
    }

    #[test]
    fn test_packages_with_tests() {
        let packages: PackagesSnapshot = [
            ("a".to_string(), PackageState { total: 1, ..PackageState::new("a") }),
            ("b".to_string(), PackageState::new("b")),
        ]
        .into_iter()
        .collect();
        assert_eq!(packages_with_tests(&packages), 1);
    }
}
