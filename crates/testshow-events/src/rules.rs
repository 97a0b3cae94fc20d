// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Aggregation rules
//!
//! Pure policies consulted by the [`StateStore`](crate::store::StateStore)
//! while folding events and by renderers while presenting state:
//!
//! - whether a test is a subtest, and whether a parent test has subtests
//! - how a `file:line` location is pulled out of free-text output
//! - whether a package-level failure deserves to be surfaced on its own
//! - which captured output lines are worth showing

use std::collections::BTreeMap;

use crate::result::{PackageState, ResultKey, TestResult};

/// Separator between a parent test and its subtests
pub const SUBTEST_SEPARATOR: char = '/';

/// Source file suffix recognized by location extraction
pub const SOURCE_SUFFIX: &str = ".go";

/// Output substrings that indicate a package failed to build or load
pub const BUILD_ERROR_MARKERS: [&str; 6] = [
    "[build failed]",
    "build constraints exclude all Go files",
    "no buildable Go source files",
    "syntax error",
    "cannot find package",
    "undefined:",
];

/// Scaffolding lines printed by the test framework itself
const SCAFFOLDING_PREFIXES: [&str; 3] = ["=== RUN", "=== PAUSE", "=== CONT"];

/// Hosting domains whose next two path segments name the owner and repository
const HOSTING_DOMAINS: [&str; 3] = ["github.com", "gitlab.com", "bitbucket.org"];

// ============================================================================
// Subtests
// ============================================================================

/// Whether the test name denotes a subtest
#[must_use]
pub fn is_subtest(test: &str) -> bool {
    test.contains(SUBTEST_SEPARATOR)
}

/// Name of the top-level test owning a subtest, or `None` for a top-level test
#[must_use]
pub fn parent_test_name(test: &str) -> Option<&str> {
    test.split_once(SUBTEST_SEPARATOR).map(|(parent, _)| parent)
}

/// Whether a top-level test has any known subtests.
///
/// Subtests are discovered incrementally, so this has to be asked when the
/// parent's own completion event arrives rather than remembered from earlier.
#[must_use]
pub fn has_subtests(results: &BTreeMap<ResultKey, TestResult>, package: &str, test: &str) -> bool {
    if is_subtest(test) {
        return false;
    }

    let prefix = format!("{test}{SUBTEST_SEPARATOR}");
    results
        .range(ResultKey::new(package, prefix.clone())..)
        .next()
        .is_some_and(|(key, _)| key.package == package && key.test.starts_with(&prefix))
}

// ============================================================================
// Locations
// ============================================================================

/// Extract a `file:line` location from one line of output.
///
/// The line must look like `name.go:<line>[:...]`; anything else, including
/// lines whose second segment is not a number, yields `None`.
#[must_use]
pub fn extract_location(line: &str) -> Option<String> {
    let mut parts = line.trim().splitn(3, ':');
    let file = parts.next()?;
    let line_no = parts.next()?;

    if !file.ends_with(SOURCE_SUFFIX) || line_no.parse::<u32>().is_err() {
        return None;
    }

    Some(format!("{file}:{line_no}"))
}

/// Extract a location and qualify a bare file name with the package's
/// readable relative path, e.g. `example/math_test.go:20`.
#[must_use]
pub fn extract_location_in_package(line: &str, package: &str) -> Option<String> {
    let location = extract_location(line)?;
    if location.contains('/') {
        return Some(location);
    }

    match relative_package_path(package) {
        Some(prefix) => Some(format!("{prefix}/{location}")),
        None => Some(location),
    }
}

/// Shorten a fully-qualified package path to a readable relative prefix.
///
/// `github.com/owner/repo/pkg/sub` becomes `pkg/sub`; a path under another
/// domain-like segment keeps what follows that segment; otherwise the last
/// one or two segments are used. Single-segment paths yield `None`.
#[must_use]
pub fn relative_package_path(package: &str) -> Option<String> {
    let parts: Vec<&str> = package.split('/').collect();
    if parts.len() <= 1 {
        return None;
    }

    for (i, part) in parts.iter().enumerate() {
        if HOSTING_DOMAINS.contains(part) {
            if i + 3 < parts.len() {
                return Some(parts[i + 3..].join("/"));
            }
            break;
        }
        if is_domain_like(part) {
            if i + 1 < parts.len() {
                return Some(parts[i + 1..].join("/"));
            }
            break;
        }
    }

    if parts.len() == 2 {
        Some(parts[1].to_string())
    } else {
        Some(parts[parts.len() - 2..].join("/"))
    }
}

fn is_domain_like(segment: &str) -> bool {
    segment.contains('.')
        && (segment.contains("com") || segment.contains("org") || segment.contains("net"))
}

// ============================================================================
// Package failures
// ============================================================================

/// Whether a package-level failure should be surfaced as its own event.
///
/// True when the package output carries a build error marker, when the
/// package produced output but never ran a test, or when it recorded
/// failures none of which belong to an individual test. Ordinary per-test
/// failures are already reported and do not qualify.
#[must_use]
pub fn is_displayable_package_failure(pkg: &PackageState) -> bool {
    let has_build_error = pkg.output.iter().any(|line| {
        let trimmed = line.trim();
        BUILD_ERROR_MARKERS
            .iter()
            .any(|marker| trimmed.contains(marker))
    });
    if has_build_error {
        return true;
    }

    if pkg.total == 0 && !pkg.output.is_empty() {
        return true;
    }

    pkg.individual_test_failed == 0 && pkg.failed > 0 && pkg.total > 0
}

// ============================================================================
// Output filtering
// ============================================================================

/// Whether an output line is blank or framework scaffolding
#[must_use]
pub fn is_noise_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || SCAFFOLDING_PREFIXES
            .iter()
            .any(|prefix| trimmed.starts_with(prefix))
}

/// Captured output worth showing, with indentation and line endings intact
pub fn relevant_output(lines: &[String]) -> impl Iterator<Item = &str> {
    lines
        .iter()
        .map(String::as_str)
        .filter(|line| !is_noise_line(line))
}
