// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! CLI tests for mode, threshold, color and logging flags
//!
//! These tests parse argument vectors and check the resolved configuration,
//! including flag interactions and rejected forms.

use std::time::Duration;

use clap::Parser;
use clap::error::ErrorKind;
use testshow::config::{ColorChoice, Config, Mode};
use tracing::Level;

fn parse(args: &[&str]) -> Config {
    let argv = std::iter::once("testshow").chain(args.iter().copied());
    Config::try_parse_from(argv).expect("parse should succeed")
}

// ============================================================================
// Mode flags
// ============================================================================

#[test]
fn test_no_flags_selects_interactive() {
    let config = parse(&[]);
    assert_eq!(config.mode(), Mode::Interactive);
    assert_eq!(config.threshold, Duration::from_millis(500));
}

#[test]
fn test_timing_flag_selects_slow_mode() {
    assert_eq!(parse(&["--timing"]).mode(), Mode::Slow);
}

#[test]
fn test_ci_flag_selects_plain_mode() {
    let config = parse(&["--ci"]);
    assert_eq!(config.mode(), Mode::Plain);
    assert!(!config.display_config(true).colorize);
}

#[test]
fn test_ci_and_timing_conflict() {
    let err = Config::try_parse_from(["testshow", "--ci", "--timing"])
        .expect_err("--ci and --timing are mutually exclusive");
    assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
}

#[test]
fn test_mode_flag_value_syntax_not_supported() {
    // Boolean flags are toggled by presence only
    let result = Config::try_parse_from(["testshow", "--timing=true"]);
    assert!(result.is_err(), "Boolean flags don't support =value syntax");
}

// ============================================================================
// --threshold
// ============================================================================

#[test]
fn test_threshold_accepts_humantime() {
    assert_eq!(parse(&["--threshold", "2s"]).threshold, Duration::from_secs(2));
    assert_eq!(
        parse(&["--threshold", "250ms"]).threshold,
        Duration::from_millis(250)
    );
}

#[test]
fn test_threshold_accepts_decimal_seconds() {
    assert_eq!(
        parse(&["--threshold=1.5s"]).threshold,
        Duration::from_millis(1500)
    );
}

#[test]
fn test_threshold_zero_is_accepted() {
    assert_eq!(parse(&["--threshold", "0s"]).threshold, Duration::ZERO);
}

#[test]
fn test_threshold_rejects_garbage() {
    let err = Config::try_parse_from(["testshow", "--threshold", "quick"])
        .expect_err("unparseable threshold");
    assert_eq!(err.kind(), ErrorKind::ValueValidation);
    assert!(err.to_string().contains("Invalid threshold 'quick'"));
}

#[test]
fn test_threshold_requires_unit() {
    let result = Config::try_parse_from(["testshow", "--threshold", "500"]);
    assert!(result.is_err(), "a bare number is ambiguous");
}

// ============================================================================
// --color
// ============================================================================

#[test]
fn test_color_choices() {
    assert_eq!(parse(&[]).color, ColorChoice::Auto);
    assert_eq!(parse(&["--color", "always"]).color, ColorChoice::Always);
    assert_eq!(parse(&["--color", "never"]).color, ColorChoice::Never);
}

#[test]
fn test_color_never_overrides_terminal() {
    let config = parse(&["--color", "never"]);
    assert!(!config.display_config(true).colorize);
}

#[test]
fn test_color_always_without_terminal() {
    let config = parse(&["--color", "always"]);
    assert!(config.display_config(false).colorize);
}

#[test]
fn test_color_rejects_unknown_value() {
    let err = Config::try_parse_from(["testshow", "--color", "sometimes"])
        .expect_err("unknown color choice");
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
}

// ============================================================================
// --verbose / --quiet
// ============================================================================

#[test]
fn test_verbose_short_flag_v() {
    let config = parse(&["-v"]);
    assert!(config.verbose);
    assert_eq!(config.log_level(), Level::DEBUG);
}

#[test]
fn test_quiet_short_flag_q() {
    let config = parse(&["-q"]);
    assert!(config.quiet);
    assert_eq!(config.log_level(), Level::ERROR);
}

#[test]
fn test_verbose_wins_over_quiet() {
    assert_eq!(parse(&["-v", "-q"]).log_level(), Level::DEBUG);
}

#[test]
fn test_default_log_level_is_warn() {
    assert_eq!(parse(&[]).log_level(), Level::WARN);
}

#[test]
fn test_flags_combine_with_threshold() {
    let config = parse(&["--timing", "--threshold", "1s", "-v"]);
    assert_eq!(config.mode(), Mode::Slow);
    assert_eq!(config.threshold, Duration::from_secs(1));
    assert!(config.verbose);
}
