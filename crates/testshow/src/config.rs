//! Configuration for the testshow formatter
//!
//! This module provides the command-line surface and resolves it into the
//! [`DisplayConfig`] that the renderer and the runner consume.

use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Default slow-test threshold
pub const DEFAULT_THRESHOLD: Duration = Duration::from_millis(500);

/// testshow - A real-time formatter for `go test -json` output
#[derive(Parser, Debug, Clone)]
#[command(name = "testshow")]
#[command(version, about, long_about = None)]
#[command(after_help = "Example:\n  go test -json ./... | testshow --timing --threshold 1s")]
pub struct Config {
    /// Show only slow tests and failures, then list slow tests per package
    #[arg(long, default_value = "false")]
    pub timing: bool,

    /// Elapsed time above which a test counts as slow
    ///
    /// Accepts forms such as `500ms`, `1s`, `1.5s` or `1m30s`. A threshold
    /// of zero disables slow-test detection.
    #[arg(
        long,
        env = "TESTSHOW_THRESHOLD",
        default_value = "500ms",
        value_parser = parse_threshold
    )]
    pub threshold: Duration,

    /// Log-safe output: no escape sequences, no colors, failures and summary only
    #[arg(long, default_value = "false", conflicts_with = "timing")]
    pub ci: bool,

    /// When to color the output
    #[arg(long, value_enum, env = "TESTSHOW_COLOR", default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Enable verbose logging (debug level)
    ///
    /// Logs are written to stderr so they never interleave with the
    /// formatted report on stdout.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - only errors are logged
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timing: false,
            threshold: DEFAULT_THRESHOLD,
            ci: false,
            color: ColorChoice::Auto,
            verbose: false,
            quiet: false,
        }
    }
}

/// Presentation mode, fixed for the whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Live progress line with failures printed as they happen
    #[default]
    Interactive,
    /// Slow tests and failures only, followed by a slow-test listing
    Slow,
    /// No escape sequences or decoration, suitable for CI logs
    Plain,
}

/// Color selection on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Color when stdout is a terminal
    #[default]
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}

impl ColorChoice {
    /// Resolve against whether the output is a terminal
    #[must_use]
    pub fn should_colorize(self, is_terminal: bool) -> bool {
        match self {
            Self::Auto => is_terminal,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// What the renderer needs to know about the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Presentation mode
    pub mode: Mode,
    /// Slow-test threshold; zero disables slow detection
    pub threshold: Duration,
    /// Whether to emit color codes
    pub colorize: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Interactive,
            threshold: DEFAULT_THRESHOLD,
            colorize: false,
        }
    }
}

impl Config {
    /// The presentation mode selected by the flags
    #[must_use]
    pub fn mode(&self) -> Mode {
        if self.ci {
            Mode::Plain
        } else if self.timing {
            Mode::Slow
        } else {
            Mode::Interactive
        }
    }

    /// Resolve the display configuration.
    ///
    /// Plain mode never colors, whatever `--color` says.
    #[must_use]
    pub fn display_config(&self, stdout_is_terminal: bool) -> DisplayConfig {
        let mode = self.mode();
        DisplayConfig {
            mode,
            threshold: self.threshold,
            colorize: mode != Mode::Plain && self.color.should_colorize(stdout_is_terminal),
        }
    }

    /// Get the log level based on verbose/quiet flags
    ///
    /// Defaults to WARN so that routine logs stay out of the live display.
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::ERROR
        } else {
            tracing::Level::WARN
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Threshold could not be parsed as a duration
    #[error("Invalid threshold '{value}': {reason}")]
    InvalidThreshold {
        /// The rejected input
        value: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Units accepted by the decimal fallback, longest suffix first
const DECIMAL_UNITS: [(&str, f64); 7] = [
    ("ns", 1e-9),
    ("us", 1e-6),
    ("µs", 1e-6),
    ("ms", 1e-3),
    ("s", 1.0),
    ("m", 60.0),
    ("h", 3600.0),
];

/// Parse a slow-test threshold.
///
/// Tries humantime first (`500ms`, `1m30s`, `2h 5m`), then a single decimal
/// quantity with a unit (`1.5s`, `0.25ms`).
///
/// # Errors
///
/// Returns [`ConfigError::InvalidThreshold`] when neither form matches.
pub fn parse_threshold(value: &str) -> Result<Duration, ConfigError> {
    let trimmed = value.trim();
    let invalid = |reason: String| ConfigError::InvalidThreshold {
        value: value.to_string(),
        reason,
    };

    match humantime::parse_duration(trimmed) {
        Ok(duration) => Ok(duration),
        Err(err) => parse_decimal(trimmed).ok_or_else(|| invalid(err.to_string())),
    }
}

fn parse_decimal(value: &str) -> Option<Duration> {
    let (number, scale) = DECIMAL_UNITS.iter().find_map(|(unit, scale)| {
        value
            .strip_suffix(unit)
            .filter(|number| !number.ends_with(|c: char| c.is_ascii_alphabetic()))
            .map(|number| (number, *scale))
    })?;

    let quantity: f64 = number.trim().parse().ok()?;
    if !quantity.is_finite() || quantity < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(quantity * scale).ok()
}
