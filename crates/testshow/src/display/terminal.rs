// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Terminal renderer for the three presentation modes

use std::io::{self, Write};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use owo_colors::{OwoColorize, Style};
use testshow_events::rules;
use testshow_events::summary::{self, PackageStatus, SummaryStats};
use testshow_events::{PackageState, PackagesSnapshot, ResultsSnapshot, TestResult, Verdict};

use super::Display;
use crate::config::{DisplayConfig, Mode};

/// Spinner frames, one per 100 ms
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPINNER_INTERVAL_MS: u128 = 100;

/// Trailing dots shown while waiting for the first test, one per 500 ms
pub const DOTS_FRAMES: [&str; 4] = ["   ", ".  ", ".. ", "..."];
const DOTS_INTERVAL_MS: u128 = 500;

const CLEAR_LINE: &str = "\r\x1b[K";
const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";
const OUTPUT_INDENT: &str = "        ";
const RULE_WIDTH: usize = 50;

const HELP_TEXT: [&str; 27] = [
    "testshow - A real-time formatter for `go test -json` output",
    "",
    "Usage:",
    "  go test -json ./... | testshow [flags]",
    "",
    "Flags:",
    "  --timing            Show only slow tests and failures",
    "  --threshold <DUR>   Threshold for slow tests (default: 500ms)",
    "                      Examples: 1s, 500ms, 1.5s",
    "  --ci                No escape sequences, only failures and summary",
    "  --color <WHEN>      auto, always or never",
    "  -h, --help          Show this help message",
    "",
    "Description:",
    "  testshow reads JSON-formatted test output from stdin and displays",
    "  it in a human-readable format with real-time progress updates.",
    "  Real-time progress display shows only failed test details.",
    "",
    "Examples:",
    "  # Test all packages",
    "  go test -json ./... | testshow",
    "",
    "  # Run specific test",
    "  go test -json -run TestName ./... | testshow",
    "",
    "  # Enable timing mode with custom threshold",
    "  go test -json ./... | testshow --timing --threshold 1s",
];

/// Pick the animation frame for a wall-clock time in milliseconds
#[must_use]
pub fn frame_at(frames: &[&'static str], interval_ms: u128, now_ms: u128) -> &'static str {
    if frames.is_empty() || interval_ms == 0 {
        return "";
    }
    let index = (now_ms / interval_ms) % frames.len() as u128;
    frames[index as usize]
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Format a test duration: whole milliseconds under a second, otherwise
/// seconds with three decimals. The unit is picked after rounding.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    let millis = (seconds * 1000.0).round();
    if millis < 1000.0 {
        format!("{millis:.0}ms")
    } else {
        format!("{seconds:.3}s")
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct Styles {
    pub(crate) is_colorized: bool,
    pub(crate) pass: Style,
    pub(crate) fail: Style,
    pub(crate) skip: Style,
    pub(crate) progress: Style,
    pub(crate) location: Style,
    pub(crate) dim: Style,
}

impl Styles {
    pub(crate) fn colorize(&mut self) {
        self.is_colorized = true;
        self.pass = Style::new().green();
        self.fail = Style::new().red();
        self.skip = Style::new().yellow();
        self.progress = Style::new().blue();
        self.location = Style::new().blue();
        self.dim = Style::new().bright_black();
    }
}

/// Renders progress, failures and summaries to a terminal or log.
///
/// Owns the bookkeeping for in-place line overwrites; nothing else touches
/// it.
#[derive(Debug)]
pub struct TerminalDisplay<W> {
    writer: W,
    config: DisplayConfig,
    styles: Styles,
    last_display_length: usize,
    show_package_names: bool,
}

impl<W: Write> TerminalDisplay<W> {
    /// Create a renderer writing to `writer`
    pub fn new(writer: W, config: DisplayConfig) -> Self {
        let mut display = Self {
            writer,
            config,
            styles: Styles::default(),
            last_display_length: 0,
            show_package_names: false,
        };
        display.apply_config(config);
        display
    }

    /// The underlying writer
    pub fn writer(&self) -> &W {
        &self.writer
    }

    fn apply_config(&mut self, config: DisplayConfig) {
        self.config = config;
        self.styles = Styles::default();
        if config.colorize && config.mode != Mode::Plain {
            self.styles.colorize();
        }
    }

    fn is_plain(&self) -> bool {
        self.config.mode == Mode::Plain
    }

    /// Overwrite the progress line in place, erasing leftovers only when the
    /// new content is shorter than what is on screen.
    fn smart_display_line(&mut self, content: &str) -> io::Result<()> {
        let length = content.len();
        if length < self.last_display_length {
            write!(self.writer, "{CLEAR_LINE}{content}")?;
        } else {
            write!(self.writer, "\r{content}")?;
        }
        self.last_display_length = length;
        self.writer.flush()
    }

    fn package_suffix(&self, package: &str) -> String {
        if !self.show_package_names {
            return String::new();
        }
        match self.config.mode {
            Mode::Slow => format!(" {}", package.style(self.styles.dim)),
            Mode::Interactive | Mode::Plain => format!(" in {package}"),
        }
    }

    fn location_tag(&self, result: &TestResult) -> String {
        match &result.location {
            Some(location) => format!(" {}", format!("[{location}]").style(self.styles.location)),
            None => String::new(),
        }
    }

    fn print_build_failure(&mut self, result: &TestResult) -> io::Result<()> {
        let location = self.location_tag(result);
        if self.is_plain() {
            writeln!(self.writer, "BUILD FAIL {}{location}", result.package)
        } else {
            writeln!(
                self.writer,
                "{} {}{location}",
                "✗ BUILD FAIL".style(self.styles.fail),
                result.package
            )
        }
    }

    fn print_failure(&mut self, result: &TestResult) -> io::Result<()> {
        if result.is_build_sentinel() {
            return self.print_build_failure(result);
        }

        let location = self.location_tag(result);
        let elapsed = format!("({:.2}s)", result.elapsed);
        let suffix = self.package_suffix(&result.package);
        if self.is_plain() {
            writeln!(self.writer, "FAIL {}{location} {elapsed}{suffix}", result.test)
        } else {
            writeln!(
                self.writer,
                "{} {}{location} {}{suffix}",
                "✗ FAIL".style(self.styles.fail),
                result.test,
                elapsed.style(self.styles.dim)
            )
        }
    }

    fn print_timed_result(&mut self, result: &TestResult, slow: bool) -> io::Result<()> {
        let (icon, style) = if result.failed {
            ("✗", self.styles.fail)
        } else if result.skipped {
            ("⚡", self.styles.skip)
        } else if result.passed {
            ("✓", self.styles.pass)
        } else {
            ("?", self.styles.dim)
        };
        let location = self.location_tag(result);
        let elapsed = format!("({})", format_duration(result.elapsed));
        let marker = if slow {
            format!(" {}", "[SLOW]".style(self.styles.fail))
        } else {
            String::new()
        };
        let suffix = self.package_suffix(&result.package);
        writeln!(
            self.writer,
            "{} {}{location} {}{marker}{suffix}",
            icon.style(style),
            result.test,
            elapsed.style(self.styles.dim)
        )
    }

    /// Captured output, blank lines and scaffolding dropped, indentation kept
    fn print_output(&mut self, output: &[String]) -> io::Result<()> {
        let lines: Vec<&str> = rules::relevant_output(output).collect();
        if lines.is_empty() {
            return Ok(());
        }

        writeln!(self.writer)?;
        for line in lines {
            let line = line.trim_end_matches(['\r', '\n']);
            writeln!(self.writer, "{OUTPUT_INDENT}{}", line.style(self.styles.fail))?;
        }
        writeln!(self.writer)
    }

    fn print_rule(&mut self, ch: char) -> io::Result<()> {
        writeln!(self.writer, "{}", ch.to_string().repeat(RULE_WIDTH))
    }

    fn print_slow_tests_summary(&mut self, results: &ResultsSnapshot) -> io::Result<()> {
        let slow = summary::slow_tests(results, self.config.threshold);
        if slow.is_empty() {
            return Ok(());
        }

        writeln!(self.writer)?;
        self.print_rule('=')?;
        let heading = format!(
            "Slow Tests (>{})",
            format_duration(self.config.threshold.as_secs_f64())
        );
        if self.is_plain() {
            writeln!(self.writer, "{heading}")?;
        } else {
            writeln!(self.writer, "🐢 {heading}")?;
        }
        self.print_rule('=')?;

        for (package, tests) in &slow {
            writeln!(self.writer, "\n=== {} ===", package.style(self.styles.location))?;
            for test in tests {
                let location = self.location_tag(test);
                let elapsed = format!("({})", format_duration(test.elapsed));
                writeln!(
                    self.writer,
                    "  {}{location} {}",
                    test.test,
                    elapsed.style(self.styles.fail)
                )?;
            }
        }
        Ok(())
    }

    fn print_package_summary(
        &mut self,
        name: &str,
        pkg: &PackageState,
        results: &ResultsSnapshot,
    ) -> io::Result<()> {
        let Some(status) = summary::package_status(pkg, results) else {
            return Ok(());
        };

        let label = match (status, self.is_plain()) {
            (PackageStatus::Fail, true) => "FAIL",
            (PackageStatus::Fail, false) => "✗ FAIL",
            (PackageStatus::PackageFail, true) => "PACKAGE FAIL",
            (PackageStatus::PackageFail, false) => "✗ PACKAGE FAIL",
        };
        let elapsed = format!("({:.2}s)", pkg.elapsed);
        writeln!(
            self.writer,
            "\n{} {name} {}",
            label.style(self.styles.fail),
            elapsed.style(self.styles.dim)
        )?;
        writeln!(
            self.writer,
            "  Tests: {} | Passed: {} | Failed: {} | Skipped: {}",
            pkg.total, pkg.passed, pkg.failed, pkg.skipped
        )?;

        let failed: Vec<&TestResult> = summary::failed_tests(name, results).collect();
        if failed.is_empty() {
            return Ok(());
        }

        writeln!(self.writer)?;
        for result in failed {
            let location = self.location_tag(result);
            match (result.is_build_sentinel(), self.is_plain()) {
                (true, true) => writeln!(self.writer, "    BUILD FAIL{location}")?,
                (true, false) => writeln!(
                    self.writer,
                    "    {}{location}",
                    "✗ BUILD FAIL".style(self.styles.fail)
                )?,
                (false, true) => writeln!(
                    self.writer,
                    "    FAIL {}{location} ({:.2}s)",
                    result.test, result.elapsed
                )?,
                (false, false) => writeln!(
                    self.writer,
                    "    {}{location} {}",
                    format!("✗ {}", result.test).style(self.styles.fail),
                    format!("({:.2}s)", result.elapsed).style(self.styles.dim)
                )?,
            }
        }
        Ok(())
    }

    fn print_totals(&mut self, stats: &SummaryStats, start: Instant) -> io::Result<()> {
        let seconds = start.elapsed().as_secs_f64();
        if self.is_plain() {
            writeln!(
                self.writer,
                "\nTotal: {} tests | Passed: {} | Failed: {} | Skipped: {} | Time: {seconds:.2}s",
                stats.total, stats.passed, stats.failed, stats.skipped
            )
        } else {
            writeln!(
                self.writer,
                "\nTotal: {} tests | {} | {} | {} | {}",
                stats.total,
                format!("✓ Passed: {}", stats.passed).style(self.styles.pass),
                format!("✗ Failed: {}", stats.failed).style(self.styles.fail),
                format!("⚡ Skipped: {}", stats.skipped).style(self.styles.skip),
                format!("⏱ {seconds:.2}s").style(self.styles.dim)
            )
        }
    }

    fn print_banner(&mut self, verdict: Verdict) -> io::Result<()> {
        match (verdict, self.is_plain()) {
            (Verdict::Failed, true) => writeln!(self.writer, "\nTests failed!"),
            (Verdict::Passed, true) => writeln!(self.writer, "\nAll tests passed!"),
            (Verdict::Failed, false) => {
                writeln!(self.writer, "\n{}", "❌ Tests failed!".style(self.styles.fail))
            }
            (Verdict::Passed, false) => {
                writeln!(self.writer, "\n{}", "✨ All tests passed!".style(self.styles.pass))
            }
        }
    }
}

impl<W: Write + Send> Display for TerminalDisplay<W> {
    fn set_config(&mut self, config: DisplayConfig) {
        self.apply_config(config);
    }

    fn show_progress(
        &mut self,
        packages: &PackagesSnapshot,
        has_started: bool,
        start: Instant,
    ) -> io::Result<()> {
        self.show_package_names = summary::packages_with_tests(packages) > 1;

        if self.config.mode != Mode::Interactive {
            return Ok(());
        }

        let now = now_ms();
        let spinner = frame_at(&SPINNER_FRAMES, SPINNER_INTERVAL_MS, now);

        if !has_started {
            let dots = frame_at(&DOTS_FRAMES, DOTS_INTERVAL_MS, now);
            let content = format!("{spinner} Initializing{dots}")
                .style(self.styles.progress)
                .to_string();
            return self.smart_display_line(&content);
        }

        let running: usize = packages.values().map(|pkg| pkg.running).sum();
        let passed: usize = packages.values().map(|pkg| pkg.passed).sum();
        let failed: usize = packages.values().map(|pkg| pkg.failed).sum();
        let skipped: usize = packages.values().map(|pkg| pkg.skipped).sum();
        let seconds = start.elapsed().as_secs_f64();

        let content = format!(
            "{} | {} | {} | {} | {}",
            format!("{spinner} Running: {running}").style(self.styles.progress),
            format!("✓ Passed: {passed}").style(self.styles.pass),
            format!("✗ Failed: {failed}").style(self.styles.fail),
            format!("⚡ Skipped: {skipped}").style(self.styles.skip),
            format!("⏱ {seconds:.1}s").style(self.styles.dim)
        );
        self.smart_display_line(&content)
    }

    fn show_test_result(&mut self, result: &TestResult, success: bool) -> io::Result<()> {
        if result.has_subtest {
            return Ok(());
        }

        match self.config.mode {
            Mode::Plain => {
                if success {
                    return Ok(());
                }
                self.print_failure(result)?;
                self.print_output(&result.output)?;
            }
            Mode::Slow => {
                if result.is_build_sentinel() {
                    self.print_failure(result)?;
                    self.print_output(&result.output)?;
                    return self.writer.flush();
                }
                let slow = summary::is_slow(result.elapsed, self.config.threshold);
                if !slow && !result.failed {
                    return Ok(());
                }
                self.print_timed_result(result, slow)?;
                if result.failed {
                    self.print_output(&result.output)?;
                }
            }
            Mode::Interactive => {
                if success {
                    return Ok(());
                }
                self.clear_line()?;
                self.print_failure(result)?;
                self.print_output(&result.output)?;
            }
        }
        self.writer.flush()
    }

    fn show_package_failure(&mut self, package: &str, output: &[String]) -> io::Result<()> {
        if self.is_plain() {
            writeln!(self.writer, "PACKAGE FAIL {package}")?;
        } else {
            self.clear_line()?;
            writeln!(
                self.writer,
                "{} {package}",
                "✗ PACKAGE FAIL".style(self.styles.fail)
            )?;
        }
        self.print_output(output)?;
        self.writer.flush()
    }

    fn show_final_results(
        &mut self,
        packages: &PackagesSnapshot,
        results: &ResultsSnapshot,
        start: Instant,
    ) -> io::Result<Verdict> {
        let stats = SummaryStats::collect(packages, results);

        if self.config.mode == Mode::Slow {
            self.print_slow_tests_summary(results)?;
        }

        if stats.has_failures {
            writeln!(self.writer)?;
            self.print_rule('=')?;
            if self.is_plain() {
                writeln!(self.writer, "Failed Tests Summary")?;
            } else {
                writeln!(self.writer, "📊 Failed Tests Summary")?;
            }
            self.print_rule('=')?;

            for (name, pkg) in packages {
                self.print_package_summary(name, pkg, results)?;
            }

            writeln!(self.writer)?;
            self.print_rule('-')?;
        }

        self.print_totals(&stats, start)?;
        let verdict = stats.verdict();
        self.print_banner(verdict)?;
        self.writer.flush()?;
        Ok(verdict)
    }

    fn show_help(&mut self) -> io::Result<()> {
        for line in HELP_TEXT {
            writeln!(self.writer, "{line}")?;
        }
        self.writer.flush()
    }

    fn clear_line(&mut self) -> io::Result<()> {
        if self.config.mode != Mode::Interactive {
            return Ok(());
        }
        write!(self.writer, "{CLEAR_LINE}")?;
        self.last_display_length = 0;
        Ok(())
    }

    fn show_bad_input(&mut self) -> io::Result<()> {
        writeln!(self.writer, "\nError: Input is not in JSON format.")?;
        writeln!(self.writer, "testshow expects JSON output from 'go test -json'.")?;
        writeln!(self.writer)
    }

    fn show_interrupted(&mut self) -> io::Result<()> {
        writeln!(
            self.writer,
            "\n{}",
            "Interrupted by user (Ctrl-C)".style(self.styles.skip)
        )
    }

    fn prepare_terminal(&mut self) -> io::Result<()> {
        if self.is_plain() {
            return Ok(());
        }
        write!(self.writer, "{HIDE_CURSOR}")?;
        self.writer.flush()
    }

    fn restore_terminal(&mut self) -> io::Result<()> {
        if self.is_plain() {
            return Ok(());
        }
        write!(self.writer, "{SHOW_CURSOR}")?;
        self.writer.flush()
    }
}
