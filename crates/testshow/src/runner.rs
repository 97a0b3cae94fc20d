// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Streaming coordinator
//!
//! Reads the event stream line by line, folds each event into the store,
//! renders what deserves an immediate render and, when the stream ends or
//! the run is interrupted, stops the progress ticker and prints the summary.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use testshow_events::{Event, EventProcessor, Notice, Verdict, decode_line};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::display::{self, Display};
use crate::error::RunError;
use crate::progress::{ProgressTicker, TICK_INTERVAL};

/// How long the runner waits for an in-flight progress render after
/// cancelling the ticker
pub const GRACE_PERIOD: Duration = Duration::from_millis(50);

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Constructed, not yet started
    #[default]
    Ready,
    /// Consuming the stream with the ticker active
    Running,
    /// The stream ended or was interrupted; the ticker is being stopped
    Cancelling,
    /// The ticker has stopped; final state can be read safely
    Drained,
    /// The final summary has been rendered
    Summarized,
}

/// What a completed run produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Verdict shown in the summary
    pub verdict: Verdict,
    /// Whether the run ended through an interrupt rather than end of input
    pub interrupted: bool,
    /// Lines that could not be decoded and were skipped
    pub skipped_lines: usize,
}

impl RunOutcome {
    /// Process exit status; interruption does not change it
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        self.verdict.exit_code()
    }
}

/// Why consumption of the stream stopped
#[derive(Debug)]
enum StreamEnd {
    Eof,
    Interrupted,
    BadInput(String),
}

/// Hides the cursor for the lifetime of the run and restores it exactly once,
/// including on early return with an error.
struct TerminalGuard<D: Display + ?Sized> {
    display: Arc<Mutex<D>>,
    active: bool,
}

impl<D: Display + ?Sized> TerminalGuard<D> {
    fn engage(display: Arc<Mutex<D>>) -> io::Result<Self> {
        display::lock(&display).prepare_terminal()?;
        Ok(Self {
            display,
            active: true,
        })
    }

    fn restore(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        display::lock(&self.display).restore_terminal()
    }
}

impl<D: Display + ?Sized> Drop for TerminalGuard<D> {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            debug!(error = %err, "failed to restore terminal");
        }
    }
}

/// Drives one formatting run over an event stream
pub struct Runner<P: ?Sized, D: ?Sized> {
    processor: Arc<P>,
    display: Arc<Mutex<D>>,
    interrupt: CancellationToken,
    tick_interval: Duration,
    phase: Phase,
}

impl<P, D> Runner<P, D>
where
    P: EventProcessor + ?Sized + 'static,
    D: Display + ?Sized + 'static,
{
    /// Create a runner over a store and a renderer
    pub fn new(processor: Arc<P>, display: Arc<Mutex<D>>) -> Self {
        Self {
            processor,
            display,
            interrupt: CancellationToken::new(),
            tick_interval: TICK_INTERVAL,
            phase: Phase::Ready,
        }
    }

    /// Use an externally owned interrupt token
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: CancellationToken) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Override the progress interval
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Token that interrupts the run when cancelled
    #[must_use]
    pub fn interrupt_token(&self) -> CancellationToken {
        self.interrupt.clone()
    }

    /// Current lifecycle phase
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn transition(&mut self, next: Phase) {
        debug!(from = ?self.phase, to = ?next, "run phase");
        self.phase = next;
    }

    /// Consume `input` to the end (or until interrupted) and render the
    /// summary.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::BadInput`] after printing usage guidance when the
    /// input is not an event stream, and [`RunError::Io`] when reading input
    /// or writing output fails. The cursor is restored on every path.
    pub async fn run<R>(&mut self, mut input: R) -> Result<RunOutcome, RunError>
    where
        R: AsyncBufRead + Unpin,
    {
        let start = Instant::now();
        info!("reading test events");

        let mut terminal = TerminalGuard::engage(Arc::clone(&self.display))?;
        let ticker = ProgressTicker::spawn(
            Arc::clone(&self.processor),
            Arc::clone(&self.display),
            self.tick_interval,
            start,
        );
        self.transition(Phase::Running);

        let mut skipped = 0;
        let end = self.consume(&mut input, &mut skipped).await;

        self.transition(Phase::Cancelling);
        ticker.stop(GRACE_PERIOD).await;
        self.transition(Phase::Drained);

        let outcome = self.finish(end, start, skipped);
        let restored = terminal.restore();
        let outcome = outcome?;
        restored?;

        self.transition(Phase::Summarized);
        Ok(outcome)
    }

    async fn consume<R>(&self, input: &mut R, skipped: &mut usize) -> Result<StreamEnd, RunError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut buf = Vec::new();
        let mut seen_content = false;

        loop {
            buf.clear();
            let read = tokio::select! {
                biased;
                () = self.interrupt.cancelled() => {
                    debug!("interrupt received");
                    return Ok(StreamEnd::Interrupted);
                }
                read = input.read_until(b'\n', &mut buf) => read?,
            };
            if read == 0 {
                return Ok(StreamEnd::Eof);
            }

            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);
            let is_first_content = !seen_content && !line.trim().is_empty();
            seen_content |= is_first_content;

            match decode_line(line) {
                Ok(Some(event)) => self.dispatch(&event)?,
                Ok(None) => {}
                Err(err) if is_first_content && err.is_not_structured() => {
                    return Ok(StreamEnd::BadInput(line.trim().to_string()));
                }
                Err(err) => {
                    *skipped += 1;
                    debug!(error = %err, "skipping malformed line");
                }
            }
        }
    }

    /// Fold one event and render its notice, if any
    fn dispatch(&self, event: &Event) -> Result<(), RunError> {
        let Some(notice) = self.processor.apply(event) else {
            return Ok(());
        };

        let mut display = display::lock(&self.display);
        match notice {
            Notice::TestFinished { result, success } => {
                display.show_test_result(&result, success)?;
            }
            Notice::PackageFailed { package, output } => {
                display.show_package_failure(&package, &output)?;
            }
            Notice::BuildFailed { result } => display.show_test_result(&result, false)?,
        }
        Ok(())
    }

    fn finish(
        &self,
        end: Result<StreamEnd, RunError>,
        start: Instant,
        skipped: usize,
    ) -> Result<RunOutcome, RunError> {
        if skipped > 0 {
            warn!(skipped, "skipped lines that were not valid test events");
        }

        let mut display = display::lock(&self.display);
        display.clear_line()?;

        let interrupted = match end? {
            StreamEnd::Eof => false,
            StreamEnd::Interrupted => {
                display.show_interrupted()?;
                true
            }
            StreamEnd::BadInput(line) => {
                display.show_bad_input()?;
                display.show_help()?;
                return Err(RunError::BadInput { line });
            }
        };

        let snapshot = self.processor.snapshot();
        let verdict = display.show_final_results(&snapshot.packages, &snapshot.results, start)?;
        info!(?verdict, interrupted, "run finished");

        Ok(RunOutcome {
            verdict,
            interrupted,
            skipped_lines: skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DisplayConfig, Mode};
    use crate::display::TerminalDisplay;
    use similar_asserts::assert_eq;
    use testshow_events::StateStore;

    type TestRunner = Runner<StateStore, TerminalDisplay<Vec<u8>>>;

    fn runner(mode: Mode) -> (TestRunner, Arc<Mutex<TerminalDisplay<Vec<u8>>>>) {
        let display = Arc::new(Mutex::new(TerminalDisplay::new(
            Vec::new(),
            DisplayConfig {
                mode,
                ..DisplayConfig::default()
            },
        )));
        let runner = Runner::new(Arc::new(StateStore::new()), Arc::clone(&display));
        (runner, display)
    }

    #[tokio::test]
    async fn test_phase_reaches_summarized() {
        let (mut runner, _) = runner(Mode::Plain);
        assert_eq!(runner.phase(), Phase::Ready);

        let input: &[u8] = b"{\"Action\":\"run\",\"Package\":\"p\",\"Test\":\"T\"}\n";
        let outcome = runner.run(input).await.expect("run succeeds");

        assert_eq!(runner.phase(), Phase::Summarized);
        assert!(!outcome.interrupted);
        assert_eq!(outcome.skipped_lines, 0);
    }

    #[tokio::test]
    async fn test_bad_input_stops_at_drained() {
        let (mut runner, _) = runner(Mode::Plain);
        let input: &[u8] = b"ok  \tgithub.com/acme/calc\t0.01s\n";

        let err = runner.run(input).await.expect_err("bad input");
        assert!(matches!(err, RunError::BadInput { ref line } if line.starts_with("ok")));
        assert_eq!(runner.phase(), Phase::Drained);
    }

    #[tokio::test]
    async fn test_bad_input_restores_cursor_once() {
        let (mut runner, display) = runner(Mode::Interactive);
        let input: &[u8] = b"PASS\n";

        runner.run(input).await.expect_err("bad input");
        let out = String::from_utf8(display::lock(&display).writer().clone()).expect("utf-8");
        assert_eq!(out.matches("\x1b[?25l").count(), 1);
        assert_eq!(out.matches("\x1b[?25h").count(), 1);
        assert!(out.ends_with("\x1b[?25h"));
    }

    #[tokio::test]
    async fn test_malformed_lines_are_counted_and_skipped() {
        let (mut runner, _) = runner(Mode::Plain);
        let input: &[u8] = b"\n\
            {\"Action\":\"run\",\"Package\":\"p\",\"Test\":\"T\"}\n\
            {\"Action\":\"pass\",\"Package\"\n\
            garbage after the first record\n\
            {\"Action\":\"pass\",\"Package\":\"p\",\"Test\":\"T\",\"Elapsed\":0.1}\n";

        let outcome = runner.run(input).await.expect("run succeeds");
        assert_eq!(outcome.skipped_lines, 2);
        assert_eq!(outcome.verdict, Verdict::Passed);
    }

    #[tokio::test]
    async fn test_interrupt_before_any_input() {
        let (mut runner, display) = runner(Mode::Interactive);
        runner.interrupt_token().cancel();

        let (_writer, reader) = tokio::io::duplex(64);
        let outcome = runner
            .run(tokio::io::BufReader::new(reader))
            .await
            .expect("run succeeds");

        assert!(outcome.interrupted);
        assert_eq!(outcome.exit_code(), 0);
        let out = String::from_utf8(display::lock(&display).writer().clone()).expect("utf-8");
        assert!(out.contains("Interrupted by user (Ctrl-C)"));
        assert!(out.contains("Total: 0 tests"));
        assert_eq!(out.matches("\x1b[?25h").count(), 1);
    }
}
