//! testshow: real-time formatter for `go test -json` output
//!
//! Reads the event stream from stdin and renders live progress, failures and
//! a final summary to stdout. Logs go to stderr.

use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use testshow::config::Config;
use testshow::display::{Display, TerminalDisplay};
use testshow::error::RunError;
use testshow::runner::Runner;
use testshow_events::StateStore;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

fn main() -> ExitCode {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("testshow-worker")
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("failed to start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };
    let result = runtime.block_on(run(config));

    // A stdin read blocked on an open pipe cannot be cancelled; after an
    // interrupt the runtime must not wait for it.
    runtime.shutdown_background();

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> anyhow::Result<u8> {
    let display_config = config.display_config(io::stdout().is_terminal());
    let mut display = TerminalDisplay::new(io::stdout(), display_config);

    // Nothing piped in: there is no stream to format.
    if io::stdin().is_terminal() {
        display.show_help().context("failed to write help")?;
        return Ok(0);
    }
    let display = Arc::new(Mutex::new(display));

    info!(mode = ?display_config.mode, threshold = ?display_config.threshold, "starting");

    let interrupt = CancellationToken::new();
    spawn_interrupt_listener(interrupt.clone());

    let mut runner = Runner::new(Arc::new(StateStore::new()), display).with_interrupt(interrupt);
    match runner.run(BufReader::new(tokio::io::stdin())).await {
        Ok(outcome) => Ok(outcome.exit_code()),
        Err(err @ RunError::BadInput { .. }) => {
            debug!(error = %err, "input rejected");
            Ok(err.exit_code())
        }
        Err(err) => Err(err).context("failed to format test output"),
    }
}

/// Cancel `token` on Ctrl-C (and SIGTERM on unix)
fn spawn_interrupt_listener(token: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(err) => {
                    debug!(error = %err, "SIGTERM handler unavailable");
                    if tokio::signal::ctrl_c().await.is_ok() {
                        token.cancel();
                    }
                    return;
                }
            };
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if result.is_err() {
                        return;
                    }
                    info!("SIGINT received");
                }
                _ = sigterm.recv() => info!("SIGTERM received"),
            }
        }
        #[cfg(not(unix))]
        {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            info!("Ctrl-C received");
        }
        token.cancel();
    });
}
