// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Periodic progress rendering
//!
//! The ticker runs beside the stream consumer and renders a fresh snapshot on
//! every tick. It reads the store only through its snapshot accessors.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use testshow_events::EventProcessor;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::display::{self, Display};

/// Interval between progress renders
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// A running progress task and the token that stops it
#[derive(Debug)]
pub struct ProgressTicker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    /// Spawn the ticker on the current runtime
    pub fn spawn<P, D>(
        processor: Arc<P>,
        renderer: Arc<Mutex<D>>,
        interval: Duration,
        start: Instant,
    ) -> Self
    where
        P: EventProcessor + ?Sized + 'static,
        D: Display + ?Sized + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let packages = processor.snapshot_packages();
                        let has_started = processor.has_started();
                        let mut renderer = display::lock(&renderer);
                        if let Err(err) = renderer.show_progress(&packages, has_started, start) {
                            debug!(error = %err, "progress render failed");
                        }
                    }
                }
            }
            debug!("progress ticker stopped");
        });

        Self { cancel, handle }
    }

    /// Cancel the ticker and wait up to `grace` for its in-flight render.
    ///
    /// Returns whether the task finished within the grace period; a task
    /// that did not is aborted.
    pub async fn stop(self, grace: Duration) -> bool {
        self.cancel.cancel();
        let mut handle = self.handle;
        match time::timeout(grace, &mut handle).await {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                debug!(error = %err, "progress ticker ended abnormally");
                true
            }
            Err(_) => {
                debug!("progress ticker did not stop within grace period");
                handle.abort();
                false
            }
        }
    }
}
