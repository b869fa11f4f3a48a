/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Polling loop that forwards the active window to a renderer.
//!
//! [`PollingDriver::run`] asks the [`EventStore`] for the active window once
//! per poll interval and calls the consumer **only when the answer changes**,
//! compared by window identity.  The very first poll always notifies so the
//! consumer starts from a known state.
//!
//! The loop ends when its [`StopSignal`] is tripped.  The signal is an explicit
//! token handed to the driver, and the sleep between polls wakes up as soon as
//! it is tripped.
//!
//! Polling is coarse on purpose: window bounds have one-second granularity,
//! so a poll interval of a second or more is adequate.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, warn};

use lightstrip::{LedStrip, PixelSink};

use crate::store::EventStore;
use crate::timer::CallbackFailure;
use crate::window::TimeWindow;

/// Poll interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Shortest poll interval accepted; smaller values are raised to it.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Source of "now" for the driver.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync + 'static>;

/// Receives consumer failures isolated by the driver.
pub type FailureReporter = Arc<dyn Fn(&CallbackFailure) + Send + Sync + 'static>;

// ── StopSignal ────────────────────────────────────────────────────────────────

/// Clonable stop token.  Every clone observes the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the signal and wake every waiter.  Idempotent.
    pub fn stop(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for up to `timeout`, returning early if the signal trips.
    ///
    /// Returns `true` when the signal is tripped.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

// ── Renderer ──────────────────────────────────────────────────────────────────

/// Consumer of resolution changes, typically an LED strip.
pub trait Renderer {
    /// A window became active: show its pattern.
    fn display(&mut self, window: &TimeWindow) -> anyhow::Result<()>;

    /// No window is active any more.
    fn blank(&mut self) -> anyhow::Result<()>;
}

impl<S: PixelSink> Renderer for LedStrip<S> {
    fn display(&mut self, window: &TimeWindow) -> anyhow::Result<()> {
        self.send_pattern(window.pattern(), 0, true);
        Ok(())
    }

    fn blank(&mut self) -> anyhow::Result<()> {
        self.clear(true);
        Ok(())
    }
}

// ── PollingDriver ─────────────────────────────────────────────────────────────

pub struct PollingDriver {
    store: Arc<EventStore>,
    poll_interval: Duration,
    clock: Clock,
    reporter: FailureReporter,
}

impl PollingDriver {
    /// Driver over `store` polling every [`DEFAULT_POLL_INTERVAL`] against the
    /// local wall clock.
    pub fn new(store: Arc<EventStore>) -> Self {
        Self {
            store,
            poll_interval: DEFAULT_POLL_INTERVAL,
            clock: Arc::new(|| Local::now().naive_local()),
            reporter: Arc::new(|failure: &CallbackFailure| {
                warn!(error = %failure, "Active-window consumer failed");
            }),
        }
    }

    /// Set the sleep between polls, raised to at least [`MIN_POLL_INTERVAL`].
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Replace the wall clock, e.g. with a fixed or simulated time source.
    pub fn clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the failure reporter, which logs at `warn` level by default.
    pub fn on_failure<F>(mut self, reporter: F) -> Self
    where
        F: Fn(&CallbackFailure) + Send + Sync + 'static,
    {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Poll until `stop` trips, calling `on_change` with the new active
    /// window (or `None`) whenever it differs from the previous poll.
    ///
    /// Errors and panics from `on_change` are handed to the failure reporter
    /// and the loop continues.
    pub fn run<F>(&self, mut on_change: F, stop: &StopSignal)
    where
        F: FnMut(Option<&Arc<TimeWindow>>) -> anyhow::Result<()>,
    {
        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            windows = self.store.len(),
            "Polling driver started"
        );

        // Outer `None`: nothing reported yet.
        let mut last: Option<Option<Arc<TimeWindow>>> = None;

        while !stop.is_stopped() {
            let now = (self.clock)();
            let winner = self.store.active_entry(now);
            let current = winner.as_ref().map(|e| Arc::clone(&e.window));

            let changed = match &last {
                None => true,
                Some(prev) => !same_window(prev.as_ref(), current.as_ref()),
            };

            if changed {
                match &winner {
                    Some(e) => info!(
                        name = e.window.name(),
                        id = ?e.window.id(),
                        priority = e.priority,
                        pattern = %e.window.pattern(),
                        "Active event"
                    ),
                    None => info!("No active event"),
                }

                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| on_change(current.as_ref())));
                let failure = match outcome {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(CallbackFailure::Error(e)),
                    Err(payload) => Some(CallbackFailure::from_panic(payload)),
                };
                if let Some(failure) = failure {
                    (self.reporter)(&failure);
                }
                last = Some(current);
            } else {
                debug!(%now, "Active event unchanged");
            }

            if stop.wait_timeout(self.poll_interval) {
                break;
            }
        }

        info!("Polling driver stopped");
    }

    /// [`run`](Self::run) with a [`Renderer`] as the consumer.
    pub fn run_with_renderer<R: Renderer>(&self, renderer: &mut R, stop: &StopSignal) {
        self.run(
            |active| match active {
                Some(window) => renderer.display(window),
                None => renderer.blank(),
            },
            stop,
        );
    }
}

fn same_window(a: Option<&Arc<TimeWindow>>, b: Option<&Arc<TimeWindow>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
