/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Heap entries for the timer scheduler.

use std::cmp::Ordering;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use super::error::CallbackFailure;

/// Boxed user callback.  `FnMut` so recurring tasks can keep state between
/// firings.
pub type Callback = Box<dyn FnMut() -> anyhow::Result<()> + Send + 'static>;

/// Handle returned by every scheduling call; pass it to
/// [`TimerScheduler::cancel`](super::TimerScheduler::cancel).
///
/// A recurring task keeps the same id across all of its firings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One pending firing.
///
/// Ordered by `(deadline, sequence)`.  `sequence` is unique and increases on
/// every insertion, so two tasks due at the same instant fire in the order
/// they were (re)inserted.
pub(crate) struct TimedTask {
    pub(crate) deadline: Instant,
    pub(crate) sequence: u64,
    pub(crate) id: TaskId,
    pub(crate) interval: Option<Duration>,
    callback: Callback,
}

impl TimedTask {
    pub(crate) fn new(
        deadline: Instant,
        sequence: u64,
        id: TaskId,
        interval: Option<Duration>,
        callback: Callback,
    ) -> Self {
        Self {
            deadline,
            sequence,
            id,
            interval,
            callback,
        }
    }

    /// Run the callback, turning both `Err` and panics into a
    /// [`CallbackFailure`].
    pub(crate) fn fire(&mut self) -> Result<(), CallbackFailure> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.callback)())) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(CallbackFailure::Error(e)),
            Err(payload) => Err(CallbackFailure::from_panic(payload)),
        }
    }

    /// Move this task to its next firing: `max(now, deadline + interval)`.
    ///
    /// Ticks missed while a callback overran are dropped rather than replayed
    /// back to back.  Returns `None` for one-shot tasks.
    pub(crate) fn into_next(mut self, now: Instant, sequence: u64) -> Option<Self> {
        let interval = self.interval?;
        let next = self
            .deadline
            .checked_add(interval)
            .map_or(now, |d| d.max(now));
        self.deadline = next;
        self.sequence = sequence;
        Some(self)
    }
}

impl fmt::Debug for TimedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedTask")
            .field("deadline", &self.deadline)
            .field("sequence", &self.sequence)
            .field("id", &self.id)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl PartialEq for TimedTask {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimedTask {}

impl PartialOrd for TimedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
