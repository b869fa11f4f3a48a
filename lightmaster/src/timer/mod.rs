/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Heap-based timer scheduler.
//!
//! [`TimerScheduler`] runs callbacks after a delay, at a wall-clock time, or on
//! a fixed interval, on one dedicated background thread.
//!
//! ```text
//!  caller threads                      timer thread
//!  ──────────────                      ────────────
//!  schedule_* ──┐                      loop {
//!  cancel ──────┤  Mutex<State>          wait until heap top is due
//!               ├─► heap (min by         pop under lock
//!               │   deadline, seq)       ── unlock ──
//!               │   live / canceled      run callback (errors → hook)
//!  Condvar ◄────┘                        relock, reinsert if recurring
//!                                      }
//! ```
//!
//! # Design decisions
//!
//! | Topic | Behaviour |
//! |---|---|
//! | Clock | Deadlines live on the monotonic `Instant` timeline |
//! | Wall-clock targets | Converted once at call time: `Instant::now() + (target − wall_now)`; later wall-clock steps do not move them |
//! | Past targets | A wall-clock time already passed fires as soon as possible |
//! | Zero interval | Rejected with [`TimerError::ZeroInterval`] |
//! | Cancellation | Lazy: the id is flagged and the entry is skipped when popped |
//! | Recurrence | Next deadline is `max(now, previous + interval)`; missed ticks are dropped |
//! | Callback failure | `Err` and panics are caught, reported to the error hook, never fatal |
//! | Shutdown | Work already due when shutdown is requested still fires; later entries are discarded and recurring tasks stop |
//!
//! # Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use lightmaster::timer::TimerScheduler;
//!
//! let timer = TimerScheduler::start().unwrap();
//! let hits = Arc::new(AtomicUsize::new(0));
//! let h = Arc::clone(&hits);
//! timer
//!     .schedule_after(Duration::from_millis(5), move || {
//!         h.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     })
//!     .unwrap();
//! std::thread::sleep(Duration::from_millis(100));
//! timer.shutdown();
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

pub mod error;
mod task;

pub use error::{CallbackFailure, TimerError};
pub use task::TaskId;

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, info, warn};

use task::{Callback, TimedTask};

/// Receives every callback failure isolated by the timer thread.
pub type ErrorHook = Arc<dyn Fn(TaskId, &CallbackFailure) + Send + Sync + 'static>;

const DEFAULT_THREAD_NAME: &str = "lightmaster-timer";

// ── Shared state ──────────────────────────────────────────────────────────────

#[derive(Debug)]
struct State {
    heap: BinaryHeap<Reverse<TimedTask>>,
    /// Ids that can still fire: queued, or recurring and currently running.
    live: HashSet<TaskId>,
    /// Ids flagged by `cancel` and not yet reaped.
    canceled: HashSet<TaskId>,
    next_id: u64,
    next_sequence: u64,
    running: bool,
}

impl State {
    fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            live: HashSet::new(),
            canceled: HashSet::new(),
            next_id: 1,
            next_sequence: 0,
            running: true,
        }
    }

    fn sequence(&mut self) -> u64 {
        let seq = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        seq
    }

    /// Drop all bookkeeping for an id that will never fire again.
    fn retire(&mut self, id: TaskId) {
        self.live.remove(&id);
        self.canceled.remove(&id);
    }
}

#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Configures and starts a [`TimerScheduler`].
pub struct TimerSchedulerBuilder {
    thread_name: String,
    error_hook: ErrorHook,
}

impl Default for TimerSchedulerBuilder {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            error_hook: Arc::new(log_failure),
        }
    }
}

impl TimerSchedulerBuilder {
    /// Name of the background thread (visible in debuggers and panics).
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Replace the default failure hook, which logs at `warn` level.
    pub fn error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(TaskId, &CallbackFailure) + Send + Sync + 'static,
    {
        self.error_hook = Arc::new(hook);
        self
    }

    /// Spawn the timer thread.
    ///
    /// # Errors
    /// [`TimerError::Spawn`] if the OS cannot create the thread.
    pub fn start(self) -> Result<TimerScheduler, TimerError> {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::new()),
            wake: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let hook = self.error_hook;
        let handle = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || run_worker(&worker_shared, &hook))?;

        info!(thread = %self.thread_name, "Timer scheduler started");

        Ok(TimerScheduler {
            shared,
            worker: Mutex::new(Some(handle)),
        })
    }
}

fn log_failure(id: TaskId, failure: &CallbackFailure) {
    warn!(task = %id, error = %failure, "Timer callback failed");
}

// ── TimerScheduler ────────────────────────────────────────────────────────────

/// Cancellable one-shot and recurring callback scheduler.
///
/// All methods take `&self`; share it across threads behind an `Arc`.
/// Dropping the scheduler shuts it down.
pub struct TimerScheduler {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for TimerScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("TimerScheduler")
            .field("queued", &state.heap.len())
            .field("live", &state.live.len())
            .field("running", &state.running)
            .finish()
    }
}

impl TimerScheduler {
    pub fn builder() -> TimerSchedulerBuilder {
        TimerSchedulerBuilder::default()
    }

    /// Start a scheduler with default settings.
    pub fn start() -> Result<Self, TimerError> {
        Self::builder().start()
    }

    /// Run `callback` once, `delay` from now.
    pub fn schedule_after<F>(&self, delay: Duration, callback: F) -> Result<TaskId, TimerError>
    where
        F: FnMut() -> anyhow::Result<()> + Send + 'static,
    {
        self.insert(Self::deadline_after(delay), None, Box::new(callback))
    }

    /// Run `callback` once at wall-clock time `at`.
    ///
    /// The target is mapped onto the monotonic timeline immediately; see the
    /// module docs for what that implies about wall-clock adjustments.
    pub fn schedule_at<Tz, F>(&self, at: DateTime<Tz>, callback: F) -> Result<TaskId, TimerError>
    where
        Tz: TimeZone,
        F: FnMut() -> anyhow::Result<()> + Send + 'static,
    {
        self.insert(Self::deadline_at(at), None, Box::new(callback))
    }

    /// Run `callback` every `interval`, first one interval from now.
    ///
    /// # Errors
    /// [`TimerError::ZeroInterval`] when `interval` is zero.
    pub fn schedule_every<F>(&self, interval: Duration, callback: F) -> Result<TaskId, TimerError>
    where
        F: FnMut() -> anyhow::Result<()> + Send + 'static,
    {
        if interval.is_zero() {
            return Err(TimerError::ZeroInterval);
        }
        self.insert(
            Self::deadline_after(interval),
            Some(interval),
            Box::new(callback),
        )
    }

    /// Run `callback` every `interval`, first at wall-clock time `first`.
    pub fn schedule_every_from<Tz, F>(
        &self,
        first: DateTime<Tz>,
        interval: Duration,
        callback: F,
    ) -> Result<TaskId, TimerError>
    where
        Tz: TimeZone,
        F: FnMut() -> anyhow::Result<()> + Send + 'static,
    {
        if interval.is_zero() {
            return Err(TimerError::ZeroInterval);
        }
        self.insert(Self::deadline_at(first), Some(interval), Box::new(callback))
    }

    /// Flag `id` so it never fires again.
    ///
    /// Returns `true` the first time a live id is canceled; `false` if it is
    /// unknown, already canceled, or a one-shot that has already been taken
    /// off the heap.  A callback that is already running is not interrupted.
    pub fn cancel(&self, id: TaskId) -> bool {
        let mut state = self.shared.lock();
        if !state.live.contains(&id) {
            return false;
        }
        let first = state.canceled.insert(id);
        if first {
            debug!(task = %id, "Timer task canceled");
        }
        first
    }

    /// Number of tasks that may still fire.
    pub fn pending(&self) -> usize {
        let state = self.shared.lock();
        state.live.len().saturating_sub(state.canceled.len())
    }

    /// Stop accepting work, fire whatever is already due, then join the
    /// timer thread.
    ///
    /// Idempotent.  When called from inside a callback the thread is left to
    /// finish on its own instead of being joined.
    pub fn shutdown(&self) {
        {
            let mut state = self.shared.lock();
            if state.running {
                state.running = false;
                let now = Instant::now();
                let before = state.heap.len();
                let mut dropped = Vec::new();
                state.heap.retain(|Reverse(t)| {
                    let keep = t.deadline <= now;
                    if !keep {
                        dropped.push(t.id);
                    }
                    keep
                });
                for id in dropped {
                    state.retire(id);
                }
                info!(
                    due = state.heap.len(),
                    discarded = before - state.heap.len(),
                    "Timer scheduler shutting down"
                );
            }
            self.shared.wake.notify_all();
        }

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                warn!("Timer thread terminated abnormally");
            }
        }
    }

    fn insert(
        &self,
        deadline: Instant,
        interval: Option<Duration>,
        callback: Callback,
    ) -> Result<TaskId, TimerError> {
        let mut state = self.shared.lock();
        if !state.running {
            return Err(TimerError::Stopped);
        }
        let id = TaskId(state.next_id);
        state.next_id += 1;
        let seq = state.sequence();

        let becomes_head = state
            .heap
            .peek()
            .map_or(true, |Reverse(head)| deadline < head.deadline);

        state
            .heap
            .push(Reverse(TimedTask::new(deadline, seq, id, interval, callback)));
        state.live.insert(id);

        debug!(task = %id, ?interval, recurring = interval.is_some(), "Timer task scheduled");

        if becomes_head {
            self.shared.wake.notify_one();
        }
        Ok(id)
    }

    fn deadline_after(delay: Duration) -> Instant {
        let now = Instant::now();
        now.checked_add(delay).unwrap_or(now + Duration::from_secs(86_400 * 365 * 100))
    }

    fn deadline_at<Tz: TimeZone>(at: DateTime<Tz>) -> Instant {
        let wall_now = Utc::now();
        let delay = at
            .signed_duration_since(wall_now)
            .to_std()
            .unwrap_or(Duration::ZERO);
        Self::deadline_after(delay)
    }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ── Worker thread ─────────────────────────────────────────────────────────────

fn run_worker(shared: &Shared, hook: &ErrorHook) {
    let mut state = shared.lock();
    loop {
        let Some(Reverse(head)) = state.heap.peek() else {
            if !state.running {
                break;
            }
            state = shared
                .wake
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            continue;
        };

        let deadline = head.deadline;
        let now = Instant::now();
        if deadline > now {
            let timeout = deadline - now;
            state = shared
                .wake
                .wait_timeout(state, timeout)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|e| e.into_inner().0);
            continue;
        }

        let Some(Reverse(mut task)) = state.heap.pop() else {
            continue;
        };

        if state.canceled.contains(&task.id) {
            state.retire(task.id);
            debug!(task = %task.id, "Skipping canceled timer task");
            continue;
        }
        if task.interval.is_none() {
            state.live.remove(&task.id);
        }

        drop(state);
        let outcome = task.fire();
        if let Err(failure) = outcome {
            if panic::catch_unwind(AssertUnwindSafe(|| hook(task.id, &failure))).is_err() {
                warn!(task = %task.id, "Timer error hook panicked");
            }
        }
        state = shared.lock();

        let id = task.id;
        if task.interval.is_some() {
            let keep = state.running && !state.canceled.contains(&id);
            if keep {
                let seq = state.sequence();
                if let Some(next) = task.into_next(Instant::now(), seq) {
                    state.heap.push(Reverse(next));
                }
            } else {
                state.retire(id);
            }
        }
    }
    debug!("Timer thread exiting");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
