/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Thread-safe, insertion-ordered collection of prioritised windows.
//!
//! # Concurrency
//! One `Mutex` guards the entry list.  It is held only for the list operation
//! itself; every query returns an owned copy, so callers never consume results
//! under the lock and no user code ever runs while it is held.
//!
//! # Identity
//! Windows are stored as `Arc<TimeWindow>`.  [`EventStore::remove`] matches by
//! pointer identity (`Arc::ptr_eq`), not by content, so two windows with equal
//! fields are still distinct entries.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDateTime;
use tracing::debug;

use crate::resolver::resolve_entry;
use crate::window::TimeWindow;

// ── StoreEntry ────────────────────────────────────────────────────────────────

/// One `(priority, window)` pair as held by the store.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    pub priority: i64,
    pub window: Arc<TimeWindow>,
}

impl StoreEntry {
    pub fn new(priority: i64, window: Arc<TimeWindow>) -> Self {
        Self { priority, window }
    }
}

// ── EventStore ────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct EventStore {
    entries: Mutex<Vec<StoreEntry>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StoreEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `window` with an explicit `priority`, which takes precedence
    /// over the window's own priority field for resolution.
    pub fn add(&self, window: Arc<TimeWindow>, priority: i64) {
        debug!(
            name = window.name(),
            id = ?window.id(),
            priority,
            "window added"
        );
        self.lock().push(StoreEntry::new(priority, window));
    }

    /// Append `window` using its own priority.  Returns the shared handle
    /// needed for a later [`remove`](Self::remove).
    pub fn add_window(&self, window: TimeWindow) -> Arc<TimeWindow> {
        let priority = window.priority();
        let window = Arc::new(window);
        self.add(Arc::clone(&window), priority);
        window
    }

    /// Remove the first entry holding this exact window.
    ///
    /// Returns `false` when no entry holds it.
    pub fn remove(&self, window: &Arc<TimeWindow>) -> bool {
        let mut entries = self.lock();
        match entries.iter().position(|e| Arc::ptr_eq(&e.window, window)) {
            Some(i) => {
                entries.remove(i);
                debug!(name = window.name(), id = ?window.id(), "window removed");
                true
            }
            None => false,
        }
    }

    /// Entries whose window contains `now`, in insertion order.
    pub fn snapshot(&self, now: NaiveDateTime) -> Vec<StoreEntry> {
        self.lock()
            .iter()
            .filter(|e| e.window.contains(now))
            .cloned()
            .collect()
    }

    /// Every entry, in insertion order.
    pub fn entries(&self) -> Vec<StoreEntry> {
        self.lock().clone()
    }

    /// Swap the whole contents in one critical section.  Each window is
    /// entered with its own priority.
    pub fn replace_all<I>(&self, windows: I)
    where
        I: IntoIterator<Item = TimeWindow>,
    {
        let fresh: Vec<StoreEntry> = windows
            .into_iter()
            .map(|w| StoreEntry::new(w.priority(), Arc::new(w)))
            .collect();
        let count = fresh.len();
        *self.lock() = fresh;
        debug!(count, "store contents replaced");
    }

    /// The window that should be displayed at `now`, if any.
    pub fn active(&self, now: NaiveDateTime) -> Option<Arc<TimeWindow>> {
        self.active_entry(now).map(|e| e.window)
    }

    /// The winning `(priority, window)` entry at `now`.  Its `priority` is the
    /// one the store ranked by, not necessarily the window's own field.
    pub fn active_entry(&self, now: NaiveDateTime) -> Option<StoreEntry> {
        resolve_entry(&self.snapshot(now), now).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
