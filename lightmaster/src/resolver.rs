/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Active-window selection.
//!
//! [`resolve`] is a pure function over a snapshot: no locking, no I/O, safe to
//! call from any number of threads.
//!
//! # Ordering
//! Candidates are ranked by the key `(-priority, start)`:
//!
//! | Rank | Rule |
//! |---|---|
//! | 1 | Higher priority wins |
//! | 2 | Equal priority → earlier `start` wins |
//! | 3 | Still equal → the entry that appears first in the slice wins |
//!
//! Rule 3 relies on `Iterator::min_by_key` returning the *first* minimum,
//! which is the same guarantee a stable sort gives.  Because the store keeps
//! insertion order, "first in the slice" means "added first".

use std::cmp::Reverse;
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::store::StoreEntry;
use crate::window::TimeWindow;

/// Pick the window to display at `now`, or `None` when nothing is active.
///
/// Entries not containing `now` are ignored, so passing an already filtered
/// [`EventStore::snapshot`](crate::store::EventStore::snapshot) or the full
/// entry list gives the same answer.
pub fn resolve(entries: &[StoreEntry], now: NaiveDateTime) -> Option<Arc<TimeWindow>> {
    resolve_entry(entries, now).map(|e| Arc::clone(&e.window))
}

/// Like [`resolve`], but returns the winning entry so the caller also sees
/// the priority it won with, which may differ from the window's own field.
pub fn resolve_entry(entries: &[StoreEntry], now: NaiveDateTime) -> Option<&StoreEntry> {
    entries
        .iter()
        .filter(|e| e.window.contains(now))
        .min_by_key(|e| (Reverse(e.priority), e.window.start()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
