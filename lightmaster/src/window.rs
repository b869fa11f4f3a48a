/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Time-windowed display events.
//!
//! A [`TimeWindow`] is the unit the resolver chooses between: a closed
//! interval `[start, end]` of local wall-clock time, a priority, and the
//! [`LightPattern`] to show while it is active.
//!
//! # Invariants
//! * `end >= start` is checked by every constructor.  A window that violates
//!   it is never created, so it can never reach an [`EventStore`].
//! * Windows do not expire.  Once `end` has passed the window simply stops
//!   matching; it stays in the store until removed.
//!
//! [`EventStore`]: crate::store::EventStore

use chrono::{Duration, NaiveDateTime};
use thiserror::Error;

use lightstrip::{LightPattern, PatternError};

/// Caller-assigned window identifier.  Uniqueness is not enforced.
pub type WindowId = i64;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why a [`TimeWindow`] could not be constructed.
#[derive(Debug, Error)]
pub enum WindowError {
    #[error("window end {end} is before its start {start}")]
    EndBeforeStart {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("invalid light pattern: {0}")]
    Pattern(#[from] PatternError),
}

// ── TimeWindow ────────────────────────────────────────────────────────────────

/// A prioritised interval of wall-clock time with a display payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
    id: Option<WindowId>,
    name: String,
    priority: i64,
    pattern: LightPattern,
}

impl TimeWindow {
    /// Create an unnamed, priority-0 window.
    ///
    /// # Errors
    /// [`WindowError::EndBeforeStart`] when `end < start`.
    pub fn new(
        start: NaiveDateTime,
        end: NaiveDateTime,
        pattern: LightPattern,
    ) -> Result<Self, WindowError> {
        if end < start {
            return Err(WindowError::EndBeforeStart { start, end });
        }
        Ok(Self {
            start,
            end,
            id: None,
            name: String::new(),
            priority: 0,
            pattern,
        })
    }

    /// Create a window from all six externally supplied fields at once.
    pub fn from_parts(
        start: NaiveDateTime,
        end: NaiveDateTime,
        id: Option<WindowId>,
        name: impl Into<String>,
        priority: i64,
        pattern: LightPattern,
    ) -> Result<Self, WindowError> {
        Ok(Self::new(start, end, pattern)?
            .with_id(id)
            .with_name(name)
            .with_priority(priority))
    }

    pub fn with_id(mut self, id: Option<WindowId>) -> Self {
        self.id = id;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn id(&self) -> Option<WindowId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }

    pub fn pattern(&self) -> &LightPattern {
        &self.pattern
    }

    /// `start <= now <= end`.
    pub fn contains(&self, now: NaiveDateTime) -> bool {
        self.start <= now && now <= self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lightstrip::Rgb;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err = TimeWindow::new(at(10, 0, 0), at(9, 59, 59), LightPattern::new()).unwrap_err();
        assert!(matches!(err, WindowError::EndBeforeStart { .. }));
    }

    #[test]
    fn zero_length_window_is_allowed_and_contains_its_instant() {
        let w = TimeWindow::new(at(10, 0, 0), at(10, 0, 0), LightPattern::new()).unwrap();
        assert!(w.contains(at(10, 0, 0)));
        assert!(!w.contains(at(10, 0, 1)));
        assert_eq!(w.duration(), Duration::zero());
    }

    #[test]
    fn contains_is_inclusive_on_both_bounds() {
        let w = TimeWindow::new(at(10, 0, 0), at(11, 0, 0), LightPattern::new()).unwrap();
        assert!(!w.contains(at(9, 59, 59)));
        assert!(w.contains(at(10, 0, 0)));
        assert!(w.contains(at(10, 30, 0)));
        assert!(w.contains(at(11, 0, 0)));
        assert!(!w.contains(at(11, 0, 1)));
    }

    #[test]
    fn defaults_are_unset_id_empty_name_priority_zero() {
        let w = TimeWindow::new(at(1, 0, 0), at(2, 0, 0), LightPattern::new()).unwrap();
        assert_eq!(w.id(), None);
        assert_eq!(w.name(), "");
        assert_eq!(w.priority(), 0);
    }

    #[test]
    fn from_parts_sets_every_field() {
        let pattern = LightPattern::new().with_light(Rgb::new(1, 2, 3), 4);
        let w = TimeWindow::from_parts(
            at(1, 0, 0),
            at(2, 0, 0),
            Some(123),
            "Demo Event",
            5,
            pattern.clone(),
        )
        .unwrap();
        assert_eq!(w.id(), Some(123));
        assert_eq!(w.name(), "Demo Event");
        assert_eq!(w.priority(), 5);
        assert_eq!(w.pattern(), &pattern);
    }
}
