/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! JSON event files.
//!
//! A file holds either one event object or an array of them:
//!
//! ```json
//! [
//!   {
//!     "start": "2026-03-14T18:00:00",
//!     "end":   "2026-03-14T23:00:00",
//!     "id": 123,
//!     "name": "Evening",
//!     "priority": 5,
//!     "pattern": [ { "color": [255, 0, 0], "count": 2 },
//!                  { "color": [0, 255, 0], "count": 1 } ]
//!   }
//! ]
//! ```
//!
//! Timestamps are local wall-clock date-times without an offset.  Only
//! `start` and `end` are required; `id` defaults to unset, `name` to empty,
//! `priority` to 0, a light's `color` to white and its `count` to 1.
//!
//! Every record is built through [`TimeWindow::from_parts`], so a record with
//! `end` before `start`, a channel outside 0–255 or a negative count fails the
//! whole load with the record index in the error chain.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lightstrip::{Light, LightPattern, Rgb};

use crate::window::{TimeWindow, WindowError, WindowId};

// ── Private JSON types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct WindowRecord {
    start: NaiveDateTime,
    end: NaiveDateTime,
    #[serde(default)]
    id: Option<WindowId>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    priority: i64,
    #[serde(default)]
    pattern: Vec<LightRecord>,
}

/// Colors and counts are read as wide integers so out-of-range values are
/// reported as pattern errors rather than opaque parse failures.
#[derive(Debug, Serialize, Deserialize)]
struct LightRecord {
    #[serde(default = "white")]
    color: [i64; 3],
    #[serde(default = "one")]
    count: i64,
}

fn white() -> [i64; 3] {
    [255, 255, 255]
}

fn one() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EventFile {
    Many(Vec<WindowRecord>),
    One(WindowRecord),
}

impl WindowRecord {
    fn into_window(self) -> Result<TimeWindow, WindowError> {
        let pattern = self
            .pattern
            .into_iter()
            .map(|l| {
                let [r, g, b] = l.color;
                Light::try_new(Rgb::try_from_ints(r, g, b)?, l.count)
            })
            .collect::<Result<LightPattern, _>>()?;
        TimeWindow::from_parts(
            self.start,
            self.end,
            self.id,
            self.name,
            self.priority,
            pattern,
        )
    }

    fn from_window(w: &TimeWindow) -> Self {
        Self {
            start: w.start(),
            end: w.end(),
            id: w.id(),
            name: w.name().to_string(),
            priority: w.priority(),
            pattern: w
                .pattern()
                .iter()
                .map(|l| LightRecord {
                    color: [l.color.r.into(), l.color.g.into(), l.color.b.into()],
                    count: l.count.into(),
                })
                .collect(),
        }
    }
}

fn build_all(records: Vec<WindowRecord>) -> Result<Vec<TimeWindow>> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, rec)| {
            let name = rec.name.clone();
            rec.into_window()
                .with_context(|| format!("invalid event #{i} ('{name}')"))
        })
        .collect()
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Parse one event object or an array of them.
pub fn parse_windows(json: &str) -> Result<Vec<TimeWindow>> {
    let file: EventFile = serde_json::from_str(json).context("malformed event JSON")?;
    let records = match file {
        EventFile::Many(records) => records,
        EventFile::One(record) => vec![record],
    };
    build_all(records)
}

/// Load every event in `path`.
///
/// # Errors
/// Fails if the file cannot be read, is not valid event JSON, or any record
/// violates a window invariant.  Nothing is returned on partial failure.
pub fn load_windows(path: &Path) -> Result<Vec<TimeWindow>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot open event file: {}", path.display()))?;
    let windows = parse_windows(&content)
        .with_context(|| format!("Failed to load events from: {}", path.display()))?;

    info!(count = windows.len(), path = %path.display(), "Loaded events");
    for w in &windows {
        debug!(
            "  Event: {} | id: {:?} | priority: {} | {} → {} | {}",
            w.name(),
            w.id(),
            w.priority(),
            w.start(),
            w.end(),
            w.pattern(),
        );
    }
    Ok(windows)
}

/// Load a file holding exactly one event object.
pub fn load_window(path: &Path) -> Result<TimeWindow> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot open event file: {}", path.display()))?;
    let record: WindowRecord = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse event JSON: {}", path.display()))?;
    record
        .into_window()
        .with_context(|| format!("Invalid event in: {}", path.display()))
}

/// Serialise `windows` as a pretty-printed JSON array.
pub fn to_json<'a, I>(windows: I) -> Result<String>
where
    I: IntoIterator<Item = &'a TimeWindow>,
{
    let records: Vec<WindowRecord> = windows.into_iter().map(WindowRecord::from_window).collect();
    serde_json::to_string_pretty(&records).context("failed to serialise events")
}

/// Write `windows` to `path` as a JSON array, replacing any existing file.
pub fn save_windows<'a, I>(path: &Path, windows: I) -> Result<()>
where
    I: IntoIterator<Item = &'a TimeWindow>,
{
    let json = to_json(windows)?;
    std::fs::write(path, json)
        .with_context(|| format!("Cannot write event file: {}", path.display()))?;
    info!(path = %path.display(), "Saved events");
    Ok(())
}

/// Write a single event object to `path`.
pub fn save_window(path: &Path, window: &TimeWindow) -> Result<()> {
    let json = serde_json::to_string_pretty(&WindowRecord::from_window(window))
        .context("failed to serialise event")?;
    std::fs::write(path, json)
        .with_context(|| format!("Cannot write event file: {}", path.display()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use tempfile::NamedTempFile;

    fn demo_window() -> TimeWindow {
        let start = NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        TimeWindow::from_parts(
            start,
            start + Duration::hours(1),
            Some(123),
            "Demo Event",
            5,
            LightPattern::new()
                .with_light(Rgb::new(255, 0, 0), 2)
                .with_light(Rgb::new(0, 255, 0), 1),
        )
        .unwrap()
    }

    #[test]
    fn single_window_survives_file_round_trip() {
        let f = NamedTempFile::new().unwrap();
        let original = demo_window();
        save_window(f.path(), &original).unwrap();
        let back = load_window(f.path()).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn list_file_keeps_order() {
        let f = NamedTempFile::new().unwrap();
        let a = demo_window().with_name("a");
        let b = demo_window().with_name("b").with_id(None);
        save_windows(f.path(), [&a, &b]).unwrap();
        let back = load_windows(f.path()).unwrap();
        assert_eq!(back, vec![a, b]);
    }

    #[test]
    fn single_object_is_accepted_by_list_loader() {
        let json = r#"{"start": "2026-01-01T10:00:00", "end": "2026-01-01T11:00:00"}"#;
        let windows = parse_windows(json).unwrap();
        assert_eq!(windows.len(), 1);
        let w = &windows[0];
        assert_eq!(w.id(), None);
        assert_eq!(w.name(), "");
        assert_eq!(w.priority(), 0);
        assert!(w.pattern().is_empty());
    }

    #[test]
    fn light_defaults_apply() {
        let json = r#"[{"start": "2026-01-01T10:00:00", "end": "2026-01-01T11:00:00",
                        "pattern": [{}]}]"#;
        let windows = parse_windows(json).unwrap();
        let light = windows[0].pattern().as_slice()[0];
        assert_eq!(light.color, Rgb::WHITE);
        assert_eq!(light.count, 1);
    }

    #[test]
    fn end_before_start_is_rejected_with_index() {
        let json = r#"[
            {"start": "2026-01-01T10:00:00", "end": "2026-01-01T11:00:00"},
            {"start": "2026-01-01T12:00:00", "end": "2026-01-01T11:00:00", "name": "bad"}
        ]"#;
        let err = parse_windows(json).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("#1"), "{msg}");
        assert!(msg.contains("'bad'"), "{msg}");
        assert!(err
            .chain()
            .any(|e| matches!(e.downcast_ref::<WindowError>(), Some(WindowError::EndBeforeStart { .. }))));
    }

    #[test]
    fn invalid_color_is_rejected() {
        let json = r#"{"start": "2026-01-01T10:00:00", "end": "2026-01-01T11:00:00",
                       "pattern": [{"color": [0, 0, 256], "count": 1}]}"#;
        let err = parse_windows(json).unwrap_err();
        assert!(err
            .chain()
            .any(|e| matches!(e.downcast_ref::<WindowError>(), Some(WindowError::Pattern(_)))));
    }

    #[test]
    fn negative_count_is_rejected() {
        let json = r#"{"start": "2026-01-01T10:00:00", "end": "2026-01-01T11:00:00",
                       "pattern": [{"color": [0, 0, 0], "count": -2}]}"#;
        assert!(parse_windows(json).is_err());
    }

    #[test]
    fn missing_file_returns_error() {
        assert!(load_windows(Path::new("/nonexistent/events.json")).is_err());
    }

    #[test]
    fn malformed_json_returns_error() {
        assert!(parse_windows("{ not json").is_err());
        assert!(parse_windows(r#"{"start": "yesterday"}"#).is_err());
    }
}
