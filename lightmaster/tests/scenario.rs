/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! End-to-end scenarios across store, resolver, timer, driver and files.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use tempfile::NamedTempFile;

use lightmaster::persist;
use lightmaster::{EventStore, PollingDriver, StopSignal, TimeWindow, TimerScheduler};
use lightstrip::{LedStrip, LightPattern, Rgb, StripConfig};

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 6, 21)
        .unwrap()
        .and_hms_opt(21, 0, 0)
        .unwrap()
}

fn at(s: i64) -> NaiveDateTime {
    t0() + ChronoDuration::seconds(s)
}

fn window(name: &str, from_s: i64, to_s: i64, priority: i64, color: Rgb) -> TimeWindow {
    TimeWindow::new(at(from_s), at(to_s), LightPattern::new().with_light(color, 2))
        .unwrap()
        .with_name(name)
        .with_priority(priority)
}

fn three_windows() -> Vec<TimeWindow> {
    vec![
        window("W1", 30, 40, 1, Rgb::new(255, 0, 0)),
        window("W2", 10, 50, 2, Rgb::new(0, 255, 0)),
        window("W3", 100, 150, 1, Rgb::new(0, 0, 255)),
    ]
}

fn active_name(store: &EventStore, s: i64) -> Option<String> {
    store.active(at(s)).map(|w| w.name().to_string())
}

// ── Resolution ────────────────────────────────────────────────────────────────

#[test]
fn higher_priority_window_shadows_nested_one() {
    let store = EventStore::new();
    for w in three_windows() {
        store.add_window(w);
    }

    assert_eq!(active_name(&store, 35).as_deref(), Some("W2"));
    assert_eq!(active_name(&store, 45).as_deref(), Some("W2"));
    assert_eq!(active_name(&store, 60), None);
    assert_eq!(active_name(&store, 120).as_deref(), Some("W3"));
}

#[test]
fn removing_the_winner_reveals_the_next_window() {
    let store = EventStore::new();
    let handles: Vec<_> = three_windows()
        .into_iter()
        .map(|w| store.add_window(w))
        .collect();

    assert!(store.remove(&handles[1]));
    assert_eq!(active_name(&store, 35).as_deref(), Some("W1"));
    assert_eq!(active_name(&store, 45), None);
    assert!(!store.remove(&handles[1]));
}

// ── Persistence ───────────────────────────────────────────────────────────────

#[test]
fn saved_events_resolve_the_same_after_reload() {
    let f = NamedTempFile::new().unwrap();
    let windows = three_windows();
    persist::save_windows(f.path(), &windows).unwrap();

    let store = EventStore::new();
    store.replace_all(persist::load_windows(f.path()).unwrap());

    assert_eq!(store.len(), 3);
    assert_eq!(active_name(&store, 35).as_deref(), Some("W2"));
    assert_eq!(active_name(&store, 120).as_deref(), Some("W3"));
}

// ── Timer ─────────────────────────────────────────────────────────────────────

#[test]
fn recurring_task_stops_firing_after_shutdown() {
    let timer = TimerScheduler::start().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    timer
        .schedule_every(Duration::from_millis(100), move || {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

    // Stop after exactly five intervals.
    thread::sleep(Duration::from_millis(500));
    timer.shutdown();
    let at_stop = hits.load(Ordering::SeqCst);
    assert!((4..=5).contains(&at_stop), "fired {at_stop} times");

    thread::sleep(Duration::from_millis(250));
    assert_eq!(hits.load(Ordering::SeqCst), at_stop);
}

#[test]
fn timer_reload_swaps_store_contents() {
    let f = NamedTempFile::new().unwrap();
    persist::save_windows(f.path(), &three_windows()[..1]).unwrap();

    let store = Arc::new(EventStore::new());
    store.replace_all(persist::load_windows(f.path()).unwrap());
    assert_eq!(store.len(), 1);

    // Rewrite the file, then let a one-shot timer reload it.
    persist::save_windows(f.path(), &three_windows()).unwrap();
    let timer = TimerScheduler::start().unwrap();
    let path = f.path().to_path_buf();
    let s = Arc::clone(&store);
    timer
        .schedule_after(Duration::from_millis(10), move || {
            s.replace_all(persist::load_windows(&path)?);
            Ok(())
        })
        .unwrap();

    thread::sleep(Duration::from_millis(200));
    timer.shutdown();
    assert_eq!(store.len(), 3);
    assert_eq!(active_name(&store, 35).as_deref(), Some("W2"));
}

// ── Driver ────────────────────────────────────────────────────────────────────

#[test]
fn driver_walks_the_timeline_and_stops_via_timer() {
    let store = Arc::new(EventStore::new());
    for w in three_windows() {
        store.add_window(w);
    }

    // Each poll advances the simulated clock by five seconds.
    let tick = Arc::new(AtomicUsize::new(0));
    let driver = PollingDriver::new(Arc::clone(&store))
        .poll_interval(Duration::from_millis(1))
        .clock(move || at(5 * tick.fetch_add(1, Ordering::SeqCst) as i64));

    let stop = StopSignal::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let s = stop.clone();

    let timer = TimerScheduler::start().unwrap();
    timer
        .schedule_after(Duration::from_secs(5), move || {
            s.stop();
            Ok(())
        })
        .unwrap();

    let s = stop.clone();
    driver.run(
        |active| {
            let mut seen = sink.lock().unwrap();
            seen.push(active.map(|w| w.name().to_string()));
            if seen.len() == 4 {
                s.stop();
            }
            Ok(())
        },
        &stop,
    );
    timer.shutdown();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![None, Some("W2".to_string()), None, Some("W3".to_string())]
    );
}

#[test]
fn driver_renders_active_pattern_on_strip() {
    let store = Arc::new(EventStore::new());
    store.add_window(window("now", -1, 60, 0, Rgb::new(10, 20, 30)));

    let driver = PollingDriver::new(store)
        .poll_interval(Duration::from_millis(5))
        .clock(|| at(0));

    let mut strip = LedStrip::mock(StripConfig {
        num_pixels: 4,
        ..Default::default()
    });
    let stop = StopSignal::new();
    let s = stop.clone();
    let h = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        s.stop();
    });
    driver.run_with_renderer(&mut strip, &stop);
    h.join().unwrap();

    assert_eq!(strip.sink().show_count(), 1);
    assert_eq!(
        strip.sink().pixels(),
        &[
            Rgb::new(10, 20, 30),
            Rgb::new(10, 20, 30),
            Rgb::BLACK,
            Rgb::BLACK
        ]
    );
}
