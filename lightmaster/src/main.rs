/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Local, NaiveDateTime};
use clap::Parser;
use tracing::{error, info, warn};

use lightmaster::config::DaemonConfig;
use lightmaster::persist;
use lightmaster::{EventStore, PollingDriver, StopSignal, TimeWindow, TimerScheduler, WindowError};
use lightstrip::{LedStrip, LightPattern, Rgb};

// ── CLI argument definition ───────────────────────────────────────────────────

/// LightMaster daemon: shows the highest-priority active event on an LED strip.
///
/// Example:
///   lightmaster -c lightmaster.yaml -e events.json --reload-secs 60
#[derive(Debug, Parser)]
#[command(
    name = "lightmaster",
    about = "Time-windowed LED event scheduler",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML daemon configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// JSON event file (overrides `events_file` from the configuration).
    #[arg(short = 'e', long = "events")]
    events: Option<PathBuf>,

    /// Poll interval of the display driver, in milliseconds (at least 1).
    #[arg(long = "poll-ms", value_parser = clap::value_parser!(u64).range(1..))]
    poll_ms: Option<u64>,

    /// Number of LEDs on the strip.
    #[arg(short = 'n', long = "num-pixels")]
    num_pixels: Option<usize>,

    /// Reload the event file every N seconds (0 disables reloading).
    #[arg(long = "reload-secs")]
    reload_secs: Option<u64>,

    /// Stop automatically after N seconds.
    #[arg(long = "run-for-secs")]
    run_for_secs: Option<u64>,

    /// Ignore the event file and load three demo events relative to now.
    #[arg(long = "demo", default_value_t = false)]
    demo: bool,
}

fn apply_overrides(cli: &Cli, config: &mut DaemonConfig) {
    if let Some(path) = &cli.events {
        config.events_file = Some(path.clone());
    }
    if let Some(ms) = cli.poll_ms {
        config.poll_interval = Duration::from_millis(ms);
    }
    if let Some(n) = cli.num_pixels {
        config.strip.num_pixels = n;
    }
    if let Some(secs) = cli.reload_secs {
        config.reload_interval = (secs > 0).then(|| Duration::from_secs(secs));
    }
}

/// Three overlapping events anchored at `now`:
/// `W2` (+10 s … +50 s, priority 2) shadows `W1` (+30 s … +40 s, priority 1),
/// and `W3` (+100 s … +150 s) follows a gap with nothing active.
fn demo_windows(now: NaiveDateTime) -> Result<Vec<TimeWindow>, WindowError> {
    let at = |s: i64| now + ChronoDuration::seconds(s);
    Ok(vec![
        TimeWindow::new(
            at(30),
            at(40),
            LightPattern::new().with_light(Rgb::new(255, 0, 0), 5),
        )?
        .with_id(Some(1))
        .with_name("W1")
        .with_priority(1),
        TimeWindow::new(
            at(10),
            at(50),
            LightPattern::new()
                .with_light(Rgb::new(0, 255, 0), 3)
                .with_light(Rgb::new(0, 0, 0), 1),
        )?
        .with_id(Some(2))
        .with_name("W2")
        .with_priority(2),
        TimeWindow::new(
            at(100),
            at(150),
            LightPattern::new().with_light(Rgb::new(0, 0, 255), 10),
        )?
        .with_id(Some(3))
        .with_name("W3")
        .with_priority(1),
    ])
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Initialise structured logging.
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("LightMaster starting up...");

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // ── Load configuration ────────────────────────────────────────────────────
    let mut config = match &cli.config {
        Some(path) => DaemonConfig::load_from_file(path)?,
        None => {
            warn!("No configuration file provided, using default settings");
            DaemonConfig::default()
        }
    };
    apply_overrides(&cli, &mut config);

    info!(
        num_pixels    = config.strip.num_pixels,
        poll_ms       = config.poll_interval.as_millis() as u64,
        events_file   = ?config.events_file,
        reload        = ?config.reload_interval,
        run_for_secs  = ?cli.run_for_secs,
        demo          = cli.demo,
        "Configuration"
    );

    // ── Populate the event store ──────────────────────────────────────────────
    let store = Arc::new(EventStore::new());

    if cli.demo {
        let windows = demo_windows(Local::now().naive_local())?;
        info!("Loaded {} demo event(s)", windows.len());
        for w in windows {
            store.add_window(w);
        }
    } else if let Some(path) = &config.events_file {
        store.replace_all(persist::load_windows(path)?);
    } else {
        warn!("No event file provided, nothing will be displayed");
    }

    // ── Timers ────────────────────────────────────────────────────────────────
    let timer = TimerScheduler::start().context("failed to start timer scheduler")?;
    let stop = StopSignal::new();

    if let (false, Some(interval), Some(path)) =
        (cli.demo, config.reload_interval, config.events_file.clone())
    {
        let reload_store = Arc::clone(&store);
        timer.schedule_every(interval, move || {
            let windows = persist::load_windows(&path)?;
            reload_store.replace_all(windows);
            Ok(())
        })?;
        info!(interval_secs = interval.as_secs(), "Periodic event reload enabled");
    }

    if let Some(secs) = cli.run_for_secs {
        let s = stop.clone();
        timer.schedule_after(Duration::from_secs(secs), move || {
            info!("Run time of {}s elapsed", secs);
            s.stop();
            Ok(())
        })?;
    }

    // ── Ctrl-C ────────────────────────────────────────────────────────────────
    let s = stop.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, stopping");
                s.stop();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    // ── Display loop ──────────────────────────────────────────────────────────
    let driver = PollingDriver::new(Arc::clone(&store)).poll_interval(config.poll_interval);
    let strip_config = config.strip;
    let driver_stop = stop.clone();

    tokio::task::spawn_blocking(move || {
        let mut strip = LedStrip::mock(strip_config);
        driver.run_with_renderer(&mut strip, &driver_stop);
        strip.close();
    })
    .await
    .context("display driver terminated abnormally")?;

    timer.shutdown();
    info!("LightMaster stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("lightmaster").chain(args.iter().copied()))
    }

    #[test]
    fn demo_windows_resolve_by_priority() {
        let now = Local::now().naive_local();
        let store = EventStore::new();
        for w in demo_windows(now).unwrap() {
            store.add_window(w);
        }
        let at = |s: i64| now + ChronoDuration::seconds(s);
        let name = |s: i64| store.active(at(s)).map(|w| w.name().to_string());

        assert_eq!(name(5), None);
        assert_eq!(name(35).as_deref(), Some("W2"));
        assert_eq!(name(45).as_deref(), Some("W2"));
        assert_eq!(name(60), None);
        assert_eq!(name(120).as_deref(), Some("W3"));
    }

    #[test]
    fn cli_overrides_config() {
        let mut config = DaemonConfig::default();
        apply_overrides(
            &cli(&["-e", "ev.json", "--poll-ms", "250", "-n", "30", "--reload-secs", "10"]),
            &mut config,
        );
        assert_eq!(config.events_file, Some(PathBuf::from("ev.json")));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.strip.num_pixels, 30);
        assert_eq!(config.reload_interval, Some(Duration::from_secs(10)));
    }

    #[test]
    fn zero_poll_interval_flag_is_rejected() {
        let args = ["lightmaster", "--poll-ms", "0"];
        assert!(Cli::try_parse_from(args).is_err());
        assert!(Cli::try_parse_from(["lightmaster", "--poll-ms", "1"]).is_ok());
    }

    #[test]
    fn zero_reload_override_disables_reload() {
        let mut config = DaemonConfig {
            reload_interval: Some(Duration::from_secs(5)),
            ..Default::default()
        };
        apply_overrides(&cli(&["--reload-secs", "0"]), &mut config);
        assert!(config.reload_interval.is_none());
    }

    #[test]
    fn absent_flags_keep_config() {
        let mut config = DaemonConfig::default();
        apply_overrides(&cli(&[]), &mut config);
        assert_eq!(config, DaemonConfig::default());
    }
}
