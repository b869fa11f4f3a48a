/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use lightstrip::{LedStrip, LightPattern, Rgb, StripConfig};

/// Push a fixed red/green/blue pattern to a mock LED strip, then clear it.
///
/// Run with `RUST_LOG=debug` to see every rendered frame.
#[derive(Debug, Parser)]
#[command(name = "lightstrip", about = "LED strip demo on the mock backend")]
struct Cli {
    /// Number of LEDs on the strip.
    #[arg(short = 'n', long = "num-pixels", default_value_t = 8)]
    num_pixels: usize,

    /// First pixel the pattern is drawn at.
    #[arg(short = 'o', long = "offset", default_value_t = 0)]
    offset: usize,

    /// How long to keep the pattern lit before clearing, in milliseconds.
    #[arg(short = 't', long = "hold-ms", default_value_t = 1000)]
    hold_ms: u64,
}

fn demo_pattern() -> LightPattern {
    LightPattern::new()
        .with_light(Rgb::new(255, 0, 0), 3)
        .with_light(Rgb::new(0, 255, 0), 2)
        .with_light(Rgb::new(0, 0, 255), 1)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let cli = Cli::parse();

    let mut strip = LedStrip::mock(StripConfig {
        num_pixels: cli.num_pixels,
        ..Default::default()
    });

    let pattern = demo_pattern();
    info!(pattern = %pattern, offset = cli.offset, "Sending demo pattern");
    strip.send_pattern(&pattern, cli.offset, true);

    thread::sleep(Duration::from_millis(cli.hold_ms));
    strip.close();
    info!("Strip cleared");
}
