/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! WS281x LED strip driver.
//!
//! [`LedStrip`] lays a [`LightPattern`] out on a strip of pixels and pushes it
//! to a [`PixelSink`].  The sink is the hardware seam: a real GPIO/DMA backend
//! implements it on the target board, while [`MockPixels`] keeps the frame in
//! memory and logs it, which is what development machines and tests use.
//!
//! ```text
//! pattern [(R)x3, (G)x2]   offset 1   strip of 8
//!
//!   idx:  0  1  2  3  4  5  6  7
//!         .  R  R  R  G  G  .  .     ('.' = off)
//! ```

use tracing::{debug, info};

use crate::pattern::{LightPattern, Rgb};

// ── Configuration ─────────────────────────────────────────────────────────────

/// Physical strip parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripConfig {
    /// Total number of LEDs on the strip.
    pub num_pixels: usize,
    /// GPIO pin (BCM numbering) driving the data line.
    pub pin: u8,
    /// Global brightness, 0–255.
    pub brightness: u8,
    /// PWM channel (0 or 1).
    pub channel: u8,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            num_pixels: 60,
            pin: 18,
            brightness: 255,
            channel: 0,
        }
    }
}

// ── PixelSink ─────────────────────────────────────────────────────────────────

/// Backend that owns the pixel buffer and talks to the hardware.
pub trait PixelSink: Send {
    /// Initialise the backend.  Called once by [`LedStrip::new`].
    fn begin(&mut self);

    /// Stage a color for pixel `index`.  Out-of-range indices are ignored.
    fn set_pixel(&mut self, index: usize, color: Rgb);

    /// Latch the staged buffer onto the LEDs.
    fn show(&mut self);

    /// Number of pixels the backend drives.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory backend that logs every `show()`.
#[derive(Debug, Clone)]
pub struct MockPixels {
    pixels: Vec<Rgb>,
    shows: usize,
}

impl MockPixels {
    pub fn new(num_pixels: usize) -> Self {
        Self {
            pixels: vec![Rgb::BLACK; num_pixels],
            shows: 0,
        }
    }

    /// The staged buffer.
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// How many times [`PixelSink::show`] has been called.
    pub fn show_count(&self) -> usize {
        self.shows
    }
}

impl PixelSink for MockPixels {
    fn begin(&mut self) {
        info!(num_pixels = self.pixels.len(), "[mock] pixel strip initialised");
    }

    fn set_pixel(&mut self, index: usize, color: Rgb) {
        if let Some(p) = self.pixels.get_mut(index) {
            *p = color;
        }
    }

    fn show(&mut self) {
        self.shows += 1;
        let frame: Vec<String> = self.pixels.iter().map(Rgb::to_string).collect();
        debug!(frame = %frame.join(" "), "[mock] show");
    }

    fn len(&self) -> usize {
        self.pixels.len()
    }
}

// ── LedStrip ──────────────────────────────────────────────────────────────────

/// Drives one LED strip through a [`PixelSink`].
#[derive(Debug)]
pub struct LedStrip<S: PixelSink = MockPixels> {
    config: StripConfig,
    sink: S,
}

impl LedStrip<MockPixels> {
    /// Strip backed by an in-memory [`MockPixels`] buffer.
    pub fn mock(config: StripConfig) -> Self {
        Self::new(config, MockPixels::new(config.num_pixels))
    }
}

impl<S: PixelSink> LedStrip<S> {
    /// Wrap `sink` and initialise it.
    pub fn new(config: StripConfig, mut sink: S) -> Self {
        info!(
            num_pixels = config.num_pixels,
            pin = config.pin,
            brightness = config.brightness,
            channel = config.channel,
            "LED strip configured"
        );
        sink.begin();
        Self { config, sink }
    }

    pub fn config(&self) -> &StripConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn num_pixels(&self) -> usize {
        self.config.num_pixels.min(self.sink.len())
    }

    /// Paint `pattern` starting at pixel `offset`.
    ///
    /// Runs are laid out in order until the strip ends; every pixel not
    /// covered by the pattern (including those before `offset`) is turned off.
    pub fn send_pattern(&mut self, pattern: &LightPattern, offset: usize, show: bool) {
        let n = self.num_pixels();

        for idx in 0..offset.min(n) {
            self.sink.set_pixel(idx, Rgb::BLACK);
        }

        let mut idx = offset;
        'runs: for light in pattern {
            for _ in 0..light.count {
                if idx >= n {
                    break 'runs;
                }
                self.sink.set_pixel(idx, light.color);
                idx += 1;
            }
        }

        for rest in idx..n {
            self.sink.set_pixel(rest, Rgb::BLACK);
        }

        debug!(
            runs = pattern.len(),
            offset,
            lit = idx.saturating_sub(offset).min(n),
            "pattern sent"
        );

        if show {
            self.sink.show();
        }
    }

    /// Turn every pixel off.
    pub fn clear(&mut self, show: bool) {
        for idx in 0..self.num_pixels() {
            self.sink.set_pixel(idx, Rgb::BLACK);
        }
        if show {
            self.sink.show();
        }
    }

    /// Blank the strip before releasing it.
    pub fn close(&mut self) {
        self.clear(true);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
