/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Display payload carried by an event window.
//!
//! A [`LightPattern`] is an ordered list of [`Light`] runs.  Each run paints
//! `count` consecutive pixels with one [`Rgb`] color:
//!
//! ```text
//! [(255,0,0)x5, (0,255,0)x3]  →  R R R R R G G G . . . .
//! ```
//!
//! The JSON shape is `[{"color": [r, g, b], "count": n}, ...]`.  Channel values
//! outside `0..=255` are rejected by deserialisation because the channels are
//! `u8`; counts are unsigned so a negative count cannot be represented.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why a pattern could not be built.
#[derive(Debug, Error)]
pub enum PatternError {
    /// A count was given as a signed value below zero.
    #[error("light count must be non-negative, got {0}")]
    InvalidCount(i64),

    /// A channel value was outside `0..=255`.
    #[error("color channel {channel} out of range: {value} (expected 0-255)")]
    InvalidChannel { channel: &'static str, value: i64 },
}

// ── Rgb ───────────────────────────────────────────────────────────────────────

/// 8-bit RGB color.  Serialised as a three-element array `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from wider integers, rejecting anything outside a byte.
    pub fn try_from_ints(r: i64, g: i64, b: i64) -> Result<Self, PatternError> {
        let channel = |name: &'static str, value: i64| {
            u8::try_from(value).map_err(|_| PatternError::InvalidChannel {
                channel: name,
                value,
            })
        };
        Ok(Self::new(channel("r", r)?, channel("g", g)?, channel("b", b)?))
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::WHITE
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Rgb::new(r, g, b)
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.r, self.g, self.b)
    }
}

// ── Light ─────────────────────────────────────────────────────────────────────

/// One run of identically colored pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Light {
    #[serde(default)]
    pub color: Rgb,
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}

impl Light {
    pub fn new(color: Rgb, count: u32) -> Self {
        Self { color, count }
    }

    /// Build a run from a signed count, as found in loosely typed sources.
    pub fn try_new(color: Rgb, count: i64) -> Result<Self, PatternError> {
        let count = u32::try_from(count).map_err(|_| PatternError::InvalidCount(count))?;
        Ok(Self { color, count })
    }
}

impl Default for Light {
    fn default() -> Self {
        Self {
            color: Rgb::WHITE,
            count: default_count(),
        }
    }
}

// ── LightPattern ──────────────────────────────────────────────────────────────

/// Ordered list of [`Light`] runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LightPattern {
    lights: Vec<Light>,
}

impl LightPattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a run of `count` pixels of `color`.
    pub fn add_light(&mut self, color: Rgb, count: u32) -> &mut Self {
        self.lights.push(Light::new(color, count));
        self
    }

    /// Builder-style variant of [`add_light`](Self::add_light).
    pub fn with_light(mut self, color: Rgb, count: u32) -> Self {
        self.add_light(color, count);
        self
    }

    pub fn as_slice(&self) -> &[Light] {
        &self.lights
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Light> {
        self.lights.iter()
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn clear(&mut self) {
        self.lights.clear();
    }

    /// Number of pixels the pattern covers when laid out end to end.
    pub fn total_pixels(&self) -> u64 {
        self.lights.iter().map(|l| u64::from(l.count)).sum()
    }
}

impl From<Vec<Light>> for LightPattern {
    fn from(lights: Vec<Light>) -> Self {
        Self { lights }
    }
}

impl FromIterator<Light> for LightPattern {
    fn from_iter<I: IntoIterator<Item = Light>>(iter: I) -> Self {
        Self {
            lights: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a LightPattern {
    type Item = &'a Light;
    type IntoIter = std::slice::Iter<'a, Light>;

    fn into_iter(self) -> Self::IntoIter {
        self.lights.iter()
    }
}

impl fmt::Display for LightPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, light) in self.lights.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}x{}", light.color, light.count)?;
        }
        write!(f, "]")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
