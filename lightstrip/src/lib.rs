/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Light patterns and the LED strip they are rendered on.
//!
//! ```text
//! lib.rs
//! ├── pattern     – Rgb / Light / LightPattern display payload
//! └── strip       – LedStrip driver over a PixelSink backend (mock included)
//! ```

pub mod pattern;
pub mod strip;

pub use pattern::{Light, LightPattern, PatternError, Rgb};
pub use strip::{LedStrip, MockPixels, PixelSink, StripConfig};
