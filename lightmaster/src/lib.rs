/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! LightMaster – time-windowed LED event scheduling
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── window      – TimeWindow: start/end, priority, light pattern
//! ├── store       – EventStore: thread-safe (priority, window) registry
//! ├── resolver    – pick the active window for a moment in time
//! ├── timer/      – heap-based one-shot / recurring callback scheduler
//! ├── driver      – polling loop pushing the active window to a renderer
//! ├── persist     – JSON event files
//! └── config/     – YAML daemon configuration
//! ```

pub mod config;
pub mod driver;
pub mod persist;
pub mod resolver;
pub mod store;
pub mod timer;
pub mod window;

pub use driver::{PollingDriver, Renderer, StopSignal};
pub use store::{EventStore, StoreEntry};
pub use timer::{CallbackFailure, TaskId, TimerError, TimerScheduler};
pub use window::{TimeWindow, WindowError, WindowId};
