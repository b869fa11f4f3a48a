/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Error types for the timer scheduler.
//!
//! Two enums model the two failure layers:
//!
//! * [`TimerError`]: returned to the caller of a scheduling method when the
//!   request itself cannot be accepted.
//! * [`CallbackFailure`]: a user callback failed while running on the timer
//!   thread.  It never propagates; it is handed to the scheduler's error hook
//!   and the thread carries on.

use std::any::Any;
use std::io;

use thiserror::Error;

/// Why a scheduling request was refused.
#[derive(Debug, Error)]
pub enum TimerError {
    /// A recurring task was requested with a zero interval, which would make
    /// the timer thread spin.
    #[error("recurring interval must be greater than zero")]
    ZeroInterval,

    /// The scheduler has been shut down and accepts no new work.
    #[error("timer scheduler has been shut down")]
    Stopped,

    /// The OS refused to start the timer thread.
    #[error("failed to spawn timer thread: {0}")]
    Spawn(#[from] io::Error),
}

/// How a callback failed.
#[derive(Debug, Error)]
pub enum CallbackFailure {
    /// The callback returned `Err`.
    #[error("callback returned an error: {0:#}")]
    Error(anyhow::Error),

    /// The callback panicked.  Carries the panic message when it was a string.
    #[error("callback panicked: {0}")]
    Panic(String),
}

impl CallbackFailure {
    /// Convert a payload caught by `catch_unwind`.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            String::from("<non-string panic payload>")
        };
        CallbackFailure::Panic(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payload_str_and_string_are_kept() {
        let f = CallbackFailure::from_panic(Box::new("boom"));
        assert!(matches!(f, CallbackFailure::Panic(ref m) if m == "boom"));

        let f = CallbackFailure::from_panic(Box::new(String::from("bang")));
        assert_eq!(f.to_string(), "callback panicked: bang");
    }

    #[test]
    fn opaque_panic_payload_gets_placeholder() {
        let f = CallbackFailure::from_panic(Box::new(42_u32));
        assert!(matches!(f, CallbackFailure::Panic(ref m) if m.contains("non-string")));
    }
}
