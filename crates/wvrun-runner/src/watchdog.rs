//! Inactivity watchdog.
//!
//! A coarse single-shot deadline: armed when supervision starts, rearmed on
//! every chunk of child output, disarmed when the stream ends. Between a
//! firing and the next rearm it stays quiet, so one silent stretch produces
//! exactly one timeout report.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Watchdog {
    timeout: Option<Duration>,
    deadline: Option<Instant>,
}

impl Watchdog {
    /// A zero timeout disables the watchdog entirely.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout: if timeout.is_zero() { None } else { Some(timeout) },
            deadline: None,
        }
    }

    /// Arm (or rearm) the deadline relative to `now`.
    pub fn arm(&mut self, now: Instant) {
        if let Some(timeout) = self.timeout {
            self.deadline = Some(now + timeout);
        }
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    /// True exactly once per arm, the first time `now` reaches the deadline.
    pub fn expired(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
