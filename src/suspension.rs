// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Escalating suspension.
//!
//! A violation at count `n` suspends the scope for `window * n`, so each
//! further violation inside a busy period costs more than the last.

use crate::record::Window;
use std::fmt;
use std::time::Duration;

/// Remaining time until a suspension lifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RetryAfter(Duration);

impl RetryAfter {
    /// Non-negative distance from `now` to `until`, both in milliseconds.
    pub fn until(until: u64, now: u64) -> Self {
        Self(Duration::from_millis(until.saturating_sub(now)))
    }

    pub fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Whole seconds, rounded up so a client never retries early.
    pub fn as_secs(&self) -> u64 {
        let millis = self.0.as_millis();
        u64::try_from(millis.div_ceil(1000)).unwrap_or(u64::MAX)
    }

    pub fn hours(&self) -> u64 {
        self.0.as_secs() / 3600
    }

    pub fn minutes(&self) -> u64 {
        (self.0.as_secs() / 60) % 60
    }

    pub fn seconds(&self) -> u64 {
        self.0.as_secs() % 60
    }
}

impl fmt::Display for RetryAfter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_zero() {
            write!(f, "now")
        } else if self.hours() > 0 {
            write!(f, "{} hour(s) and {} minute(s)", self.hours(), self.minutes())
        } else if self.minutes() > 0 {
            write!(f, "{} minute(s) and {} second(s)", self.minutes(), self.seconds())
        } else {
            write!(f, "{} second(s)", self.seconds())
        }
    }
}

/// Suspension check and penalty computation.
#[derive(Debug, Clone, Copy)]
pub struct SuspensionPolicy {
    window_ms: u64,
}

impl SuspensionPolicy {
    pub fn new(window: Duration) -> Self {
        Self {
            window_ms: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Whether the scope is still serving a suspension at `now`.
    pub fn is_suspended(&self, window: &Window, now: u64) -> bool {
        now < window.suspended_until
    }

    /// Suspend the scope for `window * violating_count` from `now`.
    ///
    /// An existing later suspension is kept. Returns the effective end.
    pub fn suspend(&self, window: &mut Window, now: u64, violating_count: u32) -> u64 {
        let penalty = self.window_ms.saturating_mul(u64::from(violating_count));
        let until = now.saturating_add(penalty);
        window.suspended_until = window.suspended_until.max(until);
        window.suspended_until
    }
}
