// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter.
//!
//! Only the count since the last window reset is tracked, so a burst that
//! straddles a window boundary can exceed the nominal rate. Each counted
//! message moves `window_start` forward, which means the window only resets
//! after a quiet gap longer than the window length.

use crate::record::Window;
use std::time::Duration;
use tracing::debug;

/// Outcome of counting one message against a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Count is within the threshold
    Within { count: u32 },
    /// Count went past the threshold
    Exceeded { count: u32 },
}

impl RateLimitResult {
    pub fn count(&self) -> u32 {
        match *self {
            Self::Within { count } | Self::Exceeded { count } => count,
        }
    }

    pub fn is_exceeded(&self) -> bool {
        matches!(self, Self::Exceeded { .. })
    }
}

/// Fixed-window counter evaluated against stored window state.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    window_ms: u64,
    threshold: u32,
}

impl RateLimiter {
    /// Create a limiter with the given window length and threshold.
    pub fn new(window: Duration, threshold: u32) -> Self {
        Self {
            window_ms: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
            threshold,
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Count one message at `now`, updating `window` in place.
    pub fn evaluate(&self, window: &mut Window, now: u64) -> RateLimitResult {
        // A clock that went backwards counts as no time elapsed
        let elapsed = now.saturating_sub(window.window_start);
        if elapsed > self.window_ms {
            window.count = 1;
        } else {
            window.count = window.count.saturating_add(1);
        }
        window.window_start = now;

        if window.count > self.threshold {
            debug!(count = window.count, threshold = self.threshold, "Window threshold exceeded");
            RateLimitResult::Exceeded {
                count: window.count,
            }
        } else {
            RateLimitResult::Within {
                count: window.count,
            }
        }
    }
}
