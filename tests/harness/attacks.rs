// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Attack simulation patterns for security testing.
//!
//! Time is simulated: request `i` is sent at `start_ms + i * interval_ms`.
//! Request `i` comes from address `i % unique_addresses` and declares
//! username `i % unique_usernames`.

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of requests to send
    pub total_requests: usize,
    /// Simulated milliseconds between consecutive requests
    pub interval_ms: u64,
    /// Number of unique addresses to simulate
    pub unique_addresses: usize,
    /// Number of unique usernames to rotate through
    pub unique_usernames: usize,
    /// Put every generated address on the ban list first
    pub banned: bool,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            interval_ms: 1_000,
            unique_addresses: 1,
            unique_usernames: 1,
            banned: false,
        }
    }
}

/// Predefined attack patterns.
impl AttackConfig {
    /// Single address flood - one sender, one name, one message per second.
    pub fn single_address_flood() -> Self {
        Self::default()
    }

    /// Identity rotation - one address declaring a new username each time.
    pub fn username_rotation() -> Self {
        Self {
            unique_usernames: 50,
            ..Default::default()
        }
    }

    /// Shared username - the same name sent from many addresses.
    pub fn shared_username() -> Self {
        Self {
            total_requests: 60,
            unique_addresses: 10,
            ..Default::default()
        }
    }

    /// Distributed attack - many addresses, each under the threshold.
    pub fn distributed_attack() -> Self {
        Self {
            total_requests: 500,
            interval_ms: 100,
            unique_addresses: 100,
            unique_usernames: 50,
            ..Default::default()
        }
    }

    /// Slow drip - one message per window, always just past the reset.
    pub fn slow_drip(window_ms: u64) -> Self {
        Self {
            total_requests: 20,
            interval_ms: window_ms + 1,
            ..Default::default()
        }
    }

    /// Banned flood - every address is on the ban list.
    pub fn banned_flood() -> Self {
        Self {
            total_requests: 200,
            interval_ms: 10,
            unique_addresses: 4,
            unique_usernames: 20,
            banned: true,
        }
    }

    /// Simulated span covered by the attack.
    pub fn simulated_duration_ms(&self) -> u64 {
        self.interval_ms * self.total_requests.saturating_sub(1) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_duration() {
        assert_eq!(AttackConfig::single_address_flood().simulated_duration_ms(), 99_000);
        assert_eq!(AttackConfig::slow_drip(15_000).simulated_duration_ms(), 19 * 15_001);
    }
}
