// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Metrics collection for attack simulation results.

use std::collections::HashMap;
use std::time::Duration;

/// Collects metrics during attack simulation.
#[derive(Debug, Default)]
pub struct AttackMetrics {
    /// Count of requests by outcome
    outcomes: HashMap<Outcome, usize>,
    /// Count of requests by address
    requests_per_address: HashMap<String, usize>,
    /// Count of requests by username
    requests_per_username: HashMap<String, usize>,
    /// Latency samples (microseconds)
    latencies: Vec<u64>,
}

/// Possible outcomes for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Allowed,
    RateLimited,
    Suspended,
    Banned,
    Invalid,
    Failed,
}

impl AttackMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request outcome.
    pub fn record(&mut self, outcome: Outcome, address: &str, username: &str, latency: Duration) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        *self.requests_per_address.entry(address.to_string()).or_insert(0) += 1;
        *self.requests_per_username.entry(username.to_string()).or_insert(0) += 1;
        self.latencies.push(latency.as_micros() as u64);
    }

    /// Get total request count.
    pub fn total_requests(&self) -> usize {
        self.outcomes.values().sum()
    }

    /// Get count for a specific outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Get block rate (ratio of blocked to total).
    pub fn block_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        let allowed = self.count(Outcome::Allowed);
        (total - allowed) as f64 / total as f64
    }

    /// Get median latency in microseconds.
    pub fn median_latency_us(&self) -> u64 {
        if self.latencies.is_empty() {
            return 0;
        }
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();
        sorted[sorted.len() / 2]
    }

    /// Generate a summary report.
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            total_requests: self.total_requests(),
            allowed: self.count(Outcome::Allowed),
            rate_limited: self.count(Outcome::RateLimited),
            suspended: self.count(Outcome::Suspended),
            banned: self.count(Outcome::Banned),
            invalid: self.count(Outcome::Invalid),
            failed: self.count(Outcome::Failed),
            block_rate: self.block_rate(),
            median_latency_us: self.median_latency_us(),
            unique_addresses: self.requests_per_address.len(),
            unique_usernames: self.requests_per_username.len(),
        }
    }
}

/// Summary report of attack metrics.
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub total_requests: usize,
    pub allowed: usize,
    pub rate_limited: usize,
    pub suspended: usize,
    pub banned: usize,
    pub invalid: usize,
    pub failed: usize,
    pub block_rate: f64,
    pub median_latency_us: u64,
    pub unique_addresses: usize,
    pub unique_usernames: usize,
}

impl std::fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Attack Metrics Report ===")?;
        writeln!(f, "Total Requests:    {}", self.total_requests)?;
        writeln!(f)?;
        writeln!(f, "--- Outcomes ---")?;
        writeln!(f, "Allowed:           {}", self.allowed)?;
        writeln!(f, "Rate Limited:      {}", self.rate_limited)?;
        writeln!(f, "Suspended:         {}", self.suspended)?;
        writeln!(f, "Banned:            {}", self.banned)?;
        writeln!(f, "Invalid:           {}", self.invalid)?;
        writeln!(f, "Failed:            {}", self.failed)?;
        writeln!(f, "Block Rate:        {:.1}%", self.block_rate * 100.0)?;
        writeln!(f)?;
        writeln!(f, "--- Latency ---")?;
        writeln!(f, "Median:            {} us", self.median_latency_us)?;
        writeln!(f)?;
        writeln!(f, "--- Distribution ---")?;
        writeln!(f, "Unique Addresses:  {}", self.unique_addresses)?;
        writeln!(f, "Unique Usernames:  {}", self.unique_usernames)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        let mut metrics = AttackMetrics::new();

        metrics.record(Outcome::Allowed, "10.0.0.1", "alice", Duration::from_micros(100));
        metrics.record(Outcome::Allowed, "10.0.0.1", "bob", Duration::from_micros(150));
        metrics.record(Outcome::RateLimited, "10.0.0.1", "carol", Duration::from_micros(50));

        let report = metrics.report();
        assert_eq!(report.total_requests, 3);
        assert_eq!(report.allowed, 2);
        assert_eq!(report.rate_limited, 1);
        assert_eq!(report.unique_addresses, 1);
        assert_eq!(report.unique_usernames, 3);
        assert_eq!(report.median_latency_us, 100);
    }

    #[test]
    fn test_block_rate() {
        let mut metrics = AttackMetrics::new();
        for _ in 0..3 {
            metrics.record(Outcome::Allowed, "10.0.0.1", "alice", Duration::ZERO);
        }
        for _ in 0..7 {
            metrics.record(Outcome::Suspended, "10.0.0.1", "alice", Duration::ZERO);
        }

        assert!((metrics.block_rate() - 0.7).abs() < 0.01);
    }
}
