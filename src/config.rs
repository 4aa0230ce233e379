// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the relay abuse gate.
//!
//! Two deployment profiles exist: `standard` (60 second window) and `fast`
//! (15 second window). Both use a threshold of 5 messages per window.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the relay abuse gate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Gate policy configuration
    #[serde(default)]
    pub gate: GateConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Whether a repeated join moves a user's join time forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinPolicy {
    /// Every join stamps the current time.
    Refresh,
    /// The first join time is kept.
    Preserve,
}

impl std::str::FromStr for JoinPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "refresh" => Ok(Self::Refresh),
            "preserve" => Ok(Self::Preserve),
            other => Err(format!("unknown join policy: {other}")),
        }
    }
}

/// Gate policy: window length, threshold and failure handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Fixed window length in milliseconds (default: 60000)
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Messages allowed per window before a violation (default: 5)
    #[serde(default = "default_threshold")]
    pub threshold: u32,

    /// Deny when the record store cannot be read (default: true)
    #[serde(default = "default_true")]
    pub fail_closed: bool,

    /// Join time refresh policy (default: refresh)
    #[serde(default = "default_join_policy")]
    pub join_policy: JoinPolicy,

    /// Cap on usernames kept per address; `None` keeps all of them
    #[serde(default)]
    pub max_users_per_address: Option<usize>,

    /// Compare-and-swap attempts before giving up (default: 8)
    #[serde(default = "default_max_cas_retries")]
    pub max_cas_retries: u32,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_threshold() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_join_policy() -> JoinPolicy {
    JoinPolicy::Refresh
}

fn default_max_cas_retries() -> u32 {
    8
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            gate: GateConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl GateConfig {
    /// One minute window, five messages.
    pub fn standard() -> Self {
        Self {
            window_ms: default_window_ms(),
            threshold: default_threshold(),
            fail_closed: default_true(),
            join_policy: default_join_policy(),
            max_users_per_address: None,
            max_cas_retries: default_max_cas_retries(),
        }
    }

    /// Fifteen second window, five messages.
    pub fn fast() -> Self {
        Self {
            window_ms: 15_000,
            ..Self::standard()
        }
    }

    /// Get the window duration
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parse_var<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            lookup(key).and_then(|v| v.trim().parse().ok())
        }

        let mut gate = match lookup("GATE_PROFILE").as_deref().map(str::trim) {
            Some("fast") => GateConfig::fast(),
            _ => GateConfig::standard(),
        };
        if let Some(window_ms) = parse_var(&lookup, "GATE_WINDOW_MS") {
            gate.window_ms = window_ms;
        }
        if let Some(threshold) = parse_var(&lookup, "GATE_THRESHOLD") {
            gate.threshold = threshold;
        }
        if let Some(fail_closed) = parse_var(&lookup, "GATE_FAIL_CLOSED") {
            gate.fail_closed = fail_closed;
        }
        if let Some(join_policy) = parse_var(&lookup, "GATE_JOIN_POLICY") {
            gate.join_policy = join_policy;
        }
        if let Some(max_users) = parse_var(&lookup, "GATE_MAX_USERS") {
            gate.max_users_per_address = Some(max_users);
        }

        let mut metrics = MetricsConfig::default();
        if let Some(enabled) = parse_var(&lookup, "METRICS_ENABLED") {
            metrics.enabled = enabled;
        }

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(default_bind_addr),
            gate,
            metrics,
        }
    }
}
