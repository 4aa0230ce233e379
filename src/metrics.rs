// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for gate decisions and failures.

use crate::error::GateError;
use crate::gate::Decision;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Gate metrics held in a private registry.
#[derive(Clone)]
pub struct GateMetrics {
    registry: Registry,
    decisions: IntCounterVec,
    failures: IntCounterVec,
}

impl GateMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let decisions = IntCounterVec::new(
            Opts::new("relay_gate_decisions_total", "Gate decisions by outcome"),
            &["decision"],
        )?;
        let failures = IntCounterVec::new(
            Opts::new(
                "relay_gate_failures_total",
                "Evaluations that returned no decision, by error kind",
            ),
            &["kind"],
        )?;

        registry.register(Box::new(decisions.clone()))?;
        registry.register(Box::new(failures.clone()))?;

        Ok(Self {
            registry,
            decisions,
            failures,
        })
    }

    pub fn observe(&self, decision: &Decision) {
        self.decisions.with_label_values(&[decision.label()]).inc();
    }

    pub fn observe_error(&self, err: &GateError) {
        self.failures.with_label_values(&[err.kind()]).inc();
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }
}
