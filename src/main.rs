// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Relay Abuse Gate Service
//!
//! Guards a chat message relay. The relay calls `/check` with the sender's
//! address and username before storing a message, and `/join` when a user
//! declares presence.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `GATE_PROFILE`: `standard` (60 s window) or `fast` (15 s window)
//! - `GATE_WINDOW_MS`: Window length override in milliseconds
//! - `GATE_THRESHOLD`: Messages per window (default: 5)
//! - `GATE_FAIL_CLOSED`: Deny when the record store is unreadable (default: true)
//! - `GATE_JOIN_POLICY`: `refresh` or `preserve` (default: refresh)
//! - `GATE_MAX_USERS`: Cap on usernames kept per address (default: unlimited)
//! - `METRICS_ENABLED`: Serve Prometheus metrics (default: true)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use relay_abuse_gate::{
    config::Config,
    gate::AbuseGate,
    handlers::{router, AppState},
    metrics::GateMetrics,
    store::MemoryStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        window_ms = config.gate.window_ms,
        threshold = config.gate.threshold,
        fail_closed = config.gate.fail_closed,
        join_policy = ?config.gate.join_policy,
        "Starting relay abuse gate"
    );

    let store = Arc::new(MemoryStore::new());
    let metrics = GateMetrics::new()?;
    let state = Arc::new(AppState {
        gate: AbuseGate::new(store, config.gate.clone()).with_metrics(metrics.clone()),
        metrics,
        config: config.clone(),
    });

    let app = router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
