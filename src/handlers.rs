// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the relay abuse gate service.
//!
//! The relay calls `/check` before storing a message and `/join` when a
//! user declares presence. Decisions are returned with status 200 so the
//! caller can always read the body; only malformed requests and store
//! failures use error statuses.

use crate::config::Config;
use crate::error::GateError;
use crate::gate::{AbuseGate, Decision};
use crate::metrics::GateMetrics;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Shared application state.
pub struct AppState {
    pub gate: AbuseGate,
    pub metrics: GateMetrics,
    pub config: Config,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Gate check request. `timestamp` defaults to the current time.
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

/// Gate check response.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub decision: &'static str,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    /// Humanized retry duration, e.g. "6 minute(s) and 0 second(s)"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<String>,
}

impl From<Decision> for CheckResponse {
    fn from(decision: Decision) -> Self {
        let retry_after = decision.retry_after();
        Self {
            decision: decision.label(),
            allowed: decision.is_allowed(),
            reason: decision.reason(),
            retry_after_secs: retry_after.map(|r| r.as_secs()),
            retry_after: retry_after.map(|r| r.to_string()),
        }
    }
}

/// Presence declaration.
#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct JoinResponse {
    pub username: String,
    pub join_time: u64,
    pub message: String,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/check", post(check))
        .route("/join", post(join));

    if state.config.metrics.enabled {
        let path = state.config.metrics.path.clone();
        router = router.route(&path, get(metrics));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "relay-abuse-gate",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Evaluate one outbound message against the gate.
pub async fn check(State(state): State<Arc<AppState>>, Json(req): Json<CheckRequest>) -> Response {
    let now = req.timestamp.unwrap_or_else(now_millis);
    debug!(address = %req.address, username = %req.username, now, "Processing gate check");

    match state.gate.evaluate(&req.address, &req.username, now).await {
        Ok(decision) => {
            state.metrics.observe(&decision);
            let retry_after = decision.retry_after();
            let body = Json(CheckResponse::from(decision));
            match retry_after {
                Some(retry) => (
                    StatusCode::OK,
                    [(header::RETRY_AFTER, retry.as_secs().to_string())],
                    body,
                )
                    .into_response(),
                None => (StatusCode::OK, body).into_response(),
            }
        }
        Err(err) => {
            state.metrics.observe_error(&err);
            error_response(&err)
        }
    }
}

/// Stamp a user's join time.
pub async fn join(State(state): State<Arc<AppState>>, Json(req): Json<JoinRequest>) -> Response {
    let now = now_millis();

    match state.gate.join(&req.address, &req.username, now).await {
        Ok(join_time) => {
            let username = req.username.trim().to_string();
            info!(address = %req.address, %username, join_time, "Join recorded");
            (
                StatusCode::OK,
                Json(JoinResponse {
                    message: format!("[{username}] has joined the chat"),
                    username,
                    join_time,
                }),
            )
                .into_response()
        }
        Err(err) => {
            state.metrics.observe_error(&err);
            error_response(&err)
        }
    }
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            warn!(error = %err, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn error_response(err: &GateError) -> Response {
    match err {
        GateError::Validation(inner) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: inner.to_string(),
                code: "INVALID_REQUEST",
            }),
        )
            .into_response(),
        _ => {
            // No abuse state in the body, the caller only learns to retry
            warn!(error = %err, kind = err.kind(), "Gate request failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: "Temporarily unavailable, please retry".to_string(),
                    code: "UNAVAILABLE",
                }),
            )
                .into_response()
        }
    }
}

fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}
