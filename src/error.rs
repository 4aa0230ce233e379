// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the relay abuse gate.

use thiserror::Error;

/// Request validation errors. Raised before any store access.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Keyed state store failures.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store operation timed out: {0}")]
    Timeout(String),

    #[error("Failed to encode value for {key}: {reason}")]
    Encode { key: String, reason: String },
}

/// Gate error types.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Record store failure: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Record update lost to concurrent writers after {attempts} attempts")]
    Contention { attempts: u32 },
}

impl GateError {
    /// Whether the caller may retry the same request later.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Validation(_))
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::StoreUnavailable(_) => "store",
            Self::Contention { .. } => "contention",
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, GateError>;
