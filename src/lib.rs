// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Relay Abuse Gate
//!
//! This crate decides, per inbound chat message, whether the sender may
//! proceed, is temporarily suspended, or is permanently blocked:
//!
//! - Administrator ban list, checked first
//! - Fixed-window counting per address and per (address, username)
//! - Escalating suspension of `window * count` on violation
//! - Versioned per-address records written with compare-and-swap
//! - Join-time bookkeeping for message visibility

pub mod ban;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod record;
pub mod store;
pub mod suspension;

pub use ban::BanList;
pub use config::{Config, GateConfig, JoinPolicy};
pub use error::{GateError, StoreError, ValidationError};
pub use gate::{AbuseGate, Decision};
pub use limiter::{RateLimitResult, RateLimiter};
pub use record::{AbuseRecord, UserSubRecord, Window};
pub use store::{KeyValueStore, MemoryStore, Versioned};
pub use suspension::{RetryAfter, SuspensionPolicy};
