// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Per-address abuse records and their stored representation.
//!
//! A record is stored under a single composite key per address and holds
//! the address counters plus one sub-record per username seen from that
//! address. Stored form is a versioned envelope:
//!
//! ```json
//! {"version": 1, "record": {"count": 2, "windowStart": 1000, "suspendedUntil": 0, "users": {}}}
//! ```
//!
//! Values without a `version` field are the legacy layout (`lastMessageTime`
//! instead of `windowStart`, every field optional) and are converted field
//! by field.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Current stored schema version.
pub const SCHEMA_VERSION: u64 = 1;

/// Fixed-window counter and suspension state for one scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    /// Messages counted in the current window
    pub count: u32,
    /// Timestamp (ms) of the most recent counted message
    pub window_start: u64,
    /// Sending is refused while `now < suspended_until`
    pub suspended_until: u64,
}

/// State for one username declared from one address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSubRecord {
    #[serde(flatten)]
    pub window: Window,
    /// When the user declared presence; read by message visibility
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_time: Option<u64>,
}

impl UserSubRecord {
    /// Most recent activity, counted message or join.
    pub fn last_active(&self) -> u64 {
        self.window.window_start.max(self.join_time.unwrap_or(0))
    }
}

/// Composite abuse state for one network address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbuseRecord {
    #[serde(flatten)]
    pub window: Window,
    #[serde(default)]
    pub users: BTreeMap<String, UserSubRecord>,
}

/// Why a stored value could not be read as a record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Unsupported record schema version: {0}")]
    UnsupportedVersion(Value),

    #[error("Malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u64,
    record: &'a AbuseRecord,
}

#[derive(Deserialize)]
struct EnvelopeV1 {
    record: AbuseRecord,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyUser {
    count: Option<u32>,
    last_message_time: Option<u64>,
    suspended_until: Option<u64>,
    join_time: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyRecord {
    count: Option<u32>,
    last_message_time: Option<u64>,
    suspended_until: Option<u64>,
    users: Option<HashMap<String, LegacyUser>>,
}

impl From<LegacyUser> for UserSubRecord {
    fn from(legacy: LegacyUser) -> Self {
        Self {
            window: Window {
                count: legacy.count.unwrap_or(0),
                window_start: legacy.last_message_time.unwrap_or(0),
                suspended_until: legacy.suspended_until.unwrap_or(0),
            },
            join_time: legacy.join_time,
        }
    }
}

impl From<LegacyRecord> for AbuseRecord {
    fn from(legacy: LegacyRecord) -> Self {
        Self {
            window: Window {
                count: legacy.count.unwrap_or(0),
                window_start: legacy.last_message_time.unwrap_or(0),
                suspended_until: legacy.suspended_until.unwrap_or(0),
            },
            users: legacy
                .users
                .unwrap_or_default()
                .into_iter()
                .map(|(name, user)| (name, user.into()))
                .collect(),
        }
    }
}

impl AbuseRecord {
    /// Encode as the current versioned envelope.
    pub fn encode(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(EnvelopeRef {
            version: SCHEMA_VERSION,
            record: self,
        })
    }

    /// Decode a stored value, dispatching on its schema version.
    pub fn decode(value: &Value) -> Result<Self, RecordError> {
        match value.get("version") {
            None => {
                let legacy: LegacyRecord = serde_json::from_value(value.clone())?;
                Ok(legacy.into())
            }
            Some(version) if version.as_u64() == Some(SCHEMA_VERSION) => {
                let envelope: EnvelopeV1 = serde_json::from_value(value.clone())?;
                Ok(envelope.record)
            }
            Some(version) => Err(RecordError::UnsupportedVersion(version.clone())),
        }
    }

    /// Evict least-recently-active usernames until at most `max` remain.
    ///
    /// `keep` is never evicted. Returns the number of users removed.
    pub fn prune_users(&mut self, max: usize, keep: &str) -> usize {
        if self.users.len() <= max {
            return 0;
        }

        let mut candidates: Vec<(u64, String)> = self
            .users
            .iter()
            .filter(|(name, _)| name.as_str() != keep)
            .map(|(name, user)| (user.last_active(), name.clone()))
            .collect();
        candidates.sort();

        let excess = self.users.len() - max;
        let mut removed = 0;
        for (_, name) in candidates.into_iter().take(excess) {
            self.users.remove(&name);
            removed += 1;
        }
        removed
    }
}
