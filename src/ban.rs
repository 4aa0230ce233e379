// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Administrator-maintained ban list.
//!
//! The list lives in the keyed store as a JSON array of address strings and
//! is read fresh for every evaluation. A missing or unreadable list counts
//! as empty: bans sit on top of rate limiting, they are not the only
//! defence.

use crate::store::{KeyValueStore, BAN_LIST_KEY};
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// Snapshot of banned addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BanList {
    addresses: HashSet<String>,
}

impl BanList {
    /// Load the current list. Never fails; problems yield an empty list.
    pub async fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(BAN_LIST_KEY).await {
            Ok(Some(stored)) => Self::from_value(&stored.value).unwrap_or_else(|| {
                warn!(key = BAN_LIST_KEY, "Ban list is not an array of strings, ignoring");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(err) => {
                warn!(key = BAN_LIST_KEY, error = %err, "Ban list unavailable, treating as empty");
                Self::default()
            }
        }
    }

    /// Parse a stored list. Non-string entries make the whole list invalid.
    pub fn from_value(value: &Value) -> Option<Self> {
        let entries = value.as_array()?;
        let mut addresses = HashSet::with_capacity(entries.len());
        for entry in entries {
            addresses.insert(entry.as_str()?.trim().to_string());
        }
        Some(Self { addresses })
    }

    pub fn is_banned(&self, address: &str) -> bool {
        self.addresses.contains(address)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for BanList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            addresses: iter.into_iter().map(Into::into).collect(),
        }
    }
}
