// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Keyed state store used for the ban list and per-address abuse records.
//!
//! Every stored value carries a version that increases on each write, so
//! callers can do read, compute, compare-and-swap instead of a blind
//! read-modify-write.

use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Store key holding the administrator-maintained ban list.
pub const BAN_LIST_KEY: &str = "ban-list";

/// Store key for one address's composite abuse record.
pub fn record_key(address: &str) -> String {
    format!("record:{address}")
}

/// A stored value together with its write version.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned {
    pub value: Value,
    pub version: u64,
}

/// Trait for keyed state backends.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Absent keys are `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<Versioned>, StoreError>;

    /// Unconditionally write a value.
    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Write `value` only if the stored version still equals `expected`
    /// (`None` meaning the key must be absent). Returns `false` on conflict.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<u64>,
        value: Value,
    ) -> Result<bool, StoreError>;
}

/// In-memory store for single-instance deployments and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Versioned>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn contains_key(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Versioned>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let version = entries.get(key).map_or(1, |e| e.version + 1);
        entries.insert(key.to_string(), Versioned { value, version });
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<u64>,
        value: Value,
    ) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        let current = entries.get(key).map(|e| e.version);
        if current != expected {
            return Ok(false);
        }
        let version = current.map_or(1, |v| v + 1);
        entries.insert(key.to_string(), Versioned { value, version });
        Ok(true)
    }
}
