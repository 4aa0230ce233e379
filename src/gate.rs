// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Abuse gate: one decision per inbound message.
//!
//! Order of checks for `evaluate`:
//!
//! 1. Ban list. A banned address never touches its record.
//! 2. Suspension of the address or of the (address, username) pair. A
//!    suspended sender is rejected without counting the attempt.
//! 3. Fixed-window counting on both scopes. A violation on either scope
//!    suspends both for `window * max(address count, user count)`.
//! 4. One compare-and-swap write of the whole record, retried from step 2
//!    when another request wrote the record in between.

use crate::ban::BanList;
use crate::config::{GateConfig, JoinPolicy};
use crate::error::{GateError, Result, StoreError, ValidationError};
use crate::limiter::RateLimiter;
use crate::metrics::GateMetrics;
use crate::record::AbuseRecord;
use crate::store::{record_key, KeyValueStore};
use crate::suspension::{RetryAfter, SuspensionPolicy};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of evaluating one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Address is on the ban list
    Banned,
    /// Address or username is serving an earlier suspension
    Suspended { retry_after: RetryAfter },
    /// This message pushed a scope past the threshold
    RateLimited { retry_after: RetryAfter, count: u32 },
    /// Message may be relayed
    Allowed,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Time until the sender may try again, for suspensions.
    pub fn retry_after(&self) -> Option<RetryAfter> {
        match *self {
            Self::Suspended { retry_after } | Self::RateLimited { retry_after, .. } => {
                Some(retry_after)
            }
            Self::Banned | Self::Allowed => None,
        }
    }

    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Banned => "banned",
            Self::Suspended { .. } => "suspended",
            Self::RateLimited { .. } => "rate_limited",
            Self::Allowed => "allowed",
        }
    }

    /// Human-readable reason shown to the sender.
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Banned => Some("Your address is banned from sending messages".to_string()),
            Self::Suspended { retry_after } => Some(format!(
                "You are suspended from sending messages. Please check back in {retry_after}"
            )),
            Self::RateLimited { retry_after, .. } => Some(format!(
                "Rate limit exceeded, you are suspended from sending messages. Please check back in {retry_after}"
            )),
            Self::Allowed => None,
        }
    }
}

enum Step {
    /// Decided without changing the record
    Reject(Decision),
    /// Record was changed and must be written before answering
    Commit(Decision),
}

/// Gate over a shared keyed store.
pub struct AbuseGate {
    store: Arc<dyn KeyValueStore>,
    limiter: RateLimiter,
    suspension: SuspensionPolicy,
    config: GateConfig,
    metrics: Option<GateMetrics>,
}

impl AbuseGate {
    pub fn new(store: Arc<dyn KeyValueStore>, config: GateConfig) -> Self {
        Self {
            store,
            limiter: RateLimiter::new(config.window(), config.threshold),
            suspension: SuspensionPolicy::new(config.window()),
            config,
            metrics: None,
        }
    }

    /// Count failures the gate absorbs itself, such as fail-closed denials.
    pub fn with_metrics(mut self, metrics: GateMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Decide whether `username` at `address` may send a message at `now`
    /// (milliseconds since the epoch).
    ///
    /// Not idempotent: every non-rejected call counts as one message.
    pub async fn evaluate(&self, address: &str, username: &str, now: u64) -> Result<Decision> {
        let (address, username) = validate(address, username)?;

        let bans = BanList::load(self.store.as_ref()).await;
        if bans.is_banned(address) {
            warn!(%address, %username, "Banned address attempted to send");
            return Ok(Decision::Banned);
        }

        let key = record_key(address);
        let attempts = self.config.max_cas_retries.max(1);
        for attempt in 1..=attempts {
            let (mut record, version) = match self.load(&key).await {
                Ok(loaded) => loaded,
                Err(err) if self.config.fail_closed => {
                    warn!(%address, error = %err, "Record store unreadable, denying");
                    if let Some(metrics) = &self.metrics {
                        metrics.observe_error(&GateError::from(err));
                    }
                    return Ok(Decision::Suspended {
                        retry_after: RetryAfter::from_duration(self.config.window()),
                    });
                }
                Err(err) => return Err(err.into()),
            };

            let decision = match self.apply(&mut record, username, now) {
                Step::Reject(decision) => {
                    debug!(%address, %username, decision = decision.label(), "Rejected before counting");
                    return Ok(decision);
                }
                Step::Commit(decision) => decision,
            };

            if self.commit(&key, version, &record).await? {
                match decision {
                    Decision::RateLimited { retry_after, count } => info!(
                        %address,
                        %username,
                        count,
                        retry_after_secs = retry_after.as_secs(),
                        "Threshold exceeded, suspending address and user"
                    ),
                    _ => debug!(%address, %username, count = record.window.count, "Message allowed"),
                }
                return Ok(decision);
            }
            debug!(%address, attempt, "Record changed concurrently, retrying");
        }

        warn!(%address, attempts, "Gave up after repeated write conflicts");
        Err(GateError::Contention { attempts })
    }

    /// Record that `username` declared presence from `address`.
    ///
    /// Returns the join time now stored. Joining neither counts as a message
    /// nor consults the ban list.
    pub async fn join(&self, address: &str, username: &str, now: u64) -> Result<u64> {
        let (address, username) = validate(address, username)?;
        let key = record_key(address);
        let attempts = self.config.max_cas_retries.max(1);

        for _ in 0..attempts {
            let (mut record, version) = self.load(&key).await?;
            let user = record.users.entry(username.to_string()).or_default();

            let join_time = match (self.config.join_policy, user.join_time) {
                (JoinPolicy::Preserve, Some(existing)) => existing,
                _ => now,
            };
            if user.join_time == Some(join_time) {
                return Ok(join_time);
            }
            user.join_time = Some(join_time);
            self.prune(&mut record, username);

            if self.commit(&key, version, &record).await? {
                info!(%address, %username, join_time, "User joined");
                return Ok(join_time);
            }
        }

        Err(GateError::Contention { attempts })
    }

    /// Current state for `address`, defaults when nothing is stored.
    pub async fn record(&self, address: &str) -> Result<AbuseRecord> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ValidationError::MissingParameter("address").into());
        }
        let (record, _) = self.load(&record_key(address)).await?;
        Ok(record)
    }

    fn apply(&self, record: &mut AbuseRecord, username: &str, now: u64) -> Step {
        let existing_user = record.users.get(username).map(|u| u.window);
        let address_suspended = self.suspension.is_suspended(&record.window, now);
        let user_suspended = existing_user.is_some_and(|w| self.suspension.is_suspended(&w, now));

        if address_suspended || user_suspended {
            let until = record
                .window
                .suspended_until
                .max(existing_user.map_or(0, |w| w.suspended_until));
            return Step::Reject(Decision::Suspended {
                retry_after: RetryAfter::until(until, now),
            });
        }

        let address_result = self.limiter.evaluate(&mut record.window, now);
        let user = record.users.entry(username.to_string()).or_default();
        let user_result = self.limiter.evaluate(&mut user.window, now);

        let decision = if address_result.is_exceeded() || user_result.is_exceeded() {
            let count = address_result.count().max(user_result.count());
            let user_until = self.suspension.suspend(&mut user.window, now, count);
            let address_until = self.suspension.suspend(&mut record.window, now, count);
            Decision::RateLimited {
                retry_after: RetryAfter::until(address_until.max(user_until), now),
                count,
            }
        } else {
            Decision::Allowed
        };

        self.prune(record, username);
        Step::Commit(decision)
    }

    fn prune(&self, record: &mut AbuseRecord, keep: &str) {
        if let Some(max) = self.config.max_users_per_address {
            let evicted = record.prune_users(max, keep);
            if evicted > 0 {
                debug!(evicted, max, "Evicted idle usernames");
            }
        }
    }

    async fn load(&self, key: &str) -> std::result::Result<(AbuseRecord, Option<u64>), StoreError> {
        let Some(stored) = self.store.get(key).await? else {
            return Ok((AbuseRecord::default(), None));
        };
        let record = AbuseRecord::decode(&stored.value).unwrap_or_else(|err| {
            warn!(%key, error = %err, "Discarding unreadable abuse record");
            AbuseRecord::default()
        });
        Ok((record, Some(stored.version)))
    }

    async fn commit(&self, key: &str, version: Option<u64>, record: &AbuseRecord) -> Result<bool> {
        let value = record.encode().map_err(|err| StoreError::Encode {
            key: key.to_string(),
            reason: err.to_string(),
        })?;
        Ok(self.store.compare_and_swap(key, version, value).await?)
    }
}

fn validate<'a>(
    address: &'a str,
    username: &'a str,
) -> std::result::Result<(&'a str, &'a str), ValidationError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ValidationError::MissingParameter("address"));
    }
    let username = username.trim();
    if username.is_empty() {
        return Err(ValidationError::MissingParameter("username"));
    }
    Ok((address, username))
}
