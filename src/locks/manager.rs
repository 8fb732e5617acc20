//! Location lease operations.
//!
//! Every mutation is one read-modify-write of the registry under the store
//! mutex: load, decide from the freshly loaded lock attribute, save
//! atomically, append audit events, unlock. Nothing is cached between calls,
//! so several processes (or hosts sharing the store directory) see the same
//! authoritative state.
//!
//! Expiry is lazy: a lease older than the lease duration is treated as absent
//! by `acquire` and hidden by `list_active`. [`LocationLockManager::sweep_expired`]
//! clears such records explicitly.

use super::mutex::acquire_store_mutex;
use super::record::LockRecord;
use super::types::{AcquireKind, LeaseToken, LockInfo};
use crate::config::Config;
use crate::context::StoreContext;
use crate::error::{BinlockError, Result};
use crate::events::{Event, EventAction, record_event};
use crate::locations::Registry;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

/// Grants, refreshes, and releases leases on warehouse locations.
#[derive(Debug, Clone)]
pub struct LocationLockManager {
    ctx: StoreContext,
    lease: Duration,
    mutex_wait: std::time::Duration,
    mutex_stale_after: Duration,
    audit_events: bool,
}

impl LocationLockManager {
    pub fn new(ctx: StoreContext, config: &Config) -> Self {
        Self {
            ctx,
            lease: config.lease_duration(),
            mutex_wait: config.store_mutex_wait(),
            mutex_stale_after: config.store_mutex_stale_after(),
            audit_events: config.audit_events,
        }
    }

    pub fn lease_duration(&self) -> Duration {
        self.lease
    }

    pub fn context(&self) -> &StoreContext {
        &self.ctx
    }

    /// Whether `lock` has expired at `now` under this manager's lease duration.
    pub fn is_expired(&self, lock: &LockRecord, now: DateTime<Utc>) -> bool {
        lock.is_expired(now, self.lease)
    }

    /// Acquire or refresh the lease on `location_id` for `user`, using the wall clock.
    pub fn acquire(&self, location_id: &str, user: &str) -> Result<LeaseToken> {
        self.acquire_at(location_id, user, Utc::now())
    }

    /// Acquire or refresh the lease on `location_id` for `user` at `now`.
    ///
    /// - free location, or another user's expired lease: `user` becomes holder
    /// - lease already held by `user`: refreshed, `locked_at` moves to `now`
    /// - unexpired lease held by someone else: [`BinlockError::LockHeld`]
    pub fn acquire_at(
        &self,
        location_id: &str,
        user: &str,
        now: DateTime<Utc>,
    ) -> Result<LeaseToken> {
        let user = require_user(user)?;
        let lease = self.lease;

        self.mutate(user, "acquire", |registry| {
            let location = registry.require_mut(location_id)?;

            let (kind, action, previous) = match &location.lock {
                None => (AcquireKind::Acquired, EventAction::Acquire, None),
                Some(lock) if lock.locked_by == user => {
                    (AcquireKind::Refreshed, EventAction::Refresh, Some(lock.clone()))
                }
                Some(lock) if lock.is_expired(now, lease) => (
                    AcquireKind::TookOver {
                        previous_holder: lock.locked_by.clone(),
                    },
                    EventAction::Takeover,
                    Some(lock.clone()),
                ),
                Some(lock) => {
                    return Err(BinlockError::LockHeld {
                        location_id: location_id.to_string(),
                        holder: lock.locked_by.clone(),
                        locked_at: lock.locked_at,
                    });
                }
            };

            // A refresh never moves the lease backwards, even if this
            // caller's clock is behind the one that wrote the record.
            let locked_at = match (&kind, &previous) {
                (AcquireKind::Refreshed, Some(prev)) => now.max(prev.locked_at),
                _ => now,
            };
            location.lock = Some(LockRecord::new(user, locked_at));

            let token = LeaseToken {
                location_id: location_id.to_string(),
                holder: user.to_string(),
                locked_at,
                expires_at: locked_at + lease,
                kind,
            };

            let mut details = json!({ "expires_at": token.expires_at });
            if let Some(prev) = &previous {
                details["previous_holder"] = json!(prev.locked_by);
                details["previous_locked_at"] = json!(prev.locked_at);
            }
            let event = Event::new(action, user)
                .at(now)
                .with_location(location_id)
                .with_details(details);

            tracing::info!(
                location = location_id,
                holder = user,
                kind = ?token.kind,
                "lease granted"
            );
            Ok((token, vec![event]))
        })
    }

    /// Release `user`'s lease on `location_id`, using the wall clock.
    pub fn release(&self, location_id: &str, user: &str) -> Result<()> {
        self.release_at(location_id, user, Utc::now())
    }

    /// Release `user`'s lease on `location_id`.
    ///
    /// Fails with [`BinlockError::NotLockHolder`] unless `user` is the
    /// recorded holder. The holder may release even after expiry.
    pub fn release_at(&self, location_id: &str, user: &str, now: DateTime<Utc>) -> Result<()> {
        let user = require_user(user)?;

        self.mutate(user, "release", |registry| {
            let location = registry.require_mut(location_id)?;

            let held_since = match &location.lock {
                Some(lock) if lock.locked_by == user => lock.locked_at,
                other => {
                    return Err(BinlockError::NotLockHolder {
                        location_id: location_id.to_string(),
                        requester: user.to_string(),
                        holder: other.as_ref().map(|l| l.locked_by.clone()),
                    });
                }
            };
            location.lock = None;

            let event = Event::new(EventAction::Release, user)
                .at(now)
                .with_location(location_id)
                .with_details(json!({ "locked_at": held_since }));

            tracing::info!(location = location_id, holder = user, "lease released");
            Ok(((), vec![event]))
        })
    }

    /// Administrative release, using the wall clock.
    pub fn force_release(&self, location_id: &str, actor: &str) -> Result<LockInfo> {
        self.force_release_at(location_id, actor, Utc::now())
    }

    /// Clear the lock on `location_id` regardless of holder or expiry.
    ///
    /// Permission to do so is the caller's responsibility; `actor` is only
    /// recorded in the audit log. Returns the cleared lock. Fails with
    /// [`BinlockError::LockNotFound`] when the location has no lock.
    pub fn force_release_at(
        &self,
        location_id: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<LockInfo> {
        let actor = require_user(actor)?;
        let lease = self.lease;

        self.mutate(actor, "force_release", |registry| {
            let location = registry.require_mut(location_id)?;
            let Some(lock) = location.lock.take() else {
                return Err(BinlockError::LockNotFound(location_id.to_string()));
            };
            let cleared = LockInfo::new(location, &lock, now, lease);

            let event = Event::new(EventAction::ForceRelease, actor)
                .at(now)
                .with_location(location_id)
                .with_details(json!({
                    "holder": cleared.locked_by,
                    "locked_at": cleared.locked_at,
                    "age_minutes": lock.age(now).num_minutes(),
                    "was_expired": cleared.is_expired,
                }));

            tracing::info!(
                location = location_id,
                holder = %cleared.locked_by,
                actor,
                "lease force-released"
            );
            Ok((cleared, vec![event]))
        })
    }

    /// Unexpired locks right now.
    pub fn list_active(&self) -> Result<Vec<LockInfo>> {
        self.list_active_at(Utc::now())
    }

    /// Every location holding an unexpired lock at `now`, ordered by location id.
    pub fn list_active_at(&self, now: DateTime<Utc>) -> Result<Vec<LockInfo>> {
        Ok(self
            .list_all_at(now)?
            .into_iter()
            .filter(|info| !info.is_expired)
            .collect())
    }

    /// Every recorded lock right now, expired ones included.
    pub fn list_all(&self) -> Result<Vec<LockInfo>> {
        self.list_all_at(Utc::now())
    }

    /// Every recorded lock at `now`, with expired ones flagged.
    pub fn list_all_at(&self, now: DateTime<Utc>) -> Result<Vec<LockInfo>> {
        let registry = Registry::load(&self.ctx)?;
        let locks: Vec<LockInfo> = registry
            .iter()
            .filter_map(|location| {
                location
                    .lock
                    .as_ref()
                    .map(|lock| LockInfo::new(location, lock, now, self.lease))
            })
            .collect();

        tracing::debug!(count = locks.len(), "listed locks");
        Ok(locks)
    }

    /// Current lock on one location.
    pub fn status(&self, location_id: &str) -> Result<Option<LockInfo>> {
        self.status_at(location_id, Utc::now())
    }

    /// Lock recorded on `location_id` at `now`, if any (expired ones flagged).
    pub fn status_at(&self, location_id: &str, now: DateTime<Utc>) -> Result<Option<LockInfo>> {
        let registry = Registry::load(&self.ctx)?;
        let location = registry.require(location_id)?;
        Ok(location
            .lock
            .as_ref()
            .map(|lock| LockInfo::new(location, lock, now, self.lease)))
    }

    /// Sweep expired locks, using the wall clock.
    pub fn sweep_expired(&self, actor: &str) -> Result<Vec<LockInfo>> {
        self.sweep_expired_at(actor, Utc::now())
    }

    /// Clear every lock that has expired at `now` and return what was cleared.
    ///
    /// Unexpired locks are untouched. Nothing is written when nothing expired.
    pub fn sweep_expired_at(&self, actor: &str, now: DateTime<Utc>) -> Result<Vec<LockInfo>> {
        let actor = require_user(actor)?;
        let lease = self.lease;

        self.mutate(actor, "sweep", |registry| {
            let mut cleared = Vec::new();
            let mut events = Vec::new();

            for location in registry.iter_mut() {
                let Some(lock) = location.lock.as_ref() else {
                    continue;
                };
                if !lock.is_expired(now, lease) {
                    continue;
                }

                let info = LockInfo::new(location, lock, now, lease);
                location.lock = None;

                events.push(
                    Event::new(EventAction::Sweep, actor)
                        .at(now)
                        .with_location(info.location_id.clone())
                        .with_details(json!({
                            "holder": info.locked_by,
                            "locked_at": info.locked_at,
                            "expired_at": info.expires_at,
                        })),
                );
                cleared.push(info);
            }

            if !cleared.is_empty() {
                tracing::info!(count = cleared.len(), "swept expired leases");
            }
            Ok((cleared, events))
        })
    }

    /// Run one read-modify-write cycle under the store mutex.
    ///
    /// `apply` returns its result plus the audit events describing the
    /// change. The registry is saved only when there are events, i.e. when
    /// something changed. On error nothing is written.
    fn mutate<T>(
        &self,
        actor: &str,
        action: &str,
        apply: impl FnOnce(&mut Registry) -> Result<(T, Vec<Event>)>,
    ) -> Result<T> {
        let guard = acquire_store_mutex(
            &self.ctx,
            actor,
            action,
            self.mutex_wait,
            self.mutex_stale_after,
        )?;

        let mut registry = Registry::load(&self.ctx)?;
        let (value, events) = apply(&mut registry)?;

        if !events.is_empty() {
            registry.save(&self.ctx)?;
            if self.audit_events {
                for event in &events {
                    record_event(&self.ctx, event);
                }
            }
        }

        guard.release()?;
        Ok(value)
    }
}

fn require_user(user: &str) -> Result<&str> {
    let user = user.trim();
    if user.is_empty() {
        return Err(BinlockError::UserError(
            "a user identity is required".to_string(),
        ));
    }
    Ok(user)
}
