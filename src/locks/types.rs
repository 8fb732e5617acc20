//! Values returned by lock operations.

use super::record::LockRecord;
use crate::locations::Location;
use chrono::{DateTime, Duration, Utc};

/// How an acquisition was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireKind {
    /// The location was free.
    Acquired,
    /// The requester already held the lease; `locked_at` was bumped.
    Refreshed,
    /// Another user's lease had expired and was replaced.
    TookOver { previous_holder: String },
}

/// Proof of a granted lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseToken {
    pub location_id: String,
    pub holder: String,
    pub locked_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub kind: AcquireKind,
}

/// A lock as shown on the admin screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockInfo {
    pub location_id: String,
    pub location_name: String,
    pub location_code: String,
    pub locked_by: String,
    pub locked_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Whether the lease had run out when the snapshot was taken.
    pub is_expired: bool,
}

impl LockInfo {
    pub(super) fn new(
        location: &Location,
        lock: &LockRecord,
        now: DateTime<Utc>,
        lease: Duration,
    ) -> Self {
        Self {
            location_id: location.id.clone(),
            location_name: location.name.clone(),
            location_code: location.code.clone(),
            locked_by: lock.locked_by.clone(),
            locked_at: lock.locked_at,
            expires_at: lock.expires_at(lease),
            is_expired: lock.is_expired(now, lease),
        }
    }

    /// The lock record this entry was built from.
    pub fn record(&self) -> LockRecord {
        LockRecord::new(self.locked_by.clone(), self.locked_at)
    }
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {} (locked by {} at {}{})",
            self.location_id,
            self.location_code,
            self.location_name,
            self.locked_by,
            self.locked_at.format("%Y-%m-%d %H:%M:%S UTC"),
            if self.is_expired { ", STALE" } else { "" }
        )
    }
}
