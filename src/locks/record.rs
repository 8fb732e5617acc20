//! The lock attribute stored on a location record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A lease on one location: who holds it and since when.
///
/// The expiry time is not stored; it is always `locked_at + lease`, with the
/// lease duration taken from the current configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Holder of the lease.
    pub locked_by: String,

    /// When the lease was acquired or last refreshed.
    pub locked_at: DateTime<Utc>,
}

impl LockRecord {
    pub fn new(locked_by: impl Into<String>, locked_at: DateTime<Utc>) -> Self {
        Self {
            locked_by: locked_by.into(),
            locked_at,
        }
    }

    /// When the lease runs out.
    pub fn expires_at(&self, lease: Duration) -> DateTime<Utc> {
        self.locked_at + lease
    }

    /// See [`is_expired`].
    pub fn is_expired(&self, now: DateTime<Utc>, lease: Duration) -> bool {
        is_expired(self, now, lease)
    }

    /// Age of the lease at `now` (negative if the clock went backwards).
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.locked_at)
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self, now: DateTime<Utc>) -> String {
        let age = self.age(now);
        let minutes = age.num_minutes().max(0);
        let hours = age.num_hours().max(0);
        let days = age.num_days().max(0);

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else {
            format!("{}m", minutes)
        }
    }
}

/// Whether a lease has outlived the lease duration: `now - locked_at > lease`.
///
/// A lock exactly `lease` old is still active.
pub fn is_expired(lock: &LockRecord, now: DateTime<Utc>, lease: Duration) -> bool {
    now.signed_duration_since(lock.locked_at) > lease
}
