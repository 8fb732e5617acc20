//! Configuration defaults for binlock.

/// Default lease duration for a location lock, in minutes.
///
/// Matches an idle operator session: a lease untouched for this long is
/// treated as abandoned and may be taken over or swept.
pub const DEFAULT_LEASE_MINUTES: u32 = 30;

/// Default time to wait for another in-flight store mutation, in milliseconds.
pub const DEFAULT_STORE_MUTEX_WAIT_MS: u64 = 5_000;

/// Default age after which a store mutex file is considered abandoned.
pub const DEFAULT_STORE_MUTEX_STALE_SECONDS: u32 = 60;

// Default value functions for serde
pub(crate) fn default_lease_minutes() -> u32 {
    DEFAULT_LEASE_MINUTES
}
pub(crate) fn default_store_mutex_wait_ms() -> u64 {
    DEFAULT_STORE_MUTEX_WAIT_MS
}
pub(crate) fn default_store_mutex_stale_seconds() -> u32 {
    DEFAULT_STORE_MUTEX_STALE_SECONDS
}
pub(crate) fn default_true() -> bool {
    true
}
