//! Location locking for binlock.
//!
//! A lock is a lease on one warehouse location: while it is active, only its
//! holder may work on that location. The lock is stored as an attribute of
//! the location record in the registry and is changed only through
//! [`LocationLockManager`].
//!
//! # Lease Model
//!
//! - `acquire` grants a free location, refreshes the caller's own lease, or
//!   takes over a lease whose age exceeds the lease duration
//! - `release` clears the caller's own lease
//! - `force_release` clears any lease (permission checked by the caller)
//! - `list_active` reports unexpired leases only
//!
//! # Store Mutex
//!
//! Mutations are serialized by `.binlock/store.mutex`, a file created with
//! `create_new` semantics and removed by an RAII guard. Mutexes left behind
//! by crashed processes are broken after `store_mutex_stale_seconds`.

mod manager;
mod mutex;
mod record;
mod types;

#[cfg(test)]
mod tests;

// Re-export public API
pub use manager::LocationLockManager;
pub use mutex::{MutexMetadata, StoreMutexGuard, acquire_store_mutex};
pub use record::{LockRecord, is_expired};
pub use types::{AcquireKind, LeaseToken, LockInfo};
