//! Error types for binlock.
//!
//! Uses thiserror for derive macros. Lease conflicts carry structured data so
//! callers can tell the user who holds a location and since when.

use crate::exit_codes;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Main error type for binlock operations.
#[derive(Error, Debug)]
pub enum BinlockError {
    /// Invalid arguments, invalid configuration, or an uninitialized store.
    #[error("{0}")]
    UserError(String),

    /// The referenced location does not exist in the registry.
    #[error("location not found: {0}")]
    LocationNotFound(String),

    /// Another user holds an unexpired lease on the location.
    #[error("location '{location_id}' is locked by {holder} since {}", format_timestamp(.locked_at))]
    LockHeld {
        location_id: String,
        holder: String,
        locked_at: DateTime<Utc>,
    },

    /// The requester tried to release a lease it does not hold.
    #[error("{requester} does not hold the lock on '{location_id}' ({})", describe_holder(.holder))]
    NotLockHolder {
        location_id: String,
        requester: String,
        holder: Option<String>,
    },

    /// A forced release targeted a location with no lock.
    #[error("location '{0}' has no lock to release")]
    LockNotFound(String),

    /// Reading, parsing, or writing the backing store failed.
    #[error("store error: {0}")]
    StoreError(String),

    /// The caller is not allowed to perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

impl BinlockError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            BinlockError::UserError(_) => exit_codes::USER_ERROR,
            BinlockError::LocationNotFound(_) | BinlockError::LockNotFound(_) => {
                exit_codes::NOT_FOUND
            }
            BinlockError::StoreError(_) => exit_codes::STORE_FAILURE,
            BinlockError::LockHeld { .. } | BinlockError::NotLockHolder { .. } => {
                exit_codes::LOCK_FAILURE
            }
            BinlockError::PermissionDenied(_) => exit_codes::PERMISSION_DENIED,
        }
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn describe_holder(holder: &Option<String>) -> String {
    match holder {
        Some(h) => format!("held by {}", h),
        None => "not locked".to_string(),
    }
}

/// Result type alias for binlock operations.
pub type Result<T> = std::result::Result<T, BinlockError>;
