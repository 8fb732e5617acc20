//! Exit code constants for the binlock CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config, store not initialized)
//! - 2: Location or lock not found
//! - 3: Store failure (I/O, parse errors, busy store)
//! - 4: Lock conflict (held by another user, or caller is not the holder)
//! - 5: Permission denied

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid config, or uninitialized store.
pub const USER_ERROR: i32 = 1;

/// The referenced location or lock does not exist.
pub const NOT_FOUND: i32 = 2;

/// Reading or writing the backing store failed.
pub const STORE_FAILURE: i32 = 3;

/// Lease conflict: the location is held by someone else.
pub const LOCK_FAILURE: i32 = 4;

/// Caller lacks the permission required for the operation.
pub const PERMISSION_DENIED: i32 = 5;
