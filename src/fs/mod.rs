//! Filesystem utilities for binlock.
//!
//! The registry file is only ever replaced through [`atomic_write_file`], so a
//! crash mid-write leaves either the old or the new registry on disk.

pub mod atomic;

pub use atomic::atomic_write;
pub use atomic::atomic_write_file;
