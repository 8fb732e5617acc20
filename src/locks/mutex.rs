//! Store mutex: serializes read-modify-write cycles on the registry.
//!
//! The mutex is a file (`.binlock/store.mutex`) created with `create_new`
//! semantics, so exactly one process or thread can hold it. Its JSON body
//! records who holds it and since when; a mutex older than the configured
//! threshold belongs to a crashed process and is broken by the next waiter.
//!
//! Holding the mutex only ever spans one registry load and save, so it is
//! measured in milliseconds. Lease conflicts are never resolved by waiting
//! here: they are decided on the registry contents once the mutex is held.

use crate::context::StoreContext;
use crate::error::{BinlockError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(10);

/// Contents of the mutex file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutexMetadata {
    /// User on whose behalf the mutation runs.
    pub holder: String,

    /// Process ID of the holder.
    pub pid: u32,

    pub created_at: DateTime<Utc>,

    /// Operation in flight (acquire/release/...).
    pub action: String,
}

impl MutexMetadata {
    pub fn new(holder: &str, action: &str) -> Self {
        Self {
            holder: holder.to_string(),
            pid: std::process::id(),
            created_at: Utc::now(),
            action: action.to_string(),
        }
    }

    fn from_file(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            BinlockError::StoreError(format!("failed to serialize mutex metadata: {}", e))
        })
    }
}

/// RAII guard for the store mutex.
///
/// When dropped, the mutex file is deleted. If deletion fails, a warning is
/// logged but no panic occurs.
#[derive(Debug)]
pub struct StoreMutexGuard {
    path: PathBuf,
    released: bool,
}

impl StoreMutexGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the mutex, reporting failure to the caller.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        fs::remove_file(&self.path).map_err(|e| {
            BinlockError::StoreError(format!(
                "failed to release store mutex '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

impl Drop for StoreMutexGuard {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = fs::remove_file(&self.path)
        {
            tracing::warn!(
                "failed to release store mutex '{}': {}",
                self.path.display(),
                e
            );
        }
    }
}

/// Acquire the store mutex, waiting up to `wait` for another holder to finish.
///
/// A mutex file older than `stale_after` is broken and logged.
pub fn acquire_store_mutex(
    ctx: &StoreContext,
    holder: &str,
    action: &str,
    wait: std::time::Duration,
    stale_after: Duration,
) -> Result<StoreMutexGuard> {
    let path = ctx.store_mutex_path();
    let json = MutexMetadata::new(holder, action).to_json()?;
    let deadline = Instant::now() + wait;

    loop {
        match try_create(&path, &json) {
            Ok(()) => {
                tracing::debug!(action, "store mutex acquired");
                return Ok(StoreMutexGuard {
                    path,
                    released: false,
                });
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                if break_if_stale(&path, stale_after)? {
                    continue;
                }
                if Instant::now() >= deadline {
                    let busy_with = match MutexMetadata::from_file(&path) {
                        Some(meta) => format!(" ({} by {}, pid {})", meta.action, meta.holder, meta.pid),
                        None => String::new(),
                    };
                    return Err(BinlockError::StoreError(format!(
                        "store is busy with another operation{}; try again",
                        busy_with
                    )));
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                return Err(BinlockError::StoreError(format!(
                    "failed to create store mutex '{}': {}",
                    path.display(),
                    e
                )));
            }
        }
    }
}

/// Create the mutex file exclusively and write its metadata.
fn try_create(path: &Path, json: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;

    if let Err(e) = file.write_all(json.as_bytes()).and_then(|()| file.sync_all()) {
        let _ = fs::remove_file(path);
        return Err(e);
    }

    Ok(())
}

/// Age of the mutex at `path`, from its metadata or, if that is unreadable
/// (holder crashed between create and write), from the file's mtime.
fn mutex_age(path: &Path) -> Option<(Duration, Option<MutexMetadata>)> {
    if let Some(meta) = MutexMetadata::from_file(path) {
        return Some((Utc::now().signed_duration_since(meta.created_at), Some(meta)));
    }

    let modified: DateTime<Utc> = fs::metadata(path).ok()?.modified().ok()?.into();
    Some((Utc::now().signed_duration_since(modified), None))
}

/// Remove the mutex if it is stale. Returns `true` when the caller should retry
/// creating it right away.
///
/// The file is renamed aside before deletion and re-checked, so a waiter that
/// lost the race to another breaker does not delete a freshly created mutex.
fn break_if_stale(path: &Path, stale_after: Duration) -> Result<bool> {
    let Some((age, meta)) = mutex_age(path) else {
        // Vanished between our create attempt and now.
        return Ok(true);
    };
    if age <= stale_after {
        return Ok(false);
    }

    let aside = path.with_extension(format!(
        "mutex.broken-{}-{}",
        std::process::id(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    match fs::rename(path, &aside) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(e) => {
            return Err(BinlockError::StoreError(format!(
                "failed to break stale store mutex '{}': {}",
                path.display(),
                e
            )));
        }
    }

    let moved = MutexMetadata::from_file(&aside);
    if moved != meta {
        // Someone replaced the stale mutex before our rename; put theirs back.
        if let Err(e) = fs::hard_link(&aside, path) {
            tracing::warn!("failed to restore store mutex '{}': {}", path.display(), e);
        }
        let _ = fs::remove_file(&aside);
        return Ok(false);
    }

    let _ = fs::remove_file(&aside);
    match meta {
        Some(meta) => tracing::warn!(
            holder = %meta.holder,
            pid = meta.pid,
            action = %meta.action,
            "broke stale store mutex ({}s old)",
            age.num_seconds()
        ),
        None => tracing::warn!("broke unreadable stale store mutex ({}s old)", age.num_seconds()),
    }
    Ok(true)
}
