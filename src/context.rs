//! Store context resolution for binlock.
//!
//! Finds the `.binlock/` store directory and resolves every path inside it.
//! All commands go through this module so that they target the same store
//! regardless of which subdirectory they are invoked from.

use crate::error::{BinlockError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Name of the store directory created by `binlock init`.
pub const STORE_DIR_NAME: &str = ".binlock";

/// Resolved paths for a binlock store. All paths are absolute when the
/// context was resolved from an absolute directory.
#[derive(Debug, Clone)]
pub struct StoreContext {
    /// Directory that contains `.binlock/`.
    pub root: PathBuf,

    /// The `.binlock/` directory itself.
    pub store_dir: PathBuf,
}

impl StoreContext {
    /// Build a context rooted at `root` without checking that it exists.
    pub fn at<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let store_dir = root.join(STORE_DIR_NAME);
        Self { root, store_dir }
    }

    /// Resolve the store used by commands.
    ///
    /// With an explicit root, `.binlock/` must exist directly under it.
    /// Otherwise the current directory and its ancestors are searched.
    pub fn resolve(root: Option<&Path>) -> Result<Self> {
        let ctx = match root {
            Some(root) => Self::at(root),
            None => {
                let cwd = current_dir()?;
                Self::discover_from(&cwd).unwrap_or_else(|| Self::at(&cwd))
            }
        };
        ctx.ensure_initialized()?;
        Ok(ctx)
    }

    /// Resolve the location a new store should be created in.
    pub fn resolve_for_init(root: Option<&Path>) -> Result<Self> {
        match root {
            Some(root) => Ok(Self::at(root)),
            None => Ok(Self::at(current_dir()?)),
        }
    }

    /// Search `start` and its ancestors for a `.binlock/` directory.
    pub fn discover_from(start: &Path) -> Option<Self> {
        start
            .ancestors()
            .find(|dir| dir.join(STORE_DIR_NAME).is_dir())
            .map(Self::at)
    }

    /// Check if the store directory exists.
    pub fn is_initialized(&self) -> bool {
        self.store_dir.is_dir()
    }

    /// Return an error guiding the user to `binlock init` if the store is missing.
    pub fn ensure_initialized(&self) -> Result<()> {
        if !self.is_initialized() {
            return Err(BinlockError::UserError(format!(
                "binlock store not initialized.\n\
                 Expected store directory at: {}\n\n\
                 Run `binlock init` to create one.",
                self.store_dir.display()
            )));
        }
        Ok(())
    }

    /// Path to the config file.
    pub fn config_path(&self) -> PathBuf {
        self.store_dir.join("config.yaml")
    }

    /// Path to the location registry, which also carries the lock attributes.
    pub fn registry_path(&self) -> PathBuf {
        self.store_dir.join("locations.yaml")
    }

    /// Path to the mutex file held while a mutation is in flight.
    pub fn store_mutex_path(&self) -> PathBuf {
        self.store_dir.join("store.mutex")
    }

    /// Path to the events directory.
    pub fn events_dir(&self) -> PathBuf {
        self.store_dir.join("events")
    }

    /// Path to the audit log file.
    pub fn events_file(&self) -> PathBuf {
        self.events_dir().join("events.ndjson")
    }
}

fn current_dir() -> Result<PathBuf> {
    env::current_dir().map_err(|e| {
        BinlockError::UserError(format!("failed to get current working directory: {}", e))
    })
}
