//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for a binlock store.
///
/// This struct represents the contents of `.binlock/config.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Lease settings
    // =========================================================================
    /// Minutes after which an untouched location lock expires.
    #[serde(default = "default_lease_minutes")]
    pub lease_minutes: u32,

    /// Users allowed to force-release locks held by others.
    #[serde(default)]
    pub admins: Vec<String>,

    // =========================================================================
    // Store settings
    // =========================================================================
    /// How long a mutation waits for another in-flight mutation to finish.
    #[serde(default = "default_store_mutex_wait_ms")]
    pub store_mutex_wait_ms: u64,

    /// Seconds after which a leftover store mutex is broken.
    #[serde(default = "default_store_mutex_stale_seconds")]
    pub store_mutex_stale_seconds: u32,

    /// Whether lock state changes are appended to the audit log.
    #[serde(default = "default_true")]
    pub audit_events: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lease_minutes: default_lease_minutes(),
            admins: Vec::new(),
            store_mutex_wait_ms: default_store_mutex_wait_ms(),
            store_mutex_stale_seconds: default_store_mutex_stale_seconds(),
            audit_events: default_true(),
        }
    }
}
