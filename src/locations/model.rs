//! Location records.

use crate::error::{BinlockError, Result};
use crate::locks::LockRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Valid location ids: short, filename-safe, starting with an alphanumeric.
static LOCATION_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,63}$").expect("Invalid location ID regex")
});

/// Level of a node in the storage hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Building,
    Zone,
    Rack,
    Shelf,
    #[default]
    Bin,
}

impl LocationKind {
    /// Parse a location kind from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "building" => Some(Self::Building),
            "zone" => Some(Self::Zone),
            "rack" => Some(Self::Rack),
            "shelf" => Some(Self::Shelf),
            "bin" => Some(Self::Bin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LocationKind::Building => "building",
            LocationKind::Zone => "zone",
            LocationKind::Rack => "rack",
            LocationKind::Shelf => "shelf",
            LocationKind::Bin => "bin",
        }
    }
}

impl std::fmt::Display for LocationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the warehouse storage hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Unique identifier (e.g. `R-12`).
    pub id: String,

    /// Label code; defaults to the id.
    pub code: String,

    /// Display name.
    pub name: String,

    #[serde(default)]
    pub kind: LocationKind,

    /// Parent node id, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Lease currently recorded on this location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<LockRecord>,
}

impl Location {
    /// Create an unlocked location whose code equals its id.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: LocationKind) -> Self {
        let id = id.into();
        Self {
            code: id.clone(),
            id,
            name: name.into(),
            kind,
            parent: None,
            lock: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// Check that `id` is a well-formed location id.
pub fn validate_location_id(id: &str) -> Result<()> {
    if LOCATION_ID_REGEX.is_match(id) {
        Ok(())
    } else {
        Err(BinlockError::UserError(format!(
            "invalid location id '{}': use 1-64 letters, digits, '.', '_' or '-', starting with a letter or digit",
            id
        )))
    }
}
