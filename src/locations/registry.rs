//! Loading, saving, and editing the location registry.

use super::model::{Location, validate_location_id};
use crate::context::StoreContext;
use crate::error::{BinlockError, Result};
use crate::fs::atomic_write_file;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// On-disk shape of `locations.yaml`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RegistryFile {
    locations: Vec<Location>,
}

/// In-memory view of the registry, ordered by location id.
///
/// A `Registry` is a snapshot: it is loaded, inspected or modified, and
/// (for mutations) saved back while the store mutex is held. It is never
/// cached between operations.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    locations: Vec<Location>,
}

impl Registry {
    /// Load the registry; a missing file is an empty registry.
    pub fn load(ctx: &StoreContext) -> Result<Self> {
        let path = ctx.registry_path();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            BinlockError::StoreError(format!(
                "failed to read registry '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse a registry from YAML, rejecting malformed or duplicate ids.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: RegistryFile = if yaml.trim().is_empty() {
            RegistryFile::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| {
                BinlockError::StoreError(format!("failed to parse registry YAML: {}", e))
            })?
        };

        let mut seen = HashSet::new();
        for location in &file.locations {
            validate_location_id(&location.id)
                .map_err(|e| BinlockError::StoreError(format!("corrupt registry: {}", e)))?;
            if !seen.insert(location.id.as_str()) {
                return Err(BinlockError::StoreError(format!(
                    "corrupt registry: duplicate location id '{}'",
                    location.id
                )));
            }
        }

        let mut locations = file.locations;
        locations.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Self { locations })
    }

    pub fn to_yaml(&self) -> Result<String> {
        let file = RegistryFile {
            locations: self.locations.clone(),
        };
        serde_yaml::to_string(&file)
            .map_err(|e| BinlockError::StoreError(format!("failed to serialize registry: {}", e)))
    }

    /// Atomically replace the registry file.
    pub fn save(&self, ctx: &StoreContext) -> Result<()> {
        atomic_write_file(ctx.registry_path(), &self.to_yaml()?)
    }

    /// Add a new location.
    ///
    /// The id must be well-formed and unused, and the parent (if any) must
    /// already exist, which also rules out cycles.
    pub fn add(&mut self, location: Location) -> Result<()> {
        validate_location_id(&location.id)?;

        if location.name.trim().is_empty() {
            return Err(BinlockError::UserError(format!(
                "location '{}' needs a non-empty name",
                location.id
            )));
        }

        if self.get(&location.id).is_some() {
            return Err(BinlockError::UserError(format!(
                "location '{}' already exists",
                location.id
            )));
        }

        if let Some(parent) = &location.parent
            && self.get(parent).is_none()
        {
            return Err(BinlockError::LocationNotFound(parent.clone()));
        }

        let index = self
            .locations
            .partition_point(|existing| existing.id < location.id);
        self.locations.insert(index, location);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Location> {
        self.locations
            .binary_search_by(|l| l.id.as_str().cmp(id))
            .ok()
            .map(|i| &self.locations[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Location> {
        self.locations
            .binary_search_by(|l| l.id.as_str().cmp(id))
            .ok()
            .map(|i| &mut self.locations[i])
    }

    /// Like [`Registry::get`], but a missing location is an error.
    pub fn require(&self, id: &str) -> Result<&Location> {
        self.get(id)
            .ok_or_else(|| BinlockError::LocationNotFound(id.to_string()))
    }

    /// Like [`Registry::get_mut`], but a missing location is an error.
    pub fn require_mut(&mut self, id: &str) -> Result<&mut Location> {
        self.get_mut(id)
            .ok_or_else(|| BinlockError::LocationNotFound(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Location> {
        self.locations.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Locations in depth-first order with their depth.
    ///
    /// Parents come before children and siblings are ordered by id. A
    /// location whose parent is missing from the registry is shown as a root.
    pub fn tree(&self) -> Vec<(usize, &Location)> {
        let mut children: BTreeMap<Option<&str>, Vec<&Location>> = BTreeMap::new();
        for location in &self.locations {
            let parent = location
                .parent
                .as_deref()
                .filter(|p| self.get(p).is_some());
            children.entry(parent).or_default().push(location);
        }

        let mut out = Vec::with_capacity(self.locations.len());
        let mut stack: Vec<(usize, &Location)> = children
            .get(&None)
            .map(|roots| roots.iter().rev().map(|l| (0, *l)).collect())
            .unwrap_or_default();

        while let Some((depth, location)) = stack.pop() {
            out.push((depth, location));
            if let Some(kids) = children.get(&Some(location.id.as_str())) {
                stack.extend(kids.iter().rev().map(|l| (depth + 1, *l)));
            }
        }

        out
    }

    /// Display path from the root down to `id`, e.g. `Main / Zone A / R-12`.
    pub fn path_of(&self, id: &str) -> Option<String> {
        let mut names = Vec::new();
        let mut current = self.get(id);
        while let Some(location) = current {
            names.push(location.name.as_str());
            // The registry rejects parents added after children, but the file
            // is hand-editable, so bound the walk.
            if names.len() > self.locations.len() {
                break;
            }
            current = location.parent.as_deref().and_then(|p| self.get(p));
        }

        if names.is_empty() {
            return None;
        }
        names.reverse();
        Some(names.join(" / "))
    }
}
