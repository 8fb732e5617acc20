//! Directory and file scaffolding for the init command.

use crate::config::Config;
use crate::context::StoreContext;
use crate::error::{BinlockError, Result};
use crate::fs::atomic_write_file;
use crate::locations::Registry;
use std::fs;
use std::path::Path;

/// Create the `.binlock/` directory.
pub(super) fn create_store_dir(ctx: &StoreContext) -> Result<()> {
    create_dir(&ctx.store_dir, "store directory")
}

/// Create the audit log directory.
pub(super) fn create_events_dir(ctx: &StoreContext) -> Result<()> {
    create_dir(&ctx.events_dir(), "events directory")
}

/// Write `config.yaml` with `admins` unless it already exists.
/// Returns true if the file was created.
pub(super) fn write_config_if_missing(ctx: &StoreContext, admins: &[String]) -> Result<bool> {
    let config_path = ctx.config_path();
    if config_path.exists() {
        return Ok(false);
    }

    let config = Config {
        admins: admins.to_vec(),
        ..Config::default()
    };
    config.validate()?;
    atomic_write_file(&config_path, &config.to_yaml()?)?;
    Ok(true)
}

/// Write an empty `locations.yaml` unless it already exists.
/// Returns true if the file was created.
pub(super) fn write_registry_if_missing(ctx: &StoreContext) -> Result<bool> {
    if ctx.registry_path().exists() {
        return Ok(false);
    }

    Registry::default().save(ctx)?;
    Ok(true)
}

fn create_dir(path: &Path, what: &str) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| {
        BinlockError::StoreError(format!(
            "failed to create {} '{}': {}",
            what,
            path.display(),
            e
        ))
    })
}
