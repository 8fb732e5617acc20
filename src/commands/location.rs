//! `binlock location` commands: registry administration.

use super::{Invocation, format_ts};
use crate::cli::LocationAddArgs;
use crate::config::Config;
use crate::context::StoreContext;
use crate::error::{BinlockError, Result};
use crate::events::{Event, EventAction, record_event};
use crate::locations::{Location, LocationKind, Registry};
use crate::locks::acquire_store_mutex;
use chrono::Utc;
use serde_json::json;

pub fn cmd_location_add(inv: &Invocation, args: LocationAddArgs) -> Result<()> {
    let (ctx, config) = inv.open_store()?;

    let kind = LocationKind::from_str(&args.kind).ok_or_else(|| {
        BinlockError::UserError(format!(
            "invalid kind '{}'. Valid kinds: building, zone, rack, shelf, bin",
            args.kind
        ))
    })?;

    let mut location = Location::new(args.id, args.name.trim(), kind);
    if let Some(code) = args.code {
        location = location.with_code(code);
    }
    if let Some(parent) = args.parent {
        location = location.with_parent(parent);
    }

    let added = add_location(&ctx, &config, &inv.user, location)?;

    println!("Added location: {}", added.id);
    println!("  Code:       {}", added.code);
    println!("  Name:       {}", added.name);
    println!("  Kind:       {}", added.kind);
    if let Some(parent) = &added.parent {
        println!("  Parent:     {}", parent);
    }

    Ok(())
}

/// Insert `location` into the registry under the store mutex.
pub(super) fn add_location(
    ctx: &StoreContext,
    config: &Config,
    actor: &str,
    location: Location,
) -> Result<Location> {
    let guard = acquire_store_mutex(
        ctx,
        actor,
        "location_add",
        config.store_mutex_wait(),
        config.store_mutex_stale_after(),
    )?;

    let mut registry = Registry::load(ctx)?;
    registry.add(location.clone())?;
    registry.save(ctx)?;

    if config.audit_events {
        let event = Event::new(EventAction::LocationAdd, actor)
            .with_location(location.id.clone())
            .with_details(json!({
                "code": location.code,
                "name": location.name,
                "kind": location.kind.as_str(),
                "parent": location.parent,
            }));
        record_event(ctx, &event);
    }

    guard.release()?;
    tracing::info!(location = %location.id, "location added");
    Ok(location)
}

pub fn cmd_location_list(inv: &Invocation) -> Result<()> {
    let (ctx, config) = inv.open_store()?;
    let registry = Registry::load(&ctx)?;

    if registry.is_empty() {
        println!("No locations registered.");
        return Ok(());
    }

    let now = Utc::now();
    let lease = config.lease_duration();
    let mut locked = 0;

    println!("Locations ({}):", registry.len());
    println!();
    for (depth, location) in registry.tree() {
        let mut line = format!(
            "{}{} [{}] {} ({})",
            "  ".repeat(depth + 1),
            location.id,
            location.code,
            location.name,
            location.kind
        );
        if let Some(lock) = &location.lock {
            locked += 1;
            line.push_str(&format!(
                "  LOCKED by {} since {}",
                lock.locked_by,
                format_ts(lock.locked_at)
            ));
            if lock.is_expired(now, lease) {
                line.push_str(" (STALE)");
            }
        }
        println!("{}", line);
    }

    if locked > 0 {
        println!();
        println!("{} location(s) locked.", locked);
    }

    Ok(())
}
