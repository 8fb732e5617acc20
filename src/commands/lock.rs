//! `binlock lock` commands: the populate-location workflow and the
//! administrative lock screen.

use super::{Invocation, format_ts};
use crate::cli::{LockForceReleaseArgs, LockListArgs, LockTargetArgs};
use crate::config::Config;
use crate::error::{BinlockError, Result};
use crate::locations::Registry;
use crate::locks::{AcquireKind, LockInfo};
use chrono::Utc;

pub fn cmd_lock_acquire(inv: &Invocation, args: LockTargetArgs) -> Result<()> {
    let (manager, _) = inv.lock_manager()?;
    let token = manager.acquire(&args.location_id, &inv.user)?;

    match &token.kind {
        AcquireKind::Acquired => println!("Locked {} for {}.", token.location_id, token.holder),
        AcquireKind::Refreshed => println!("Refreshed lock on {}.", token.location_id),
        AcquireKind::TookOver { previous_holder } => println!(
            "Locked {} for {} (expired lock held by {} was replaced).",
            token.location_id, token.holder, previous_holder
        ),
    }
    println!("  Locked at:  {}", format_ts(token.locked_at));
    println!("  Expires:    {}", format_ts(token.expires_at));

    Ok(())
}

pub fn cmd_lock_release(inv: &Invocation, args: LockTargetArgs) -> Result<()> {
    let (manager, _) = inv.lock_manager()?;
    manager.release(&args.location_id, &inv.user)?;

    println!("Released lock on {}.", args.location_id);
    Ok(())
}

pub fn cmd_lock_force_release(inv: &Invocation, args: LockForceReleaseArgs) -> Result<()> {
    // Require --force flag
    if !args.force {
        return Err(BinlockError::UserError(format!(
            "refusing to clear lock without --force flag.\n\n\
             The holder may still be working on this location.\n\
             Only clear the lock if you are certain the holder has abandoned it.\n\n\
             To clear the lock, run:\n  binlock lock force-release {} --force",
            args.location_id
        )));
    }

    let (manager, config) = inv.lock_manager()?;
    require_admin(&config, &inv.user)?;

    let cleared = manager.force_release(&args.location_id, &inv.user)?;

    println!("Cleared lock: {}", cleared.location_id);
    println!();
    println!("Lock details:");
    print_lock_details(&cleared);
    if cleared.is_expired {
        println!("  Status:     was STALE");
    }

    Ok(())
}

pub fn cmd_lock_list(inv: &Invocation, args: LockListArgs) -> Result<()> {
    let (manager, _) = inv.lock_manager()?;
    let locks = if args.all {
        manager.list_all()?
    } else {
        manager.list_active()?
    };

    if locks.is_empty() {
        println!("No active locks.");
        return Ok(());
    }

    println!("Active locks ({}):", locks.len());
    println!();

    for lock in &locks {
        println!("  {} ({}):", lock.location_name, lock.location_code);
        print_lock_details(lock);
        if lock.is_expired {
            println!(
                "    Status:     STALE (exceeds {} min lease)",
                manager.lease_duration().num_minutes()
            );
        }
        println!();
    }

    // Summary
    let stale_count = locks.iter().filter(|l| l.is_expired).count();
    if stale_count > 0 {
        println!(
            "Note: {} lock(s) are stale. Use `binlock lock sweep` to clear them.",
            stale_count
        );
    }

    Ok(())
}

pub fn cmd_lock_status(inv: &Invocation, args: LockTargetArgs) -> Result<()> {
    let (manager, _) = inv.lock_manager()?;
    let status = manager.status(&args.location_id)?;

    let registry = Registry::load(manager.context())?;
    if let Some(path) = registry.path_of(&args.location_id) {
        println!("{}", path);
    }

    match status {
        None => println!("{} is not locked.", args.location_id),
        Some(lock) => {
            let state = if lock.is_expired { "STALE" } else { "LOCKED" };
            println!("{} is {}.", args.location_id, state);
            print_lock_details(&lock);
        }
    }

    Ok(())
}

pub fn cmd_lock_sweep(inv: &Invocation) -> Result<()> {
    let (manager, _) = inv.lock_manager()?;
    let cleared = manager.sweep_expired(&inv.user)?;

    if cleared.is_empty() {
        println!("No expired locks.");
        return Ok(());
    }

    println!("Cleared {} expired lock(s):", cleared.len());
    for lock in &cleared {
        println!("  {}", lock);
    }

    Ok(())
}

/// Only users listed in `admins` may clear another user's lock.
fn require_admin(config: &Config, user: &str) -> Result<()> {
    if config.is_admin(user) {
        return Ok(());
    }
    Err(BinlockError::PermissionDenied(format!(
        "'{}' is not listed in admins in config.yaml",
        user
    )))
}

fn print_lock_details(lock: &LockInfo) {
    let now = Utc::now();
    println!("    Location:   {}", lock.location_id);
    println!("    Owner:      {}", lock.locked_by);
    println!("    Locked at:  {}", format_ts(lock.locked_at));
    println!("    Age:        {}", lock.record().age_string(now));
    println!("    Expires:    {}", format_ts(lock.expires_at));
}
