//! Implementation of the `binlock init` command.
//!
//! # What `binlock init` does
//!
//! 1. Creates the store directory `.binlock/`
//! 2. Creates `config.yaml` (if missing), seeding `admins`
//! 3. Creates an empty `locations.yaml` (if missing)
//! 4. Creates `events/` for the audit log
//! 5. Appends an `init` event
//!
//! Existing files are never overwritten, so running it twice is harmless.

mod scaffolding;


use super::Invocation;
use crate::cli::InitArgs;
use crate::config::Config;
use crate::context::StoreContext;
use crate::error::Result;
use crate::events::{Event, EventAction, record_event};
use crate::locks::acquire_store_mutex;
use serde_json::json;

use scaffolding::*;

/// Execute the `binlock init` command.
///
/// This command is **idempotent**: running it multiple times will not error
/// and will not cause destructive changes to existing store state.
pub fn cmd_init(inv: &Invocation, args: InitArgs) -> Result<()> {
    let ctx = StoreContext::resolve_for_init(inv.root.as_deref())?;
    let admins = if args.admins.is_empty() {
        vec![inv.user.clone()]
    } else {
        args.admins
    };

    let report = init_store(&ctx, &inv.user, &admins)?;

    println!("Initialized binlock store.");
    println!();
    println!("Store directory: {}", ctx.store_dir.display());
    if report.config_created {
        println!("Administrators:  {}", admins.join(", "));
    } else {
        println!("Existing config.yaml kept (administrators unchanged).");
    }
    println!();
    println!("You can now register locations with `binlock location add <ID> --name <NAME>`.");

    Ok(())
}

/// What [`init_store`] had to create.
#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct InitReport {
    pub config_created: bool,
    pub registry_created: bool,
}

/// Create the store layout under `ctx`, holding the store mutex once the
/// store directory exists so concurrent inits do not interleave.
pub(super) fn init_store(ctx: &StoreContext, actor: &str, admins: &[String]) -> Result<InitReport> {
    create_store_dir(ctx)?;

    let defaults = Config::default();
    let _guard = acquire_store_mutex(
        ctx,
        actor,
        "init",
        defaults.store_mutex_wait(),
        defaults.store_mutex_stale_after(),
    )?;

    let report = InitReport {
        config_created: write_config_if_missing(ctx, admins)?,
        registry_created: write_registry_if_missing(ctx)?,
    };
    create_events_dir(ctx)?;

    let config = Config::load(ctx.config_path())?;
    if config.audit_events {
        let event = Event::new(EventAction::Init, actor).with_details(json!({
            "store_dir": ctx.store_dir.display().to_string(),
            "config_created": report.config_created,
            "registry_created": report.registry_created,
        }));
        record_event(ctx, &event);
    }

    tracing::info!(store = %ctx.store_dir.display(), ?report, "store initialized");
    Ok(report)
}
