//! Command implementations for binlock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Every handler takes the store root and acting user
//! explicitly so it can be driven from tests without touching the process
//! environment.

mod history;
mod init;
mod location;
mod lock;

use crate::cli::{Cli, Command, LocationAction, LockAction};
use crate::config::Config;
use crate::context::StoreContext;
use crate::error::Result;
use crate::identity::default_user;
use crate::locks::LocationLockManager;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Global options shared by every command.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Explicit store root, if one was given.
    pub root: Option<PathBuf>,

    /// Identity the command acts as.
    pub user: String,
}

impl Invocation {
    pub fn new(root: Option<PathBuf>, user: Option<String>) -> Self {
        Self {
            root,
            user: user.unwrap_or_else(default_user),
        }
    }

    fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Resolve an initialized store and load its config.
    fn open_store(&self) -> Result<(StoreContext, Config)> {
        let ctx = StoreContext::resolve(self.root())?;
        let config = Config::load(ctx.config_path())?;
        tracing::debug!(store = %ctx.store_dir.display(), user = %self.user, "opened store");
        Ok((ctx, config))
    }

    /// Open the store and build a lock manager for it.
    fn lock_manager(&self) -> Result<(LocationLockManager, Config)> {
        let (ctx, config) = self.open_store()?;
        Ok((LocationLockManager::new(ctx, &config), config))
    }
}

/// Dispatch a command to its implementation.
///
/// This is the main entry point for command execution. Each command
/// is routed to its handler function.
pub fn dispatch(cli: Cli) -> Result<()> {
    let inv = Invocation::new(cli.root, cli.user);

    match cli.command {
        Command::Init(args) => init::cmd_init(&inv, args),
        Command::Location(location_cmd) => match location_cmd.action {
            LocationAction::Add(args) => location::cmd_location_add(&inv, args),
            LocationAction::List => location::cmd_location_list(&inv),
        },
        Command::Lock(lock_cmd) => match lock_cmd.action {
            LockAction::Acquire(args) => lock::cmd_lock_acquire(&inv, args),
            LockAction::Release(args) => lock::cmd_lock_release(&inv, args),
            LockAction::ForceRelease(args) => lock::cmd_lock_force_release(&inv, args),
            LockAction::List(args) => lock::cmd_lock_list(&inv, args),
            LockAction::Status(args) => lock::cmd_lock_status(&inv, args),
            LockAction::Sweep => lock::cmd_lock_sweep(&inv),
        },
        Command::History(args) => history::cmd_history(&inv, args),
    }
}

/// Timestamp format used in command output.
pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
