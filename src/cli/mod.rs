//! CLI argument parsing for binlock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Binlock: exclusive, time-bounded leases on warehouse locations.
///
/// Operators lock a location (building, zone, rack, shelf or bin) while they
/// populate or edit it, so two people cannot change the same location at once:
/// - `lock acquire` takes or refreshes a lease
/// - `lock release` gives it back
/// - leases expire on their own after the configured lease duration
#[derive(Parser, Debug)]
#[command(name = "binlock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory containing `.binlock/` (default: search upward from the current directory).
    #[arg(long, global = true, env = "BINLOCK_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Identity to act as (default: $USER@hostname).
    #[arg(long, global = true, env = "BINLOCK_USER", value_name = "NAME")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for binlock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a binlock store.
    ///
    /// Creates `.binlock/` with a config template, an empty location
    /// registry and the audit log directory. Safe to run again.
    Init(InitArgs),

    /// Location registry commands.
    Location(LocationCommand),

    /// Lock management commands.
    ///
    /// Acquire, release and inspect location leases.
    Lock(LockCommand),

    /// Show the audit log.
    History(HistoryArgs),
}

/// Arguments for the `init` command.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Users allowed to force-release locks (default: the current user).
    #[arg(long = "admin", value_name = "USER")]
    pub admins: Vec<String>,
}

/// Location subcommand wrapper.
#[derive(Parser, Debug)]
pub struct LocationCommand {
    #[command(subcommand)]
    pub action: LocationAction,
}

/// Available location actions.
#[derive(Subcommand, Debug)]
pub enum LocationAction {
    /// Register a new location.
    Add(LocationAddArgs),

    /// Show the location tree with lock markers.
    List,
}

/// Arguments for the `location add` command.
#[derive(Parser, Debug)]
pub struct LocationAddArgs {
    /// Unique location ID (letters, digits, '.', '_', '-').
    pub id: String,

    /// Display name.
    #[arg(long)]
    pub name: String,

    /// Label code (defaults to the ID).
    #[arg(long)]
    pub code: Option<String>,

    /// Kind of location (building, zone, rack, shelf, bin).
    #[arg(long, default_value = "bin")]
    pub kind: String,

    /// ID of the enclosing location.
    #[arg(long)]
    pub parent: Option<String>,
}

/// Lock subcommand wrapper.
#[derive(Parser, Debug)]
pub struct LockCommand {
    #[command(subcommand)]
    pub action: LockAction,
}

/// Available lock actions.
#[derive(Subcommand, Debug)]
pub enum LockAction {
    /// Lock a location, or refresh a lock you already hold.
    Acquire(LockTargetArgs),

    /// Release a lock you hold.
    Release(LockTargetArgs),

    /// Clear a lock regardless of holder (administrators only).
    ///
    /// Requires --force flag to prevent accidental clearing.
    ForceRelease(LockForceReleaseArgs),

    /// List active locks.
    ///
    /// Shows location name, code, holder, age and expiry.
    List(LockListArgs),

    /// Show the lock on one location.
    Status(LockTargetArgs),

    /// Clear every expired lock.
    Sweep,
}

/// A single location to operate on.
#[derive(Parser, Debug)]
pub struct LockTargetArgs {
    /// Location ID.
    pub location_id: String,
}

/// Arguments for the `lock force-release` command.
#[derive(Parser, Debug)]
pub struct LockForceReleaseArgs {
    /// Location ID whose lock should be cleared.
    pub location_id: String,

    /// Force clearing the lock (required for safety).
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `lock list` command.
#[derive(Parser, Debug)]
pub struct LockListArgs {
    /// Include expired locks that have not been swept.
    #[arg(long)]
    pub all: bool,
}

/// Arguments for the `history` command.
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Only show events for this location.
    #[arg(long)]
    pub location: Option<String>,

    /// Show at most this many of the most recent events.
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
