//! Audit log for lock state changes.
//!
//! Events are stored in NDJSON format (one JSON object per line) in
//! `.binlock/events/events.ndjson`.
//!
//! # Event Format
//!
//! - `ts`: RFC3339 timestamp
//! - `action`: what happened (acquire, release, force_release, ...)
//! - `actor`: who did it
//! - `location`: optional location id
//! - `details`: freeform object with action-specific details
//!
//! Lock events are appended while the store mutex is held, right after the
//! registry write, so the log order matches the commit order.

use crate::context::StoreContext;
use crate::error::{BinlockError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Store initialized
    Init,
    /// Location added to the registry
    LocationAdd,
    /// Free location locked
    Acquire,
    /// Holder re-acquired its own lock
    Refresh,
    /// Expired lock replaced by a new holder
    Takeover,
    /// Holder released its lock
    Release,
    /// Administrator cleared a lock
    ForceRelease,
    /// Expired locks cleared in bulk
    Sweep,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Init => write!(f, "init"),
            EventAction::LocationAdd => write!(f, "location_add"),
            EventAction::Acquire => write!(f, "acquire"),
            EventAction::Refresh => write!(f, "refresh"),
            EventAction::Takeover => write!(f, "takeover"),
            EventAction::Release => write!(f, "release"),
            EventAction::ForceRelease => write!(f, "force_release"),
            EventAction::Sweep => write!(f, "sweep"),
        }
    }
}

/// An event record for the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// When the event occurred.
    pub ts: DateTime<Utc>,

    /// The action that was performed.
    pub action: EventAction,

    /// The user who performed the action.
    pub actor: String,

    /// Location the event concerns, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Freeform details object with action-specific information.
    #[serde(default)]
    pub details: Value,
}

impl Event {
    /// Create a new event stamped with the current time.
    pub fn new(action: EventAction, actor: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: actor.into(),
            location: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Override the timestamp (lock operations stamp events with their own clock reading).
    pub fn at(mut self, ts: DateTime<Utc>) -> Self {
        self.ts = ts;
        self
    }

    /// Set the location id for this event.
    pub fn with_location(mut self, location_id: impl Into<String>) -> Self {
        self.location = Some(location_id.into());
        self
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| BinlockError::StoreError(format!("failed to serialize event: {}", e)))
    }
}

/// Append an event to the audit log, creating the file if needed.
pub fn append_event(ctx: &StoreContext, event: &Event) -> Result<()> {
    let json_line = event.to_ndjson_line()?;

    let events_dir = ctx.events_dir();
    if !events_dir.exists() {
        fs::create_dir_all(&events_dir).map_err(|e| {
            BinlockError::StoreError(format!(
                "failed to create events directory '{}': {}",
                events_dir.display(),
                e
            ))
        })?;
    }

    let events_file = ctx.events_file();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&events_file)
        .map_err(|e| {
            BinlockError::StoreError(format!(
                "failed to open events file '{}': {}",
                events_file.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        BinlockError::StoreError(format!(
            "failed to write event to '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        BinlockError::StoreError(format!(
            "failed to sync events file '{}': {}",
            events_file.display(),
            e
        ))
    })
}

/// Append an event, downgrading failures to a warning.
///
/// Used after a state change has already been committed: the change stands
/// even if the audit trail could not be extended.
pub fn record_event(ctx: &StoreContext, event: &Event) {
    if let Err(e) = append_event(ctx, event) {
        tracing::warn!(action = %event.action, "failed to append audit event: {}", e);
    }
}

/// Read every event in the audit log, oldest first.
///
/// Lines that fail to parse are skipped with a warning so that one damaged
/// line does not hide the rest of the history.
pub fn read_events(ctx: &StoreContext) -> Result<Vec<Event>> {
    let events_file = ctx.events_file();
    if !events_file.exists() {
        return Ok(Vec::new());
    }

    let file = fs::File::open(&events_file).map_err(|e| {
        BinlockError::StoreError(format!(
            "failed to open events file '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    let mut events = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| {
            BinlockError::StoreError(format!("failed to read events file: {}", e))
        })?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Event>(&line) {
            Ok(event) => events.push(event),
            Err(e) => tracing::warn!(line = index + 1, "skipping unreadable event: {}", e),
        }
    }

    Ok(events)
}
