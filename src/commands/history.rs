//! `binlock history`: read back the audit log.

use super::{Invocation, format_ts};
use crate::cli::HistoryArgs;
use crate::events::{Event, read_events};
use crate::error::Result;

pub fn cmd_history(inv: &Invocation, args: HistoryArgs) -> Result<()> {
    let (ctx, _) = inv.open_store()?;
    let events = recent_events(read_events(&ctx)?, args.location.as_deref(), args.limit);

    if events.is_empty() {
        println!("No events recorded.");
        return Ok(());
    }

    for event in &events {
        println!(
            "{}  {:<13}  {:<12}  {}",
            format_ts(event.ts),
            event.action,
            event.location.as_deref().unwrap_or("-"),
            event.actor
        );
    }

    Ok(())
}

/// The last `limit` events, oldest first, optionally for one location.
fn recent_events(events: Vec<Event>, location: Option<&str>, limit: usize) -> Vec<Event> {
    let mut selected: Vec<Event> = events
        .into_iter()
        .filter(|e| location.is_none() || e.location.as_deref() == location)
        .collect();
    let skip = selected.len().saturating_sub(limit);
    selected.drain(..skip);
    selected
}
