//! Tests for the lease manager.

use super::*;
use crate::error::BinlockError;
use crate::events::{EventAction, read_events};
use crate::locations::Registry;
use crate::test_support::{at, create_test_store, test_config};
use chrono::{Duration, Utc};
use std::sync::{Arc, Barrier};
use std::thread;

fn manager(ctx: &crate::context::StoreContext) -> LocationLockManager {
    LocationLockManager::new(ctx.clone(), &test_config(30))
}

#[test]
fn test_acquire_free_location() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);

    let token = mgr.acquire_at("R-12", "alice", at(9, 0)).unwrap();

    assert_eq!(token.location_id, "R-12");
    assert_eq!(token.holder, "alice");
    assert_eq!(token.locked_at, at(9, 0));
    assert_eq!(token.expires_at, at(9, 30));
    assert_eq!(token.kind, AcquireKind::Acquired);

    // Persisted on the location record.
    let registry = Registry::load(&ctx).unwrap();
    let lock = registry.get("R-12").unwrap().lock.clone().unwrap();
    assert_eq!(lock, LockRecord::new("alice", at(9, 0)));
    assert!(!ctx.store_mutex_path().exists());
}

#[test]
fn test_acquire_held_location_fails() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);
    mgr.acquire_at("R-12", "alice", at(9, 0)).unwrap();

    let err = mgr.acquire_at("R-12", "bob", at(9, 10)).unwrap_err();

    match err {
        BinlockError::LockHeld {
            location_id,
            holder,
            locked_at,
        } => {
            assert_eq!(location_id, "R-12");
            assert_eq!(holder, "alice");
            assert_eq!(locked_at, at(9, 0));
        }
        other => panic!("expected LockHeld, got {:?}", other),
    }

    // The failed attempt changed nothing.
    let status = mgr.status_at("R-12", at(9, 10)).unwrap().unwrap();
    assert_eq!(status.locked_by, "alice");
}

#[test]
fn test_concurrent_acquire_exactly_one_wins() {
    let (_temp_dir, ctx) = create_test_store();
    let users = ["alice", "bob", "carol", "dave"];
    let barrier = Arc::new(Barrier::new(users.len()));

    let handles: Vec<_> = users
        .iter()
        .map(|user| {
            let mgr = manager(&ctx);
            let barrier = Arc::clone(&barrier);
            let user = user.to_string();
            thread::spawn(move || {
                barrier.wait();
                mgr.acquire_at("R-12", &user, at(9, 0)).map(|t| t.holder)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1, "results: {:?}", results);

    for result in &results {
        if let Err(err) = result {
            assert!(
                matches!(err, BinlockError::LockHeld { holder, .. } if holder == winners[0]),
                "unexpected error: {:?}",
                err
            );
        }
    }

    let status = manager(&ctx).status_at("R-12", at(9, 0)).unwrap().unwrap();
    assert_eq!(&status.locked_by, winners[0]);
}

#[test]
fn test_reacquire_by_holder_refreshes() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);

    let first = mgr.acquire_at("R-12", "alice", at(9, 0)).unwrap();
    let second = mgr.acquire_at("R-12", "alice", at(9, 20)).unwrap();

    assert_eq!(first.kind, AcquireKind::Acquired);
    assert_eq!(second.kind, AcquireKind::Refreshed);
    assert_eq!(second.locked_at, at(9, 20));
    assert_eq!(second.expires_at, at(9, 50));

    // Lease now runs past the original expiry.
    assert!(mgr.acquire_at("R-12", "bob", at(9, 40)).is_err());
}

#[test]
fn test_refresh_does_not_move_lease_backwards() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);

    mgr.acquire_at("R-12", "alice", at(9, 20)).unwrap();
    let token = mgr.acquire_at("R-12", "alice", at(9, 5)).unwrap();

    assert_eq!(token.locked_at, at(9, 20));
}

#[test]
fn test_expired_lock_can_be_taken_over() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);
    let t0 = at(9, 0);
    mgr.acquire_at("R-12", "alice", t0).unwrap();

    // Exactly at the lease boundary the lock is still active.
    assert!(mgr.acquire_at("R-12", "bob", t0 + Duration::minutes(30)).is_err());

    let later = t0 + Duration::minutes(30) + Duration::seconds(1);
    let token = mgr.acquire_at("R-12", "bob", later).unwrap();

    assert_eq!(
        token.kind,
        AcquireKind::TookOver {
            previous_holder: "alice".to_string()
        }
    );
    assert_eq!(token.holder, "bob");
    assert_eq!(mgr.status_at("R-12", later).unwrap().unwrap().locked_by, "bob");
}

#[test]
fn test_holder_reacquiring_expired_lock_is_a_refresh() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);
    mgr.acquire_at("R-12", "alice", at(9, 0)).unwrap();

    let token = mgr.acquire_at("R-12", "alice", at(11, 0)).unwrap();

    assert_eq!(token.kind, AcquireKind::Refreshed);
    assert_eq!(token.locked_at, at(11, 0));
}

#[test]
fn test_release_requires_ownership() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);
    mgr.acquire_at("R-12", "alice", at(9, 0)).unwrap();

    let err = mgr.release_at("R-12", "bob", at(9, 5)).unwrap_err();
    assert!(matches!(
        err,
        BinlockError::NotLockHolder { ref requester, ref holder, .. }
            if requester == "bob" && holder.as_deref() == Some("alice")
    ));

    mgr.release_at("R-12", "alice", at(9, 6)).unwrap();
    assert!(mgr.status_at("R-12", at(9, 6)).unwrap().is_none());

    let token = mgr.acquire_at("R-12", "bob", at(9, 7)).unwrap();
    assert_eq!(token.kind, AcquireKind::Acquired);
}

#[test]
fn test_release_unlocked_location_is_not_holder() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);

    let err = mgr.release_at("R-11", "alice", at(9, 0)).unwrap_err();

    assert!(matches!(err, BinlockError::NotLockHolder { holder: None, .. }));
}

#[test]
fn test_holder_can_release_after_expiry() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);
    mgr.acquire_at("R-12", "alice", at(9, 0)).unwrap();

    mgr.release_at("R-12", "alice", at(12, 0)).unwrap();

    assert!(mgr.status_at("R-12", at(12, 0)).unwrap().is_none());
}

#[test]
fn test_force_release_clears_any_holder() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);
    mgr.acquire_at("R-12", "alice", at(9, 0)).unwrap();

    let cleared = mgr.force_release_at("R-12", "supervisor", at(9, 5)).unwrap();

    assert_eq!(cleared.locked_by, "alice");
    assert_eq!(cleared.locked_at, at(9, 0));
    assert!(!cleared.is_expired);
    assert!(mgr.status_at("R-12", at(9, 5)).unwrap().is_none());
    assert!(mgr.list_active_at(at(9, 5)).unwrap().is_empty());
}

#[test]
fn test_force_release_reports_stale_lock() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);
    mgr.acquire_at("R-12", "alice", at(9, 0)).unwrap();

    let cleared = mgr.force_release_at("R-12", "supervisor", at(10, 0)).unwrap();

    assert!(cleared.is_expired);
}

#[test]
fn test_force_release_without_lock_fails() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);

    let err = mgr.force_release_at("R-12", "supervisor", at(9, 0)).unwrap_err();

    assert!(matches!(err, BinlockError::LockNotFound(ref id) if id == "R-12"));
}

#[test]
fn test_unknown_location_fails_every_operation() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);
    let missing = |err: BinlockError| matches!(err, BinlockError::LocationNotFound(ref id) if id == "NOPE");

    assert!(missing(mgr.acquire_at("NOPE", "alice", at(9, 0)).unwrap_err()));
    assert!(missing(mgr.release_at("NOPE", "alice", at(9, 0)).unwrap_err()));
    assert!(missing(mgr.force_release_at("NOPE", "alice", at(9, 0)).unwrap_err()));
    assert!(missing(mgr.status_at("NOPE", at(9, 0)).unwrap_err()));
}

#[test]
fn test_blank_user_is_rejected() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);

    let err = mgr.acquire_at("R-12", "   ", at(9, 0)).unwrap_err();

    assert!(matches!(err, BinlockError::UserError(_)));
}

#[test]
fn test_list_active_reflects_live_state() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);
    mgr.acquire_at("R-12", "alice", at(9, 0)).unwrap();
    mgr.acquire_at("R-11", "bob", at(9, 20)).unwrap();

    let active = mgr.list_active_at(at(9, 25)).unwrap();
    let ids: Vec<_> = active.iter().map(|l| l.location_id.as_str()).collect();
    assert_eq!(ids, vec!["R-11", "R-12"]);
    assert_eq!(active[1].location_name, "Rack 12");
    assert_eq!(active[1].location_code, "A-R12");
    assert_eq!(active[1].locked_by, "alice");

    // R-12 expires at 09:30 and drops out of the active list without a sweep.
    let active = mgr.list_active_at(at(9, 31)).unwrap();
    let ids: Vec<_> = active.iter().map(|l| l.location_id.as_str()).collect();
    assert_eq!(ids, vec!["R-11"]);

    // But the stale record is still visible to diagnostics.
    let all = mgr.list_all_at(at(9, 31)).unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|l| l.location_id == "R-12" && l.is_expired));

    mgr.release_at("R-11", "bob", at(9, 32)).unwrap();
    assert!(mgr.list_active_at(at(9, 32)).unwrap().is_empty());
}

#[test]
fn test_sweep_clears_only_expired() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);
    mgr.acquire_at("R-12", "alice", at(9, 0)).unwrap();
    mgr.acquire_at("R-11", "bob", at(9, 20)).unwrap();

    let swept = mgr.sweep_expired_at("system", at(9, 40)).unwrap();

    assert_eq!(swept.len(), 1);
    assert_eq!(swept[0].location_id, "R-12");
    assert_eq!(swept[0].locked_by, "alice");
    let all = mgr.list_all_at(at(9, 40)).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].location_id, "R-11");
}

#[test]
fn test_sweep_with_nothing_expired_writes_nothing() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);
    mgr.acquire_at("R-12", "alice", at(9, 0)).unwrap();
    let before = std::fs::read_to_string(ctx.registry_path()).unwrap();
    let events_before = read_events(&ctx).unwrap().len();

    let swept = mgr.sweep_expired_at("system", at(9, 10)).unwrap();

    assert!(swept.is_empty());
    assert_eq!(std::fs::read_to_string(ctx.registry_path()).unwrap(), before);
    assert_eq!(read_events(&ctx).unwrap().len(), events_before);
}

#[test]
fn test_warehouse_shift_scenario() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);

    mgr.acquire_at("R-12", "userA", at(9, 0)).unwrap();

    let err = mgr.acquire_at("R-12", "userB", at(9, 10)).unwrap_err();
    assert!(matches!(
        err,
        BinlockError::LockHeld { ref holder, locked_at, .. }
            if holder == "userA" && locked_at == at(9, 0)
    ));

    let token = mgr.acquire_at("R-12", "userB", at(9, 31)).unwrap();
    assert_eq!(token.locked_at, at(9, 31));

    let active = mgr.list_active_at(at(9, 32)).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].location_id, "R-12");
    assert_eq!(active[0].locked_by, "userB");
    assert_eq!(active[0].locked_at, at(9, 31));
}

#[test]
fn test_audit_events_follow_lock_changes() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);

    mgr.acquire_at("R-12", "alice", at(9, 0)).unwrap();
    mgr.acquire_at("R-12", "alice", at(9, 5)).unwrap();
    let _ = mgr.acquire_at("R-12", "bob", at(9, 6));
    mgr.acquire_at("R-12", "bob", at(10, 0)).unwrap();
    mgr.release_at("R-12", "bob", at(10, 1)).unwrap();
    mgr.acquire_at("R-11", "carol", at(10, 2)).unwrap();
    mgr.force_release_at("R-11", "supervisor", at(10, 3)).unwrap();

    let events = read_events(&ctx).unwrap();
    let actions: Vec<_> = events.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            EventAction::Acquire,
            EventAction::Refresh,
            EventAction::Takeover,
            EventAction::Release,
            EventAction::Acquire,
            EventAction::ForceRelease,
        ]
    );
    assert_eq!(events[2].details["previous_holder"], "alice");
    assert_eq!(events[5].actor, "supervisor");
    assert_eq!(events[5].details["holder"], "carol");
    assert_eq!(events[5].ts, at(10, 3));
}

#[test]
fn test_audit_events_can_be_disabled() {
    let (_temp_dir, ctx) = create_test_store();
    let config = crate::config::Config {
        audit_events: false,
        ..test_config(30)
    };
    let mgr = LocationLockManager::new(ctx.clone(), &config);

    mgr.acquire_at("R-12", "alice", at(9, 0)).unwrap();

    assert!(!ctx.events_file().exists());
}

#[test]
fn test_lease_duration_comes_from_config() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = LocationLockManager::new(ctx.clone(), &test_config(15));
    assert_eq!(mgr.lease_duration(), Duration::minutes(15));

    mgr.acquire_at("R-12", "alice", at(9, 0)).unwrap();
    assert!(mgr.acquire_at("R-12", "bob", at(9, 15)).is_err());
    assert!(mgr.acquire_at("R-12", "bob", at(9, 16)).is_ok());
}

#[test]
fn test_is_expired_predicate() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);
    let lock = LockRecord::new("alice", at(9, 0));

    assert!(!mgr.is_expired(&lock, at(9, 30)));
    assert!(mgr.is_expired(&lock, at(9, 31)));
    assert!(is_expired(&lock, at(9, 31), mgr.lease_duration()));
}

#[test]
fn test_wall_clock_wrappers() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);

    let token = mgr.acquire("R-12", "alice").unwrap();
    assert!(Utc::now().signed_duration_since(token.locked_at) < Duration::minutes(1));

    assert_eq!(mgr.list_active().unwrap().len(), 1);
    assert_eq!(mgr.status("R-12").unwrap().unwrap().locked_by, "alice");
    assert!(mgr.sweep_expired("system").unwrap().is_empty());

    mgr.release("R-12", "alice").unwrap();
    assert!(mgr.list_all().unwrap().is_empty());

    mgr.acquire("R-12", "alice").unwrap();
    mgr.force_release("R-12", "supervisor").unwrap();
    assert!(mgr.status("R-12").unwrap().is_none());
}

#[test]
fn test_busy_store_reports_store_error() {
    let (_temp_dir, ctx) = create_test_store();
    let config = crate::config::Config {
        store_mutex_wait_ms: 20,
        ..test_config(30)
    };
    let mgr = LocationLockManager::new(ctx.clone(), &config);
    let _held = acquire_store_mutex(
        &ctx,
        "other",
        "acquire",
        std::time::Duration::ZERO,
        Duration::seconds(60),
    )
    .unwrap();

    let err = mgr.acquire_at("R-12", "alice", at(9, 0)).unwrap_err();

    assert!(matches!(err, BinlockError::StoreError(_)));
    assert!(mgr.status_at("R-12", at(9, 0)).unwrap().is_none());
}

#[test]
fn test_lock_info_display() {
    let (_temp_dir, ctx) = create_test_store();
    let mgr = manager(&ctx);
    mgr.acquire_at("R-12", "alice", at(9, 0)).unwrap();

    let fresh = mgr.status_at("R-12", at(9, 1)).unwrap().unwrap();
    let display = fresh.to_string();
    assert!(display.contains("R-12"));
    assert!(display.contains("A-R12"));
    assert!(display.contains("alice"));
    assert!(!display.contains("STALE"));

    let stale = mgr.status_at("R-12", at(10, 0)).unwrap().unwrap();
    assert!(stale.to_string().contains("STALE"));
    assert_eq!(stale.record(), LockRecord::new("alice", at(9, 0)));
}
