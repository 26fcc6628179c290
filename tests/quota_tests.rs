//! Integration tests for the quota tracker.

use std::sync::Arc;

use chrono::Duration;
use sharepass::clock::{Clock, ManualClock};
use sharepass::config::Limits;
use sharepass::identity::{client_identity, hash_identity};
use sharepass::quota::{Admission, QuotaTracker};
use sharepass::store::Database;

fn tracker_with(limits: Limits) -> (QuotaTracker, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::starting_now());
    let db = Arc::new(Database::open_in_memory().expect("open db"));
    (QuotaTracker::new(db, clock.clone(), limits), clock)
}

fn tracker() -> (QuotaTracker, Arc<ManualClock>) {
    tracker_with(Limits::default())
}

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

#[test]
fn denied_exactly_when_uses_reach_limit_inside_window() {
    let (quota, clock) = tracker();
    let who = hash_identity("192.0.2.10");

    for used in 0..5 {
        assert_eq!(quota.admit(&who).unwrap(), Admission::Allowed, "after {used} uses");
        quota.record_use(&who).unwrap();
        clock.advance(Duration::minutes(1));
    }
    assert_eq!(quota.admit(&who).unwrap(), Admission::Denied);

    // last_access moved with every use, so the window runs from the fifth.
    clock.advance(Duration::minutes(58));
    assert_eq!(quota.admit(&who).unwrap(), Admission::Denied);

    clock.advance(Duration::minutes(1));
    assert_eq!(quota.admit(&who).unwrap(), Admission::Allowed);
}

#[test]
fn renewal_is_a_hard_reset() {
    let (quota, clock) = tracker();
    let who = hash_identity("192.0.2.11");

    for _ in 0..3 {
        quota.record_use(&who).unwrap();
    }
    clock.advance(Duration::hours(2));
    quota.record_use(&who).unwrap();

    assert_eq!(quota.get(&who).unwrap().unwrap().uses, 1);
}

#[test]
fn identities_are_independent() {
    let (quota, _) = tracker();
    let busy = hash_identity("192.0.2.12");
    let idle = hash_identity("192.0.2.13");

    for _ in 0..5 {
        quota.record_use(&busy).unwrap();
    }
    assert_eq!(quota.admit(&busy).unwrap(), Admission::Denied);
    assert_eq!(quota.admit(&idle).unwrap(), Admission::Allowed);
}

#[test]
fn forwarded_clients_share_quota_with_direct_ones() {
    let (quota, _) = tracker();
    let direct = client_identity(None, "203.0.113.5");
    let proxied = client_identity(Some("203.0.113.5, 10.0.0.1"), "10.0.0.254");
    assert_eq!(direct, proxied);

    quota.record_use(&direct).unwrap();
    assert_eq!(quota.get(&proxied).unwrap().unwrap().uses, 1);
}

#[test]
fn custom_limit_is_honored() {
    let (quota, _) = tracker_with(Limits {
        max_uses: 1,
        ..Limits::default()
    });
    let who = hash_identity("192.0.2.14");

    assert_eq!(quota.reserve(&who).unwrap(), Admission::Allowed);
    assert_eq!(quota.reserve(&who).unwrap(), Admission::Denied);
}

// ---------------------------------------------------------------------------
// Renewal countdown
// ---------------------------------------------------------------------------

#[test]
fn time_to_renewal_counts_down_and_clamps() {
    let (quota, clock) = tracker();
    let who = hash_identity("192.0.2.15");

    assert_eq!(quota.time_to_renewal(&who).unwrap(), Duration::minutes(60));

    quota.record_use(&who).unwrap();
    clock.advance(Duration::minutes(20));
    assert_eq!(quota.time_to_renewal(&who).unwrap(), Duration::minutes(40));

    clock.advance(Duration::minutes(45));
    // Stale now, so the full window is reported again.
    assert_eq!(quota.time_to_renewal(&who).unwrap(), Duration::minutes(60));
    assert!(quota.get(&who).unwrap().is_none());
}

#[test]
fn status_when_limit_reached() {
    let (quota, clock) = tracker();
    let who = hash_identity("192.0.2.16");

    for _ in 0..5 {
        quota.reserve(&who).unwrap();
    }
    clock.advance(Duration::minutes(30) + Duration::seconds(30));

    let status = quota.status(&who).unwrap();
    assert!(status.limit_reached);
    assert_eq!(status.remaining_uses, 0);
    assert_eq!(status.renewal_hours(), 0);
    assert_eq!(status.renewal_minutes(), 29);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_reservations_never_exceed_limit() {
    let (quota, clock) = tracker();
    let who = hash_identity("192.0.2.17");

    let allowed = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| scope.spawn(|| quota.reserve(&who).unwrap()))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|a| *a == Admission::Allowed)
            .count()
    });

    assert_eq!(allowed, 5);
    let record = quota.get(&who).unwrap().unwrap();
    assert_eq!(record.uses, 5);
    assert_eq!(record.last_access, clock.now());
}
