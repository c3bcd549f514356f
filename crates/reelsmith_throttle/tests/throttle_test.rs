//! Tests for the submission throttle and retry policy.

use reelsmith_throttle::{ProviderProfile, RetryPolicy, SubmissionThrottle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

fn profile(max_concurrent: u32, cooldown_secs: f64) -> ProviderProfile {
    let mut profile = ProviderProfile::new("test");
    profile.max_concurrent = max_concurrent;
    profile.submit_cooldown_secs = cooldown_secs;
    profile
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_ceiling_is_never_exceeded() {
    let throttle = SubmissionThrottle::new(&profile(2, 0.0));
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..6 {
        let throttle = throttle.clone();
        let active = active.clone();
        let peak = peak.clone();
        handles.push(tokio::spawn(async move {
            let _slot = throttle.acquire_slot().await.unwrap();
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(3)).await;
            active.fetch_sub(1, Ordering::SeqCst);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(peak.load(Ordering::SeqCst), 2);
    assert_eq!(throttle.available_slots(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_spaces_accepted_submissions() {
    let throttle = SubmissionThrottle::new(&profile(4, 5.0));
    let mut accepted_at = Vec::new();

    for _ in 0..3 {
        let ticket = throttle.admit().await;
        accepted_at.push(Instant::now());
        ticket.accepted();
    }

    for pair in accepted_at.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_secs(5));
    }
    assert!(throttle.last_accepted().await.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_dropped_ticket_does_not_start_cooldown() {
    let throttle = SubmissionThrottle::new(&profile(1, 30.0));

    let start = Instant::now();
    let ticket = throttle.admit().await;
    drop(ticket);
    let _again = throttle.admit().await;

    assert_eq!(Instant::now() - start, Duration::ZERO);
    assert!(throttle.last_accepted().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_submitters_pass_one_at_a_time() {
    let throttle = SubmissionThrottle::new(&profile(3, 2.0));
    let mut handles = Vec::new();

    for _ in 0..3 {
        let throttle = throttle.clone();
        handles.push(tokio::spawn(async move {
            let ticket = throttle.admit().await;
            let at = Instant::now();
            ticket.accepted();
            at
        }));
    }

    let mut times = Vec::new();
    for handle in handles {
        times.push(handle.await.unwrap());
    }
    times.sort();
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_secs(2));
    }
}

#[tokio::test]
async fn test_closed_throttle_refuses_slots() {
    let throttle = SubmissionThrottle::new(&profile(1, 0.0));
    throttle.close();

    let err = throttle.acquire_slot().await.unwrap_err();
    assert_eq!(err.reason_code(), "cancelled");
}

#[test]
fn test_backoff_grows_strictly_until_cap() {
    let policy = RetryPolicy {
        max_retries: 8,
        backoff_base: 2,
        backoff_unit_ms: 100,
        max_backoff: Duration::from_secs(5),
    };

    let delays: Vec<Duration> = policy.delays().collect();
    assert_eq!(delays.len(), 8);
    assert_eq!(delays[0], Duration::from_millis(200));
    assert_eq!(delays[1], Duration::from_millis(400));

    let cap = Duration::from_secs(5);
    for pair in delays.windows(2) {
        assert!(pair[1] > pair[0] || pair[1] == cap);
    }
    assert!(delays.iter().all(|d| *d <= cap));
    assert_eq!(delays[7], cap);
}

#[test]
fn test_retry_budget_is_bounded() {
    let policy = ProviderProfile::new("test").retry_policy();
    assert_eq!(policy.max_retries, 3);

    assert!(policy.allows(0));
    assert!(policy.allows(2));
    assert!(!policy.allows(3));

    assert!(policy.delay_for_retry(0).is_none());
    assert_eq!(policy.delay_for_retry(1), Some(Duration::from_secs(2)));
    assert_eq!(policy.delay_for_retry(3), Some(Duration::from_secs(8)));
    assert!(policy.delay_for_retry(4).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_nested_throttle_keeps_shared_ceiling() {
    let shared = SubmissionThrottle::new(&profile(1, 0.0));
    let looser = shared.nested(&profile(3, 0.0));
    let stricter = shared.nested(&profile(1, 0.0));
    assert_eq!(looser.max_concurrent(), 1);

    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::new();
    for throttle in [shared.clone(), looser.clone(), looser, stricter.clone(), stricter] {
        let active = active.clone();
        let peak = peak.clone();
        handles.push(tokio::spawn(async move {
            let _slot = throttle.acquire_slot().await.unwrap();
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(2)).await;
            active.fetch_sub(1, Ordering::SeqCst);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert_eq!(shared.available_slots(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_nested_throttle_waits_out_shared_cooldown() {
    let shared = SubmissionThrottle::new(&profile(4, 5.0));
    let nested = shared.nested(&profile(4, 1.0));
    assert_eq!(nested.cooldown(), Duration::from_secs(5));

    let start = Instant::now();
    shared.admit().await.accepted();
    nested.admit().await.accepted();
    assert!(Instant::now() - start >= Duration::from_secs(5));

    // The nested submission started the shared cooldown too.
    let before = Instant::now();
    shared.admit().await.accepted();
    assert!(Instant::now() - before >= Duration::from_secs(5));
}
