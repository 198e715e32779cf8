#![allow(clippy::unwrap_used, clippy::expect_used)]

use fineprint_core::ratelimit::{global_key, user_key, ManualClock, SlidingWindowLimiter};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(3600);

// ---- Helpers ----

fn limiter_with_manual_clock() -> (Arc<ManualClock>, Arc<SlidingWindowLimiter>) {
    let clock = Arc::new(ManualClock::new());
    let limiter = Arc::new(SlidingWindowLimiter::with_clock(clock.clone()));
    (clock, limiter)
}

// ---- Scenarios ----

#[test]
fn test_three_per_hour() {
    let (clock, limiter) = limiter_with_manual_clock();
    let key = user_key("someone@example.com");

    for _ in 0..3 {
        assert!(limiter.is_allowed(&key, 3, HOUR));
    }
    assert!(!limiter.is_allowed(&key, 3, HOUR));

    clock.advance(HOUR + Duration::from_secs(1));
    assert!(limiter.is_allowed(&key, 3, HOUR));
}

#[test]
fn test_unrelated_keys_do_not_interact() {
    let (_, limiter) = limiter_with_manual_clock();
    let alice = user_key("alice@example.com");
    let bob = user_key("bob@example.com");

    assert!(limiter.is_allowed(&alice, 1, HOUR));
    assert!(limiter.is_allowed(&bob, 1, HOUR));
    assert!(!limiter.is_allowed(&alice, 1, HOUR));
    assert!(!limiter.is_allowed(&bob, 1, HOUR));
    assert!(limiter.is_allowed(&global_key("detection"), 1, HOUR));
}

#[test]
fn test_normalized_addresses_share_a_bucket() {
    let (_, limiter) = limiter_with_manual_clock();
    assert!(limiter.is_allowed(&user_key("Jane.Doe+promo@gmail.com"), 1, HOUR));
    assert!(!limiter.is_allowed(&user_key("janedoe@googlemail.com"), 1, HOUR));
}

#[test]
fn test_concurrent_callers_never_exceed_limit() {
    let (_, limiter) = limiter_with_manual_clock();
    let limit = 50;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            thread::spawn(move || {
                (0..100)
                    .filter(|_| limiter.is_allowed("global:shared", limit, HOUR))
                    .count()
            })
        })
        .collect();

    let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(admitted, limit);
    assert_eq!(limiter.current_count("global:shared", HOUR), limit);
}

#[test]
fn test_sweep_keeps_live_buckets_and_correctness_without_it() {
    let (clock, limiter) = limiter_with_manual_clock();
    for i in 0..10 {
        assert!(limiter.is_allowed(&format!("user:{i}@example.com"), 1, Duration::from_secs(60)));
    }
    assert_eq!(limiter.bucket_count(), 10);

    clock.advance(Duration::from_secs(61));
    // Expired buckets still behave correctly before any sweep
    assert!(limiter.is_allowed("user:0@example.com", 1, Duration::from_secs(60)));

    assert_eq!(limiter.sweep(), 9);
    assert_eq!(limiter.bucket_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_background_sweeper_lifecycle() {
    let (clock, limiter) = limiter_with_manual_clock();
    assert!(limiter.is_allowed("user:a@example.com", 1, Duration::from_secs(1)));
    clock.advance(Duration::from_secs(2));

    let handle = limiter.spawn_sweeper(Duration::from_secs(300));
    assert_eq!(limiter.bucket_count(), 1);

    tokio::time::sleep(Duration::from_secs(301)).await;
    assert_eq!(limiter.bucket_count(), 0);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_stops_sweeper() {
    let (_, limiter) = limiter_with_manual_clock();
    let handle = limiter.spawn_sweeper(Duration::from_secs(1));
    drop(handle);

    tokio::time::sleep(Duration::from_secs(5)).await;
    // Only the test still holds the limiter once the task has exited
    assert_eq!(Arc::strong_count(&limiter), 1);
}
