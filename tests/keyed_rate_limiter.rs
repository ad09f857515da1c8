use std::time::Duration;

use rate_guard_keyed::{
    AdmissionControl, ConfigError, KeyedRateLimiter, ManualClock, RateLimitError, Tokens,
};

const BOB: &str = "Bob";
const ALICE: &str = "Alice";

fn new_limiter(
    capacity: Tokens,
    interval_ms: u64,
    per_interval: Tokens,
) -> (KeyedRateLimiter<String, ManualClock>, ManualClock) {
    let clock = ManualClock::new(0);
    let limiter = KeyedRateLimiter::from_parts(
        capacity,
        Duration::from_millis(interval_ms),
        per_interval,
        clock.clone(),
    )
    .unwrap();
    (limiter, clock)
}

#[test]
fn bursty_traffic_accepts_all_accumulated_requests() {
    let (limiter, clock) = new_limiter(4, 1000, 1);

    // t=0: one seeded token
    assert!(limiter.allowed(BOB));
    clock.advance(1);
    assert!(!limiter.allowed(BOB));

    // t=4001: four periods accumulated, min(0 + 4, 4) = 4
    clock.advance(4000);
    assert!(limiter.allowed(BOB));
    assert!(limiter.allowed(BOB));
    assert!(limiter.allowed(BOB));
    assert!(limiter.allowed(BOB));

    // t=4005: nothing left and no new period
    clock.set(4005);
    assert!(!limiter.allowed(BOB));
}

#[test]
fn no_tokens_after_seed_until_refill() {
    let (limiter, clock) = new_limiter(2, 2000, 1);

    assert!(limiter.allowed(BOB));
    clock.advance(1);
    assert!(!limiter.allowed(BOB));

    // t=2000: exactly one period since creation
    clock.set(2000);
    assert!(limiter.allowed(BOB));
}

#[test]
fn zero_capacity_fails_construction() {
    let result: Result<KeyedRateLimiter<String, ManualClock>, _> =
        KeyedRateLimiter::from_parts(0, Duration::from_secs(1), 1, ManualClock::new(0));
    assert_eq!(result.unwrap_err(), ConfigError::ZeroCapacity);
}

#[test]
fn zero_interval_and_grant_fail_construction() {
    let result: Result<KeyedRateLimiter<String, ManualClock>, _> =
        KeyedRateLimiter::from_parts(4, Duration::ZERO, 1, ManualClock::new(0));
    assert_eq!(result.unwrap_err(), ConfigError::ZeroRefillInterval);

    let result: Result<KeyedRateLimiter<String, ManualClock>, _> =
        KeyedRateLimiter::from_parts(4, Duration::from_secs(1), 0, ManualClock::new(0));
    assert_eq!(result.unwrap_err(), ConfigError::ZeroTokensPerInterval);
}

#[test]
fn first_t_requests_succeed_without_time_advance() {
    let (limiter, _clock) = new_limiter(10, 1000, 6);

    for _ in 0..6 {
        assert!(limiter.allowed(BOB));
    }
    assert!(!limiter.allowed(BOB));
}

#[test]
fn identifiers_do_not_affect_each_other() {
    let (limiter, clock) = new_limiter(3, 1000, 2);

    assert!(limiter.allowed(BOB));
    assert!(limiter.allowed(BOB));
    assert!(!limiter.allowed(BOB));

    // Alice is untouched by Bob's exhaustion
    assert!(limiter.allowed(ALICE));
    assert_eq!(limiter.tokens_remaining(ALICE), Some(1));
    assert_eq!(limiter.tokens_remaining(BOB), Some(0));

    clock.advance(1000);
    assert_eq!(limiter.tokens_remaining(BOB), Some(2));
    assert_eq!(limiter.tokens_remaining(ALICE), Some(3));
}

#[test]
fn buckets_created_at_first_use_time() {
    let (limiter, clock) = new_limiter(5, 1000, 1);

    clock.set(10_000);
    assert!(limiter.allowed(BOB));

    // Time before Bob's first request earns him nothing
    clock.set(10_999);
    assert!(!limiter.allowed(BOB));
    clock.set(11_000);
    assert!(limiter.allowed(BOB));
}

#[test]
fn refill_never_exceeds_capacity() {
    let (limiter, clock) = new_limiter(3, 100, 2);

    assert!(limiter.allowed(BOB));
    clock.advance(10_000);
    assert_eq!(limiter.tokens_remaining(BOB), Some(3));

    for _ in 0..3 {
        assert!(limiter.allowed(BOB));
    }
    assert!(!limiter.allowed(BOB));
}

#[test]
fn zero_time_advance_never_increases_balance() {
    let (limiter, clock) = new_limiter(10, 1000, 4);
    clock.set(500);

    assert!(limiter.allowed(BOB));
    for _ in 0..20 {
        assert_eq!(limiter.tokens_remaining(BOB), Some(3));
    }
}

#[test]
fn tokens_remaining_does_not_create_buckets() {
    let (limiter, _clock) = new_limiter(10, 1000, 4);

    assert_eq!(limiter.tokens_remaining(BOB), None);
    assert!(!limiter.is_tracked(BOB));
    assert_eq!(limiter.tracked_keys(), 0);

    assert!(limiter.allowed(BOB));
    assert!(limiter.is_tracked(BOB));
    assert_eq!(limiter.tracked_keys(), 1);
}

#[test]
fn tracked_keys_grow_per_distinct_identifier() {
    let (limiter, _clock) = new_limiter(1, 1000, 1);

    for i in 0..50 {
        limiter.allowed(format!("caller-{}", i).as_str());
    }
    // Repeat visits do not add entries
    for i in 0..50 {
        assert!(!limiter.allowed(format!("caller-{}", i).as_str()));
    }
    assert_eq!(limiter.tracked_keys(), 50);
}

#[test]
fn check_reports_retry_after() {
    let (limiter, clock) = new_limiter(2, 2000, 1);

    assert_eq!(limiter.check(BOB), Ok(()));

    clock.set(1);
    assert_eq!(
        limiter.check(BOB),
        Err(RateLimitError::InsufficientTokens { retry_after_millis: 1999 })
    );

    // Waiting exactly the advertised time is enough
    clock.set(2000);
    assert_eq!(limiter.check(BOB), Ok(()));
}

#[test]
fn backward_clock_does_not_drain_or_credit() {
    let (limiter, clock) = new_limiter(5, 1000, 3);

    clock.set(5_000);
    assert!(limiter.allowed(BOB)); // 3 -> 2

    // Clock jumps back before the bucket's refill marker
    clock.set(1_000);
    assert_eq!(limiter.tokens_remaining(BOB), Some(2));
    assert!(limiter.allowed(BOB)); // 2 -> 1
    assert!(limiter.allowed(BOB)); // 1 -> 0
    assert!(!limiter.allowed(BOB));

    // Once time passes the marker again, refill resumes from it
    clock.set(6_000);
    assert_eq!(limiter.tokens_remaining(BOB), Some(3));
}

#[test]
fn integer_keys_work() {
    let clock = ManualClock::new(0);
    let limiter: KeyedRateLimiter<u64, _> =
        KeyedRateLimiter::from_parts(1, Duration::from_millis(10), 1, clock.clone()).unwrap();

    assert!(limiter.allowed(&1));
    assert!(!limiter.allowed(&1));
    assert!(limiter.allowed(&2));

    clock.advance(10);
    assert!(limiter.allowed(&1));
}

#[test]
fn usable_as_trait_object() {
    let (limiter, clock) = new_limiter(2, 100, 1);
    let admission: Box<dyn AdmissionControl<str>> = Box::new(limiter);

    assert!(admission.allowed(BOB));
    assert!(!admission.allowed(BOB));
    assert!(matches!(
        admission.check(BOB),
        Err(RateLimitError::InsufficientTokens { .. })
    ));

    clock.advance(100);
    assert_eq!(admission.check(BOB), Ok(()));
}

#[test]
fn exposes_its_configuration() {
    let (limiter, _clock) = new_limiter(4, 1500, 2);

    assert_eq!(limiter.config().capacity, 4);
    assert_eq!(limiter.config().refill_interval, Duration::from_millis(1500));
    assert_eq!(limiter.policy().refill_interval_millis(), 1500);
    assert_eq!(limiter.policy().tokens_per_interval(), 2);
}

#[test]
fn system_clock_limiter_admits_seeded_tokens() {
    use rate_guard_keyed::TokenBucketConfig;

    // An hour-long interval keeps this independent of scheduling delays
    let config = TokenBucketConfig::new(3, Duration::from_secs(3600), 2);
    let limiter: KeyedRateLimiter<String> = KeyedRateLimiter::with_system_clock(config).unwrap();

    assert!(limiter.allowed(BOB));
    assert!(limiter.allowed(BOB));
    assert!(!limiter.allowed(BOB));
}
