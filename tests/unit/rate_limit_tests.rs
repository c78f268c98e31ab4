// ==============================
// tests/unit/rate_limit_tests.rs
// ==============================
//! Tests for the fixed-window rate limiter
use polifinder_backend_lib::rate_limit::{RateLimitDecision, RateLimitRule, RateLimiter};
use std::time::{Duration, Instant};

const LOGIN: RateLimitRule = RateLimitRule::new(5, 60);

#[test]
fn test_rate_limiter_allows_initial_attempts() {
    let limiter = RateLimiter::new();
    assert_eq!(
        limiter.check_and_consume("127.0.0.1", "login", &LOGIN),
        RateLimitDecision::Allowed { remaining: 4 }
    );
}

#[test]
fn test_rate_limiter_blocks_after_max_attempts() {
    let limiter = RateLimiter::new();
    let start = Instant::now();
    for _ in 0..5 {
        assert!(limiter.check_and_consume_at("127.0.0.2", "login", &LOGIN, start).is_allowed());
    }

    match limiter.check_and_consume_at("127.0.0.2", "login", &LOGIN, start + Duration::from_secs(1)) {
        RateLimitDecision::Limited { retry_after } => {
            assert!(retry_after > Duration::ZERO && retry_after <= LOGIN.window());
        }
        other => panic!("expected Limited, got {other:?}"),
    }
}

#[test]
fn test_rate_limiter_resets_after_window() {
    let limiter = RateLimiter::new();
    let start = Instant::now();
    for _ in 0..6 {
        limiter.check_and_consume_at("127.0.0.3", "login", &LOGIN, start);
    }
    assert!(limiter
        .check_and_consume_at("127.0.0.3", "login", &LOGIN, start + LOGIN.window())
        .is_allowed());
}

#[test]
fn test_denied_requests_do_not_extend_window() {
    let limiter = RateLimiter::new();
    let start = Instant::now();
    for _ in 0..5 {
        limiter.check_and_consume_at("127.0.0.4", "login", &LOGIN, start);
    }
    for secs in [10, 20, 30] {
        assert!(!limiter
            .check_and_consume_at("127.0.0.4", "login", &LOGIN, start + Duration::from_secs(secs))
            .is_allowed());
    }
    assert!(limiter
        .check_and_consume_at("127.0.0.4", "login", &LOGIN, start + Duration::from_secs(60))
        .is_allowed());
}
