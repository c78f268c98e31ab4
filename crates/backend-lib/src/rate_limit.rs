// ============================
// crates/backend-lib/src/rate_limit.rs
// ============================
//! Fixed-window rate limiting keyed by caller identity and rule name.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Maximum number of requests allowed per fixed window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRule {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl RateLimitRule {
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The request was counted; `remaining` more fit in the current window
    Allowed { remaining: u32 },
    /// The budget is spent until the window resets
    Limited { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RateLimitKey {
    identity: String,
    rule: String,
}

/// Entry in the rate limit map
#[derive(Debug, Clone)]
struct RateLimitEntry {
    /// Requests counted in the current window
    count: u32,
    /// When the current window opened
    window_start: Instant,
    /// Window length of the rule that created the entry
    window: Duration,
}

impl RateLimitEntry {
    fn fresh(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            window_start: now,
            window,
        }
    }

    fn expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.window_start) >= self.window
    }
}

/// Counter store shared by every request handler
#[derive(Debug, Default)]
pub struct RateLimiter {
    entries: DashMap<RateLimitKey, RateLimitEntry>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request from `identity` against the rule called `rule_name`
    pub fn check_and_consume(
        &self,
        identity: &str,
        rule_name: &str,
        rule: &RateLimitRule,
    ) -> RateLimitDecision {
        self.check_and_consume_at(identity, rule_name, rule, Instant::now())
    }

    /// Same as [`check_and_consume`](Self::check_and_consume) with an explicit clock
    pub fn check_and_consume_at(
        &self,
        identity: &str,
        rule_name: &str,
        rule: &RateLimitRule,
        now: Instant,
    ) -> RateLimitDecision {
        let key = RateLimitKey {
            identity: identity.to_string(),
            rule: rule_name.to_string(),
        };
        let window = rule.window();

        // The entry guard holds the shard lock, so the whole
        // read-increment-compare below is atomic per key.
        let mut entry = self
            .entries
            .entry(key)
            .or_insert_with(|| RateLimitEntry {
                count: 0,
                window_start: now,
                window,
            });

        if entry.count == 0 || entry.expired_at(now) {
            *entry = RateLimitEntry::fresh(now, window);
            return RateLimitDecision::Allowed {
                remaining: rule.max_requests.saturating_sub(1),
            };
        }

        if entry.count >= rule.max_requests {
            let elapsed = now.saturating_duration_since(entry.window_start);
            return RateLimitDecision::Limited {
                retry_after: entry.window.saturating_sub(elapsed),
            };
        }

        entry.count += 1;
        RateLimitDecision::Allowed {
            remaining: rule.max_requests - entry.count,
        }
    }

    /// Drop every entry whose window has elapsed
    pub fn cleanup(&self) {
        self.cleanup_at(Instant::now());
    }

    pub fn cleanup_at(&self, now: Instant) {
        self.entries.retain(|_, entry| !entry.expired_at(now));
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
