//! Sliding-window rate limiter
//!
//! Keeps the instants of accepted requests per key in memory. State is lost on
//! restart and is not shared between processes.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::config::RateLimitRule;

#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request for `key` if the budget allows it
    ///
    /// Returns `false` when the key already has `max_requests` requests inside
    /// the window. Rejected requests are not recorded.
    pub fn check(&self, key: &str, rule: RateLimitRule) -> bool {
        self.check_at(key, rule, Instant::now())
    }

    pub fn check_at(&self, key: &str, rule: RateLimitRule, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let hits = windows.entry(key.to_string()).or_default();

        hits.retain(|&t| now.duration_since(t) < rule.window);

        if hits.len() >= rule.max_requests {
            return false;
        }

        hits.push(now);
        true
    }

    /// Drop instants older than `max_window` and forget idle keys
    pub fn prune(&self, max_window: Duration, now: Instant) -> usize {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let before = windows.len();

        windows.retain(|_, hits| {
            hits.retain(|&t| now.duration_since(t) < max_window);
            !hits.is_empty()
        });

        before - windows.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
