//! Per-IP connection tracking with temporary blocks

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use crate::config::DdosConfig;

/// Outcome of admitting one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// The IP is serving an earlier block
    Blocked,
    /// This connection pushed the IP over the limit; it is now blocked
    NewlyBlocked { connections: usize },
}

#[derive(Debug, Default)]
struct TrackerState {
    connections: HashMap<String, Vec<Instant>>,
    blocked: HashMap<String, Instant>,
}

#[derive(Debug)]
pub struct ConnectionTracker {
    config: DdosConfig,
    state: Mutex<TrackerState>,
}

impl ConnectionTracker {
    pub fn new(config: DdosConfig) -> Self {
        Self {
            config,
            state: Mutex::new(TrackerState::default()),
        }
    }

    pub fn admit(&self, ip: &str) -> Admission {
        self.admit_at(ip, Instant::now())
    }

    pub fn admit_at(&self, ip: &str, now: Instant) -> Admission {
        if !self.config.enabled || self.config.whitelist.iter().any(|w| w == ip) {
            return Admission::Allowed;
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(&until) = state.blocked.get(ip) {
            if now < until {
                return Admission::Blocked;
            }
            state.blocked.remove(ip);
        }

        let window = self.config.window;
        let connections = state.connections.entry(ip.to_string()).or_default();
        connections.push(now);
        connections.retain(|&t| now.duration_since(t) < window);
        let count = connections.len();

        if count > self.config.max_connections {
            state
                .blocked
                .insert(ip.to_string(), now + self.config.block_duration);
            return Admission::NewlyBlocked { connections: count };
        }

        Admission::Allowed
    }

    /// Lift expired blocks and forget IPs with no recent connections
    pub fn prune(&self, now: Instant) -> usize {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let window = self.config.window;

        state.blocked.retain(|_, until| now < *until);

        let before = state.connections.len();
        state.connections.retain(|_, times| {
            times.retain(|&t| now.duration_since(t) < window);
            !times.is_empty()
        });

        before - state.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tracker(max_connections: usize) -> ConnectionTracker {
        ConnectionTracker::new(DdosConfig {
            max_connections,
            ..DdosConfig::default()
        })
    }

    #[test]
    fn test_blocks_after_limit() {
        let tracker = tracker(2);
        let now = Instant::now();

        assert_eq!(tracker.admit_at("10.0.0.1", now), Admission::Allowed);
        assert_eq!(tracker.admit_at("10.0.0.1", now), Admission::Allowed);
        assert_eq!(
            tracker.admit_at("10.0.0.1", now),
            Admission::NewlyBlocked { connections: 3 }
        );
        assert_eq!(tracker.admit_at("10.0.0.1", now), Admission::Blocked);
        assert_eq!(tracker.admit_at("10.0.0.2", now), Admission::Allowed);
    }

    #[test]
    fn test_block_expires() {
        let tracker = tracker(1);
        let start = Instant::now();

        tracker.admit_at("10.0.0.1", start);
        tracker.admit_at("10.0.0.1", start);
        assert_eq!(
            tracker.admit_at("10.0.0.1", start + Duration::from_secs(299)),
            Admission::Blocked
        );

        // Block over and the old connections have left the window
        assert_eq!(
            tracker.admit_at("10.0.0.1", start + Duration::from_secs(300)),
            Admission::Allowed
        );
    }

    #[test]
    fn test_whitelist_bypasses_tracking() {
        let tracker = tracker(0);
        let now = Instant::now();

        for _ in 0..10 {
            assert_eq!(tracker.admit_at("127.0.0.1", now), Admission::Allowed);
        }
        assert!(matches!(
            tracker.admit_at("192.168.1.5", now),
            Admission::NewlyBlocked { .. }
        ));
    }

    #[test]
    fn test_disabled_admits_everything() {
        let tracker = ConnectionTracker::new(DdosConfig {
            enabled: false,
            max_connections: 0,
            ..DdosConfig::default()
        });

        assert_eq!(tracker.admit("10.0.0.1"), Admission::Allowed);
        assert_eq!(tracker.admit("10.0.0.1"), Admission::Allowed);
    }

    #[test]
    fn test_prune() {
        let tracker = tracker(10);
        let start = Instant::now();

        tracker.admit_at("10.0.0.1", start);
        tracker.admit_at("10.0.0.2", start + Duration::from_secs(50));

        assert_eq!(tracker.prune(start + Duration::from_secs(70)), 1);
    }
}
