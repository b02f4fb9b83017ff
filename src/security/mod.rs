//! Request-scoped security: rate limiting, connection tracking, input
//! inspection and the security event log

pub mod connections;
pub mod events;
pub mod inspect;
pub mod rate_limit;

use std::time::{Duration, Instant};

use crate::config::SecurityConfig;

pub use connections::{Admission, ConnectionTracker};
pub use events::{SecurityEvent, SecurityEventKind, SecurityLog};
pub use inspect::{detect_threat, sanitize_input, validate_filename, Finding, Threat};
pub use rate_limit::RateLimiter;

/// Security state shared by the middleware stack and handlers
#[derive(Debug)]
pub struct Security {
    pub config: SecurityConfig,
    pub limiter: RateLimiter,
    pub connections: ConnectionTracker,
    pub log: SecurityLog,
}

impl Security {
    pub fn new(config: SecurityConfig) -> Self {
        Self {
            limiter: RateLimiter::new(),
            connections: ConnectionTracker::new(config.ddos.clone()),
            log: SecurityLog::default(),
            config,
        }
    }

    /// Apply the budget for `identifier` to one client
    pub fn allow(&self, identifier: &str, client_ip: &str) -> bool {
        let rule = self.config.rate_limit(identifier);
        self.limiter.check(&format!("{identifier}:{client_ip}"), rule)
    }

    /// Drop expired rate-limit and connection state
    pub fn prune(&self) -> (usize, usize) {
        let now = Instant::now();
        let longest_window = self
            .config
            .rate_limits
            .values()
            .map(|rule| rule.window)
            .chain(std::iter::once(self.config.default_rate_limit.window))
            .max()
            .unwrap_or(Duration::from_secs(60));

        (
            self.limiter.prune(longest_window, now),
            self.connections.prune(now),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitRule;

    #[test]
    fn test_allow_uses_identifier_budget() {
        let mut config = SecurityConfig::default();
        config
            .rate_limits
            .insert("export-pdf".to_string(), RateLimitRule::per_minute(2));
        let security = Security::new(config);

        assert!(security.allow("export-pdf", "1.1.1.1"));
        assert!(security.allow("export-pdf", "1.1.1.1"));
        assert!(!security.allow("export-pdf", "1.1.1.1"));

        // Separate budgets per client and per identifier
        assert!(security.allow("export-pdf", "2.2.2.2"));
        assert!(security.allow("export-json", "1.1.1.1"));
    }

    #[test]
    fn test_prune_on_fresh_state() {
        let security = Security::new(SecurityConfig::default());
        assert_eq!(security.prune(), (0, 0));
    }
}
