//! Security event log
//!
//! Events go to `tracing` under the `security` target and into a bounded ring
//! that the API exposes for inspection.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityEventKind {
    DdosBlocked,
    RateLimitExceeded,
    InputValidationFailed,
    SqlInjectionAttempt,
    XssAttempt,
    PathTraversalAttempt,
    InvalidFilename,
}

impl SecurityEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DdosBlocked => "DDOS_BLOCKED",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::InputValidationFailed => "INPUT_VALIDATION_FAILED",
            Self::SqlInjectionAttempt => "SQL_INJECTION_ATTEMPT",
            Self::XssAttempt => "XSS_ATTEMPT",
            Self::PathTraversalAttempt => "PATH_TRAVERSAL_ATTEMPT",
            Self::InvalidFilename => "INVALID_FILENAME",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SecurityEvent {
    pub timestamp: DateTime<Utc>,
    pub event: SecurityEventKind,
    pub details: Value,
}

#[derive(Debug)]
pub struct SecurityLog {
    capacity: usize,
    events: Mutex<VecDeque<SecurityEvent>>,
}

impl Default for SecurityLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl SecurityLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn record(&self, event: SecurityEventKind, details: Value) {
        warn!(target: "security", event = event.as_str(), %details, "Security event");

        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(SecurityEvent {
            timestamp: Utc::now(),
            event,
            details,
        });
    }

    /// Events, newest first
    pub fn recent(&self) -> Vec<SecurityEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .cloned()
            .collect()
    }
}
