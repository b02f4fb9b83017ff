//! Runtime configuration and security policy

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_HOST: &str = "0.0.0.0";

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Holds `database.sqlite` and the `backups/` directory
    pub data_dir: PathBuf,
    pub security: SecurityConfig,
}

impl Config {
    /// Load from `HOST`, `PORT` and `DASHBOARD_DATA_DIR`, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let data_dir = match env::var("DASHBOARD_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => default_data_dir(),
        };

        Ok(Self {
            host: try_load("HOST", DEFAULT_HOST)?,
            port: try_load("PORT", &DEFAULT_PORT.to_string())?,
            data_dir,
            security: SecurityConfig::default(),
        })
    }

    /// Configuration rooted at an explicit data directory (tests, CLI overrides)
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_dir: data_dir.into(),
            security: SecurityConfig::default(),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("database.sqlite")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Default data directory
/// - Linux: ~/.local/share/dashboard-api/
/// - macOS: ~/Library/Application Support/dashboard-api/
/// - Windows: %APPDATA%/dashboard-api/
///
/// Falls back to `./data` when the platform has no data directory.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("dashboard-api"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let value = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value
        .parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value: {value}"))
}

/// Request budget for one rate-limit identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub max_requests: usize,
    pub window: Duration,
}

impl RateLimitRule {
    pub const fn per_minute(max_requests: usize) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(60),
        }
    }
}

/// Connection tracking policy
#[derive(Debug, Clone)]
pub struct DdosConfig {
    pub enabled: bool,
    /// Connections allowed per IP within `window`
    pub max_connections: usize,
    pub window: Duration,
    pub block_duration: Duration,
    pub whitelist: Vec<String>,
}

impl Default for DdosConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_connections: 1000,
            window: Duration::from_secs(60),
            block_duration: Duration::from_secs(300),
            whitelist: vec!["127.0.0.1".to_string(), "::1".to_string()],
        }
    }
}

/// Security policy applied by the middleware stack
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub rate_limits: HashMap<String, RateLimitRule>,
    /// Budget for identifiers missing from `rate_limits`
    pub default_rate_limit: RateLimitRule,
    pub ddos: DdosConfig,
    /// Largest accepted request body, in bytes
    pub max_body_size: usize,
    pub max_filename_length: usize,
    /// Static response headers
    pub headers: Vec<(&'static str, &'static str)>,
    /// Content-Security-Policy directives, in order
    pub csp: Vec<(&'static str, Vec<&'static str>)>,
}

impl SecurityConfig {
    pub fn rate_limit(&self, identifier: &str) -> RateLimitRule {
        self.rate_limits
            .get(identifier)
            .copied()
            .unwrap_or(self.default_rate_limit)
    }

    /// Render the CSP directive table as a header value
    pub fn content_security_policy(&self) -> String {
        self.csp
            .iter()
            .map(|(directive, sources)| {
                if sources.is_empty() {
                    directive.to_string()
                } else {
                    format!("{} {}", directive, sources.join(" "))
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        let rate_limits = [
            ("export-excel", 10),
            ("export-pdf", 10),
            ("export-json", 20),
            ("export-csv", 20),
            ("chart-interaction", 100),
            ("general", 200),
        ]
        .into_iter()
        .map(|(id, max)| (id.to_string(), RateLimitRule::per_minute(max)))
        .collect();

        Self {
            rate_limits,
            default_rate_limit: RateLimitRule::per_minute(100),
            ddos: DdosConfig::default(),
            max_body_size: 10 * 1024 * 1024,
            max_filename_length: 100,
            headers: vec![
                ("x-content-type-options", "nosniff"),
                ("x-frame-options", "DENY"),
                ("x-xss-protection", "1; mode=block"),
                ("referrer-policy", "strict-origin-when-cross-origin"),
                (
                    "permissions-policy",
                    "geolocation=(), microphone=(), camera=()",
                ),
                (
                    "strict-transport-security",
                    "max-age=31536000; includeSubDomains",
                ),
                ("x-permitted-cross-domain-policies", "none"),
                ("x-download-options", "noopen"),
            ],
            csp: vec![
                ("default-src", vec!["'self'"]),
                ("script-src", vec!["'self'"]),
                ("style-src", vec!["'self'", "'unsafe-inline'"]),
                ("img-src", vec!["'self'", "data:", "blob:"]),
                ("connect-src", vec!["'self'"]),
                ("object-src", vec!["'none'"]),
                ("base-uri", vec!["'self'"]),
                ("form-action", vec!["'self'"]),
                ("frame-ancestors", vec!["'none'"]),
                ("upgrade-insecure-requests", vec![]),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let config = Config::with_data_dir("/tmp/dash");
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/dash/database.sqlite")
        );
        assert_eq!(config.backups_dir(), PathBuf::from("/tmp/dash/backups"));
        assert_eq!(config.address(), "0.0.0.0:3001");
    }

    #[test]
    fn test_default_data_dir() {
        // Should not panic and should name the app directory
        let dir = default_data_dir();
        assert!(dir.ends_with("dashboard-api") || dir.ends_with("data"));
    }

    #[test]
    fn test_rate_limit_lookup() {
        let security = SecurityConfig::default();
        assert_eq!(security.rate_limit("export-pdf").max_requests, 10);
        assert_eq!(security.rate_limit("general").max_requests, 200);
        assert_eq!(security.rate_limit("something-else").max_requests, 100);
        assert_eq!(
            security.rate_limit("export-json").window,
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_content_security_policy() {
        let csp = SecurityConfig::default().content_security_policy();
        assert!(csp.starts_with("default-src 'self'; "));
        assert!(csp.contains("frame-ancestors 'none'"));
        assert!(csp.ends_with("upgrade-insecure-requests"));
    }
}
