//! Shared utilities for commands

use std::path::{Path, PathBuf};

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Render a stored RFC 3339 timestamp as `YYYY-MM-DD HH:MM`, or as-is if unparsable
pub fn format_timestamp(timestamp: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

/// Where to write a generated file
///
/// No `--output` writes `default_name` into the current directory; an output
/// that is an existing directory receives `default_name` inside it.
pub fn output_path(output: Option<&str>, default_name: &str) -> PathBuf {
    match output {
        None => PathBuf::from(default_name),
        Some(path) if Path::new(path).is_dir() => Path::new(path).join(default_name),
        Some(path) => PathBuf::from(path),
    }
}
