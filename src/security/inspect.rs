//! Input sanitization and injection pattern detection

use regex::Regex;
use std::sync::LazyLock;

/// Which family of patterns matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threat {
    SqlInjection,
    Xss,
}

/// A detected threat and the pattern that caught it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub threat: Threat,
    pub pattern: &'static str,
}

const SQL_PATTERNS: [&str; 4] = [
    r"(?i)\b(SELECT|INSERT|UPDATE|DELETE|DROP|CREATE|ALTER|EXEC|UNION|SCRIPT)\b",
    r"(?i)\b(OR|AND)\s+\d+\s*=\s*\d+",
    r#"(?i)\b(OR|AND)\s+['"]?\w+['"]?\s*=\s*['"]?\w+['"]?"#,
    r"(?i)(--|/\*|\*/|xp_|sp_)",
];

const XSS_PATTERNS: [&str; 6] = [
    r"(?is)<script\b.*?</script>",
    r"(?i)javascript:",
    r"(?i)on\w+\s*=",
    r"(?is)<iframe\b.*?</iframe>",
    r"(?i)vbscript:",
    r"(?i)data:text/html",
];

static SQL_REGEXES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| compile(&SQL_PATTERNS));
static XSS_REGEXES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| compile(&XSS_PATTERNS));

// Stripped by sanitize_input, in order
static SANITIZE_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?is)<script\b.*?</script>",
        r"(?i)javascript:",
        r"(?i)on\w+\s*=",
        r"(?is)<iframe\b.*?</iframe>",
        r"(?i)vbscript:",
        r"(?i)data:",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

const FILENAME_BLOCKED: [&str; 5] = ["..", "//", "\\", "script", "javascript"];

fn compile(patterns: &[&'static str]) -> Vec<(&'static str, Regex)> {
    // Patterns are constants covered by tests, so a failure here is a typo
    patterns
        .iter()
        .filter_map(|&p| Regex::new(p).ok().map(|re| (p, re)))
        .collect()
}

/// Strip script-bearing fragments from user-supplied text
pub fn sanitize_input(input: &str) -> String {
    SANITIZE_REGEXES
        .iter()
        .fold(input.to_string(), |acc, re| re.replace_all(&acc, "").into_owned())
        .trim()
        .to_string()
}

/// Scan text for SQL injection, then XSS patterns
pub fn detect_threat(text: &str) -> Option<Finding> {
    let scan = |threat, regexes: &[(&'static str, Regex)]| {
        regexes
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|&(pattern, _)| Finding { threat, pattern })
    };

    scan(Threat::SqlInjection, &SQL_REGEXES).or_else(|| scan(Threat::Xss, &XSS_REGEXES))
}

/// Check a filename is safe to hand to a browser download
pub fn validate_filename(filename: &str, max_length: usize) -> bool {
    if filename.is_empty() || filename.chars().count() > max_length {
        return false;
    }

    if !filename
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return false;
    }

    let lower = filename.to_lowercase();
    !FILENAME_BLOCKED.iter().any(|blocked| lower.contains(blocked))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(SQL_REGEXES.len(), SQL_PATTERNS.len());
        assert_eq!(XSS_REGEXES.len(), XSS_PATTERNS.len());
        assert_eq!(SANITIZE_REGEXES.len(), 6);
    }

    #[test]
    fn test_sanitize_input() {
        assert_eq!(sanitize_input("  week-revenue  "), "week-revenue");
        assert_eq!(
            sanitize_input("a<script>alert(1)</script>b"),
            "ab"
        );
        assert_eq!(
            sanitize_input("<SCRIPT type=\"x\">\nsteal()\n</SCRIPT>ok"),
            "ok"
        );
        assert_eq!(sanitize_input("javascript:alert(1)"), "alert(1)");
        assert_eq!(sanitize_input("<img onerror=x>"), "<img x>");
        assert_eq!(sanitize_input("<iframe src=a></iframe>report"), "report");
        assert_eq!(sanitize_input("data:text/plain"), "text/plain");
    }

    #[test]
    fn test_detect_sql_injection() {
        let finding = detect_threat(r#"{"dataType":"sales' OR 1=1"}"#).unwrap();
        assert_eq!(finding.threat, Threat::SqlInjection);

        let finding = detect_threat(r#"{"q":"x; DROP TABLE backups"}"#).unwrap();
        assert_eq!(finding.threat, Threat::SqlInjection);

        assert!(detect_threat(r#"{"q":"a -- comment"}"#).is_some());
    }

    #[test]
    fn test_detect_xss() {
        let finding = detect_threat(r#"{"name":"<iframe src=x></iframe>"}"#).unwrap();
        assert_eq!(finding.threat, Threat::Xss);

        // SCRIPT is also an SQL keyword, so the SQL scan reports it first
        assert!(detect_threat(r#"{"name":"<script>alert(1)</script>"}"#).is_some());

        let finding = detect_threat(r#"{"url":"javascript:void(0)"}"#).unwrap();
        assert_eq!(finding.threat, Threat::Xss);

        assert!(detect_threat(r#"{"img":"<img onload = x>"}"#).is_some());
    }

    #[test]
    fn test_clean_payloads_pass() {
        assert!(detect_threat(
            r#"{"format":"csv","dataType":"sales","selectedPeriod":"week"}"#
        )
        .is_none());
        assert!(detect_threat(r#"{"backupType":"manual","includeData":true}"#).is_none());
        assert!(detect_threat(r#"{"conversion_rate":"1"}"#).is_none());
        assert!(detect_threat("{}").is_none());
    }

    #[test]
    fn test_validate_filename() {
        assert!(validate_filename("dashboard-export-sales-2025.csv", 100));
        assert!(validate_filename("week_revenue.xlsx", 100));

        assert!(!validate_filename("", 100));
        assert!(!validate_filename("../etc/passwd", 100));
        assert!(!validate_filename("a..b.csv", 100));
        assert!(!validate_filename("my file.csv", 100));
        assert!(!validate_filename("JavaScript.json", 100));
        assert!(!validate_filename("postscript.pdf", 100));
        assert!(!validate_filename(&"a".repeat(101), 100));
    }
}
