//! Export pipeline
//!
//! format selection → data shaping → format-specific generation. The result is
//! an in-memory file the server streams back as a download and the CLI writes
//! to disk.

mod delimited;
mod json;
mod pdf;
mod spreadsheet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::data::{DataType, Dataset, Period, Series, Summary};
use crate::error::AppError;
use crate::security;

/// Output format for data export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Excel,
    Csv,
    Json,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [Self::Excel, Self::Csv, Self::Json, Self::Pdf];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "excel" | "xlsx" => Some(Self::Excel),
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::Excel => "excel",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Pdf => "pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Excel => "xlsx",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Pdf => "pdf",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Csv => "text/csv",
            Self::Json => "application/json",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Excel => "Excel (.xlsx)",
            Self::Csv => "CSV (.csv)",
            Self::Json => "JSON (.json)",
            Self::Pdf => "PDF Report (.pdf)",
        }
    }

    /// Rate-limit identifier for exports in this format
    pub fn rate_limit_identifier(self) -> &'static str {
        match self {
            Self::Excel => "export-excel",
            Self::Csv => "export-csv",
            Self::Json => "export-json",
            Self::Pdf => "export-pdf",
        }
    }
}

/// Body of `POST /api/export/data`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub format: String,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub selected_period: Option<String>,
    #[serde(default)]
    pub selected_metric: Option<String>,
    #[serde(default)]
    pub include_summary: Option<bool>,
}

/// A validated export request
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpec {
    pub format: ExportFormat,
    pub data_type: DataType,
    pub period: Period,
    pub metric: Option<String>,
    pub include_summary: bool,
}

impl ExportSpec {
    pub fn new(format: ExportFormat, data_type: DataType, period: Period) -> Self {
        Self {
            format,
            data_type,
            period,
            metric: None,
            include_summary: true,
        }
    }

    pub fn from_request(request: &ExportRequest) -> Result<Self, AppError> {
        let format = ExportFormat::from_str(&request.format)
            .ok_or_else(|| AppError::bad_request("Invalid export format"))?;

        let data_type = match request.data_type.as_deref() {
            None => DataType::Sales,
            Some(s) => DataType::from_str(s)
                .ok_or_else(|| AppError::bad_request(format!("Invalid data type: {s}")))?,
        };

        let period = match request.selected_period.as_deref() {
            None => Period::Week,
            Some(s) => Period::from_str(s)
                .ok_or_else(|| AppError::bad_request(format!("Invalid period: {s}")))?,
        };

        Ok(Self {
            format,
            data_type,
            period,
            metric: request
                .selected_metric
                .as_deref()
                .map(security::sanitize_input)
                .filter(|m| !m.is_empty()),
            include_summary: request.include_summary.unwrap_or(true),
        })
    }
}

/// A generated export, ready for download
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Everything a format writer needs
pub(crate) struct Report<'a> {
    pub dataset: &'a Dataset,
    pub metric: &'a Series,
    pub summary: Option<Summary>,
    pub format: ExportFormat,
    pub generated_at: DateTime<Utc>,
}

/// Run the export pipeline
pub fn export(
    spec: &ExportSpec,
    generated_at: DateTime<Utc>,
    max_filename_length: usize,
) -> Result<ExportFile, AppError> {
    let dataset = Dataset::sample(spec.data_type, spec.period);

    if !dataset.validate() {
        return Err(AppError::bad_request("Invalid data for export"));
    }

    let metric = dataset.primary_series(spec.metric.as_deref()).ok_or_else(|| {
        AppError::bad_request(format!(
            "Unknown metric for {}: {}",
            spec.data_type,
            spec.metric.as_deref().unwrap_or_default()
        ))
    })?;

    let filename = export_filename(spec.data_type, spec.format, generated_at);
    if !security::validate_filename(&filename, max_filename_length) {
        return Err(AppError::InvalidFilename(filename));
    }

    let report = Report {
        dataset: &dataset,
        metric,
        summary: if spec.include_summary {
            Summary::of(metric)
        } else {
            None
        },
        format: spec.format,
        generated_at,
    };

    let bytes = match spec.format {
        ExportFormat::Excel => spreadsheet::write(&report)?,
        ExportFormat::Csv => delimited::write(&report)?,
        ExportFormat::Json => json::write(&report)?,
        ExportFormat::Pdf => pdf::write(&report)?,
    };

    debug!(
        filename = %filename,
        rows = dataset.labels.len(),
        bytes = bytes.len(),
        "Export generated"
    );

    Ok(ExportFile {
        filename,
        content_type: spec.format.content_type(),
        bytes,
    })
}

/// `dashboard-export-{dataType}-{timestamp}.{ext}`, with `:` and `.` in the
/// timestamp replaced so the name stays filesystem-safe
pub fn export_filename(data_type: DataType, format: ExportFormat, at: DateTime<Utc>) -> String {
    format!(
        "dashboard-export-{}-{}.{}",
        data_type.id(),
        filename_timestamp(at),
        format.extension()
    )
}

/// ISO-8601 instant with `:` and `.` replaced by `-`
pub fn filename_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Human-readable date used inside reports
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Group thousands and keep at most two decimals: `15420` → `15,420`
pub fn format_number(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let abs = rounded.abs();
    let whole = abs.trunc() as u64;
    let cents = ((abs - abs.trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if rounded < 0.0 { "-" } else { "" };
    match cents {
        0 => format!("{sign}{grouped}"),
        c if c % 10 == 0 => format!("{sign}{grouped}.{}", c / 10),
        c => format!("{sign}{grouped}.{c:02}"),
    }
}

/// Plain number for machine-readable cells: integers without a trailing `.0`
pub(crate) fn plain_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 31, 14, 5, 9).unwrap()
    }

    #[test]
    fn test_export_format() {
        assert_eq!(ExportFormat::from_str("excel"), Some(ExportFormat::Excel));
        assert_eq!(ExportFormat::from_str("XLSX"), Some(ExportFormat::Excel));
        assert_eq!(ExportFormat::from_str("csv"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_str("json"), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_str("pdf"), Some(ExportFormat::Pdf));
        assert_eq!(ExportFormat::from_str("xml"), None);
    }

    #[test]
    fn test_filename() {
        assert_eq!(
            export_filename(DataType::Sales, ExportFormat::Excel, at()),
            "dashboard-export-sales-2025-08-31T14-05-09-000Z.xlsx"
        );
        assert!(security::validate_filename(
            &export_filename(DataType::DailyStats, ExportFormat::Pdf, at()),
            100
        ));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(45.0), "45");
        assert_eq!(format_number(15420.0), "15,420");
        assert_eq!(format_number(2475.5), "2,475.5");
        assert_eq!(format_number(1234567.891), "1,234,567.89");
        assert_eq!(format_number(-1200.0), "-1,200");
        assert_eq!(format_number(38.666666), "38.67");
    }

    #[test]
    fn test_plain_number() {
        assert_eq!(plain_number(120.0), "120");
        assert_eq!(plain_number(2.5), "2.5");
    }

    #[test]
    fn test_spec_from_request_defaults() {
        let request: ExportRequest = serde_json::from_str(r#"{"format":"csv"}"#).unwrap();
        let spec = ExportSpec::from_request(&request).unwrap();

        assert_eq!(spec, ExportSpec::new(ExportFormat::Csv, DataType::Sales, Period::Week));
    }

    #[test]
    fn test_spec_from_request_full() {
        let request: ExportRequest = serde_json::from_str(
            r#"{"format":"pdf","dataType":"users","selectedPeriod":"year","selectedMetric":" activeUsers ","includeSummary":false}"#,
        )
        .unwrap();
        let spec = ExportSpec::from_request(&request).unwrap();

        assert_eq!(spec.format, ExportFormat::Pdf);
        assert_eq!(spec.data_type, DataType::Users);
        assert_eq!(spec.period, Period::Year);
        assert_eq!(spec.metric.as_deref(), Some("activeUsers"));
        assert!(!spec.include_summary);
    }

    #[test]
    fn test_spec_rejects_bad_values() {
        for body in [
            r#"{"format":"docx"}"#,
            r#"{"format":"csv","dataType":"inventory"}"#,
            r#"{"format":"csv","selectedPeriod":"decade"}"#,
        ] {
            let request: ExportRequest = serde_json::from_str(body).unwrap();
            assert!(matches!(
                ExportSpec::from_request(&request),
                Err(AppError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn test_export_unknown_metric() {
        let mut spec = ExportSpec::new(ExportFormat::Csv, DataType::Performance, Period::Week);
        spec.metric = Some("revenue".to_string());

        assert!(matches!(
            export(&spec, at(), 100),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_export_filename_too_long() {
        let spec = ExportSpec::new(ExportFormat::Csv, DataType::Sales, Period::Week);

        match export(&spec, at(), 10) {
            Err(AppError::InvalidFilename(name)) => {
                assert!(name.starts_with("dashboard-export-sales-"))
            }
            other => panic!("expected InvalidFilename, got {other:?}"),
        }
    }

    #[test]
    fn test_export_every_format() {
        for format in ExportFormat::ALL {
            let spec = ExportSpec::new(format, DataType::Sales, Period::Month);
            let file = export(&spec, at(), 100).unwrap();

            assert!(file.filename.ends_with(format.extension()));
            assert_eq!(file.content_type, format.content_type());
            assert!(!file.bytes.is_empty());
        }
    }

    #[test]
    fn test_export_binary_signatures() {
        let xlsx = export(
            &ExportSpec::new(ExportFormat::Excel, DataType::Sales, Period::Week),
            at(),
            100,
        )
        .unwrap();
        // xlsx is a zip container
        assert!(xlsx.bytes.starts_with(b"PK"));

        let pdf = export(
            &ExportSpec::new(ExportFormat::Pdf, DataType::Analytics, Period::Week),
            at(),
            100,
        )
        .unwrap();
        assert!(pdf.bytes.starts_with(b"%PDF-"));
    }
}
