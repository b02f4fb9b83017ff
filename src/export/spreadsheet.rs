//! Excel writer

use anyhow::Result;
use rust_xlsxwriter::{Color, Format, Workbook};

use super::{format_number, format_timestamp, Report};
use crate::security::sanitize_input;

// Excel limit
const MAX_SHEET_NAME: usize = 31;

pub(super) fn write(report: &Report) -> Result<Vec<u8>> {
    let dataset = report.dataset;

    let title = Format::new().set_bold().set_font_size(14);
    let bold = Format::new().set_bold();
    let header = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x3B82F6));

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name(report))?;

    let mut row: u32 = 0;
    worksheet.write_string_with_format(row, 0, "Export Report", &title)?;
    row += 2;

    let preamble = [
        ("Data Type:", dataset.data_type.name().to_string()),
        ("Period:", dataset.period.display_name().to_string()),
        ("Metric:", report.metric.label.clone()),
        ("Export Date:", format_timestamp(report.generated_at)),
        ("Total Records:", format_number(dataset.record_count() as f64)),
    ];
    for (label, value) in preamble {
        worksheet.write_string_with_format(row, 0, label, &bold)?;
        worksheet.write_string(row, 1, value)?;
        row += 1;
    }
    row += 1;

    for (col, name) in dataset.headers().iter().enumerate() {
        worksheet.write_string_with_format(row, col as u16, name, &header)?;
    }
    row += 1;

    for data_row in dataset.rows() {
        worksheet.write_string(row, 0, &data_row.label)?;
        for (col, value) in data_row.values.iter().enumerate() {
            worksheet.write_number(row, col as u16 + 1, *value)?;
        }
        row += 1;
    }

    if let Some(summary) = &report.summary {
        row += 1;
        worksheet.write_string_with_format(row, 0, "Statistics", &bold)?;
        row += 1;

        let stats = [
            ("Average Value:", summary.average),
            ("Maximum Value:", summary.maximum),
            ("Minimum Value:", summary.minimum),
            ("Total:", summary.total),
            ("Data Points:", summary.data_points as f64),
        ];
        for (label, value) in stats {
            worksheet.write_string(row, 0, label)?;
            worksheet.write_number(row, 1, value)?;
            row += 1;
        }
    }

    worksheet.set_column_width(0, 18)?;
    for col in 1..=dataset.series.len() {
        worksheet.set_column_width(col as u16, 16)?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// `{period}-{metric}`, sanitized and cut to Excel's sheet name rules
fn sheet_name(report: &Report) -> String {
    let raw = sanitize_input(&format!(
        "{}-{}",
        report.dataset.period, report.metric.key
    ));

    let name: String = raw
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(MAX_SHEET_NAME)
        .collect();

    if name.trim().is_empty() {
        "Export Data".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataType, Dataset, Period, Series, Summary};
    use crate::export::ExportFormat;
    use chrono::Utc;

    fn report_with_metric<'a>(dataset: &'a Dataset, metric: &'a Series) -> Report<'a> {
        Report {
            dataset,
            metric,
            summary: Summary::of(metric),
            format: ExportFormat::Excel,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_sheet_name() {
        let dataset = Dataset::sample(DataType::Sales, Period::Month);
        let metric = dataset.series_by_key("customers").unwrap();
        assert_eq!(sheet_name(&report_with_metric(&dataset, metric)), "month-customers");
    }

    #[test]
    fn test_sheet_name_limits() {
        let dataset = Dataset::sample(DataType::Sales, Period::Week);
        let metric = Series {
            key: "a/very:long*metric[name]that-keeps-going-and-going".to_string(),
            label: "X".to_string(),
            values: vec![1.0],
        };

        let name = sheet_name(&report_with_metric(&dataset, &metric));
        assert_eq!(name.chars().count(), MAX_SHEET_NAME);
        assert!(name.starts_with("week-averylongmetricname"));
    }

    #[test]
    fn test_workbook_bytes() {
        let dataset = Dataset::sample(DataType::Users, Period::Week);
        let bytes = write(&report_with_metric(&dataset, &dataset.series[0])).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
