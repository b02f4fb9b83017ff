//! CSV writer: header row plus one quoted row per data point

use anyhow::{anyhow, Result};
use csv::{QuoteStyle, WriterBuilder};

use super::{plain_number, Report};

pub(super) fn write(report: &Report) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(report.dataset.headers())?;

    for row in report.dataset.rows() {
        let record: Vec<String> = std::iter::once(row.label)
            .chain(row.values.into_iter().map(plain_number))
            .collect();
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV: {}", e.error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataType, Dataset, Period, Summary};
    use crate::export::ExportFormat;
    use chrono::Utc;

    fn csv_for(data_type: DataType, period: Period) -> String {
        let dataset = Dataset::sample(data_type, period);
        let metric = &dataset.series[0];
        let report = Report {
            dataset: &dataset,
            metric,
            summary: Summary::of(metric),
            format: ExportFormat::Csv,
            generated_at: Utc::now(),
        };
        String::from_utf8(write(&report).unwrap()).unwrap()
    }

    #[test]
    fn test_header_and_row_count() {
        let csv = csv_for(DataType::Sales, Period::Week);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            r#""Period","Revenue (R)","Volume","Profit (R)","Customers""#
        );
        // Header plus seven weekdays, no summary rows
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[1], r#""Mon","120","12","20","8""#);
    }

    #[test]
    fn test_month_rows() {
        let csv = csv_for(DataType::Sales, Period::Month);
        assert_eq!(csv.lines().count(), 31);
    }

    #[test]
    fn test_single_series() {
        let csv = csv_for(DataType::Performance, Period::Year);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], r#""Month","Response Time (ms)""#);
        assert_eq!(lines[6], r#""Jun","32""#);
    }
}
