//! JSON writer: metadata, chart data and summary

use anyhow::Result;
use chrono::SecondsFormat;
use serde::Serialize;

use super::Report;
use crate::data::{ChartData, Summary};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Metadata<'a> {
    data_type: &'a str,
    data_type_name: &'a str,
    period: &'a str,
    metric: &'a str,
    export_format: &'a str,
    record_count: u64,
    export_date: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    metadata: Metadata<'a>,
    chart_data: ChartData<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a Summary>,
}

pub(super) fn write(report: &Report) -> Result<Vec<u8>> {
    let dataset = report.dataset;
    let export = JsonExport {
        metadata: Metadata {
            data_type: dataset.data_type.id(),
            data_type_name: dataset.data_type.name(),
            period: dataset.period.as_str(),
            metric: &report.metric.key,
            export_format: report.format.display_name(),
            record_count: dataset.record_count(),
            export_date: report
                .generated_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        },
        chart_data: dataset.chart_data(),
        summary: report.summary.as_ref(),
    };

    Ok(serde_json::to_vec_pretty(&export)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataType, Dataset, Period};
    use crate::export::ExportFormat;
    use chrono::Utc;
    use serde_json::Value;

    #[test]
    fn test_json_export() {
        let dataset = Dataset::sample(DataType::Sales, Period::Year);
        let metric = dataset.series_by_key("profit").unwrap();
        let report = Report {
            dataset: &dataset,
            metric,
            summary: Summary::of(metric),
            format: ExportFormat::Json,
            generated_at: Utc::now(),
        };

        let json: Value = serde_json::from_slice(&write(&report).unwrap()).unwrap();

        assert_eq!(json["metadata"]["dataType"], "sales");
        assert_eq!(json["metadata"]["period"], "year");
        assert_eq!(json["metadata"]["metric"], "profit");
        assert_eq!(json["metadata"]["exportFormat"], "JSON (.json)");
        assert_eq!(json["metadata"]["recordCount"], 15420);
        assert_eq!(json["chartData"]["labels"].as_array().unwrap().len(), 12);
        assert_eq!(json["chartData"]["datasets"].as_array().unwrap().len(), 4);
        assert_eq!(json["summary"]["maximum"], 2040.0);
        assert_eq!(json["summary"]["minimum"], 204.0);
        assert_eq!(json["summary"]["dataPoints"], 12);
    }

    #[test]
    fn test_json_without_summary() {
        let dataset = Dataset::sample(DataType::DailyStats, Period::Week);
        let report = Report {
            dataset: &dataset,
            metric: &dataset.series[0],
            summary: None,
            format: ExportFormat::Json,
            generated_at: Utc::now(),
        };

        let json: Value = serde_json::from_slice(&write(&report).unwrap()).unwrap();
        assert!(json.get("summary").is_none());
        assert_eq!(json["chartData"]["labels"][0], "2025-08-31");
    }
}
