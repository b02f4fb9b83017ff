//! Export command - Write a dataset export to disk

use anyhow::{Context, Result};
use chrono::Utc;
use owo_colors::OwoColorize;
use std::fs;
use std::path::PathBuf;

use super::utils;
use dashboard_api::config::Config;
use dashboard_api::data::{DataType, Period};
use dashboard_api::export::{self, ExportFormat, ExportSpec};

pub struct ExportOptions {
    pub format: String,
    pub data_type: String,
    pub period: String,
    pub metric: Option<String>,
    pub include_summary: bool,
    pub output: Option<String>,
}

impl ExportOptions {
    fn to_spec(&self) -> Result<ExportSpec> {
        let format = ExportFormat::from_str(&self.format)
            .context("Invalid format. Use 'excel', 'csv', 'json' or 'pdf'")?;
        let data_type = DataType::from_str(&self.data_type).with_context(|| {
            format!(
                "Invalid data type '{}'. Use one of: {}",
                self.data_type,
                DataType::ALL.map(DataType::id).join(", ")
            )
        })?;
        let period = Period::from_str(&self.period)
            .context("Invalid period. Use 'week', 'month' or 'year'")?;

        let mut spec = ExportSpec::new(format, data_type, period);
        spec.metric = self.metric.clone();
        spec.include_summary = self.include_summary;
        Ok(spec)
    }
}

/// Execute the export command, returning the written path
pub fn execute(config: &Config, options: &ExportOptions) -> Result<PathBuf> {
    let spec = options.to_spec()?;
    let file = export::export(&spec, Utc::now(), config.security.max_filename_length)?;

    let path = utils::output_path(options.output.as_deref(), &file.filename);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create: {}", parent.display()))?;
    }
    fs::write(&path, &file.bytes)
        .with_context(|| format!("Failed to write: {}", path.display()))?;

    println!(
        "{} {} {} export of {} ({})",
        "Created:".green(),
        path.display(),
        spec.format.display_name(),
        spec.data_type.name(),
        utils::format_size(file.bytes.len() as u64)
    );

    Ok(path)
}
