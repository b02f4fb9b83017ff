//! Settings command - Show the effective dashboard settings

use anyhow::Result;
use serde_json::Value;

use dashboard_api::config::Config;
use dashboard_api::settings::DashboardSettings;
use dashboard_api::store::Store;

pub fn execute(config: &Config) -> Result<String> {
    let store = Store::open(&config.database_path())?;
    format_settings(&store.load_settings()?)
}

/// One block per category, keys in their stored (camelCase) form
pub fn format_settings(settings: &DashboardSettings) -> Result<String> {
    let tree = serde_json::to_value(settings)?;
    let mut lines = vec![];

    if let Value::Object(categories) = tree {
        for (category, values) in categories {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("[{category}]"));

            if let Value::Object(values) = values {
                for (key, value) in values {
                    let rendered = match value {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    lines.push(format!("  {key}: {rendered}"));
                }
            }
        }
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_format_defaults() {
        let output = format_settings(&DashboardSettings::default()).unwrap();

        assert!(output.contains("[general]"));
        assert!(output.contains("  defaultPeriod: week"));
        assert!(output.contains("[data]"));
        assert!(output.contains("  dataRetention: 365"));
        assert!(output.contains("  chartTransparency: 0.8"));
    }

    #[test]
    fn test_execute_reads_stored_values() {
        let temp = TempDir::new().unwrap();
        let config = Config::with_data_dir(temp.path());

        Store::open(&config.database_path())
            .unwrap()
            .save_setting("data", "backupFrequency", &json!("weekly"))
            .unwrap();

        let output = execute(&config).unwrap();
        assert!(output.contains("  backupFrequency: weekly"));
    }
}
