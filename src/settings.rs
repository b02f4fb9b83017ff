//! Dashboard settings model
//!
//! Settings are stored per category/key in SQLite and overlaid onto these
//! defaults when loaded.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::export::ExportFormat;

pub const BACKUP_FREQUENCIES: [&str; 4] = ["hourly", "daily", "weekly", "monthly"];
pub const MAX_DATA_RETENTION_DAYS: u32 = 3650;

/// Category that holds the backup/export settings
pub const DATA_CATEGORY: &str = "data";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    pub dashboard_refresh_rate: u32,
    pub default_period: String,
    pub show_animations: bool,
    pub compact_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceSettings {
    pub primary_color: String,
    pub font_size: String,
    pub show_grid_lines: bool,
    pub chart_transparency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub email_alerts: bool,
    pub push_notifications: bool,
    pub weekly_reports: bool,
    pub performance_alerts: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySettings {
    pub two_factor_auth: bool,
    /// Minutes
    pub session_timeout: u32,
    pub require_password_change: bool,
    pub login_attempts: u32,
}

/// Backup and export preferences (`GET /api/settings/backup`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSettings {
    pub auto_backup: bool,
    pub backup_frequency: String,
    /// Days
    pub data_retention: u32,
    pub export_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSettings {
    pub general: GeneralSettings,
    pub appearance: AppearanceSettings,
    pub notifications: NotificationSettings,
    pub security: SecuritySettings,
    pub data: BackupSettings,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            general: GeneralSettings {
                dashboard_refresh_rate: 30,
                default_period: "week".to_string(),
                show_animations: true,
                compact_mode: false,
            },
            appearance: AppearanceSettings {
                primary_color: "#3B82F6".to_string(),
                font_size: "medium".to_string(),
                show_grid_lines: true,
                chart_transparency: 0.8,
            },
            notifications: NotificationSettings {
                email_alerts: true,
                push_notifications: false,
                weekly_reports: true,
                performance_alerts: true,
            },
            security: SecuritySettings {
                two_factor_auth: false,
                session_timeout: 60,
                require_password_change: false,
                login_attempts: 3,
            },
            data: BackupSettings {
                auto_backup: true,
                backup_frequency: "daily".to_string(),
                data_retention: 365,
                export_format: "excel".to_string(),
            },
        }
    }
}

impl DashboardSettings {
    /// Overlay stored `(category, key, value)` entries onto the defaults
    ///
    /// Entries for unknown categories or keys, or with a value of the wrong
    /// type, are ignored.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str, Value)>) -> Self {
        let defaults = Self::default();
        let Ok(mut tree) = serde_json::to_value(&defaults) else {
            return defaults;
        };

        for (category, key, value) in entries {
            let Some(slot) = tree.get_mut(category).and_then(|c| c.get_mut(key)) else {
                continue;
            };

            let previous = std::mem::replace(slot, value);
            if serde_json::from_value::<Self>(tree.clone()).is_err() {
                if let Some(slot) = tree.get_mut(category).and_then(|c| c.get_mut(key)) {
                    *slot = previous;
                }
            }
        }

        serde_json::from_value(tree).unwrap_or(defaults)
    }
}

/// Partial update for `PUT /api/settings/backup`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BackupSettingsUpdate {
    pub auto_backup: Option<bool>,
    pub backup_frequency: Option<String>,
    pub data_retention: Option<u32>,
    pub export_format: Option<String>,
}

impl BackupSettingsUpdate {
    /// Validate and return the `(key, value)` pairs to store
    pub fn into_entries(self) -> Result<Vec<(&'static str, Value)>, AppError> {
        let mut entries = Vec::new();

        if let Some(auto_backup) = self.auto_backup {
            entries.push(("autoBackup", Value::Bool(auto_backup)));
        }

        if let Some(frequency) = self.backup_frequency {
            let frequency = frequency.trim().to_lowercase();
            if !BACKUP_FREQUENCIES.contains(&frequency.as_str()) {
                return Err(AppError::bad_request(format!(
                    "Invalid backup frequency: {frequency}"
                )));
            }
            entries.push(("backupFrequency", Value::String(frequency)));
        }

        if let Some(retention) = self.data_retention {
            if !(1..=MAX_DATA_RETENTION_DAYS).contains(&retention) {
                return Err(AppError::bad_request(format!(
                    "Data retention must be between 1 and {MAX_DATA_RETENTION_DAYS} days"
                )));
            }
            entries.push(("dataRetention", Value::from(retention)));
        }

        if let Some(format) = self.export_format {
            let format = ExportFormat::from_str(&format)
                .ok_or_else(|| AppError::bad_request("Invalid export format"))?;
            entries.push(("exportFormat", Value::String(format.id().to_string())));
        }

        if entries.is_empty() {
            return Err(AppError::bad_request("No settings to update"));
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_serialize_camel_case() {
        let json = serde_json::to_value(DashboardSettings::default()).unwrap();
        assert_eq!(json["general"]["dashboardRefreshRate"], 30);
        assert_eq!(json["data"]["backupFrequency"], "daily");
        assert_eq!(json["data"]["exportFormat"], "excel");
        assert_eq!(json["appearance"]["primaryColor"], "#3B82F6");
    }

    #[test]
    fn test_overlay_entries() {
        let settings = DashboardSettings::from_entries([
            ("data", "dataRetention", json!(30)),
            ("general", "compactMode", json!(true)),
        ]);

        assert_eq!(settings.data.data_retention, 30);
        assert!(settings.general.compact_mode);
        assert_eq!(settings.data.backup_frequency, "daily");
    }

    #[test]
    fn test_overlay_ignores_bad_entries() {
        let settings = DashboardSettings::from_entries([
            ("data", "dataRetention", json!("forever")),
            ("nope", "x", json!(1)),
            ("data", "unknownKey", json!(1)),
        ]);

        assert_eq!(settings, DashboardSettings::default());
    }

    #[test]
    fn test_update_validation() {
        let update = BackupSettingsUpdate {
            backup_frequency: Some("Weekly".to_string()),
            export_format: Some("xlsx".to_string()),
            ..Default::default()
        };
        let entries = update.into_entries().unwrap();
        assert_eq!(entries[0], ("backupFrequency", json!("weekly")));
        assert_eq!(entries[1], ("exportFormat", json!("excel")));

        let bad = BackupSettingsUpdate {
            data_retention: Some(0),
            ..Default::default()
        };
        assert!(bad.into_entries().is_err());

        let bad = BackupSettingsUpdate {
            backup_frequency: Some("yearly".to_string()),
            ..Default::default()
        };
        assert!(bad.into_entries().is_err());

        assert!(BackupSettingsUpdate::default().into_entries().is_err());
    }

    #[test]
    fn test_update_rejects_unknown_fields() {
        let parsed: Result<BackupSettingsUpdate, _> =
            serde_json::from_str(r#"{"autoBackup":false,"color":"red"}"#);
        assert!(parsed.is_err());
    }
}
