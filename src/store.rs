//! SQLite persistence for backup records and settings

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::settings::DashboardSettings;

/// Single-user deployment: every row belongs to this user
pub const DEFAULT_USER_ID: i64 = 1;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS backups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    filename TEXT NOT NULL,
    file_path TEXT NOT NULL,
    backup_type TEXT NOT NULL,
    file_size INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'completed'
);

CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    category TEXT NOT NULL,
    setting_key TEXT NOT NULL,
    setting_value TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(user_id, category, setting_key)
);
";

/// A backup or export to be recorded
#[derive(Debug, Clone)]
pub struct NewBackup {
    pub filename: String,
    pub file_path: String,
    pub backup_type: String,
    pub file_size: u64,
}

/// A row of the `backups` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupRecord {
    pub id: i64,
    pub user_id: i64,
    pub filename: String,
    pub file_path: String,
    pub backup_type: String,
    pub file_size: u64,
    pub created_at: String,
    pub status: String,
}

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the database file, creating parent directories
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open: {}", path.display()))?;
        info!(path = %path.display(), "Database opened");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Liveness query for the health endpoint; fails if the schema is gone
    pub fn ping(&self) -> Result<()> {
        self.conn()
            .query_row("SELECT COUNT(*) FROM backups", [], |row| row.get::<_, i64>(0))
            .context("Database ping failed")?;
        Ok(())
    }

    /// Insert a completed backup row and return its id
    pub fn insert_backup(&self, backup: &NewBackup) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO backups (user_id, filename, file_path, backup_type, file_size, created_at, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'completed')",
            params![
                DEFAULT_USER_ID,
                backup.filename,
                backup.file_path,
                backup.backup_type,
                backup.file_size as i64,
                now(),
            ],
        )
        .context("Failed to record backup")?;

        let id = conn.last_insert_rowid();
        debug!(id, filename = %backup.filename, "Backup recorded");
        Ok(id)
    }

    /// Newest first
    pub fn list_backups(&self) -> Result<Vec<BackupRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, filename, file_path, backup_type, file_size, created_at, status
                 FROM backups WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC",
            )
            .context("Failed to prepare query")?;

        let rows = stmt.query_map([DEFAULT_USER_ID], |row| {
            Ok(BackupRecord {
                id: row.get(0)?,
                user_id: row.get(1)?,
                filename: row.get(2)?,
                file_path: row.get(3)?,
                backup_type: row.get(4)?,
                file_size: row.get::<_, i64>(5)?.max(0) as u64,
                created_at: row.get(6)?,
                status: row.get(7)?,
            })
        })?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read backups")
    }

    /// Stored settings overlaid on the defaults
    pub fn load_settings(&self) -> Result<DashboardSettings> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT category, setting_key, setting_value FROM settings WHERE user_id = ?1",
        )?;

        let rows = stmt
            .query_map([DEFAULT_USER_ID], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read settings")?;

        // Values are stored as JSON text; anything unparsable falls back to the default
        let entries: Vec<(String, String, Value)> = rows
            .into_iter()
            .filter_map(|(category, key, raw)| {
                serde_json::from_str(&raw).ok().map(|v| (category, key, v))
            })
            .collect();

        Ok(DashboardSettings::from_entries(
            entries
                .iter()
                .map(|(c, k, v)| (c.as_str(), k.as_str(), v.clone())),
        ))
    }

    /// Insert or update one setting
    pub fn save_setting(&self, category: &str, key: &str, value: &Value) -> Result<()> {
        let now = now();
        self.conn()
            .execute(
                "INSERT INTO settings (user_id, category, setting_key, setting_value, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(user_id, category, setting_key)
                 DO UPDATE SET setting_value = excluded.setting_value, updated_at = excluded.updated_at",
                params![DEFAULT_USER_ID, category, key, value.to_string(), now],
            )
            .with_context(|| format!("Failed to save setting {category}.{key}"))?;
        Ok(())
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::OptionalExtension;
    use serde_json::json;
    use tempfile::TempDir;

    impl Store {
        /// Raw stored value, if any
        fn setting(&self, category: &str, key: &str) -> Result<Option<Value>> {
            let raw: Option<String> = self
                .conn()
                .query_row(
                    "SELECT setting_value FROM settings
                     WHERE user_id = ?1 AND category = ?2 AND setting_key = ?3",
                    params![DEFAULT_USER_ID, category, key],
                    |row| row.get(0),
                )
                .optional()?;

            Ok(raw.and_then(|r| serde_json::from_str(&r).ok()))
        }
    }

    fn backup(name: &str, size: u64) -> NewBackup {
        NewBackup {
            filename: name.to_string(),
            file_path: format!("backups/{name}"),
            backup_type: "manual".to_string(),
            file_size: size,
        }
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/database.sqlite");

        let store = Store::open(&path).unwrap();
        store.ping().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_ping_fails_without_schema() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("database.sqlite");
        let store = Store::open(&path).unwrap();

        Connection::open(&path)
            .unwrap()
            .execute_batch("DROP TABLE backups")
            .unwrap();

        assert!(store.ping().is_err());
    }

    #[test]
    fn test_backups_newest_first() {
        let store = Store::open_in_memory().unwrap();
        let first = store.insert_backup(&backup("a.tar.gz", 10)).unwrap();
        let second = store.insert_backup(&backup("b.tar.gz", 20)).unwrap();
        assert!(second > first);

        let rows = store.list_backups().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].filename, "b.tar.gz");
        assert_eq!(rows[0].file_size, 20);
        assert_eq!(rows[0].status, "completed");
        assert_eq!(rows[0].user_id, DEFAULT_USER_ID);
        assert_eq!(rows[1].id, first);
    }

    #[test]
    fn test_settings_upsert() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.setting("data", "dataRetention").unwrap(), None);

        store.save_setting("data", "dataRetention", &json!(30)).unwrap();
        store.save_setting("data", "dataRetention", &json!(90)).unwrap();

        assert_eq!(store.setting("data", "dataRetention").unwrap(), Some(json!(90)));
        assert_eq!(store.load_settings().unwrap().data.data_retention, 90);
    }

    #[test]
    fn test_load_settings_defaults() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.load_settings().unwrap(), DashboardSettings::default());
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("database.sqlite");

        {
            let store = Store::open(&path).unwrap();
            store.insert_backup(&backup("a.tar.gz", 1)).unwrap();
            store.save_setting("general", "compactMode", &json!(true)).unwrap();
        }

        let store = Store::open(&path).unwrap();
        assert_eq!(store.list_backups().unwrap().len(), 1);
        assert!(store.load_settings().unwrap().general.compact_mode);
    }
}
