//! Backup archives
//!
//! A backup is a `.tar.gz` holding `manifest.json`, `settings.json` and,
//! optionally, `data.json` with every dataset the dashboard serves.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tar::{Archive, Builder};
use tracing::info;

use crate::data::{ChartData, DataType, Dataset, Period};
use crate::error::AppError;
use crate::export::filename_timestamp;
use crate::security::sanitize_input;
use crate::store::{NewBackup, Store};

pub const MANIFEST_VERSION: u32 = 1;
const MAX_BACKUP_TYPE_LENGTH: usize = 50;
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Backup metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupManifest {
    /// Version of the backup format
    pub version: u32,
    /// Application version that wrote the archive
    pub app_version: String,
    #[serde(rename = "type")]
    pub backup_type: String,
    /// RFC 3339 timestamp of backup creation
    pub created_at: String,
    pub includes: BackupContents,
}

/// What's included in the backup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupContents {
    pub settings: bool,
    pub data: bool,
    /// Number of datasets in data.json
    #[serde(default)]
    pub datasets: usize,
}

/// Body of `POST /api/backup/create`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRequest {
    #[serde(default)]
    pub backup_type: Option<String>,
    #[serde(default)]
    pub include_data: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackupOptions {
    pub backup_type: String,
    pub include_data: bool,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            backup_type: "manual".to_string(),
            include_data: false,
        }
    }
}

impl BackupOptions {
    pub fn from_request(request: &BackupRequest) -> Result<Self, AppError> {
        let backup_type = match request.backup_type.as_deref() {
            None => "manual".to_string(),
            Some(raw) => validate_backup_type(raw)
                .ok_or_else(|| AppError::bad_request("Invalid backup type"))?,
        };

        Ok(Self {
            backup_type,
            include_data: request.include_data.unwrap_or(false),
        })
    }
}

/// Lowercase letters, digits, `-` and `_` only
fn validate_backup_type(raw: &str) -> Option<String> {
    let cleaned = sanitize_input(raw).to_lowercase();
    let valid = !cleaned.is_empty()
        && cleaned.len() <= MAX_BACKUP_TYPE_LENGTH
        && cleaned
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some(cleaned)
}

/// A backup that was written and recorded
#[derive(Debug, Clone)]
pub struct CreatedBackup {
    pub id: i64,
    pub filename: String,
    pub path: PathBuf,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DataEntry<'a> {
    data_type: DataType,
    period: Period,
    #[serde(flatten)]
    chart: ChartData<'a>,
}

/// `dashboard-backup-{timestamp}.tar.gz`, or `...-{attempt}.tar.gz` on retries
pub fn backup_filename(at: DateTime<Utc>, attempt: u32) -> String {
    let stamp = filename_timestamp(at);
    match attempt {
        0 => format!("dashboard-backup-{stamp}.tar.gz"),
        n => format!("dashboard-backup-{stamp}-{n}.tar.gz"),
    }
}

/// Create a fresh archive file, suffixing `-1`, `-2`, ... when backups share a
/// timestamp. Existing archives are never truncated.
fn create_archive_file(backups_dir: &Path, at: DateTime<Utc>) -> Result<(String, PathBuf, File)> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let filename = backup_filename(at, attempt);
        let path = backups_dir.join(&filename);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((filename, path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create: {}", path.display()))
            }
        }
    }

    bail!(
        "No free backup filename for {} after {MAX_NAME_ATTEMPTS} attempts",
        backup_filename(at, 0)
    )
}

/// Write a backup archive into `backups_dir` and record it in the store
pub fn create_backup(
    store: &Store,
    backups_dir: &Path,
    options: &BackupOptions,
    at: DateTime<Utc>,
) -> Result<CreatedBackup> {
    fs::create_dir_all(backups_dir)
        .with_context(|| format!("Failed to create: {}", backups_dir.display()))?;

    let datasets: Vec<Dataset> = if options.include_data {
        DataType::ALL
            .into_iter()
            .flat_map(|data_type| {
                Period::ALL
                    .into_iter()
                    .map(move |period| Dataset::sample(data_type, period))
            })
            .collect()
    } else {
        Vec::new()
    };

    let manifest = BackupManifest {
        version: MANIFEST_VERSION,
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        backup_type: options.backup_type.clone(),
        created_at: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        includes: BackupContents {
            settings: true,
            data: options.include_data,
            datasets: datasets.len(),
        },
    };
    let settings = store.load_settings()?;

    let (filename, path, file) = create_archive_file(backups_dir, at)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut archive = Builder::new(encoder);
    let mtime = at.timestamp().max(0) as u64;

    let manifest_json = serde_json::to_vec_pretty(&manifest)?;
    add_file_to_archive(&mut archive, "manifest.json", &manifest_json, mtime)?;

    let settings_json = serde_json::to_vec_pretty(&settings)?;
    add_file_to_archive(&mut archive, "settings.json", &settings_json, mtime)?;

    if options.include_data {
        let entries: Vec<DataEntry> = datasets
            .iter()
            .map(|dataset| DataEntry {
                data_type: dataset.data_type,
                period: dataset.period,
                chart: dataset.chart_data(),
            })
            .collect();
        let data_json = serde_json::to_vec_pretty(&entries)?;
        add_file_to_archive(&mut archive, "data.json", &data_json, mtime)?;
    }

    let encoder = archive.into_inner()?;
    encoder.finish()?;

    let size = fs::metadata(&path)?.len();
    let id = store.insert_backup(&NewBackup {
        filename: filename.clone(),
        file_path: format!("backups/{filename}"),
        backup_type: options.backup_type.clone(),
        file_size: size,
    })?;

    info!(
        id,
        filename = %filename,
        size,
        include_data = options.include_data,
        "Backup created"
    );

    Ok(CreatedBackup {
        id,
        filename,
        path,
        size,
        created_at: at,
    })
}

/// Add a file with content to the archive
fn add_file_to_archive<W: Write>(
    archive: &mut Builder<W>,
    name: &str,
    content: &[u8],
    mtime: u64,
) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(mtime);
    header.set_cksum();

    archive.append_data(&mut header, name, content)?;
    Ok(())
}

/// Read manifest from a backup archive
pub fn read_manifest(backup_path: &Path) -> Result<BackupManifest> {
    let file = File::open(backup_path)
        .with_context(|| format!("Failed to open: {}", backup_path.display()))?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?;

        if path.to_string_lossy() == "manifest.json" {
            let mut content = String::new();
            entry.read_to_string(&mut content)?;
            let manifest: BackupManifest =
                serde_json::from_str(&content).context("Failed to parse manifest.json")?;
            return Ok(manifest);
        }
    }

    bail!("Backup archive does not contain manifest.json")
}
