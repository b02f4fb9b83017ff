//! Backup commands - Create, list and inspect backup archives

use anyhow::Result;
use chrono::Utc;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use owo_colors::OwoColorize;
use std::path::Path;

use super::utils;
use dashboard_api::backup::{self, BackupManifest, BackupOptions, CreatedBackup};
use dashboard_api::config::Config;
use dashboard_api::store::{BackupRecord, Store};

/// Execute `backup create`
pub fn create(config: &Config, options: &BackupOptions) -> Result<CreatedBackup> {
    let store = Store::open(&config.database_path())?;

    println!("Creating {} backup in: {}", options.backup_type, config.backups_dir().display());
    if options.include_data {
        println!("{} dashboard datasets", "Including:".green());
    }

    let created = backup::create_backup(&store, &config.backups_dir(), options, Utc::now())?;

    println!();
    println!(
        "{} {} ({})",
        "Created:".green(),
        created.path.display(),
        utils::format_size(created.size)
    );

    Ok(created)
}

/// Execute `backup list`
pub fn list(config: &Config) -> Result<String> {
    let store = Store::open(&config.database_path())?;
    Ok(format_backups(&store.list_backups()?))
}

pub fn format_backups(backups: &[BackupRecord]) -> String {
    if backups.is_empty() {
        return "No backups found".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("Type"),
        Cell::new("Filename"),
        Cell::new("Size"),
        Cell::new("Created"),
        Cell::new("Status"),
    ]);

    for backup in backups {
        table.add_row(vec![
            Cell::new(backup.id),
            Cell::new(&backup.backup_type),
            Cell::new(&backup.filename),
            Cell::new(utils::format_size(backup.file_size)),
            Cell::new(utils::format_timestamp(&backup.created_at)),
            Cell::new(&backup.status),
        ]);
    }

    format!("{table}\n\n{} backups found", backups.len())
}

/// Execute `backup show`
pub fn show(backup_file: &str) -> Result<String> {
    let manifest = backup::read_manifest(Path::new(backup_file))?;
    Ok(format_manifest(backup_file, &manifest))
}

fn format_manifest(backup_file: &str, manifest: &BackupManifest) -> String {
    let yes_no = |included: bool| if included { "yes" } else { "no" };

    [
        format!("Backup: {backup_file}"),
        format!("Format Version: {}", manifest.version),
        format!("Written By: dashboard-api {}", manifest.app_version),
        format!("Type: {}", manifest.backup_type),
        format!("Created: {}", utils::format_timestamp(&manifest.created_at)),
        String::new(),
        format!("Settings: {}", yes_no(manifest.includes.settings)),
        format!(
            "Data: {} ({} datasets)",
            yes_no(manifest.includes.data),
            manifest.includes.datasets
        ),
    ]
    .join("\n")
}
