use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task;
use tracing::{info, warn};

use super::middleware::{enforce_rate_limit, ClientIp};
use super::AppState;
use crate::backup::{self, BackupOptions, BackupRequest};
use crate::data::{DataType, Dataset, Period, Summary};
use crate::error::AppError;
use crate::export::{self, ExportFile, ExportFormat, ExportRequest, ExportSpec};
use crate::security::SecurityEventKind;
use crate::settings::{BackupSettingsUpdate, DATA_CATEGORY};
use crate::store::{NewBackup, Store};

const CHART_RATE_LIMIT: &str = "chart-interaction";

/// Run SQLite and file work off the async workers
async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(work)
        .await
        .map_err(anyhow::Error::from)?
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Interactive Dashboard Backend API" }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let timestamp = timestamp();
    let store = state.store.clone();
    let ping = task::spawn_blocking(move || store.ping())
        .await
        .map_err(anyhow::Error::from)
        .and_then(|result| result);

    match ping {
        Ok(()) => Json(json!({
            "status": "OK",
            "timestamp": timestamp,
            "database": "SQLite connected",
        }))
        .into_response(),
        Err(e) => {
            warn!("Health check failed: {e:#}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "DEGRADED",
                    "timestamp": timestamp,
                    "database": "SQLite unavailable",
                })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DataQuery {
    period: Option<String>,
    metric: Option<String>,
}

pub async fn get_data(
    State(state): State<Arc<AppState>>,
    Extension(ClientIp(ip)): Extension<ClientIp>,
    Path(data_type): Path<String>,
    Query(query): Query<DataQuery>,
) -> Result<Json<Value>, AppError> {
    enforce_rate_limit(&state, CHART_RATE_LIMIT, &ip)?;

    let data_type = DataType::from_str(&data_type)
        .ok_or_else(|| AppError::bad_request(format!("Invalid data type: {data_type}")))?;
    let period = match query.period.as_deref() {
        None => Period::Week,
        Some(p) => Period::from_str(p)
            .ok_or_else(|| AppError::bad_request(format!("Invalid period: {p}")))?,
    };

    let dataset = Dataset::sample(data_type, period);
    let metric = dataset
        .primary_series(query.metric.as_deref())
        .ok_or_else(|| AppError::bad_request("Unknown metric"))?;

    Ok(Json(json!({
        "success": true,
        "dataType": data_type,
        "name": data_type.name(),
        "description": data_type.description(),
        "period": period,
        "metric": metric.key,
        "recordCount": dataset.record_count(),
        "chartData": dataset.chart_data(),
        "summary": Summary::of(metric),
    })))
}

pub async fn export_data(
    State(state): State<Arc<AppState>>,
    Extension(ClientIp(ip)): Extension<ClientIp>,
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    let spec = ExportSpec::from_request(&request)?;
    enforce_rate_limit(&state, spec.format.rate_limit_identifier(), &ip)?;

    let generated_at = Utc::now();
    let max_filename_length = state.config.security.max_filename_length;
    let store = state.store.clone();

    let file = blocking(move || {
        let file = export::export(&spec, generated_at, max_filename_length)?;
        record_export(&store, spec.format, &file);
        Ok(file)
    })
    .await
    .inspect_err(|e| {
        if let AppError::InvalidFilename(filename) = e {
            state.security.log.record(
                SecurityEventKind::InvalidFilename,
                json!({ "filename": filename, "ip": ip }),
            );
        }
    })?;

    info!(
        filename = %file.filename,
        size = file.bytes.len(),
        client_ip = %ip,
        "Export served"
    );

    let ExportFile {
        filename,
        content_type,
        bytes,
    } = file;

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
            (header::CONTENT_LENGTH, bytes.len().to_string()),
        ],
        bytes,
    )
        .into_response())
}

/// Exports are listed alongside backups; a failure here never fails the download
fn record_export(store: &Store, format: ExportFormat, file: &ExportFile) {
    let record = NewBackup {
        filename: file.filename.clone(),
        file_path: format!("exports/{}", file.filename),
        backup_type: format!("export-{}", format.id()),
        file_size: file.bytes.len() as u64,
    };

    if let Err(e) = store.insert_backup(&record) {
        warn!(filename = %file.filename, "Failed to record export: {e:#}");
    }
}

/// Only JSON bodies carry options; empty or form bodies use the defaults
pub async fn create_backup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().contains("application/json"));

    let request: BackupRequest = if body.is_empty() || !is_json {
        BackupRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::bad_request(format!("Invalid backup request: {e}")))?
    };
    let options = BackupOptions::from_request(&request)?;

    let store = state.store.clone();
    let backups_dir = state.config.backups_dir();
    let created = blocking(move || {
        Ok(backup::create_backup(
            &store,
            &backups_dir,
            &options,
            Utc::now(),
        )?)
    })
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Backup created successfully",
        "backupId": created.id,
        "filename": created.filename,
        "size": created.size,
        "timestamp": created.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    })))
}

pub async fn list_backups(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let store = state.store.clone();
    let backups = blocking(move || Ok(store.list_backups()?)).await?;
    Ok(Json(json!({ "success": true, "backups": backups })))
}

pub async fn get_settings(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let store = state.store.clone();
    let settings = blocking(move || Ok(store.load_settings()?)).await?;
    Ok(Json(json!({ "success": true, "settings": settings })))
}

pub async fn get_backup_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let store = state.store.clone();
    let settings = blocking(move || Ok(store.load_settings()?)).await?;
    Ok(Json(json!({ "success": true, "settings": settings.data })))
}

pub async fn update_backup_settings(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BackupSettingsUpdate>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(update) = payload?;
    let entries = update.into_entries()?;

    let store = state.store.clone();
    let settings = blocking(move || {
        for (key, value) in &entries {
            store.save_setting(DATA_CATEGORY, key, value)?;
        }
        Ok(store.load_settings()?)
    })
    .await?;
    info!(settings = ?settings.data, "Backup settings updated");

    Ok(Json(json!({
        "success": true,
        "message": "Backup settings updated",
        "settings": settings.data,
    })))
}

pub async fn security_events(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "success": true, "events": state.security.log.recent() }))
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}
