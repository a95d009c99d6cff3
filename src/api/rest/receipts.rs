//! Record submission endpoints

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use chrono::Local;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use super::ApiError;
use crate::api::state::AppState;
use crate::store::AppendOutcome;
use crate::types::Record;
use crate::utils::instant_stamp;

/// Response of `POST /submit`
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub file: String,
    pub row_count: usize,
}

/// Response of the legacy `/api/receipts` endpoints
#[derive(Debug, Serialize)]
pub struct ReceivedResponse {
    pub ok: bool,
    /// Persisted fields plus `daily_file` and `row_count`
    pub received: Map<String, Value>,
}

/// POST /submit - Append a JSON record
pub async fn submit(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let record = record_from_body(&state, &body)?;
    let outcome = append(&state, record).await?;

    Ok(Json(SubmitResponse {
        success: true,
        file: outcome.file,
        row_count: outcome.row_count,
    }))
}

/// POST /api/receipts - Append a JSON record, legacy response
pub async fn receipts_json(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let record = record_from_body(&state, &body)?;
    let received = received_fields(&state, &record);
    let outcome = append(&state, record).await?;

    Ok(Json(legacy_response(received, outcome)))
}

/// POST /api/receipts/upload - Append a record from multipart form data
///
/// An optional `file` part is accepted. It never reaches the spreadsheet
/// and is only kept on disk when uploads persistence is enabled.
pub async fn receipts_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form: HashMap<String, String> = HashMap::new();
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            let file_name = field.file_name().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            if let Some(file_name) = file_name.filter(|n| !n.is_empty()) {
                upload = Some((file_name, data));
            }
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        form.insert(name, text);
    }

    let record = Record::collect(
        &state.config.fields,
        &state.config.identifier_aliases,
        |key| form.get(key).cloned(),
    );
    require_identifier(&state, &record)?;

    if let Some((file_name, data)) = upload {
        if state.config.persist_uploads {
            let path = save_upload(&state.config.layout.uploads_dir(), &file_name, &data).await?;
            info!(path = %path.display(), bytes = data.len(), "Stored upload");
        }
    }

    let received = received_fields(&state, &record);
    let outcome = append(&state, record).await?;

    Ok(Json(legacy_response(received, outcome)))
}

/// Parse a JSON body leniently: anything but an object counts as `{}`
fn record_from_body(state: &AppState, body: &[u8]) -> Result<Record, ApiError> {
    let object = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default();

    let record = Record::from_json(
        &object,
        &state.config.fields,
        &state.config.identifier_aliases,
    );
    require_identifier(state, &record)?;
    Ok(record)
}

fn require_identifier(state: &AppState, record: &Record) -> Result<(), ApiError> {
    if record.identifier(&state.config.fields).is_some() {
        return Ok(());
    }

    let mut names = vec![state.config.fields.identifier().to_string()];
    names.extend(state.config.identifier_aliases.iter().cloned());
    Err(ApiError::bad_request(format!("Missing {}", names.join("/"))))
}

async fn append(state: &AppState, record: Record) -> Result<AppendOutcome, ApiError> {
    Ok(state.with_store(move |store| store.submit(&record)).await?)
}

fn received_fields(state: &AppState, record: &Record) -> Map<String, Value> {
    state
        .config
        .fields
        .names()
        .iter()
        .zip(record.project(&state.config.fields))
        .map(|(name, value)| (name.clone(), Value::String(value)))
        .collect()
}

fn legacy_response(mut received: Map<String, Value>, outcome: AppendOutcome) -> ReceivedResponse {
    received.insert("daily_file".to_string(), Value::String(outcome.file));
    received.insert("row_count".to_string(), Value::from(outcome.row_count));
    ReceivedResponse { ok: true, received }
}

/// Store an attachment as `<timestamp>_<sanitized name>` under `dir`
async fn save_upload(dir: &Path, original: &str, data: &[u8]) -> Result<PathBuf, ApiError> {
    let path = dir.join(format!(
        "{}_{}",
        instant_stamp(&Local::now()),
        sanitize_file_name(original)
    ));

    let written = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, data).await
    }
    .await;

    written.map_err(|e| {
        tracing::error!(error = %e, "Failed to store upload");
        ApiError::internal()
    })?;

    Ok(path)
}

/// Keep the last path component, replacing anything outside `[A-Za-z0-9._-]`
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    match cleaned.trim_start_matches('.') {
        "" => "upload".to_string(),
        rest => rest.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("pod.jpg"), "pod.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\my pod.png"), "my_pod.png");
        assert_eq!(sanitize_file_name(".."), "upload");
        assert_eq!(sanitize_file_name(""), "upload");
    }
}
