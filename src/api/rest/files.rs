//! Snapshot and file delivery endpoints

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::info;

use super::ApiError;
use crate::api::state::AppState;
use crate::store::{Download, Source};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Query parameters naming a file
#[derive(Debug, Deserialize)]
pub struct FileParams {
    pub filename: Option<String>,
}

impl FileParams {
    fn required(self) -> Result<String, ApiError> {
        self.filename
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ApiError::bad_request("Filename required"))
    }
}

/// Response of `GET /list_snapshots`
#[derive(Debug, Serialize)]
pub struct SnapshotList {
    pub count: usize,
    pub files: Vec<String>,
}

/// Response of `DELETE /delete_file`
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// GET /flush - Deliver the oldest snapshot, rotating today's file if the
/// queue is empty
pub async fn flush(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    match state.with_store(|store| store.flush()).await? {
        Some(download) => {
            if download.source == Source::Rotated {
                info!(snapshot = %download.name, "Flush rotated daily file");
            }
            Ok(attachment(download))
        }
        None => Err(ApiError::not_found("No file to download")),
    }
}

/// GET /list_snapshots - Snapshot names in FIFO order
pub async fn list_snapshots(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let files = state.with_store(|store| store.list()).await?;

    Ok(Json(SnapshotList {
        count: files.len(),
        files,
    }))
}

/// GET /get_file?filename= - Download a snapshot, or a live file
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FileParams>,
) -> Result<Response, ApiError> {
    let name = params.required()?;
    let download = state.with_store(move |store| store.open_file(&name)).await?;
    Ok(attachment(download))
}

/// GET|DELETE /delete_file?filename= - Delete a snapshot
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FileParams>,
) -> Result<impl IntoResponse, ApiError> {
    let name = params.required()?;
    let deleted = name.clone();
    state.with_store(move |store| store.delete(&name)).await?;

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("{} deleted", deleted),
    }))
}

/// Stream an opened file as a download named after it
fn attachment(download: Download) -> Response {
    let content_type = if download.name.to_ascii_lowercase().ends_with(".xlsx") {
        XLSX_MIME
    } else {
        "application/octet-stream"
    };
    let disposition = format!(
        "attachment; filename=\"{}\"",
        download.name.replace(['"', '\\'], "_")
    );

    let stream = ReaderStream::new(tokio::fs::File::from_std(download.file));

    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}
