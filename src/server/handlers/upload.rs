use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

fn upload_error(err: impl std::fmt::Display) -> ApiError {
    ApiError::Internal(format!("Upload Error: {}", err))
}

/// Keeps only the last path component of a client-supplied file name.
fn display_name(raw: Option<&str>) -> String {
    raw.and_then(|name| name.rsplit(|c: char| c == '/' || c == '\\').next())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("upload.pdf")
        .to_string()
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() == Some(FILE_FIELD) {
            let filename = display_name(field.file_name());
            let bytes = field.bytes().await.map_err(upload_error)?;
            upload = Some((filename, bytes));
            break;
        }
    }
    let (filename, bytes) = upload.ok_or_else(|| {
        ApiError::BadRequest(format!("Upload Error: missing '{}' field", FILE_FIELD))
    })?;
    tracing::info!(filename = %filename, size = bytes.len(), "Received upload");

    let extractor = state.extractor.clone();
    let pages = tokio::task::spawn_blocking(move || extractor.extract_pages(&bytes))
        .await
        .map_err(upload_error)?
        .map_err(upload_error)?;

    let written = state
        .ingestion
        .ingest_pages(&filename, &pages)
        .await
        .map_err(|err| {
            tracing::error!(filename = %filename, kind = err.kind(), error = %err, "Upload ingestion failed");
            upload_error(err)
        })?;

    if written == 0 {
        return Ok(Json(json!({ "message": "No text found in PDF" })));
    }
    Ok(Json(json!({
        "message": format!("Successfully processed {} pages from {}", written, filename)
    })))
}
