use std::sync::Arc;

use std::fmt::Display;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use pidview_core::{AnalysisRequest, AppError, JobId, UploadedFile};
use pidview_infra::spawn_notification;
use pidview_storage::UploadFile;
use serde::Serialize;

use crate::error::HttpAppError;
use crate::state::AppState;

const FILES_FIELD: &str = "files";
const REQUIRED_FILES: usize = 2;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub job_id: JobId,
    pub files: Vec<UploadedFile>,
}

/// A body cut off by the request size limit is a 413, anything else a malformed request.
fn multipart_failure(status: StatusCode, reading: &str, err: impl Display) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("Upload exceeds the size limit: {}", err))
    } else {
        AppError::InvalidInput(format!("Failed to read {}: {}", reading, err))
    }
}

/// Read every `files` part. Other fields are skipped.
async fn collect_files(mut multipart: Multipart) -> Result<Vec<UploadFile>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_failure(e.status(), "multipart", &e))?
    {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        let name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("upload-{}.pdf", files.len() + 1));
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_failure(e.status(), "file data", &e))?;
        files.push(UploadFile {
            name,
            content_type,
            data,
        });
    }
    Ok(files)
}

/// Accept exactly two drawings, store them in the input folder and start an
/// analysis run. The webhook call is detached from the response.
#[tracing::instrument(skip_all, fields(operation = "upload"))]
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let files = collect_files(multipart).await?;
    if files.len() != REQUIRED_FILES {
        return Err(AppError::BadRequest(format!(
            "Exactly {} files are required, got {}",
            REQUIRED_FILES,
            files.len()
        ))
        .into());
    }

    let input_folder = state.config.input_folder_id()?;

    let mut uploaded = Vec::with_capacity(files.len());
    for file in files {
        let size = file.data.len();
        let stored = state.drive.upload(input_folder, file).await?;
        tracing::info!(file_id = %stored.id, name = %stored.name, size, "Uploaded file to input folder");
        uploaded.push(stored);
    }

    let job_id = JobId::generate();
    tracing::info!(job_id = %job_id, "Upload complete, triggering analysis");
    spawn_notification(
        state.upload_notifier.clone(),
        AnalysisRequest::upload(job_id.clone(), uploaded.clone()),
    );

    Ok(Json(UploadResponse {
        success: true,
        message: "Files uploaded, analysis started".to_string(),
        job_id,
        files: uploaded,
    }))
}
