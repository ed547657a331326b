use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use pidview_core::Progress;
use serde::{Deserialize, Serialize};

use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub progress: Progress,
}

/// Progress report from the automation engine.
#[derive(Debug, Deserialize)]
pub struct ProgressUpdate {
    pub id: Option<String>,
    #[serde(default)]
    pub progress: f64,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Current progress of a job, 0 when the job is unknown.
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProgressQuery>,
) -> Json<ProgressResponse> {
    let progress = match query.id.as_deref() {
        Some(id) if !id.is_empty() => state.progress.get(id).await,
        _ => Progress::default(),
    };
    Json(ProgressResponse { progress })
}

/// Record progress for a job. Values are clamped to 0-100; a missing id is
/// accepted and ignored.
pub async fn set_progress(
    State(state): State<Arc<AppState>>,
    ValidatedJson(update): ValidatedJson<ProgressUpdate>,
) -> Result<Json<SuccessResponse>, HttpAppError> {
    match update.id.as_deref() {
        Some(id) if !id.is_empty() => {
            let progress = Progress::clamped(update.progress);
            tracing::debug!(job_id = %id, progress = progress.value(), "Progress reported");
            state.progress.set(id, progress).await;
        }
        _ => tracing::debug!("Progress report without job id ignored"),
    }
    Ok(Json(SuccessResponse { success: true }))
}
