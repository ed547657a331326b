use std::sync::Arc;

use axum::{extract::State, Json};
use pidview_core::{AnalysisRequest, AppError};
use pidview_infra::Delivery;
use serde::Deserialize;

use super::progress::SuccessResponse;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    pub folder_id: Option<String>,
    pub folder_name: Option<String>,
}

/// Ask the automation engine to analyse a Drive folder. Unlike uploads this
/// waits for the webhook so the button can report the outcome.
#[tracing::instrument(skip_all, fields(operation = "trigger_folder"))]
pub async fn trigger_folder(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<TriggerRequest>,
) -> Result<Json<SuccessResponse>, HttpAppError> {
    let folder_id = request.folder_id.filter(|id| !id.is_empty());
    let folder_name = request.folder_name.filter(|name| !name.is_empty());
    let analysis = AnalysisRequest::folder(folder_id, folder_name);

    match state.folder_notifier.notify(&analysis).await {
        Ok(Delivery::Delivered { .. }) => Ok(Json(SuccessResponse { success: true })),
        Ok(Delivery::Skipped) => Err(AppError::Configuration(
            "N8N_FOLDER_WEBHOOK_URL is not set".to_string(),
        )
        .into()),
        Err(e) => Err(AppError::Upstream(format!("{:#}", e)).into()),
    }
}
