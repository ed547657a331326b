//! HTTP error response conversion
//!
//! JSON handlers return `Result<impl IntoResponse, HttpAppError>` and use `?` on
//! `AppError`, `StorageError` and `anyhow::Error` alike. Page handlers do not
//! render this JSON shape; they go through `views::failure_page` instead.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pidview_core::{AppError, ErrorMetadata, LogLevel};
use pidview_storage::StorageError;
use serde::{de::DeserializeOwned, Serialize};

/// JSON body of every failed API call.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Error chain, only outside production and only for non-sensitive errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    pub code: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    fn from_app_error(err: &AppError, with_details: bool) -> Self {
        Self {
            error: err.client_message(),
            details: with_details.then(|| err.detailed_message()),
            error_type: with_details.then(|| err.error_type().to_string()),
            code: err.error_code().to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action().map(String::from),
        }
    }
}

/// `AppError` lives in pidview-core, so the response impl needs a local wrapper.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl HttpAppError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        let message = format!("Invalid request body: {}", rejection.body_text());
        HttpAppError(AppError::InvalidInput(message))
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(match err {
            StorageError::NotFound(id) => AppError::NotFound(format!("Drive item not found: {}", id)),
            StorageError::InvalidId(id) => AppError::InvalidInput(format!("Invalid drive id: {}", id)),
            StorageError::ConfigError(msg) => AppError::Configuration(msg),
            StorageError::UploadFailed(msg)
            | StorageError::DownloadFailed(msg)
            | StorageError::BackendError(msg) => AppError::Upstream(msg),
            StorageError::IoError(e) => AppError::Internal(format!("Drive I/O error: {}", e)),
        })
    }
}

/// `Json<T>` whose rejection is an [`ErrorResponse`] instead of axum's plain-text body.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => Err(rejection.into()),
        }
    }
}

/// Log at the level the error declares for itself.
pub(crate) fn log_error(error: &AppError) {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(error = %error, code, "Request failed"),
        LogLevel::Warn => tracing::warn!(error = %error, code, "Request failed"),
        LogLevel::Error => tracing::error!(
            error = %error.detailed_message(),
            code,
            "Request failed"
        ),
    }
}

fn running_in_production() -> bool {
    ["ENVIRONMENT", "APP_ENV"]
        .iter()
        .find_map(|key| std::env::var(key).ok())
        .is_some_and(|env| matches!(env.to_lowercase().as_str(), "production" | "prod"))
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        log_error(&self.0);
        let with_details = !self.0.is_sensitive() && !running_in_production();
        let body = ErrorResponse::from_app_error(&self.0, with_details);
        (self.status(), Json(body)).into_response()
    }
}
