use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use futures::StreamExt;

use crate::state::AppState;

/// Stream a Drive file to the browser.
///
/// The backend's `Content-Type` is forwarded when present; nothing is inferred
/// from the file name. Every failure, whatever the cause, is reported as 404.
#[tracing::instrument(skip(state), fields(operation = "stream_file"))]
pub async fn stream_file(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let download = match state.drive.download_stream(&id).await {
        Ok(download) => download,
        Err(e) => {
            tracing::warn!(error = %e, "File download failed");
            return (StatusCode::NOT_FOUND, "File not found").into_response();
        }
    };

    let body_stream = download.stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Drive stream error: {}", e)))
    });

    let mut response = Response::new(Body::from_stream(body_stream));
    if let Some(content_type) = download
        .content_type
        .as_deref()
        .and_then(|ct| header::HeaderValue::from_str(ct).ok())
    {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type);
    }
    response
}
