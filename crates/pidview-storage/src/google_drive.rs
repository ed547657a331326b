//! Google Drive v3 REST backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use pidview_core::{FileEntry, Folder, UploadedFile};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use crate::token::{ServiceAccountTokenSource, TokenSource};
use crate::traits::{validate_id, DownloadStream, Drive, StorageError, StorageResult, UploadFile};
use crate::DriveBackend;

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const PAGE_SIZE: &str = "1000";
const CONNECT_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    #[serde(default)]
    mime_type: Option<String>,
    /// Drive reports sizes as decimal strings.
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    created_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
    name: String,
}

impl From<DriveFile> for Folder {
    fn from(file: DriveFile) -> Self {
        Folder {
            id: file.id,
            name: file.name,
            created_time: file.created_time,
        }
    }
}

impl From<DriveFile> for FileEntry {
    fn from(file: DriveFile) -> Self {
        FileEntry {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type.unwrap_or_default(),
            size: file.size.and_then(|s| s.parse().ok()),
        }
    }
}

/// Drive backend talking to the Google Drive v3 REST API.
#[derive(Clone)]
pub struct GoogleDrive {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl GoogleDrive {
    /// # Arguments
    /// * `base_url` - API origin, `https://www.googleapis.com` in production
    /// * `tokens` - source of bearer tokens
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenSource>) -> StorageResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// Backend authenticated with a service-account key (parsed on first request).
    pub fn with_service_account(
        base_url: impl Into<String>,
        service_account_json: Option<String>,
    ) -> StorageResult<Self> {
        let token_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS * 3))
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        let tokens = Arc::new(ServiceAccountTokenSource::new(service_account_json, token_client));
        Self::new(base_url, tokens)
    }

    async fn authorized(&self, builder: RequestBuilder) -> StorageResult<RequestBuilder> {
        let token = self.tokens.access_token().await?;
        Ok(builder.bearer_auth(token))
    }

    fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.base_url)
    }

    async fn list(&self, query: String, fields: &str, order_by: Option<&str>) -> StorageResult<Vec<DriveFile>> {
        let fields = format!("nextPageToken, files({})", fields);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params: Vec<(&str, &str)> = vec![
                ("q", query.as_str()),
                ("fields", fields.as_str()),
                ("pageSize", PAGE_SIZE),
            ];
            if let Some(order) = order_by {
                params.push(("orderBy", order));
            }
            params.push(("supportsAllDrives", "true"));
            params.push(("includeItemsFromAllDrives", "true"));
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            let request = self.authorized(self.client.get(self.files_url()).query(&params)).await?;
            let response = request
                .send()
                .await
                .map_err(|e| StorageError::BackendError(format!("Drive list request failed: {}", e)))?;
            let response = check_status(response, "list").await?;

            let page: FileList = response.json().await.map_err(|e| {
                StorageError::BackendError(format!("Failed to parse Drive listing: {}", e))
            })?;
            files.extend(page.files);

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        Ok(files)
    }

    async fn get_media(&self, file_id: &str) -> StorageResult<Response> {
        validate_id(file_id)?;
        let url = format!("{}/{}", self.files_url(), file_id);
        let request = self
            .authorized(
                self.client
                    .get(url)
                    .query(&[("alt", "media"), ("supportsAllDrives", "true")]),
            )
            .await?;
        let response = request
            .send()
            .await
            .map_err(|e| StorageError::DownloadFailed(format!("Drive download failed: {}", e)))?;
        match check_status(response, "download").await {
            Err(StorageError::NotFound(_)) => Err(StorageError::NotFound(file_id.to_string())),
            other => other,
        }
    }
}

/// Map non-success statuses to [`StorageError`]; 404 becomes `NotFound`.
async fn check_status(response: Response, operation: &str) -> StorageResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::error!(
        operation = operation,
        status = %status,
        body = %body.chars().take(500).collect::<String>(),
        "Drive API request failed"
    );
    match status {
        StatusCode::NOT_FOUND => Err(StorageError::NotFound(operation.to_string())),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StorageError::ConfigError(format!(
            "Drive rejected credentials ({})",
            status
        ))),
        _ => Err(StorageError::BackendError(format!(
            "Drive {} returned {}",
            operation, status
        ))),
    }
}

/// Body for a `multipart/related` media upload: JSON metadata part, then content.
fn related_body(boundary: &str, metadata: &serde_json::Value, file: &UploadFile) -> Bytes {
    let content_type: String = file
        .content_type
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect();
    let mut body = BytesMut::with_capacity(file.data.len() + 512);
    body.put_slice(format!("--{}\r\n", boundary).as_bytes());
    body.put_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.put_slice(metadata.to_string().as_bytes());
    body.put_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.put_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.put_slice(&file.data);
    body.put_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body.freeze()
}

#[async_trait]
impl Drive for GoogleDrive {
    #[tracing::instrument(skip(self))]
    async fn list_folders(&self, parent_id: &str) -> StorageResult<Vec<Folder>> {
        validate_id(parent_id)?;
        let query = format!(
            "'{}' in parents and mimeType = '{}' and trashed = false",
            parent_id, FOLDER_MIME
        );
        let files = self
            .list(query, "id, name, createdTime", Some("createdTime desc"))
            .await?;
        tracing::debug!(count = files.len(), "Listed Drive folders");
        Ok(files.into_iter().map(Folder::from).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn list_files(&self, folder_id: &str) -> StorageResult<Vec<FileEntry>> {
        validate_id(folder_id)?;
        let query = format!("'{}' in parents and trashed = false", folder_id);
        let files = self
            .list(query, "id, name, mimeType, size, createdTime", None)
            .await?;
        tracing::debug!(count = files.len(), "Listed Drive files");
        Ok(files.into_iter().map(FileEntry::from).collect())
    }

    async fn download_stream(&self, file_id: &str) -> StorageResult<DownloadStream> {
        let response = self.get_media(file_id).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| StorageError::DownloadFailed(e.to_string())));

        Ok(DownloadStream {
            content_type,
            stream: Box::pin(stream),
        })
    }

    async fn download_text(&self, file_id: &str) -> StorageResult<String> {
        let response = self.get_media(file_id).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tracing::instrument(skip(self, file), fields(name = %file.name, size = file.data.len()))]
    async fn upload(&self, parent_id: &str, file: UploadFile) -> StorageResult<UploadedFile> {
        validate_id(parent_id)?;
        let boundary = format!("pidview-{}", uuid::Uuid::new_v4().simple());
        let metadata = serde_json::json!({
            "name": file.name,
            "parents": [parent_id],
        });
        let body = related_body(&boundary, &metadata, &file);

        let url = format!("{}/upload/drive/v3/files", self.base_url);
        let request = self
            .authorized(
                self.client
                    .post(url)
                    .query(&[
                        ("uploadType", "multipart"),
                        ("fields", "id, name"),
                        ("supportsAllDrives", "true"),
                    ])
                    .header(
                        reqwest::header::CONTENT_TYPE,
                        format!("multipart/related; boundary={}", boundary),
                    )
                    .body(body),
            )
            .await?;

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Drive upload failed: {}", e)))?;
        let response = check_status(response, "upload").await?;
        let created: CreatedFile = response.json().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to parse upload response: {}", e))
        })?;

        tracing::info!(file_id = %created.id, "Uploaded file to Drive");
        Ok(UploadedFile {
            id: created.id,
            name: created.name,
        })
    }

    fn backend_type(&self) -> DriveBackend {
        DriveBackend::Google
    }
}
