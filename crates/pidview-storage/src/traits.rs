//! Drive abstraction trait

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use pidview_core::{FileEntry, Folder, UploadedFile};
use thiserror::Error;

use crate::DriveBackend;

/// Drive operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid drive id: {0}")]
    InvalidId(String),

    #[error("Drive backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for drive operations
pub type StorageResult<T> = Result<T, StorageError>;

pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// File content as it comes off the wire.
pub struct DownloadStream {
    /// `Content-Type` reported by the backend, forwarded as-is.
    pub content_type: Option<String>,
    pub stream: ByteStream,
}

impl std::fmt::Debug for DownloadStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadStream")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// A file to create in a Drive folder.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Drive abstraction trait
///
/// Folder hierarchy (archive, plant, system, comparison) is expressed purely
/// through parent ids; the trait knows nothing about what a level means.
#[async_trait]
pub trait Drive: Send + Sync {
    /// Child folders of `parent_id`, not trashed, newest first.
    async fn list_folders(&self, parent_id: &str) -> StorageResult<Vec<Folder>>;

    /// All non-trashed children of `folder_id`.
    async fn list_files(&self, folder_id: &str) -> StorageResult<Vec<FileEntry>>;

    /// Stream the raw bytes of a file.
    async fn download_stream(&self, file_id: &str) -> StorageResult<DownloadStream>;

    /// Download a file and decode it as UTF-8 (lossy).
    async fn download_text(&self, file_id: &str) -> StorageResult<String>;

    /// Create a file inside `parent_id`.
    async fn upload(&self, parent_id: &str, file: UploadFile) -> StorageResult<UploadedFile>;

    fn backend_type(&self) -> DriveBackend;
}

/// Drive ids are URL-safe base64-ish tokens. Anything else is refused before it
/// reaches a query string.
pub fn validate_id(id: &str) -> StorageResult<()> {
    let valid = !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidId(id.chars().take(64).collect()))
    }
}
