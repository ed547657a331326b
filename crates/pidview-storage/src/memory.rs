//! In-memory Drive backend.
//!
//! Keeps a folder tree in process. Used by the integration tests and by
//! `DRIVE_BACKEND=memory` for running the dashboard without Google credentials.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use pidview_core::{FileEntry, Folder, UploadedFile};

use crate::traits::{validate_id, DownloadStream, Drive, StorageError, StorageResult, UploadFile};
use crate::DriveBackend;

#[derive(Default)]
struct Tree {
    folders: HashMap<String, Vec<Folder>>,
    files: HashMap<String, Vec<FileEntry>>,
    contents: HashMap<String, Bytes>,
    uploads: Vec<(String, UploadedFile)>,
    failing: bool,
}

/// Drive kept entirely in memory. Cloning shares the same tree.
#[derive(Clone, Default)]
pub struct MemoryDrive {
    tree: Arc<Mutex<Tree>>,
}

impl MemoryDrive {
    pub fn new() -> Self {
        Self::default()
    }

    fn tree(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a child folder under `parent_id`.
    pub fn add_folder(&self, parent_id: &str, folder: Folder) {
        self.tree()
            .folders
            .entry(parent_id.to_string())
            .or_default()
            .push(folder);
    }

    /// Add a file with content under `folder_id`.
    pub fn add_file(&self, folder_id: &str, entry: FileEntry, content: impl Into<Bytes>) {
        let mut tree = self.tree();
        tree.contents.insert(entry.id.clone(), content.into());
        tree.files
            .entry(folder_id.to_string())
            .or_default()
            .push(entry);
    }

    /// Make every subsequent call fail with a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.tree().failing = failing;
    }

    /// Files written through [`Drive::upload`], with their parent ids, in call order.
    pub fn uploads(&self) -> Vec<(String, UploadedFile)> {
        self.tree().uploads.clone()
    }

    pub fn content(&self, file_id: &str) -> Option<Bytes> {
        self.tree().contents.get(file_id).cloned()
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.tree().failing {
            return Err(StorageError::BackendError(
                "memory drive is set to fail".to_string(),
            ));
        }
        Ok(())
    }

    fn find_file(&self, file_id: &str) -> StorageResult<(Option<String>, Bytes)> {
        validate_id(file_id)?;
        self.check_available()?;
        let tree = self.tree();
        let data = tree
            .contents
            .get(file_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(file_id.to_string()))?;
        let mime = tree
            .files
            .values()
            .flatten()
            .find(|f| f.id == file_id)
            .map(|f| f.mime_type.clone())
            .filter(|m| !m.is_empty());
        Ok((mime, data))
    }
}

#[async_trait]
impl Drive for MemoryDrive {
    async fn list_folders(&self, parent_id: &str) -> StorageResult<Vec<Folder>> {
        validate_id(parent_id)?;
        self.check_available()?;
        let mut folders = self
            .tree()
            .folders
            .get(parent_id)
            .cloned()
            .unwrap_or_default();
        folders.sort_by(|a, b| b.created_time.cmp(&a.created_time));
        Ok(folders)
    }

    async fn list_files(&self, folder_id: &str) -> StorageResult<Vec<FileEntry>> {
        validate_id(folder_id)?;
        self.check_available()?;
        Ok(self.tree().files.get(folder_id).cloned().unwrap_or_default())
    }

    async fn download_stream(&self, file_id: &str) -> StorageResult<DownloadStream> {
        let (content_type, data) = self.find_file(file_id)?;
        Ok(DownloadStream {
            content_type,
            stream: Box::pin(stream::once(async move { Ok::<_, StorageError>(data) })),
        })
    }

    async fn download_text(&self, file_id: &str) -> StorageResult<String> {
        let (_, data) = self.find_file(file_id)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    async fn upload(&self, parent_id: &str, file: UploadFile) -> StorageResult<UploadedFile> {
        validate_id(parent_id)?;
        self.check_available()?;
        let id = format!("mem_{}", uuid::Uuid::new_v4().simple());
        let mut entry = FileEntry::new(id.clone(), file.name.clone(), file.content_type);
        entry.size = Some(file.data.len() as u64);

        let mut tree = self.tree();
        tree.contents.insert(id.clone(), file.data);
        tree.files
            .entry(parent_id.to_string())
            .or_default()
            .push(entry);
        let stored = UploadedFile { id, name: file.name };
        tree.uploads.push((parent_id.to_string(), stored.clone()));
        Ok(stored)
    }

    fn backend_type(&self) -> DriveBackend {
        DriveBackend::Memory
    }
}
