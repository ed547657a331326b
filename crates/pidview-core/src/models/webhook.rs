use chrono::{DateTime, Utc};
use serde::Serialize;

use super::drive::UploadedFile;
use super::job::JobId;

/// Body posted to the automation engine.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum AnalysisRequest {
    /// Two files were just uploaded to the input folder.
    Upload {
        job_id: JobId,
        files: Vec<UploadedFile>,
        timestamp: DateTime<Utc>,
    },
    /// Re-run the analysis over an existing Drive folder.
    Folder {
        folder_id: Option<String>,
        folder_name: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

impl AnalysisRequest {
    pub fn upload(job_id: JobId, files: Vec<UploadedFile>) -> Self {
        AnalysisRequest::Upload {
            job_id,
            files,
            timestamp: Utc::now(),
        }
    }

    pub fn folder(folder_id: Option<String>, folder_name: Option<String>) -> Self {
        AnalysisRequest::Folder {
            folder_id,
            folder_name,
            timestamp: Utc::now(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisRequest::Upload { .. } => "upload",
            AnalysisRequest::Folder { .. } => "folder",
        }
    }
}
