use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PDF_MIME: &str = "application/pdf";
pub const HTML_MIME: &str = "text/html";

/// A folder in the archive hierarchy (plant, system or comparison).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub created_time: Option<DateTime<Utc>>,
}

impl Folder {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_time: None,
        }
    }

    pub fn with_created_time(mut self, created_time: DateTime<Utc>) -> Self {
        self.created_time = Some(created_time);
        self
    }

    /// Archive entries flagged by the automation engine carry `CRITICAL` in their name.
    pub fn is_critical(&self) -> bool {
        self.name.to_uppercase().contains("CRITICAL")
    }
}

/// A file inside a comparison folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: Option<u64>,
}

impl FileEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            size: None,
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME || has_extension(&self.name, "pdf")
    }

    pub fn is_html(&self) -> bool {
        self.mime_type == HTML_MIME
            || has_extension(&self.name, "html")
            || has_extension(&self.name, "htm")
    }
}

fn has_extension(name: &str, ext: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, suffix)| suffix.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// A file written to the input folder by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_detection_uses_mime_or_extension() {
        assert!(FileEntry::new("1", "a.bin", PDF_MIME).is_pdf());
        assert!(FileEntry::new("2", "Drawing.PDF", "application/octet-stream").is_pdf());
        assert!(!FileEntry::new("3", "report.html", HTML_MIME).is_pdf());
    }

    #[test]
    fn html_detection_uses_mime_or_extension() {
        assert!(FileEntry::new("1", "audit", HTML_MIME).is_html());
        assert!(FileEntry::new("2", "audit.htm", "text/plain").is_html());
        assert!(!FileEntry::new("3", "html", "text/plain").is_html());
    }

    #[test]
    fn critical_flag_is_case_insensitive() {
        assert!(Folder::new("1", "Plant A - critical").is_critical());
        assert!(!Folder::new("2", "Plant B").is_critical());
    }

    #[test]
    fn folder_serializes_camel_case() {
        let json = serde_json::to_value(Folder::new("f1", "Plant")).unwrap();
        assert!(json.get("createdTime").is_some());
    }
}
