use chrono::{DateTime, Utc};
use serde::Serialize;

use super::drive::FileEntry;

/// A comparison folder resolved into its old/new drawing pair.
///
/// Never stored anywhere; rebuilt from the folder listing on each request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub id: String,
    pub name: String,
    pub created_time: Option<DateTime<Utc>>,
    pub rev_a: Option<String>,
    pub rev_b: Option<String>,
    pub pdf_a: Option<FileEntry>,
    pub pdf_b: Option<FileEntry>,
    pub report: Option<FileEntry>,
    pub pdf_count: usize,
}

impl Comparison {
    pub fn empty(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_time: None,
            rev_a: None,
            rev_b: None,
            pdf_a: None,
            pdf_b: None,
            report: None,
            pdf_count: 0,
        }
    }

    /// Only a folder with exactly two PDFs can be opened.
    pub fn is_ready(&self) -> bool {
        self.pdf_count == 2 && self.pdf_a.is_some() && self.pdf_b.is_some()
    }
}
