//! Domain models
//!
//! Everything here is read-only from the dashboard's point of view: folders and
//! files belong to the Drive, comparisons are derived on every request and jobs
//! live only as long as the process.

mod comparison;
mod drive;
mod job;
mod webhook;

pub use comparison::Comparison;
pub use drive::{FileEntry, Folder, UploadedFile, HTML_MIME, PDF_MIME};
pub use job::{JobId, Progress};
pub use webhook::AnalysisRequest;
