//! PIDView Core Library
//!
//! Domain models, error types, configuration and the pure transformations
//! (report extraction, listing search/sort, comparison derivation) shared by
//! the storage, infrastructure and API crates.

pub mod comparison;
pub mod config;
pub mod error;
pub mod listing;
pub mod models;
pub mod natural;
pub mod report;
pub mod storage_types;

// Re-export commonly used types
pub use comparison::derive_comparison;
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use listing::{filter_and_sort, Listable, SortKey};
pub use models::{AnalysisRequest, Comparison, FileEntry, Folder, JobId, Progress, UploadedFile};
pub use natural::natural_cmp;
pub use report::{extract_report, Extraction};
pub use storage_types::DriveBackend;
