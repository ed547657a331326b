//! PIDView Storage Library
//!
//! The Drive is the only persistent store the dashboard talks to. This crate
//! defines the [`Drive`] seam and ships two backends:
//!
//! - [`GoogleDrive`]: Drive v3 REST API authenticated with a service account
//! - [`MemoryDrive`]: in-process tree for tests and offline runs
//!
//! Identifiers are opaque Drive file ids. Anything interpolated into a Drive
//! search query is validated first (see [`validate_id`]).

pub mod factory;
pub mod google_drive;
pub mod memory;
pub mod token;
pub mod traits;

pub use factory::create_drive;
pub use google_drive::GoogleDrive;
pub use memory::MemoryDrive;
pub use pidview_core::DriveBackend;
pub use token::{ServiceAccountTokenSource, StaticTokenSource, TokenSource};
pub use traits::{
    validate_id, ByteStream, DownloadStream, Drive, StorageError, StorageResult, UploadFile,
};
