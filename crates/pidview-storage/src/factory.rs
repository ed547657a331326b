use std::sync::Arc;

use pidview_core::Config;

use crate::{Drive, DriveBackend, GoogleDrive, MemoryDrive, StorageResult};

/// Create a Drive backend based on configuration
pub fn create_drive(config: &Config) -> StorageResult<Arc<dyn Drive>> {
    match config.drive_backend() {
        DriveBackend::Google => {
            let drive = GoogleDrive::with_service_account(
                config.google_api_base_url(),
                config.google_service_account_json().map(String::from),
            )?;
            tracing::info!(base_url = %config.google_api_base_url(), "Using Google Drive backend");
            Ok(Arc::new(drive))
        }
        DriveBackend::Memory => {
            tracing::warn!("Using in-memory drive backend; contents are lost on restart");
            Ok(Arc::new(MemoryDrive::new()))
        }
    }
}
