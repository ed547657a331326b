//! Configuration validation
//!
//! Checks that only matter to the HTTP surface. Field-level checks live in
//! `Config::validate`.

use anyhow::Result;
use pidview_core::{Config, DriveBackend};

pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.http_concurrency_limit() == 0 {
        return Err(anyhow::anyhow!("HTTP_CONCURRENCY_LIMIT must be greater than 0"));
    }

    if config.is_production() {
        if !config.app_base_url().starts_with("https://") {
            tracing::warn!(
                app_base_url = %config.app_base_url(),
                "APP_BASE_URL is not https in production; secure session cookies will not be sent back"
            );
        }
        if config.drive_backend() == DriveBackend::Memory {
            return Err(anyhow::anyhow!(
                "DRIVE_BACKEND=memory is not allowed in production"
            ));
        }
    }

    if config.archive_folder_id().is_err() {
        tracing::warn!("DRIVE_FOLDER_ID_ARCHIVE is not set; the archive page will show an error");
    }
    if config.input_folder_id().is_err() {
        tracing::warn!("DRIVE_FOLDER_ID_INPUT is not set; uploads will be rejected");
    }
    if config.n8n_webhook_url().is_none() {
        tracing::warn!("N8N_WEBHOOK_URL is not set; uploads will not trigger an analysis");
    }

    Ok(())
}
