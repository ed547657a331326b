//! Collaborator wiring: Drive, webhooks, progress store and identity provider.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use pidview_core::Config;
use pidview_infra::{
    spawn_progress_sweeper, InMemoryProgressStore, N8nWebhook, N8nWebhookConfig, ProgressStore,
};
use pidview_storage::create_drive;

use crate::auth::{OidcProvider, SessionKeys};
use crate::state::AppState;

const PROGRESS_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

fn webhook(config: &Config, url: Option<&str>) -> Result<N8nWebhook> {
    N8nWebhook::new(N8nWebhookConfig {
        url: url.map(str::to_string),
        timeout_seconds: config.webhook_timeout_secs(),
        max_retries: config.webhook_max_retries(),
    })
}

pub async fn initialize_services(config: &Config) -> Result<Arc<AppState>> {
    let drive = create_drive(config).context("Failed to initialize Drive backend")?;
    tracing::info!(backend = %drive.backend_type(), "Drive backend initialized");

    let upload_notifier = webhook(config, config.n8n_webhook_url())?;
    let folder_notifier = webhook(config, config.n8n_folder_webhook_url())?;

    let progress: Arc<dyn ProgressStore> = Arc::new(InMemoryProgressStore::new(
        Duration::from_secs(config.progress_ttl_secs()),
    ));
    spawn_progress_sweeper(progress.clone(), PROGRESS_SWEEP_INTERVAL);
    tracing::info!(
        ttl_secs = config.progress_ttl_secs(),
        "Progress store initialized with periodic cleanup"
    );

    let identity = OidcProvider::new(
        config.authentik_issuer_url(),
        config.authentik_client_id(),
        config.authentik_client_secret(),
        config.oidc_redirect_uri(),
    )
    .context("Failed to initialize OIDC client")?;

    let sessions = SessionKeys::new(
        config.session_secret(),
        config.session_max_age_hours(),
        config.is_production(),
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        drive,
        upload_notifier: Arc::new(upload_notifier),
        folder_notifier: Arc::new(folder_notifier),
        progress,
        identity: Arc::new(identity),
        sessions,
    }))
}
