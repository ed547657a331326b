//! Application state shared by all handlers.

use std::sync::Arc;

use pidview_core::Config;
use pidview_infra::{AnalysisNotifier, ProgressStore};
use pidview_storage::Drive;

use crate::auth::{IdentityProvider, SessionKeys};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub drive: Arc<dyn Drive>,
    /// Notified after a two-file upload.
    pub upload_notifier: Arc<dyn AnalysisNotifier>,
    /// Notified by the folder trigger.
    pub folder_notifier: Arc<dyn AnalysisNotifier>,
    pub progress: Arc<dyn ProgressStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub sessions: SessionKeys,
}
