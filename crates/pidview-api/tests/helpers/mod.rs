//! Test helpers: build AppState and router for integration tests.
//!
//! Drive is the in-memory backend, both webhooks are recording fakes and the
//! identity provider never leaves the process.
//!
//! Run from workspace root: `cargo test -p pidview-api`.

#![allow(dead_code)]

pub mod fakes;
pub mod fixtures;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use pidview_api::auth::{SessionKeys, UserProfile};
use pidview_api::setup::routes;
use pidview_api::state::AppState;
use pidview_core::Config;
use pidview_infra::{InMemoryProgressStore, ProgressStore};
use pidview_storage::{Drive, MemoryDrive};

use fakes::{FakeIdentityProvider, NotifyOutcome, RecordingNotifier};

pub const TEST_SESSION_SECRET: &str = "integration-session-secret-0123456789";
pub const ARCHIVE_ID: &str = "archive_root";
pub const INPUT_ID: &str = "input_root";
pub const PROGRESS_TOKEN: &str = "progress-token-123";

/// Test application: server plus handles on every fake collaborator.
pub struct TestApp {
    pub server: TestServer,
    pub drive: MemoryDrive,
    pub upload_notifier: Arc<RecordingNotifier>,
    pub folder_notifier: Arc<RecordingNotifier>,
    pub sessions: SessionKeys,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// `Cookie` header value for a signed-in user.
    pub fn session_cookie(&self) -> String {
        let token = self
            .sessions
            .issue_session(&UserProfile {
                sub: "user-1".to_string(),
                name: Some("Test User".to_string()),
                email: Some("test@example.com".to_string()),
            })
            .expect("Failed to sign test session");
        format!("pidview_session={}", token)
    }
}

pub fn test_config(extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("SESSION_SECRET", TEST_SESSION_SECRET),
        ("AUTHENTIK_CLIENT_ID", "pidview"),
        ("AUTHENTIK_CLIENT_SECRET", "client-secret"),
        ("AUTHENTIK_ISSUER_URL", "https://auth.example.com/application/o/pidview/"),
        ("DRIVE_BACKEND", "memory"),
        ("DRIVE_FOLDER_ID_ARCHIVE", ARCHIVE_ID),
        ("DRIVE_FOLDER_ID_INPUT", INPUT_ID),
        ("PROGRESS_API_TOKEN", PROGRESS_TOKEN),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).expect("Invalid test configuration")
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(test_config(&[]), NotifyOutcome::Deliver).await
}

pub async fn setup_test_app_with(config: Config, folder_outcome: NotifyOutcome) -> TestApp {
    let drive = MemoryDrive::new();
    let upload_notifier = Arc::new(RecordingNotifier::new(NotifyOutcome::Deliver));
    let folder_notifier = Arc::new(RecordingNotifier::new(folder_outcome));
    let progress: Arc<dyn ProgressStore> =
        Arc::new(InMemoryProgressStore::new(Duration::from_secs(3600)));
    let sessions = SessionKeys::new(TEST_SESSION_SECRET, 1, false);

    let state = Arc::new(AppState {
        config: config.clone(),
        drive: Arc::new(drive.clone()) as Arc<dyn Drive>,
        upload_notifier: upload_notifier.clone(),
        folder_notifier: folder_notifier.clone(),
        progress,
        identity: Arc::new(FakeIdentityProvider),
        sessions: sessions.clone(),
    });

    let app = routes::setup_routes(&config, state)
        .await
        .expect("Failed to build router");
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        server,
        drive,
        upload_notifier,
        folder_notifier,
        sessions,
    }
}
