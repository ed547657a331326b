//! In-process stand-ins for the webhook and identity provider.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use pidview_api::auth::{IdentityProvider, UserProfile};
use pidview_core::{AnalysisRequest, AppError};
use pidview_infra::{AnalysisNotifier, Delivery};

pub const GOOD_CODE: &str = "good-code";

#[derive(Debug, Clone, Copy)]
pub enum NotifyOutcome {
    Deliver,
    Skip,
    Fail,
}

/// Records every request it is asked to deliver.
pub struct RecordingNotifier {
    outcome: NotifyOutcome,
    requests: Mutex<Vec<AnalysisRequest>>,
}

impl RecordingNotifier {
    pub fn new(outcome: NotifyOutcome) -> Self {
        Self {
            outcome,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<AnalysisRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Wait for detached notifications to land.
    pub async fn wait_for(&self, count: usize) -> Vec<AnalysisRequest> {
        for _ in 0..100 {
            if self.requests.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.requests()
    }
}

#[async_trait]
impl AnalysisNotifier for RecordingNotifier {
    async fn notify(&self, request: &AnalysisRequest) -> anyhow::Result<Delivery> {
        self.requests.lock().unwrap().push(request.clone());
        match self.outcome {
            NotifyOutcome::Deliver => Ok(Delivery::Delivered { status: 200 }),
            NotifyOutcome::Skip => Ok(Delivery::Skipped),
            NotifyOutcome::Fail => Err(anyhow::anyhow!("webhook returned 500")),
        }
    }
}

/// Accepts [`GOOD_CODE`] and nothing else.
pub struct FakeIdentityProvider;

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn authorization_url(&self, state: &str) -> Result<String, AppError> {
        Ok(format!("https://auth.example.com/authorize?state={}", state))
    }

    async fn exchange_code(&self, code: &str) -> Result<UserProfile, AppError> {
        if code == GOOD_CODE {
            Ok(UserProfile {
                sub: "user-1".to_string(),
                name: Some("Test User".to_string()),
                email: None,
            })
        } else {
            Err(AppError::Unauthorized("bad code".to_string()))
        }
    }
}
