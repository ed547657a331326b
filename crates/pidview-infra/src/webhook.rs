//! Automation-engine notifications.
//!
//! The analysis itself runs in n8n. The dashboard only posts a JSON body to a
//! webhook URL and, for uploads, does not wait for the outcome.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use pidview_core::AnalysisRequest;
use reqwest::Client;
use tokio::task::JoinHandle;

const RETRY_BACKOFF_MS: u64 = 500;

/// Outcome of a notification that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered { status: u16 },
    /// No webhook URL is configured.
    Skipped,
}

/// Something that can kick off an analysis run.
#[async_trait]
pub trait AnalysisNotifier: Send + Sync {
    async fn notify(&self, request: &AnalysisRequest) -> Result<Delivery>;
}

/// Configuration for the n8n webhook client
#[derive(Clone, Debug)]
pub struct N8nWebhookConfig {
    pub url: Option<String>,
    pub timeout_seconds: u64,
    /// Extra attempts after the first one.
    pub max_retries: u32,
}

impl Default for N8nWebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_seconds: 30,
            max_retries: 0,
        }
    }
}

/// Posts analysis requests to an n8n webhook.
#[derive(Clone)]
pub struct N8nWebhook {
    http_client: Client,
    config: N8nWebhookConfig,
}

impl N8nWebhook {
    pub fn new(config: N8nWebhookConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client for webhooks")?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.config.url.is_some()
    }

    async fn send_once(&self, url: &str, request: &AnalysisRequest) -> Result<u16> {
        let response = self
            .http_client
            .post(url)
            .json(request)
            .send()
            .await
            .context("Webhook request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Webhook returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            );
        }
        Ok(status.as_u16())
    }
}

#[async_trait]
impl AnalysisNotifier for N8nWebhook {
    #[tracing::instrument(skip(self, request), fields(kind = request.kind()))]
    async fn notify(&self, request: &AnalysisRequest) -> Result<Delivery> {
        let Some(url) = self.config.url.as_deref() else {
            tracing::debug!("No webhook URL configured, skipping notification");
            return Ok(Delivery::Skipped);
        };

        let attempts = self.config.max_retries + 1;
        let mut last_error = None;
        for attempt in 1..=attempts {
            match self.send_once(url, request).await {
                Ok(status) => {
                    tracing::info!(attempt = attempt, status = status, "Webhook delivered");
                    return Ok(Delivery::Delivered { status });
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt,
                        max_attempts = attempts,
                        error = %e,
                        "Webhook delivery attempt failed"
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * attempt as u64))
                            .await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow::anyhow!("Webhook delivery failed"))
            .context(format!("Webhook delivery failed after {} attempt(s)", attempts)))
    }
}

/// Fire-and-forget notification. Failures are logged, never returned.
pub fn spawn_notification(
    notifier: Arc<dyn AnalysisNotifier>,
    request: AnalysisRequest,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match notifier.notify(&request).await {
            Ok(delivery) => {
                tracing::debug!(kind = request.kind(), delivery = ?delivery, "Analysis notification finished");
            }
            Err(e) => {
                tracing::error!(
                    kind = request.kind(),
                    error = %e,
                    "Failed to notify automation engine"
                );
            }
        }
    })
}
