//! PIDView Infrastructure Library
//!
//! Shared plumbing used by the API binary:
//! - Middleware (request ID, security headers)
//! - Tracing initialization
//! - Automation-engine webhook delivery
//! - Job progress store

pub mod middleware;
pub mod progress;
pub mod telemetry;
pub mod webhook;

// Re-export commonly used types
pub use middleware::{
    get_request_id, request_id_middleware, security_headers_middleware, RequestId,
    SecurityHeadersConfig,
};
pub use progress::{spawn_progress_sweeper, InMemoryProgressStore, ProgressStore};
pub use telemetry::init_telemetry;
pub use webhook::{spawn_notification, AnalysisNotifier, Delivery, N8nWebhook, N8nWebhookConfig};
