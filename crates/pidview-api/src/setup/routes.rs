//! Route configuration and setup

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use pidview_core::Config;
use pidview_infra::{request_id_middleware, security_headers_middleware, SecurityHeadersConfig};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{handlers as auth_handlers, middleware::session_gate};
use crate::handlers::{file, health, pages, progress, trigger, upload};
use crate::state::AppState;

const APP_CSS: &str = include_str!("../../static/app.css");
const APP_JS: &str = include_str!("../../static/app.js");

/// Setup all application routes
pub async fn setup_routes(
    config: &Config,
    state: Arc<AppState>,
) -> Result<Router<()>, anyhow::Error> {
    let security_headers_config = Arc::new(SecurityHeadersConfig::new(config.is_production()));

    let http_concurrency_limit = config.http_concurrency_limit().max(1);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let app = page_routes()
        .merge(api_routes())
        .merge(auth_routes())
        .merge(public_routes())
        // Everything above, including the public paths, passes the gate; it
        // keeps its own allow-list.
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_gate,
        ))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_size_bytes()))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn_with_state(
            security_headers_config,
            security_headers_middleware,
        ))
        .with_state(state);

    Ok(app)
}

fn page_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(pages::archive))
        .route("/plant/{id}", get(pages::plant))
        .route("/system/{id}", get(pages::system))
        .route("/comparison/{id}", get(pages::comparison))
        .route("/upload", get(pages::upload))
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/file/{id}", get(file::stream_file))
        .route(
            "/api/progress",
            get(progress::get_progress).post(progress::set_progress),
        )
        .route("/api/upload", axum::routing::post(upload::upload_files))
        .route("/api/trigger", axum::routing::post(trigger::trigger_folder))
}

fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/signin/authentik", get(auth_handlers::sign_in))
        .route("/api/auth/callback/authentik", get(auth_handlers::callback))
        .route(
            "/api/auth/signout",
            get(auth_handlers::sign_out).post(auth_handlers::sign_out),
        )
}

fn static_asset(content_type: &'static str, body: &'static str) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        body,
    )
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/static/app.css",
            get(|| async { static_asset("text/css; charset=utf-8", APP_CSS) }),
        )
        .route(
            "/static/app.js",
            get(|| async { static_asset("text/javascript; charset=utf-8", APP_JS) }),
        )
}
