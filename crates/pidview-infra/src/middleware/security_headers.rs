use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Report iframes use `srcdoc` and PDFs are framed from the same origin,
/// so frames are allowed for `'self'`, `blob:` and `data:` only.
const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' blob: data:; frame-src 'self' blob: data:; frame-ancestors 'self'";

/// Sent on every response regardless of environment.
const BASELINE_HEADERS: [(&str, &str); 5] = [
    ("X-Content-Type-Options", "nosniff"),
    // SAMEORIGIN rather than DENY: the comparison page frames /api/file/{id}
    ("X-Frame-Options", "SAMEORIGIN"),
    ("Referrer-Policy", "strict-origin-when-cross-origin"),
    ("Content-Security-Policy", CONTENT_SECURITY_POLICY),
    ("Permissions-Policy", "geolocation=(), microphone=(), camera=()"),
];

const HSTS: &str = "max-age=31536000; includeSubDomains";

#[derive(Clone, Debug)]
pub struct SecurityHeadersConfig {
    /// HSTS is only sent in production, where the dashboard sits behind TLS.
    pub is_production: bool,
}

impl SecurityHeadersConfig {
    pub fn new(is_production: bool) -> Self {
        Self { is_production }
    }
}

/// Stamp browser hardening headers onto every response.
pub async fn security_headers_middleware(
    State(config): State<Arc<SecurityHeadersConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for (name, value) in BASELINE_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
    if config.is_production {
        headers.insert("Strict-Transport-Security", HeaderValue::from_static(HSTS));
    }

    // Pages and API responses are per-user; static assets set their own caching
    headers
        .entry(header::CACHE_CONTROL)
        .or_insert(HeaderValue::from_static("no-store, private"));

    response
}
