use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use pidview_infra::get_request_id;
use subtle::ConstantTimeEq;

use super::session::SESSION_COOKIE;
use crate::state::AppState;

pub const SIGN_IN_PATH: &str = "/api/auth/signin/authentik";
const PROGRESS_PATH: &str = "/api/progress";

/// Paths reachable without a session.
fn is_public_path(path: &str) -> bool {
    path.starts_with("/api/auth/")
        || path.starts_with("/static/")
        || path == "/favicon.ico"
        || path == "/health"
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// The automation engine reports progress with a shared bearer token instead
/// of a browser session.
fn is_progress_reporter(state: &AppState, request: &Request) -> bool {
    let Some(expected) = state.config.progress_api_token() else {
        return false;
    };
    if request.method() != Method::POST || request.uri().path() != PROGRESS_PATH {
        return false;
    }
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .is_some_and(|token| secure_compare(token, expected))
}

/// Redirect target for an unauthenticated request, keeping where it was going.
pub fn sign_in_redirect(request: &Request) -> Redirect {
    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Redirect::temporary(&format!(
        "{}?callbackUrl={}",
        SIGN_IN_PATH,
        urlencoding::encode(target)
    ))
}

/// Session gate: every request outside the public allow-list needs a valid
/// session cookie, otherwise it is sent straight to the identity provider.
pub async fn session_gate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if is_public_path(&path) {
        return next.run(request).await;
    }

    let user = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.verify_session(cookie.value()));

    match user {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None if is_progress_reporter(&state, &request) => next.run(request).await,
        None => {
            tracing::debug!(
                path = %path,
                request_id = get_request_id(&request).as_deref().unwrap_or("-"),
                "No valid session, redirecting to sign-in"
            );
            sign_in_redirect(&request).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_public_paths() {
        assert!(is_public_path("/api/auth/signin/authentik"));
        assert!(is_public_path("/api/auth/callback/authentik"));
        assert!(is_public_path("/static/app.css"));
        assert!(is_public_path("/favicon.ico"));
        assert!(is_public_path("/health"));
        assert!(!is_public_path("/"));
        assert!(!is_public_path("/api/progress"));
        assert!(!is_public_path("/api/authx"));
        assert!(!is_public_path("/plant/abc"));
    }

    #[test]
    fn test_redirect_keeps_path_and_query() {
        let request = Request::builder()
            .uri("/plant/abc?q=rev&sort=a-z")
            .body(Body::empty())
            .unwrap();
        let response = sign_in_redirect(&request).into_response();
        assert_eq!(
            response.headers()[header::LOCATION],
            "/api/auth/signin/authentik?callbackUrl=%2Fplant%2Fabc%3Fq%3Drev%26sort%3Da-z"
        );
    }

    #[test]
    fn test_secure_compare() {
        assert!(secure_compare("token", "token"));
        assert!(!secure_compare("token", "tokem"));
        assert!(!secure_compare("token", "token2"));
    }
}
