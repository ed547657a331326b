//! Session gate and sign-in flow.
//!
//! Run with: `cargo test -p pidview-api --test auth_test`

mod helpers;

use helpers::fakes::GOOD_CODE;
use helpers::setup_test_app;

fn location(response: &axum_test::TestResponse) -> String {
    response
        .header("location")
        .to_str()
        .expect("location header is not ASCII")
        .to_string()
}

fn set_cookies(response: &axum_test::TestResponse) -> Vec<String> {
    response
        .iter_headers_by_name("set-cookie")
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_unauthenticated_page_redirects_to_sign_in() {
    let app = setup_test_app().await;

    let response = app.client().get("/plant/abc").await;

    assert_eq!(response.status_code(), 307);
    assert_eq!(
        location(&response),
        "/api/auth/signin/authentik?callbackUrl=%2Fplant%2Fabc"
    );
}

#[tokio::test]
async fn test_unauthenticated_api_call_redirects() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/progress?id=job").await;

    assert_eq!(response.status_code(), 307);
    assert!(location(&response).starts_with("/api/auth/signin/authentik?callbackUrl="));
}

#[tokio::test]
async fn test_invalid_session_cookie_redirects() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/")
        .add_header("Cookie", "pidview_session=not-a-jwt")
        .await;

    assert_eq!(response.status_code(), 307);
}

#[tokio::test]
async fn test_authenticated_request_passes_through() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/upload")
        .add_header("Cookie", app.session_cookie())
        .await;

    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("Test User"));
}

#[tokio::test]
async fn test_public_paths_skip_the_gate() {
    let app = setup_test_app().await;

    let health = app.client().get("/health").await;
    assert_eq!(health.status_code(), 200);
    let body: serde_json::Value = health.json();
    assert_eq!(body["status"], "alive");
    assert_eq!(body["drive_backend"], "memory");

    let css = app.client().get("/static/app.css").await;
    assert_eq!(css.status_code(), 200);
    assert!(css.header("content-type").to_str().unwrap().starts_with("text/css"));
}

#[tokio::test]
async fn test_sign_in_redirects_to_provider_with_state_cookie() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/api/auth/signin/authentik?callbackUrl=%2Fsystem%2Fs1")
        .await;

    assert_eq!(response.status_code(), 303);
    assert!(location(&response).starts_with("https://auth.example.com/authorize?state="));
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("pidview_oauth_state=")
        && c.contains("HttpOnly")
        && c.contains("SameSite=Lax")));
}

#[tokio::test]
async fn test_full_sign_in_round_trip() {
    let app = setup_test_app().await;

    let sign_in = app
        .client()
        .get("/api/auth/signin/authentik?callbackUrl=%2Fplant%2Fabc")
        .await;
    let state = location(&sign_in)
        .split("state=")
        .nth(1)
        .expect("state parameter")
        .to_string();
    let state_cookie = sign_in.cookie("pidview_oauth_state");

    let callback = app
        .client()
        .get(&format!(
            "/api/auth/callback/authentik?code={}&state={}",
            GOOD_CODE, state
        ))
        .add_header(
            "Cookie",
            format!("pidview_oauth_state={}", state_cookie.value()),
        )
        .await;

    assert_eq!(callback.status_code(), 303);
    assert_eq!(location(&callback), "/plant/abc");
    let session = callback.cookie("pidview_session");
    assert!(app.sessions.verify_session(session.value()).is_some());
}

#[tokio::test]
async fn test_callback_rejects_state_mismatch() {
    let app = setup_test_app().await;

    let sign_in = app.client().get("/api/auth/signin/authentik").await;
    let state_cookie = sign_in.cookie("pidview_oauth_state");

    let callback = app
        .client()
        .get(&format!(
            "/api/auth/callback/authentik?code={}&state=forged",
            GOOD_CODE
        ))
        .add_header(
            "Cookie",
            format!("pidview_oauth_state={}", state_cookie.value()),
        )
        .await;

    assert_eq!(callback.status_code(), 401);
}

#[tokio::test]
async fn test_callback_without_state_cookie_is_unauthorized() {
    let app = setup_test_app().await;

    let callback = app
        .client()
        .get("/api/auth/callback/authentik?code=good-code&state=abc")
        .await;

    assert_eq!(callback.status_code(), 401);
}

#[tokio::test]
async fn test_sign_out_clears_session() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/auth/signout")
        .add_header("Cookie", app.session_cookie())
        .await;

    assert_eq!(response.status_code(), 303);
    assert_eq!(location(&response), "/");
    assert!(set_cookies(&response)
        .iter()
        .any(|c| c.starts_with("pidview_session=") && c.contains("Max-Age=0")));
}
