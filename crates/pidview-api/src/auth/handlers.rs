//! Sign-in, provider callback and sign-out routes.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;
use pidview_core::AppError;
use serde::Deserialize;
use uuid::Uuid;

use super::session::{sanitize_callback, SessionKeys, SESSION_COOKIE, STATE_COOKIE};
use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInQuery {
    pub callback_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Start a sign-in: remember the return target and hand over to the provider.
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<SignInQuery>,
) -> Result<(CookieJar, Redirect), HttpAppError> {
    let callback_url = sanitize_callback(query.callback_url.as_deref());
    let csrf_state = Uuid::new_v4().simple().to_string();

    let token = state
        .sessions
        .issue_sign_in_state(&csrf_state, &callback_url)?;
    let authorize_url = state.identity.authorization_url(&csrf_state).await?;

    Ok((
        jar.add(state.sessions.sign_in_state_cookie(token)),
        Redirect::to(&authorize_url),
    ))
}

#[tracing::instrument(skip_all)]
pub async fn callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<(CookieJar, Redirect), HttpAppError> {
    if let Some(error) = query.error {
        return Err(AppError::Unauthorized(format!("Identity provider returned: {}", error)).into());
    }

    let pending = jar
        .get(STATE_COOKIE)
        .ok_or_else(|| AppError::Unauthorized("Missing sign-in state".to_string()))?;
    let pending = state.sessions.verify_sign_in_state(pending.value())?;

    if query.state.as_deref() != Some(pending.state.as_str()) {
        return Err(AppError::Unauthorized("Sign-in state mismatch".to_string()).into());
    }
    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    let profile = state.identity.exchange_code(&code).await?;
    let session = state.sessions.issue_session(&profile)?;

    let jar = jar
        .remove(SessionKeys::removal(STATE_COOKIE))
        .add(state.sessions.session_cookie(session));
    Ok((jar, Redirect::to(&sanitize_callback(Some(&pending.callback_url)))))
}

pub async fn sign_out(jar: CookieJar) -> (CookieJar, Redirect) {
    (jar.remove(SessionKeys::removal(SESSION_COOKIE)), Redirect::to("/"))
}
