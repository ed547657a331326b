//! Session and sign-in state cookies.
//!
//! Both cookies carry an HS256 JWT signed with `SESSION_SECRET`. The audience
//! claim keeps one kind of token from being replayed as the other.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pidview_core::AppError;
use serde::{Deserialize, Serialize};

use super::oidc::UserProfile;

pub const SESSION_COOKIE: &str = "pidview_session";
pub const STATE_COOKIE: &str = "pidview_oauth_state";

const SESSION_AUDIENCE: &str = "pidview-session";
const STATE_AUDIENCE: &str = "pidview-oauth-state";
const STATE_MAX_AGE_MINUTES: i64 = 10;
const FALLBACK_MAX_AGE_HOURS: i64 = 720;

/// Claims stored in the session cookie. Inserted into request extensions by
/// the session gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl SessionUser {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.sub)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionToken {
    #[serde(flatten)]
    user: SessionUser,
    aud: String,
}

/// Pending sign-in: the CSRF `state` sent to the provider and where to go after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInState {
    pub state: String,
    pub callback_url: String,
    exp: i64,
    aud: String,
}

#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    max_age: Duration,
    secure: bool,
}

impl SessionKeys {
    pub fn new(secret: &str, max_age_hours: i64, secure: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            // Out-of-range ages fall back to the default rather than overflowing
            max_age: Duration::try_hours(max_age_hours)
                .unwrap_or_else(|| Duration::hours(FALLBACK_MAX_AGE_HOURS)),
            secure,
        }
    }

    fn validation(audience: &str) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);
        validation
    }

    pub fn issue_session(&self, profile: &UserProfile) -> Result<String, AppError> {
        let now = Utc::now();
        let token = SessionToken {
            user: SessionUser {
                sub: profile.sub.clone(),
                name: profile.name.clone(),
                email: profile.email.clone(),
                iat: now.timestamp(),
                exp: (now + self.max_age).timestamp(),
            },
            aud: SESSION_AUDIENCE.to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &token, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign session: {}", e)))
    }

    /// Claims of a valid, unexpired session token.
    pub fn verify_session(&self, token: &str) -> Option<SessionUser> {
        match decode::<SessionToken>(token, &self.decoding, &Self::validation(SESSION_AUDIENCE)) {
            Ok(data) => Some(data.claims.user),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                None
            }
        }
    }

    pub fn issue_sign_in_state(&self, state: &str, callback_url: &str) -> Result<String, AppError> {
        let claims = SignInState {
            state: state.to_string(),
            callback_url: callback_url.to_string(),
            exp: (Utc::now() + Duration::minutes(STATE_MAX_AGE_MINUTES)).timestamp(),
            aud: STATE_AUDIENCE.to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign sign-in state: {}", e)))
    }

    pub fn verify_sign_in_state(&self, token: &str) -> Result<SignInState, AppError> {
        decode::<SignInState>(token, &self.decoding, &Self::validation(STATE_AUDIENCE))
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid sign-in state: {}", e)))
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        self.cookie(SESSION_COOKIE, token, self.max_age.num_seconds())
    }

    pub fn sign_in_state_cookie(&self, token: String) -> Cookie<'static> {
        self.cookie(STATE_COOKIE, token, STATE_MAX_AGE_MINUTES * 60)
    }

    /// A cookie matching `name`'s path, for `CookieJar::remove`.
    pub fn removal(name: &'static str) -> Cookie<'static> {
        Cookie::build(name).path("/").build()
    }

    fn cookie(&self, name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(time::Duration::seconds(max_age_secs))
            .build()
    }
}

/// Post-login redirect target. Only same-origin absolute paths are honoured.
pub fn sanitize_callback(raw: Option<&str>) -> String {
    match raw {
        Some(path) if is_local_path(path) => path.to_string(),
        _ => "/".to_string(),
    }
}

/// Browsers drop tabs and newlines from URLs, so `/\t/host` would still act
/// as `//host`. Any whitespace or control character is refused outright.
fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/') | Some('\\'))
        && !path
            .chars()
            .any(|c| c == '\\' || c.is_whitespace() || c.is_control())
}
