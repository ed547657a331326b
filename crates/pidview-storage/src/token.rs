//! OAuth access tokens for the Drive REST API.
//!
//! [`ServiceAccountTokenSource`] implements the JWT-bearer grant: it signs an
//! RS256 assertion with the service-account key and trades it for an access
//! token, which is cached until shortly before it expires.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::traits::{StorageError, StorageResult};

const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

/// Supplies bearer tokens for Drive requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> StorageResult<String>;
}

/// Fixed token, for tests and for tokens minted outside the process.
pub struct StaticTokenSource(String);

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self) -> StorageResult<String> {
        Ok(self.0.clone())
    }
}

/// Fields of a Google service-account key file that the grant needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Service-account token source.
///
/// The key JSON is parsed on first use so a missing or broken key only fails
/// Drive requests, not startup.
pub struct ServiceAccountTokenSource {
    raw_key: Option<String>,
    client: reqwest::Client,
    cache: RwLock<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    pub fn new(raw_key: Option<String>, client: reqwest::Client) -> Self {
        Self {
            raw_key,
            client,
            cache: RwLock::new(None),
        }
    }

    fn parse_key(&self) -> StorageResult<ServiceAccountKey> {
        let raw = self.raw_key.as_deref().ok_or_else(|| {
            StorageError::ConfigError("GOOGLE_SERVICE_ACCOUNT_JSON is not set".to_string())
        })?;
        serde_json::from_str(raw).map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to parse GOOGLE_SERVICE_ACCOUNT_JSON: {}",
                e
            ))
        })
    }

    fn sign_assertion(key: &ServiceAccountKey, token_uri: &str, now: DateTime<Utc>) -> StorageResult<String> {
        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: DRIVE_SCOPE,
            aud: token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        // Keys pasted into env files often carry literal "\n" sequences
        let pem = key.private_key.replace("\\n", "\n");
        let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
            StorageError::ConfigError(format!("Invalid service account private key: {}", e))
        })?;
        encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| StorageError::ConfigError(format!("Failed to sign assertion: {}", e)))
    }

    async fn fetch_token(&self) -> StorageResult<CachedToken> {
        let key = self.parse_key()?;
        let token_uri = key.token_uri.clone().unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());
        let now = Utc::now();
        let assertion = Self::sign_assertion(&key, &token_uri, now)?;

        let response = self
            .client
            .post(&token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| StorageError::BackendError(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                client_email = %key.client_email,
                body = %body,
                "Service account token exchange rejected"
            );
            return Err(StorageError::BackendError(format!(
                "Token endpoint returned {}",
                status
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            StorageError::BackendError(format!("Failed to parse token response: {}", e))
        })?;

        let lifetime = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        tracing::debug!(lifetime_secs = lifetime, "Obtained Drive access token");

        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + Duration::seconds(lifetime),
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> StorageResult<String> {
        let margin = Duration::seconds(REFRESH_MARGIN_SECS);
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at - margin > Utc::now() {
                    return Ok(cached.token.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(cached) = cache.as_ref() {
            if cached.expires_at - margin > Utc::now() {
                return Ok(cached.token.clone());
            }
        }
        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *cache = Some(fresh);
        Ok(token)
    }
}
