//! OpenID Connect client for the identity provider (Authentik).
//!
//! Authorization code flow only. The discovery document is fetched on first
//! use and cached for the life of the process.

use std::time::Duration;

use async_trait::async_trait;
use pidview_core::AppError;
use reqwest::{Client, Url};
use serde::Deserialize;
use tokio::sync::OnceCell;

const SCOPES: &str = "openid email profile";

/// Who signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Where to send the browser to start a sign-in carrying `state`.
    async fn authorization_url(&self, state: &str) -> Result<String, AppError>;

    /// Trade an authorization code for the signed-in user's profile.
    async fn exchange_code(&self, code: &str) -> Result<UserProfile, AppError>;
}

#[derive(Debug, Clone, Deserialize)]
struct Discovery {
    authorization_endpoint: String,
    token_endpoint: String,
    userinfo_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    name: Option<String>,
    preferred_username: Option<String>,
    email: Option<String>,
}

pub struct OidcProvider {
    client: Client,
    issuer_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    discovery: OnceCell<Discovery>,
}

impl OidcProvider {
    pub fn new(
        issuer_url: &str,
        client_id: &str,
        client_secret: &str,
        redirect_uri: String,
    ) -> Result<Self, anyhow::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            issuer_url: issuer_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri,
            discovery: OnceCell::new(),
        })
    }

    async fn discovery(&self) -> Result<&Discovery, AppError> {
        self.discovery
            .get_or_try_init(|| async {
                let url = format!("{}/.well-known/openid-configuration", self.issuer_url);
                tracing::debug!(url = %url, "Fetching OIDC discovery document");
                let response = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| AppError::Upstream(format!("OIDC discovery failed: {}", e)))?;
                if !response.status().is_success() {
                    return Err(AppError::Upstream(format!(
                        "OIDC discovery returned {}",
                        response.status()
                    )));
                }
                response
                    .json::<Discovery>()
                    .await
                    .map_err(|e| AppError::Upstream(format!("Invalid OIDC discovery document: {}", e)))
            })
            .await
    }
}

#[async_trait]
impl IdentityProvider for OidcProvider {
    async fn authorization_url(&self, state: &str) -> Result<String, AppError> {
        let discovery = self.discovery().await?;
        let url = Url::parse_with_params(
            &discovery.authorization_endpoint,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", SCOPES),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Upstream(format!("Invalid authorization endpoint: {}", e)))?;
        Ok(url.to_string())
    }

    #[tracing::instrument(skip(self, code))]
    async fn exchange_code(&self, code: &str) -> Result<UserProfile, AppError> {
        let discovery = self.discovery().await?;

        let response = self
            .client
            .post(&discovery.token_endpoint)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Token request failed: {}", e)))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body.chars().take(200).collect::<String>(), "Code exchange rejected");
            return Err(AppError::Unauthorized("Sign-in could not be completed".to_string()));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid token response: {}", e)))?;

        let info: UserInfo = self
            .client
            .get(&discovery.userinfo_endpoint)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Upstream(format!("Userinfo request failed: {}", e)))?
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid userinfo response: {}", e)))?;

        tracing::info!(sub = %info.sub, "User signed in");
        Ok(UserProfile {
            sub: info.sub,
            name: info.name.or(info.preferred_username),
            email: info.email,
        })
    }
}
