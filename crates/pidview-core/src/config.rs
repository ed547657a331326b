//! Configuration module
//!
//! Settings are read once at startup from the process environment (after
//! loading a `.env` file when present). Values that only matter to a single
//! collaborator (Drive folder ids, webhook URLs, service-account key) are kept
//! optional here and checked when that collaborator is first used.

use std::env;

use crate::error::AppError;
use crate::storage_types::DriveBackend;

const SERVER_PORT: u16 = 3000;
const SESSION_MAX_AGE_HOURS: i64 = 720;
const GOOGLE_API_BASE_URL: &str = "https://www.googleapis.com";
const WEBHOOK_TIMEOUT_SECS: u64 = 30;
const WEBHOOK_MAX_RETRIES: u32 = 0;
const PROGRESS_TTL_SECS: u64 = 86_400;
const MAX_UPLOAD_SIZE_MB: usize = 100;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const MIN_SESSION_SECRET_LEN: usize = 32;
const MAX_SESSION_MAX_AGE_HOURS: i64 = 24 * 365;

/// Dashboard configuration
#[derive(Clone, Debug)]
pub struct DashboardConfig {
    pub server_port: u16,
    pub environment: String,
    pub app_base_url: String,
    // Sessions
    pub session_secret: String,
    pub session_max_age_hours: i64,
    // Identity provider
    pub authentik_client_id: String,
    pub authentik_client_secret: String,
    pub authentik_issuer_url: String,
    // Drive
    pub drive_backend: DriveBackend,
    pub google_service_account_json: Option<String>,
    pub google_api_base_url: String,
    pub drive_folder_id_archive: Option<String>,
    pub drive_folder_id_input: Option<String>,
    // Automation engine
    pub n8n_webhook_url: Option<String>,
    pub n8n_folder_webhook_url: Option<String>,
    pub webhook_timeout_secs: u64,
    pub webhook_max_retries: u32,
    // Progress
    pub progress_ttl_secs: u64,
    pub progress_api_token: Option<String>,
    // HTTP
    pub max_upload_size_mb: usize,
    pub http_concurrency_limit: usize,
    pub log_format: String,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<DashboardConfig>);

impl Config {
    fn inner(&self) -> &DashboardConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = DashboardConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    /// Build a configuration from an arbitrary key lookup instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = DashboardConfig::from_lookup(lookup)?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.inner().server_port
    }

    pub fn app_base_url(&self) -> &str {
        &self.inner().app_base_url
    }

    pub fn session_secret(&self) -> &str {
        &self.inner().session_secret
    }

    pub fn session_max_age_hours(&self) -> i64 {
        self.inner().session_max_age_hours
    }

    pub fn authentik_client_id(&self) -> &str {
        &self.inner().authentik_client_id
    }

    pub fn authentik_client_secret(&self) -> &str {
        &self.inner().authentik_client_secret
    }

    pub fn authentik_issuer_url(&self) -> &str {
        &self.inner().authentik_issuer_url
    }

    /// Redirect URI registered with the identity provider.
    pub fn oidc_redirect_uri(&self) -> String {
        format!(
            "{}/api/auth/callback/authentik",
            self.inner().app_base_url.trim_end_matches('/')
        )
    }

    pub fn drive_backend(&self) -> DriveBackend {
        self.inner().drive_backend
    }

    pub fn google_service_account_json(&self) -> Option<&str> {
        self.inner().google_service_account_json.as_deref()
    }

    pub fn google_api_base_url(&self) -> &str {
        &self.inner().google_api_base_url
    }

    pub fn archive_folder_id(&self) -> Result<&str, AppError> {
        required_at_use(
            self.inner().drive_folder_id_archive.as_deref(),
            "DRIVE_FOLDER_ID_ARCHIVE",
        )
    }

    pub fn input_folder_id(&self) -> Result<&str, AppError> {
        required_at_use(
            self.inner().drive_folder_id_input.as_deref(),
            "DRIVE_FOLDER_ID_INPUT",
        )
    }

    pub fn n8n_webhook_url(&self) -> Option<&str> {
        self.inner().n8n_webhook_url.as_deref()
    }

    /// Folder-trigger webhook, falling back to the upload webhook.
    pub fn n8n_folder_webhook_url(&self) -> Option<&str> {
        self.inner()
            .n8n_folder_webhook_url
            .as_deref()
            .or(self.inner().n8n_webhook_url.as_deref())
    }

    pub fn webhook_timeout_secs(&self) -> u64 {
        self.inner().webhook_timeout_secs
    }

    pub fn webhook_max_retries(&self) -> u32 {
        self.inner().webhook_max_retries
    }

    pub fn progress_ttl_secs(&self) -> u64 {
        self.inner().progress_ttl_secs
    }

    pub fn progress_api_token(&self) -> Option<&str> {
        self.inner().progress_api_token.as_deref()
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.inner().max_upload_size_mb * 1024 * 1024
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.inner().http_concurrency_limit
    }

    pub fn log_format(&self) -> &str {
        &self.inner().log_format
    }
}

fn required_at_use<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, AppError> {
    value.ok_or_else(|| AppError::Configuration(format!("{} is not set", name)))
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty strings count as unset, the way most .env files leave placeholders
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = get("ENVIRONMENT")
            .or_else(|| get("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let server_port: u16 = get("PORT")
            .unwrap_or_else(|| SERVER_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let app_base_url = get("APP_BASE_URL")
            .or_else(|| get("NEXTAUTH_URL"))
            .unwrap_or_else(|| format!("http://localhost:{}", server_port));

        let session_secret = get("SESSION_SECRET")
            .or_else(|| get("NEXTAUTH_SECRET"))
            .ok_or_else(|| anyhow::anyhow!("SESSION_SECRET must be set for session signing"))?;

        let drive_backend = match get("DRIVE_BACKEND") {
            Some(value) => value.parse()?,
            None => DriveBackend::default(),
        };

        Ok(DashboardConfig {
            server_port,
            environment,
            app_base_url,
            session_secret,
            session_max_age_hours: get("SESSION_MAX_AGE_HOURS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(SESSION_MAX_AGE_HOURS),
            authentik_client_id: get("AUTHENTIK_CLIENT_ID")
                .ok_or_else(|| anyhow::anyhow!("AUTHENTIK_CLIENT_ID must be set"))?,
            authentik_client_secret: get("AUTHENTIK_CLIENT_SECRET")
                .ok_or_else(|| anyhow::anyhow!("AUTHENTIK_CLIENT_SECRET must be set"))?,
            authentik_issuer_url: get("AUTHENTIK_ISSUER_URL")
                .ok_or_else(|| anyhow::anyhow!("AUTHENTIK_ISSUER_URL must be set"))?,
            drive_backend,
            google_service_account_json: get("GOOGLE_SERVICE_ACCOUNT_JSON"),
            google_api_base_url: get("GOOGLE_API_BASE_URL")
                .unwrap_or_else(|| GOOGLE_API_BASE_URL.to_string()),
            drive_folder_id_archive: get("DRIVE_FOLDER_ID_ARCHIVE"),
            drive_folder_id_input: get("DRIVE_FOLDER_ID_INPUT"),
            n8n_webhook_url: get("N8N_WEBHOOK_URL"),
            n8n_folder_webhook_url: get("N8N_FOLDER_WEBHOOK_URL"),
            webhook_timeout_secs: get("WEBHOOK_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(WEBHOOK_TIMEOUT_SECS),
            webhook_max_retries: get("WEBHOOK_MAX_RETRIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(WEBHOOK_MAX_RETRIES),
            progress_ttl_secs: get("PROGRESS_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(PROGRESS_TTL_SECS),
            progress_api_token: get("PROGRESS_API_TOKEN"),
            max_upload_size_mb: get("MAX_UPLOAD_SIZE_MB")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_UPLOAD_SIZE_MB),
            http_concurrency_limit: get("HTTP_CONCURRENCY_LIMIT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT),
            log_format: get("LOG_FORMAT")
                .unwrap_or_else(|| "compact".to_string())
                .to_lowercase(),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let env = self.environment.to_lowercase();
        let is_production = env == "production" || env == "prod";

        if is_production && self.session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "SESSION_SECRET must be at least {} characters long",
                MIN_SESSION_SECRET_LEN
            ));
        }

        if self.webhook_timeout_secs == 0 {
            return Err(anyhow::anyhow!("WEBHOOK_TIMEOUT_SECS must be greater than 0"));
        }

        if self.max_upload_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if self.session_max_age_hours <= 0 || self.session_max_age_hours > MAX_SESSION_MAX_AGE_HOURS {
            return Err(anyhow::anyhow!(
                "SESSION_MAX_AGE_HOURS must be between 1 and {}",
                MAX_SESSION_MAX_AGE_HOURS
            ));
        }

        if self.progress_ttl_secs == 0 {
            return Err(anyhow::anyhow!("PROGRESS_TTL_SECS must be greater than 0"));
        }

        if !self.authentik_issuer_url.starts_with("http://")
            && !self.authentik_issuer_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "AUTHENTIK_ISSUER_URL must be an http(s) URL"
            ));
        }

        if self.drive_backend == DriveBackend::Google && self.google_service_account_json.is_none() {
            tracing::warn!(
                "GOOGLE_SERVICE_ACCOUNT_JSON is not set; Drive requests will fail until it is configured"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("SESSION_SECRET", "0123456789abcdef0123456789abcdef"),
        ("AUTHENTIK_CLIENT_ID", "client"),
        ("AUTHENTIK_CLIENT_SECRET", "secret"),
        ("AUTHENTIK_ISSUER_URL", "https://sso.example.com/application/o/pidview/"),
    ];

    #[test]
    fn defaults_apply_when_only_required_values_are_set() {
        let config = Config::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(config.server_port(), 3000);
        assert_eq!(config.app_base_url(), "http://localhost:3000");
        assert_eq!(config.drive_backend(), DriveBackend::Google);
        assert_eq!(config.webhook_max_retries(), 0);
        assert_eq!(config.progress_ttl_secs(), 86_400);
        assert_eq!(config.max_upload_size_bytes(), 100 * 1024 * 1024);
        assert!(!config.is_production());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_session_secret_fails() {
        let err = Config::from_lookup(lookup(&REQUIRED[1..])).unwrap_err();
        assert!(err.to_string().contains("SESSION_SECRET"));
    }

    #[test]
    fn nextauth_secret_is_accepted_as_fallback() {
        let mut pairs = REQUIRED[1..].to_vec();
        pairs.push(("NEXTAUTH_SECRET", "legacy-secret"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.session_secret(), "legacy-secret");
    }

    #[test]
    fn short_secret_is_rejected_in_production_only() {
        let mut pairs = REQUIRED[1..].to_vec();
        pairs.push(("SESSION_SECRET", "short"));
        assert!(Config::from_lookup(lookup(&pairs)).unwrap().validate().is_ok());

        pairs.push(("ENVIRONMENT", "production"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert!(config.is_production());
        assert!(config.validate().is_err());
    }

    #[test]
    fn folder_ids_are_checked_at_first_use() {
        let config = Config::from_lookup(lookup(REQUIRED)).unwrap();
        let err = config.archive_folder_id().unwrap_err();
        assert!(matches!(err, AppError::Configuration(ref m) if m.contains("DRIVE_FOLDER_ID_ARCHIVE")));
    }

    #[test]
    fn folder_webhook_falls_back_to_upload_webhook() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("N8N_WEBHOOK_URL", "https://n8n.example.com/webhook/upload"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(
            config.n8n_folder_webhook_url(),
            Some("https://n8n.example.com/webhook/upload")
        );

        pairs.push(("N8N_FOLDER_WEBHOOK_URL", "https://n8n.example.com/webhook/folder"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(
            config.n8n_folder_webhook_url(),
            Some("https://n8n.example.com/webhook/folder")
        );
    }

    #[test]
    fn redirect_uri_is_built_from_base_url() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("APP_BASE_URL", "https://pid.example.com/"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(
            config.oidc_redirect_uri(),
            "https://pid.example.com/api/auth/callback/authentik"
        );
    }

    #[test]
    fn zero_progress_ttl_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PROGRESS_TTL_SECS", "0"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("PROGRESS_TTL_SECS"));
    }

    #[test]
    fn session_max_age_is_bounded() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SESSION_MAX_AGE_HOURS", "9999999999999"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.session_max_age_hours(), 9_999_999_999_999);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SESSION_MAX_AGE_HOURS"));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SESSION_MAX_AGE_HOURS", "8760"));
        assert!(Config::from_lookup(lookup(&pairs)).unwrap().validate().is_ok());
    }

    #[test]
    fn invalid_drive_backend_fails() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DRIVE_BACKEND", "dropbox"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }
}
