//! Configuration module
//!
//! All platform knobs (Graph API version and base URLs, readiness-gate
//! timing, resumable-upload retry policy) flow through `Config` so nothing
//! reads module-level globals. Loaded once at startup from the environment.

use std::env;
use std::time::Duration;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const GRAPH_API_VERSION: &str = "v21.0";
const GRAPH_API_BASE_URL: &str = "https://graph.facebook.com";
const GRAPH_UPLOAD_BASE_URL: &str = "https://rupload.facebook.com";
const VIDEO_POLL_INTERVAL_SECS: u64 = 10;
const VIDEO_READINESS_BUDGET_SECS: u64 = 300;
const VIDEO_UPLOAD_MAX_ATTEMPTS: u32 = 3;
const VIDEO_UPLOAD_RETRY_BACKOFF_SECS: u64 = 5;
const MAX_VIDEO_SIZE_GB: u64 = 10;
const MAX_THUMBNAIL_SIZE_MB: u64 = 30;

/// Base configuration shared by server and services
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
}

/// Ad-launch service configuration
#[derive(Clone, Debug)]
pub struct LaunchConfig {
    pub base: BaseConfig,
    pub database_url: String,
    // Meta Graph API
    pub graph_api_version: String,
    pub graph_api_base_url: String,
    pub graph_upload_base_url: String,
    // Video readiness gate
    pub video_poll_interval_secs: u64,
    pub video_readiness_budget_secs: u64,
    // Resumable upload retry policy
    pub video_upload_max_attempts: u32,
    pub video_upload_retry_backoff_secs: u64,
    // Media limits
    pub max_video_size_bytes: u64,
    pub max_thumbnail_size_bytes: u64,
    // Asset object storage (public bucket holding authored media + thumbnails)
    pub asset_bucket_base_url: Option<String>,
    // Notification sink
    pub slack_webhook_url: Option<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<LaunchConfig>);

impl Config {
    fn inner(&self) -> &LaunchConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = LaunchConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn graph_api_version(&self) -> &str {
        &self.inner().graph_api_version
    }

    pub fn graph_api_base_url(&self) -> &str {
        &self.inner().graph_api_base_url
    }

    pub fn graph_upload_base_url(&self) -> &str {
        &self.inner().graph_upload_base_url
    }

    pub fn video_poll_interval(&self) -> Duration {
        Duration::from_secs(self.inner().video_poll_interval_secs)
    }

    pub fn video_readiness_budget(&self) -> Duration {
        Duration::from_secs(self.inner().video_readiness_budget_secs)
    }

    pub fn video_upload_max_attempts(&self) -> u32 {
        self.inner().video_upload_max_attempts
    }

    pub fn video_upload_retry_backoff(&self) -> Duration {
        Duration::from_secs(self.inner().video_upload_retry_backoff_secs)
    }

    pub fn max_video_size_bytes(&self) -> u64 {
        self.inner().max_video_size_bytes
    }

    pub fn max_thumbnail_size_bytes(&self) -> u64 {
        self.inner().max_thumbnail_size_bytes
    }

    pub fn asset_bucket_base_url(&self) -> Option<&str> {
        self.inner().asset_bucket_base_url.as_deref()
    }

    pub fn slack_webhook_url(&self) -> Option<&str> {
        self.inner().slack_webhook_url.as_deref()
    }
}

impl LaunchConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
        };

        let config = LaunchConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            graph_api_version: env::var("GRAPH_API_VERSION")
                .unwrap_or_else(|_| GRAPH_API_VERSION.to_string()),
            graph_api_base_url: env::var("GRAPH_API_BASE_URL")
                .unwrap_or_else(|_| GRAPH_API_BASE_URL.to_string()),
            graph_upload_base_url: env::var("GRAPH_UPLOAD_BASE_URL")
                .unwrap_or_else(|_| GRAPH_UPLOAD_BASE_URL.to_string()),
            video_poll_interval_secs: env::var("VIDEO_POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| VIDEO_POLL_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(VIDEO_POLL_INTERVAL_SECS),
            video_readiness_budget_secs: env::var("VIDEO_READINESS_BUDGET_SECS")
                .unwrap_or_else(|_| VIDEO_READINESS_BUDGET_SECS.to_string())
                .parse()
                .unwrap_or(VIDEO_READINESS_BUDGET_SECS),
            video_upload_max_attempts: env::var("VIDEO_UPLOAD_MAX_ATTEMPTS")
                .unwrap_or_else(|_| VIDEO_UPLOAD_MAX_ATTEMPTS.to_string())
                .parse()
                .unwrap_or(VIDEO_UPLOAD_MAX_ATTEMPTS),
            video_upload_retry_backoff_secs: env::var("VIDEO_UPLOAD_RETRY_BACKOFF_SECS")
                .unwrap_or_else(|_| VIDEO_UPLOAD_RETRY_BACKOFF_SECS.to_string())
                .parse()
                .unwrap_or(VIDEO_UPLOAD_RETRY_BACKOFF_SECS),
            max_video_size_bytes: env::var("MAX_VIDEO_SIZE_GB")
                .unwrap_or_else(|_| MAX_VIDEO_SIZE_GB.to_string())
                .parse::<u64>()
                .unwrap_or(MAX_VIDEO_SIZE_GB)
                * 1024
                * 1024
                * 1024,
            max_thumbnail_size_bytes: env::var("MAX_THUMBNAIL_SIZE_MB")
                .unwrap_or_else(|_| MAX_THUMBNAIL_SIZE_MB.to_string())
                .parse::<u64>()
                .unwrap_or(MAX_THUMBNAIL_SIZE_MB)
                * 1024
                * 1024,
            asset_bucket_base_url: env::var("ASSET_BUCKET_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            slack_webhook_url: env::var("SLACK_WEBHOOK_URL").ok().filter(|s| !s.is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if !self.graph_api_version.starts_with('v') {
            return Err(anyhow::anyhow!(
                "GRAPH_API_VERSION must look like 'v21.0', got '{}'",
                self.graph_api_version
            ));
        }

        if self.video_poll_interval_secs == 0 {
            return Err(anyhow::anyhow!("VIDEO_POLL_INTERVAL_SECS must be > 0"));
        }

        if self.video_upload_max_attempts == 0 {
            return Err(anyhow::anyhow!("VIDEO_UPLOAD_MAX_ATTEMPTS must be > 0"));
        }

        Ok(())
    }
}
