//! Configuration module
//!
//! Settings are read once at startup from the process environment (after loading a
//! `.env` file when present) and handed to every component explicitly.

use std::env;
use std::time::Duration;

// Common constants
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const HTTP_CLIENT_TIMEOUT_SECS: u64 = 10;
const IMPORT_CHANNEL_NAME: &str = "import";
const IMPORT_CHUNK_SIZE: usize = 100;
const IMPORT_RATE_MAX_JOBS: i64 = 5;
const IMPORT_RATE_MAX_LEADS: i64 = 5000;
const IMPORT_RATE_WINDOW_SECS: u64 = 3600;
const SHUTDOWN_GRACE_SECS: u64 = 30;

/// Sentinel that disables the permission oracle.
pub const PERMISSION_CHECK_DISABLED: &str = "IGNORE";

/// Base server configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_host: String,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub max_upload_bytes: usize,
    pub environment: String,
    pub shutdown_grace_secs: u64,
}

/// Windowed submission caps applied per tenant and account
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImportLimits {
    pub max_jobs_per_window: i64,
    pub max_leads_per_window: i64,
    pub window: Duration,
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            max_jobs_per_window: IMPORT_RATE_MAX_JOBS,
            max_leads_per_window: IMPORT_RATE_MAX_LEADS,
            window: Duration::from_secs(IMPORT_RATE_WINDOW_SECS),
        }
    }
}

/// Worker pipeline settings
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub channel_name: String,
    pub chunk_size: usize,
    pub limits: ImportLimits,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_name: IMPORT_CHANNEL_NAME.to_string(),
            chunk_size: IMPORT_CHUNK_SIZE,
            limits: ImportLimits::default(),
        }
    }
}

/// Endpoints of the external collaborators. `None` selects the no-op variant.
#[derive(Clone, Debug, Default)]
pub struct IntegrationConfig {
    pub permission_api_url: String,
    pub phone_validator_url: Option<String>,
    pub event_webhook_url: Option<String>,
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
    pub redis_url: Option<String>,
    pub http_client_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LeadflowConfig {
    pub base: BaseConfig,
    pub database_url: String,
    pub pipeline: PipelineConfig,
    pub integrations: IntegrationConfig,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<LeadflowConfig>);

impl Config {
    fn inner(&self) -> &LeadflowConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = LeadflowConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn server_host(&self) -> &str {
        &self.inner().base.server_host
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().base.jwt_secret
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.inner().base.max_upload_bytes
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.inner().base.shutdown_grace_secs)
    }

    pub fn pipeline(&self) -> &PipelineConfig {
        &self.inner().pipeline
    }

    pub fn import_limits(&self) -> ImportLimits {
        self.inner().pipeline.limits
    }

    pub fn integrations(&self) -> &IntegrationConfig {
        &self.inner().integrations
    }

    pub fn permission_check_enabled(&self) -> bool {
        self.inner().integrations.permission_api_url != PERMISSION_CHECK_DISABLED
    }

    pub fn http_client_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().integrations.http_client_timeout_secs)
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl LeadflowConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .or_else(|_| env::var("PORT"))
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SERVER_PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DATABASE_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| MAX_UPLOAD_BYTES.to_string())
                .parse()
                .unwrap_or(MAX_UPLOAD_BYTES),
            environment,
            shutdown_grace_secs: env::var("SHUTDOWN_GRACE_SECS")
                .unwrap_or_else(|_| SHUTDOWN_GRACE_SECS.to_string())
                .parse()
                .unwrap_or(SHUTDOWN_GRACE_SECS),
        };

        let limits = ImportLimits {
            max_jobs_per_window: env::var("IMPORT_RATE_MAX_JOBS")
                .unwrap_or_else(|_| IMPORT_RATE_MAX_JOBS.to_string())
                .parse()
                .unwrap_or(IMPORT_RATE_MAX_JOBS),
            max_leads_per_window: env::var("IMPORT_RATE_MAX_LEADS")
                .unwrap_or_else(|_| IMPORT_RATE_MAX_LEADS.to_string())
                .parse()
                .unwrap_or(IMPORT_RATE_MAX_LEADS),
            window: Duration::from_secs(
                env::var("IMPORT_RATE_WINDOW_SECS")
                    .unwrap_or_else(|_| IMPORT_RATE_WINDOW_SECS.to_string())
                    .parse()
                    .unwrap_or(IMPORT_RATE_WINDOW_SECS),
            ),
        };

        let pipeline = PipelineConfig {
            channel_name: env::var("IMPORT_CHANNEL_NAME")
                .unwrap_or_else(|_| IMPORT_CHANNEL_NAME.to_string()),
            chunk_size: env::var("IMPORT_CHUNK_SIZE")
                .unwrap_or_else(|_| IMPORT_CHUNK_SIZE.to_string())
                .parse()
                .unwrap_or(IMPORT_CHUNK_SIZE),
            limits,
        };

        let integrations = IntegrationConfig {
            permission_api_url: env::var("PERMISSION_API_URL")
                .unwrap_or_else(|_| PERMISSION_CHECK_DISABLED.to_string()),
            phone_validator_url: optional_var("PHONE_VALIDATOR_URL"),
            event_webhook_url: optional_var("EVENT_WEBHOOK_URL"),
            mongodb_uri: optional_var("MONGODB_URI"),
            mongodb_database: env::var("MONGODB_DATABASE").unwrap_or_else(|_| "crm".to_string()),
            redis_url: optional_var("REDIS_URL"),
            http_client_timeout_secs: env::var("HTTP_CLIENT_TIMEOUT_SECS")
                .unwrap_or_else(|_| HTTP_CLIENT_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(HTTP_CLIENT_TIMEOUT_SECS),
        };

        Ok(LeadflowConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            pipeline,
            integrations,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 8 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 8 characters long"
            ));
        }

        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.base.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DATABASE_MAX_CONNECTIONS must be positive"));
        }

        if self.pipeline.chunk_size == 0 {
            return Err(anyhow::anyhow!("IMPORT_CHUNK_SIZE must be positive"));
        }

        if self.pipeline.channel_name.trim().is_empty() {
            return Err(anyhow::anyhow!("IMPORT_CHANNEL_NAME must not be empty"));
        }

        if self.pipeline.limits.window.is_zero() {
            return Err(anyhow::anyhow!("IMPORT_RATE_WINDOW_SECS must be positive"));
        }

        Ok(())
    }
}
