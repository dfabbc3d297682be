//! Configuration module
//!
//! Settings are read from the process environment (after loading `.env` through
//! `dotenvy`). Every value except `JWT_SECRET` has a default.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_PORT: u16 = 5000;
const MAX_CONNECTIONS: u32 = 5;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_UPLOAD_SIZE_MB: usize = 100;
const MIN_JWT_SECRET_LEN: usize = 32;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// Console log format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("Unknown LOG_FORMAT '{}'", other)),
        }
    }
}

/// Process-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub environment: String,
    pub log_format: LogFormat,
    pub http_concurrency_limit: usize,
}

/// Vault settings
#[derive(Clone, Debug)]
pub struct VaultConfig {
    pub base: BaseConfig,
    pub database_url: String,
    /// Directory that holds `uploads/` and the staging area
    pub storage_path: PathBuf,
    /// Origin used when building share URLs
    pub public_base_url: String,
    pub max_upload_size_bytes: usize,
}

#[derive(Clone, Debug)]
pub struct Config(pub Box<VaultConfig>);

impl Config {
    fn as_vault(&self) -> &VaultConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = VaultConfig::from_lookup(|key| env::var(key).ok())?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_vault().validate()
    }

    pub fn is_production(&self) -> bool {
        is_production_name(&self.as_vault().base.environment)
    }

    pub fn server_port(&self) -> u16 {
        self.as_vault().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_vault().base.cors_origins
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_vault().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_vault().base.db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.as_vault().base.jwt_secret
    }

    pub fn environment(&self) -> &str {
        &self.as_vault().base.environment
    }

    pub fn log_format(&self) -> LogFormat {
        self.as_vault().base.log_format
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.as_vault().base.http_concurrency_limit
    }

    pub fn database_url(&self) -> &str {
        &self.as_vault().database_url
    }

    pub fn storage_path(&self) -> &PathBuf {
        &self.as_vault().storage_path
    }

    pub fn public_base_url(&self) -> &str {
        &self.as_vault().public_base_url
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.as_vault().max_upload_size_bytes
    }
}

fn is_production_name(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

impl VaultConfig {
    /// Build from a key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = lookup("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        if is_production_name(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port: u16 = lookup("PORT")
            .unwrap_or_else(|| DEFAULT_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let log_format = match lookup("LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => LogFormat::default(),
        };

        let base = BaseConfig {
            server_port,
            cors_origins,
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: lookup("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: lookup("JWT_SECRET")
                .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            environment,
            log_format,
            http_concurrency_limit: lookup("HTTP_CONCURRENCY_LIMIT")
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT)
                .max(1),
        };

        let max_upload_size_mb = lookup("MAX_UPLOAD_SIZE_MB")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let public_base_url = lookup("PUBLIC_BASE_URL")
            .or_else(|| lookup("FRONTEND_URL"))
            .unwrap_or_else(|| format!("http://localhost:{}", server_port))
            .trim_end_matches('/')
            .to_string();

        Ok(VaultConfig {
            base,
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://vault.db".to_string()),
            storage_path: PathBuf::from(lookup("STORAGE_PATH").unwrap_or_else(|| "./data".to_string())),
            public_base_url,
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LEN
            ));
        }

        if !self.database_url.starts_with("sqlite:") {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a SQLite connection string (sqlite://...)"
            ));
        }

        if !(self.public_base_url.starts_with("http://")
            || self.public_base_url.starts_with("https://"))
        {
            return Err(anyhow::anyhow!(
                "PUBLIC_BASE_URL must start with http:// or https://"
            ));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        Ok(())
    }
}
