//! Configuration management for the Moni backend
//!
//! This module handles loading and validating configuration from environment variables,
//! with support for different environments (local, development, test, staging, production).

use std::env;
use std::time::Duration;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "development-secret-change-in-production";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Local,
    #[default]
    Development,
    Test,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "dev" | "development" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: local, dev, test, staging, or prod",
                s
            ))),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Environment::Local)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Settings for the external loan validation service
#[derive(Debug, Clone)]
pub struct EligibilityConfig {
    pub api_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

/// JWT signing settings
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Current environment
    pub environment: Environment,

    /// Debug flag (gates demo data seeding together with `Environment::Local`)
    pub debug: bool,

    /// Bind host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum database connections
    pub db_max_connections: u32,

    pub eligibility: EligibilityConfig,

    pub jwt: JwtConfig,

    /// CORS allowed origins
    pub cors_allowed_origins: Option<String>,

    /// Log level (RUST_LOG)
    pub log_level: String,

    /// Password for the seeded `admin` account
    pub default_admin_password: String,

    /// Password for the seeded `analyst` account
    pub default_analyst_password: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let debug = env::var("DEBUG")
            .map(|s| parse_flag(&s))
            .unwrap_or(Ok(false))?;

        let database_url = required("DATABASE_URL")?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .unwrap_or(5);

        let eligibility = EligibilityConfig {
            api_url: required("LOAN_VALIDATION_API_URL")?,
            api_key: required("LOAN_VALIDATION_API_KEY")?,
            timeout: Duration::from_secs(
                env::var("LOAN_VALIDATION_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse::<u64>()
                    .unwrap_or(5),
            ),
        };

        let secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment.is_production() => {
                return Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string()))
            }
            Err(_) => DEV_JWT_SECRET.to_string(),
        };

        let jwt = JwtConfig {
            secret,
            access_token_ttl_seconds: env::var("JWT_ACCESS_TOKEN_TTL_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse::<i64>()
                .unwrap_or(300),
            refresh_token_ttl_seconds: env::var("JWT_REFRESH_TOKEN_TTL_SECONDS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse::<i64>()
                .unwrap_or(86400),
        };

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS").ok();

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let default_admin_password =
            env::var("DEFAULT_ADMIN_PASSWORD").unwrap_or_else(|_| "Admin1234".to_string());
        let default_analyst_password =
            env::var("DEFAULT_ANALYST_PASSWORD").unwrap_or_else(|_| "Analyst1234".to_string());

        Ok(Config {
            database_url,
            environment,
            debug,
            host,
            port,
            db_max_connections,
            eligibility,
            jwt,
            cors_allowed_origins,
            log_level,
            default_admin_password,
            default_analyst_password,
        })
    }

    /// Demo data may only be seeded on a local debug deployment
    pub fn allows_demo_seeding(&self) -> bool {
        self.debug && self.environment.is_local()
    }

    /// Database URL with the password masked, for logging
    pub fn database_url_masked(&self) -> String {
        if let Some(at_pos) = self.database_url.find('@') {
            if let Some(colon_pos) = self.database_url[..at_pos].rfind(':') {
                let prefix = &self.database_url[..colon_pos + 1];
                let suffix = &self.database_url[at_pos..];
                return format!("{}****{}", prefix, suffix);
            }
        }
        self.database_url.clone()
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn parse_flag(s: &str) -> Result<bool, ConfigError> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue(format!(
            "Invalid boolean flag: '{}'",
            other
        ))),
    }
}
