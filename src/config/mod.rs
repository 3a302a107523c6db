use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime_secs: u64,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub bind_address: String,
    pub default_page_limit: i64,
    pub max_page_limit: i64,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_expiry_minutes: i64,
    pub auth_cookie_name: String,
    pub token_cache_max_entries: usize,
    pub token_cache_sweep_secs: u64,
}

/// Administrator account created at startup when no user of that name exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub admin_name: String,
    pub admin_email: String,
    #[serde(skip_serializing)]
    pub admin_password: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set to at least {min} characters outside development")]
    WeakJwtSecret { min: usize },

    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,

    #[error("page limits must satisfy 1 <= default ({default}) <= max ({max})")]
    InvalidPageLimits { default: i64, max: i64 },

    #[error("JWT expiry must be positive")]
    InvalidJwtExpiry,

    #[error("DEFAULT_USER_PASSWORD must be set to a non-default value outside development")]
    WeakBootstrapPassword,
}

const DEV_JWT_SECRET: &str = "development-only-secret-change-me";
const MIN_JWT_SECRET_LEN: usize = 32;
const DEV_ADMIN_PASSWORD: &str = "admin";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_MIN_CONNECTIONS") {
            self.database.min_connections = v.parse().unwrap_or(self.database.min_connections);
        }
        if let Ok(v) = env::var("DATABASE_MAX_LIFETIME_SECS") {
            self.database.max_lifetime_secs = v.parse().unwrap_or(self.database.max_lifetime_secs);
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs = v.parse().unwrap_or(self.database.acquire_timeout_secs);
        }

        // API overrides
        if let Ok(v) = env::var("SERVER_ADDRESS") {
            self.api.bind_address = v;
        }
        if let Ok(v) = env::var("API_DEFAULT_PAGE_LIMIT") {
            self.api.default_page_limit = v.parse().unwrap_or(self.api.default_page_limit);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_LIMIT") {
            self.api.max_page_limit = v.parse().unwrap_or(self.api.max_page_limit);
        }
        if let Ok(v) = env::var("API_CORS_ORIGINS") {
            self.api.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_ISSUER") {
            self.security.jwt_issuer = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_MINUTES") {
            self.security.jwt_expiry_minutes = v.parse().unwrap_or(self.security.jwt_expiry_minutes);
        }
        if let Ok(v) = env::var("AUTH_COOKIE_NAME") {
            self.security.auth_cookie_name = v;
        }
        if let Ok(v) = env::var("TOKEN_CACHE_MAX_ENTRIES") {
            self.security.token_cache_max_entries = v.parse().unwrap_or(self.security.token_cache_max_entries);
        }
        if let Ok(v) = env::var("TOKEN_CACHE_SWEEP_SECS") {
            self.security.token_cache_sweep_secs = v.parse().unwrap_or(self.security.token_cache_sweep_secs);
        }

        // Bootstrap overrides
        if let Ok(v) = env::var("DEFAULT_USER_NAME") {
            self.bootstrap.admin_name = v;
        }
        if let Ok(v) = env::var("DEFAULT_USER_EMAIL") {
            self.bootstrap.admin_email = v;
        }
        if let Ok(v) = env::var("DEFAULT_USER_PASSWORD") {
            self.bootstrap.admin_password = v;
        }

        self
    }

    /// Reject configurations the server must not start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if self.environment != Environment::Development
            && (self.security.jwt_secret.len() < MIN_JWT_SECRET_LEN
                || self.security.jwt_secret == DEV_JWT_SECRET)
        {
            return Err(ConfigError::WeakJwtSecret { min: MIN_JWT_SECRET_LEN });
        }
        if self.environment != Environment::Development
            && (self.bootstrap.admin_password.is_empty()
                || self.bootstrap.admin_password == DEV_ADMIN_PASSWORD)
        {
            return Err(ConfigError::WeakBootstrapPassword);
        }
        if self.api.default_page_limit < 1 || self.api.default_page_limit > self.api.max_page_limit {
            return Err(ConfigError::InvalidPageLimits {
                default: self.api.default_page_limit,
                max: self.api.max_page_limit,
            });
        }
        if self.security.jwt_expiry_minutes <= 0 {
            return Err(ConfigError::InvalidJwtExpiry);
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 25,
                min_connections: 5,
                max_lifetime_secs: 300,
                acquire_timeout_secs: 30,
            },
            api: ApiConfig {
                bind_address: "0.0.0.0:8080".to_string(),
                default_page_limit: 10,
                max_page_limit: 20,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_issuer: "mvc".to_string(),
                jwt_expiry_minutes: 120,
                auth_cookie_name: "jwt".to_string(),
                token_cache_max_entries: 10_000,
                token_cache_sweep_secs: 60,
            },
            bootstrap: BootstrapConfig {
                admin_name: "admin".to_string(),
                admin_email: "admin@localhost".to_string(),
                admin_password: DEV_ADMIN_PASSWORD.to_string(),
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.acquire_timeout_secs = 10;
        config.api.cors_origins = vec!["https://staging.example.com".to_string()];
        config.security.jwt_secret = String::new();
        config.bootstrap.admin_password = String::new();
        config.security.token_cache_max_entries = 50_000;
        config.security.token_cache_sweep_secs = 120;
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.max_connections = 50;
        config.database.acquire_timeout_secs = 5;
        config.api.cors_origins = vec!["https://app.example.com".to_string()];
        config.security.jwt_secret = String::new();
        config.bootstrap.admin_password = String::new();
        config.security.token_cache_max_entries = 100_000;
        config.security.token_cache_sweep_secs = 300;
        config
    }
}
