//! TOML-based configuration for Quill
//!
//! Settings come from `quill.toml` (all sections optional), then a handful of
//! environment variables override them. The signing secret itself never lives
//! in the file: `auth.jwt_secret_env` names the variable that holds it.

use crate::auth::jwt::{TokenService, DEFAULT_ISSUER, DEFAULT_TOKEN_TTL_SECS};
use crate::auth::middleware::DEFAULT_TOKEN_COOKIE;
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Secret used in the `local` environment when none is configured.
const LOCAL_DEV_SECRET: &str = "local-development-secret-do-not-deploy";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("signing secret missing: set {0}")]
    MissingSecret(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration structure loaded from quill.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuillConfig {
    /// Deployment environment (`local`, `staging`, `production`, ...)
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_environment() -> String {
    "local".to_string()
}

impl Default for QuillConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub json_logs: bool,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            json_logs: false,
            cors_origins: Vec::new(),
        }
    }
}

// ============= Authentication Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable name containing the signing secret
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: String,

    /// Token validity in seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,

    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Cookie checked when no `Authorization` header is sent
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// HMAC algorithm: HS256, HS384 or HS512
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
}

fn default_jwt_secret_env() -> String {
    "JWT_SECRET".to_string()
}

fn default_token_ttl_secs() -> i64 {
    DEFAULT_TOKEN_TTL_SECS
}

fn default_issuer() -> String {
    DEFAULT_ISSUER.to_string()
}

fn default_cookie_name() -> String {
    DEFAULT_TOKEN_COOKIE.to_string()
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: default_jwt_secret_env(),
            token_ttl_secs: default_token_ttl_secs(),
            issuer: default_issuer(),
            cookie_name: default_cookie_name(),
            algorithm: default_algorithm(),
        }
    }
}

impl AuthConfig {
    pub fn algorithm(&self) -> Result<Algorithm, ConfigError> {
        Algorithm::from_str(&self.algorithm)
            .map_err(|_| ConfigError::Invalid(format!("unknown algorithm {}", self.algorithm)))
    }

    /// Builds the token service from this section and the resolved secret.
    pub fn token_service(&self, secret: &[u8]) -> Result<TokenService, ConfigError> {
        TokenService::with_algorithm(
            secret,
            self.issuer.clone(),
            self.token_ttl_secs,
            self.algorithm()?,
        )
        .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

impl QuillConfig {
    /// Loads `path`, falling back to defaults when the file does not exist,
    /// then applies environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str(&raw)?
        } else {
            info!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies `PORT` and `APP_ENV` overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").filter(|p| !p.is_empty()) {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT is not a port number: {port}")))?;
        }
        if let Some(env) = lookup("APP_ENV").filter(|e| !e.is_empty()) {
            self.environment = env;
        }
        Ok(())
    }

    pub fn is_local(&self) -> bool {
        self.environment == "local"
    }

    /// Resolves the signing secret from the variable named by `auth.jwt_secret_env`.
    ///
    /// Outside `local` a missing secret is fatal.
    pub fn signing_secret<F>(&self, lookup: F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(&self.auth.jwt_secret_env).filter(|s| !s.is_empty()) {
            Some(secret) => Ok(secret),
            None if self.is_local() => {
                warn!(
                    var = %self.auth.jwt_secret_env,
                    "signing secret not set, using development secret"
                );
                Ok(LOCAL_DEV_SECRET.to_string())
            }
            None => Err(ConfigError::MissingSecret(self.auth.jwt_secret_env.clone())),
        }
    }
}
