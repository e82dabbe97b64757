//! Configuration management and environment variable loading

use crate::{DashError, Result};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Secret used when `SESSION_SECRET` is not configured
pub const FALLBACK_SESSION_SECRET: &str = "fallback-secret";

/// Load environment variables from a .env file in the current directory
/// or a parent directory.
///
/// A missing file is not an error; a malformed one is.
pub fn load_env() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::info!("Loaded environment from: {}", path.display());
            Ok(())
        }
        Err(dotenvy::Error::LineParse(line, pos)) => Err(DashError::config(format!(
            "Failed to parse .env file at line {}, position {}",
            line, pos
        ))),
        Err(dotenvy::Error::Io(_)) => {
            tracing::debug!("No .env file found - using system environment variables only");
            Ok(())
        }
        Err(e) => Err(DashError::config(format!("Failed to load .env file: {}", e))),
    }
}

/// Load environment variables from a specific file
pub fn load_env_from_path<P: AsRef<Path>>(path: P) -> Result<()> {
    match dotenvy::from_path(path.as_ref()) {
        Ok(_) => {
            tracing::info!("Loaded environment from: {}", path.as_ref().display());
            Ok(())
        }
        Err(e) => Err(DashError::config(format!(
            "Failed to load {} environment file: {}",
            path.as_ref().display(),
            e
        ))),
    }
}

/// Get required environment variable
pub fn get_required_env(key: &str) -> Result<String> {
    env::var(key).map_err(|_| {
        DashError::config(format!(
            "Required environment variable '{}' is not set. \
             Check your .env file or system environment.",
            key
        ))
    })
}

/// Get optional environment variable with default
pub fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get optional environment variable, treating empty values as unset
pub fn get_env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get environment variable as boolean
pub fn get_env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| match v.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

/// Get environment variable as integer
pub fn get_env_int<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Dashboard server configuration
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Key used to sign session cookies
    pub session_secret: String,

    /// Admin login name
    pub admin_username: Option<String>,

    /// Admin password
    pub admin_password: Option<String>,

    /// Base URL of the RAG API
    pub rag_api_base_url: String,

    /// Optional bearer token sent to the RAG API
    pub api_auth_token: Option<String>,

    /// Fixed session lifetime, counted from login
    pub session_ttl: Duration,

    /// Largest accepted request body (uploads)
    pub max_upload_bytes: usize,

    /// Mark the session cookie `Secure`
    pub cookie_secure: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3003,
            session_secret: FALLBACK_SESSION_SECRET.to_string(),
            admin_username: None,
            admin_password: None,
            rag_api_base_url: "http://localhost:8000".to_string(),
            api_auth_token: None,
            session_ttl: Duration::from_secs(24 * 60 * 60),
            max_upload_bytes: 50 * 1024 * 1024,
            cookie_secure: false,
        }
    }
}

impl DashboardConfig {
    /// Build the configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| DashError::config(format!("PORT must be a port number, got '{}'", raw)))?,
            Err(_) => defaults.port,
        };

        let session_secret = get_env_opt("SESSION_SECRET").unwrap_or_else(|| {
            tracing::warn!("SESSION_SECRET is not set; using the built-in fallback secret");
            defaults.session_secret.clone()
        });

        let config = Self {
            host: get_env_or("HOST", &defaults.host),
            port,
            session_secret,
            admin_username: get_env_opt("ADMIN_USERNAME"),
            admin_password: get_env_opt("ADMIN_PASSWORD"),
            rag_api_base_url: get_env_or("RAG_API_BASE_URL", &defaults.rag_api_base_url),
            api_auth_token: get_env_opt("API_AUTH_TOKEN"),
            session_ttl: session_ttl_from_hours(get_env_int::<u64>("SESSION_TTL_HOURS", 24))?,
            max_upload_bytes: upload_limit_from_mb(get_env_int::<usize>("MAX_UPLOAD_MB", 50))?,
            cookie_secure: get_env_bool("COOKIE_SECURE", defaults.cookie_secure),
        };

        if !config.login_enabled() {
            tracing::warn!("ADMIN_USERNAME/ADMIN_PASSWORD not set; every login attempt will fail");
        }

        Ok(config)
    }

    /// Whether an admin identity is configured
    pub fn login_enabled(&self) -> bool {
        self.admin_username.is_some() && self.admin_password.is_some()
    }

    /// Socket address string to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn session_ttl_from_hours(hours: u64) -> Result<Duration> {
    if hours == 0 {
        return Err(DashError::config("SESSION_TTL_HOURS must be at least 1"));
    }
    hours
        .checked_mul(60 * 60)
        .map(Duration::from_secs)
        .ok_or_else(|| DashError::config(format!("SESSION_TTL_HOURS is too large: {}", hours)))
}

fn upload_limit_from_mb(mb: usize) -> Result<usize> {
    if mb == 0 {
        return Err(DashError::config("MAX_UPLOAD_MB must be at least 1"));
    }
    mb.checked_mul(1024 * 1024)
        .ok_or_else(|| DashError::config(format!("MAX_UPLOAD_MB is too large: {}", mb)))
}
