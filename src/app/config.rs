use std::time::Duration;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in .env")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Centralized environment configuration.
/// All env vars and defaults are defined here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL. Required.
    pub database_url: String,

    /// Socket address the HTTP server binds to.
    /// Default: 0.0.0.0:3000
    pub bind_addr: String,

    /// Base URL used for links in emails.
    /// Default: http://localhost:3000
    pub app_url: String,

    /// Time-to-live for cached aggregate responses.
    /// Default: 60 seconds
    pub cache_ttl: Duration,

    /// From/reply address for outgoing emails.
    pub mail_from: String,

    /// Mail adapter: "console" or "smtp".
    /// Default: console
    pub mail_adapter: String,

    pub smtp_host: Option<String>,
    /// Default: 587
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    var_or(name, default)
        .parse::<T>()
        .map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })
}

impl Config {
    /// Build config from environment variables.
    /// Returns an error if required vars are missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let cache_ttl_secs: u64 = parse_var("CACHE_TTL_SECS", "60")?;

        Ok(Self {
            database_url,
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            app_url: var_or("APP_URL", "http://localhost:3000"),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            mail_from: var_or("MAIL_FROM", "please-configure@example.com"),
            mail_adapter: var_or("MAIL_ADAPTER", "console"),
            smtp_host: std::env::var("SMTP_HOST").ok(),
            smtp_port: parse_var("SMTP_PORT", "587")?,
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_pass: std::env::var("SMTP_PASS").ok(),
        })
    }

    /// Returns the base URL without trailing slash, for building links.
    pub fn app_url_base(&self) -> &str {
        self.app_url.trim_end_matches('/')
    }

    /// Config for tests. In-memory database and console mailer.
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            app_url: "http://localhost:3000/".to_string(),
            cache_ttl: Duration::from_secs(60),
            mail_from: "test@example.com".to_string(),
            mail_adapter: "console".to_string(),
            smtp_host: None,
            smtp_port: 587,
            smtp_user: None,
            smtp_pass: None,
        }
    }
}
