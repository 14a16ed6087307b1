use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub jwt_secret: String,
    /// Lifetime of issued auth tokens.
    pub token_expiry_hours: i64,
    /// Upper bound on every individual AI call before the static fallback kicks in.
    pub ai_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let jwt_secret = require_env("JWT_SECRET")?;
        anyhow::ensure!(!jwt_secret.trim().is_empty(), "JWT_SECRET must not be empty");

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            jwt_secret,
            token_expiry_hours: optional_env("TOKEN_EXPIRY_HOURS", 24)
                .context("TOKEN_EXPIRY_HOURS must be a whole number of hours")?,
            ai_timeout: Duration::from_secs(
                optional_env("AI_TIMEOUT_SECS", 30)
                    .context("AI_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            port: optional_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => Ok(raw.trim().parse::<T>()?),
        Err(_) => Ok(default),
    }
}
