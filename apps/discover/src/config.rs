use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::discover::handle::DEFAULT_SESSION_TTL;
use crate::discover::session::{DiscoverOptions, QueueOrder, DEFAULT_TERM_COUNT};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unset means an in-memory store.
    pub database_url: Option<String>,
    pub shopping_api_host: String,
    pub shopping_client_id: String,
    pub shopping_client_secret: String,
    pub shopping_timeout_secs: u64,
    pub queue_order: QueueOrder,
    pub term_count: usize,
    pub session_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            shopping_api_host: require_env("SHOPPING_API_HOST")?,
            shopping_client_id: require_env("SHOPPING_CLIENT_ID")?,
            shopping_client_secret: require_env("SHOPPING_CLIENT_SECRET")?,
            shopping_timeout_secs: parse_env("SHOPPING_TIMEOUT_SECS", 10)?,
            queue_order: std::env::var("DISCOVER_QUEUE_ORDER")
                .unwrap_or_else(|_| "priority".to_string())
                .parse::<QueueOrder>()
                .map_err(|e| anyhow!(e))
                .context("DISCOVER_QUEUE_ORDER is invalid")?,
            term_count: parse_env("DISCOVER_TERM_COUNT", DEFAULT_TERM_COUNT)?,
            session_ttl_secs: parse_env(
                "DISCOVER_SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL.as_secs(),
            )?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn discover_options(&self) -> DiscoverOptions {
        DiscoverOptions {
            term_count: self.term_count,
            queue_order: self.queue_order,
            ..DiscoverOptions::default()
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => Ok(default),
    }
}
