use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::retry::RetryPolicy;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Holds `full_resume.json` and `private_info.json`.
    pub data_dir: PathBuf,
    pub retry_max_retries: u32,
    pub retry_base_delay_secs: f64,
    pub retry_max_delay_secs: f64,
    pub retry_backoff_factor: f64,
    pub retry_jitter: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            data_dir: std::env::var("DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string())
                .into(),
            retry_max_retries: parse_env("RETRY_MAX_RETRIES", 5)?,
            retry_base_delay_secs: parse_env("RETRY_BASE_DELAY", 1.0)?,
            retry_max_delay_secs: parse_env("RETRY_MAX_DELAY", 300.0)?,
            retry_backoff_factor: parse_env("RETRY_BACKOFF_FACTOR", 2.0)?,
            retry_jitter: std::env::var("RETRY_JITTER")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        })
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        let factor = self.retry_backoff_factor;
        if !factor.is_finite() || factor < 1.0 {
            bail!("RETRY_BACKOFF_FACTOR must be a finite number of at least 1.0, got {factor}");
        }

        Ok(RetryPolicy {
            max_retries: self.retry_max_retries,
            base_delay: Duration::try_from_secs_f64(self.retry_base_delay_secs)
                .context("RETRY_BASE_DELAY must be a non-negative number of seconds")?,
            backoff_factor: self.retry_backoff_factor,
            max_delay: Duration::try_from_secs_f64(self.retry_max_delay_secs)
                .context("RETRY_MAX_DELAY must be a non-negative number of seconds")?,
            jitter: self.retry_jitter,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
