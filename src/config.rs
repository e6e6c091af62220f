use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use tracing::{debug, info};

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_TOKEN_FILE: &str = ".storefront_tokens.json";

/// Runtime configuration, read from the environment (and `.env` if present)
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub token_file: PathBuf,
    pub page_size: usize,
    pub timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; `load` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url: String = try_load(&lookup, "STOREFRONT_API_URL", DEFAULT_API_URL)?;
        let token_file: String = try_load(&lookup, "STOREFRONT_TOKEN_FILE", DEFAULT_TOKEN_FILE)?;
        let page_size: usize = try_load(&lookup, "STOREFRONT_PAGE_SIZE", "12")?;
        let timeout_secs: u64 = try_load(&lookup, "STOREFRONT_TIMEOUT_SECS", "30")?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token_file: PathBuf::from(token_file),
            page_size: page_size.max(1),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            page_size: 12,
            timeout: Duration::from_secs(30),
        }
    }
}

fn try_load<T, F>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e: T::Err| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value: {raw}"))
}
