use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

const DEFAULT_API_BASE: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
}

impl Config {
    pub fn new(api_base: &str) -> Result<Self> {
        Ok(Self {
            api_base: normalize_base(api_base)?,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        })
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup. `from_env` passes the
    /// process environment; tests pass a closure over fixed values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base = lookup("TIDAL_MERGER_API_BASE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let request_timeout = parse_secs(&lookup, "TIDAL_MERGER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let poll_interval = parse_secs(
            &lookup,
            "TIDAL_MERGER_POLL_INTERVAL_SECS",
            DEFAULT_POLL_INTERVAL_SECS,
        )?;

        Ok(Self {
            api_base: normalize_base(&api_base)?,
            request_timeout,
            poll_interval,
        })
    }

    pub fn with_api_base(mut self, api_base: &str) -> Result<Self> {
        self.api_base = normalize_base(api_base)?;
        Ok(self)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }
}

fn parse_secs<F>(lookup: &F, key: &str, default: u64) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(Duration::from_secs(default));
    };

    match raw.trim().parse::<u64>() {
        Ok(0) => Err(AppError::Config(format!("{} must be at least 1 second", key))),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(AppError::Config(format!(
            "{} must be a whole number of seconds",
            key
        ))),
    }
}

fn normalize_base(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AppError::Config("API base URL is empty".into()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| AppError::Config(format!("Invalid API base URL '{}': {}", trimmed, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(AppError::Config(format!(
            "API base URL must use http:// or https://, got {}://",
            other
        ))),
    }
}

/// Limits the server advertises through `GET /api/config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerLimits {
    pub track_limit: u32,
    pub max_playlists: usize,
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            track_limit: 10_000,
            max_playlists: 200,
        }
    }
}
