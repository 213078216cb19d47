use anyhow::{anyhow, Result};
use chrono::Duration;
use shared::HISTORY_WINDOW_DAYS;
use std::{env, fmt::Display, str::FromStr};
use tracing::info;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Dashboard settings. `API_URL` selects the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Backend base URL without a trailing slash
    pub api_url: String,
    /// Days in each simulated history, today included
    pub history_days: usize,
    /// Most students whose history is kept at once
    pub history_capacity: usize,
    /// Age after which a simulated history is regenerated
    pub history_ttl: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            history_days: HISTORY_WINDOW_DAYS,
            history_capacity: 1_000,
            history_ttl: Duration::days(30),
        }
    }
}

impl DashboardConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url: String = try_load(&lookup, "API_URL", DEFAULT_API_URL)?;
        let history_days: usize = try_load(&lookup, "HISTORY_DAYS", &defaults.history_days.to_string())?;
        if history_days == 0 {
            return Err(anyhow!("HISTORY_DAYS must be at least 1"));
        }
        let history_capacity: usize =
            try_load(&lookup, "HISTORY_CAPACITY", &defaults.history_capacity.to_string())?;
        let ttl_days: i64 = try_load(&lookup, "HISTORY_TTL_DAYS", &defaults.history_ttl.num_days().to_string())?;
        if ttl_days < 1 {
            return Err(anyhow!("HISTORY_TTL_DAYS must be at least 1"));
        }

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            history_days,
            history_capacity: history_capacity.max(1),
            history_ttl: Duration::days(ttl_days),
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim()
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value `{raw}`: {e}"))
}
