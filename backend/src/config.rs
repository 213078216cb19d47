use anyhow::{anyhow, Result};
use std::{env, fmt::Display, net::IpAddr, str::FromStr};
use tracing::info;

/// Server settings read from the environment at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    /// Enables the destructive GET /api/seed endpoint
    pub allow_seed: bool,
    /// Reject student creation when the referenced section does not exist
    pub strict_section_membership: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; missing keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            host: try_load(&lookup, "HOST", "0.0.0.0")?,
            port: try_load(&lookup, "PORT", "5000")?,
            database_url: try_load(&lookup, "DATABASE_URL", "sqlite:attendance.db")?,
            allow_seed: try_load(&lookup, "ALLOW_SEED", "false")?,
            strict_section_membership: try_load(&lookup, "STRICT_SECTION_MEMBERSHIP", "false")?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 5000,
            database_url: "sqlite:attendance.db".to_string(),
            allow_seed: false,
            strict_section_membership: false,
        }
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
