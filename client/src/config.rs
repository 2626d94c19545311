//! Configuration management for the client.

use roster_engine::{IdPolicy, UserId, PREFS_STORAGE_NAME};
use std::env;
use std::path::PathBuf;

/// Default remote user service.
pub const DEFAULT_API_URL: &str = "https://jsonplaceholder.typicode.com";

/// Highest id the default service seeds.
pub const DEFAULT_SEED_MAX_ID: UserId = 10;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the remote user service, without trailing slash
    pub api_url: String,
    /// Highest id the service accepts updates for (`None` = no limit)
    pub seed_max_id: Option<UserId>,
    /// Where preferences are persisted
    pub prefs_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            seed_max_id: Some(DEFAULT_SEED_MAX_ID),
            prefs_path: PathBuf::from(format!("{PREFS_STORAGE_NAME}.json")),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = match lookup("ROSTER_API_URL") {
            Some(url) => parse_api_url(&url)?,
            None => defaults.api_url,
        };

        let seed_max_id = match lookup("ROSTER_SEED_MAX_ID") {
            Some(raw) => parse_seed_max_id(&raw)?,
            None => defaults.seed_max_id,
        };

        let prefs_path = lookup("ROSTER_PREFS_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.prefs_path);

        Ok(Self {
            api_url,
            seed_max_id,
            prefs_path,
        })
    }

    /// Id policy implied by the configured seed range.
    pub fn id_policy(&self) -> IdPolicy {
        IdPolicy::new(self.seed_max_id)
    }
}

fn parse_api_url(raw: &str) -> Result<String, ConfigError> {
    let url = raw.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::InvalidApiUrl(raw.to_string()));
    }
    Ok(url.to_string())
}

fn parse_seed_max_id(raw: &str) -> Result<Option<UserId>, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidSeedMaxId(raw.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid ROSTER_API_URL value: {0}")]
    InvalidApiUrl(String),

    #[error("Invalid ROSTER_SEED_MAX_ID value: {0}")]
    InvalidSeedMaxId(String),
}
