use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::orchestrator::ScheduleConfig;

/// Character used to hide secrets in logs.
pub const MASK_CHAR: char = '*';

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub rule: RuleConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    /// Report intended changes without applying them.
    #[serde(default)]
    pub preview: bool,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Enable debug logging.
    #[serde(default)]
    pub verbose: bool,
}

/// Web API connection settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConnectionConfig {
    /// Base URL (e.g., "http://localhost:8080")
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Request timeout in seconds. Unset leaves the HTTP transport default.
    #[serde(default)]
    pub timeout_secs: Option<u32>,
}

/// Pattern and replacement applied to every eligible tracker URL
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RuleConfig {
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub replacement: Option<String>,
}

/// Optional constraints on which torrents are considered
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct FilterConfig {
    #[serde(default)]
    pub hashes: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Validated connection settings for the qBittorrent client
#[derive(Debug, Clone)]
pub struct QBittorrentConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: Option<u32>,
}

impl Config {
    /// Build client settings, failing on any missing connection field.
    pub fn client_config(&self) -> Result<QBittorrentConfig, ConfigError> {
        let mut missing = Vec::new();
        let url = required(&self.connection.url, "url", &mut missing);
        let username = required(&self.connection.username, "username", &mut missing);
        let password = required(&self.connection.password, "password", &mut missing);

        match (url, username, password) {
            (Some(url), Some(username), Some(password)) => Ok(QBittorrentConfig {
                url,
                username,
                password,
                timeout_secs: self.connection.timeout_secs,
            }),
            _ => Err(ConfigError::MissingFields(missing)),
        }
    }
}

pub(crate) fn required(
    value: &Option<String>,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            missing.push(name);
            None
        }
    }
}

/// Hide all but the last two characters of a secret.
///
/// Secrets of two characters or fewer are fully masked. The result always has
/// the same number of characters as the input.
pub fn mask_secret(secret: &str) -> String {
    let len = secret.chars().count();
    if len <= 2 {
        return MASK_CHAR.to_string().repeat(len);
    }
    let visible: String = secret.chars().skip(len - 2).collect();
    let mut masked = MASK_CHAR.to_string().repeat(len - 2);
    masked.push_str(&visible);
    masked
}

/// Sanitized config for logging (secrets masked)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub pattern: Option<String>,
    pub replacement: Option<String>,
    pub filters: FilterConfig,
    pub preview: bool,
    pub loop_enabled: bool,
    pub interval_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            url: config.connection.url.clone(),
            username: config.connection.username.clone(),
            password: config.connection.password.as_deref().map(mask_secret),
            pattern: config.rule.pattern.clone(),
            replacement: config.rule.replacement.clone(),
            filters: config.filters.clone(),
            preview: config.preview,
            loop_enabled: config.schedule.enabled,
            interval_secs: config.schedule.interval().as_secs(),
        }
    }
}
