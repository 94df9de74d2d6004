use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::playlist::AccessFilter;
use crate::playlist::access::DEFAULT_DENY_HOSTS;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config directory not found")]
    NoConfigDir,
    #[error("config file not found at {0}")]
    NotFound(PathBuf),
    #[error("failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("validation failed: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub playlists: PlaylistsConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub browse: BrowseConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistsConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for PlaylistsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://iptv-org.github.io/iptv".to_string()
}

/// How an alternate retrieval path wraps the target URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayKind {
    /// `GET {url}?url={target}` answering `{ "success": bool, "content": "..." }`
    Json,
    /// `GET {url}{target}` answering the raw document
    Prefix,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelayConfig {
    pub kind: RelayKind,
    pub url: String,
}

impl RelayConfig {
    pub fn prefix(url: &str) -> Self {
        Self {
            kind: RelayKind::Prefix,
            url: url.to_string(),
        }
    }

    pub fn json(url: &str) -> Self {
        Self {
            kind: RelayKind::Json,
            url: url.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_direct_timeout")]
    pub direct_timeout_secs: u64,
    #[serde(default = "default_relay_timeout")]
    pub relay_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_relays")]
    pub relays: Vec<RelayConfig>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            direct_timeout_secs: default_direct_timeout(),
            relay_timeout_secs: default_relay_timeout(),
            user_agent: default_user_agent(),
            relays: default_relays(),
        }
    }
}

impl FetchConfig {
    pub fn direct_timeout(&self) -> Duration {
        Duration::from_secs(self.direct_timeout_secs)
    }

    pub fn relay_timeout(&self) -> Duration {
        Duration::from_secs(self.relay_timeout_secs)
    }
}

fn default_direct_timeout() -> u64 {
    15
}

fn default_relay_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("tvscout/{}", env!("CARGO_PKG_VERSION"))
}

fn default_relays() -> Vec<RelayConfig> {
    vec![
        RelayConfig::prefix("https://api.allorigins.win/raw?url="),
        RelayConfig::prefix("https://corsproxy.io/?"),
    ]
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    /// Replaces the built-in denylist when set
    pub deny_hosts: Option<Vec<String>>,
    #[serde(default)]
    pub extra_deny_hosts: Vec<String>,
}

impl FilterConfig {
    pub fn access_filter(&self) -> AccessFilter {
        let base: Vec<String> = match &self.deny_hosts {
            Some(hosts) => hosts.clone(),
            None => DEFAULT_DENY_HOSTS.iter().map(|h| h.to_string()).collect(),
        };
        AccessFilter::new(base.iter().chain(self.extra_deny_hosts.iter()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowseConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_search_debounce")]
    pub search_debounce_ms: u64,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            search_debounce_ms: default_search_debounce(),
        }
    }
}

fn default_page_size() -> usize {
    50
}

fn default_search_debounce() -> u64 {
    300
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    /// Directory holding categories.json, languages.json, countries.json, regions.json
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            command: default_player_command(),
            args: Vec::new(),
        }
    }
}

fn default_player_command() -> String {
    "mpv".to_string()
}

impl Config {
    /// Load from the default location, falling back to defaults if there is no file
    pub fn load() -> Result<Self, ConfigError> {
        let Ok(path) = Self::config_path() else {
            info!("no config directory, using defaults");
            return Ok(Self::default());
        };

        match Self::load_from(&path) {
            Err(ConfigError::NotFound(path)) => {
                info!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("", "", "tvscout")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !is_http_url(&self.playlists.base_url) {
            return Err(ConfigError::ValidationError(
                "playlists.base_url must start with http:// or https://".to_string(),
            ));
        }

        for relay in &self.fetch.relays {
            if !is_http_url(&relay.url) {
                return Err(ConfigError::ValidationError(format!(
                    "relay url '{}' must start with http:// or https://",
                    relay.url
                )));
            }
        }

        if self.fetch.direct_timeout_secs == 0 || self.fetch.relay_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "fetch timeouts must be greater than zero".to_string(),
            ));
        }

        if self.browse.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "browse.page_size must be greater than zero".to_string(),
            ));
        }

        if self.player.command.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "player.command cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
