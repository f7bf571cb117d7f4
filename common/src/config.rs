use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::feed::WINDOW_LEN;

/// Why the configuration could not be loaded.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Where and how to fetch the feed.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    /// Without a channel the bundled recording is shown.
    pub channel_id: Option<String>,
    pub read_api_key: Option<String>,
    /// Number of entries requested per fetch.
    pub results: usize,
    pub request_timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.thingspeak.com".into(),
            channel_id: None,
            read_api_key: None,
            results: WINDOW_LEN,
            request_timeout_secs: 10,
        }
    }
}

impl FeedConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// The dashboard configuration.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub refresh_interval_secs: u64,
    pub feed: FeedConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 60,
            feed: FeedConfig::default(),
        }
    }
}

impl DashboardConfig {
    pub const FILE_NAME: &'static str = "config.json";

    /// Loads `config.json` from the platform config directory, applies the `SMART_NEST_*`
    /// environment overrides and validates the result.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// The config file location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "smart-nest")
            .map(|dirs| dirs.config_dir().join(Self::FILE_NAME))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json_data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&json_data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies overrides looked up through `var`.
    pub fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = var("SMART_NEST_FEED_URL") {
            self.feed.base_url = url;
        }
        if let Some(channel) = var("SMART_NEST_CHANNEL_ID") {
            self.feed.channel_id = Some(channel);
        }
        if let Some(key) = var("SMART_NEST_READ_API_KEY") {
            self.feed.read_api_key = Some(key);
        }
        if let Some(secs) = var("SMART_NEST_REFRESH_SECS") {
            self.refresh_interval_secs = secs.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("SMART_NEST_REFRESH_SECS is not a number: {secs:?}"))
            })?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid("refresh_interval_secs must be positive".into()));
        }
        if self.feed.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".into()));
        }
        if self.feed.results < WINDOW_LEN {
            return Err(ConfigError::Invalid(format!(
                "results must be at least {WINDOW_LEN}, got {}",
                self.feed.results
            )));
        }

        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}
