//! Configuration loading for the scraper.
//!
//! Loads from a TOML file and provides runtime defaults; a missing or broken
//! file is logged and replaced with defaults rather than failing startup.

use crate::store::StoreLimits;
use crate::types::Platform;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Minimum spacing between processed events for the same app.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Platforms to scrape; absent means every supported platform.
    #[serde(default)]
    pub enabled_platforms: Option<Vec<Platform>>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            enabled_platforms: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Where the persisted conversation blob lives. Defaults to the
    /// platform data dir.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Cap on distinct conversations kept in the cache.
    #[serde(default = "default_max_conversations")]
    pub max_conversations: usize,

    /// Cap on messages kept per conversation.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_conversations: default_max_conversations(),
            max_messages: default_max_messages(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_max_conversations() -> usize {
    StoreLimits::default().max_conversations
}

fn default_max_messages() -> usize {
    StoreLimits::default().max_messages
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Self::default_config_path())
    }

    /// Load configuration from a specific path, warning and defaulting on
    /// any failure.
    pub fn load_from_path(path: PathBuf) -> Self {
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    info!("loaded configuration from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("failed to parse config file: {e}, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!("no config file at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chat-scraper")
            .join("config.toml")
    }

    /// Capacity limits for the conversation store.
    pub fn store_limits(&self) -> StoreLimits {
        StoreLimits {
            max_conversations: self.store.max_conversations,
            max_messages: self.store.max_messages,
        }
    }

    /// Effective data directory for the conversation store.
    pub fn data_dir(&self) -> PathBuf {
        self.store.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("chat-scraper")
        })
    }
}
