//! Application configuration model.
//!
//! Loaded from `config.toml` by the infrastructure layer; every field has a default
//! so a missing or partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PLUGIN_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub plugins: PluginConfig,
    pub storage: StorageConfig,
}

/// Remote backend hosting identities and account-backed sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://freya.example.com`. Absent means offline mode.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    pub timeout_secs: u64,
    pub openweather_api_key: Option<String>,
    pub openweather_base_url: String,
    pub news_api_key: Option<String>,
    pub news_base_url: String,
    pub dictionary_base_url: String,
    pub joke_base_url: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_PLUGIN_TIMEOUT_SECS,
            openweather_api_key: None,
            openweather_base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            news_api_key: None,
            news_base_url: "https://newsapi.org/v2".to_string(),
            dictionary_base_url: "https://api.dictionaryapi.dev/api/v2/entries/en".to_string(),
            joke_base_url: "https://v2.jokeapi.dev".to_string(),
        }
    }
}

impl PluginConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where the local key-value store lives. Defaults to the platform data dir.
    pub local_store_path: Option<PathBuf>,
}
