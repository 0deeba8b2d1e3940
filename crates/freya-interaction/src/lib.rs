//! Built-in chat plugins.
//!
//! Each plugin talks to one external provider (or none, for `calc`) and turns the
//! provider's answer into a [`PluginResult`](freya_core::plugin::PluginResult).
//! Provider responses are interpreted by pure functions so they can be tested
//! without network access.

pub mod calc;
pub mod define;
mod http;
pub mod joke;
pub mod news;
pub mod weather;

use std::sync::Arc;

use freya_core::config::PluginConfig;
use freya_core::plugin::PluginRegistry;

pub use calc::CalcPlugin;
pub use define::DefinePlugin;
pub use joke::JokePlugin;
pub use news::NewsPlugin;
pub use weather::WeatherPlugin;

/// Builds the registry in its fixed precedence order: weather, calc, define, joke, news.
pub fn default_registry(config: &PluginConfig) -> PluginRegistry {
    let client = reqwest::Client::new();
    PluginRegistry::new()
        .with(Arc::new(WeatherPlugin::new(
            client.clone(),
            config.openweather_base_url.clone(),
            config.openweather_api_key.clone(),
        )))
        .with(Arc::new(CalcPlugin::new()))
        .with(Arc::new(DefinePlugin::new(
            client.clone(),
            config.dictionary_base_url.clone(),
        )))
        .with(Arc::new(JokePlugin::new(
            client.clone(),
            config.joke_base_url.clone(),
        )))
        .with(Arc::new(NewsPlugin::new(
            client,
            config.news_base_url.clone(),
            config.news_api_key.clone(),
        )))
}
