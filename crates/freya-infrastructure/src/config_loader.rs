//! Loads [`AppConfig`] from TOML with environment overrides.

use freya_core::config::AppConfig;
use freya_core::error::{FreyaError, Result};
use std::path::Path;
use tracing::debug;

/// Reads the configuration file at `path`.
///
/// A missing file yields the defaults; a file that does not parse is an error.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        debug!(target: "freya::config", path = %path.display(), "Config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        FreyaError::io(format!(
            "Failed to read configuration file at {}: {}",
            path.display(),
            e
        ))
    })?;

    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }

    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Applies `FREYA_BACKEND_URL`, `OPENWEATHER_API_KEY`, `NEWSAPI_KEY` and
/// `FREYA_PLUGIN_TIMEOUT_SECS` on top of `config`.
///
/// `lookup` abstracts `std::env::var` so callers (and tests) control the source.
pub fn apply_env_overrides<F>(mut config: AppConfig, lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = non_empty("FREYA_BACKEND_URL") {
        config.backend.base_url = Some(url);
    }
    if let Some(key) = non_empty("OPENWEATHER_API_KEY") {
        config.plugins.openweather_api_key = Some(key);
    }
    if let Some(key) = non_empty("NEWSAPI_KEY") {
        config.plugins.news_api_key = Some(key);
    }
    if let Some(raw) = non_empty("FREYA_PLUGIN_TIMEOUT_SECS") {
        config.plugins.timeout_secs = raw.trim().parse().map_err(|_| {
            FreyaError::config(format!("FREYA_PLUGIN_TIMEOUT_SECS is not a number: {raw}"))
        })?;
    }
    Ok(config)
}

/// Loads the file and applies the process environment.
pub fn load_config_with_env(path: &Path) -> Result<AppConfig> {
    apply_env_overrides(load_config(path)?, |key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_sections() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[backend]
base_url = "http://localhost:3000"

[plugins]
timeout_secs = 12
openweather_api_key = "abc"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.backend.base_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(config.plugins.timeout_secs, 12);
        assert_eq!(config.plugins.openweather_api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn test_malformed_file_is_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[plugins\ntimeout_secs = ").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, FreyaError::Serialization { .. }));
    }

    #[test]
    fn test_env_overrides_win() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FREYA_BACKEND_URL", "https://api.example.com"),
            ("NEWSAPI_KEY", "news-key"),
            ("OPENWEATHER_API_KEY", "  "),
            ("FREYA_PLUGIN_TIMEOUT_SECS", "7"),
        ]);
        let config = apply_env_overrides(AppConfig::default(), |key| {
            env.get(key).map(|value| value.to_string())
        })
        .unwrap();

        assert_eq!(config.backend.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.plugins.news_api_key.as_deref(), Some("news-key"));
        assert_eq!(config.plugins.openweather_api_key, None);
        assert_eq!(config.plugins.timeout_secs, 7);
    }

    #[test]
    fn test_bad_timeout_override() {
        let err = apply_env_overrides(AppConfig::default(), |key| {
            (key == "FREYA_PLUGIN_TIMEOUT_SECS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, FreyaError::Config(_)));
    }
}
