//! Unified path management for freya files.
//!
//! ```text
//! ~/.config/freya/          # Config directory
//! └── config.toml           # Application configuration
//!
//! ~/.local/share/freya/     # Data directory
//! └── local_store.json      # Key-value store (remembered active sessions)
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "freya";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for freya_core::FreyaError {
    fn from(err: PathError) -> Self {
        freya_core::FreyaError::config(err.to_string())
    }
}

pub struct FreyaPaths;

impl FreyaPaths {
    /// Returns the freya configuration directory (e.g. `~/.config/freya/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the freya data directory (e.g. `~/.local/share/freya/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn local_store_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("local_store.json"))
    }
}
