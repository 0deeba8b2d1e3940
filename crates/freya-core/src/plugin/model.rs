//! Plugin result models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a plugin execution that completed normally.
///
/// Expected failures (unknown city, missing API key, bad expression) are reported
/// with `Failure`; only unexpected faults surface as an `Err` from `execute`.
#[derive(Debug, Clone, PartialEq)]
pub enum PluginResult {
    Success {
        display_text: Option<String>,
        data: Option<Value>,
    },
    Failure {
        error: String,
    },
}

impl PluginResult {
    /// A success carrying display text and structured data.
    pub fn success(display_text: impl Into<String>, data: Value) -> Self {
        Self::Success {
            display_text: Some(display_text.into()),
            data: Some(data),
        }
    }

    /// A success with display text only.
    pub fn text(display_text: impl Into<String>) -> Self {
        Self::Success {
            display_text: Some(display_text.into()),
            data: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Presentational output of a plugin renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedCard {
    pub title: String,
    pub lines: Vec<String>,
}

impl RenderedCard {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }
}
