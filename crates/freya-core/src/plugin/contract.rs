//! The plugin contract.

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use super::model::{PluginResult, RenderedCard};

/// Label shown while a plugin without its own loading message executes.
pub const DEFAULT_LOADING_MESSAGE: &str = "Processing...";

/// Pure function turning a plugin's result data into a card.
pub type ResultRenderer = fn(&Value) -> RenderedCard;

/// A registered command handler.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Stable identifier used for renderer lookup and attribution.
    fn name(&self) -> &str;

    /// One-line usage help.
    fn description(&self) -> &str;

    /// Pattern tested against the full input. Capture groups become arguments.
    fn trigger(&self) -> &Regex;

    /// Placeholder text while `execute` is pending.
    fn loading_message(&self) -> Option<&str> {
        None
    }

    /// Custom renderer for successful results that carry data.
    fn renderer(&self) -> Option<ResultRenderer> {
        None
    }

    /// Runs the command.
    ///
    /// Expected failures must be returned as `Ok(PluginResult::Failure)`. An `Err`
    /// is treated by the pipeline as a critical fault.
    async fn execute(&self, args: &[String]) -> anyhow::Result<PluginResult>;

    /// The loading label, falling back to [`DEFAULT_LOADING_MESSAGE`].
    fn loading_label(&self) -> &str {
        self.loading_message().unwrap_or(DEFAULT_LOADING_MESSAGE)
    }
}
