//! `/define <word>` backed by dictionaryapi.dev.

use async_trait::async_trait;
use freya_core::plugin::{Plugin, PluginResult, RenderedCard, ResultRenderer};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, error};

use crate::http::{fetch_json, str_field};

static TRIGGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^/define\s+(.+)").expect("define trigger is a valid pattern"));

const NO_DEFINITIONS: &str = "No Definitions Found";
const MAX_MEANINGS: usize = 3;

pub struct DefinePlugin {
    client: Client,
    base_url: String,
}

impl DefinePlugin {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

fn first_definition(entries: &Value) -> Option<&str> {
    entries
        .pointer("/0/meanings/0/definitions/0/definition")
        .and_then(Value::as_str)
}

/// Turns a dictionary response into a plugin result.
///
/// The provider answers unknown words with a 404 object titled "No Definitions
/// Found"; any non-array body is treated the same way.
pub fn interpret(status: StatusCode, body: &Value, word: &str) -> PluginResult {
    let title = str_field(body, "title");
    if !status.is_success() || title == Some(NO_DEFINITIONS) || !body.is_array() {
        let error = title
            .or_else(|| str_field(body, "message"))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Could not find a definition for \"{}\".", word));
        return PluginResult::failure(error);
    }

    let summary = first_definition(body).unwrap_or("Found. See card.");
    PluginResult::success(format!("Definition for {}: {}", word, summary), body.clone())
}

pub fn render(data: &Value) -> RenderedCard {
    let Some(entry) = data.get(0) else {
        return RenderedCard::new("Definition");
    };
    let word = entry.get("word").and_then(Value::as_str).unwrap_or("Definition");
    let title = match str_field(entry, "phonetic") {
        Some(phonetic) => format!("{} {}", word, phonetic),
        None => word.to_string(),
    };

    let mut card = RenderedCard::new(title);
    let meanings = entry
        .get("meanings")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for meaning in meanings.iter().take(MAX_MEANINGS) {
        let part = meaning
            .get("partOfSpeech")
            .and_then(Value::as_str)
            .unwrap_or("meaning");
        if let Some(definition) = meaning
            .pointer("/definitions/0/definition")
            .and_then(Value::as_str)
        {
            card = card.line(format!("({}) {}", part, definition));
        }
        if let Some(example) = meaning
            .pointer("/definitions/0/example")
            .and_then(Value::as_str)
        {
            card = card.line(format!("    e.g. \"{}\"", example));
        }
    }
    card
}

#[async_trait]
impl Plugin for DefinePlugin {
    fn name(&self) -> &str {
        "define"
    }

    fn description(&self) -> &str {
        "Fetches dictionary definitions for a word. Usage: /define [word]"
    }

    fn trigger(&self) -> &Regex {
        &TRIGGER
    }

    fn loading_message(&self) -> Option<&str> {
        Some("Looking up definition...")
    }

    fn renderer(&self) -> Option<ResultRenderer> {
        Some(render)
    }

    async fn execute(&self, args: &[String]) -> anyhow::Result<PluginResult> {
        let Some(word) = args.first() else {
            return Ok(PluginResult::failure("Please provide a valid word."));
        };

        let mut url = reqwest::Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("dictionary base URL cannot take a path"))?
            .pop_if_empty()
            .push(word);

        match fetch_json(self.client.get(url)).await {
            Ok((status, body)) => {
                debug!(target: "freya::plugin::define", %status, word = %word, "Provider answered");
                Ok(interpret(status, &body, word))
            }
            Err(e) => {
                error!(target: "freya::plugin::define", error = %e, "Dictionary request failed");
                Ok(PluginResult::failure(
                    "Failed to fetch definition. Check your connection or the word.",
                ))
            }
        }
    }
}
