//! `/joke` backed by JokeAPI.

use async_trait::async_trait;
use freya_core::plugin::{Plugin, PluginResult, RenderedCard, ResultRenderer};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, error};

use crate::http::{fetch_json, str_field};

static TRIGGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^/joke$").expect("joke trigger is a valid pattern"));

const BLACKLIST: &str = "nsfw,religious,political,racist,sexist,explicit";
const UNEXPECTED_FORMAT: &str = "Received an unexpected joke format.";

pub struct JokePlugin {
    client: Client,
    base_url: String,
}

impl JokePlugin {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

fn joke_text(body: &Value) -> Option<String> {
    match body.get("type").and_then(Value::as_str)? {
        "single" => str_field(body, "joke").map(str::to_string),
        "twopart" => {
            let setup = str_field(body, "setup")?;
            let delivery = str_field(body, "delivery")?;
            Some(format!("{}\n... {}", setup, delivery))
        }
        _ => None,
    }
}

/// Turns a JokeAPI response into a plugin result.
pub fn interpret(status: StatusCode, body: &Value) -> PluginResult {
    let flagged = body.get("error").and_then(Value::as_bool).unwrap_or(false);
    if flagged || !status.is_success() {
        return PluginResult::failure(
            str_field(body, "message").unwrap_or("Could not fetch a joke at this time."),
        );
    }
    match joke_text(body) {
        Some(text) => PluginResult::success(text, body.clone()),
        None => PluginResult::failure(UNEXPECTED_FORMAT),
    }
}

pub fn render(data: &Value) -> RenderedCard {
    let title = match str_field(data, "category") {
        Some(category) => format!("Joke ({})", category),
        None => "Joke".to_string(),
    };
    let card = RenderedCard::new(title);
    match data.get("type").and_then(Value::as_str) {
        Some("twopart") => card
            .line(str_field(data, "setup").unwrap_or_default())
            .line(format!("... {}", str_field(data, "delivery").unwrap_or_default())),
        _ => card.line(str_field(data, "joke").unwrap_or_default()),
    }
}

#[async_trait]
impl Plugin for JokePlugin {
    fn name(&self) -> &str {
        "joke"
    }

    fn description(&self) -> &str {
        "Tells a random joke. Usage: /joke"
    }

    fn trigger(&self) -> &Regex {
        &TRIGGER
    }

    fn loading_message(&self) -> Option<&str> {
        Some("Finding a good joke...")
    }

    fn renderer(&self) -> Option<ResultRenderer> {
        Some(render)
    }

    async fn execute(&self, _args: &[String]) -> anyhow::Result<PluginResult> {
        let request = self
            .client
            .get(format!("{}/joke/Any", self.base_url.trim_end_matches('/')))
            .query(&[("blacklistFlags", BLACKLIST), ("type", "twopart")]);

        match fetch_json(request).await {
            Ok((status, body)) => {
                debug!(target: "freya::plugin::joke", %status, "Provider answered");
                Ok(interpret(status, &body))
            }
            Err(e) => {
                error!(target: "freya::plugin::joke", error = %e, "Joke request failed");
                Ok(PluginResult::failure(
                    "Failed to fetch a joke. The joke gods are asleep.",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_twopart_joke() {
        let body = json!({
            "error": false,
            "category": "Programming",
            "type": "twopart",
            "setup": "Why do programmers prefer dark mode?",
            "delivery": "Because light attracts bugs."
        });
        let result = interpret(StatusCode::OK, &body);
        assert_eq!(
            result,
            PluginResult::success(
                "Why do programmers prefer dark mode?\n... Because light attracts bugs.",
                body.clone()
            )
        );

        let card = render(&body);
        assert_eq!(card.title, "Joke (Programming)");
        assert_eq!(card.lines[1], "... Because light attracts bugs.");
    }

    #[test]
    fn test_single_joke() {
        let body = json!({ "error": false, "type": "single", "joke": "I am a joke." });
        let PluginResult::Success { display_text, .. } = interpret(StatusCode::OK, &body) else {
            panic!("expected success");
        };
        assert_eq!(display_text.as_deref(), Some("I am a joke."));
    }

    #[test]
    fn test_provider_error_flag() {
        let body = json!({ "error": true, "message": "No matching joke found" });
        assert_eq!(
            interpret(StatusCode::BAD_REQUEST, &body),
            PluginResult::failure("No matching joke found")
        );
    }

    #[test]
    fn test_unexpected_shape() {
        let body = json!({ "error": false, "type": "twopart", "setup": "Only half" });
        assert_eq!(
            interpret(StatusCode::OK, &body),
            PluginResult::failure(UNEXPECTED_FORMAT)
        );
    }

    #[test]
    fn test_trigger_is_exact() {
        let plugin = JokePlugin::new(Client::new(), "http://localhost");
        assert!(plugin.trigger().is_match("/Joke"));
        assert!(!plugin.trigger().is_match("/joke please"));
    }
}
