//! `/weather <city>` backed by the OpenWeather current-weather endpoint.

use async_trait::async_trait;
use freya_core::plugin::{Plugin, PluginResult, RenderedCard, ResultRenderer};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::http::{fetch_json, str_field};

static TRIGGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^/weather\s+(.+)").expect("weather trigger is a valid pattern"));

const MISSING_KEY: &str = "Weather service is currently unavailable (key not set).";
const TRANSPORT_FAILURE: &str =
    "Failed to fetch weather data. Check your connection or the city name.";

/// Result data handed to the weather renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub city: String,
    pub country: String,
    pub temp: f64,
    pub description: String,
    pub icon: String,
    pub humidity: f64,
    pub wind_speed: f64,
}

pub struct WeatherPlugin {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherPlugin {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }
}

/// Turns an OpenWeather response into a plugin result.
pub fn interpret(status: StatusCode, body: &Value, city: &str) -> PluginResult {
    let provider_message = str_field(body, "message");
    // `cod` comes back as a number on success and as a string on errors.
    let cod = match body.get("cod") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    if !status.is_success() {
        let fallback = if cod.as_deref().is_some_and(|c| c != "200") {
            format!("Could not find weather for {}", city)
        } else {
            format!(
                "Weather API Error: {}",
                status.canonical_reason().unwrap_or("Unknown error")
            )
        };
        return PluginResult::failure(provider_message.map(str::to_string).unwrap_or(fallback));
    }
    if cod.as_deref() == Some("404") {
        return PluginResult::failure(
            provider_message
                .map(str::to_string)
                .unwrap_or_else(|| format!("Could not find weather for {}", city)),
        );
    }

    let Some(report) = parse_report(body) else {
        return PluginResult::failure(TRANSPORT_FAILURE);
    };
    let display_text = format!(
        "Weather in {}: {}°C, {}.",
        report.city, report.temp, report.description
    );
    match serde_json::to_value(&report) {
        Ok(data) => PluginResult::success(display_text, data),
        Err(_) => PluginResult::text(display_text),
    }
}

fn parse_report(body: &Value) -> Option<WeatherReport> {
    let conditions = body.get("weather")?.get(0)?;
    let main = body.get("main")?;
    Some(WeatherReport {
        city: body.get("name")?.as_str()?.to_string(),
        country: body
            .pointer("/sys/country")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        temp: main.get("temp")?.as_f64()?,
        description: conditions.get("description")?.as_str()?.to_string(),
        icon: conditions
            .get("icon")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        humidity: main.get("humidity").and_then(Value::as_f64).unwrap_or_default(),
        wind_speed: body
            .pointer("/wind/speed")
            .and_then(Value::as_f64)
            .unwrap_or_default(),
    })
}

pub fn render(data: &Value) -> RenderedCard {
    match serde_json::from_value::<WeatherReport>(data.clone()) {
        Ok(report) => {
            let title = if report.country.is_empty() {
                report.city.clone()
            } else {
                format!("{}, {}", report.city, report.country)
            };
            RenderedCard::new(title)
                .line(format!("{}°C, {}", report.temp, report.description))
                .line(format!("Humidity: {}%", report.humidity))
                .line(format!("Wind: {} m/s", report.wind_speed))
        }
        Err(_) => RenderedCard::new("Weather").line(data.to_string()),
    }
}

#[async_trait]
impl Plugin for WeatherPlugin {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Fetches current weather for a city. Usage: /weather [city]"
    }

    fn trigger(&self) -> &Regex {
        &TRIGGER
    }

    fn loading_message(&self) -> Option<&str> {
        Some("Fetching weather...")
    }

    fn renderer(&self) -> Option<ResultRenderer> {
        Some(render)
    }

    async fn execute(&self, args: &[String]) -> anyhow::Result<PluginResult> {
        let Some(city) = args.first() else {
            return Ok(PluginResult::failure("Please provide a valid city name."));
        };
        let Some(api_key) = &self.api_key else {
            error!(target: "freya::plugin::weather", "OpenWeather API key is not set");
            return Ok(PluginResult::failure(MISSING_KEY));
        };

        let request = self
            .client
            .get(format!("{}/weather", self.base_url.trim_end_matches('/')))
            .query(&[
                ("q", city.as_str()),
                ("appid", api_key.as_str()),
                ("units", "metric"),
            ]);

        match fetch_json(request).await {
            Ok((status, body)) => {
                debug!(target: "freya::plugin::weather", %status, city = %city, "Provider answered");
                Ok(interpret(status, &body, city))
            }
            Err(e) => {
                error!(target: "freya::plugin::weather", error = %e, "Weather request failed");
                Ok(PluginResult::failure(TRANSPORT_FAILURE))
            }
        }
    }
}
