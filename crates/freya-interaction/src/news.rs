//! `/news [category|topic]` backed by NewsAPI.
//!
//! A known category selects top headlines for that category; anything else is a
//! keyword search over recent articles.

use async_trait::async_trait;
use freya_core::plugin::{Plugin, PluginResult, RenderedCard, ResultRenderer};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error};

use crate::http::{fetch_json, str_field};

static TRIGGER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^/news(?:\s+(.+))?$").expect("news trigger is a valid pattern")
});

pub const CATEGORIES: [&str; 8] = [
    "business",
    "entertainment",
    "general",
    "health",
    "science",
    "sports",
    "technology",
    "ai",
];

const MAX_CARD_ARTICLES: usize = 5;

/// What a `/news` command asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsQuery {
    TopHeadlines,
    Category(String),
    Topic(String),
}

impl NewsQuery {
    pub fn from_args(args: &[String]) -> Self {
        match args.first().map(|arg| arg.trim()).filter(|arg| !arg.is_empty()) {
            None => Self::TopHeadlines,
            Some(arg) => {
                let lower = arg.to_lowercase();
                if CATEGORIES.contains(&lower.as_str()) {
                    Self::Category(lower)
                } else {
                    Self::Topic(arg.to_string())
                }
            }
        }
    }

    /// Endpoint path and query parameters, without the API key.
    pub fn endpoint(&self) -> (&'static str, Vec<(&'static str, String)>) {
        match self {
            Self::TopHeadlines => (
                "top-headlines",
                vec![("country", "us".to_string()), ("language", "en".to_string())],
            ),
            Self::Category(category) => (
                "top-headlines",
                vec![
                    ("country", "us".to_string()),
                    ("category", category.clone()),
                    ("language", "en".to_string()),
                ],
            ),
            Self::Topic(topic) => (
                "everything",
                vec![
                    ("q", topic.clone()),
                    ("sortBy", "publishedAt".to_string()),
                    ("language", "en".to_string()),
                ],
            ),
        }
    }

    fn label(&self) -> Option<&str> {
        match self {
            Self::TopHeadlines => None,
            Self::Category(value) | Self::Topic(value) => Some(value),
        }
    }
}

/// An article as shown by the news renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

impl NewsArticle {
    fn from_provider(article: &Value) -> Option<Self> {
        let optional = |key: &str| str_field(article, key).map(str::to_string);
        Some(Self {
            title: str_field(article, "title")?.to_string(),
            description: optional("description"),
            url: str_field(article, "url")?.to_string(),
            image_url: optional("urlToImage"),
            source_name: article
                .pointer("/source/name")
                .and_then(Value::as_str)
                .map(str::to_string),
            published_at: optional("publishedAt"),
        })
    }
}

pub struct NewsPlugin {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl NewsPlugin {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }
}

/// Turns a NewsAPI response into a plugin result.
pub fn interpret(status: StatusCode, body: &Value, query: &NewsQuery) -> PluginResult {
    let provider_error = body.get("status").and_then(Value::as_str) == Some("error");
    if !status.is_success() || provider_error {
        return PluginResult::failure(
            str_field(body, "message").unwrap_or("Could not fetch news at this time."),
        );
    }

    let articles: Vec<NewsArticle> = body
        .get("articles")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(NewsArticle::from_provider).collect())
        .unwrap_or_default();
    let label = query.label();
    let data = json!({ "articles": articles, "query": label });

    let display_text = match (articles.len(), label) {
        (0, Some(label)) => format!("No news found for \"{}\".", label),
        (0, None) => "No top headlines found right now.".to_string(),
        (n, Some(label)) => format!("Found {} articles related to \"{}\". See card for details.", n, label),
        (n, None) => format!("Found {} articles (Top Headlines). See card for details.", n),
    };
    PluginResult::success(display_text, data)
}

pub fn render(data: &Value) -> RenderedCard {
    let title = match data.get("query").and_then(Value::as_str) {
        Some(query) => format!("News: {}", query),
        None => "Top Headlines".to_string(),
    };
    let articles: Vec<NewsArticle> = data
        .get("articles")
        .cloned()
        .and_then(|articles| serde_json::from_value(articles).ok())
        .unwrap_or_default();

    let mut card = RenderedCard::new(title);
    if articles.is_empty() {
        return card.line("No articles.");
    }
    for article in articles.iter().take(MAX_CARD_ARTICLES) {
        card = match &article.source_name {
            Some(source) => card.line(format!("• {} ({})", article.title, source)),
            None => card.line(format!("• {}", article.title)),
        };
        card = card.line(format!("  {}", article.url));
    }
    if articles.len() > MAX_CARD_ARTICLES {
        card = card.line(format!("… and {} more", articles.len() - MAX_CARD_ARTICLES));
    }
    card
}

#[async_trait]
impl Plugin for NewsPlugin {
    fn name(&self) -> &str {
        "news"
    }

    fn description(&self) -> &str {
        "Fetches top news headlines. Usage: /news [optional_keyword_or_category] (e.g., /news or /news technology)"
    }

    fn trigger(&self) -> &Regex {
        &TRIGGER
    }

    fn loading_message(&self) -> Option<&str> {
        Some("Fetching latest news...")
    }

    fn renderer(&self) -> Option<ResultRenderer> {
        Some(render)
    }

    async fn execute(&self, args: &[String]) -> anyhow::Result<PluginResult> {
        let Some(api_key) = &self.api_key else {
            error!(target: "freya::plugin::news", "NewsAPI key is not set");
            return Ok(PluginResult::failure("News service is currently unavailable."));
        };

        let query = NewsQuery::from_args(args);
        let (path, params) = query.endpoint();
        let request = self
            .client
            .get(format!("{}/{}", self.base_url.trim_end_matches('/'), path))
            .query(&params)
            .query(&[("apiKey", api_key.as_str())])
            .header("User-Agent", concat!("freya/", env!("CARGO_PKG_VERSION")));

        match fetch_json(request).await {
            Ok((status, body)) => {
                debug!(target: "freya::plugin::news", %status, query = ?query, "Provider answered");
                Ok(interpret(status, &body, &query))
            }
            Err(e) => {
                error!(target: "freya::plugin::news", error = %e, "News request failed");
                Ok(PluginResult::failure("Failed to fetch news data. Please try again."))
            }
        }
    }
}
