use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;

/// Sends the request and returns the status with the body parsed as JSON.
///
/// A body that is not JSON is returned as `Value::Null`; providers answer some
/// errors with HTML.
pub(crate) async fn fetch_json(request: RequestBuilder) -> Result<(StatusCode, Value), reqwest::Error> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    Ok((status, serde_json::from_str(&text).unwrap_or(Value::Null)))
}

/// Reads a string field, treating empty strings as absent.
pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
