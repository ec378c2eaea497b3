use crate::config::Secret;
use crate::error::{OrderError, Result};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Longest backend message passed on to callers.
const MAX_MESSAGE_LEN: usize = 200;

pub(super) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| OrderError::ConfigError(format!("Failed to build HTTP client: {e}")))
}

/// Appends percent-encoded `segments` to `base`.
pub(super) fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| OrderError::ConfigError(format!("Invalid API base '{base}': {e}")))?;
    url.path_segments_mut()
        .map_err(|_| OrderError::ConfigError(format!("API base cannot be a base URL: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(super) fn bearer(secret: &Secret) -> String {
    format!("Bearer {}", secret.reveal())
}

/// Decodes a successful response body, or turns a failed one into a `BackendError` carrying
/// the backend's own message when it sent one.
pub(super) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.map_err(|e| {
            OrderError::BackendError(format!("Unexpected payload from payment backend: {e}"))
        });
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| backend_message(&v))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    Err(OrderError::BackendError(format!(
        "{}: {}",
        status.as_u16(),
        truncate(&message)
    )))
}

fn backend_message(body: &Value) -> Option<String> {
    body.get("message")
        .or_else(|| body.pointer("/error/message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn truncate(message: &str) -> String {
    if message.chars().count() <= MAX_MESSAGE_LEN {
        message.to_string()
    } else {
        let mut short: String = message.chars().take(MAX_MESSAGE_LEN).collect();
        short.push('…');
        short
    }
}
