//! Shared HTTP client construction for the outbound API clients

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

use crate::Result;
use crate::error::CitySenseError;

/// User agent sent when the caller does not configure one
pub const DEFAULT_USER_AGENT: &str = concat!("CitySense/", env!("CARGO_PKG_VERSION"));

/// Build a client that retries transient failures with exponential backoff
pub fn build_http_client(
    timeout_seconds: u32,
    max_retries: u32,
    user_agent: Option<&str>,
) -> Result<ClientWithMiddleware> {
    let inner = reqwest::Client::builder()
        .timeout(Duration::from_secs(u64::from(timeout_seconds)))
        .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
        .build()
        .map_err(|e| CitySenseError::config(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(inner)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Turn a non-success response into an API error carrying a short body excerpt
pub async fn ensure_success(
    response: reqwest::Response,
    service: &str,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let excerpt: String = body.chars().take(200).collect();
    Err(CitySenseError::api(format!(
        "{service} request failed with status {status}: {excerpt}"
    )))
}
