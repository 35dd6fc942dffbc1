// src/feeds/client.rs
//! Shared HTTP client for all feed adapters: short connect timeout, longer
//! read budget, redirects followed, non-2xx surfaced as errors. One client,
//! passed in by the caller — connections are pooled and released when the
//! request future completes or is dropped.

use std::time::Duration;

use anyhow::{Context, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const TOTAL_TIMEOUT: Duration = Duration::from_secs(12);

/// Build the client every adapter shares.
pub fn build() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(TOTAL_TIMEOUT)
        .user_agent("pulsemap/0.1")
        .build()
        .context("building feed http client")
}

/// Single-attempt GET returning a deserialized JSON body.
/// Timeouts and non-2xx statuses come back as errors; the caller wraps
/// them into its provider's `FeedError`.
pub async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    accept: &str,
) -> Result<T> {
    let resp = client
        .get(url)
        .header(reqwest::header::ACCEPT, accept)
        .send()
        .await
        .with_context(|| format!("GET {url}"))?
        .error_for_status()
        .with_context(|| format!("GET {url}"))?;
    resp.json::<T>().await.with_context(|| format!("decoding {url}"))
}

/// Single-attempt GET returning the raw body text (FIRMS serves CSV).
pub async fn get_text(client: &reqwest::Client, url: &str, accept: &str) -> Result<String> {
    let resp = client
        .get(url)
        .header(reqwest::header::ACCEPT, accept)
        .send()
        .await
        .with_context(|| format!("GET {url}"))?
        .error_for_status()
        .with_context(|| format!("GET {url}"))?;
    resp.text().await.with_context(|| format!("reading {url}"))
}
