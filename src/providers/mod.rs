pub mod fmarket;
pub mod vci;

pub use fmarket::FmarketProvider;
pub use vci::VciIndexProvider;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("navdash/", env!("CARGO_PKG_VERSION"));

pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")
}

/// Reads a JSON body, treating any non-success status as an error.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("HTTP error: {} for {}", status, what));
    }
    let text = response
        .text()
        .await
        .with_context(|| format!("Failed to get response text for {what}"))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse response for {what}"))
}

pub(crate) async fn post_json<B, T>(
    client: &reqwest::Client,
    url: &str,
    body: &B,
    what: &str,
) -> Result<T>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    debug!("POST {} ({})", url, what);
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| anyhow!("Request error: {} for {} URL: {}", e, what, url))?;
    read_json(response, what).await
}

pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    what: &str,
) -> Result<T> {
    debug!("GET {} ({})", url, what);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| anyhow!("Request error: {} for {} URL: {}", e, what, url))?;
    read_json(response, what).await
}
