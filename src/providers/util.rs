use anyhow::{Error, Result, anyhow};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("btcboard/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by a provider. Requests that exceed
/// `timeout` fail like any other transport error.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))
}

/// Retries an async operation with configurable attempts and delays
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `retries`: Number of retry attempts (total runs = 1 initial + retries)
/// - `delay_ms`: Milliseconds between retry attempts
///
/// # Returns
/// Either the successful result or the error after all attempts
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay_ms: u64,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut attempt = 1;
    loop {
        match operation().await.map_err(anyhow::Error::from) {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > retries {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, retries, err
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

/// Sends a GET request and returns the body of a successful response.
pub async fn get_text(
    client: &reqwest::Client,
    url: &str,
    retries: usize,
    feed: &str,
) -> Result<String> {
    debug!("Requesting {} data from {}", feed, url);

    let response = with_retry(|| client.get(url).send(), retries, 500)
        .await
        .map_err(|e| anyhow!("Request error: {} for {} feed", e, feed))?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "HTTP error: {} for {} feed",
            response.status(),
            feed
        ));
    }

    response
        .text()
        .await
        .map_err(|e| anyhow!("Failed to read {} response body: {}", feed, e))
}

/// Parses a JSON body, surfacing the in-band error format some APIs use
/// (`{"Response": "Error", "Message": ...}` with a 200 status).
pub fn parse_json<T: DeserializeOwned>(text: &str, feed: &str) -> Result<T> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| anyhow!("Failed to parse JSON response for {} feed: {}", feed, e))?;

    if value.get("Response").and_then(|r| r.as_str()) == Some("Error") {
        let message = value
            .get("Message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error");
        return Err(anyhow!("{} feed reported an error: {}", feed, message));
    }

    serde_json::from_value(value)
        .map_err(|e| anyhow!("Failed to parse JSON response for {} feed: {}", feed, e))
}
