//! Shared reqwest plumbing for the adapters.

use std::time::Duration;

use covstat_core::SourceError;
use reqwest::Client;

pub(crate) fn client(timeout: Duration) -> Result<Client, SourceError> {
  Client::builder()
    .timeout(timeout)
    .user_agent(concat!("covstat/", env!("CARGO_PKG_VERSION")))
    .build()
    .map_err(|e| SourceError::Network(format!("failed to build HTTP client: {e}")))
}

/// `GET url`, mapping transport failures, timeouts and non-2xx statuses to
/// [`SourceError`].
pub(crate) async fn get(
  client: &Client,
  url: &str,
  timeout: Duration,
) -> Result<reqwest::Response, SourceError> {
  let resp = client.get(url).send().await.map_err(|e| classify(e, timeout))?;
  if !resp.status().is_success() {
    return Err(SourceError::Status(resp.status().as_u16()));
  }
  Ok(resp)
}

pub(crate) fn classify(error: reqwest::Error, timeout: Duration) -> SourceError {
  if error.is_timeout() {
    SourceError::Timeout(timeout)
  } else {
    SourceError::Network(error.to_string())
  }
}
