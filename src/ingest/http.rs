// src/ingest/http.rs
use std::time::Duration;

use metrics::counter;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use super::retry::RetryPolicy;
use super::types::SourceError;

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; DigestCourier/1.0)";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared GET helper: bounded timeout, status validation and retry for every provider.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> anyhow::Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            timeout,
            retry,
        })
    }

    /// GET `url` and return the response once it has a 2xx status.
    ///
    /// The per-request timeout covers connect + body and is dropped with the
    /// request future on every exit path.
    pub async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<Response, SourceError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let mut req = self.client.get(url).timeout(self.timeout);
            for (name, value) in headers {
                req = req.header(*name, *value);
            }

            let err = match req.send().await {
                Ok(rsp) if rsp.status().is_success() => return Ok(rsp),
                Ok(rsp) => SourceError::Status(rsp.status().as_u16()),
                Err(e) if e.is_timeout() => SourceError::Timeout,
                Err(e) => SourceError::Transport(e.to_string()),
            };

            match self.retry.next_delay(attempt, &err) {
                Some(delay) => {
                    tracing::debug!(%url, attempt, error = %err, ?delay, "retrying upstream call");
                    tokio::time::sleep(delay).await;
                }
                None => {
                    counter!("source_errors_total").increment(1);
                    return Err(err);
                }
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let rsp = self.get(url, headers).await?;
        let bytes = rsp
            .bytes()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| SourceError::Payload(e.to_string()))
    }

    pub async fn get_text(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, SourceError> {
        let rsp = self.get(url, headers).await?;
        rsp.text()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))
    }
}
