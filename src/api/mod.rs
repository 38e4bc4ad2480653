//! HTTP client for the Bella backend REST API.

use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::logging::{self, obj, v_str, Domain};

pub mod behaviors;
pub mod images;
pub mod logs;
pub mod retry;

pub use behaviors::BehaviorApi;
pub use images::ImageApi;
pub use logs::LogsApi;

use retry::{retry_async, RetryConfig};

/// Non-2xx answer from the backend.
#[derive(Debug, Clone)]
pub struct HttpStatusError {
    pub status: u16,
    pub body: String,
}

impl fmt::Display for HttpStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "backend returned {}: {}", self.status, self.body)
    }
}

impl std::error::Error for HttpStatusError {}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base: String,
    retry: RetryConfig,
}

impl ApiClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, &cfg.api_base))
    }

    pub fn with_client(client: Client, base: &str) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Absolute URL for an API path such as `/api/logs`.
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base, path)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// GET with retries; only for idempotent reads.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let (client, url) = (&self.client, url.as_str());
        retry_async(&self.retry, path, || async move {
            let resp = client.get(url).send().await?;
            read_json(url, resp).await
        })
        .await
    }

    /// Send a write request once and decode the JSON answer.
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder, path: &str) -> Result<T> {
        let url = self.url(path);
        let resp = req.send().await?;
        read_json(&url, resp).await
    }
}

/// Join a base and a path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub(crate) async fn read_json<T: DeserializeOwned>(url: &str, resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        logging::warn(
            Domain::Api,
            "http_error",
            obj(&[("url", v_str(url)), ("status", serde_json::json!(status.as_u16()))]),
        );
        return Err(HttpStatusError { status: status.as_u16(), body }.into());
    }
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| anyhow!("bad response from {}: {}", url, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://h:8000/", "/api/logs"), "http://h:8000/api/logs");
        assert_eq!(join_url("http://h:8000", "api/logs"), "http://h:8000/api/logs");
    }

    #[test]
    fn test_client_strips_trailing_slash() {
        let api = ApiClient::with_client(Client::new(), "http://localhost:8000//");
        assert_eq!(api.base(), "http://localhost:8000");
        assert_eq!(api.url("/api/behaviors/config"), "http://localhost:8000/api/behaviors/config");
    }

    #[test]
    fn test_status_error_message() {
        let err = HttpStatusError { status: 502, body: "upstream".into() };
        assert_eq!(err.to_string(), "backend returned 502: upstream");
    }
}
