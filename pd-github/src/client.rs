//! HTTP JSON transport for the GitHub REST API.
//!
//! Every call issues exactly one GET request. There is no retry or
//! pagination handling; non-success statuses surface as `HttpStatus` errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::debug;

use pd_core::config::GithubConfig;
use pd_core::error::{PdError, PdResult};

/// Media type GitHub recommends for REST requests.
pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Something that can fetch a URL and decode its body as JSON.
#[async_trait]
pub trait JsonSource: Send + Sync {
    /// Fetch `url` and return the decoded body.
    async fn get_json(&self, url: &str) -> PdResult<Value>;
}

/// [`JsonSource`] backed by a reqwest client.
#[derive(Clone)]
pub struct HttpJsonSource {
    inner: Client,
}

impl HttpJsonSource {
    /// Create a source sending the configured user agent and timeout.
    pub fn new(config: &GithubConfig) -> PdResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| PdError::Config(format!("invalid github user agent: {e}")))?,
        );

        let inner = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| PdError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { inner })
    }

    /// Map non-success statuses to an error naming the URL.
    fn check_status(response: Response, url: &str) -> PdResult<Response> {
        let status = response.status();
        if !status.is_success() {
            return Err(PdError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    /// Classify a reqwest error into a PdError variant.
    fn classify_error(e: reqwest::Error) -> PdError {
        if e.is_timeout() {
            PdError::Timeout(e.to_string())
        } else if e.is_connect() {
            PdError::Http(format!("connection failed: {e}"))
        } else if e.is_decode() {
            PdError::Serialization(format!("invalid JSON body: {e}"))
        } else {
            PdError::Http(e.to_string())
        }
    }
}

#[async_trait]
impl JsonSource for HttpJsonSource {
    async fn get_json(&self, url: &str) -> PdResult<Value> {
        debug!("GET {url}");
        let response = self.inner.get(url).send().await.map_err(Self::classify_error)?;
        let response = Self::check_status(response, url)?;
        response.json::<Value>().await.map_err(Self::classify_error)
    }
}

/// Fetch `url` once with a default-configured client.
pub async fn get_json(url: &str) -> PdResult<Value> {
    HttpJsonSource::new(&GithubConfig::default())?.get_json(url).await
}
