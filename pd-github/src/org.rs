//! GitHub organisation client.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use pd_core::config::GithubConfig;
use pd_core::constants::GITHUB_API_BASE;
use pd_core::error::{PdError, PdResult};

use crate::client::{HttpJsonSource, JsonSource};
use crate::memo::Memo;
use crate::nested::access_nested_map;

/// Client for one GitHub organisation.
///
/// The organisation payload is fetched once per client and cached. The
/// repository list is fetched on every [`public_repos`](Self::public_repos) call.
pub struct GithubOrgClient {
    org_name: String,
    api_base: String,
    source: Arc<dyn JsonSource>,
    org: Memo<Value>,
}

impl GithubOrgClient {
    /// Create a client fetching through `source` from the public API.
    pub fn new(org_name: &str, source: Arc<dyn JsonSource>) -> Self {
        Self {
            org_name: org_name.to_string(),
            api_base: GITHUB_API_BASE.to_string(),
            source,
            org: Memo::new(),
        }
    }

    /// Create a client with an HTTP source built from configuration.
    pub fn from_config(org_name: &str, config: &GithubConfig) -> PdResult<Self> {
        let source = Arc::new(HttpJsonSource::new(config)?);
        Ok(Self::new(org_name, source).with_api_base(&config.api_base))
    }

    /// Use a different API base URL.
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn org_name(&self) -> &str {
        &self.org_name
    }

    /// `{api_base}/orgs/{org}`.
    pub fn org_url(&self) -> String {
        format!("{}/orgs/{}", self.api_base, self.org_name)
    }

    /// The organisation payload, fetched on first access.
    pub async fn org(&self) -> PdResult<&Value> {
        self.org
            .get_or_try_init(|| async move {
                let url = self.org_url();
                debug!("fetching organisation {}", self.org_name);
                self.source.get_json(&url).await
            })
            .await
    }

    /// `repos_url` of the organisation, or an empty string when absent.
    pub async fn public_repos_url(&self) -> PdResult<String> {
        let org = self.org().await?;
        Ok(org
            .get("repos_url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    /// Names of the organisation's public repositories in payload order.
    ///
    /// With `license`, only repositories whose license key equals it are kept.
    /// Returns an empty list without a request when there is no repos URL.
    pub async fn public_repos(&self, license: Option<&str>) -> PdResult<Vec<String>> {
        let repos_url = self.public_repos_url().await?;
        if repos_url.is_empty() {
            return Ok(Vec::new());
        }

        let payload = self.source.get_json(&repos_url).await?;
        let repos = payload.as_array().ok_or_else(|| {
            PdError::Serialization(format!("expected a JSON array from {repos_url}"))
        })?;

        let mut names = Vec::with_capacity(repos.len());
        for repo in repos {
            let Some(name) = repo.get("name").and_then(Value::as_str) else {
                warn!("skipping repository entry without a name in {repos_url}");
                continue;
            };
            if license.map_or(true, |key| Self::has_license(repo, key)) {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    /// Whether `repo["license"]["key"]` equals `license_key`.
    ///
    /// False when the license is missing, not an object, or has no string key.
    pub fn has_license(repo: &Value, license_key: &str) -> bool {
        access_nested_map(repo, ["license", "key"])
            .ok()
            .and_then(Value::as_str)
            .is_some_and(|key| key == license_key)
    }
}
