//! Shared fixtures for the GitHub client integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pd_core::error::{PdError, PdResult};
use pd_github::JsonSource;
use serde_json::{json, Value};

/// One organisation: its payload, its repos payload, and the expected names.
pub struct OrgFixture {
    pub org: &'static str,
    pub org_payload: Value,
    pub repos_payload: Value,
    pub expected_repos: Vec<&'static str>,
    pub apache2_repos: Vec<&'static str>,
}

pub fn google() -> OrgFixture {
    OrgFixture {
        org: "google",
        org_payload: json!({
            "login": "google",
            "id": 1342004,
            "repos_url": "https://api.github.com/orgs/google/repos",
        }),
        repos_payload: json!([
            {"name": "protobuf", "license": {"key": "apache-2.0"}},
            {"name": "pytype", "license": {"key": "apache-2.0"}},
            {"name": "kubernetes", "license": {"key": "apache-2.0"}},
            {"name": "nomulus", "license": {"key": "apache-2.0"}},
            {"name": "google-test", "license": {"key": "bsd-3-clause"}},
            {"name": "flatbuffers", "license": {"key": "apache-2.0"}},
        ]),
        expected_repos: vec![
            "protobuf",
            "pytype",
            "kubernetes",
            "nomulus",
            "google-test",
            "flatbuffers",
        ],
        apache2_repos: vec!["protobuf", "pytype", "kubernetes", "nomulus", "flatbuffers"],
    }
}

pub fn abc() -> OrgFixture {
    OrgFixture {
        org: "abc",
        org_payload: json!({
            "login": "abc",
            "id": 12345,
            "repos_url": "https://api.github.com/orgs/abc/repos",
        }),
        repos_payload: json!([
            {"name": "repo1", "license": {"key": "mit"}},
            {"name": "repo2", "license": {"key": "apache-2.0"}},
        ]),
        expected_repos: vec!["repo1", "repo2"],
        apache2_repos: vec!["repo2"],
    }
}

/// Every organisation fixture.
pub fn all_fixtures() -> Vec<OrgFixture> {
    vec![google(), abc()]
}

/// A [`JsonSource`] answering from a URL map and counting calls per URL.
#[derive(Default)]
pub struct FixtureSource {
    payloads: HashMap<String, Value>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FixtureSource {
    /// Serve the org and repos payloads of a fixture at their real URLs.
    pub fn for_fixture(fixture: &OrgFixture) -> Arc<Self> {
        let mut payloads = HashMap::new();
        payloads.insert(
            format!("https://api.github.com/orgs/{}", fixture.org),
            fixture.org_payload.clone(),
        );
        if let Some(url) = fixture.org_payload["repos_url"].as_str() {
            payloads.insert(url.to_string(), fixture.repos_payload.clone());
        }
        Arc::new(Self {
            payloads,
            calls: Mutex::new(HashMap::new()),
        })
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl JsonSource for FixtureSource {
    async fn get_json(&self, url: &str) -> PdResult<Value> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;
        self.payloads.get(url).cloned().ok_or_else(|| PdError::HttpStatus {
            status: 404,
            url: url.to_string(),
        })
    }
}
