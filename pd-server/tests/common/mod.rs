//! Shared test utilities for API tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use pd_core::config::AppConfig;
use pd_models::User;
use pd_server::{build_router, AppState};
use pd_services::{NewUser, Services};

/// A config with a fixed signing secret and no access window.
pub fn create_test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "api-test-secret".into();
    config.middleware.enforce_access_window = false;
    config
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(create_test_config())
    }

    pub fn with_config(mut config: AppConfig) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        config.database.path = dir.path().join("api.db").to_string_lossy().into_owned();
        let state = Arc::new(AppState::open(&config).expect("failed to open test state"));
        let router = build_router(state.clone(), &config.server.cors_origins);
        Self { router, state, _dir: dir }
    }

    pub fn services(&self) -> &Services {
        &self.state.services
    }

    /// Register a user with password `password` and the given role.
    pub fn register(&self, username: &str, role: Option<&str>) -> User {
        let mut new = NewUser::new(username, &format!("{username}@example.com"), "password");
        new.role = role.map(str::to_string);
        self.services().users.register(new).expect("failed to register user")
    }

    /// Register a guest and return it with an access token.
    pub fn login(&self, username: &str) -> (User, String) {
        let user = self.register(username, None);
        let token = self.token_for(username);
        (user, token)
    }

    pub fn token_for(&self, username: &str) -> String {
        self.services()
            .auth
            .login(username, "password")
            .expect("failed to log in")
            .access
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }
}
