//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - Router backed by the in-memory organization store
//! - JWT token generation
//! - Request helper returning status and JSON body
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use stocktake_api::app::{build_router, AppState};
use stocktake_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use stocktake_shared::auth::jwt::{create_token, Claims};
use stocktake_shared::store::InMemoryOrganizationStore;
use stocktake_shared::vision::{ImageSource, VisionError, VisionModel};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Vision model returning a fixed answer
pub struct StubVisionModel {
    pub response: Result<String, String>,
}

#[async_trait]
impl VisionModel for StubVisionModel {
    async fn complete(&self, _prompt: &str, _image: &ImageSource) -> Result<String, VisionError> {
        self.response
            .clone()
            .map_err(|body| VisionError::Api { status: 500, body })
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<InMemoryOrganizationStore>,
    pub app: axum::Router,
    pub config: Config,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: Vec::new(),
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
        },
        openai: None,
    }
}

impl TestContext {
    /// Creates a context without image scanning
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates a context whose vision model answers with `response`
    pub fn with_vision(response: Result<&str, &str>) -> Self {
        let model: Arc<dyn VisionModel> = Arc::new(StubVisionModel {
            response: response.map(str::to_string).map_err(str::to_string),
        });
        Self::build(Some(model))
    }

    fn build(vision: Option<Arc<dyn VisionModel>>) -> Self {
        let store = Arc::new(InMemoryOrganizationStore::new());
        let config = test_config();
        let app = build_router(AppState::new(store.clone(), vision, config.clone()));

        Self { store, app, config }
    }

    /// Returns a bearer header value for `user_id`
    pub fn auth_header(&self, user_id: Uuid) -> String {
        let token = create_token(&Claims::new(user_id), &self.config.jwt.secret)
            .expect("Failed to create token");
        format!("Bearer {}", token)
    }

    /// Sends a request as `user` (unauthenticated when `None`)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(user_id) = user {
            builder = builder.header(header::AUTHORIZATION, self.auth_header(user_id));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// Creates an organization owned by a fresh user; returns the owner and invite code
    pub async fn create_organization(&self, name: &str) -> (Uuid, String) {
        let owner = Uuid::new_v4();
        let (status, body) = self
            .send(
                Method::POST,
                "/api/organization",
                Some(owner),
                Some(serde_json::json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create failed: {}", body);

        let code = body["inviteCode"].as_str().unwrap().to_string();
        (owner, code)
    }

    /// Joins the organization with `code` as a fresh user
    pub async fn join(&self, code: &str) -> Uuid {
        let user = Uuid::new_v4();
        let (status, body) = self
            .send(
                Method::POST,
                "/api/organization/join",
                Some(user),
                Some(serde_json::json!({ "inviteCode": code })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "join failed: {}", body);
        user
    }
}
