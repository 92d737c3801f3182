#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use chrono::Utc;
use crystaltides::router::init_router;
use crystaltides::state::AppState;
use crystaltides_auth::{AccessTokenClaims, AppMetadata, UserMetadata};
use crystaltides_config::{AuthConfig, RateLimitConfig};
use crystaltides_db::Database;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-supabase-secret";
pub const ADMIN_SECRET: &str = "test-admin-secret";

pub fn auth_config() -> AuthConfig {
    AuthConfig::with_secrets(JWT_SECRET, ADMIN_SECRET)
}

/// Memory-backed state with rate limiting switched off.
pub fn test_state() -> AppState {
    state_with_db(Database::memory())
}

pub fn state_with_db(db: Database) -> AppState {
    AppState::new(db, auth_config()).with_rate_limits(RateLimitConfig::disabled())
}

pub fn test_app() -> (Router, AppState) {
    let state = test_state();
    (init_router(state.clone()), state)
}

/// An access token as the auth provider would sign it.
pub fn token_for(id: Uuid, role: &str) -> String {
    let claims = AccessTokenClaims {
        sub: id.to_string(),
        email: Some(format!("{role}@crystaltides.test")),
        role: Some("authenticated".to_string()),
        aud: Some("authenticated".to_string()),
        exp: (Utc::now().timestamp() + 3600) as usize,
        iat: Some(Utc::now().timestamp() as usize),
        app_metadata: AppMetadata {
            role: Some(role.to_string()),
            provider: Some("email".to_string()),
        },
        user_metadata: UserMetadata {
            username: Some(format!("{role}_player")),
            ..UserMetadata::default()
        },
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn token(role: &str) -> String {
    token_for(Uuid::new_v4(), role)
}

pub struct TestRequest {
    method: Method,
    uri: String,
    token: Option<String>,
    headers: Vec<(&'static str, String)>,
    body: Option<Value>,
}

impl TestRequest {
    pub fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            token: None,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn patch(uri: &str) -> Self {
        Self::new(Method::PATCH, uri)
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub async fn send(self, app: &Router) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if let Some(token) = &self.token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        for (name, value) in &self.headers {
            builder = builder.header(*name, value);
        }
        let body = match &self.body {
            Some(body) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(body).unwrap())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        send_response(response).await
    }
}

pub async fn send_response(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}
