//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use tower::ServiceExt;

use gatekeeper::config::GatekeeperConfig;

pub const JWT_SECRET: &str = "integration-secret";

/// Defaults with a known JWT secret and a small local cap.
///
/// Forwarded headers are trusted: oneshot requests carry no peer address,
/// so `x-forwarded-for` is the only caller key available.
pub fn test_config(capacity: u32) -> GatekeeperConfig {
    let mut config = GatekeeperConfig::default();
    config.auth.jwt.secret = Some(JWT_SECRET.to_string());
    config.client_ip.trust_forwarded_headers = true;
    config.rate_limit.capacity = capacity;
    config.rate_limit.window_ms = 60_000;
    config
}

pub fn sign_jwt(secret: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = serde_json::json!({ "sub": "anyone", "iat": now, "exp": now + 600 });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Reply {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Drive one request through `router` without a socket.
pub async fn send(router: &Router, request: Request<Body>) -> Reply {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    Reply {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

pub fn get(uri: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(uri)
}
