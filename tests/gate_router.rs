//! Router-level tests of the gate: identity resolution and rate limiting
//! driven through the real middleware stack.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, StatusCode};
use axum::Router;

use gatekeeper::auth::{
    AuthResolver, CollaboratorError, MemorySessionStore, MemoryTokenStore, Session, SessionUser,
    UserDirectory, UserRecord,
};
use gatekeeper::auth::JwtPublicVerifier;
use gatekeeper::config::{GateOrder, JwtConfig};
use gatekeeper::http::middleware::RateLimitState;
use gatekeeper::http::{Gate, GatekeeperServer, X_REQUEST_ID};
use gatekeeper::lifecycle::build_services;
use gatekeeper::security::rate_limit::{
    CounterStore, DistributedRateLimiter, LocalRateLimiter, MemoryCounterStore, StoreError,
};

mod common;

use common::{get, send, sign_jwt, test_config, JWT_SECRET};

async fn default_router(capacity: u32) -> (Router, gatekeeper::lifecycle::Services) {
    let config = test_config(capacity);
    let services = build_services(&config).await.unwrap();
    let router = GatekeeperServer::new(config, services.gate.clone()).router();
    (router, services)
}

#[tokio::test]
async fn test_guest_without_credentials() {
    let (router, _) = default_router(50).await;

    let reply = send(&router, get("/whoami").body(Body::empty()).unwrap()).await;

    assert_eq!(reply.status, StatusCode::OK);
    let ctx = reply.json();
    assert_eq!(ctx["is_guest"], true);
    assert_eq!(ctx["is_authenticated"], false);
    assert!(ctx["user"].is_null());
    assert!(ctx["caller_id"].is_null());
}

#[tokio::test]
async fn test_owner_session_cookie() {
    let (router, services) = default_router(50).await;
    services.sessions.insert(
        "owner-session",
        Session {
            user: Some(SessionUser {
                id: Some("owner".into()),
                is_owner: true,
            }),
        },
    );

    let request = get("/whoami")
        .header(header::COOKIE, "session=owner-session")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let ctx = send(&router, request).await.json();

    assert_eq!(ctx["is_authenticated"], true);
    assert_eq!(ctx["is_guest"], false);
    assert_eq!(ctx["user"]["id"], "owner");
    assert_eq!(ctx["user"]["is_owner"], true);
    assert_eq!(ctx["token"], "Bearer not-a-jwt");
}

#[tokio::test]
async fn test_bearer_jwt_in_header_and_query() {
    let (router, _) = default_router(50).await;
    let jwt = sign_jwt(JWT_SECRET);

    let request = get("/whoami")
        .header(header::AUTHORIZATION, format!("Bearer {jwt}"))
        .body(Body::empty())
        .unwrap();
    let ctx = send(&router, request).await.json();
    assert_eq!(ctx["is_authenticated"], true);
    assert_eq!(ctx["user"]["username"], "owner");
    assert_eq!(ctx["token"], format!("Bearer {jwt}"));

    let request = get(&format!("/whoami?token={jwt}")).body(Body::empty()).unwrap();
    let ctx = send(&router, request).await.json();
    assert_eq!(ctx["is_authenticated"], true);
    assert_eq!(ctx["token"], jwt);
}

#[tokio::test]
async fn test_jwt_signed_with_other_key_is_guest() {
    let (router, _) = default_router(50).await;
    let request = get("/whoami")
        .header(header::AUTHORIZATION, format!("Bearer {}", sign_jwt("wrong")))
        .body(Body::empty())
        .unwrap();

    let reply = send(&router, request).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["is_guest"], true);
}

#[tokio::test]
async fn test_reader_session_keeps_caller_id() {
    let (router, services) = default_router(50).await;
    services.sessions.insert(
        "reader-session",
        Session {
            user: Some(SessionUser {
                id: Some("reader-7".into()),
                is_owner: false,
            }),
        },
    );

    let request = get("/whoami")
        .header(header::COOKIE, "session=reader-session")
        .body(Body::empty())
        .unwrap();
    let ctx = send(&router, request).await.json();

    assert_eq!(ctx["is_guest"], true);
    assert_eq!(ctx["caller_id"], "reader-7");
}

#[tokio::test]
async fn test_rate_limit_rejection_shape() {
    let (router, _) = default_router(3).await;
    let request = || {
        get("/whoami")
            .header("x-forwarded-for", "203.0.113.50")
            .body(Body::empty())
            .unwrap()
    };

    for _ in 0..3 {
        assert_eq!(send(&router, request()).await.status, StatusCode::OK);
    }
    let reply = send(&router, request()).await;

    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(reply.headers[header::RETRY_AFTER], "1");
    assert_eq!(reply.body, "Too Many Requests");

    // Another caller is unaffected.
    let other = get("/whoami")
        .header("x-forwarded-for", "203.0.113.51")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&router, other).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_forwarded_headers_ignored_by_default() {
    let mut config = test_config(2);
    config.client_ip = Default::default();
    let services = build_services(&config).await.unwrap();
    let router = GatekeeperServer::new(config, services.gate.clone()).router();
    let peer: SocketAddr = "198.51.100.9:40000".parse().unwrap();

    let mut statuses = Vec::new();
    for i in 0..20 {
        let mut request = get("/whoami")
            .header("x-forwarded-for", format!("203.0.113.{i}"))
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        statuses.push(send(&router, request).await.status);
    }

    let admitted = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    assert_eq!(admitted, 2);
    assert!(statuses[2..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_request_without_caller_key_is_not_limited() {
    // oneshot requests carry no connect info.
    let (router, _) = default_router(1).await;
    for _ in 0..5 {
        let reply = send(&router, get("/whoami").body(Body::empty()).unwrap()).await;
        assert_eq!(reply.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (router, _) = default_router(50).await;

    let reply = send(&router, get("/").body(Body::empty()).unwrap()).await;
    assert!(reply.headers.contains_key(X_REQUEST_ID));

    let request = get("/")
        .header(X_REQUEST_ID, "client-chosen")
        .body(Body::empty())
        .unwrap();
    let reply = send(&router, request).await;
    assert_eq!(reply.headers[X_REQUEST_ID], "client-chosen");
}

struct BrokenDirectory;

#[async_trait]
impl UserDirectory for BrokenDirectory {
    async fn get_owner(&self) -> Result<UserRecord, CollaboratorError> {
        Err(CollaboratorError::Unavailable("user database down".into()))
    }
}

fn broken_owner_gate(order: GateOrder) -> Router {
    let config = test_config(1);
    let resolver = Arc::new(AuthResolver::new(
        Arc::new(MemorySessionStore::new("session")),
        Arc::new(MemoryTokenStore::new("txo", 40)),
        Arc::new(
            JwtPublicVerifier::from_config(&JwtConfig {
                algorithm: "HS256".into(),
                secret: Some(JWT_SECRET.into()),
                public_key_path: None,
            })
            .unwrap(),
        ),
        Arc::new(BrokenDirectory),
    ));
    let limiter = RateLimitState {
        limiter: Arc::new(LocalRateLimiter::new(1, 60_000, Duration::from_secs(1), 1000)),
        trust_forwarded_headers: true,
    };
    let gate = Gate::new(resolver, Some(limiter), order);
    GatekeeperServer::new(config, gate).router()
}

#[tokio::test]
async fn test_owner_lookup_failure_is_internal_error() {
    let router = broken_owner_gate(GateOrder::RateLimitFirst);
    let request = get("/whoami")
        .header(header::AUTHORIZATION, sign_jwt(JWT_SECRET))
        .body(Body::empty())
        .unwrap();

    let reply = send(&router, request).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_gate_order() {
    let jwt = sign_jwt(JWT_SECRET);
    let request = || {
        get("/whoami")
            .header("x-forwarded-for", "198.51.100.20")
            .header(header::AUTHORIZATION, jwt.clone())
            .body(Body::empty())
            .unwrap()
    };

    // The limiter sees the second request first and rejects it.
    let router = broken_owner_gate(GateOrder::RateLimitFirst);
    send(&router, request()).await;
    assert_eq!(send(&router, request()).await.status, StatusCode::TOO_MANY_REQUESTS);

    // Auth fails before the limiter is reached, so nothing is ever counted.
    let router = broken_owner_gate(GateOrder::AuthFirst);
    for _ in 0..3 {
        assert_eq!(
            send(&router, request()).await.status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

struct DownStore;

#[async_trait]
impl CounterStore for DownStore {
    async fn increment(&self, _key: &str) -> Result<i64, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn set_expiry(&self, _key: &str, _ttl_ms: u64) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

async fn distributed_router(store: Arc<dyn CounterStore>, capacity: u32) -> Router {
    let config = test_config(capacity);
    let services = build_services(&config).await.unwrap();
    let limiter = RateLimitState {
        limiter: Arc::new(DistributedRateLimiter::from_config(
            store,
            &config.rate_limit,
            &config.redis,
        )),
        trust_forwarded_headers: true,
    };
    let gate = Gate::new(services.gate.resolver().clone(), Some(limiter), GateOrder::RateLimitFirst);
    GatekeeperServer::new(config, gate).router()
}

#[tokio::test]
async fn test_distributed_limiter_shared_between_instances() {
    let store: Arc<dyn CounterStore> = Arc::new(MemoryCounterStore::new());
    let first = distributed_router(store.clone(), 4).await;
    let second = distributed_router(store, 4).await;
    let request = || {
        get("/whoami")
            .header("x-forwarded-for", "192.0.2.77")
            .body(Body::empty())
            .unwrap()
    };

    for router in [&first, &second, &first, &second] {
        assert_eq!(send(router, request()).await.status, StatusCode::OK);
    }
    assert_eq!(send(&first, request()).await.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(send(&second, request()).await.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_distributed_limiter_fails_open() {
    let router = distributed_router(Arc::new(DownStore), 1).await;
    for _ in 0..10 {
        let request = get("/whoami")
            .header("x-forwarded-for", "192.0.2.78")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&router, request).await.status, StatusCode::OK);
    }
}
