//! Rate limiting middleware.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::request::RequestIdExt;
use crate::observability::metrics;
use crate::security::client_ip::derive_caller_key;
use crate::security::rate_limit::{now_ms, Decision, RateLimiter};

/// State for the rate limit layer.
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: Arc<dyn RateLimiter>,
    pub trust_forwarded_headers: bool,
}

/// Reject callers over their per-window cap with `429`.
///
/// Requests without a derivable caller key pass through unlimited.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let Some(key) = derive_caller_key(request.headers(), peer, state.trust_forwarded_headers) else {
        return next.run(request).await;
    };

    match state.limiter.admit(&key, now_ms()).await {
        Decision::Admit => next.run(request).await,
        Decision::Reject { retry_after } => {
            tracing::warn!(
                request_id = %request.request_id(),
                client = %key,
                backend = state.limiter.backend(),
                "Rate limit exceeded"
            );
            metrics::record_rate_limited(state.limiter.backend());
            too_many_requests(retry_after)
        }
    }
}

/// The single rejection shape of this layer.
pub fn too_many_requests(retry_after: Duration) -> Response {
    let mut response = Response::new(Body::from("Too Many Requests"));
    *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
    let headers = response.headers_mut();
    headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after.as_secs()));
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
