//! Caller identity middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::AuthResolver;
use crate::http::request::RequestIdExt;

/// Resolve the caller and attach the `RequestContext` to the request.
///
/// Never rejects for bad credentials; those callers continue as guests. An
/// owner that cannot be loaded is answered with `500`.
pub async fn auth_middleware(
    State(resolver): State<Arc<AuthResolver>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match resolver.resolve(request.headers(), request.uri()).await {
        Ok(ctx) => {
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(e) => {
            tracing::error!(request_id = %request.request_id(), error = %e, "Identity resolution failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
