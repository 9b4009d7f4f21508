//! Gate middleware, applied to a router by [`Gate`](crate::http::gate::Gate).

pub mod auth;
pub mod rate_limit;

pub use auth::auth_middleware;
pub use rate_limit::{rate_limit_middleware, too_many_requests, RateLimitState};
