//! Request gatekeeping layer: caller identity resolution and fixed window
//! rate limiting in front of application routes.

pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use auth::{AuthResolver, RequestContext};
pub use config::GatekeeperConfig;
pub use http::{Gate, GatekeeperServer};
pub use lifecycle::Shutdown;
