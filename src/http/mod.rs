//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, connect info)
//!     → request.rs (request ID)
//!     → gate.rs (rate limit and auth layers, configured order)
//!     → application handlers (read RequestContext)
//! ```

pub mod gate;
pub mod middleware;
pub mod request;
pub mod server;

pub use gate::Gate;
pub use request::{MakeRequestUuidV4, RequestIdExt, X_REQUEST_ID};
pub use server::GatekeeperServer;
