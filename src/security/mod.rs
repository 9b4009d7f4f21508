//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → client_ip.rs (derive caller key; none means no limiting)
//!     → rate_limit/ (admit or reject, local or shared counters)
//!     → Pass to the auth layer / handlers
//! ```
//!
//! # Design Decisions
//! - Hard per-window cap, no queuing or backoff escalation
//! - Shared store outages fail open: limiting protects, it does not guard
//! - No trust in forwarded headers unless configured

pub mod client_ip;
pub mod rate_limit;

pub use client_ip::derive_caller_key;
pub use rate_limit::{Decision, RateLimiter};
