//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build collaborators → Build gate → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     SIGINT/SIGTERM → broadcast → server stops accepting → drain → exit
//! ```

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_services, Services, StartupError};
