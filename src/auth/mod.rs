//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (headers + query)
//!     → resolver.rs (session → custom token → bearer JWT)
//!     → credential.rs (token extraction, shape checks)
//!     → collaborators.rs (session store, verifiers, user directory)
//!     → RequestContext inserted into request extensions
//! ```
//!
//! # Design Decisions
//! - Credential failures never surface: the caller becomes a guest
//! - A valid JWT always means the owner account
//! - Owner lookup failures fail closed (500), never downgrade to guest

pub mod collaborators;
pub mod context;
pub mod credential;
pub mod directory;
pub mod jwt;
pub mod resolver;
pub mod session;
pub mod token;

pub use collaborators::{
    CollaboratorError, CustomTokenVerifier, JwtVerifier, SessionStore, UserDirectory,
};
pub use context::{RequestContext, Session, SessionUser, UserRecord};
pub use directory::StaticUserDirectory;
pub use jwt::{JwtKeyError, JwtPublicVerifier};
pub use resolver::{AuthError, AuthResolver};
pub use session::MemorySessionStore;
pub use token::MemoryTokenStore;
