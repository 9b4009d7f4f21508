//! Contracts the resolver needs from the outside world.
//!
//! Session storage, token issuance and the user model live elsewhere; the
//! gate only ever asks these questions.

use async_trait::async_trait;
use axum::http::HeaderMap;
use thiserror::Error;

use crate::auth::context::{Session, UserRecord};

/// Failure reported by an external collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("collaborator returned an invalid response: {0}")]
    Invalid(String),

    #[error("record not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Find the session attached to a request, if any.
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, CollaboratorError>;
}

#[async_trait]
pub trait CustomTokenVerifier: Send + Sync {
    /// Cheap shape check; no I/O.
    fn is_custom_token(&self, token: &str) -> bool;

    async fn verify_custom_token(
        &self,
        token: &str,
    ) -> Result<(bool, Option<UserRecord>), CollaboratorError>;
}

#[async_trait]
pub trait JwtVerifier: Send + Sync {
    /// Signature (and registered claim) verification only.
    async fn verify(&self, jwt: &str) -> Result<bool, CollaboratorError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve the single privileged account.
    async fn get_owner(&self) -> Result<UserRecord, CollaboratorError>;
}
