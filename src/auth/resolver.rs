//! Caller identity resolution.
//!
//! Credential sources are tried in a fixed order and the first one that
//! yields an identity wins:
//!
//! ```text
//! session ──▶ token ──┬─ custom shape ──▶ custom token verifier
//!                     └─ bearer JWT ────▶ JWT verifier ──▶ owner
//! ```
//!
//! Verification failures of any kind fall through to the next source and
//! finally to guest. The one failure that escapes is the owner lookup: a
//! caller that proved it is the owner but whose record cannot be loaded is
//! answered with an error rather than downgraded.

use std::sync::Arc;

use axum::http::{HeaderMap, Uri};
use thiserror::Error;

use crate::auth::collaborators::{
    CollaboratorError, CustomTokenVerifier, JwtVerifier, SessionStore, UserDirectory,
};
use crate::auth::context::{Identity, RequestContext, UserRecord};
use crate::auth::credential::{extract_token, Credential};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("owner identity lookup failed: {0}")]
    IdentityLookup(#[source] CollaboratorError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Session,
    Token,
}

const PIPELINE: [Stage; 2] = [Stage::Session, Stage::Token];

/// Resolves a `RequestContext` from request headers and query.
///
/// Holds no mutable state; every collaborator call is an await point and any
/// number of resolutions may interleave.
#[derive(Clone)]
pub struct AuthResolver {
    sessions: Arc<dyn SessionStore>,
    custom_tokens: Arc<dyn CustomTokenVerifier>,
    jwt: Arc<dyn JwtVerifier>,
    users: Arc<dyn UserDirectory>,
}

impl AuthResolver {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        custom_tokens: Arc<dyn CustomTokenVerifier>,
        jwt: Arc<dyn JwtVerifier>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            sessions,
            custom_tokens,
            jwt,
            users,
        }
    }

    pub async fn resolve(&self, headers: &HeaderMap, uri: &Uri) -> Result<RequestContext, AuthError> {
        let mut ctx = RequestContext::guest();

        for stage in PIPELINE {
            if let Some(identity) = self.attempt(stage, headers, uri, &mut ctx).await? {
                metrics::record_auth_outcome(identity.via);
                ctx.authenticate(identity);
                break;
            }
        }

        let ctx = ctx.finalize();
        if ctx.is_guest {
            metrics::record_auth_outcome(if ctx.caller_id.is_some() { "reader" } else { "guest" });
        }
        tracing::debug!(
            caller_id = ?ctx.caller_id,
            authenticated = ctx.is_authenticated,
            "Caller resolved"
        );
        Ok(ctx)
    }

    async fn attempt(
        &self,
        stage: Stage,
        headers: &HeaderMap,
        uri: &Uri,
        ctx: &mut RequestContext,
    ) -> Result<Option<Identity>, AuthError> {
        match stage {
            Stage::Session => self.from_session(headers, uri, ctx).await,
            Stage::Token => self.from_token(headers, uri).await,
        }
    }

    async fn from_session(
        &self,
        headers: &HeaderMap,
        uri: &Uri,
        ctx: &mut RequestContext,
    ) -> Result<Option<Identity>, AuthError> {
        let session = match self.sessions.get_session(headers).await {
            Ok(Some(session)) => session,
            Ok(None) => return Ok(None),
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed, continuing without session");
                return Ok(None);
            }
        };

        let Some(user) = session.user else {
            return Ok(None);
        };
        ctx.caller_id = user.id;

        if !user.is_owner {
            return Ok(None);
        }

        Ok(Some(Identity {
            user: self.owner().await?,
            token: extract_token(headers, uri),
            via: "session",
        }))
    }

    async fn from_token(&self, headers: &HeaderMap, uri: &Uri) -> Result<Option<Identity>, AuthError> {
        let Some(raw) = extract_token(headers, uri) else {
            return Ok(None);
        };

        match Credential::classify(&raw, self.custom_tokens.as_ref()) {
            Some(Credential::CustomToken(token)) => {
                match self.custom_tokens.verify_custom_token(token).await {
                    Ok((true, Some(user))) => Ok(Some(Identity {
                        user,
                        token: Some(raw.clone()),
                        via: "custom_token",
                    })),
                    Ok((true, None)) => {
                        tracing::warn!("Custom token verified without a user record, ignoring");
                        Ok(None)
                    }
                    Ok((false, _)) => Ok(None),
                    Err(e) => {
                        tracing::debug!(error = %e, "Custom token verification failed");
                        Ok(None)
                    }
                }
            }
            Some(Credential::BearerJwt { raw, jwt }) => match self.jwt.verify(jwt).await {
                Ok(true) => Ok(Some(Identity {
                    // Any valid JWT proves the single owner account.
                    user: self.owner().await?,
                    token: Some(raw.to_string()),
                    via: "jwt",
                })),
                Ok(false) => Ok(None),
                Err(e) => {
                    tracing::debug!(error = %e, "JWT verification failed");
                    Ok(None)
                }
            },
            None => {
                tracing::debug!("Presented token is neither a custom token nor a JWT");
                Ok(None)
            }
        }
    }

    async fn owner(&self) -> Result<UserRecord, AuthError> {
        self.users.get_owner().await.map_err(|e| {
            tracing::error!(error = %e, "Owner record lookup failed");
            AuthError::IdentityLookup(e)
        })
    }
}
