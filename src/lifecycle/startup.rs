//! Startup orchestration.
//!
//! Builds the gate from configuration in dependency order: credential
//! collaborators, resolver, then the rate limiter. Any failure is fatal.

use std::sync::Arc;

use thiserror::Error;

use crate::auth::{
    AuthResolver, JwtKeyError, JwtPublicVerifier, MemorySessionStore, MemoryTokenStore,
    StaticUserDirectory, UserRecord,
};
use crate::config::GatekeeperConfig;
use crate::http::gate::Gate;
use crate::http::middleware::RateLimitState;
use crate::security::rate_limit::{build_limiter, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("JWT verifier: {0}")]
    Jwt(#[from] JwtKeyError),

    #[error("rate limit store: {0}")]
    Store(#[from] StoreError),
}

/// Collaborators built from configuration, kept so callers can seed them.
pub struct Services {
    pub sessions: Arc<MemorySessionStore>,
    pub tokens: Arc<MemoryTokenStore>,
    pub users: Arc<StaticUserDirectory>,
    pub gate: Gate,
}

pub async fn build_services(config: &GatekeeperConfig) -> Result<Services, StartupError> {
    let auth = &config.auth;

    let sessions = Arc::new(MemorySessionStore::new(auth.session_cookie.clone()));
    let users = Arc::new(StaticUserDirectory::from_config(&auth.owner));

    let tokens = Arc::new(MemoryTokenStore::new(
        auth.custom_token_prefix.clone(),
        auth.custom_token_length,
    ));
    for api_token in &auth.api_tokens {
        let user = match &api_token.username {
            Some(username) if *username != users.owner().username => UserRecord {
                id: username.clone(),
                username: username.clone(),
                name: username.clone(),
                is_owner: false,
            },
            _ => users.owner().clone(),
        };
        tokens.insert(api_token.token.clone(), user);
    }

    let jwt = Arc::new(JwtPublicVerifier::from_config(&auth.jwt)?);

    let resolver = Arc::new(AuthResolver::new(
        sessions.clone(),
        tokens.clone(),
        jwt,
        users.clone(),
    ));

    let rate_limit = if config.rate_limit.enabled {
        let limiter = build_limiter(&config.rate_limit, &config.redis).await?;
        tracing::info!(
            backend = limiter.backend(),
            capacity = config.rate_limit.capacity,
            window_ms = config.rate_limit.window_ms,
            "Rate limiter ready"
        );
        Some(RateLimitState {
            limiter,
            trust_forwarded_headers: config.client_ip.trust_forwarded_headers,
        })
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    tracing::info!(
        api_tokens = tokens.len(),
        order = ?config.gate.order,
        "Gate configured"
    );

    Ok(Services {
        sessions,
        tokens,
        users,
        gate: Gate::new(resolver, rate_limit, config.gate.order),
    })
}
