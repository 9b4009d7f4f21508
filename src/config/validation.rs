//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and cross-field
//! requirements. Every problem is reported, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{GatekeeperConfig, JwtConfig, RateLimitBackend, PLACEHOLDER_JWT_SECRET};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &GatekeeperConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    let rl = &config.rate_limit;
    if rl.capacity == 0 {
        errors.push(ValidationError::new("rate_limit.capacity", "must be > 0"));
    }
    if rl.window_ms == 0 {
        errors.push(ValidationError::new("rate_limit.window_ms", "must be > 0"));
    }
    if rl.sweep_every == 0 {
        errors.push(ValidationError::new("rate_limit.sweep_every", "must be > 0"));
    }
    if rl.retry_after_secs == 0 {
        errors.push(ValidationError::new("rate_limit.retry_after_secs", "must be >= 1"));
    }
    if rl.enabled && rl.backend == RateLimitBackend::Distributed {
        if url::Url::parse(&config.redis.url).is_err() {
            errors.push(ValidationError::new("redis.url", "not a valid URL"));
        }
        if rl.key_prefix.is_empty() {
            errors.push(ValidationError::new("rate_limit.key_prefix", "must not be empty"));
        }
        if config.redis.command_timeout_ms == 0 {
            errors.push(ValidationError::new("redis.command_timeout_ms", "must be > 0"));
        }
    }

    let auth = &config.auth;
    if auth.custom_token_prefix.is_empty() {
        errors.push(ValidationError::new("auth.custom_token_prefix", "must not be empty"));
    }
    for token in &auth.api_tokens {
        // Same measure as the custom token shape check: characters after the prefix.
        let Some(body) = token
            .token
            .strip_prefix(auth.custom_token_prefix.as_str())
            .filter(|body| body.chars().count() == auth.custom_token_length)
        else {
            errors.push(ValidationError::new(
                "auth.api_tokens",
                format!(
                    "token must be '{}' followed by {} characters",
                    auth.custom_token_prefix, auth.custom_token_length
                ),
            ));
            continue;
        };
        if is_repeated_char(body) {
            errors.push(ValidationError::new(
                "auth.api_tokens",
                "token is a placeholder (a single repeated character)",
            ));
        }
    }
    if let Err(message) = check_jwt_key(&auth.jwt) {
        errors.push(ValidationError::new("auth.jwt", message));
    }
    if auth.owner.id.is_empty() {
        errors.push(ValidationError::new("auth.owner.id", "must not be empty"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "not a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// HMAC algorithms need a real secret, the others a public key file.
fn check_jwt_key(jwt: &JwtConfig) -> Result<(), &'static str> {
    if jwt.algorithm.starts_with("HS") {
        match jwt.secret.as_deref() {
            None | Some("") => Err("secret is required for HMAC algorithms"),
            Some(PLACEHOLDER_JWT_SECRET) => Err("secret is the sample placeholder; set a real one"),
            Some(_) => Ok(()),
        }
    } else if jwt.public_key_path.is_none() {
        Err("public_key_path is required for asymmetric algorithms")
    } else {
        Ok(())
    }
}

fn is_repeated_char(body: &str) -> bool {
    let mut chars = body.chars();
    match chars.next() {
        Some(first) => chars.all(|c| c == first),
        None => false,
    }
}
