//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gatekeeper.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gatekeeper.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatekeeperConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Order in which the gate layers run.
    pub gate: GateConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Shared store used by the distributed limiter.
    pub redis: RedisConfig,

    /// Caller key extraction.
    pub client_ip: ClientIpConfig,

    /// Credential sources and the owner account.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Which gate layer sees the request first.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GateOrder {
    #[default]
    RateLimitFirst,
    AuthFirst,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    pub order: GateOrder,
}

/// Rate limiter implementation to use.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitBackend {
    /// In-process counters, one map per instance.
    #[default]
    Local,
    /// Counters in Redis shared by every instance.
    Distributed,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    pub backend: RateLimitBackend,

    /// Maximum requests per caller key per window.
    pub capacity: u32,

    /// Window length in milliseconds.
    pub window_ms: u64,

    /// Local limiter: sweep expired records every N opened windows.
    pub sweep_every: u64,

    /// Distributed limiter: extra lifetime given to a window counter.
    pub expiry_buffer_ms: u64,

    /// Value of the `Retry-After` header on rejection.
    pub retry_after_secs: u64,

    /// Distributed limiter: key namespace in the shared store.
    pub key_prefix: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: RateLimitBackend::Local,
            capacity: 50,
            window_ms: 1000,
            sweep_every: 1000,
            expiry_buffer_ms: 1000,
            retry_after_secs: 1,
            key_prefix: "rate_limit".to_string(),
        }
    }
}

/// Redis connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedisConfig {
    pub url: String,

    /// Connection establishment timeout in seconds.
    pub connection_timeout_secs: u64,

    /// Deadline for a single counter command. A store slower than this is
    /// treated as unavailable and the request is admitted.
    pub command_timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            connection_timeout_secs: 5,
            command_timeout_ms: 250,
        }
    }
}

/// Caller key extraction settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientIpConfig {
    /// Read `X-Forwarded-For` / `X-Real-IP` before the peer address.
    /// Only enable when the gatekeeper sits behind a proxy that sets them.
    pub trust_forwarded_headers: bool,
}

impl Default for ClientIpConfig {
    fn default() -> Self {
        Self {
            trust_forwarded_headers: false,
        }
    }
}

/// Credential sources.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Cookie carrying the session id.
    pub session_cookie: String,

    /// Custom tokens start with this prefix...
    pub custom_token_prefix: String,

    /// ...followed by exactly this many characters.
    pub custom_token_length: usize,

    pub jwt: JwtConfig,

    /// Custom tokens accepted by the in-memory token store.
    pub api_tokens: Vec<ApiTokenConfig>,

    /// The single privileged account.
    pub owner: OwnerConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie: "session".to_string(),
            custom_token_prefix: "txo".to_string(),
            custom_token_length: 40,
            jwt: JwtConfig::default(),
            api_tokens: Vec::new(),
            owner: OwnerConfig::default(),
        }
    }
}

/// Secret shipped in sample configs; never accepted as a signing key.
pub const PLACEHOLDER_JWT_SECRET: &str = "CHANGE_ME_IN_PRODUCTION";

/// JWT verification settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Algorithm name as understood by `jsonwebtoken` (HS256, RS256, ES256, EdDSA...).
    pub algorithm: String,

    /// Shared secret for HMAC algorithms. Has no default: any valid JWT
    /// authenticates as the owner.
    pub secret: Option<String>,

    /// PEM public key for asymmetric algorithms.
    pub public_key_path: Option<String>,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            algorithm: "HS256".to_string(),
            secret: None,
            public_key_path: None,
        }
    }
}

/// A custom token and the user it stands for.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiTokenConfig {
    pub token: String,

    /// Username of the token holder; defaults to the owner.
    #[serde(default)]
    pub username: Option<String>,
}

/// Owner account record.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OwnerConfig {
    pub id: String,
    pub username: String,
    pub name: String,
}

impl Default for OwnerConfig {
    fn default() -> Self {
        Self {
            id: "owner".to_string(),
            username: "owner".to_string(),
            name: "Owner".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
