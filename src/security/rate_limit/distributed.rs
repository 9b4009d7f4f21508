//! Shared-store fixed window limiter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{RateLimitConfig, RedisConfig};
use crate::observability::metrics;
use crate::security::rate_limit::store::{CounterStore, StoreError};
use crate::security::rate_limit::{Decision, RateLimiter};

/// Fixed window limiter whose counters live in a store shared by every
/// instance.
///
/// The window index is part of the counter key, so a new window is a new key
/// and there is nothing to reset. Counters expire on their own one window
/// plus a buffer after the first hit. Store failures, including commands
/// that outlive `store_timeout`, admit the request.
pub struct DistributedRateLimiter {
    store: Arc<dyn CounterStore>,
    capacity: u32,
    window_ms: u64,
    expiry_buffer_ms: u64,
    retry_after: Duration,
    key_prefix: String,
    store_timeout: Duration,
}

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(250);

impl DistributedRateLimiter {
    pub fn new(
        store: Arc<dyn CounterStore>,
        capacity: u32,
        window_ms: u64,
        expiry_buffer_ms: u64,
        retry_after: Duration,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            capacity,
            window_ms: window_ms.max(1),
            expiry_buffer_ms,
            retry_after,
            key_prefix: key_prefix.into(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn from_config(
        store: Arc<dyn CounterStore>,
        config: &RateLimitConfig,
        redis: &RedisConfig,
    ) -> Self {
        Self::new(
            store,
            config.capacity,
            config.window_ms,
            config.expiry_buffer_ms,
            Duration::from_secs(config.retry_after_secs),
            config.key_prefix.clone(),
        )
        .with_store_timeout(Duration::from_millis(redis.command_timeout_ms))
    }

    /// Deadline for each store command.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn window_index(&self, now_ms: u64) -> u64 {
        now_ms / self.window_ms
    }

    pub fn counter_key(&self, caller_key: &str, now_ms: u64) -> String {
        format!("{}:{}:{}", self.key_prefix, caller_key, self.window_index(now_ms))
    }

    async fn bounded<T>(
        &self,
        command: impl std::future::Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.store_timeout, command)
            .await
            .map_err(|_| {
                StoreError::Unavailable(format!("no reply within {:?}", self.store_timeout))
            })?
    }
}

#[async_trait]
impl RateLimiter for DistributedRateLimiter {
    async fn admit(&self, caller_key: &str, now_ms: u64) -> Decision {
        let key = self.counter_key(caller_key, now_ms);

        let count = match self.bounded(self.store.increment(&key)).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Rate limit store unavailable, admitting request");
                metrics::record_store_error();
                return Decision::Admit;
            }
        };

        // Racing first hits may both set the TTL; setting it twice is harmless.
        if count == 1 {
            let ttl_ms = self.window_ms.saturating_add(self.expiry_buffer_ms);
            if let Err(e) = self.bounded(self.store.set_expiry(&key, ttl_ms)).await {
                tracing::warn!(error = %e, key = %key, "Failed to set rate limit counter expiry");
                metrics::record_store_error();
            }
        }

        if count > i64::from(self.capacity) {
            Decision::Reject {
                retry_after: self.retry_after,
            }
        } else {
            Decision::Admit
        }
    }

    fn backend(&self) -> &'static str {
        "distributed"
    }
}
