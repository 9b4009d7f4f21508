//! Fixed window rate limiting.
//!
//! Two interchangeable limiters share one contract: given a caller key and
//! the current wall-clock time, admit or reject.
//!
//! - [`LocalRateLimiter`]: per-process window records in a concurrent map,
//!   cleaned up by an amortized sweep.
//! - [`DistributedRateLimiter`]: window index encoded in the counter key of a
//!   shared store, cleaned up by store-side expiry. Fails open.

pub mod distributed;
pub mod local;
pub mod store;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

pub use distributed::DistributedRateLimiter;
pub use local::LocalRateLimiter;
pub use store::{CounterStore, MemoryCounterStore, RedisCounterStore, StoreError};

use crate::config::{RateLimitBackend, RateLimitConfig, RedisConfig};

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit,
    /// Hard cap reached for this window; retry after the fixed interval.
    Reject { retry_after: Duration },
}

impl Decision {
    pub fn is_admit(&self) -> bool {
        matches!(self, Decision::Admit)
    }
}

#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn admit(&self, caller_key: &str, now_ms: u64) -> Decision;

    /// Short backend name used in logs and metric labels.
    fn backend(&self) -> &'static str;
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Build the limiter selected by configuration.
pub async fn build_limiter(
    config: &RateLimitConfig,
    redis: &RedisConfig,
) -> Result<Arc<dyn RateLimiter>, StoreError> {
    Ok(match config.backend {
        RateLimitBackend::Local => Arc::new(LocalRateLimiter::from_config(config)),
        RateLimitBackend::Distributed => {
            let store = RedisCounterStore::connect(redis).await?;
            Arc::new(DistributedRateLimiter::from_config(Arc::new(store), config, redis))
        }
    })
}
