//! In-process fixed window limiter.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::security::rate_limit::{Decision, RateLimiter};

/// Window state for one caller key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WindowRecord {
    count: u32,
    /// Epoch ms; the window covers every instant up to and including this one.
    window_reset_at: u64,
}

impl WindowRecord {
    fn open(now_ms: u64, window_ms: u64) -> Self {
        Self {
            count: 1,
            window_reset_at: now_ms.saturating_add(window_ms),
        }
    }

    fn elapsed(&self, now_ms: u64) -> bool {
        now_ms > self.window_reset_at
    }
}

enum Admission {
    NewWindow,
    SameWindow,
    Rejected,
}

/// Per-key counters owned by this process.
///
/// The check-and-increment for a key runs under that key's entry lock in the
/// map, so concurrent requests from one caller cannot both slip past the cap.
/// Expired records are treated as absent on access; the sweep only bounds
/// memory. It runs every `sweep_every` opened windows, so steady traffic on
/// live keys never triggers it.
pub struct LocalRateLimiter {
    records: Arc<DashMap<String, WindowRecord>>,
    capacity: u32,
    window_ms: u64,
    retry_after: Duration,
    sweep_every: u64,
    windows_opened: AtomicU64,
    sweeping: Arc<AtomicBool>,
}

impl LocalRateLimiter {
    pub fn new(capacity: u32, window_ms: u64, retry_after: Duration, sweep_every: u64) -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            capacity,
            window_ms,
            retry_after,
            sweep_every: sweep_every.max(1),
            windows_opened: AtomicU64::new(0),
            sweeping: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.capacity,
            config.window_ms,
            Duration::from_secs(config.retry_after_secs),
            config.sweep_every,
        )
    }

    /// Synchronous core of [`RateLimiter::admit`].
    pub fn check(&self, caller_key: &str, now_ms: u64) -> Decision {
        let outcome = match self.records.entry(caller_key.to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(WindowRecord::open(now_ms, self.window_ms));
                Admission::NewWindow
            }
            Entry::Occupied(mut slot) => {
                let record = slot.get_mut();
                if record.elapsed(now_ms) {
                    *record = WindowRecord::open(now_ms, self.window_ms);
                    Admission::NewWindow
                } else if record.count >= self.capacity {
                    Admission::Rejected
                } else {
                    record.count += 1;
                    Admission::SameWindow
                }
            }
        };
        // Entry guard is released here; sweeping below takes shard locks.

        match outcome {
            Admission::Rejected => Decision::Reject {
                retry_after: self.retry_after,
            },
            Admission::SameWindow => Decision::Admit,
            Admission::NewWindow => {
                let n = self.windows_opened.fetch_add(1, Ordering::Relaxed) + 1;
                if n % self.sweep_every == 0 {
                    self.schedule_sweep(now_ms);
                }
                Decision::Admit
            }
        }
    }

    /// Number of records currently held, expired or not.
    pub fn tracked_keys(&self) -> usize {
        self.records.len()
    }

    /// Remove records whose window elapsed before `now_ms`.
    ///
    /// Runs on the blocking pool when a Tokio runtime is available so the
    /// request that triggered it is not held up; inline otherwise. At most one
    /// sweep runs at a time.
    fn schedule_sweep(&self, now_ms: u64) {
        if self
            .sweeping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let records = Arc::clone(&self.records);
        let sweeping = Arc::clone(&self.sweeping);
        let sweep = move || {
            let before = records.len();
            records.retain(|_, record| !record.elapsed(now_ms));
            let after = records.len();
            sweeping.store(false, Ordering::Release);
            metrics::record_tracked_keys(after);
            tracing::debug!(removed = before.saturating_sub(after), remaining = after, "Rate limit sweep");
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(sweep);
            }
            Err(_) => sweep(),
        }
    }
}

#[async_trait]
impl RateLimiter for LocalRateLimiter {
    async fn admit(&self, caller_key: &str, now_ms: u64) -> Decision {
        self.check(caller_key, now_ms)
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}
