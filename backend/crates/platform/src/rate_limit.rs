//! Rate Limiting Infrastructure
//!
//! Fixed-window request counters and the storage abstraction over them.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }
}

/// Rate limit check result
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: i64,
}

impl RateLimitResult {
    /// Seconds until the window resets, rounded up, at least 1.
    pub fn retry_after_secs(&self, now_ms: i64) -> u64 {
        let remaining_ms = (self.reset_at_ms - now_ms).max(0);
        (remaining_ms as u64).div_ceil(1000).max(1)
    }
}

/// Trait for rate limit storage backends
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Check and increment rate limit counter
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, Box<dyn std::error::Error + Send + Sync>>;
}

/// Current wall-clock time as Unix milliseconds
pub fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

// ============================================================================
// In-memory fixed-window store
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at_ms: i64,
    count: u32,
}

/// In-process fixed-window rate limiter.
///
/// Counters live in a `DashMap` keyed by caller-supplied strings (typically
/// `"<route class>:<client ip>"`). Each key gets an independent window;
/// exceeding one never affects another. A window resets as soon as its
/// duration has fully elapsed.
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    windows: DashMap<String, Window>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }

    /// Core check with an explicit clock, so tests control time.
    pub fn check_at(&self, key: &str, config: &RateLimitConfig, now_ms: i64) -> RateLimitResult {
        let window_ms = config.window_ms();

        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started_at_ms: now_ms,
            count: 0,
        });

        if now_ms - entry.started_at_ms >= window_ms {
            entry.started_at_ms = now_ms;
            entry.count = 0;
        }

        entry.count += 1;
        let allowed = entry.count <= config.max_requests;

        RateLimitResult {
            allowed,
            remaining: config.max_requests.saturating_sub(entry.count),
            reset_at_ms: entry.started_at_ms + window_ms,
        }
    }

    /// Drop windows that have fully elapsed, bounding memory on long runs.
    pub fn evict_expired(&self, now_ms: i64) {
        self.windows
            .retain(|_, w| now_ms - w.started_at_ms < 24 * 3600 * 1000);
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.check_at(key, config, now_unix_ms()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_budget_then_rejects() {
        let store = MemoryRateLimitStore::new();
        let config = RateLimitConfig::new(5, 900);

        for i in 0..5 {
            let result = store.check_at("login:1.2.3.4", &config, 1_000);
            assert!(result.allowed, "request {} should be allowed", i + 1);
        }

        // Sixth request in the same window is rejected
        let result = store.check_at("login:1.2.3.4", &config, 2_000);
        assert!(!result.allowed);
        assert_eq!(result.remaining, 0);
    }

    #[test]
    fn test_window_resets_after_elapse() {
        let store = MemoryRateLimitStore::new();
        let config = RateLimitConfig::new(2, 60);

        assert!(store.check_at("k", &config, 0).allowed);
        assert!(store.check_at("k", &config, 1_000).allowed);
        assert!(!store.check_at("k", &config, 2_000).allowed);

        // One full window later the counter starts over
        assert!(store.check_at("k", &config, 60_000).allowed);
    }

    #[test]
    fn test_keys_are_independent() {
        let store = MemoryRateLimitStore::new();
        let config = RateLimitConfig::new(1, 60);

        assert!(store.check_at("me:1.1.1.1", &config, 0).allowed);
        assert!(!store.check_at("me:1.1.1.1", &config, 1).allowed);

        // A different client still has its own budget
        assert!(store.check_at("me:2.2.2.2", &config, 2).allowed);
        // As does the same client on a different route class
        assert!(store.check_at("api:1.1.1.1", &config, 3).allowed);
    }

    #[test]
    fn test_reset_at_and_retry_after() {
        let store = MemoryRateLimitStore::new();
        let config = RateLimitConfig::new(1, 60);

        let first = store.check_at("k", &config, 10_000);
        assert_eq!(first.reset_at_ms, 70_000);

        let rejected = store.check_at("k", &config, 20_000);
        assert!(!rejected.allowed);
        assert_eq!(rejected.retry_after_secs(20_000), 50);
        // Never reports zero seconds
        assert_eq!(rejected.retry_after_secs(70_000), 1);
    }

    #[tokio::test]
    async fn test_store_trait_uses_wall_clock() {
        let store = MemoryRateLimitStore::new();
        let config = RateLimitConfig::new(2, 60);

        let result = RateLimitStore::check_and_increment(&store, "k", &config)
            .await
            .unwrap();
        assert!(result.allowed);
        assert_eq!(result.remaining, 1);
    }
}
