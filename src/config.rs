use std::time::Duration;

/// Tunables for the catalog core.
///
/// The retry and TTL values are deliberately policy knobs, not guarantees:
/// the dedupe window bounds duplicate suppression for recent keys only, and
/// the cache TTL bounds listing staleness.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Time-to-live for cached products and listing pages.
    pub cache_ttl: Duration,

    /// Extra attempts for the commit-point status update after the first
    /// try fails. Exhausting these yields `InconsistentState`.
    pub commit_retries: u32,

    /// Fixed delay between commit-point retries.
    pub retry_backoff: Duration,

    /// Independent timeout applied to each document/graph store call.
    pub store_timeout: Duration,

    /// Capacity of the recent-idempotency-keys window for view dedupe.
    pub dedupe_capacity: usize,
}

impl CatalogConfig {
    pub fn new() -> Self {
        Self {
            cache_ttl: Duration::from_secs(60),
            commit_retries: 3,
            retry_backoff: Duration::from_millis(25),
            store_timeout: Duration::from_secs(5),
            dedupe_capacity: 1024,
        }
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn commit_retries(mut self, retries: u32) -> Self {
        self.commit_retries = retries;
        self
    }

    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn dedupe_capacity(mut self, capacity: usize) -> Self {
        self.dedupe_capacity = capacity.max(1);
        self
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::new()
    }
}
