// ============================================================================
// View aggregation path
// ============================================================================

use std::num::NonZeroUsize;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lru::LruCache;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

use crate::adapters::ViewCounter;
use crate::core::{CatalogError, ProductId, Result, StoreError};

/// Idempotent, high-concurrency increment logic for product-view events.
///
/// The counter store's increment is commutative, so no locking is needed for
/// correctness; the obligations here are to bucket each event by its own
/// timestamp's calendar day (late arrivals land in the historical bucket)
/// and to never down-count. Duplicate delivery is at-least-once unless the
/// caller supplies an idempotency key, in which case the increment is
/// applied at most once per observed key within a bounded recent-keys
/// window. The window is a tunable, not a guarantee for arbitrarily delayed
/// retries.
pub struct ViewAggregationPath {
    views: ViewCounter,
    seen_keys: Mutex<LruCache<String, ()>>,
    store_timeout: Duration,
}

impl ViewAggregationPath {
    pub fn new(views: ViewCounter, dedupe_capacity: usize, store_timeout: Duration) -> Self {
        let capacity = NonZeroUsize::new(dedupe_capacity.max(1))
            .expect("dedupe capacity clamped above zero");
        Self {
            views,
            seen_keys: Mutex::new(LruCache::new(capacity)),
            store_timeout,
        }
    }

    pub async fn record_view(
        &self,
        product_id: &ProductId,
        at: DateTime<Utc>,
        idempotency_key: Option<&str>,
    ) -> Result<()> {
        // Mark the key before incrementing so a concurrent duplicate is
        // suppressed; the lock is never held across the store call.
        if let Some(key) = idempotency_key {
            let mut seen = self.seen_keys.lock().await;
            if seen.contains(key) {
                debug!(product_id = %product_id, key, "duplicate view suppressed");
                return Ok(());
            }
            seen.put(key.to_string(), ());
        }

        let day = at.date_naive();
        let outcome = match timeout(self.store_timeout, self.views.record(product_id, day)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.store_timeout)),
        };
        match outcome {
            Ok(_) => Ok(()),
            Err(err) => {
                // Unmark so a retry of the same event is not suppressed.
                if let Some(key) = idempotency_key {
                    self.seen_keys.lock().await.pop(key);
                }
                Err(CatalogError::PersistenceFailure(err))
            }
        }
    }
}
