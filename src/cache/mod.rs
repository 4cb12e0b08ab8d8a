// ============================================================================
// Cache layer
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::core::{Page, ProductId, ProductRecord};
use crate::stores::CacheStore;

/// Read-through / invalidate-on-write cache for product reads.
///
/// The cache is an optimization, never a correctness dependency: every error
/// from the underlying store is logged and swallowed. A failed `get` is a
/// miss, a failed `set` or `delete` is a no-op, and the TTL bounds how long
/// any entry the coordinator could not delete survives.
///
/// Listing pages are invalidated wholesale by bumping a generation counter
/// baked into their keys; superseded entries become unreachable and age out
/// on their own TTL. This keeps the cache capability at plain
/// get/set/delete without tracking which listing queries a write affects.
pub struct CacheLayer {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    listing_generation: AtomicU64,
}

impl CacheLayer {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            listing_generation: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn product_key(id: &ProductId) -> String {
        format!("product:{}", id)
    }

    fn listing_key(&self, signature: &str) -> String {
        let generation = self.listing_generation.load(Ordering::Acquire);
        format!("listing:{}:{}", generation, signature)
    }

    pub async fn get_product(&self, id: &ProductId) -> Option<ProductRecord> {
        let key = Self::product_key(id);
        match self.store.get(&key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(key = %key, error = %err, "dropping undecodable cache entry");
                    let _ = self.store.delete(&key).await;
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(key = %key, error = %err, "cache read failed, falling through to store");
                None
            }
        }
    }

    pub async fn put_product(&self, record: &ProductRecord) {
        let key = Self::product_key(&record.id);
        match serde_json::to_value(record) {
            Ok(value) => {
                if let Err(err) = self.store.set(&key, value, self.ttl).await {
                    warn!(key = %key, error = %err, "cache populate failed");
                }
            }
            Err(err) => warn!(key = %key, error = %err, "cache serialization failed"),
        }
    }

    /// Delete the cached product. Modeled as a delete rather than an
    /// overwrite so a populate racing past it can only re-fill a window the
    /// next invalidation (or the TTL) clears again.
    pub async fn invalidate_product(&self, id: &ProductId) {
        let key = Self::product_key(id);
        if let Err(err) = self.store.delete(&key).await {
            warn!(key = %key, error = %err, "cache invalidation failed; entry expires by TTL");
        }
    }

    pub async fn get_listing(&self, signature: &str) -> Option<Page<ProductRecord>> {
        let key = self.listing_key(signature);
        match self.store.get(&key).await {
            Ok(Some(value)) => serde_json::from_value(value).ok(),
            Ok(None) => None,
            Err(err) => {
                warn!(key = %key, error = %err, "cache read failed, falling through to store");
                None
            }
        }
    }

    pub async fn put_listing(&self, signature: &str, page: &Page<ProductRecord>) {
        let key = self.listing_key(signature);
        match serde_json::to_value(page) {
            Ok(value) => {
                if let Err(err) = self.store.set(&key, value, self.ttl).await {
                    warn!(key = %key, error = %err, "cache populate failed");
                }
            }
            Err(err) => warn!(key = %key, error = %err, "cache serialization failed"),
        }
    }

    /// Invalidate every cached listing page at once. Writes cannot know
    /// which listing queries a product matches, so listings are dropped
    /// wholesale, trading cache efficiency for correctness.
    pub fn invalidate_listings(&self) {
        self.listing_generation.fetch_add(1, Ordering::AcqRel);
    }
}
