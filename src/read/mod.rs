// ============================================================================
// Product read path
// ============================================================================

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::adapters::ProductRepository;
use crate::cache::CacheLayer;
use crate::core::{
    CatalogError, ListQuery, Page, ProductId, ProductRecord, ProductStatus, Result, StoreError,
    StoreResult,
};

/// Cache-aside read logic for single-product and listing queries.
///
/// Only `ACTIVE` records are ever returned or cached: a `PENDING` or
/// `FAILED` document is reported as `NotFound`, which is what hides the
/// write coordinator's in-flight window from readers. Cache failures are
/// never fatal — the path falls through to the document store and a store
/// failure surfaces as `ReadFailure`, never as fabricated data.
pub struct ProductReadPath {
    products: ProductRepository,
    cache: Arc<CacheLayer>,
    store_timeout: Duration,
}

impl ProductReadPath {
    pub fn new(products: ProductRepository, cache: Arc<CacheLayer>, store_timeout: Duration) -> Self {
        Self {
            products,
            cache,
            store_timeout,
        }
    }

    async fn bounded<T, F>(&self, call: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.store_timeout)),
        }
    }

    pub async fn fetch_by_id(&self, id: &ProductId) -> Result<ProductRecord> {
        if let Some(hit) = self.cache.get_product(id).await {
            return Ok(hit);
        }

        let record = self
            .bounded(self.products.find_by_id(id))
            .await
            .map_err(CatalogError::ReadFailure)?;

        match record {
            Some(record) if record.status == ProductStatus::Active => {
                self.cache.put_product(&record).await;
                Ok(record)
            }
            _ => Err(CatalogError::NotFound(id.clone())),
        }
    }

    /// Listing pages are cached by normalized query signature. A page may be
    /// stale by at most one cache TTL window; that bound is accepted and
    /// documented, not a defect.
    pub async fn list(&self, query: &ListQuery) -> Result<Page<ProductRecord>> {
        let query = query.normalized();
        let signature = query.signature();

        if let Some(page) = self.cache.get_listing(&signature).await {
            return Ok(page);
        }

        let (items, total) = self
            .bounded(self.products.find_active(
                query.brand_id.as_ref(),
                query.skip(),
                query.page_size,
            ))
            .await
            .map_err(CatalogError::ReadFailure)?;

        let page = Page {
            items,
            page: query.page,
            page_size: query.page_size,
            total,
        };
        self.cache.put_listing(&signature, &page).await;
        Ok(page)
    }
}
