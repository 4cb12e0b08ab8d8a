use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::adapters::{BrandGraph, ProductRepository, ViewCounter};
use crate::cache::CacheLayer;
use crate::config::CatalogConfig;
use crate::core::{ListQuery, Page, ProductId, ProductInput, ProductPatch, ProductRecord, Result};
use crate::read::ProductReadPath;
use crate::stores::{
    CacheStore, CounterStore, DocumentStore, GraphStore, MemoryCache, MemoryCounterStore,
    MemoryDocumentStore, MemoryGraphStore,
};
use crate::views::ViewAggregationPath;
use crate::write::ProductWriteCoordinator;

/// The four already-connected store capabilities the catalog core runs on.
///
/// All handles are shared and safe for concurrent use; the core never
/// reconnects or reconfigures them.
#[derive(Clone)]
pub struct CatalogStores {
    pub documents: Arc<dyn DocumentStore>,
    pub graph: Arc<dyn GraphStore>,
    pub counters: Arc<dyn CounterStore>,
    pub cache: Arc<dyn CacheStore>,
}

impl CatalogStores {
    /// Process-local backends, for tests and embedded use.
    pub fn in_memory() -> Self {
        Self {
            documents: Arc::new(MemoryDocumentStore::new()),
            graph: Arc::new(MemoryGraphStore::new()),
            counters: Arc::new(MemoryCounterStore::new()),
            cache: Arc::new(MemoryCache::new()),
        }
    }
}

/// Entry point of the catalog core.
///
/// Wires the store capabilities into the write coordinator, the cache-aside
/// read path, and the view aggregation path. This is the only surface the
/// request-handling layer calls.
///
/// # Examples
///
/// ```
/// use polystore::{Catalog, ProductInput};
///
/// tokio_test::block_on(async {
///     let catalog = Catalog::in_memory();
///
///     let product = catalog
///         .create_product(ProductInput::new("Widget", 9.99, 100, "B1"))
///         .await
///         .unwrap();
///
///     let fetched = catalog.get_product(&product.id).await.unwrap();
///     assert_eq!(fetched.stock, 100);
/// });
/// ```
pub struct Catalog {
    writer: ProductWriteCoordinator,
    reader: ProductReadPath,
    views: ViewAggregationPath,
}

impl Catalog {
    pub fn new(stores: CatalogStores, config: CatalogConfig) -> Self {
        let products = ProductRepository::new(stores.documents);
        let graph = BrandGraph::new(stores.graph);
        let cache = Arc::new(CacheLayer::new(stores.cache, config.cache_ttl));
        let views = ViewAggregationPath::new(
            ViewCounter::new(stores.counters),
            config.dedupe_capacity,
            config.store_timeout,
        );
        let reader = ProductReadPath::new(products.clone(), Arc::clone(&cache), config.store_timeout);

        Self {
            writer: ProductWriteCoordinator::new(products, graph, cache, config),
            reader,
            views,
        }
    }

    /// Catalog over in-memory stores with default configuration.
    pub fn in_memory() -> Self {
        Self::new(CatalogStores::in_memory(), CatalogConfig::new())
    }

    /// Create a product. On success the returned record is `ACTIVE` and
    /// immediately visible to readers.
    pub async fn create_product(&self, input: ProductInput) -> Result<ProductRecord> {
        self.writer.create(input).await
    }

    /// Apply a partial update to an ACTIVE product.
    pub async fn update_product(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<ProductRecord> {
        self.writer.update(id, patch).await
    }

    /// Fetch a single ACTIVE product, cache-aside.
    pub async fn get_product(&self, id: &ProductId) -> Result<ProductRecord> {
        self.reader.fetch_by_id(id).await
    }

    /// List ACTIVE products, cache-aside, with pagination.
    pub async fn list_products(&self, query: &ListQuery) -> Result<Page<ProductRecord>> {
        self.reader.list(query).await
    }

    /// Record one product-view event, bucketed by the event timestamp's
    /// calendar day. Supplying an idempotency key suppresses duplicates
    /// within the configured recent-keys window.
    pub async fn record_view(
        &self,
        product_id: &ProductId,
        at: DateTime<Utc>,
        idempotency_key: Option<&str>,
    ) -> Result<()> {
        self.views.record_view(product_id, at, idempotency_key).await
    }
}
