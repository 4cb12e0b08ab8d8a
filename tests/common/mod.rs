//! Shared test support: fault-injecting store wrappers around the in-memory
//! backends, plus a harness that keeps concrete handles to every store so
//! tests can assert on raw store state behind the catalog's back.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};

use polystore::core::{StoreError, StoreResult};
use polystore::stores::{
    CacheStore, CounterStore, DocumentFilter, DocumentStore, GraphStore, MemoryCache,
    MemoryCounterStore, MemoryDocumentStore, MemoryGraphStore,
};
use polystore::{Catalog, CatalogConfig, CatalogStores};

fn injected() -> StoreError {
    StoreError::Unavailable("injected failure".to_string())
}

// ----------------------------------------------------------------------------
// Document store with injectable failures and call counters
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct FlakyDocumentStore {
    pub inner: MemoryDocumentStore,
    /// `update_fields` calls to let through before failures kick in.
    pub pass_updates: AtomicU32,
    /// Remaining `update_fields` calls to fail once `pass_updates` is spent.
    pub fail_updates: AtomicU32,
    pub fail_deletes: AtomicBool,
    pub fail_inserts: AtomicBool,
    pub fail_reads: AtomicBool,
    pub find_calls: AtomicUsize,
    pub find_many_calls: AtomicUsize,
}

impl FlakyDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_updates(&self, count: u32) {
        self.fail_updates.store(count, Ordering::SeqCst);
    }

    pub fn fail_updates_after(&self, passes: u32, count: u32) {
        self.pass_updates.store(passes, Ordering::SeqCst);
        self.fail_updates.store(count, Ordering::SeqCst);
    }

    fn take_update_failure(&self) -> bool {
        let passed = self
            .pass_updates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if passed {
            return false;
        }
        self.fail_updates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl DocumentStore for FlakyDocumentStore {
    async fn insert(&self, collection: &str, id: &str, doc: JsonValue) -> StoreResult<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.insert(collection, id, doc).await
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<JsonValue>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.find_by_id(collection, id).await
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, JsonValue>,
    ) -> StoreResult<()> {
        if self.take_update_failure() {
            return Err(injected());
        }
        self.inner.update_fields(collection, id, fields).await
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.delete_by_id(collection, id).await
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        skip: usize,
        limit: usize,
    ) -> StoreResult<(Vec<JsonValue>, usize)> {
        self.find_many_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.find_many(collection, filter, skip, limit).await
    }
}

// ----------------------------------------------------------------------------
// Graph store with injectable failures
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct FlakyGraphStore {
    pub inner: MemoryGraphStore,
    pub fail_edges: AtomicBool,
    pub fail_nodes: AtomicBool,
}

impl FlakyGraphStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for FlakyGraphStore {
    async fn upsert_node(
        &self,
        label: &str,
        id: &str,
        props: Map<String, JsonValue>,
    ) -> StoreResult<()> {
        if self.fail_nodes.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.upsert_node(label, id, props).await
    }

    async fn upsert_edge(&self, from_id: &str, to_id: &str, edge_type: &str) -> StoreResult<()> {
        if self.fail_edges.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.upsert_edge(from_id, to_id, edge_type).await
    }

    async fn delete_edge(&self, from_id: &str, to_id: &str, edge_type: &str) -> StoreResult<()> {
        if self.fail_edges.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.delete_edge(from_id, to_id, edge_type).await
    }
}

// ----------------------------------------------------------------------------
// Counter store with injectable failures
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct FlakyCounterStore {
    pub inner: MemoryCounterStore,
    pub fail_increments: AtomicBool,
}

impl FlakyCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for FlakyCounterStore {
    async fn increment(&self, key: &str, amount: u64) -> StoreResult<u64> {
        if self.fail_increments.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.increment(key, amount).await
    }
}

// ----------------------------------------------------------------------------
// Cache that always fails, for cache-as-optional-dependency tests
// ----------------------------------------------------------------------------

pub struct BrokenCache;

#[async_trait]
impl CacheStore for BrokenCache {
    async fn get(&self, _key: &str) -> StoreResult<Option<JsonValue>> {
        Err(injected())
    }

    async fn set(&self, _key: &str, _value: JsonValue, _ttl: Duration) -> StoreResult<()> {
        Err(injected())
    }

    async fn delete(&self, _key: &str) -> StoreResult<()> {
        Err(injected())
    }
}

// ----------------------------------------------------------------------------
// Harness
// ----------------------------------------------------------------------------

/// A catalog plus concrete handles to every backing store.
pub struct Harness {
    pub catalog: Catalog,
    pub documents: Arc<FlakyDocumentStore>,
    pub graph: Arc<FlakyGraphStore>,
    pub counters: Arc<FlakyCounterStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(fast_config())
    }

    pub fn with_config(config: CatalogConfig) -> Self {
        Self::build(config, Arc::new(MemoryCache::new()))
    }

    /// Harness whose cache errors on every call.
    pub fn with_broken_cache() -> Self {
        Self::build(fast_config(), Arc::new(BrokenCache))
    }

    fn build(config: CatalogConfig, cache: Arc<dyn CacheStore>) -> Self {
        let documents = Arc::new(FlakyDocumentStore::new());
        let graph = Arc::new(FlakyGraphStore::new());
        let counters = Arc::new(FlakyCounterStore::new());

        let stores = CatalogStores {
            documents: documents.clone(),
            graph: graph.clone(),
            counters: counters.clone(),
            cache,
        };

        Self {
            catalog: Catalog::new(stores, config),
            documents,
            graph,
            counters,
        }
    }

    /// Raw document lookup, bypassing the read path's status filtering.
    pub async fn raw_product(&self, id: &str) -> Option<JsonValue> {
        self.documents.inner.find_by_id("products", id).await.unwrap()
    }
}

/// Short backoff so retry-exhaustion tests stay fast.
pub fn fast_config() -> CatalogConfig {
    CatalogConfig::new().retry_backoff(Duration::from_millis(1))
}
