// ============================================================================
// In-memory reference backends
// ============================================================================
//
// Process-local implementations of the store capabilities, used by tests and
// by `Catalog::in_memory()`. They honor the same contracts as networked
// backends (idempotent graph upserts, atomic counter increments, TTL'd cache
// entries) so the coordinator logic is exercised unchanged.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use serde_json::{Map, Value as JsonValue};
use tokio::sync::RwLock;

use super::{CacheStore, CounterStore, DocumentFilter, DocumentStore, GraphStore};
use crate::core::{StoreError, StoreResult};

// ----------------------------------------------------------------------------
// Document store
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, HashMap<String, JsonValue>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection (test helper).
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(HashMap::len)
            .unwrap_or(0)
    }
}

/// Deterministic scan order: (created_at, id). RFC 3339 timestamps sort
/// lexicographically, so string comparison is enough.
fn scan_sort_key(id: &str, doc: &JsonValue) -> (String, String) {
    let created_at = doc
        .get("created_at")
        .and_then(JsonValue::as_str)
        .unwrap_or("")
        .to_string();
    (created_at, id.to_string())
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, id: &str, doc: JsonValue) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(StoreError::DuplicateKey(id.to_string()));
        }
        docs.insert(id.to_string(), doc);
        Ok(())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<JsonValue>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, JsonValue>,
    ) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::DocumentNotFound(id.to_string()))?;

        match doc {
            JsonValue::Object(existing) => {
                for (key, value) in fields {
                    existing.insert(key, value);
                }
                Ok(())
            }
            _ => Err(StoreError::Serialization(format!(
                "document '{}' is not an object",
                id
            ))),
        }
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        skip: usize,
        limit: usize,
    ) -> StoreResult<(Vec<JsonValue>, usize)> {
        let collections = self.collections.read().await;
        let mut matches: Vec<(String, JsonValue)> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| filter.matches(doc))
                    .map(|(id, doc)| (id.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default();

        matches.sort_by_key(|(id, doc)| scan_sort_key(id, doc));

        let total = matches.len();
        let page = matches
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|(_, doc)| doc)
            .collect();
        Ok((page, total))
    }
}

// ----------------------------------------------------------------------------
// Graph store
// ----------------------------------------------------------------------------

#[derive(Default)]
struct GraphData {
    /// (label, id) -> props
    nodes: HashMap<(String, String), Map<String, JsonValue>>,
    /// (from, to, edge_type)
    edges: HashSet<(String, String, String)>,
}

#[derive(Default)]
pub struct MemoryGraphStore {
    data: RwLock<GraphData>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn has_edge(&self, from_id: &str, to_id: &str, edge_type: &str) -> bool {
        let data = self.data.read().await;
        data.edges.contains(&(
            from_id.to_string(),
            to_id.to_string(),
            edge_type.to_string(),
        ))
    }

    pub async fn node_props(&self, label: &str, id: &str) -> Option<Map<String, JsonValue>> {
        let data = self.data.read().await;
        data.nodes.get(&(label.to_string(), id.to_string())).cloned()
    }

    pub async fn edge_count(&self) -> usize {
        self.data.read().await.edges.len()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn upsert_node(
        &self,
        label: &str,
        id: &str,
        props: Map<String, JsonValue>,
    ) -> StoreResult<()> {
        let mut data = self.data.write().await;
        let entry = data
            .nodes
            .entry((label.to_string(), id.to_string()))
            .or_default();
        for (key, value) in props {
            entry.insert(key, value);
        }
        Ok(())
    }

    async fn upsert_edge(&self, from_id: &str, to_id: &str, edge_type: &str) -> StoreResult<()> {
        let mut data = self.data.write().await;
        data.edges.insert((
            from_id.to_string(),
            to_id.to_string(),
            edge_type.to_string(),
        ));
        Ok(())
    }

    async fn delete_edge(&self, from_id: &str, to_id: &str, edge_type: &str) -> StoreResult<()> {
        let mut data = self.data.write().await;
        data.edges.remove(&(
            from_id.to_string(),
            to_id.to_string(),
            edge_type.to_string(),
        ));
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Counter store
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryCounterStore {
    counters: RwLock<HashMap<String, u64>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> u64 {
        self.counters.read().await.get(key).copied().unwrap_or(0)
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &str, amount: u64) -> StoreResult<u64> {
        let mut counters = self.counters.write().await;
        let entry = counters.entry(key.to_string()).or_insert(0);
        *entry += amount;
        Ok(*entry)
    }
}

// ----------------------------------------------------------------------------
// Cache
// ----------------------------------------------------------------------------

const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// LRU cache with per-entry TTL. Expired entries are dropped lazily on `get`.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, (JsonValue, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped above zero");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> StoreResult<Option<JsonValue>> {
        let mut entries = self.entries.lock()?;
        let hit = entries
            .get(key)
            .map(|(value, expires_at)| (value.clone(), *expires_at));
        match hit {
            Some((_, expires_at)) if expires_at <= Instant::now() => {
                entries.pop(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: JsonValue, ttl: Duration) -> StoreResult<()> {
        let mut entries = self.entries.lock()?;
        entries.put(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock()?;
        entries.pop(key);
        Ok(())
    }
}
