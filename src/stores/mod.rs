// ============================================================================
// Store capabilities
// ============================================================================
//
// The core never talks to a concrete database. Each backing store is an
// already-connected, opaque capability behind one of these traits; the
// adapters own serialization at the boundary. Swap in real drivers (MongoDB,
// Neo4j, Cassandra, Redis, ...) by implementing the trait for a thin wrapper
// around the driver's client.

pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};

use crate::core::StoreResult;

pub use memory::{MemoryCache, MemoryCounterStore, MemoryDocumentStore, MemoryGraphStore};

/// Equality-only filter over top-level document fields.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    equals: Vec<(String, JsonValue)>,
}

impl DocumentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: JsonValue) -> Self {
        self.equals.push((field.to_string(), value));
        self
    }

    pub fn matches(&self, doc: &JsonValue) -> bool {
        self.equals
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }
}

/// Document store capability (product catalog source of truth).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document; fails with `DuplicateKey` if the id exists.
    async fn insert(&self, collection: &str, id: &str, doc: JsonValue) -> StoreResult<()>;

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<JsonValue>>;

    /// Shallow-merge `fields` into an existing document; fails with
    /// `DocumentNotFound` if the id does not exist.
    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, JsonValue>,
    ) -> StoreResult<()>;

    /// Delete a document; deleting a missing id is not an error.
    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Filtered scan with pagination. Returns the page of documents plus the
    /// total number of matches before pagination, in a deterministic order.
    async fn find_many(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        skip: usize,
        limit: usize,
    ) -> StoreResult<(Vec<JsonValue>, usize)>;
}

/// Graph store capability (brand/product relationships).
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Create or update a node; repeated upserts are idempotent.
    async fn upsert_node(
        &self,
        label: &str,
        id: &str,
        props: Map<String, JsonValue>,
    ) -> StoreResult<()>;

    /// Create a typed edge; repeated upserts are idempotent.
    async fn upsert_edge(&self, from_id: &str, to_id: &str, edge_type: &str) -> StoreResult<()>;

    /// Remove a typed edge; removing a missing edge is not an error.
    async fn delete_edge(&self, from_id: &str, to_id: &str, edge_type: &str) -> StoreResult<()>;
}

/// Counter store capability (high-concurrency commutative increments).
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically add `amount` to the counter at `key`, returning the new
    /// total. Safe under concurrent writers.
    async fn increment(&self, key: &str, amount: u64) -> StoreResult<u64>;
}

/// Cache capability. Invalidation is a delete, never a value overwrite, so a
/// populate racing past a delete can only re-fill a window that the next
/// invalidation (or the TTL) clears again.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<JsonValue>>;

    async fn set(&self, key: &str, value: JsonValue, ttl: Duration) -> StoreResult<()>;

    async fn delete(&self, key: &str) -> StoreResult<()>;
}
