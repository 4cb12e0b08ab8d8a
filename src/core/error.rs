use std::time::Duration;
use thiserror::Error;

use super::types::ProductId;

/// Failure of a single store capability call.
///
/// These are the errors the raw `DocumentStore` / `GraphStore` /
/// `CounterStore` / `CacheStore` primitives report; the coordinator and
/// read path translate them into the caller-facing [`CatalogError`]
/// taxonomy depending on which step of an operation they interrupted.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Duplicate key '{0}'")]
    DuplicateKey(String),

    #[error("Document '{0}' not found")]
    DocumentNotFound(String),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Which store a cross-store operation believes it left in a bad state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Document,
    Graph,
    Counter,
    Cache,
}

/// Caller-facing error taxonomy of the catalog core.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A single store call failed before any partial state was created.
    /// Safe to retry the whole operation from scratch.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(StoreError),

    /// A later step failed and an earlier step's effect was undone.
    /// Safe to retry the whole operation from scratch.
    #[error("Partial write rolled back: {reason}")]
    PartialWriteRolledBack { reason: String },

    /// Compensation failed or the commit point could not be confirmed.
    /// Must NOT be retried automatically; carries the orphaned identifier
    /// for out-of-band repair.
    #[error("Inconsistent state for product '{product_id}' (stores: {stores:?}): {detail}")]
    InconsistentState {
        product_id: ProductId,
        stores: Vec<StoreKind>,
        detail: String,
    },

    /// A read-path store call failed with no cache fallback available.
    #[error("Read failure: {0}")]
    ReadFailure(StoreError),

    /// Valid request, no matching ACTIVE record.
    #[error("Product '{0}' not found")]
    NotFound(ProductId),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CatalogError {
    /// Whether the whole operation may be retried from scratch.
    ///
    /// `InconsistentState` is deliberately excluded: a blind retry could
    /// compound the inconsistency instead of repairing it.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CatalogError::PersistenceFailure(_) | CatalogError::PartialWriteRolledBack { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
