// ============================================================================
// Polystore Library
// ============================================================================
//
// Polyglot-persistence product catalog core. A document store is the source
// of truth for product records, a graph store holds brand relationships, a
// counter store accumulates view events, and a cache accelerates reads. The
// write coordinator keeps the document and graph stores mutually consistent
// without a distributed transaction: ordered writes, a status commit point,
// and explicit compensation.

pub mod adapters;
pub mod cache;
pub mod config;
pub mod core;
pub mod read;
pub mod stores;
pub mod views;
pub mod write;
mod facade;

// Re-export main types for convenience
pub use config::CatalogConfig;
pub use core::{
    AttrValue, BrandId, CatalogError, ListQuery, Page, ProductId, ProductInput, ProductPatch,
    ProductRecord, ProductStatus, Result, StoreError, StoreKind,
};
pub use facade::{Catalog, CatalogStores};
