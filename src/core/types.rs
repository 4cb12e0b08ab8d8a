use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{CatalogError, Result};
use super::value::AttrValue;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque product identifier, assigned by the write coordinator before any
/// store write so that every store keys the same logical product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrandId(pub String);

impl BrandId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BrandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BrandId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ============================================================================
// Product record
// ============================================================================

/// Lifecycle marker for a product document.
///
/// The document store's `status` field is the single authoritative progress
/// marker across stores: readers only ever see `Active` records, so the
/// write coordinator's in-flight window (`Pending`) is invisible to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "FAILED")]
    Failed,
}

/// The source-of-truth product document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub stock: i64,
    pub brand_id: BrandId,
    #[serde(default)]
    pub attributes: HashMap<String, AttrValue>,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Write inputs
// ============================================================================

/// Input for `create_product`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub price: f64,
    pub stock: i64,
    pub brand_id: BrandId,
    /// Display name for the brand node; defaults to the brand id.
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, AttrValue>,
}

impl ProductInput {
    pub fn new(name: &str, price: f64, stock: i64, brand_id: &str) -> Self {
        Self {
            name: name.to_string(),
            price,
            stock,
            brand_id: BrandId::from(brand_id),
            brand_name: None,
            attributes: HashMap::new(),
        }
    }

    pub fn brand_name(mut self, name: &str) -> Self {
        self.brand_name = Some(name.to_string());
        self
    }

    pub fn attribute(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::InvalidInput("name must not be empty".into()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(CatalogError::InvalidInput(format!(
                "price must be >= 0, got {}",
                self.price
            )));
        }
        if self.stock < 0 {
            return Err(CatalogError::InvalidInput(format!(
                "stock must be >= 0, got {}",
                self.stock
            )));
        }
        if self.brand_id.as_str().is_empty() {
            return Err(CatalogError::InvalidInput("brand id must not be empty".into()));
        }
        for (key, value) in &self.attributes {
            value.validate(key)?;
        }
        Ok(())
    }

    /// Materialize a `PENDING` record with a freshly assigned identifier.
    pub fn into_pending_record(self, now: DateTime<Utc>) -> ProductRecord {
        ProductRecord {
            id: ProductId::generate(),
            name: self.name,
            price: self.price,
            stock: self.stock,
            brand_id: self.brand_id,
            attributes: self.attributes,
            status: ProductStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for `update_product`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub brand_id: Option<BrandId>,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub attributes: Option<HashMap<String, AttrValue>>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.brand_id.is_none()
            && self.brand_name.is_none()
            && self.attributes.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(CatalogError::InvalidInput("patch must not be empty".into()));
        }
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(CatalogError::InvalidInput("name must not be empty".into()));
            }
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(CatalogError::InvalidInput(format!(
                    "price must be >= 0, got {}",
                    price
                )));
            }
        }
        if let Some(stock) = self.stock {
            if stock < 0 {
                return Err(CatalogError::InvalidInput(format!(
                    "stock must be >= 0, got {}",
                    stock
                )));
            }
        }
        if let Some(brand_id) = &self.brand_id {
            if brand_id.as_str().is_empty() {
                return Err(CatalogError::InvalidInput("brand id must not be empty".into()));
            }
        }
        if let Some(attributes) = &self.attributes {
            for (key, value) in attributes {
                value.validate(key)?;
            }
        }
        Ok(())
    }

    /// The new brand the patch moves the product to, if it is a move.
    pub fn brand_change(&self, current: &BrandId) -> Option<BrandId> {
        match &self.brand_id {
            Some(next) if next != current => Some(next.clone()),
            _ => None,
        }
    }

    /// Whether the patch touches the graph store at all.
    pub fn touches_graph(&self, current_brand: &BrandId) -> bool {
        self.brand_change(current_brand).is_some() || self.brand_name.is_some()
    }

    /// Apply the patch to an in-memory record (document fields only).
    pub fn apply_to(&self, record: &mut ProductRecord, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(price) = self.price {
            record.price = price;
        }
        if let Some(stock) = self.stock {
            record.stock = stock;
        }
        if let Some(brand_id) = &self.brand_id {
            record.brand_id = brand_id.clone();
        }
        if let Some(attributes) = &self.attributes {
            record.attributes = attributes.clone();
        }
        record.updated_at = now;
    }
}

// ============================================================================
// Listing queries
// ============================================================================

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// Listing filter plus pagination. Normalized before it touches the cache
/// or the store so that equivalent queries share one cache signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub brand_id: Option<BrandId>,
    pub page: usize,
    pub page_size: usize,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn brand(mut self, brand_id: &str) -> Self {
        self.brand_id = Some(BrandId::from(brand_id));
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Clamp pagination into range; page is 1-based.
    pub fn normalized(&self) -> Self {
        let page_size = match self.page_size {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        Self {
            brand_id: self.brand_id.clone(),
            page: self.page.max(1),
            page_size,
        }
    }

    /// Stable cache signature for the normalized query.
    pub fn signature(&self) -> String {
        let q = self.normalized();
        format!(
            "brand={}&page={}&size={}",
            q.brand_id.as_ref().map(BrandId::as_str).unwrap_or("*"),
            q.page,
            q.page_size
        )
    }

    pub fn skip(&self) -> usize {
        let q = self.normalized();
        (q.page - 1) * q.page_size
    }
}

/// One page of listing results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}
