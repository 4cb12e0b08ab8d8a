use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value as JsonValue};

use crate::core::{BrandId, ProductId, ProductPatch, ProductRecord, ProductStatus, StoreResult};
use crate::stores::{DocumentFilter, DocumentStore};

pub const PRODUCTS_COLLECTION: &str = "products";

/// Maps `ProductRecord`s onto document-store operations. Owns the
/// serialization of records into catalog documents; nothing else in the
/// crate touches the `products` collection directly.
#[derive(Clone)]
pub struct ProductRepository {
    store: Arc<dyn DocumentStore>,
}

impl ProductRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn to_document(record: &ProductRecord) -> StoreResult<JsonValue> {
        Ok(serde_json::to_value(record)?)
    }

    fn from_document(doc: JsonValue) -> StoreResult<ProductRecord> {
        Ok(serde_json::from_value(doc)?)
    }

    pub async fn insert(&self, record: &ProductRecord) -> StoreResult<()> {
        let doc = Self::to_document(record)?;
        self.store
            .insert(PRODUCTS_COLLECTION, record.id.as_str(), doc)
            .await
    }

    pub async fn find_by_id(&self, id: &ProductId) -> StoreResult<Option<ProductRecord>> {
        match self.store.find_by_id(PRODUCTS_COLLECTION, id.as_str()).await? {
            Some(doc) => Ok(Some(Self::from_document(doc)?)),
            None => Ok(None),
        }
    }

    /// Apply the document-store part of a patch (graph-only fields such as
    /// the brand display name are not part of the catalog document).
    pub async fn apply_patch(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut fields = Map::new();
        if let Some(name) = &patch.name {
            fields.insert("name".to_string(), json!(name));
        }
        if let Some(price) = patch.price {
            fields.insert("price".to_string(), json!(price));
        }
        if let Some(stock) = patch.stock {
            fields.insert("stock".to_string(), json!(stock));
        }
        if let Some(brand_id) = &patch.brand_id {
            fields.insert("brand_id".to_string(), json!(brand_id));
        }
        if let Some(attributes) = &patch.attributes {
            fields.insert("attributes".to_string(), serde_json::to_value(attributes)?);
        }
        fields.insert("updated_at".to_string(), json!(now));
        self.store
            .update_fields(PRODUCTS_COLLECTION, id.as_str(), fields)
            .await
    }

    /// Write back the prior values of exactly the fields a patch touched.
    /// Used as the compensation step when a later store write fails.
    pub async fn restore_fields(
        &self,
        previous: &ProductRecord,
        patch: &ProductPatch,
    ) -> StoreResult<()> {
        let mut fields = Map::new();
        if patch.name.is_some() {
            fields.insert("name".to_string(), json!(previous.name));
        }
        if patch.price.is_some() {
            fields.insert("price".to_string(), json!(previous.price));
        }
        if patch.stock.is_some() {
            fields.insert("stock".to_string(), json!(previous.stock));
        }
        if patch.brand_id.is_some() {
            fields.insert("brand_id".to_string(), json!(previous.brand_id));
        }
        if patch.attributes.is_some() {
            fields.insert(
                "attributes".to_string(),
                serde_json::to_value(&previous.attributes)?,
            );
        }
        fields.insert("updated_at".to_string(), json!(previous.updated_at));
        self.store
            .update_fields(PRODUCTS_COLLECTION, previous.id.as_str(), fields)
            .await
    }

    /// Move a record to a new lifecycle status. Setting `ACTIVE` is the
    /// commit point of a create.
    pub async fn set_status(
        &self,
        id: &ProductId,
        status: ProductStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut fields = Map::new();
        fields.insert("status".to_string(), serde_json::to_value(status)?);
        fields.insert("updated_at".to_string(), json!(now));
        self.store
            .update_fields(PRODUCTS_COLLECTION, id.as_str(), fields)
            .await
    }

    pub async fn delete(&self, id: &ProductId) -> StoreResult<()> {
        self.store
            .delete_by_id(PRODUCTS_COLLECTION, id.as_str())
            .await
    }

    /// Page through ACTIVE records, optionally restricted to one brand.
    pub async fn find_active(
        &self,
        brand_id: Option<&BrandId>,
        skip: usize,
        limit: usize,
    ) -> StoreResult<(Vec<ProductRecord>, usize)> {
        let mut filter = DocumentFilter::new().eq("status", json!(ProductStatus::Active));
        if let Some(brand_id) = brand_id {
            filter = filter.eq("brand_id", json!(brand_id));
        }

        let (docs, total) = self
            .store
            .find_many(PRODUCTS_COLLECTION, &filter, skip, limit)
            .await?;
        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            records.push(Self::from_document(doc)?);
        }
        Ok((records, total))
    }
}
