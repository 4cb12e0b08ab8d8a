use std::sync::Arc;

use serde_json::{json, Map, Value as JsonValue};

use crate::core::{BrandId, ProductId, StoreResult};
use crate::stores::GraphStore;

pub const BRAND_LABEL: &str = "Brand";
pub const HAS_PRODUCT: &str = "HAS_PRODUCT";

/// Maps brand/product relationship mutations onto graph-store operations.
///
/// The graph holds a brand node (identifier plus display name) and one
/// `HAS_PRODUCT` edge per product. There is no product node; the edge points
/// at the product identifier and the document store owns everything else.
#[derive(Clone)]
pub struct BrandGraph {
    store: Arc<dyn GraphStore>,
}

impl BrandGraph {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    fn brand_props(brand_id: &BrandId, brand_name: Option<&str>) -> Map<String, JsonValue> {
        let mut props = Map::new();
        props.insert("id".to_string(), json!(brand_id));
        props.insert(
            "name".to_string(),
            json!(brand_name.unwrap_or(brand_id.as_str())),
        );
        props
    }

    /// Idempotently ensure the brand node exists, then attach the product.
    pub async fn link_product(
        &self,
        brand_id: &BrandId,
        brand_name: Option<&str>,
        product_id: &ProductId,
    ) -> StoreResult<()> {
        self.store
            .upsert_node(BRAND_LABEL, brand_id.as_str(), Self::brand_props(brand_id, brand_name))
            .await?;
        self.store
            .upsert_edge(brand_id.as_str(), product_id.as_str(), HAS_PRODUCT)
            .await
    }

    pub async fn unlink_product(
        &self,
        brand_id: &BrandId,
        product_id: &ProductId,
    ) -> StoreResult<()> {
        self.store
            .delete_edge(brand_id.as_str(), product_id.as_str(), HAS_PRODUCT)
            .await
    }

    /// Move a product's edge from one brand to another. The new link is
    /// created before the old edge is dropped so a crash in between leaves a
    /// superfluous edge on the old brand rather than a product with no brand.
    pub async fn relink_product(
        &self,
        old_brand: &BrandId,
        new_brand: &BrandId,
        brand_name: Option<&str>,
        product_id: &ProductId,
    ) -> StoreResult<()> {
        self.link_product(new_brand, brand_name, product_id).await?;
        self.unlink_product(old_brand, product_id).await
    }

    /// Update the display name on an existing brand node.
    pub async fn rename_brand(&self, brand_id: &BrandId, brand_name: &str) -> StoreResult<()> {
        self.store
            .upsert_node(
                BRAND_LABEL,
                brand_id.as_str(),
                Self::brand_props(brand_id, Some(brand_name)),
            )
            .await
    }
}
