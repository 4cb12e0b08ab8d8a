use std::sync::Arc;

use chrono::NaiveDate;

use crate::core::{ProductId, StoreResult};
use crate::stores::CounterStore;

/// Maps a product-view event onto a counter-store increment keyed by
/// (product, calendar day).
#[derive(Clone)]
pub struct ViewCounter {
    store: Arc<dyn CounterStore>,
}

impl ViewCounter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Counter key for a (product, day) bucket.
    pub fn bucket_key(product_id: &ProductId, day: NaiveDate) -> String {
        format!("views:{}:{}", product_id, day.format("%Y-%m-%d"))
    }

    /// Add one view to the (product, day) bucket. The underlying increment
    /// is commutative, so concurrent writers need no coordination here.
    pub async fn record(&self, product_id: &ProductId, day: NaiveDate) -> StoreResult<u64> {
        self.store
            .increment(&Self::bucket_key(product_id, day), 1)
            .await
    }
}
