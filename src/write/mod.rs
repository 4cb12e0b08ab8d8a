// ============================================================================
// Product write coordinator
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

use crate::adapters::{BrandGraph, ProductRepository};
use crate::cache::CacheLayer;
use crate::config::CatalogConfig;
use crate::core::{
    CatalogError, ProductId, ProductInput, ProductPatch, ProductRecord, ProductStatus, Result,
    StoreError, StoreKind, StoreResult,
};

/// Orchestrates the multi-store write sequence for product creates and
/// updates.
///
/// There is no shared transaction across the document and graph stores, so
/// writes run as an ordered saga: the document store goes first and its
/// `status` field is the durable progress marker. A crash between steps
/// leaves at worst a `PENDING` document no reader can see, never a graph
/// edge with no backing data. Each step that can fail after an earlier step
/// took effect has an explicit compensation; when the compensation itself
/// fails the operation surfaces `InconsistentState` with the orphaned
/// identifier and is never retried automatically.
pub struct ProductWriteCoordinator {
    products: ProductRepository,
    graph: BrandGraph,
    cache: Arc<CacheLayer>,
    config: CatalogConfig,
}

impl ProductWriteCoordinator {
    pub fn new(
        products: ProductRepository,
        graph: BrandGraph,
        cache: Arc<CacheLayer>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            products,
            graph,
            cache,
            config,
        }
    }

    /// Each store call carries its own timeout; a timed-out call is treated
    /// exactly like a hard failure of that call.
    async fn bounded<T, F>(&self, call: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match timeout(self.config.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.config.store_timeout)),
        }
    }

    /// Create a product across the document and graph stores.
    ///
    /// Steps: insert a `PENDING` document, link the brand in the graph
    /// (compensated by deleting the document), then flip the document to
    /// `ACTIVE` — the commit point. Cache entries for the new identifier and
    /// all listing pages are invalidated before control returns to the
    /// caller, on success and failure alike.
    pub async fn create(&self, input: ProductInput) -> Result<ProductRecord> {
        input.validate()?;
        let brand_name = input.brand_name.clone();
        let record = input.into_pending_record(Utc::now());

        let result = self.create_inner(record.clone(), brand_name.as_deref()).await;
        self.invalidate(&record.id).await;
        result
    }

    async fn create_inner(
        &self,
        mut record: ProductRecord,
        brand_name: Option<&str>,
    ) -> Result<ProductRecord> {
        // Step 1: durable progress marker. Nothing to compensate on failure.
        self.bounded(self.products.insert(&record))
            .await
            .map_err(CatalogError::PersistenceFailure)?;

        // Step 2: graph link. Compensation: delete the document just written.
        if let Err(link_err) = self
            .bounded(
                self.graph
                    .link_product(&record.brand_id, brand_name, &record.id),
            )
            .await
        {
            warn!(
                product_id = %record.id,
                error = %link_err,
                "graph link failed, compensating document insert"
            );
            return match self.bounded(self.products.delete(&record.id)).await {
                Ok(()) => Err(CatalogError::PartialWriteRolledBack {
                    reason: format!("graph link failed: {}", link_err),
                }),
                Err(delete_err) => {
                    error!(
                        product_id = %record.id,
                        error = %delete_err,
                        "compensation delete failed, manual repair required"
                    );
                    Err(CatalogError::InconsistentState {
                        product_id: record.id.clone(),
                        stores: vec![StoreKind::Document, StoreKind::Graph],
                        detail: format!(
                            "graph link failed ({}) and compensation delete failed ({}); \
                             PENDING document orphaned",
                            link_err, delete_err
                        ),
                    })
                }
            };
        }

        // Step 3: commit point. Both prerequisite writes succeeded, so this
        // is retried in place rather than unwound.
        let now = Utc::now();
        self.commit_active(&record.id, now).await?;
        record.status = ProductStatus::Active;
        record.updated_at = now;

        info!(product_id = %record.id, brand_id = %record.brand_id, "product created");
        Ok(record)
    }

    async fn commit_active(&self, id: &ProductId, now: DateTime<Utc>) -> Result<()> {
        let mut last_err = None;
        for attempt in 0..=self.config.commit_retries {
            if attempt > 0 {
                sleep(self.config.retry_backoff).await;
            }
            match self
                .bounded(self.products.set_status(id, ProductStatus::Active, now))
                .await
            {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(product_id = %id, attempt, error = %err, "commit-point update failed");
                    last_err = Some(err);
                }
            }
        }

        let detail = match last_err {
            Some(err) => format!(
                "commit-point update failed after {} attempts: {}; \
                 record left PENDING with graph edge present",
                self.config.commit_retries + 1,
                err
            ),
            None => "commit-point retry loop did not run".to_string(),
        };
        error!(product_id = %id, detail = %detail, "create left inconsistent state");
        Err(CatalogError::InconsistentState {
            product_id: id.clone(),
            stores: vec![StoreKind::Document],
            detail,
        })
    }

    /// Patch an ACTIVE product. The document store is written first; graph
    /// mutations run only when the patch changes the brand identity or its
    /// display name, and are compensated by restoring the prior values of
    /// the patched document fields. Invalidation always runs.
    pub async fn update(&self, id: &ProductId, patch: ProductPatch) -> Result<ProductRecord> {
        patch.validate()?;
        let result = self.update_inner(id, &patch).await;
        self.invalidate(id).await;
        result
    }

    async fn update_inner(&self, id: &ProductId, patch: &ProductPatch) -> Result<ProductRecord> {
        let existing = self
            .bounded(self.products.find_by_id(id))
            .await
            .map_err(CatalogError::PersistenceFailure)?
            .filter(|record| record.status == ProductStatus::Active)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;

        let now = Utc::now();
        self.bounded(self.products.apply_patch(id, patch, now))
            .await
            .map_err(CatalogError::PersistenceFailure)?;

        let brand_change = patch.brand_change(&existing.brand_id);
        let graph_result = if let Some(new_brand) = &brand_change {
            self.bounded(self.graph.relink_product(
                &existing.brand_id,
                new_brand,
                patch.brand_name.as_deref(),
                id,
            ))
            .await
        } else if let Some(brand_name) = &patch.brand_name {
            self.bounded(self.graph.rename_brand(&existing.brand_id, brand_name))
                .await
        } else {
            Ok(())
        };

        if let Err(graph_err) = graph_result {
            warn!(
                product_id = %id,
                error = %graph_err,
                "graph update failed, restoring patched document fields"
            );
            // A failed relink may have created the new edge before dying;
            // drop it best-effort so the graph matches the restored brand.
            if let Some(new_brand) = &brand_change {
                if let Err(unlink_err) =
                    self.bounded(self.graph.unlink_product(new_brand, id)).await
                {
                    warn!(product_id = %id, error = %unlink_err, "could not drop half-moved edge");
                }
            }
            return match self.bounded(self.products.restore_fields(&existing, patch)).await {
                Ok(()) => Err(CatalogError::PartialWriteRolledBack {
                    reason: format!("graph update failed: {}", graph_err),
                }),
                Err(restore_err) => {
                    error!(
                        product_id = %id,
                        error = %restore_err,
                        "compensation restore failed, manual repair required"
                    );
                    Err(CatalogError::InconsistentState {
                        product_id: id.clone(),
                        stores: vec![StoreKind::Document, StoreKind::Graph],
                        detail: format!(
                            "graph update failed ({}) and document restore failed ({})",
                            graph_err, restore_err
                        ),
                    })
                }
            };
        }

        let mut updated = existing;
        patch.apply_to(&mut updated, now);
        info!(product_id = %id, "product updated");
        Ok(updated)
    }

    /// Drop the cached product and all listing pages. Runs on every write
    /// attempt's exit path; failures and timeouts are non-fatal because
    /// entries additionally expire on their own TTL.
    async fn invalidate(&self, id: &ProductId) {
        if timeout(self.config.store_timeout, self.cache.invalidate_product(id))
            .await
            .is_err()
        {
            warn!(product_id = %id, "cache invalidation timed out; entry expires by TTL");
        }
        self.cache.invalidate_listings();
    }
}
