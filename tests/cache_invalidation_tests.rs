/// Cache invalidation tests
///
/// Writes must never leave a stale cache entry behind: product keys are
/// deleted and listing pages dropped wholesale on every write attempt,
/// successful or not.
/// Run with: cargo test --test cache_invalidation_tests

mod common;

use std::sync::atomic::Ordering;

use common::Harness;
use polystore::{CatalogError, ListQuery, ProductInput, ProductPatch};

#[tokio::test]
async fn get_after_update_reflects_the_patch() {
    let h = Harness::new();
    let created = h
        .catalog
        .create_product(ProductInput::new("Widget", 9.99, 100, "B1"))
        .await
        .unwrap();

    // Warm the cache with the pre-update record.
    let warm = h.catalog.get_product(&created.id).await.unwrap();
    assert_eq!(warm.stock, 100);

    let patch = ProductPatch {
        stock: Some(95),
        ..Default::default()
    };
    h.catalog.update_product(&created.id, patch).await.unwrap();

    // Invalidation is never skipped on the success path.
    let fetched = h.catalog.get_product(&created.id).await.unwrap();
    assert_eq!(fetched.stock, 95);
}

#[tokio::test]
async fn failed_update_still_invalidates_the_product_key() {
    let h = Harness::new();
    let created = h
        .catalog
        .create_product(ProductInput::new("Widget", 9.99, 100, "B1"))
        .await
        .unwrap();

    // Warm the cache, then fail the patch at the document store.
    h.catalog.get_product(&created.id).await.unwrap();
    h.documents.fail_next_updates(1);
    let patch = ProductPatch {
        stock: Some(1),
        ..Default::default()
    };
    let err = h
        .catalog
        .update_product(&created.id, patch)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::PersistenceFailure(_)));

    // The next read must go to the store, not the (invalidated) cache.
    let store_reads = h.documents.find_calls.load(Ordering::SeqCst);
    let fetched = h.catalog.get_product(&created.id).await.unwrap();
    assert_eq!(fetched.stock, 100);
    assert!(h.documents.find_calls.load(Ordering::SeqCst) > store_reads);
}

#[tokio::test]
async fn new_product_appears_in_previously_cached_listing() {
    let h = Harness::new();
    h.catalog
        .create_product(ProductInput::new("First", 1.0, 1, "B1"))
        .await
        .unwrap();

    let query = ListQuery::new();
    let before = h.catalog.list_products(&query).await.unwrap();
    assert_eq!(before.total, 1);

    h.catalog
        .create_product(ProductInput::new("Second", 2.0, 1, "B1"))
        .await
        .unwrap();

    // Listings are invalidated wholesale on any write, so the new product
    // is visible immediately, well inside the one-TTL staleness bound.
    let after = h.catalog.list_products(&query).await.unwrap();
    assert_eq!(after.total, 2);
}

#[tokio::test]
async fn rolled_back_create_leaves_no_readable_trace() {
    let h = Harness::new();
    h.catalog
        .create_product(ProductInput::new("First", 1.0, 1, "B1"))
        .await
        .unwrap();
    let cached = h.catalog.list_products(&ListQuery::new()).await.unwrap();
    assert_eq!(cached.total, 1);

    h.graph.fail_edges.store(true, Ordering::SeqCst);
    let err = h
        .catalog
        .create_product(ProductInput::new("Doomed", 1.0, 1, "B1"))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::PartialWriteRolledBack { .. }));
    h.graph.fail_edges.store(false, Ordering::SeqCst);

    let page = h.catalog.list_products(&ListQuery::new()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "First");
}
