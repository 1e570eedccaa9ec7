use lta_common::{Bundle, BundleStatus};
use lta_store::{claim, testutil::postgres_pool, Store};
use uuid::Uuid;

#[tokio::test]
async fn pop_bundle_returns_distinct_rows_under_concurrent_claim() {
    let (_container, pool) = postgres_pool().await;
    let store = Store::new(pool.clone());

    let request = Uuid::new_v4();
    let mut a = Bundle::new(request, "WIPAC".into(), "DESY".into(), "/data/exp/a.zip".into());
    a.status = BundleStatus::Staged;
    let mut b = Bundle::new(request, "WIPAC".into(), "DESY".into(), "/data/exp/b.zip".into());
    b.status = BundleStatus::Staged;
    store.create_bundle(&a).await.unwrap();
    store.create_bundle(&b).await.unwrap();

    let (first, second) = tokio::join!(
        claim::pop_bundle(&pool, "WIPAC", "DESY", BundleStatus::Staged, "stager-1"),
        claim::pop_bundle(&pool, "WIPAC", "DESY", BundleStatus::Staged, "stager-2"),
    );
    let first = first.unwrap();
    let second = second.unwrap();

    assert!(first.is_some());
    assert!(second.is_some());
    assert_ne!(first.unwrap().uuid, second.unwrap().uuid);
}

#[tokio::test]
async fn pop_bundle_on_empty_queue_is_none() {
    let (_container, pool) = postgres_pool().await;
    let result = claim::pop_bundle(&pool, "WIPAC", "DESY", BundleStatus::Staged, "stager-1")
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn popped_bundle_is_marked_claimed() {
    let (_container, pool) = postgres_pool().await;
    let store = Store::new(pool.clone());
    let request = Uuid::new_v4();
    let mut bundle = Bundle::new(request, "WIPAC".into(), "DESY".into(), "/data/exp/c.zip".into());
    bundle.status = BundleStatus::Staged;
    store.create_bundle(&bundle).await.unwrap();

    let popped = claim::pop_bundle(&pool, "WIPAC", "DESY", BundleStatus::Staged, "stager-1")
        .await
        .unwrap()
        .expect("bundle should be claimed");
    assert!(popped.claimed);
    assert_eq!(popped.claimant.as_deref(), Some("stager-1"));

    let again = claim::pop_bundle(&pool, "WIPAC", "DESY", BundleStatus::Staged, "stager-2")
        .await
        .unwrap();
    assert!(again.is_none());
}
