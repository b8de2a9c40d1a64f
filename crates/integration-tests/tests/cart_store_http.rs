//! Integration tests for the cart store over HTTP with on-disk snapshots.
//!
//! These tests run a mock inventory service in process; no external services
//! are required.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use rocket_cart_integration_tests::{
    MockInventoryService, spawn_unresponsive, temp_snapshot_dir, test_config,
};
use rocket_cart_store::snapshot;
use rocket_cart_store::{
    CartConfig, CartStore, ChannelNotifier, FileSnapshotStore, Notification, Outcome, ProductId,
    SnapshotStore,
};
use rust_decimal::Decimal;
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;

struct Harness {
    service: MockInventoryService,
    config: CartConfig,
    store: CartStore,
    notifications: UnboundedReceiver<Notification>,
}

impl Harness {
    async fn start(service: MockInventoryService) -> Self {
        let base_url = service.spawn().await.expect("Failed to start mock service");
        let config = test_config(base_url, temp_snapshot_dir());
        let (notifier, notifications) = ChannelNotifier::channel();
        let store = CartStore::from_config(&config, Arc::new(notifier))
            .await
            .expect("Failed to build cart store");
        Self {
            service,
            config,
            store,
            notifications,
        }
    }

    fn notifications(&mut self) -> Vec<Notification> {
        let mut seen = Vec::new();
        while let Ok(n) = self.notifications.try_recv() {
            seen.push(n);
        }
        seen
    }

    /// A second store over the same service and snapshot directory.
    async fn reopen(&self) -> CartStore {
        let (notifier, _rx) = ChannelNotifier::channel();
        CartStore::from_config(&self.config, Arc::new(notifier))
            .await
            .expect("Failed to reopen cart store")
    }

    async fn saved_blob(&self) -> Option<String> {
        FileSnapshotStore::new(&self.config.snapshot_dir)
            .load(&self.config.snapshot_key)
            .await
            .expect("Failed to read snapshot")
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.config.snapshot_dir);
    }
}

fn shoe_service() -> MockInventoryService {
    let service = MockInventoryService::new();
    service.add_product(10, "Shoe", 100.0, "x", 3);
    service
}

// ============================================================================
// Add Tests
// ============================================================================

#[tokio::test]
async fn test_add_until_out_of_stock() {
    let mut h = Harness::start(shoe_service()).await;
    let id = ProductId::new(10);

    assert_eq!(h.store.add_one(id).await, Outcome::Applied);
    let cart = h.store.current_cart();
    let item = cart.get(id).expect("Shoe should be in the cart");
    assert_eq!(item.title, "Shoe");
    assert_eq!(item.price, Decimal::new(100, 0));
    assert_eq!(item.image, "x");
    assert_eq!(item.amount.get(), 1);

    assert_eq!(h.store.add_one(id).await, Outcome::Applied);
    assert_eq!(h.store.add_one(id).await, Outcome::Applied);
    assert_eq!(h.store.current_cart().get(id).map(|i| i.amount.get()), Some(3));
    assert!(h.notifications().is_empty());

    assert_eq!(
        h.store.add_one(id).await,
        Outcome::Rejected(Notification::OutOfStock)
    );
    assert_eq!(h.store.current_cart().get(id).map(|i| i.amount.get()), Some(3));
    assert_eq!(h.notifications(), vec![Notification::OutOfStock]);
}

#[tokio::test]
async fn test_stock_is_checked_on_every_add_and_catalog_is_cached() {
    let mut h = Harness::start(shoe_service()).await;
    let id = ProductId::new(10);

    h.store.add_one(id).await;
    h.store.remove_one(id).await;
    h.store.add_one(id).await;

    assert_eq!(h.service.stock_requests(), 2);
    assert_eq!(h.service.product_requests(), 1);
    assert!(h.notifications().is_empty());
}

#[tokio::test]
async fn test_stock_changes_between_adds_are_seen() {
    let mut h = Harness::start(shoe_service()).await;
    let id = ProductId::new(10);

    h.store.add_one(id).await;
    h.service.set_stock(10, 1);

    assert_eq!(
        h.store.add_one(id).await,
        Outcome::Rejected(Notification::OutOfStock)
    );
    assert_eq!(h.notifications(), vec![Notification::OutOfStock]);
}

#[tokio::test]
async fn test_add_with_missing_stock_record() {
    let service = shoe_service();
    service.respond_with("stock/10", StatusCode::NOT_FOUND, "");
    let mut h = Harness::start(service).await;

    let outcome = h.store.add_one(ProductId::new(10)).await;

    assert_eq!(outcome, Outcome::Rejected(Notification::OutOfStock));
    assert!(h.store.current_cart().is_empty());
    assert_eq!(h.notifications(), vec![Notification::OutOfStock]);
    assert!(h.saved_blob().await.is_none());
}

#[tokio::test]
async fn test_add_with_null_stock_body() {
    let service = shoe_service();
    service.respond_with("stock/10", StatusCode::OK, "null");
    let mut h = Harness::start(service).await;

    let outcome = h.store.add_one(ProductId::new(10)).await;

    assert_eq!(outcome, Outcome::Rejected(Notification::OutOfStock));
    assert_eq!(h.notifications(), vec![Notification::OutOfStock]);
}

#[tokio::test]
async fn test_add_when_service_errors() {
    let service = shoe_service();
    service.respond_with("stock/10", StatusCode::INTERNAL_SERVER_ERROR, "boom");
    let mut h = Harness::start(service).await;

    let outcome = h.store.add_one(ProductId::new(10)).await;

    assert_eq!(outcome, Outcome::Rejected(Notification::AddFailed));
    assert!(h.store.current_cart().is_empty());
    assert_eq!(h.notifications(), vec![Notification::AddFailed]);
}

#[tokio::test]
async fn test_add_with_unknown_catalog_entry() {
    let service = MockInventoryService::new();
    service.set_stock(11, 4);
    let mut h = Harness::start(service).await;

    let outcome = h.store.add_one(ProductId::new(11)).await;

    assert_eq!(outcome, Outcome::Rejected(Notification::AddFailed));
    assert!(h.store.current_cart().is_empty());
    assert_eq!(h.notifications(), vec![Notification::AddFailed]);
}

#[tokio::test]
async fn test_add_with_mismatched_catalog_entry() {
    let service = MockInventoryService::new();
    service.set_stock(12, 4);
    service.set_product_json(
        12,
        json!({ "id": 99, "title": "Wrong", "price": 1, "image": "w" }),
    );
    let mut h = Harness::start(service).await;

    let outcome = h.store.add_one(ProductId::new(12)).await;

    assert_eq!(outcome, Outcome::Rejected(Notification::AddFailed));
    assert!(h.store.current_cart().is_empty());
    assert_eq!(h.notifications(), vec![Notification::AddFailed]);
}

#[tokio::test]
async fn test_add_when_service_hangs() {
    let base_url = spawn_unresponsive().await.expect("Failed to start listener");
    let mut config = test_config(base_url, temp_snapshot_dir());
    config.request_timeout = Some(Duration::from_millis(200));
    let (notifier, mut notifications) = ChannelNotifier::channel();
    let store = CartStore::from_config(&config, Arc::new(notifier))
        .await
        .expect("Failed to build cart store");

    let outcome = store.add_one(ProductId::new(10)).await;

    assert_eq!(outcome, Outcome::Rejected(Notification::AddFailed));
    assert!(store.current_cart().is_empty());
    assert_eq!(notifications.try_recv().ok(), Some(Notification::AddFailed));
}

// ============================================================================
// Remove / Update Tests
// ============================================================================

#[tokio::test]
async fn test_remove_absent_product() {
    let mut h = Harness::start(shoe_service()).await;
    h.store.add_one(ProductId::new(10)).await;
    let before = h.store.current_cart();

    let outcome = h.store.remove_one(ProductId::new(2)).await;

    assert_eq!(outcome, Outcome::Rejected(Notification::RemoveFailed));
    assert_eq!(h.store.current_cart(), before);
    assert_eq!(h.notifications(), vec![Notification::RemoveFailed]);
}

#[tokio::test]
async fn test_set_amount_against_live_stock() {
    let mut h = Harness::start(shoe_service()).await;
    let id = ProductId::new(10);
    h.store.add_one(id).await;

    assert_eq!(h.store.set_amount(id, 3).await, Outcome::Applied);
    assert_eq!(
        h.store.set_amount(id, 4).await,
        Outcome::Rejected(Notification::OutOfStock)
    );
    assert_eq!(h.store.set_amount(id, 0).await, Outcome::Ignored);
    assert_eq!(h.store.set_amount(id, -5).await, Outcome::Ignored);

    assert_eq!(h.store.current_cart().get(id).map(|i| i.amount.get()), Some(3));
    assert_eq!(h.notifications(), vec![Notification::OutOfStock]);
}

#[tokio::test]
async fn test_set_amount_when_rate_limited() {
    let mut h = Harness::start(shoe_service()).await;
    let id = ProductId::new(10);
    h.store.add_one(id).await;
    h.service
        .respond_with("stock/10", StatusCode::TOO_MANY_REQUESTS, "slow down");

    let outcome = h.store.set_amount(id, 2).await;

    assert_eq!(outcome, Outcome::Rejected(Notification::UpdateFailed));
    assert_eq!(h.store.current_cart().get(id).map(|i| i.amount.get()), Some(1));
    assert_eq!(h.notifications(), vec![Notification::UpdateFailed]);
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_snapshot_matches_published_cart() {
    let h = Harness::start(shoe_service()).await;
    h.store.add_one(ProductId::new(10)).await;
    h.store.add_one(ProductId::new(10)).await;

    let blob = h.saved_blob().await.expect("Snapshot should exist");
    let saved = snapshot::decode(&blob).expect("Snapshot should decode");
    assert_eq!(saved, h.store.current_cart());

    let value: serde_json::Value = serde_json::from_str(&blob).expect("Snapshot is JSON");
    assert_eq!(value[0]["id"], 10);
    assert_eq!(value[0]["amount"], 2);
    assert!(value[0]["price"].is_number());
}

#[tokio::test]
async fn test_reopened_store_restores_cart() {
    let service = shoe_service();
    service.add_product(20, "Sandal", 59.9, "y", 10);
    let h = Harness::start(service).await;

    h.store.add_one(ProductId::new(20)).await;
    h.store.add_one(ProductId::new(10)).await;
    h.store.set_amount(ProductId::new(20), 7).await;

    let reopened = h.reopen().await;
    assert_eq!(reopened.current_cart(), h.store.current_cart());
    let ids: Vec<i32> = reopened
        .current_cart()
        .iter()
        .map(|i| i.id.as_i32())
        .collect();
    assert_eq!(ids, vec![20, 10]);
}

#[tokio::test]
async fn test_corrupt_snapshot_starts_empty() {
    let h = Harness::start(shoe_service()).await;
    FileSnapshotStore::new(&h.config.snapshot_dir)
        .save(&h.config.snapshot_key, "[{\"id\":")
        .await
        .expect("Failed to write snapshot");

    let reopened = h.reopen().await;
    assert!(reopened.current_cart().is_empty());

    // And the store is fully usable afterwards
    assert_eq!(reopened.add_one(ProductId::new(10)).await, Outcome::Applied);
}
