// galleria-market/tests/cart_tests.rs

mod common;

use common::{money, Market};
use galleria_market::activity::ActivityKind;
use galleria_market::store::StoreOp;
use galleria_market::MarketError;
use std::collections::BTreeMap;

#[tokio::test]
async fn adding_the_same_artwork_twice_keeps_one_line() {
  let m = Market::seeded().await;

  let first = m.manager.add_to_cart(m.buyer, m.artwork_a).await.unwrap();
  assert_eq!(first.cart_item_count, 1);
  assert!(!first.already_in_cart);

  let second = m.manager.add_to_cart(m.buyer, m.artwork_a).await.unwrap();
  assert_eq!(second.cart_item_count, 1);
  assert!(second.already_in_cart);

  let view = m.manager.view_cart(m.buyer).await.unwrap();
  assert_eq!(view.lines.len(), 1);
  assert_eq!(view.lines[0].quantity, 1);
}

#[tokio::test]
async fn unknown_artwork_is_not_found_and_creates_no_cart() {
  let m = Market::seeded().await;

  let err = m.manager.add_to_cart(m.buyer, 99).await.unwrap_err();
  assert!(matches!(err, MarketError::NotFound(_)), "got {:?}", err);

  let data = m.store.snapshot().await;
  assert!(data.cart_of(m.buyer.user_id).is_none());
  assert!(data.cart_items.is_empty());
}

#[tokio::test]
async fn cart_total_sums_live_prices() {
  let m = Market::seeded().await;
  m.manager.add_to_cart(m.buyer, m.artwork_a).await.unwrap();
  m.manager.add_to_cart(m.buyer, m.artwork_b).await.unwrap();
  let item_a = m.cart_item_id(m.buyer, m.artwork_a).await.unwrap();

  let view = m.manager.update_cart(m.buyer, BTreeMap::from([(item_a, 2)])).await.unwrap();
  assert_eq!(view.total, money(2500));

  m.store.set_artwork_price(m.artwork_b, money(700)).await;
  let view = m.manager.view_cart(m.buyer).await.unwrap();
  assert_eq!(view.total, money(2700));
  // Newest line first.
  assert_eq!(view.lines[0].artwork_id, m.artwork_b);
  assert_eq!(view.subtotal_of(item_a), Some(money(2000)));
}

#[tokio::test]
async fn zero_or_negative_quantity_removes_the_line() {
  let m = Market::seeded().await;
  m.manager.add_to_cart(m.buyer, m.artwork_a).await.unwrap();
  m.manager.add_to_cart(m.buyer, m.artwork_b).await.unwrap();
  let item_a = m.cart_item_id(m.buyer, m.artwork_a).await.unwrap();
  let item_b = m.cart_item_id(m.buyer, m.artwork_b).await.unwrap();

  let view = m
    .manager
    .update_cart(m.buyer, BTreeMap::from([(item_a, 0), (item_b, -3)]))
    .await
    .unwrap();

  assert!(view.is_empty());
  assert_eq!(view.total, money(0));
  let data = m.store.snapshot().await;
  assert!(data.cart_of(m.buyer.user_id).is_some(), "the cart row itself stays");
}

#[tokio::test]
async fn another_users_items_are_left_alone() {
  let m = Market::seeded().await;
  m.manager.add_to_cart(m.other_buyer, m.artwork_a).await.unwrap();
  let foreign_item = m.cart_item_id(m.other_buyer, m.artwork_a).await.unwrap();

  let view = m
    .manager
    .update_cart(m.buyer, BTreeMap::from([(foreign_item, 5)]))
    .await
    .unwrap();
  assert!(view.is_empty());

  m.manager.remove_from_cart(m.buyer, foreign_item).await.unwrap();

  let theirs = m.manager.view_cart(m.other_buyer).await.unwrap();
  assert_eq!(theirs.lines.len(), 1);
  assert_eq!(theirs.lines[0].quantity, 1);
}

#[tokio::test]
async fn remove_from_cart_deletes_only_that_line() {
  let m = Market::seeded().await;
  m.manager.add_to_cart(m.buyer, m.artwork_a).await.unwrap();
  m.manager.add_to_cart(m.buyer, m.artwork_b).await.unwrap();
  let item_a = m.cart_item_id(m.buyer, m.artwork_a).await.unwrap();

  m.manager.remove_from_cart(m.buyer, item_a).await.unwrap();
  // A second removal is a silent no-op.
  m.manager.remove_from_cart(m.buyer, item_a).await.unwrap();

  let view = m.manager.view_cart(m.buyer).await.unwrap();
  assert_eq!(view.lines.len(), 1);
  assert_eq!(view.lines[0].artwork_id, m.artwork_b);
}

#[tokio::test]
async fn cart_changes_are_logged_after_commit() {
  let m = Market::seeded().await;
  m.manager.add_to_cart(m.buyer, m.artwork_a).await.unwrap();
  m.manager.add_to_cart(m.buyer, m.artwork_a).await.unwrap();
  let item_a = m.cart_item_id(m.buyer, m.artwork_a).await.unwrap();
  m.manager.update_cart(m.buyer, BTreeMap::from([(item_a, 3)])).await.unwrap();

  let entries = m.store.activity_entries();
  let kinds: Vec<ActivityKind> = entries.iter().map(|e| e.kind).collect();
  assert_eq!(kinds, vec![ActivityKind::CartAdd, ActivityKind::CartUpdate]);
  assert!(entries[0].description.contains("Harbor at Dusk"));
}

#[tokio::test]
async fn activity_log_failure_does_not_undo_the_add() {
  let m = Market::seeded().await;
  m.store.fail_after(StoreOp::RecordActivity, 0);

  let outcome = m.manager.add_to_cart(m.buyer, m.artwork_a).await.unwrap();
  assert_eq!(outcome.cart_item_count, 1);
  assert!(m.store.activity_entries().is_empty());
  assert!(m.cart_item_id(m.buyer, m.artwork_a).await.is_some());
}

#[tokio::test]
async fn storage_failure_mid_add_leaves_no_cart_behind() {
  let m = Market::seeded().await;
  m.store.fail_after(StoreOp::InsertCartItem, 0);

  let err = m.manager.add_to_cart(m.buyer, m.artwork_a).await.unwrap_err();
  assert!(matches!(err, MarketError::Persistence(_)), "got {:?}", err);

  m.store.clear_fail_points();
  let data = m.store.snapshot().await;
  assert!(data.cart_of(m.buyer.user_id).is_none());

  // The store is usable again once the failure is gone.
  m.manager.add_to_cart(m.buyer, m.artwork_a).await.unwrap();
}

#[tokio::test]
async fn activity_can_go_to_tracing_instead_of_the_store() {
  let m = Market::seeded().await;
  let manager = galleria_market::OrderCartManager::new(
    std::sync::Arc::new(m.store.clone()),
    std::sync::Arc::new(galleria_market::activity::TracingActivityLog),
  );

  let outcome = manager.add_to_cart(m.buyer, m.artwork_b).await.unwrap();
  assert_eq!(outcome.cart_item_count, 1);
  assert!(m.store.activity_entries().is_empty());
}

#[tokio::test]
async fn failed_quantity_batch_reverts_every_change() {
  let m = Market::seeded().await;
  m.manager.add_to_cart(m.buyer, m.artwork_a).await.unwrap();
  m.manager.add_to_cart(m.buyer, m.artwork_b).await.unwrap();
  let item_a = m.cart_item_id(m.buyer, m.artwork_a).await.unwrap();
  let item_b = m.cart_item_id(m.buyer, m.artwork_b).await.unwrap();
  m.store.fail_after(StoreOp::SetItemQuantity, 1);

  let err = m
    .manager
    .update_cart(m.buyer, BTreeMap::from([(item_a, 3), (item_b, 4)]))
    .await
    .unwrap_err();
  assert!(matches!(err, MarketError::Persistence(_)), "got {:?}", err);

  m.store.clear_fail_points();
  let view = m.manager.view_cart(m.buyer).await.unwrap();
  let mut quantities: Vec<i32> = view.lines.iter().map(|line| line.quantity).collect();
  quantities.sort();
  assert_eq!(quantities, vec![1, 1]);
  assert_eq!(view.total, money(1500));
}

#[tokio::test]
async fn cart_operations_run_on_spawned_tasks() {
  let m = Market::seeded().await;
  let manager = std::sync::Arc::new(galleria_market::OrderCartManager::new(
    std::sync::Arc::new(m.store.clone()),
    std::sync::Arc::new(m.store.clone()),
  ));
  let (buyer, artwork_a) = (m.buyer, m.artwork_a);

  let task = {
    let manager = manager.clone();
    tokio::spawn(async move { manager.add_to_cart(buyer, artwork_a).await })
  };
  let outcome = task.await.unwrap().unwrap();
  assert_eq!(outcome.cart_item_count, 1);

  let item_a = m.cart_item_id(buyer, artwork_a).await.unwrap();
  let task = {
    let manager = manager.clone();
    tokio::spawn(async move { manager.update_cart(buyer, BTreeMap::from([(item_a, 2)])).await })
  };
  let view = task.await.unwrap().unwrap();
  assert_eq!(view.total, money(2000));
}
