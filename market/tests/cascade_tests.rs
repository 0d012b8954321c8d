// galleria-market/tests/cascade_tests.rs

mod common;

use common::{address, money, Market};
use galleria_market::activity::ActivityKind;
use galleria_market::identity::Role;
use galleria_market::models::AddressSelection;
use galleria_market::store::{Relation, StoreOp};
use galleria_market::MarketError;

/// Buyer likes, comments on and buys artwork A, then puts it in the cart again.
async fn engaged_artwork(m: &Market) -> i64 {
  m.store.add_tag(m.artwork_a, "seascape").await;
  m.store.add_tag(m.artwork_a, "oil").await;
  m.store.add_like(m.buyer.user_id, m.artwork_a).await;
  m.store.add_comment(m.buyer.user_id, m.artwork_a, "Lovely light").await;

  let address_id = m.store.add_address(m.buyer.user_id, address("Oakland"), true).await;
  m.manager.add_to_cart(m.buyer, m.artwork_a).await.unwrap();
  let order_id = m
    .manager
    .place_order(m.buyer, AddressSelection::Saved(address_id))
    .await
    .unwrap();
  m.manager.add_to_cart(m.buyer, m.artwork_a).await.unwrap();
  order_id
}

#[tokio::test]
async fn artwork_delete_removes_dependents_but_keeps_order_history() {
  let m = Market::seeded().await;
  let order_id = engaged_artwork(&m).await;

  let report = m.manager.cascade_delete_for_artwork(m.admin, m.artwork_a).await.unwrap();
  assert_eq!(report.count(Relation::ArtworkTags), 2);
  assert_eq!(report.count(Relation::Likes), 1);
  assert_eq!(report.count(Relation::Comments), 1);
  assert_eq!(report.count(Relation::CartItems), 1);
  assert_eq!(report.count(Relation::Artworks), 1);
  assert_eq!(report.count(Relation::OrderItems), 0);

  let data = m.store.snapshot().await;
  assert!(!data.artworks.contains_key(&m.artwork_a));
  assert!(data.artwork_tags.is_empty());
  assert_eq!(data.items_of_order(order_id).len(), 1);

  let detail = m.manager.get_order(m.buyer, order_id).await.unwrap();
  assert_eq!(detail.lines[0].title, None);
  assert_eq!(detail.lines[0].price, money(1000));
}

#[tokio::test]
async fn artist_can_delete_only_their_own_artwork() {
  let m = Market::seeded().await;
  let rival_id = m.store.add_user("kai", Role::Artist).await;
  let rival = galleria_market::AuthenticatedUser::artist(rival_id);

  let err = m.manager.delete_artwork_as_artist(rival, m.artwork_a).await.unwrap_err();
  assert!(matches!(err, MarketError::NotFound(_)), "got {:?}", err);
  assert!(m.store.snapshot().await.artworks.contains_key(&m.artwork_a));

  let report = m.manager.delete_artwork_as_artist(m.artist, m.artwork_a).await.unwrap();
  assert_eq!(report.count(Relation::Artworks), 1);

  let delete = m
    .store
    .activity_entries()
    .into_iter()
    .find(|e| e.kind == ActivityKind::Delete)
    .expect("delete entry");
  assert!(delete.description.contains("Harbor at Dusk"));
}

#[tokio::test]
async fn admin_delete_requires_an_admin() {
  let m = Market::seeded().await;

  let err = m.manager.cascade_delete_for_artwork(m.buyer, m.artwork_a).await.unwrap_err();
  assert!(matches!(err, MarketError::Auth(_)), "got {:?}", err);

  let err = m.manager.cascade_delete_for_user(m.artist, m.buyer.user_id).await.unwrap_err();
  assert!(matches!(err, MarketError::Auth(_)), "got {:?}", err);
}

#[tokio::test]
async fn missing_targets_are_not_found() {
  let m = Market::seeded().await;

  let err = m.manager.cascade_delete_for_artwork(m.admin, 999).await.unwrap_err();
  assert!(matches!(err, MarketError::NotFound(_)));

  let err = m.manager.cascade_delete_for_user(m.admin, 999).await.unwrap_err();
  assert_eq!(err.to_string(), "Not found: User not found");
}

#[tokio::test]
async fn admin_cannot_delete_their_own_account() {
  let m = Market::seeded().await;

  let err = m.manager.cascade_delete_for_user(m.admin, m.admin.user_id).await.unwrap_err();
  assert_eq!(
    err.field_errors().and_then(|f| f.get("user_id")),
    Some("You cannot delete your own account")
  );
  assert!(m.store.snapshot().await.users.contains_key(&m.admin.user_id));
}

#[tokio::test]
async fn user_delete_removes_everything_they_own() {
  let m = Market::seeded().await;
  engaged_artwork(&m).await;
  // Someone else's like on the artist's work goes with the artwork.
  m.store.add_like(m.other_buyer.user_id, m.artwork_b).await;

  let report = m.manager.cascade_delete_for_user(m.admin, m.buyer.user_id).await.unwrap();
  assert_eq!(report.count(Relation::Users), 1);
  assert_eq!(report.count(Relation::Orders), 1);
  assert_eq!(report.count(Relation::OrderItems), 1);
  assert_eq!(report.count(Relation::Carts), 1);
  assert_eq!(report.count(Relation::Addresses), 1);

  let data = m.store.snapshot().await;
  assert!(!data.users.contains_key(&m.buyer.user_id));
  assert!(data.orders_of(m.buyer.user_id).is_empty());
  assert!(data.order_items.is_empty());
  assert!(data.cart_of(m.buyer.user_id).is_none());
  assert!(data.addresses.values().all(|a| a.user_id != m.buyer.user_id));
  assert!(data.likes.values().all(|l| l.user_id != m.buyer.user_id));
  assert!(data.comments.is_empty());
  // The artist and their listings are untouched.
  assert!(data.artworks.contains_key(&m.artwork_a));
  assert_eq!(data.likes.len(), 1);
}

#[tokio::test]
async fn deleting_an_artist_takes_their_artworks_along() {
  let m = Market::seeded().await;
  engaged_artwork(&m).await;

  let report = m.manager.cascade_delete_for_user(m.admin, m.artist.user_id).await.unwrap();
  assert_eq!(report.count(Relation::Artworks), 2);

  let data = m.store.snapshot().await;
  assert!(data.artworks.is_empty());
  assert!(data.likes.is_empty());
  // The buyer's purchase history stays.
  assert_eq!(data.order_items.len(), 1);
  let cart = data.cart_of(m.buyer.user_id).unwrap();
  assert!(data.items_in_cart(cart.cart_id).is_empty());

  let admin_action = m
    .store
    .activity_entries()
    .into_iter()
    .find(|e| e.kind == ActivityKind::AdminAction)
    .expect("admin entry");
  assert_eq!(admin_action.user_id, m.admin.user_id);
}

#[tokio::test]
async fn failure_part_way_through_a_cascade_deletes_nothing() {
  let m = Market::seeded().await;
  engaged_artwork(&m).await;
  let before = m.store.snapshot().await;
  m.store.fail_after(StoreOp::DeleteRelated, 2);

  let err = m.manager.cascade_delete_for_artwork(m.admin, m.artwork_a).await.unwrap_err();
  assert!(matches!(err, MarketError::Persistence(_)));

  let after = m.store.snapshot().await;
  assert_eq!(after.artwork_tags, before.artwork_tags);
  assert_eq!(after.likes, before.likes);
  assert_eq!(after.comments, before.comments);
  assert_eq!(after.artworks, before.artworks);
}
