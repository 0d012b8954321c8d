// galleria-market/tests/common/mod.rs
#![allow(dead_code)]

use galleria_market::identity::{AuthenticatedUser, Role};
use galleria_market::models::NewAddress;
use galleria_market::store::MemoryStore;
use galleria_market::OrderCartManager;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::sync::Arc;

static TRACING: Lazy<()> = Lazy::new(|| {
  let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
  let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}

/// Cents to a two-place decimal: `money(1000)` is 10.00.
pub fn money(cents: i64) -> Decimal {
  Decimal::new(cents, 2)
}

pub fn address(city: &str) -> NewAddress {
  NewAddress {
    address_line1: "12 Canvas Row".to_string(),
    address_line2: None,
    city: city.to_string(),
    state: Some("CA".to_string()),
    postal_code: "94110".to_string(),
    country: "USA".to_string(),
  }
}

/// A seeded marketplace: one artist with two artworks (10.00 and 5.00), two
/// buyers and an admin.
pub struct Market {
  pub store: MemoryStore,
  pub manager: OrderCartManager,
  pub artist: AuthenticatedUser,
  pub buyer: AuthenticatedUser,
  pub other_buyer: AuthenticatedUser,
  pub admin: AuthenticatedUser,
  pub artwork_a: i64,
  pub artwork_b: i64,
}

impl Market {
  pub async fn seeded() -> Self {
    setup_tracing();
    let store = MemoryStore::new();
    let artist_id = store.add_user("mira", Role::Artist).await;
    let buyer_id = store.add_user("jonas", Role::Customer).await;
    let other_id = store.add_user("ayla", Role::Customer).await;
    let admin_id = store.add_user("root", Role::Admin).await;
    let artwork_a = store.add_artwork(artist_id, "Harbor at Dusk", money(1000)).await;
    let artwork_b = store.add_artwork(artist_id, "Paper Cranes", money(500)).await;

    let manager = OrderCartManager::new(Arc::new(store.clone()), Arc::new(store.clone()));
    Self {
      store,
      manager,
      artist: AuthenticatedUser::artist(artist_id),
      buyer: AuthenticatedUser::customer(buyer_id),
      other_buyer: AuthenticatedUser::customer(other_id),
      admin: AuthenticatedUser::admin(admin_id),
      artwork_a,
      artwork_b,
    }
  }

  /// Cart item id of `artwork_id` in the user's cart, straight from the store.
  pub async fn cart_item_id(&self, user: AuthenticatedUser, artwork_id: i64) -> Option<i64> {
    let data = self.store.snapshot().await;
    let cart = data.cart_of(user.user_id)?;
    data
      .items_in_cart(cart.cart_id)
      .into_iter()
      .find(|item| item.artwork_id == artwork_id)
      .map(|item| item.cart_item_id)
  }
}
