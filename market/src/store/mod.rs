// galleria-market/src/store/mod.rs

//! The storage seam of the Order/Cart Manager.
//!
//! Every write goes through a [`StoreTx`] opened by [`MarketStore::begin`].
//! Reads that must agree with each other (an order and its lines) use one too.

pub mod cascade;
pub mod memory;
pub mod postgres;
pub mod unit_of_work;

pub use cascade::{CascadePlan, CascadeReport, CascadeStep, CascadeTarget, Link, Relation};
pub use memory::{FailPoint, MemoryData, MemoryStore, StoreOp};
pub use postgres::PgStore;
pub use unit_of_work::UnitOfWork;

use crate::models::{
  Address, ArtworkSummary, Cart, CartItem, CartLine, NewAddress, Order, OrderItem, OrderLine, OrderStatus,
  OrderSummary,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("injected failure in {0}")]
  Injected(String),

  #[error("transaction already open")]
  AlreadyOpen,

  #[error("transaction already finished")]
  Finished,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait MarketStore: Send + Sync {
  /// Short backend name for logs.
  fn backend(&self) -> &'static str;

  async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;
}

/// One open transaction.
///
/// Dropping a `StoreTx` without calling [`StoreTx::commit`] discards every
/// write made through it.
#[async_trait]
pub trait StoreTx: Send {
  // --- Catalog and directory lookups ---
  async fn artwork(&mut self, artwork_id: i64) -> StoreResult<Option<ArtworkSummary>>;
  async fn user_exists(&mut self, user_id: i64) -> StoreResult<bool>;
  async fn artworks_by_artist(&mut self, artist_id: i64) -> StoreResult<Vec<i64>>;

  // --- Cart ---
  async fn find_cart(&mut self, user_id: i64) -> StoreResult<Option<Cart>>;
  async fn create_cart(&mut self, user_id: i64) -> StoreResult<Cart>;
  async fn find_cart_item(&mut self, cart_id: i64, artwork_id: i64) -> StoreResult<Option<CartItem>>;
  /// Returns `None` when the cart already holds a line for `artwork_id`.
  async fn insert_cart_item(&mut self, cart_id: i64, artwork_id: i64, quantity: i32)
    -> StoreResult<Option<CartItem>>;
  async fn count_cart_items(&mut self, cart_id: i64) -> StoreResult<i64>;
  /// Returns `false` when the item does not exist in a cart owned by `user_id`.
  async fn set_owned_item_quantity(&mut self, user_id: i64, cart_item_id: i64, quantity: i32) -> StoreResult<bool>;
  /// Returns `false` when the item does not exist in a cart owned by `user_id`.
  async fn delete_owned_item(&mut self, user_id: i64, cart_item_id: i64) -> StoreResult<bool>;
  /// The user's cart joined with current artwork prices, newest first.
  async fn cart_lines(&mut self, user_id: i64) -> StoreResult<Vec<CartLine>>;
  async fn clear_cart(&mut self, cart_id: i64) -> StoreResult<u64>;

  // --- Addresses ---
  /// Default address first.
  async fn addresses(&mut self, user_id: i64) -> StoreResult<Vec<Address>>;
  async fn find_address(&mut self, user_id: i64, address_id: i64) -> StoreResult<Option<Address>>;
  async fn count_addresses(&mut self, user_id: i64) -> StoreResult<i64>;
  async fn insert_address(&mut self, user_id: i64, address: &NewAddress, is_default: bool) -> StoreResult<Address>;

  // --- Orders ---
  async fn insert_order(&mut self, user_id: i64, total_amount: Decimal, status: OrderStatus) -> StoreResult<Order>;
  async fn insert_order_item(
    &mut self,
    order_id: i64,
    artwork_id: i64,
    price: Decimal,
    quantity: i32,
  ) -> StoreResult<OrderItem>;
  /// Newest first.
  async fn orders(&mut self, user_id: i64) -> StoreResult<Vec<OrderSummary>>;
  async fn find_order(&mut self, user_id: i64, order_id: i64) -> StoreResult<Option<Order>>;
  async fn order_lines(&mut self, order_id: i64) -> StoreResult<Vec<OrderLine>>;

  // --- Cascading deletes ---
  /// Deletes the rows of `relation` linked to `parent_id` through `link`.
  async fn delete_related(&mut self, relation: Relation, link: Link, parent_id: i64) -> StoreResult<u64>;

  async fn commit(self: Box<Self>) -> StoreResult<()>;
  async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
