// galleria-market/src/store/memory.rs

//! In-process store.
//!
//! Transactions are serialized: `begin` takes the data lock, works on a copy
//! and publishes the copy on commit. Fail points make any operation fail on
//! demand, which is how the rollback paths are exercised in tests.

use super::{Link, MarketStore, Relation, StoreError, StoreResult, StoreTx};
use crate::activity::{ActivityEntry, ActivityKind, ActivityLogger};
use crate::identity::Role;
use crate::models::{
  Address, ArtworkSummary, Cart, CartItem, CartLine, NewAddress, Order, OrderItem, OrderLine, OrderStatus,
  OrderSummary,
};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{event, Level};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
  pub user_id: i64,
  pub username: String,
  pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeRecord {
  pub like_id: i64,
  pub user_id: i64,
  pub artwork_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
  pub comment_id: i64,
  pub user_id: i64,
  pub artwork_id: i64,
  pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
  pub artwork_id: i64,
  pub tag: String,
}

/// Every table of the marketplace, as plain collections.
#[derive(Debug, Clone, Default)]
pub struct MemoryData {
  pub users: BTreeMap<i64, UserRecord>,
  pub artworks: BTreeMap<i64, ArtworkSummary>,
  pub artwork_tags: Vec<TagRecord>,
  pub likes: BTreeMap<i64, LikeRecord>,
  pub comments: BTreeMap<i64, CommentRecord>,
  pub carts: BTreeMap<i64, Cart>,
  pub cart_items: BTreeMap<i64, CartItem>,
  pub orders: BTreeMap<i64, Order>,
  pub order_items: BTreeMap<i64, OrderItem>,
  pub addresses: BTreeMap<i64, Address>,
  next_id: i64,
}

impl MemoryData {
  fn next_id(&mut self) -> i64 {
    self.next_id += 1;
    self.next_id
  }

  pub fn cart_of(&self, user_id: i64) -> Option<&Cart> {
    self.carts.values().find(|c| c.user_id == user_id)
  }

  pub fn items_in_cart(&self, cart_id: i64) -> Vec<&CartItem> {
    self.cart_items.values().filter(|i| i.cart_id == cart_id).collect()
  }

  pub fn orders_of(&self, user_id: i64) -> Vec<&Order> {
    self.orders.values().filter(|o| o.user_id == user_id).collect()
  }

  pub fn items_of_order(&self, order_id: i64) -> Vec<&OrderItem> {
    self.order_items.values().filter(|i| i.order_id == order_id).collect()
  }

  fn owns_item(&self, user_id: i64, cart_item_id: i64) -> bool {
    self
      .cart_items
      .get(&cart_item_id)
      .and_then(|item| self.carts.get(&item.cart_id))
      .is_some_and(|cart| cart.user_id == user_id)
  }
}

/// Every `StoreTx` operation, for fail points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
  Begin,
  Artwork,
  UserExists,
  ArtworksByArtist,
  FindCart,
  CreateCart,
  FindCartItem,
  InsertCartItem,
  CountCartItems,
  SetItemQuantity,
  DeleteItem,
  CartLines,
  ClearCart,
  Addresses,
  FindAddress,
  CountAddresses,
  InsertAddress,
  InsertOrder,
  InsertOrderItem,
  Orders,
  FindOrder,
  OrderLines,
  DeleteRelated,
  Commit,
  RecordActivity,
}

/// Lets `successes` calls of `op` through, then fails every later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailPoint {
  pub op: StoreOp,
  pub successes: usize,
}

#[derive(Debug, Default)]
struct FailPoints {
  armed: HashMap<StoreOp, usize>,
  calls: HashMap<StoreOp, usize>,
}

impl FailPoints {
  fn check(&mut self, op: StoreOp) -> StoreResult<()> {
    let calls = self.calls.entry(op).or_insert(0);
    *calls += 1;
    match self.armed.get(&op) {
      Some(successes) if *calls > *successes => {
        event!(Level::WARN, ?op, call = *calls, "Injected store failure.");
        Err(StoreError::Injected(format!("{:?}", op)))
      }
      _ => Ok(()),
    }
  }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
  data: Arc<Mutex<MemoryData>>,
  faults: Arc<parking_lot::Mutex<FailPoints>>,
  activity: Arc<parking_lot::Mutex<Vec<ActivityEntry>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  // --- Fail points ---

  pub fn arm(&self, point: FailPoint) {
    let mut faults = self.faults.lock();
    faults.calls.insert(point.op, 0);
    faults.armed.insert(point.op, point.successes);
  }

  pub fn fail_after(&self, op: StoreOp, successes: usize) {
    self.arm(FailPoint { op, successes });
  }

  pub fn clear_fail_points(&self) {
    let mut faults = self.faults.lock();
    faults.armed.clear();
    faults.calls.clear();
  }

  // --- Seeding and inspection ---

  /// A copy of the committed state.
  pub async fn snapshot(&self) -> MemoryData {
    self.data.lock().await.clone()
  }

  pub async fn add_user(&self, username: &str, role: Role) -> i64 {
    let mut data = self.data.lock().await;
    let user_id = data.next_id();
    data.users.insert(
      user_id,
      UserRecord {
        user_id,
        username: username.to_string(),
        role,
      },
    );
    user_id
  }

  pub async fn add_artwork(&self, artist_id: i64, title: &str, price: Decimal) -> i64 {
    let mut data = self.data.lock().await;
    let artwork_id = data.next_id();
    data.artworks.insert(
      artwork_id,
      ArtworkSummary {
        artwork_id,
        artist_id,
        title: title.to_string(),
        price,
      },
    );
    artwork_id
  }

  pub async fn set_artwork_price(&self, artwork_id: i64, price: Decimal) -> bool {
    let mut data = self.data.lock().await;
    match data.artworks.get_mut(&artwork_id) {
      Some(artwork) => {
        artwork.price = price;
        true
      }
      None => false,
    }
  }

  pub async fn add_like(&self, user_id: i64, artwork_id: i64) -> i64 {
    let mut data = self.data.lock().await;
    let like_id = data.next_id();
    data.likes.insert(
      like_id,
      LikeRecord {
        like_id,
        user_id,
        artwork_id,
      },
    );
    like_id
  }

  pub async fn add_comment(&self, user_id: i64, artwork_id: i64, body: &str) -> i64 {
    let mut data = self.data.lock().await;
    let comment_id = data.next_id();
    data.comments.insert(
      comment_id,
      CommentRecord {
        comment_id,
        user_id,
        artwork_id,
        body: body.to_string(),
      },
    );
    comment_id
  }

  pub async fn add_tag(&self, artwork_id: i64, tag: &str) {
    self.data.lock().await.artwork_tags.push(TagRecord {
      artwork_id,
      tag: tag.to_string(),
    });
  }

  pub async fn add_address(&self, user_id: i64, address: NewAddress, is_default: bool) -> i64 {
    let mut data = self.data.lock().await;
    insert_address(&mut data, user_id, &address, is_default).address_id
  }

  pub fn activity_entries(&self) -> Vec<ActivityEntry> {
    self.activity.lock().clone()
  }
}

#[async_trait]
impl MarketStore for MemoryStore {
  fn backend(&self) -> &'static str {
    "memory"
  }

  async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
    self.faults.lock().check(StoreOp::Begin)?;
    let guard = Arc::clone(&self.data).lock_owned().await;
    let work = guard.clone();
    Ok(Box::new(MemoryTx {
      guard,
      work,
      faults: Arc::clone(&self.faults),
    }))
  }
}

#[async_trait]
impl ActivityLogger for MemoryStore {
  async fn record(&self, user_id: i64, kind: ActivityKind, description: &str) -> StoreResult<()> {
    self.faults.lock().check(StoreOp::RecordActivity)?;
    self.activity.lock().push(ActivityEntry {
      user_id,
      kind,
      description: description.to_string(),
      created_at: Utc::now(),
    });
    Ok(())
  }
}

pub struct MemoryTx {
  guard: OwnedMutexGuard<MemoryData>,
  work: MemoryData,
  faults: Arc<parking_lot::Mutex<FailPoints>>,
}

impl MemoryTx {
  fn check(&self, op: StoreOp) -> StoreResult<()> {
    self.faults.lock().check(op)
  }
}

fn insert_address(data: &mut MemoryData, user_id: i64, address: &NewAddress, is_default: bool) -> Address {
  let address_id = data.next_id();
  let row = Address {
    address_id,
    user_id,
    address_line1: address.address_line1.clone(),
    address_line2: address.address_line2.clone(),
    city: address.city.clone(),
    state: address.state.clone(),
    postal_code: address.postal_code.clone(),
    country: address.country.clone(),
    is_default,
  };
  data.addresses.insert(address_id, row.clone());
  row
}

/// The keys a row can be linked to its cascade parent by.
#[derive(Default)]
struct RowKeys {
  id: Option<i64>,
  artwork_id: Option<i64>,
  user_id: Option<i64>,
  cart_id: Option<i64>,
  order_id: Option<i64>,
}

struct Selector {
  link: Link,
  parent_id: i64,
  owned_carts: BTreeSet<i64>,
  owned_orders: BTreeSet<i64>,
}

impl Selector {
  fn new(data: &MemoryData, link: Link, parent_id: i64) -> Self {
    let owned_carts = data
      .carts
      .values()
      .filter(|c| c.user_id == parent_id)
      .map(|c| c.cart_id)
      .collect();
    let owned_orders = data
      .orders
      .values()
      .filter(|o| o.user_id == parent_id)
      .map(|o| o.order_id)
      .collect();
    Self {
      link,
      parent_id,
      owned_carts,
      owned_orders,
    }
  }

  fn selects(&self, keys: RowKeys) -> bool {
    match self.link {
      Link::ByArtwork => keys.artwork_id == Some(self.parent_id),
      Link::ByUser => keys.user_id == Some(self.parent_id),
      Link::ByCartOwner => keys.cart_id.is_some_and(|c| self.owned_carts.contains(&c)),
      Link::ByOrderOwner => keys.order_id.is_some_and(|o| self.owned_orders.contains(&o)),
      Link::Itself => keys.id == Some(self.parent_id),
    }
  }
}

fn remove_rows<V>(rows: &mut BTreeMap<i64, V>, selector: &Selector, keys: impl Fn(&V) -> RowKeys) -> u64 {
  let before = rows.len();
  rows.retain(|_, row| !selector.selects(keys(row)));
  (before - rows.len()) as u64
}

#[async_trait]
impl StoreTx for MemoryTx {
  async fn artwork(&mut self, artwork_id: i64) -> StoreResult<Option<ArtworkSummary>> {
    self.check(StoreOp::Artwork)?;
    Ok(self.work.artworks.get(&artwork_id).cloned())
  }

  async fn user_exists(&mut self, user_id: i64) -> StoreResult<bool> {
    self.check(StoreOp::UserExists)?;
    Ok(self.work.users.contains_key(&user_id))
  }

  async fn artworks_by_artist(&mut self, artist_id: i64) -> StoreResult<Vec<i64>> {
    self.check(StoreOp::ArtworksByArtist)?;
    Ok(
      self
        .work
        .artworks
        .values()
        .filter(|a| a.artist_id == artist_id)
        .map(|a| a.artwork_id)
        .collect(),
    )
  }

  async fn find_cart(&mut self, user_id: i64) -> StoreResult<Option<Cart>> {
    self.check(StoreOp::FindCart)?;
    Ok(self.work.cart_of(user_id).cloned())
  }

  async fn create_cart(&mut self, user_id: i64) -> StoreResult<Cart> {
    self.check(StoreOp::CreateCart)?;
    if let Some(existing) = self.work.cart_of(user_id) {
      return Ok(existing.clone());
    }
    let cart_id = self.work.next_id();
    let cart = Cart {
      cart_id,
      user_id,
      created_at: Utc::now(),
    };
    self.work.carts.insert(cart_id, cart.clone());
    Ok(cart)
  }

  async fn find_cart_item(&mut self, cart_id: i64, artwork_id: i64) -> StoreResult<Option<CartItem>> {
    self.check(StoreOp::FindCartItem)?;
    Ok(
      self
        .work
        .cart_items
        .values()
        .find(|i| i.cart_id == cart_id && i.artwork_id == artwork_id)
        .cloned(),
    )
  }

  async fn insert_cart_item(
    &mut self,
    cart_id: i64,
    artwork_id: i64,
    quantity: i32,
  ) -> StoreResult<Option<CartItem>> {
    self.check(StoreOp::InsertCartItem)?;
    let taken = self
      .work
      .cart_items
      .values()
      .any(|i| i.cart_id == cart_id && i.artwork_id == artwork_id);
    if taken {
      return Ok(None);
    }
    let cart_item_id = self.work.next_id();
    let item = CartItem {
      cart_item_id,
      cart_id,
      artwork_id,
      quantity,
      created_at: Utc::now(),
    };
    self.work.cart_items.insert(cart_item_id, item.clone());
    Ok(Some(item))
  }

  async fn count_cart_items(&mut self, cart_id: i64) -> StoreResult<i64> {
    self.check(StoreOp::CountCartItems)?;
    Ok(self.work.items_in_cart(cart_id).len() as i64)
  }

  async fn set_owned_item_quantity(&mut self, user_id: i64, cart_item_id: i64, quantity: i32) -> StoreResult<bool> {
    self.check(StoreOp::SetItemQuantity)?;
    if !self.work.owns_item(user_id, cart_item_id) {
      return Ok(false);
    }
    if let Some(item) = self.work.cart_items.get_mut(&cart_item_id) {
      item.quantity = quantity;
    }
    Ok(true)
  }

  async fn delete_owned_item(&mut self, user_id: i64, cart_item_id: i64) -> StoreResult<bool> {
    self.check(StoreOp::DeleteItem)?;
    if !self.work.owns_item(user_id, cart_item_id) {
      return Ok(false);
    }
    Ok(self.work.cart_items.remove(&cart_item_id).is_some())
  }

  async fn cart_lines(&mut self, user_id: i64) -> StoreResult<Vec<CartLine>> {
    self.check(StoreOp::CartLines)?;
    let Some(cart) = self.work.cart_of(user_id) else {
      return Ok(Vec::new());
    };
    let mut items = self.work.items_in_cart(cart.cart_id);
    items.sort_by(|a, b| b.cart_item_id.cmp(&a.cart_item_id));
    Ok(
      items
        .into_iter()
        .filter_map(|item| {
          let artwork = self.work.artworks.get(&item.artwork_id)?;
          Some(CartLine::new(
            item.cart_item_id,
            item.artwork_id,
            artwork.title.clone(),
            artwork.price,
            item.quantity,
          ))
        })
        .collect(),
    )
  }

  async fn clear_cart(&mut self, cart_id: i64) -> StoreResult<u64> {
    self.check(StoreOp::ClearCart)?;
    let before = self.work.cart_items.len();
    self.work.cart_items.retain(|_, item| item.cart_id != cart_id);
    Ok((before - self.work.cart_items.len()) as u64)
  }

  async fn addresses(&mut self, user_id: i64) -> StoreResult<Vec<Address>> {
    self.check(StoreOp::Addresses)?;
    let mut rows: Vec<Address> = self
      .work
      .addresses
      .values()
      .filter(|a| a.user_id == user_id)
      .cloned()
      .collect();
    rows.sort_by(|a, b| b.is_default.cmp(&a.is_default).then(a.address_id.cmp(&b.address_id)));
    Ok(rows)
  }

  async fn find_address(&mut self, user_id: i64, address_id: i64) -> StoreResult<Option<Address>> {
    self.check(StoreOp::FindAddress)?;
    Ok(
      self
        .work
        .addresses
        .get(&address_id)
        .filter(|a| a.user_id == user_id)
        .cloned(),
    )
  }

  async fn count_addresses(&mut self, user_id: i64) -> StoreResult<i64> {
    self.check(StoreOp::CountAddresses)?;
    Ok(self.work.addresses.values().filter(|a| a.user_id == user_id).count() as i64)
  }

  async fn insert_address(&mut self, user_id: i64, address: &NewAddress, is_default: bool) -> StoreResult<Address> {
    self.check(StoreOp::InsertAddress)?;
    Ok(insert_address(&mut self.work, user_id, address, is_default))
  }

  async fn insert_order(&mut self, user_id: i64, total_amount: Decimal, status: OrderStatus) -> StoreResult<Order> {
    self.check(StoreOp::InsertOrder)?;
    let order_id = self.work.next_id();
    let order = Order {
      order_id,
      user_id,
      total_amount,
      status,
      created_at: Utc::now(),
    };
    self.work.orders.insert(order_id, order.clone());
    Ok(order)
  }

  async fn insert_order_item(
    &mut self,
    order_id: i64,
    artwork_id: i64,
    price: Decimal,
    quantity: i32,
  ) -> StoreResult<OrderItem> {
    self.check(StoreOp::InsertOrderItem)?;
    let order_item_id = self.work.next_id();
    let item = OrderItem {
      order_item_id,
      order_id,
      artwork_id,
      price,
      quantity,
    };
    self.work.order_items.insert(order_item_id, item.clone());
    Ok(item)
  }

  async fn orders(&mut self, user_id: i64) -> StoreResult<Vec<OrderSummary>> {
    self.check(StoreOp::Orders)?;
    let mut orders = self.work.orders_of(user_id);
    orders.sort_by(|a, b| b.order_id.cmp(&a.order_id));
    Ok(
      orders
        .into_iter()
        .map(|order| OrderSummary {
          order: order.clone(),
          total_items: self
            .work
            .items_of_order(order.order_id)
            .iter()
            .map(|i| i64::from(i.quantity))
            .sum(),
        })
        .collect(),
    )
  }

  async fn find_order(&mut self, user_id: i64, order_id: i64) -> StoreResult<Option<Order>> {
    self.check(StoreOp::FindOrder)?;
    Ok(self.work.orders.get(&order_id).filter(|o| o.user_id == user_id).cloned())
  }

  async fn order_lines(&mut self, order_id: i64) -> StoreResult<Vec<OrderLine>> {
    self.check(StoreOp::OrderLines)?;
    Ok(
      self
        .work
        .items_of_order(order_id)
        .into_iter()
        .map(|item| OrderLine {
          order_item_id: item.order_item_id,
          artwork_id: item.artwork_id,
          title: self.work.artworks.get(&item.artwork_id).map(|a| a.title.clone()),
          price: item.price,
          quantity: item.quantity,
        })
        .collect(),
    )
  }

  async fn delete_related(&mut self, relation: Relation, link: Link, parent_id: i64) -> StoreResult<u64> {
    self.check(StoreOp::DeleteRelated)?;
    let selector = Selector::new(&self.work, link, parent_id);
    let data = &mut self.work;
    let removed = match relation {
      Relation::ArtworkTags => {
        let before = data.artwork_tags.len();
        data.artwork_tags.retain(|t| {
          !selector.selects(RowKeys {
            artwork_id: Some(t.artwork_id),
            ..Default::default()
          })
        });
        (before - data.artwork_tags.len()) as u64
      }
      Relation::Likes => remove_rows(&mut data.likes, &selector, |l| RowKeys {
        id: Some(l.like_id),
        artwork_id: Some(l.artwork_id),
        user_id: Some(l.user_id),
        ..Default::default()
      }),
      Relation::Comments => remove_rows(&mut data.comments, &selector, |c| RowKeys {
        id: Some(c.comment_id),
        artwork_id: Some(c.artwork_id),
        user_id: Some(c.user_id),
        ..Default::default()
      }),
      Relation::CartItems => remove_rows(&mut data.cart_items, &selector, |i| RowKeys {
        id: Some(i.cart_item_id),
        artwork_id: Some(i.artwork_id),
        cart_id: Some(i.cart_id),
        ..Default::default()
      }),
      Relation::Carts => remove_rows(&mut data.carts, &selector, |c| RowKeys {
        id: Some(c.cart_id),
        user_id: Some(c.user_id),
        ..Default::default()
      }),
      Relation::OrderItems => remove_rows(&mut data.order_items, &selector, |i| RowKeys {
        id: Some(i.order_item_id),
        artwork_id: Some(i.artwork_id),
        order_id: Some(i.order_id),
        ..Default::default()
      }),
      Relation::Orders => remove_rows(&mut data.orders, &selector, |o| RowKeys {
        id: Some(o.order_id),
        user_id: Some(o.user_id),
        ..Default::default()
      }),
      Relation::Addresses => remove_rows(&mut data.addresses, &selector, |a| RowKeys {
        id: Some(a.address_id),
        user_id: Some(a.user_id),
        ..Default::default()
      }),
      Relation::Artworks => remove_rows(&mut data.artworks, &selector, |a| RowKeys {
        id: Some(a.artwork_id),
        user_id: Some(a.artist_id),
        ..Default::default()
      }),
      Relation::Users => remove_rows(&mut data.users, &selector, |u| RowKeys {
        id: Some(u.user_id),
        user_id: Some(u.user_id),
        ..Default::default()
      }),
    };
    Ok(removed)
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    self.check(StoreOp::Commit)?;
    let MemoryTx { mut guard, work, .. } = *self;
    *guard = work;
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> StoreResult<()> {
    Ok(())
  }
}
