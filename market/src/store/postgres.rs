// galleria-market/src/store/postgres.rs

//! PostgreSQL store on `sqlx`.

use super::{Link, MarketStore, Relation, StoreResult, StoreTx};
use crate::models::{
  Address, ArtworkSummary, Cart, CartItem, CartLine, NewAddress, Order, OrderItem, OrderLine, OrderStatus,
  OrderSummary,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{event, instrument, Level};

const ADDRESS_COLUMNS: &str =
  "address_id, user_id, address_line1, address_line2, city, state, postal_code, country, is_default";

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .connect(database_url)
      .await?;
    event!(Level::INFO, max_connections, "Connected to PostgreSQL.");
    Ok(Self { pool })
  }

  pub fn from_pool(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  #[instrument(name = "PgStore::migrate", skip(self), err)]
  pub async fn migrate(&self) -> StoreResult<()> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    event!(Level::INFO, "Database migrations applied.");
    Ok(())
  }
}

#[async_trait]
impl MarketStore for PgStore {
  fn backend(&self) -> &'static str {
    "postgres"
  }

  async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
    let tx = self.pool.begin().await?;
    Ok(Box::new(PgTx { tx }))
  }
}

pub struct PgTx {
  tx: Transaction<'static, Postgres>,
}

fn link_predicate(relation: Relation, link: Link) -> String {
  match link {
    Link::ByArtwork => "artwork_id = $1".to_string(),
    Link::ByUser => "user_id = $1".to_string(),
    Link::ByCartOwner => "cart_id IN (SELECT cart_id FROM cart WHERE user_id = $1)".to_string(),
    Link::ByOrderOwner => "order_id IN (SELECT order_id FROM orders WHERE user_id = $1)".to_string(),
    Link::Itself => format!("{} = $1", relation.primary_key()),
  }
}

#[async_trait]
impl StoreTx for PgTx {
  async fn artwork(&mut self, artwork_id: i64) -> StoreResult<Option<ArtworkSummary>> {
    let row = sqlx::query_as::<_, ArtworkSummary>(
      "SELECT artwork_id, artist_id, title, price FROM artworks WHERE artwork_id = $1",
    )
    .bind(artwork_id)
    .fetch_optional(&mut *self.tx)
    .await?;
    Ok(row)
  }

  async fn user_exists(&mut self, user_id: i64) -> StoreResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE user_id = $1)")
      .bind(user_id)
      .fetch_one(&mut *self.tx)
      .await?;
    Ok(exists)
  }

  async fn artworks_by_artist(&mut self, artist_id: i64) -> StoreResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>("SELECT artwork_id FROM artworks WHERE artist_id = $1 ORDER BY artwork_id")
      .bind(artist_id)
      .fetch_all(&mut *self.tx)
      .await?;
    Ok(ids)
  }

  async fn find_cart(&mut self, user_id: i64) -> StoreResult<Option<Cart>> {
    let cart = sqlx::query_as::<_, Cart>("SELECT cart_id, user_id, created_at FROM cart WHERE user_id = $1")
      .bind(user_id)
      .fetch_optional(&mut *self.tx)
      .await?;
    Ok(cart)
  }

  async fn create_cart(&mut self, user_id: i64) -> StoreResult<Cart> {
    // A concurrent first add may have created it already; hand back that row.
    let cart = sqlx::query_as::<_, Cart>(
      "INSERT INTO cart (user_id) VALUES ($1) \
       ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
       RETURNING cart_id, user_id, created_at",
    )
    .bind(user_id)
    .fetch_one(&mut *self.tx)
    .await?;
    Ok(cart)
  }

  async fn find_cart_item(&mut self, cart_id: i64, artwork_id: i64) -> StoreResult<Option<CartItem>> {
    let item = sqlx::query_as::<_, CartItem>(
      "SELECT cart_item_id, cart_id, artwork_id, quantity, created_at \
       FROM cart_items WHERE cart_id = $1 AND artwork_id = $2",
    )
    .bind(cart_id)
    .bind(artwork_id)
    .fetch_optional(&mut *self.tx)
    .await?;
    Ok(item)
  }

  async fn insert_cart_item(
    &mut self,
    cart_id: i64,
    artwork_id: i64,
    quantity: i32,
  ) -> StoreResult<Option<CartItem>> {
    let item = sqlx::query_as::<_, CartItem>(
      "INSERT INTO cart_items (cart_id, artwork_id, quantity) VALUES ($1, $2, $3) \
       ON CONFLICT (cart_id, artwork_id) DO NOTHING \
       RETURNING cart_item_id, cart_id, artwork_id, quantity, created_at",
    )
    .bind(cart_id)
    .bind(artwork_id)
    .bind(quantity)
    .fetch_optional(&mut *self.tx)
    .await?;
    Ok(item)
  }

  async fn count_cart_items(&mut self, cart_id: i64) -> StoreResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cart_items WHERE cart_id = $1")
      .bind(cart_id)
      .fetch_one(&mut *self.tx)
      .await?;
    Ok(count)
  }

  async fn set_owned_item_quantity(&mut self, user_id: i64, cart_item_id: i64, quantity: i32) -> StoreResult<bool> {
    let result = sqlx::query(
      "UPDATE cart_items ci SET quantity = $3 FROM cart c \
       WHERE ci.cart_id = c.cart_id AND c.user_id = $1 AND ci.cart_item_id = $2",
    )
    .bind(user_id)
    .bind(cart_item_id)
    .bind(quantity)
    .execute(&mut *self.tx)
    .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn delete_owned_item(&mut self, user_id: i64, cart_item_id: i64) -> StoreResult<bool> {
    let result = sqlx::query(
      "DELETE FROM cart_items ci USING cart c \
       WHERE ci.cart_id = c.cart_id AND c.user_id = $1 AND ci.cart_item_id = $2",
    )
    .bind(user_id)
    .bind(cart_item_id)
    .execute(&mut *self.tx)
    .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn cart_lines(&mut self, user_id: i64) -> StoreResult<Vec<CartLine>> {
    // Share-locks the artwork rows so prices hold still until commit.
    let lines = sqlx::query_as::<_, CartLine>(
      "SELECT ci.cart_item_id, ci.artwork_id, a.title, a.price, ci.quantity, a.price * ci.quantity AS subtotal \
       FROM cart_items ci \
       JOIN cart c ON c.cart_id = ci.cart_id \
       JOIN artworks a ON a.artwork_id = ci.artwork_id \
       WHERE c.user_id = $1 \
       ORDER BY ci.created_at DESC, ci.cart_item_id DESC \
       FOR SHARE OF a",
    )
    .bind(user_id)
    .fetch_all(&mut *self.tx)
    .await?;
    Ok(lines)
  }

  async fn clear_cart(&mut self, cart_id: i64) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
      .bind(cart_id)
      .execute(&mut *self.tx)
      .await?;
    Ok(result.rows_affected())
  }

  async fn addresses(&mut self, user_id: i64) -> StoreResult<Vec<Address>> {
    let sql = format!(
      "SELECT {} FROM user_addresses WHERE user_id = $1 ORDER BY is_default DESC, address_id",
      ADDRESS_COLUMNS
    );
    let rows = sqlx::query_as::<_, Address>(&sql)
      .bind(user_id)
      .fetch_all(&mut *self.tx)
      .await?;
    Ok(rows)
  }

  async fn find_address(&mut self, user_id: i64, address_id: i64) -> StoreResult<Option<Address>> {
    let sql = format!(
      "SELECT {} FROM user_addresses WHERE address_id = $1 AND user_id = $2",
      ADDRESS_COLUMNS
    );
    let row = sqlx::query_as::<_, Address>(&sql)
      .bind(address_id)
      .bind(user_id)
      .fetch_optional(&mut *self.tx)
      .await?;
    Ok(row)
  }

  async fn count_addresses(&mut self, user_id: i64) -> StoreResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_addresses WHERE user_id = $1")
      .bind(user_id)
      .fetch_one(&mut *self.tx)
      .await?;
    Ok(count)
  }

  async fn insert_address(&mut self, user_id: i64, address: &NewAddress, is_default: bool) -> StoreResult<Address> {
    let sql = format!(
      "INSERT INTO user_addresses \
       (user_id, address_line1, address_line2, city, state, postal_code, country, is_default) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
      ADDRESS_COLUMNS
    );
    let row = sqlx::query_as::<_, Address>(&sql)
      .bind(user_id)
      .bind(&address.address_line1)
      .bind(&address.address_line2)
      .bind(&address.city)
      .bind(&address.state)
      .bind(&address.postal_code)
      .bind(&address.country)
      .bind(is_default)
      .fetch_one(&mut *self.tx)
      .await?;
    Ok(row)
  }

  async fn insert_order(&mut self, user_id: i64, total_amount: Decimal, status: OrderStatus) -> StoreResult<Order> {
    let order = sqlx::query_as::<_, Order>(
      "INSERT INTO orders (user_id, total_amount, status) VALUES ($1, $2, $3) \
       RETURNING order_id, user_id, total_amount, status, created_at",
    )
    .bind(user_id)
    .bind(total_amount)
    .bind(status)
    .fetch_one(&mut *self.tx)
    .await?;
    Ok(order)
  }

  async fn insert_order_item(
    &mut self,
    order_id: i64,
    artwork_id: i64,
    price: Decimal,
    quantity: i32,
  ) -> StoreResult<OrderItem> {
    let item = sqlx::query_as::<_, OrderItem>(
      "INSERT INTO order_items (order_id, artwork_id, price, quantity) VALUES ($1, $2, $3, $4) \
       RETURNING order_item_id, order_id, artwork_id, price, quantity",
    )
    .bind(order_id)
    .bind(artwork_id)
    .bind(price)
    .bind(quantity)
    .fetch_one(&mut *self.tx)
    .await?;
    Ok(item)
  }

  async fn orders(&mut self, user_id: i64) -> StoreResult<Vec<OrderSummary>> {
    let rows = sqlx::query_as::<_, OrderSummary>(
      "SELECT o.order_id, o.user_id, o.total_amount, o.status, o.created_at, \
       COALESCE(SUM(oi.quantity), 0)::BIGINT AS total_items \
       FROM orders o LEFT JOIN order_items oi ON oi.order_id = o.order_id \
       WHERE o.user_id = $1 \
       GROUP BY o.order_id \
       ORDER BY o.created_at DESC, o.order_id DESC",
    )
    .bind(user_id)
    .fetch_all(&mut *self.tx)
    .await?;
    Ok(rows)
  }

  async fn find_order(&mut self, user_id: i64, order_id: i64) -> StoreResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
      "SELECT order_id, user_id, total_amount, status, created_at FROM orders WHERE order_id = $1 AND user_id = $2",
    )
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(&mut *self.tx)
    .await?;
    Ok(order)
  }

  async fn order_lines(&mut self, order_id: i64) -> StoreResult<Vec<OrderLine>> {
    let lines = sqlx::query_as::<_, OrderLine>(
      "SELECT oi.order_item_id, oi.artwork_id, a.title, oi.price, oi.quantity \
       FROM order_items oi LEFT JOIN artworks a ON a.artwork_id = oi.artwork_id \
       WHERE oi.order_id = $1 ORDER BY oi.order_item_id",
    )
    .bind(order_id)
    .fetch_all(&mut *self.tx)
    .await?;
    Ok(lines)
  }

  async fn delete_related(&mut self, relation: Relation, link: Link, parent_id: i64) -> StoreResult<u64> {
    let sql = format!("DELETE FROM {} WHERE {}", relation.table(), link_predicate(relation, link));
    let result = sqlx::query(&sql).bind(parent_id).execute(&mut *self.tx).await?;
    event!(Level::DEBUG, table = relation.table(), ?link, parent_id, rows = result.rows_affected(), "Cascade step executed.");
    Ok(result.rows_affected())
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    self.tx.commit().await?;
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> StoreResult<()> {
    self.tx.rollback().await?;
    Ok(())
  }
}
