// galleria-market/src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, Type as SqlxType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SqlxType)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Completed,
  Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Order {
  pub order_id: i64,
  pub user_id: i64,
  pub total_amount: Decimal,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
}

/// One purchased line. `price` is the artwork price at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct OrderItem {
  pub order_item_id: i64,
  pub order_id: i64,
  pub artwork_id: i64,
  pub price: Decimal,
  pub quantity: i32,
}

/// An order row plus the number of pieces bought, for history listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct OrderSummary {
  #[sqlx(flatten)]
  #[serde(flatten)]
  pub order: Order,
  pub total_items: i64,
}

/// An order item for display. `title` is `None` once the artwork is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct OrderLine {
  pub order_item_id: i64,
  pub artwork_id: i64,
  pub title: Option<String>,
  pub price: Decimal,
  pub quantity: i32,
}

impl OrderLine {
  pub fn subtotal(&self) -> Decimal {
    crate::pricing::line_subtotal(self.price, self.quantity)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
  pub order: Order,
  pub lines: Vec<OrderLine>,
  pub total_items: i64,
}

impl OrderDetail {
  pub fn new(order: Order, lines: Vec<OrderLine>) -> Self {
    let total_items = lines.iter().map(|l| i64::from(l.quantity)).sum();
    Self {
      order,
      lines,
      total_items,
    }
  }
}
