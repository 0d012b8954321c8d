// galleria-market/src/models/cart.rs

use crate::errors::{FieldErrors, MarketError, Result};
use crate::pricing;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Cart {
  pub cart_id: i64,
  pub user_id: i64,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CartItem {
  pub cart_item_id: i64,
  pub cart_id: i64,
  pub artwork_id: i64,
  pub quantity: i32,
  pub created_at: DateTime<Utc>,
}

/// A cart item joined with the artwork's current title and price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CartLine {
  pub cart_item_id: i64,
  pub artwork_id: i64,
  pub title: String,
  pub price: Decimal,
  pub quantity: i32,
  pub subtotal: Decimal,
}

impl CartLine {
  pub fn new(cart_item_id: i64, artwork_id: i64, title: impl Into<String>, price: Decimal, quantity: i32) -> Self {
    Self {
      cart_item_id,
      artwork_id,
      title: title.into(),
      price,
      quantity,
      subtotal: pricing::line_subtotal(price, quantity),
    }
  }
}

/// The cart as shown to its owner: live prices, newest line first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartView {
  pub lines: Vec<CartLine>,
  pub total: Decimal,
}

impl CartView {
  pub fn from_lines(lines: Vec<CartLine>) -> Self {
    let total = pricing::compute_cart_total(&lines);
    Self { lines, total }
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  pub fn item_count(&self) -> usize {
    self.lines.len()
  }

  pub fn subtotal_of(&self, cart_item_id: i64) -> Option<Decimal> {
    self.lines.iter().find(|l| l.cart_item_id == cart_item_id).map(|l| l.subtotal)
  }
}

/// Parses a `{cart_item_id: quantity}` form body.
///
/// Keys must be numeric ids. Values may be JSON integers or numeric strings.
/// Every offending entry is reported under `quantity[<key>]`.
pub fn parse_quantity_form(raw: &serde_json::Map<String, Value>) -> Result<BTreeMap<i64, i32>> {
  let mut parsed = BTreeMap::new();
  let mut errors = FieldErrors::new();

  for (key, value) in raw {
    let field = format!("quantity[{}]", key);
    let Ok(cart_item_id) = key.trim().parse::<i64>() else {
      errors.add(field, "Invalid cart item");
      continue;
    };
    match parse_quantity(value) {
      Some(quantity) => {
        parsed.insert(cart_item_id, quantity);
      }
      None => errors.add(field, "Quantity must be a whole number"),
    }
  }

  if errors.is_empty() {
    Ok(parsed)
  } else {
    Err(MarketError::Validation(errors))
  }
}

fn parse_quantity(value: &Value) -> Option<i32> {
  match value {
    Value::Number(n) => n.as_i64().and_then(|q| i32::try_from(q).ok()),
    Value::String(s) => s.trim().parse::<i32>().ok(),
    _ => None,
  }
}
