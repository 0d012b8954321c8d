// galleria-market/src/activity.rs

//! The activity log: an audit trail written after the business transaction.
//!
//! Recording is fire-and-forget. [`record_quietly`] is what the workflows
//! call, and it never lets a logging failure reach the caller.

use crate::store::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use std::fmt;
use tracing::{event, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
  CartAdd,
  CartUpdate,
  Purchase,
  Delete,
  AdminAction,
}

impl ActivityKind {
  pub fn as_str(self) -> &'static str {
    match self {
      ActivityKind::CartAdd => "cart_add",
      ActivityKind::CartUpdate => "cart_update",
      ActivityKind::Purchase => "purchase",
      ActivityKind::Delete => "delete",
      ActivityKind::AdminAction => "admin_action",
    }
  }
}

impl fmt::Display for ActivityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEntry {
  pub user_id: i64,
  pub kind: ActivityKind,
  pub description: String,
  pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait ActivityLogger: Send + Sync {
  async fn record(&self, user_id: i64, kind: ActivityKind, description: &str) -> StoreResult<()>;
}

/// Records an entry and swallows any failure after logging it.
pub async fn record_quietly(logger: &dyn ActivityLogger, user_id: i64, kind: ActivityKind, description: &str) {
  if let Err(error) = logger.record(user_id, kind, description).await {
    event!(Level::WARN, user_id, %kind, %error, "Activity log write failed; continuing.");
  }
}

pub fn purchase_description(order_id: i64, amount: Decimal) -> String {
  format!(
    "made a purchase (Order ID: {}, Amount: ${})",
    order_id,
    crate::pricing::format_amount(amount)
  )
}

/// Writes to the `activity_logs` table, outside any business transaction.
#[derive(Clone)]
pub struct PgActivityLog {
  pool: PgPool,
}

impl PgActivityLog {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl ActivityLogger for PgActivityLog {
  async fn record(&self, user_id: i64, kind: ActivityKind, description: &str) -> StoreResult<()> {
    sqlx::query("INSERT INTO activity_logs (user_id, activity_type, description) VALUES ($1, $2, $3)")
      .bind(user_id)
      .bind(kind.as_str())
      .bind(description)
      .execute(&self.pool)
      .await
      .map_err(StoreError::from)?;
    Ok(())
  }
}

/// Emits entries as tracing events only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingActivityLog;

#[async_trait]
impl ActivityLogger for TracingActivityLog {
  async fn record(&self, user_id: i64, kind: ActivityKind, description: &str) -> StoreResult<()> {
    event!(target: "galleria::activity", Level::INFO, user_id, %kind, description, "Activity recorded.");
    Ok(())
  }
}
