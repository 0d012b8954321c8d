// galleria-market/src/models/artwork.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// What the order/cart workflows need to know about a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ArtworkSummary {
  pub artwork_id: i64,
  pub artist_id: i64,
  pub title: String,
  pub price: Decimal,
}
