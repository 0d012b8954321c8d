// galleria-market/src/pricing.rs

//! Money arithmetic for carts and orders.

use crate::models::CartLine;
use rust_decimal::{Decimal, RoundingStrategy};

pub fn line_subtotal(price: Decimal, quantity: i32) -> Decimal {
  price * Decimal::from(quantity)
}

/// Sum of unit price times quantity over the cart's lines, at live prices.
pub fn compute_cart_total<'a, I>(items: I) -> Decimal
where
  I: IntoIterator<Item = &'a CartLine>,
{
  items
    .into_iter()
    .map(|line| line_subtotal(line.price, line.quantity))
    .sum()
}

/// Renders an amount the way receipts and activity entries show it: `25.00`.
pub fn format_amount(amount: Decimal) -> String {
  format!("{:.2}", amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}
