// galleria-market/src/models/address.rs

use crate::errors::FieldErrors;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Address {
  pub address_id: i64,
  pub user_id: i64,
  pub address_line1: String,
  pub address_line2: Option<String>,
  pub city: String,
  pub state: Option<String>,
  pub postal_code: String,
  pub country: String,
  pub is_default: bool,
}

/// A shipping address typed in at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAddress {
  #[serde(default)]
  pub address_line1: String,
  #[serde(default)]
  pub address_line2: Option<String>,
  #[serde(default)]
  pub city: String,
  #[serde(default)]
  pub state: Option<String>,
  #[serde(default)]
  pub postal_code: String,
  #[serde(default)]
  pub country: String,
}

impl NewAddress {
  /// Trims every field and turns blank optional fields into `None`.
  pub fn normalized(&self) -> Self {
    let optional = |value: &Option<String>| {
      value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
    };
    Self {
      address_line1: self.address_line1.trim().to_string(),
      address_line2: optional(&self.address_line2),
      city: self.city.trim().to_string(),
      state: optional(&self.state),
      postal_code: self.postal_code.trim().to_string(),
      country: self.country.trim().to_string(),
    }
  }

  /// Normalizes the address and checks the required fields.
  pub fn validated(&self) -> Result<Self, FieldErrors> {
    let address = self.normalized();
    let mut errors = FieldErrors::new();
    if address.address_line1.is_empty() {
      errors.add("address_line1", "Address line 1 is required");
    }
    if address.city.is_empty() {
      errors.add("city", "City is required");
    }
    if address.postal_code.is_empty() {
      errors.add("postal_code", "Postal code is required");
    }
    if address.country.is_empty() {
      errors.add("country", "Country is required");
    }
    if errors.is_empty() {
      Ok(address)
    } else {
      Err(errors)
    }
  }
}

/// Which address a checkout ships to. Exactly one is used per order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressSelection {
  /// An address the user saved earlier.
  Saved(i64),
  /// A fresh address; `save` persists it to the user's address book.
  Fresh { address: NewAddress, save: bool },
}
