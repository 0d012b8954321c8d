// galleria-market/src/identity.rs

//! The caller's identity, passed explicitly into every manager operation.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Customer,
  Artist,
  Admin,
}

impl FromStr for Role {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "customer" | "user" => Ok(Role::Customer),
      "artist" => Ok(Role::Artist),
      "admin" => Ok(Role::Admin),
      other => Err(format!("unknown role '{}'", other)),
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Role::Customer => "customer",
      Role::Artist => "artist",
      Role::Admin => "admin",
    };
    f.write_str(name)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
  pub user_id: i64,
  pub role: Role,
}

impl AuthenticatedUser {
  pub fn customer(user_id: i64) -> Self {
    Self {
      user_id,
      role: Role::Customer,
    }
  }

  pub fn artist(user_id: i64) -> Self {
    Self {
      user_id,
      role: Role::Artist,
    }
  }

  pub fn admin(user_id: i64) -> Self {
    Self {
      user_id,
      role: Role::Admin,
    }
  }

  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }
}
