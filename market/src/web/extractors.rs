// galleria-market/src/web/extractors.rs

//! Caller identity taken from request headers.
//!
//! `X-User-ID` carries the numeric user id and `X-User-Role` one of
//! `customer`, `artist` or `admin` (missing means `customer`). Whatever sits in
//! front of this service is trusted to have authenticated the caller.

use crate::errors::MarketError;
use crate::identity::{AuthenticatedUser, Role};
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

impl FromRequest for AuthenticatedUser {
  type Error = MarketError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    ready(identify(req))
  }
}

fn identify(req: &HttpRequest) -> Result<AuthenticatedUser, MarketError> {
  let header = |name: &str| req.headers().get(name).and_then(|v| v.to_str().ok()).map(str::trim);

  let user_id = header(USER_ID_HEADER)
    .and_then(|raw| raw.parse::<i64>().ok())
    .filter(|id| *id > 0)
    .ok_or_else(|| {
      warn!("Missing or invalid {} header.", USER_ID_HEADER);
      MarketError::Auth("Please log in to continue".to_string())
    })?;

  let role = match header(USER_ROLE_HEADER) {
    Some(raw) => raw.parse::<Role>().map_err(|_| {
      warn!(user_id, role = raw, "Unknown role in {} header.", USER_ROLE_HEADER);
      MarketError::Auth("Unknown role".to_string())
    })?,
    None => Role::Customer,
  };

  Ok(AuthenticatedUser { user_id, role })
}
