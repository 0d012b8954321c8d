// galleria-market/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::MarketError;
use crate::identity::AuthenticatedUser;
use crate::models::{AddressSelection, NewAddress};
use crate::state::MarketState;

/// Either `address_id` of a saved address, or `new_address` (optionally
/// stored for next time with `save_address`). A new address wins when both
/// are sent.
#[derive(Deserialize, Debug, Default)]
pub struct CheckoutRequest {
  pub address_id: Option<i64>,
  pub new_address: Option<NewAddress>,
  #[serde(default)]
  pub save_address: bool,
}

impl CheckoutRequest {
  pub fn into_selection(self) -> AddressSelection {
    match self.new_address {
      Some(address) => AddressSelection::Fresh {
        address,
        save: self.save_address,
      },
      None => AddressSelection::Saved(self.address_id.unwrap_or(0)),
    }
  }
}

#[instrument(name = "handler::list_addresses", skip_all, fields(user_id = auth_user.user_id))]
pub async fn list_addresses_handler(
  state: web::Data<MarketState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, MarketError> {
  let addresses = state.manager.list_addresses(auth_user).await?;
  Ok(HttpResponse::Ok().json(addresses))
}

#[instrument(name = "handler::checkout", skip_all, fields(user_id = auth_user.user_id))]
pub async fn checkout_handler(
  state: web::Data<MarketState>,
  req_payload: web::Json<CheckoutRequest>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, MarketError> {
  let selection = req_payload.into_inner().into_selection();
  let order_id = state.manager.place_order(auth_user, selection).await?;
  info!(order_id, "Checkout completed.");
  Ok(HttpResponse::Created().json(json!({
    "message": "Order placed successfully!",
    "order_id": order_id,
  })))
}
