// galleria-market/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::MarketError;
use crate::identity::AuthenticatedUser;
use crate::models::parse_quantity_form;
use crate::state::MarketState;

#[derive(Deserialize, Debug)]
pub struct AddToCartRequest {
  pub artwork_id: i64,
}

/// `quantities` maps cart item ids to the new quantity. Both may arrive as
/// strings, the way an HTML form posts them.
#[derive(Deserialize, Debug)]
pub struct UpdateCartRequest {
  #[serde(default)]
  pub quantities: serde_json::Map<String, serde_json::Value>,
}

#[instrument(name = "handler::view_cart", skip_all, fields(user_id = auth_user.user_id))]
pub async fn view_cart_handler(
  state: web::Data<MarketState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, MarketError> {
  let view = state.manager.view_cart(auth_user).await?;
  Ok(HttpResponse::Ok().json(view))
}

#[instrument(
  name = "handler::add_to_cart",
  skip_all,
  fields(user_id = auth_user.user_id, artwork_id = req_payload.artwork_id)
)]
pub async fn add_to_cart_handler(
  state: web::Data<MarketState>,
  req_payload: web::Json<AddToCartRequest>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, MarketError> {
  let outcome = state.manager.add_to_cart(auth_user, req_payload.artwork_id).await?;
  let message = if outcome.already_in_cart {
    "Artwork is already in your cart."
  } else {
    "Artwork added to cart."
  };
  info!(cart_item_count = outcome.cart_item_count, "{}", message);
  Ok(HttpResponse::Ok().json(json!({
    "message": message,
    "cart_item_count": outcome.cart_item_count,
    "already_in_cart": outcome.already_in_cart,
  })))
}

#[instrument(name = "handler::update_cart", skip_all, fields(user_id = auth_user.user_id))]
pub async fn update_cart_handler(
  state: web::Data<MarketState>,
  req_payload: web::Json<UpdateCartRequest>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, MarketError> {
  let quantities = parse_quantity_form(&req_payload.quantities)?;
  let view = state.manager.update_cart(auth_user, quantities).await?;
  Ok(HttpResponse::Ok().json(json!({
    "message": "Cart updated.",
    "cart": view,
  })))
}

#[instrument(name = "handler::remove_from_cart", skip_all, fields(user_id = auth_user.user_id))]
pub async fn remove_from_cart_handler(
  state: web::Data<MarketState>,
  path: web::Path<i64>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, MarketError> {
  let cart_item_id = path.into_inner();
  state.manager.remove_from_cart(auth_user, cart_item_id).await?;
  Ok(HttpResponse::NoContent().finish())
}
