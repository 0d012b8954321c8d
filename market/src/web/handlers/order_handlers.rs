// galleria-market/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::instrument;

use crate::errors::MarketError;
use crate::identity::AuthenticatedUser;
use crate::state::MarketState;

#[instrument(name = "handler::list_orders", skip_all, fields(user_id = auth_user.user_id))]
pub async fn list_orders_handler(
  state: web::Data<MarketState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, MarketError> {
  let orders = state.manager.list_orders(auth_user).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::get_order", skip_all, fields(user_id = auth_user.user_id))]
pub async fn get_order_handler(
  state: web::Data<MarketState>,
  path: web::Path<i64>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, MarketError> {
  let detail = state.manager.get_order(auth_user, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(detail))
}
