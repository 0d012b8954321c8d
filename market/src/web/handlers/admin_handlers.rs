// galleria-market/src/web/handlers/admin_handlers.rs

//! Deletion endpoints for artists and administrators.

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;

use crate::errors::MarketError;
use crate::identity::AuthenticatedUser;
use crate::state::MarketState;

#[instrument(name = "handler::artist_delete_artwork", skip_all, fields(user_id = auth_user.user_id))]
pub async fn artist_delete_artwork_handler(
  state: web::Data<MarketState>,
  path: web::Path<i64>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, MarketError> {
  let report = state.manager.delete_artwork_as_artist(auth_user, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
    "message": "Artwork deleted successfully.",
    "deleted": report.deleted,
  })))
}

#[instrument(name = "handler::admin_delete_artwork", skip_all, fields(admin_id = auth_user.user_id))]
pub async fn admin_delete_artwork_handler(
  state: web::Data<MarketState>,
  path: web::Path<i64>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, MarketError> {
  let report = state.manager.cascade_delete_for_artwork(auth_user, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
    "message": "Artwork deleted successfully.",
    "deleted": report.deleted,
  })))
}

#[instrument(name = "handler::admin_delete_user", skip_all, fields(admin_id = auth_user.user_id))]
pub async fn admin_delete_user_handler(
  state: web::Data<MarketState>,
  path: web::Path<i64>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, MarketError> {
  let report = state.manager.cascade_delete_for_user(auth_user, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
    "message": "User deleted successfully.",
    "deleted": report.deleted,
  })))
}
