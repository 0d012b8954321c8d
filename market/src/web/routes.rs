// galleria-market/src/web/routes.rs

use actix_web::web;

use crate::state::MarketState;
use crate::web::handlers::{admin_handlers, cart_handlers, checkout_handlers, order_handlers};

async fn health_check_handler(state: web::Data<MarketState>) -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({
    "status": "ok",
    "store": state.manager.backend(),
  }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::view_cart_handler))
          .route("", web::put().to(cart_handlers::update_cart_handler))
          .route("/items", web::post().to(cart_handlers::add_to_cart_handler))
          .route("/items/{cart_item_id}", web::delete().to(cart_handlers::remove_from_cart_handler)),
      )
      .route("/addresses", web::get().to(checkout_handlers::list_addresses_handler))
      .route("/checkout", web::post().to(checkout_handlers::checkout_handler))
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler)),
      )
      .route(
        "/artist/artworks/{artwork_id}",
        web::delete().to(admin_handlers::artist_delete_artwork_handler),
      )
      .service(
        web::scope("/admin")
          .route("/artworks/{artwork_id}", web::delete().to(admin_handlers::admin_delete_artwork_handler))
          .route("/users/{user_id}", web::delete().to(admin_handlers::admin_delete_user_handler)),
      ),
  );
}
