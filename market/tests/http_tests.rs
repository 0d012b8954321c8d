// galleria-market/tests/http_tests.rs

mod common;

use actix_web::{http::StatusCode, test, web, App};
use common::Market;
use galleria_market::config::{AppConfig, StoreBackend};
use galleria_market::state::MarketState;
use galleria_market::web::configure_app_routes;
use serde_json::{json, Value};

fn memory_config() -> AppConfig {
  AppConfig::from_lookup(|name| match name {
    "STORE_BACKEND" => Some("memory".to_string()),
    _ => None,
  })
  .unwrap()
}

async fn app_state() -> (Market, MarketState) {
  let market = Market::seeded().await;
  let manager = galleria_market::OrderCartManager::new(
    std::sync::Arc::new(market.store.clone()),
    std::sync::Arc::new(market.store.clone()),
  );
  let state = MarketState::new(manager, memory_config());
  assert_eq!(state.config.store_backend, StoreBackend::Memory);
  (market, state)
}

#[actix_rt::test]
async fn health_reports_the_store() {
  let (_, state) = app_state().await;
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body, json!({"status": "ok", "store": "memory"}));
}

#[actix_rt::test]
async fn cart_routes_need_a_caller() {
  let (_, state) = app_state().await;
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/cart").to_request()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn add_then_view_cart_over_http() {
  let (m, state) = app_state().await;
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;
  let user = m.buyer.user_id.to_string();

  let req = test::TestRequest::post()
    .uri("/api/v1/cart/items")
    .insert_header(("X-User-ID", user.as_str()))
    .set_json(json!({"artwork_id": m.artwork_a}))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["cart_item_count"], 1);
  assert_eq!(body["already_in_cart"], false);

  let req = test::TestRequest::get()
    .uri("/api/v1/cart")
    .insert_header(("X-User-ID", user.as_str()))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["lines"].as_array().map(Vec::len), Some(1));
  assert_eq!(body["total"], "10.00");
}

#[actix_rt::test]
async fn bad_quantity_is_a_field_error() {
  let (m, state) = app_state().await;
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let req = test::TestRequest::put()
    .uri("/api/v1/cart")
    .insert_header(("X-User-ID", m.buyer.user_id.to_string().as_str()))
    .set_json(json!({"quantities": {"5": "lots"}}))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["fields"]["quantity[5]"], "Quantity must be a whole number");
}

#[actix_rt::test]
async fn checkout_with_empty_cart_is_rejected() {
  let (m, state) = app_state().await;
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .insert_header(("X-User-ID", m.buyer.user_id.to_string().as_str()))
    .set_json(json!({
      "new_address": {"address_line1": "1 Main St", "city": "Oakland", "postal_code": "94607", "country": "USA"}
    }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["fields"]["cart"], "Your cart is empty");
}

#[actix_rt::test]
async fn admin_routes_check_the_role_header() {
  let (m, state) = app_state().await;
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;
  let uri = format!("/api/v1/admin/artworks/{}", m.artwork_b);

  let req = test::TestRequest::delete()
    .uri(&uri)
    .insert_header(("X-User-ID", m.buyer.user_id.to_string().as_str()))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::delete()
    .uri(&uri)
    .insert_header(("X-User-ID", m.admin.user_id.to_string().as_str()))
    .insert_header(("X-User-Role", "admin"))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["deleted"]["artworks"], 1);
}
