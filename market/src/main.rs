// galleria-market/src/main.rs
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use galleria_market::config::AppConfig;
use galleria_market::state::MarketState;
use galleria_market::web::configure_app_routes;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting Galleria order service...");

  let config = AppConfig::from_env().context("loading configuration")?;
  let bind_address = config.bind_address();

  let state = MarketState::from_config(config)
    .await
    .context("initialising the store")?;

  tracing::info!("Binding server to {}...", bind_address);

  HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&bind_address)
  .with_context(|| format!("binding {}", bind_address))?
  .run()
  .await?;

  Ok(())
}
