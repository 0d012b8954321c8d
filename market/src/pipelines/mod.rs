// galleria-market/src/pipelines/mod.rs

//! The cart, checkout and cascade workflows, one pipeline per context type.

use crate::errors::MarketError;
use galleria_flow::FlowRegistry;
use tracing::info;

pub mod contexts;
pub mod common_steps;

pub mod add_to_cart;
pub mod update_cart;
pub mod remove_item;
pub mod checkout;
pub mod cascade;

/// Registers every workflow pipeline. Called once when the manager is built.
pub fn register_all_pipelines(registry: &FlowRegistry<MarketError>) {
  info!("Registering market pipelines...");

  add_to_cart::register_add_to_cart_pipeline(registry);
  update_cart::register_update_cart_pipeline(registry);
  remove_item::register_remove_item_pipeline(registry);
  checkout::register_checkout_pipeline(registry);
  cascade::register_cascade_pipeline(registry);

  info!("All market pipelines registered.");
}
