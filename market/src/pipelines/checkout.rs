// galleria-market/src/pipelines/checkout.rs

//! Order placement.
//!
//! ```text
//! validate_address -> begin_transaction -> load_cart -> resolve_address
//!   -> create_order -> copy_items -> clear_cart -> commit_transaction -> record_activity
//! ```
//!
//! `resolve_address` branches into one of two scoped pipelines over
//! [`AddressCtxData`]: look up a saved address, or store a fresh one.
//! Everything between `begin_transaction` and `commit_transaction` shares one
//! `UnitOfWork`, so a failure anywhere in that span leaves no order, no order
//! items, no new address and an untouched cart.

use crate::activity::{purchase_description, record_quietly, ActivityKind};
use crate::errors::MarketError;
use crate::models::{AddressSelection, OrderStatus};
use crate::pipelines::common_steps;
use crate::pipelines::contexts::{AddressCtxData, CheckoutCtxData};
use crate::pricing;
use galleria_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub fn saved_address_pipeline() -> Arc<Pipeline<AddressCtxData, MarketError>> {
  let mut p = Pipeline::<AddressCtxData, MarketError>::new(&[("lookup_saved_address", false, None)]);

  p.on("lookup_saved_address", |ctx_data: ContextData<AddressCtxData>| {
    Box::pin(async move {
      let (uow, user_id, address_id) = {
        let guard = ctx_data.read();
        (guard.uow.clone(), guard.user_id, guard.saved_address_id)
      };
      let address_id =
        address_id.ok_or_else(|| MarketError::validation("address_id", "Please select an address"))?;
      let address = uow.tx().await?.find_address(user_id, address_id).await?;
      let address = address.ok_or_else(|| {
        warn!(user_id, address_id, "Checkout: selected address is not the caller's.");
        MarketError::not_found("Invalid address selected")
      })?;
      ctx_data.write().resolved = Some(address);
      Ok::<_, MarketError>(PipelineControl::Continue)
    })
  });

  Arc::new(p)
}

pub fn fresh_address_pipeline() -> Arc<Pipeline<AddressCtxData, MarketError>> {
  let mut p = Pipeline::<AddressCtxData, MarketError>::new(&[(
    "save_fresh_address",
    false,
    Some(Arc::new(|ctx: ContextData<AddressCtxData>| !ctx.read().save_fresh)),
  )]);

  // The first address a user saves becomes their default.
  p.on("save_fresh_address", |ctx_data: ContextData<AddressCtxData>| {
    Box::pin(async move {
      let (uow, user_id, fresh) = {
        let guard = ctx_data.read();
        (guard.uow.clone(), guard.user_id, guard.fresh.clone())
      };
      let fresh = fresh.ok_or_else(|| MarketError::Internal("fresh address missing from scope".to_string()))?;

      let saved = {
        let mut tx = uow.tx().await?;
        let is_default = tx.count_addresses(user_id).await? == 0;
        tx.insert_address(user_id, &fresh, is_default).await?
      };
      info!(user_id, address_id = saved.address_id, is_default = saved.is_default, "Checkout: address saved.");
      ctx_data.write().resolved = Some(saved);
      Ok::<_, MarketError>(PipelineControl::Continue)
    })
  });

  Arc::new(p)
}

pub fn build_checkout_pipeline() -> Pipeline<CheckoutCtxData, MarketError> {
  let mut p = Pipeline::<CheckoutCtxData, MarketError>::new(&[
    ("validate_address", false, None),
    ("begin_transaction", false, None),
    ("load_cart", false, None),
    ("resolve_address", false, None),
    ("create_order", false, None),
    ("copy_items", false, None),
    ("clear_cart", false, None),
    ("commit_transaction", false, None),
    ("record_activity", true, None),
  ]);

  p.on("validate_address", validate_address);
  p.on("begin_transaction", common_steps::begin_transaction::<CheckoutCtxData>);
  p.on("load_cart", load_cart);

  p.branch("resolve_address")
    .when(
      |ctx: ContextData<CheckoutCtxData>| matches!(ctx.read().selection, AddressSelection::Saved(_)),
      saved_address_pipeline(),
      |ctx: ContextData<CheckoutCtxData>| Ok(ctx.read().address.clone()),
    )
    .when(
      |ctx: ContextData<CheckoutCtxData>| matches!(ctx.read().selection, AddressSelection::Fresh { .. }),
      fresh_address_pipeline(),
      |ctx: ContextData<CheckoutCtxData>| Ok(ctx.read().address.clone()),
    )
    .finish(false);

  p.after("resolve_address", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let address_ctx = ctx_data.read().address.clone();
      let address_id = address_ctx.read().resolved.as_ref().map(|a| a.address_id);
      ctx_data.write().address_id = address_id;
      Ok::<_, MarketError>(PipelineControl::Continue)
    })
  });

  p.on("create_order", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (uow, user_id, total) = {
        let guard = ctx_data.read();
        (guard.uow.clone(), guard.user.user_id, guard.total)
      };
      let order = uow.tx().await?.insert_order(user_id, total, OrderStatus::Pending).await?;
      info!(user_id, order_id = order.order_id, %total, "Checkout: order created.");
      ctx_data.write().order = Some(order);
      Ok::<_, MarketError>(PipelineControl::Continue)
    })
  });

  p.on("copy_items", copy_items);

  p.on("clear_cart", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (uow, cart_id) = {
        let guard = ctx_data.read();
        (guard.uow.clone(), guard.cart_id)
      };
      let cart_id = cart_id.ok_or_else(|| MarketError::Internal("cart not loaded before drain".to_string()))?;
      let drained = uow.tx().await?.clear_cart(cart_id).await?;
      info!(cart_id, drained, "Checkout: cart drained.");
      Ok::<_, MarketError>(PipelineControl::Continue)
    })
  });

  p.on("commit_transaction", common_steps::commit_transaction::<CheckoutCtxData>);

  p.on("record_activity", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (activity, user_id, order) = {
        let guard = ctx_data.read();
        (guard.activity.clone(), guard.user.user_id, guard.order.clone())
      };
      if let Some(order) = order {
        let description = purchase_description(order.order_id, order.total_amount);
        record_quietly(activity.as_ref(), user_id, ActivityKind::Purchase, &description).await;
      }
      Ok::<_, MarketError>(PipelineControl::Continue)
    })
  });

  p
}

/// Rejects a bad selection before the transaction opens.
#[instrument(name = "checkout::validate_address", skip_all, err(Display))]
async fn validate_address(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, MarketError> {
  let selection = ctx_data.read().selection.clone();
  match selection {
    AddressSelection::Saved(address_id) if address_id <= 0 => {
      Err(MarketError::validation("address_id", "Please select an address"))
    }
    AddressSelection::Saved(_) => Ok(PipelineControl::Continue),
    AddressSelection::Fresh { address, .. } => {
      let normalized = address.validated().map_err(MarketError::Validation)?;
      let address_ctx = ctx_data.read().address.clone();
      address_ctx.write().fresh = Some(normalized);
      Ok(PipelineControl::Continue)
    }
  }
}

/// Stops the run when there is nothing to buy.
#[instrument(name = "checkout::load_cart", skip_all, err(Display))]
async fn load_cart(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, MarketError> {
  let (uow, user_id) = {
    let guard = ctx_data.read();
    (guard.uow.clone(), guard.user.user_id)
  };

  let (cart, lines) = {
    let mut tx = uow.tx().await?;
    let cart = tx.find_cart(user_id).await?;
    let lines = match &cart {
      Some(_) => tx.cart_lines(user_id).await?,
      None => Vec::new(),
    };
    (cart, lines)
  };

  let Some(cart) = cart.filter(|_| !lines.is_empty()) else {
    info!(user_id, "Checkout: cart is empty, stopping.");
    return Ok(PipelineControl::Stop);
  };

  let total = pricing::compute_cart_total(&lines);
  info!(user_id, cart_id = cart.cart_id, lines = lines.len(), %total, "Checkout: cart loaded.");
  let mut guard = ctx_data.write();
  guard.cart_id = Some(cart.cart_id);
  guard.lines = lines;
  guard.total = total;
  Ok(PipelineControl::Continue)
}

/// One order item per cart line, priced at the artwork's price right now.
#[instrument(name = "checkout::copy_items", skip_all, err(Display))]
async fn copy_items(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, MarketError> {
  let (uow, order_id, lines) = {
    let guard = ctx_data.read();
    (guard.uow.clone(), guard.order.as_ref().map(|o| o.order_id), guard.lines.clone())
  };
  let order_id = order_id.ok_or_else(|| MarketError::Internal("order not created before copy".to_string()))?;

  {
    let mut tx = uow.tx().await?;
    for line in &lines {
      tx.insert_order_item(order_id, line.artwork_id, line.price, line.quantity).await?;
    }
  }

  info!(order_id, items = lines.len(), "Checkout: order items copied.");
  ctx_data.write().items_copied = lines.len();
  Ok(PipelineControl::Continue)
}

pub fn register_checkout_pipeline(registry: &FlowRegistry<MarketError>) {
  registry.register(build_checkout_pipeline());
  info!("Checkout pipeline registered.");
}
