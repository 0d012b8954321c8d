// galleria-market/src/pipelines/add_to_cart.rs

use crate::activity::{record_quietly, ActivityKind};
use crate::errors::MarketError;
use crate::pipelines::common_steps;
use crate::pipelines::contexts::AddToCartCtxData;
use galleria_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use std::sync::Arc;
use tracing::{info, warn};

pub fn build_add_to_cart_pipeline() -> Pipeline<AddToCartCtxData, MarketError> {
  let mut p = Pipeline::<AddToCartCtxData, MarketError>::new(&[
    ("begin_transaction", false, None),
    ("check_artwork", false, None),
    ("find_or_create_cart", false, None),
    ("insert_cart_item", false, None),
    ("count_cart_items", false, None),
    ("commit_transaction", false, None),
    (
      "record_activity",
      true,
      Some(Arc::new(|ctx: ContextData<AddToCartCtxData>| ctx.read().already_in_cart)),
    ),
  ]);

  p.on("begin_transaction", common_steps::begin_transaction::<AddToCartCtxData>);

  // The artwork must exist before anything is written, including the cart row.
  p.on("check_artwork", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let (uow, artwork_id) = {
        let guard = ctx_data.read();
        (guard.uow.clone(), guard.artwork_id)
      };
      let artwork = uow.tx().await?.artwork(artwork_id).await?;
      let artwork = artwork.ok_or_else(|| {
        warn!(artwork_id, "Add to cart: artwork not found.");
        MarketError::not_found(format!("Artwork {} not found", artwork_id))
      })?;
      ctx_data.write().artwork = Some(artwork);
      Ok::<_, MarketError>(PipelineControl::Continue)
    })
  });

  p.on("find_or_create_cart", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let (uow, user_id) = {
        let guard = ctx_data.read();
        (guard.uow.clone(), guard.user.user_id)
      };
      let mut tx = uow.tx().await?;
      let cart = match tx.find_cart(user_id).await? {
        Some(cart) => cart,
        None => {
          let cart = tx.create_cart(user_id).await?;
          info!(user_id, cart_id = cart.cart_id, "Add to cart: created cart lazily.");
          cart
        }
      };
      drop(tx);
      ctx_data.write().cart_id = Some(cart.cart_id);
      Ok::<_, MarketError>(PipelineControl::Continue)
    })
  });

  p.on("insert_cart_item", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let (uow, cart_id, artwork_id) = {
        let guard = ctx_data.read();
        (guard.uow.clone(), guard.cart_id, guard.artwork_id)
      };
      let cart_id = cart_id.ok_or_else(|| MarketError::Internal("cart not resolved before insert".to_string()))?;

      let mut tx = uow.tx().await?;
      if let Some(existing) = tx.find_cart_item(cart_id, artwork_id).await? {
        info!(
          cart_id,
          artwork_id,
          cart_item_id = existing.cart_item_id,
          "Add to cart: artwork already in cart."
        );
        drop(tx);
        ctx_data.write().already_in_cart = true;
        return Ok(PipelineControl::Continue);
      }
      // A concurrent add can land between the lookup and the insert.
      match tx.insert_cart_item(cart_id, artwork_id, 1).await? {
        Some(item) => {
          info!(cart_id, artwork_id, cart_item_id = item.cart_item_id, "Add to cart: item inserted.");
        }
        None => {
          info!(cart_id, artwork_id, "Add to cart: line appeared concurrently, treating as already in cart.");
          drop(tx);
          ctx_data.write().already_in_cart = true;
        }
      }
      Ok::<_, MarketError>(PipelineControl::Continue)
    })
  });

  p.on("count_cart_items", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let (uow, cart_id) = {
        let guard = ctx_data.read();
        (guard.uow.clone(), guard.cart_id)
      };
      let cart_id = cart_id.ok_or_else(|| MarketError::Internal("cart not resolved before count".to_string()))?;
      let count = uow.tx().await?.count_cart_items(cart_id).await?;
      ctx_data.write().cart_item_count = count;
      Ok::<_, MarketError>(PipelineControl::Continue)
    })
  });

  p.on("commit_transaction", common_steps::commit_transaction::<AddToCartCtxData>);

  p.on("record_activity", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let (activity, user_id, artwork) = {
        let guard = ctx_data.read();
        (guard.activity.clone(), guard.user.user_id, guard.artwork.clone())
      };
      if let Some(artwork) = artwork {
        let description = format!("added artwork '{}' (ID: {}) to cart", artwork.title, artwork.artwork_id);
        record_quietly(activity.as_ref(), user_id, ActivityKind::CartAdd, &description).await;
      }
      Ok::<_, MarketError>(PipelineControl::Continue)
    })
  });

  p
}

pub fn register_add_to_cart_pipeline(registry: &FlowRegistry<MarketError>) {
  registry.register(build_add_to_cart_pipeline());
  info!("Add to cart pipeline registered.");
}
