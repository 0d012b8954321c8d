// galleria-market/src/pipelines/update_cart.rs

//! Batch quantity edits. The whole batch commits or none of it does.

use crate::activity::{record_quietly, ActivityKind};
use crate::errors::MarketError;
use crate::models::CartView;
use crate::pipelines::common_steps;
use crate::pipelines::contexts::UpdateCartCtxData;
use galleria_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub fn build_update_cart_pipeline() -> Pipeline<UpdateCartCtxData, MarketError> {
  let mut p = Pipeline::<UpdateCartCtxData, MarketError>::new(&[
    ("begin_transaction", false, None),
    ("apply_quantities", false, None),
    ("load_cart_totals", false, None),
    ("commit_transaction", false, None),
    (
      "record_activity",
      true,
      Some(Arc::new(|ctx: ContextData<UpdateCartCtxData>| {
        let guard = ctx.read();
        guard.updated == 0 && guard.removed == 0
      })),
    ),
  ]);

  p.on("begin_transaction", common_steps::begin_transaction::<UpdateCartCtxData>);
  p.on("apply_quantities", apply_quantities);

  p.on("load_cart_totals", |ctx_data: ContextData<UpdateCartCtxData>| {
    Box::pin(async move {
      let (uow, user_id) = {
        let guard = ctx_data.read();
        (guard.uow.clone(), guard.user.user_id)
      };
      let lines = uow.tx().await?.cart_lines(user_id).await?;
      ctx_data.write().view = Some(CartView::from_lines(lines));
      Ok::<_, MarketError>(PipelineControl::Continue)
    })
  });

  p.on("commit_transaction", common_steps::commit_transaction::<UpdateCartCtxData>);

  p.on("record_activity", |ctx_data: ContextData<UpdateCartCtxData>| {
    Box::pin(async move {
      let (activity, user_id, updated, removed) = {
        let guard = ctx_data.read();
        (guard.activity.clone(), guard.user.user_id, guard.updated, guard.removed)
      };
      let description = format!("updated cart ({} changed, {} removed)", updated, removed);
      record_quietly(activity.as_ref(), user_id, ActivityKind::CartUpdate, &description).await;
      Ok::<_, MarketError>(PipelineControl::Continue)
    })
  });

  p
}

/// Applies each requested quantity to the caller's own items.
/// Ids outside the caller's cart are skipped without a trace in the result.
#[instrument(name = "update_cart::apply_quantities", skip_all, err(Display))]
async fn apply_quantities(ctx_data: ContextData<UpdateCartCtxData>) -> Result<PipelineControl, MarketError> {
  let (uow, user_id, quantities) = {
    let guard = ctx_data.read();
    (guard.uow.clone(), guard.user.user_id, guard.quantities.clone())
  };

  let (mut updated, mut removed, mut ignored) = (0, 0, 0);
  {
    let mut tx = uow.tx().await?;
    for (cart_item_id, quantity) in quantities {
      let applied = if quantity <= 0 {
        let hit = tx.delete_owned_item(user_id, cart_item_id).await?;
        removed += usize::from(hit);
        hit
      } else {
        let hit = tx.set_owned_item_quantity(user_id, cart_item_id, quantity).await?;
        updated += usize::from(hit);
        hit
      };
      if !applied {
        ignored += 1;
        debug!(user_id, cart_item_id, "Update cart: item not in caller's cart, skipped.");
      }
    }
  }

  info!(user_id, updated, removed, ignored, "Update cart: quantities applied.");
  let mut guard = ctx_data.write();
  guard.updated = updated;
  guard.removed = removed;
  guard.ignored = ignored;
  Ok(PipelineControl::Continue)
}

pub fn register_update_cart_pipeline(registry: &FlowRegistry<MarketError>) {
  registry.register(build_update_cart_pipeline());
  info!("Update cart pipeline registered.");
}
