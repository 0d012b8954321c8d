// galleria-market/src/pipelines/remove_item.rs

use crate::errors::MarketError;
use crate::pipelines::common_steps;
use crate::pipelines::contexts::RemoveItemCtxData;
use galleria_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{debug, info};

pub fn build_remove_item_pipeline() -> Pipeline<RemoveItemCtxData, MarketError> {
  let mut p = Pipeline::<RemoveItemCtxData, MarketError>::new(&[
    ("begin_transaction", false, None),
    ("delete_owned_item", false, None),
    ("commit_transaction", false, None),
  ]);

  p.on("begin_transaction", common_steps::begin_transaction::<RemoveItemCtxData>);

  // Items in someone else's cart are a silent no-op.
  p.on("delete_owned_item", |ctx_data: ContextData<RemoveItemCtxData>| {
    Box::pin(async move {
      let (uow, user_id, cart_item_id) = {
        let guard = ctx_data.read();
        (guard.uow.clone(), guard.user.user_id, guard.cart_item_id)
      };
      let removed = uow.tx().await?.delete_owned_item(user_id, cart_item_id).await?;
      if removed {
        info!(user_id, cart_item_id, "Remove from cart: item deleted.");
      } else {
        debug!(user_id, cart_item_id, "Remove from cart: nothing to delete.");
      }
      ctx_data.write().removed = removed;
      Ok::<_, MarketError>(PipelineControl::Continue)
    })
  });

  p.on("commit_transaction", common_steps::commit_transaction::<RemoveItemCtxData>);
  p
}

pub fn register_remove_item_pipeline(registry: &FlowRegistry<MarketError>) {
  registry.register(build_remove_item_pipeline());
  info!("Remove from cart pipeline registered.");
}
