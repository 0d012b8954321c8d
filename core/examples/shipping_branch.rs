// galleria-flow/examples/shipping_branch.rs

//! A branch step that resolves a shipping address through one of two scoped
//! pipelines, dispatched through a `FlowRegistry`.

use galleria_flow::{ContextData, FlowError, FlowRegistry, Pipeline, PipelineControl, PipelineResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

#[derive(Clone, Debug, Default)]
struct AddressScope {
  saved_id: Option<u32>,
  typed_in: Option<String>,
  book: HashMap<u32, String>,
  resolved: Option<String>,
}

#[derive(Clone, Debug)]
struct OrderContext {
  address: ContextData<AddressScope>,
  ship_to: Option<String>,
}

fn saved_scope() -> Arc<Pipeline<AddressScope, FlowError>> {
  let mut p = Pipeline::<AddressScope, FlowError>::new(&[("lookup", false, None)]);
  p.on("lookup", |ctx: ContextData<AddressScope>| {
    Box::pin(async move {
      let mut scope = ctx.write();
      let found = scope.saved_id.and_then(|id| scope.book.get(&id).cloned());
      scope.resolved = found;
      Ok::<_, FlowError>(PipelineControl::Continue)
    })
  });
  Arc::new(p)
}

fn typed_scope() -> Arc<Pipeline<AddressScope, FlowError>> {
  let mut p = Pipeline::<AddressScope, FlowError>::new(&[("normalize", false, None)]);
  p.on("normalize", |ctx: ContextData<AddressScope>| {
    Box::pin(async move {
      let mut scope = ctx.write();
      let normalized = scope.typed_in.as_deref().map(|a| a.trim().to_string());
      scope.resolved = normalized;
      Ok::<_, FlowError>(PipelineControl::Continue)
    })
  });
  Arc::new(p)
}

fn build_order_pipeline() -> Pipeline<OrderContext, FlowError> {
  let mut p = Pipeline::<OrderContext, FlowError>::new(&[("resolve_address", false, None)]);

  p.branch("resolve_address")
    .when(
      |ctx: ContextData<OrderContext>| ctx.read().address.read().saved_id.is_some(),
      saved_scope(),
      |ctx: ContextData<OrderContext>| Ok(ctx.read().address.clone()),
    )
    .when(
      |ctx: ContextData<OrderContext>| ctx.read().address.read().typed_in.is_some(),
      typed_scope(),
      |ctx: ContextData<OrderContext>| Ok(ctx.read().address.clone()),
    )
    .otherwise(PipelineControl::Stop)
    .finish(false);

  p.after("resolve_address", |ctx: ContextData<OrderContext>| {
    Box::pin(async move {
      let address = ctx.read().address.clone();
      let resolved = address.read().resolved.clone();
      ctx.write().ship_to = resolved;
      Ok::<_, FlowError>(PipelineControl::Continue)
    })
  });

  p
}

#[tokio::main]
async fn main() -> Result<(), FlowError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  let registry = FlowRegistry::<FlowError>::new();
  registry.register(build_order_pipeline());

  let saved = ContextData::new(OrderContext {
    address: ContextData::new(AddressScope {
      saved_id: Some(7),
      book: HashMap::from([(7, "12 Canvas Row, Oakland".to_string())]),
      ..Default::default()
    }),
    ship_to: None,
  });
  registry.run(saved.clone()).await?;
  info!(ship_to = ?saved.read().ship_to, "Saved address resolved.");

  let typed = ContextData::new(OrderContext {
    address: ContextData::new(AddressScope {
      typed_in: Some("  4 Easel Lane, Berkeley ".to_string()),
      ..Default::default()
    }),
    ship_to: None,
  });
  registry.run(typed.clone()).await?;
  assert_eq!(typed.read().ship_to.as_deref(), Some("4 Easel Lane, Berkeley"));

  let neither = ContextData::new(OrderContext {
    address: ContextData::new(AddressScope::default()),
    ship_to: None,
  });
  assert_eq!(registry.run(neither).await?, PipelineResult::Stopped);

  Ok(())
}
