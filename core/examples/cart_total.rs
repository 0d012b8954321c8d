// galleria-flow/examples/cart_total.rs

//! A linear pipeline that prices a cart and stops early when it is empty.

use galleria_flow::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult};
use tracing::info;

#[derive(Clone, Debug, Default)]
struct CartContext {
  /// (title, price in cents, quantity)
  lines: Vec<(String, i64, i32)>,
  total_cents: i64,
  receipt: Vec<String>,
}

fn build_pipeline() -> Pipeline<CartContext, FlowError> {
  let mut pipeline = Pipeline::<CartContext, FlowError>::new(&[
    ("check_not_empty", false, None),
    ("sum_lines", false, None),
    ("write_receipt", true, None),
  ]);

  pipeline.on("check_not_empty", |ctx: ContextData<CartContext>| {
    Box::pin(async move {
      if ctx.read().lines.is_empty() {
        info!("Cart is empty, nothing to price.");
        return Ok::<_, FlowError>(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  });

  pipeline.on("sum_lines", |ctx: ContextData<CartContext>| {
    Box::pin(async move {
      let mut data = ctx.write();
      data.total_cents = data.lines.iter().map(|(_, price, qty)| price * i64::from(*qty)).sum();
      Ok::<_, FlowError>(PipelineControl::Continue)
    })
  });

  pipeline.on("write_receipt", |ctx: ContextData<CartContext>| {
    Box::pin(async move {
      let mut data = ctx.write();
      let mut receipt: Vec<String> = data
        .lines
        .iter()
        .map(|(title, price, qty)| format!("{} x{} @ {}.{:02}", title, qty, price / 100, price % 100))
        .collect();
      receipt.push(format!("total {}.{:02}", data.total_cents / 100, data.total_cents % 100));
      data.receipt = receipt;
      Ok::<_, FlowError>(PipelineControl::Continue)
    })
  });

  pipeline
}

#[tokio::main]
async fn main() -> Result<(), FlowError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  let pipeline = build_pipeline();

  let cart = ContextData::new(CartContext {
    lines: vec![("Harbor at Dusk".to_string(), 1000, 2), ("Paper Cranes".to_string(), 500, 1)],
    ..Default::default()
  });
  let result = pipeline.run(cart.clone()).await?;
  assert_eq!(result, PipelineResult::Completed);
  for line in &cart.read().receipt {
    info!("{}", line);
  }
  assert_eq!(cart.read().total_cents, 2500);

  let empty = ContextData::new(CartContext::default());
  assert_eq!(pipeline.run(empty).await?, PipelineResult::Stopped);

  Ok(())
}
