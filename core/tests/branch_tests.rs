// tests/branch_tests.rs
mod common;

use common::*;
use galleria_flow::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult};
use serial_test::serial;
use std::sync::Arc;

fn saved_route_pipeline() -> Arc<Pipeline<SavedRouteContext, TestError>> {
  let mut pipeline = Pipeline::new(&[("lookup", false, None)]);
  pipeline.on("lookup", |ctx: ContextData<SavedRouteContext>| async move {
    let mut guard = ctx.write();
    guard.resolved = Some(format!("saved:{}", guard.reference));
    Ok::<_, TestError>(PipelineControl::Continue)
  });
  Arc::new(pipeline)
}

fn fresh_route_pipeline(stop: bool) -> Arc<Pipeline<FreshRouteContext, TestError>> {
  let mut pipeline = Pipeline::new(&[("store", false, None)]);
  pipeline.on("store", move |ctx: ContextData<FreshRouteContext>| async move {
    ctx.write().stored = true;
    Ok::<_, TestError>(if stop { PipelineControl::Stop } else { PipelineControl::Continue })
  });
  Arc::new(pipeline)
}

/// Main pipeline: `prepare` -> `route` (branch) -> `finalize`.
/// The saved-route scope shares its context through a field of the main one.
fn routed_pipeline(
  saved_ctx: ContextData<SavedRouteContext>,
  fresh_stops: bool,
  optional: bool,
) -> Pipeline<TestContext, TestError> {
  let mut pipeline = Pipeline::new(&[("prepare", false, None), ("route", false, None), ("finalize", false, None)]);
  pipeline.on_boxed("prepare", recording_handler("prepare", "P"));
  pipeline.on_boxed("finalize", recording_handler("finalize", "F"));

  let saved_for_extract = saved_ctx.clone();
  pipeline
    .branch("route")
    .when(
      |ctx: ContextData<TestContext>| ctx.read().route.as_deref() == Some("saved"),
      saved_route_pipeline(),
      move |_ctx| Ok(saved_for_extract.clone()),
    )
    .when(
      |ctx: ContextData<TestContext>| ctx.read().route.as_deref() == Some("fresh"),
      fresh_route_pipeline(fresh_stops),
      |ctx: ContextData<TestContext>| {
        Ok(ContextData::new(FreshRouteContext {
          payload: ctx.read().message.clone(),
          stored: false,
        }))
      },
    )
    .when(
      |ctx: ContextData<TestContext>| ctx.read().route.as_deref() == Some("broken"),
      saved_route_pipeline(),
      |_ctx| Err(FlowError::extractor("ignored", anyhow::anyhow!("no reference"))),
    )
    .finish(optional);
  pipeline
}

#[tokio::test]
#[serial]
async fn test_branch_runs_first_matching_scope() {
  setup_tracing();
  let saved_ctx = ContextData::new(SavedRouteContext {
    reference: "42".to_string(),
    resolved: None,
  });
  let pipeline = routed_pipeline(saved_ctx.clone(), false, false);

  let ctx = ContextData::new(TestContext {
    route: Some("saved".to_string()),
    ..Default::default()
  });
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(saved_ctx.read().resolved.as_deref(), Some("saved:42"));
  assert_eq!(ctx.read().steps_executed, vec!["prepare", "finalize"]);
}

#[tokio::test]
#[serial]
async fn test_branch_without_match_continues() {
  setup_tracing();
  let saved_ctx = ContextData::new(SavedRouteContext::default());
  let pipeline = routed_pipeline(saved_ctx.clone(), false, false);

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert!(saved_ctx.read().resolved.is_none());
  assert_eq!(ctx.read().steps_executed, vec!["prepare", "finalize"]);
}

#[tokio::test]
#[serial]
async fn test_branch_otherwise_can_stop() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("route", false, None), ("after", false, None)]);
  pipeline.on_boxed("after", recording_handler("after", "A"));
  pipeline
    .branch("route")
    .when(|_ctx: ContextData<TestContext>| false, saved_route_pipeline(), |_ctx| {
      Ok(ContextData::new(SavedRouteContext::default()))
    })
    .otherwise(PipelineControl::Stop)
    .finish(false);

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Stopped);
  assert!(ctx.read().steps_executed.is_empty());
}

#[tokio::test]
#[serial]
async fn test_scoped_stop_stops_parent() {
  setup_tracing();
  let pipeline = routed_pipeline(ContextData::new(SavedRouteContext::default()), true, false);

  let ctx = ContextData::new(TestContext {
    route: Some("fresh".to_string()),
    ..Default::default()
  });
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Stopped);
  assert_eq!(ctx.read().steps_executed, vec!["prepare"]);
}

#[tokio::test]
#[serial]
async fn test_extractor_failure_carries_branch_step_name() {
  setup_tracing();
  let pipeline = routed_pipeline(ContextData::new(SavedRouteContext::default()), false, false);

  let ctx = ContextData::new(TestContext {
    route: Some("broken".to_string()),
    ..Default::default()
  });
  match pipeline.run(ctx.clone()).await {
    Err(TestError::Flow(text)) => {
      assert!(text.contains("ExtractorFailure"));
      assert!(text.contains("\"route\""));
    }
    other => panic!("expected extractor failure, got {:?}", other),
  }
  assert_eq!(ctx.read().steps_executed, vec!["prepare"]);
}

#[tokio::test]
#[serial]
async fn test_optional_branch_swallows_scope_failure() {
  setup_tracing();
  let pipeline = routed_pipeline(ContextData::new(SavedRouteContext::default()), false, true);

  let ctx = ContextData::new(TestContext {
    route: Some("broken".to_string()),
    ..Default::default()
  });
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["prepare", "finalize"]);
}

#[tokio::test]
#[serial]
async fn test_branch_appends_missing_step() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("first", false, None)]);
  pipeline.on_boxed("first", recording_handler("first", "1"));
  pipeline
    .branch("tail")
    .when(
      |_ctx: ContextData<TestContext>| true,
      fresh_route_pipeline(false),
      |_ctx| Ok(ContextData::new(FreshRouteContext::default())),
    )
    .finish(false);

  assert_eq!(pipeline.step_names(), vec!["first", "tail"]);
  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx).await.unwrap(), PipelineResult::Completed);
}
