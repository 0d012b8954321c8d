// tests/context_tests.rs
mod common;

use common::*;
use galleria_flow::{ContextData, Pipeline, PipelineControl};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_handlers_share_one_context() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("write", false, None), ("read", false, None)]);
  pipeline.on("write", |ctx: ContextData<TestContext>| async move {
    ctx.write().counter = 41;
    Ok::<_, TestError>(PipelineControl::Continue)
  });
  pipeline.on("read", |ctx: ContextData<TestContext>| async move {
    let seen = ctx.read().counter;
    ctx.write().counter = seen + 1;
    Ok::<_, TestError>(PipelineControl::Continue)
  });

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().counter, 42);
}

#[tokio::test]
#[serial]
async fn test_guard_dropped_before_await() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("slow", false, None)]);
  pipeline.on("slow", |ctx: ContextData<TestContext>| async move {
    let start = {
      let guard = ctx.read();
      guard.counter
    };
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    ctx.write().counter = start + 10;
    Ok::<_, TestError>(PipelineControl::Continue)
  });

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().counter, 10);
}

#[test]
fn test_clones_share_state() {
  let ctx = ContextData::new(TestContext::default());
  let other = ctx.clone();
  other.write().message.push_str("shared");
  assert_eq!(ctx.read().message, "shared");
  assert_eq!(ctx.handle_count(), 2);
  drop(other);
  assert_eq!(ctx.handle_count(), 1);
}

#[test]
fn test_mapped_guards_narrow_access() {
  let ctx = ContextData::new(TestContext::default());
  ctx.map_write(|d| &mut d.steps_executed).push("mapped".to_string());
  assert_eq!(ctx.map_read(|d| &d.steps_executed).len(), 1);
}

#[test]
fn test_try_write_fails_while_read_guard_held() {
  let ctx = ContextData::new(TestContext::default());
  let guard = ctx.read();
  assert!(ctx.try_write().is_none());
  assert!(ctx.try_read().is_some());
  drop(guard);
  assert!(ctx.try_write().is_some());
}
