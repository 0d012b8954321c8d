// galleria-flow/src/branch.rs

//! Conditional branches: a step that runs one of several scoped pipelines.
//!
//! Each scope pairs a condition over the main context with a scoped
//! `Pipeline<S, E>` and an extractor producing the scoped `ContextData<S>`.
//! Scopes are tried in registration order and only the first match runs.

use crate::context::ContextData;
use crate::control::{PipelineControl, PipelineResult};
use crate::error::FlowError;
use crate::pipeline::Pipeline;
use crate::step::Handler;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{event, instrument, Level};

type Condition<T> = Arc<dyn Fn(ContextData<T>) -> bool + Send + Sync + 'static>;
type Extractor<T, S> = Arc<dyn Fn(ContextData<T>) -> Result<ContextData<S>, FlowError> + Send + Sync + 'static>;

#[async_trait]
trait AnyScope<T, E>: Send + Sync
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn matches(&self, ctx_data: ContextData<T>) -> bool;

  async fn execute(&self, step_name: &str, ctx_data: ContextData<T>) -> Result<PipelineControl, E>;
}

struct Scope<T, S, E>
where
  T: 'static + Send + Sync,
  S: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  condition: Condition<T>,
  pipeline: Arc<Pipeline<S, E>>,
  extractor: Extractor<T, S>,
}

#[async_trait]
impl<T, S, E> AnyScope<T, E> for Scope<T, S, E>
where
  T: 'static + Send + Sync,
  S: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn matches(&self, ctx_data: ContextData<T>) -> bool {
    (self.condition)(ctx_data)
  }

  #[instrument(
    name = "Branch::execute_scope",
    skip(self, ctx_data),
    fields(scoped_context_type = %std::any::type_name::<S>())
  )]
  async fn execute(&self, step_name: &str, ctx_data: ContextData<T>) -> Result<PipelineControl, E> {
    let scoped_ctx = (self.extractor)(ctx_data).map_err(|err| {
      let err = match err {
        FlowError::ExtractorFailure { source, .. } => FlowError::ExtractorFailure {
          step_name: step_name.to_string(),
          source,
        },
        other => other,
      };
      event!(Level::ERROR, error = %err, "Scoped context extraction failed.");
      E::from(err)
    })?;

    match self.pipeline.run(scoped_ctx).await? {
      PipelineResult::Completed => Ok(PipelineControl::Continue),
      PipelineResult::Stopped => {
        event!(Level::INFO, "Scoped pipeline stopped; stopping the parent pipeline too.");
        Ok(PipelineControl::Stop)
      }
    }
  }
}

/// Fluent builder returned by [`Pipeline::branch`].
pub struct BranchBuilder<'p, T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipeline: &'p mut Pipeline<T, E>,
  step_name: String,
  scopes: Vec<Arc<dyn AnyScope<T, E>>>,
  otherwise: PipelineControl,
}

impl<'p, T, E> BranchBuilder<'p, T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) fn new(pipeline: &'p mut Pipeline<T, E>, step_name: String) -> Self {
    Self {
      pipeline,
      step_name,
      scopes: Vec::new(),
      otherwise: PipelineControl::Continue,
    }
  }

  /// Adds a scope: when `condition` holds, `extractor` builds the scoped
  /// context and `scoped` runs against it.
  pub fn when<S>(
    mut self,
    condition: impl Fn(ContextData<T>) -> bool + Send + Sync + 'static,
    scoped: Arc<Pipeline<S, E>>,
    extractor: impl Fn(ContextData<T>) -> Result<ContextData<S>, FlowError> + Send + Sync + 'static,
  ) -> Self
  where
    S: 'static + Send + Sync,
  {
    self.scopes.push(Arc::new(Scope {
      condition: Arc::new(condition),
      pipeline: scoped,
      extractor: Arc::new(extractor),
    }));
    self
  }

  /// What the step returns when no scope matches. Defaults to `Continue`.
  pub fn otherwise(mut self, control: PipelineControl) -> Self {
    self.otherwise = control;
    self
  }

  /// Installs the branch as the step's only `on` handler.
  ///
  /// With `optional` set, a failing scope is logged and the parent pipeline
  /// continues; otherwise the scope's error propagates.
  pub fn finish(self, optional: bool) {
    let scopes = Arc::new(self.scopes);
    let otherwise = self.otherwise;
    let step_name = self.step_name;
    let handler_step_name = step_name.clone();

    let handler: Handler<T, E> = Box::new(move |ctx_data: ContextData<T>| {
      let scopes = Arc::clone(&scopes);
      let step_name = handler_step_name.clone();
      Box::pin(async move {
        for scope in scopes.iter() {
          if !scope.matches(ctx_data.clone()) {
            continue;
          }
          event!(Level::DEBUG, %step_name, "Branch scope matched.");
          return match scope.execute(&step_name, ctx_data.clone()).await {
            Ok(control) => Ok(control),
            Err(e) if optional => {
              event!(Level::WARN, %step_name, error = %e, "Optional branch failed; continuing.");
              Ok(PipelineControl::Continue)
            }
            Err(e) => Err(e),
          };
        }
        event!(Level::DEBUG, %step_name, ?otherwise, "No branch scope matched.");
        Ok(otherwise)
      })
    });

    self.pipeline.set_optional(&step_name, optional);
    self.pipeline.on.insert(step_name.clone(), vec![handler]);
    event!(Level::DEBUG, %step_name, "Branch installed.");
  }
}
