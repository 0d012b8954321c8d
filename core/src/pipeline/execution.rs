// galleria-flow/src/pipeline/execution.rs

//! `Pipeline::run`.

use crate::context::ContextData;
use crate::control::{PipelineControl, PipelineResult};
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use crate::step::Handler;
use tracing::{event, info_span, instrument, Instrument, Level};

impl<T, E> Pipeline<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step against `ctx_data`.
  ///
  /// Returns `Stopped` as soon as a handler asks to stop, and the handler's
  /// error unchanged as soon as one fails. A non-optional step without any
  /// handler is reported as `FlowError::HandlerMissing` converted into `E`.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(context_type = %std::any::type_name::<T>(), num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<T>) -> Result<PipelineResult, E> {
    event!(Level::DEBUG, "Pipeline run starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();

      if let Some(skip_if) = &step_def.skip_if {
        if skip_if(ctx_data.clone()) {
          event!(Level::DEBUG, %step_name, "Step skipped by its condition.");
          continue;
        }
      }

      let before = non_empty(self.before.get(step_name));
      let on = non_empty(self.on.get(step_name));
      let after = non_empty(self.after.get(step_name));

      if before.is_none() && on.is_none() && after.is_none() {
        if step_def.optional {
          event!(Level::DEBUG, %step_name, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(Level::ERROR, %step_name, "Non-optional step has no handlers.");
        return Err(E::from(FlowError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      let step_span = info_span!("pipeline_step", step_name, step_index = step_idx, optional = step_def.optional);
      let control = async {
        for (phase, handlers) in [("before", before), ("on", on), ("after", after)] {
          if let Some(handlers) = handlers {
            if run_phase(phase, handlers, &ctx_data).await? == PipelineControl::Stop {
              return Ok(PipelineControl::Stop);
            }
          }
        }
        Ok::<_, E>(PipelineControl::Continue)
      }
      .instrument(step_span)
      .await?;

      if control == PipelineControl::Stop {
        event!(Level::INFO, %step_name, "Pipeline stopped by a handler.");
        return Ok(PipelineResult::Stopped);
      }
    }

    event!(Level::DEBUG, "Pipeline run completed.");
    Ok(PipelineResult::Completed)
  }
}

fn non_empty<H>(handlers: Option<&Vec<H>>) -> Option<&[H]> {
  handlers.filter(|v| !v.is_empty()).map(Vec::as_slice)
}

async fn run_phase<T, E>(
  phase: &'static str,
  handlers: &[Handler<T, E>],
  ctx_data: &ContextData<T>,
) -> Result<PipelineControl, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + Send + Sync + 'static,
{
  for (handler_idx, handler) in handlers.iter().enumerate() {
    match handler(ctx_data.clone()).await {
      Ok(PipelineControl::Continue) => {}
      Ok(PipelineControl::Stop) => {
        event!(Level::DEBUG, phase, handler_idx, "Handler returned Stop.");
        return Ok(PipelineControl::Stop);
      }
      Err(e) => {
        event!(Level::ERROR, phase, handler_idx, error = %e, "Handler failed.");
        return Err(e);
      }
    }
  }
  Ok(PipelineControl::Continue)
}
