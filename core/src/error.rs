// galleria-flow/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Failures raised by the engine itself, as opposed to failures raised by
/// user handlers. Every pipeline error type must be `From<FlowError>` so these
/// can surface through `Pipeline::run`.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Extractor failed for step '{step_name}': {source}")]
  ExtractorFailure {
    step_name: String,
    #[source]
    source: AnyhowError,
  },

  #[error("No pipeline registered for context type {type_name}")]
  NotRegistered { type_name: String },

  #[error("Context type mismatch in step '{step_name}' (expected {expected_type})")]
  TypeMismatch { step_name: String, expected_type: String },

  #[error("Internal flow error: {0}")]
  Internal(String),
}

impl FlowError {
  /// Wraps an arbitrary failure as an extractor failure for `step_name`.
  pub fn extractor(step_name: impl Into<String>, source: impl Into<AnyhowError>) -> Self {
    FlowError::ExtractorFailure {
      step_name: step_name.into(),
      source: source.into(),
    }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
