// galleria-market/src/errors.rs

use crate::store::StoreError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use galleria_flow::FlowError;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Field-level validation messages, kept in the order they were raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
  entries: Vec<(String, String)>,
}

impl FieldErrors {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
    let mut errors = Self::new();
    errors.add(field, message);
    errors
  }

  /// Records `message` for `field`. A field keeps its first message.
  pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
    let field = field.into();
    if self.get(&field).is_none() {
      self.entries.push((field, message.into()));
    }
  }

  pub fn get(&self, field: &str) -> Option<&str> {
    self
      .entries
      .iter()
      .find(|(name, _)| name == field)
      .map(|(_, message)| message.as_str())
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn fields(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(|(name, _)| name.as_str())
  }

  /// `Ok(())` when nothing was recorded, otherwise a validation error.
  pub fn into_result(self) -> Result<()> {
    if self.is_empty() {
      Ok(())
    } else {
      Err(MarketError::Validation(self))
    }
  }
}

impl fmt::Display for FieldErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (_, message) in &self.entries {
      if !first {
        f.write_str("; ")?;
      }
      f.write_str(message)?;
      first = false;
    }
    Ok(())
  }
}

impl Serialize for FieldErrors {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.entries.len()))?;
    for (field, message) in &self.entries {
      map.serialize_entry(field, message)?;
    }
    map.end()
  }
}

#[derive(Debug, Error)]
pub enum MarketError {
  #[error("Validation failed: {0}")]
  Validation(FieldErrors),

  #[error("Not found: {0}")]
  NotFound(String),

  #[error("Storage failure: {0}")]
  Persistence(StoreError),

  #[error("Authentication failed: {0}")]
  Auth(String),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Workflow error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal error: {0}")]
  Internal(String),
}

// Transaction bookkeeping errors are bugs, not outages.
impl From<StoreError> for MarketError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::AlreadyOpen | StoreError::Finished => MarketError::Internal(err.to_string()),
      other => MarketError::Persistence(other),
    }
  }
}

impl MarketError {
  pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
    MarketError::Validation(FieldErrors::single(field, message))
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    MarketError::NotFound(message.into())
  }

  pub fn field_errors(&self) -> Option<&FieldErrors> {
    match self {
      MarketError::Validation(errors) => Some(errors),
      _ => None,
    }
  }
}

impl ResponseError for MarketError {
  fn status_code(&self) -> StatusCode {
    match self {
      MarketError::Validation(_) => StatusCode::BAD_REQUEST,
      MarketError::NotFound(_) => StatusCode::NOT_FOUND,
      MarketError::Auth(_) => StatusCode::UNAUTHORIZED,
      MarketError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
      MarketError::Config(_) | MarketError::Workflow { .. } | MarketError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  // Storage and engine details stay in the logs; clients only see generic text.
  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    match self {
      MarketError::Validation(fields) => {
        tracing::info!(error = %self, "Rejecting request with validation errors");
        HttpResponse::build(status).json(json!({"error": "Validation failed", "fields": fields}))
      }
      MarketError::NotFound(m) | MarketError::Auth(m) => {
        tracing::info!(error = %self, "Rejecting request");
        HttpResponse::build(status).json(json!({"error": m}))
      }
      MarketError::Persistence(source) => {
        tracing::error!(storage_error = %source, "Responding with storage failure");
        HttpResponse::build(status).json(json!({"error": "Please try again."}))
      }
      MarketError::Workflow { source } => {
        tracing::error!(flow_error = ?source, "Responding with workflow failure");
        HttpResponse::build(status).json(json!({"error": "An internal error occurred"}))
      }
      MarketError::Config(_) | MarketError::Internal(_) => {
        tracing::error!(application_error = %self, "Responding with internal failure");
        HttpResponse::build(status).json(json!({"error": "An internal error occurred"}))
      }
    }
  }
}

pub type Result<T, E = MarketError> = std::result::Result<T, E>;
