// galleria-flow/src/lib.rs

//! Galleria Flow: asynchronous step pipelines for multi-step business workflows.
//!
//! A [`Pipeline`] is an ordered list of named steps over a shared
//! [`ContextData`]. Each step may carry `before`, `on` and `after` handlers,
//! be optional or skipped by a predicate, stop the run early, or branch into
//! one of several scoped pipelines. A [`FlowRegistry`] maps context types to
//! their pipelines so callers only need the context value to start a run.

pub mod branch;
pub mod context;
pub mod control;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod step;

pub use crate::branch::BranchBuilder;
pub use crate::context::ContextData;
pub use crate::control::{PipelineControl, PipelineResult};
pub use crate::error::{FlowError, FlowResult};
pub use crate::pipeline::Pipeline;
pub use crate::registry::FlowRegistry;
pub use crate::step::{Handler, SkipCondition, StepDef};
