// galleria-flow/src/pipeline/mod.rs

//! `Pipeline<T, E>`: its definition, hook registration and execution.

pub mod definition;
pub mod execution;
pub mod hooks;

pub use definition::Pipeline;
