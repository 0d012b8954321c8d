// galleria-market/src/lib.rs

//! Order and cart management for the Galleria artwork marketplace.
//!
//! [`OrderCartManager`] owns the cart, checkout and cascading-delete
//! workflows. Each one is a `galleria_flow` pipeline running inside a single
//! store transaction, over either PostgreSQL ([`store::PgStore`]) or the
//! in-process [`store::MemoryStore`].

pub mod activity;
pub mod config;
pub mod errors;
pub mod identity;
pub mod manager;
pub mod models;
pub mod pipelines;
pub mod pricing;
pub mod state;
pub mod store;
pub mod web;

pub use crate::errors::{FieldErrors, MarketError, Result};
pub use crate::identity::{AuthenticatedUser, Role};
pub use crate::manager::{AddToCartOutcome, OrderCartManager};
