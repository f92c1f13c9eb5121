//! Core library for the snare trick-question benchmark.
//!
//! The interesting part is the incremental reconciliation pipeline: given a
//! model list, a question list, and previously persisted results, compute
//! exactly which (model, question) pairs still need execution, run them
//! sequentially against the remote inference API, and merge the outcomes
//! back into the per-model stores without clobbering anything a partial or
//! failed run did not touch.

pub mod config;
pub mod engine;
pub mod errors;
pub mod fingerprint;
pub mod judge;
pub mod model;
pub mod providers;
pub mod reconcile;
pub mod report;
pub mod store;

pub use config::Config;
pub use engine::runner::{RunSummary, Runner};
