//! rollcall-core library.
//!
//! Folds a roster, a clock-in timesheet, and an incident log into one
//! [`model::Registry`] of people, then buckets their time and incidents by
//! shift and by week.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod resolve;
pub mod snapshot;
pub mod table;

/// # Conventions
///
/// - **Errors**: typed `thiserror` enums per stage, each mapping to an
///   [`error::ErrorCode`]; `anyhow::Result` only for config loading.
/// - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).
pub use pipeline::{Batch, Pipeline, Sources};
