//! Observability infrastructure for the edge rewrite pipeline.
//!
//! This crate provides:
//! - `StructuredLogger` - Structured logging with request context
//! - `LogBuilder` - Fluent log entries with typed fields

mod logging;

pub use logging::*;

// Re-export RequestId from edge-core for convenience
pub use edge_core::RequestId;
