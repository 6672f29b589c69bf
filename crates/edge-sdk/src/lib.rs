//! Public SDK for the edge platform.
//!
//! This crate re-exports all platform functionality:
//!
//! ```ignore
//! use edge_sdk::prelude::*;
//!
//! struct Hello;
//!
//! impl Stage for Hello {
//!     fn name(&self) -> &str {
//!         "hello"
//!     }
//!
//!     fn handle(&self, ctx: &RequestContext, env: &mut StageEnv<'_>) -> StageOutcome {
//!         env.logger.info("Handling request");
//!         StageOutcome::Respond(EdgeResponse::builder().body("hello").build())
//!     }
//! }
//!
//! let pipeline = Pipeline::new("hello").stage(RouteConfig::new("/*", "hello"), Hello);
//! ```

pub use edge_cache;
pub use edge_core;
pub use edge_observability;
pub use edge_pipeline;

/// Prelude for convenient imports.
pub mod prelude {
    pub use edge_cache::*;
    pub use edge_core::*;
    pub use edge_observability::*;
    pub use edge_pipeline::*;
}
