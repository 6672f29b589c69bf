//! Rewrite and dispatch protocol for chained edge stages.
//!
//! A request walks an ordered list of stages. Each stage decides one of:
//! - pass the request on unchanged,
//! - rewrite it to a new same-origin URL and hand it to the next stage,
//! - answer it.
//!
//! If no stage answers, the final request is handed back to the host
//! (static file serving and the like).
//!
//! ```ignore
//! let pipeline = Pipeline::new("site")
//!     .stage(RouteConfig::new("/*", "rewrite"), rewrite_stage)
//!     .stage(RouteConfig::new("/*", "content"), content_stage);
//!
//! match pipeline.run(ctx, &mut cookies, &geo, &logger) {
//!     PipelineOutcome::Response(response) => { /* send it */ }
//!     PipelineOutcome::PassThrough(request) => { /* serve statically */ }
//! }
//! ```

mod pipeline;
mod stage;

pub use pipeline::*;
pub use stage::*;
