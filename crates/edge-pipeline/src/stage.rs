//! Stage trait and per-stage outcomes.

use edge_core::{CookieStore, EdgeResponse, GeoResolver, RequestContext};
use edge_observability::StructuredLogger;
use url::Url;

/// What a stage decided for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Not for this stage; hand the request on unchanged.
    PassThrough,
    /// Hand the next stage this URL as if the client had requested it.
    /// The client never sees the new URL.
    Rewrite(Url),
    /// Answer the request.
    Respond(EdgeResponse),
}

/// Capabilities a stage may use while handling a request.
pub struct StageEnv<'a> {
    /// Client cookie jar.
    pub cookies: &'a mut dyn CookieStore,
    /// Geolocation lookup.
    pub geo: &'a dyn GeoResolver,
    /// Logger scoped to the stage.
    pub logger: StructuredLogger,
}

/// One step of the pipeline.
///
/// Stages hold no per-request state; a single instance serves concurrent
/// requests.
pub trait Stage: Send + Sync {
    /// Stage name used in logs and lifecycle events.
    fn name(&self) -> &str;

    /// Decide what happens to the request.
    fn handle(&self, ctx: &RequestContext, env: &mut StageEnv<'_>) -> StageOutcome;
}
