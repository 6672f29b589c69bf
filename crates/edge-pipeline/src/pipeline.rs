//! Ordered stage chain with internal rewrites.

use std::sync::Arc;

use edge_core::{
    CookieStore, EdgeResponse, GeoResolver, LifecycleObserver, LifecyclePhase, RequestContext,
    RouteConfig, TimingContext,
};
use edge_observability::StructuredLogger;

use crate::stage::{Stage, StageEnv, StageOutcome};

/// Header name used for queued cookies.
const SET_COOKIE: &str = "Set-Cookie";

/// Final result of running a request through the pipeline.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// A stage answered.
    Response(EdgeResponse),
    /// No stage answered; the host serves this (possibly rewritten) request.
    PassThrough(RequestContext),
}

impl PipelineOutcome {
    /// The response, if a stage answered.
    pub fn response(&self) -> Option<&EdgeResponse> {
        match self {
            Self::Response(response) => Some(response),
            Self::PassThrough(_) => None,
        }
    }

    /// Check whether the request fell through every stage.
    pub fn is_pass_through(&self) -> bool {
        matches!(self, Self::PassThrough(_))
    }
}

struct MountedStage {
    route: RouteConfig,
    stage: Box<dyn Stage>,
}

/// An ordered chain of stages.
///
/// Stages run in registration order and only when their route matches the
/// current request. A rewrite replaces the current request for the stages
/// that follow; earlier stages are never re-entered, so every request
/// terminates after at most one pass over the chain.
pub struct Pipeline {
    name: String,
    stages: Vec<MountedStage>,
    observer: Option<Arc<dyn LifecycleObserver>>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            observer: None,
        }
    }

    /// Mount a stage at a route.
    pub fn stage(mut self, route: RouteConfig, stage: impl Stage + 'static) -> Self {
        self.stages.push(MountedStage {
            route,
            stage: Box::new(stage),
        });
        self
    }

    /// Receive lifecycle events for every request.
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Pipeline name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &RouteConfig> {
        self.stages.iter().map(|m| &m.route)
    }

    /// Run a request through the stages.
    pub fn run(
        &self,
        ctx: RequestContext,
        cookies: &mut dyn CookieStore,
        geo: &dyn GeoResolver,
        logger: &StructuredLogger,
    ) -> PipelineOutcome {
        let timing = ctx.timing.clone();
        let mut current = ctx;
        self.notify(LifecyclePhase::Start, &timing);

        for mounted in &self.stages {
            if !mounted.route.matches(current.method, &current.path) {
                continue;
            }

            let name = mounted.stage.name().to_string();
            let stage_logger = logger.for_stage(name.as_str());
            let outcome = {
                let mut env = StageEnv {
                    cookies: &mut *cookies,
                    geo,
                    logger: stage_logger.clone(),
                };
                mounted.stage.handle(&current, &mut env)
            };

            match outcome {
                StageOutcome::PassThrough => {
                    stage_logger.debug("Passed through");
                    self.notify(LifecyclePhase::PassedThrough(name), &timing);
                }
                StageOutcome::Rewrite(url) => {
                    if url.origin() != current.url.origin() {
                        stage_logger
                            .warn_builder("Refusing cross-origin rewrite")
                            .field("target", url.as_str())
                            .emit();
                        self.notify(LifecyclePhase::PassedThrough(name), &timing);
                        continue;
                    }

                    let next = current.rewritten(url);
                    stage_logger
                        .info_builder("Rewrote request")
                        .field("from", current.path_and_query())
                        .field("to", next.path_and_query())
                        .emit();
                    self.notify(
                        LifecyclePhase::Rewritten {
                            stage: name,
                            target: next.path_and_query(),
                        },
                        &timing,
                    );
                    current = next;
                }
                StageOutcome::Respond(mut response) => {
                    for value in cookies.set_cookie_headers() {
                        response.headers.push((SET_COOKIE.to_string(), value));
                    }

                    stage_logger
                        .debug_builder("Responded")
                        .field_i64("status", i64::from(response.status.as_u16()))
                        .emit();
                    self.notify(LifecyclePhase::Responded(name), &timing);
                    self.notify(LifecyclePhase::Completion, &timing);
                    return PipelineOutcome::Response(response);
                }
            }
        }

        logger.debug("No stage answered; handing back to host");
        self.notify(LifecyclePhase::Completion, &timing);
        PipelineOutcome::PassThrough(current)
    }

    fn notify(&self, phase: LifecyclePhase, timing: &TimingContext) {
        if let Some(observer) = &self.observer {
            observer.on_phase(phase, timing.elapsed());
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("routes", &self.routes().collect::<Vec<_>>())
            .finish()
    }
}
