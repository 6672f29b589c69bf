//! Submission rewrite: numeric guess to bucket tag.

use edge_sdk::edge_core::RequestContext;
use edge_sdk::edge_pipeline::{Stage, StageEnv, StageOutcome};
use url::Url;

use crate::config::GuessConfig;
use crate::data::GuessBucket;

/// What the rewrite stage decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteResult {
    /// Not a submission.
    PassThrough,
    /// Internal redirect to the canonical page.
    Redirect(Url),
}

/// Rewrites guess submissions onto the canonical page with the guess
/// replaced by its bucket tag.
#[derive(Debug, Clone)]
pub struct RewriteStage {
    config: GuessConfig,
}

impl RewriteStage {
    /// Create the stage.
    pub fn new(config: GuessConfig) -> Self {
        Self { config }
    }

    /// Bucket for the guess carried by a request.
    pub fn bucket(&self, ctx: &RequestContext) -> GuessBucket {
        GuessBucket::classify(ctx.query_param(&self.config.param), self.config.answer)
    }

    /// Decide whether and where to rewrite.
    pub fn rewrite(&self, ctx: &RequestContext) -> RewriteResult {
        if ctx.path != self.config.submission_path {
            return RewriteResult::PassThrough;
        }

        let bucket = self.bucket(ctx);

        // Same origin; every other query parameter is dropped
        let mut target = ctx.url.clone();
        target.set_path(&self.config.canonical_path);
        target.set_fragment(None);
        target
            .query_pairs_mut()
            .clear()
            .append_pair(&self.config.param, bucket.tag());

        RewriteResult::Redirect(target)
    }
}

impl Stage for RewriteStage {
    fn name(&self) -> &str {
        "rewrite"
    }

    fn handle(&self, ctx: &RequestContext, env: &mut StageEnv<'_>) -> StageOutcome {
        match self.rewrite(ctx) {
            RewriteResult::PassThrough => StageOutcome::PassThrough,
            RewriteResult::Redirect(target) => {
                env.logger
                    .debug_builder("Bucketed guess")
                    .field("bucket", self.bucket(ctx).tag())
                    .emit();
                StageOutcome::Rewrite(target)
            }
        }
    }
}
