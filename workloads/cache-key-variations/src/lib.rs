//! Cache-key variations - Reference workload.
//!
//! Demonstrates cache-key normalization at the edge with:
//! - A rewrite stage that buckets a numeric guess into four tags
//! - A content stage whose page varies on a cookie, a geo header and the tag
//! - A variation header built from the inputs the page actually read
//!
//! ```ignore
//! let config = VariationConfig::embedded()?;
//! let geo = geo_resolver(&config);
//! let pipeline = pipeline(config);
//!
//! let mut cookies = CookieJar::from_request(&ctx);
//! let outcome = pipeline.run(ctx, &mut cookies, &geo, &logger);
//! ```

mod config;
mod data;
mod sections;
mod stages;

#[cfg(target_arch = "wasm32")]
mod component;

use edge_sdk::edge_core::{HeaderGeoResolver, RouteConfig};
use edge_sdk::edge_pipeline::Pipeline;

pub use config::*;
pub use data::*;
pub use sections::*;
pub use stages::*;

/// Pipeline name used in logs.
pub const PIPELINE_NAME: &str = "cache-key-variations";

/// Both stages, mounted on every path.
pub fn pipeline(config: VariationConfig) -> Pipeline {
    pipeline_with_clock(config, SystemClock)
}

/// Like [`pipeline`], with the page timestamp taken from `clock`.
pub fn pipeline_with_clock(config: VariationConfig, clock: impl Clock + 'static) -> Pipeline {
    Pipeline::new(PIPELINE_NAME)
        .stage(
            RouteConfig::new("/*", "rewrite"),
            RewriteStage::new(config.guess.clone()),
        )
        .stage(
            RouteConfig::new("/*", "content"),
            ContentStage::new(config).with_clock(clock),
        )
}

/// Geolocation read from the configured carrier header.
pub fn geo_resolver(config: &VariationConfig) -> HeaderGeoResolver {
    HeaderGeoResolver::new(config.geo.header.clone())
}
