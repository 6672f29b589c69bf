//! Cache-key policy declaration for the edge rewrite pipeline.
//!
//! This crate does not store anything. It decides and declares:
//! - `RouteCachePolicy` - Per-tier directives plus the dimensions the key varies on
//! - `VaryRule` - One cache-key dimension (cookie, header or query parameter)
//! - `VaryRecorder` - Reads dimensions and remembers which ones were read
//! - `CacheKeyBuilder` - Cache key composition from declared dimensions
//! - `CacheHeadersBuilder` / `CacheExplainHeaders` - Response headers
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use edge_cache::{CacheHeadersBuilder, RouteCachePolicy, VaryRule};
//!
//! // Long-lived at the edge, always revalidated by the browser
//! let policy = RouteCachePolicy::edge_cached(Duration::from_secs(31_536_000))
//!     .vary_on(VaryRule::cookie("visited"))
//!     .vary_on(VaryRule::header("X-Country"))
//!     .vary_on(VaryRule::query("value"));
//!
//! let headers = CacheHeadersBuilder::new().from_policy(&policy).build();
//! ```

mod headers;
mod key;
mod policy;
mod recorder;

pub use headers::*;
pub use key::*;
pub use policy::*;
pub use recorder::*;
