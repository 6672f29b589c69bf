//! Geolocation lookup capability.

use crate::context::RequestContext;

/// Resolves the country a request comes from.
///
/// Resolution is a fast lookup with no retries. `None` means unresolved and
/// callers substitute their own fallback.
pub trait GeoResolver {
    /// Resolve a display name for the request's country.
    fn resolve(&self, ctx: &RequestContext) -> Option<String>;
}

/// Resolver reading the request header the edge platform writes the
/// visitor's country into.
///
/// The edge cache keys on that same header, so a country can only reach a
/// response through a dimension the cache can see.
#[derive(Debug, Clone)]
pub struct HeaderGeoResolver {
    header: String,
}

impl HeaderGeoResolver {
    /// Create a resolver for the given carrier header.
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }
}

impl GeoResolver for HeaderGeoResolver {
    fn resolve(&self, ctx: &RequestContext) -> Option<String> {
        ctx.header(&self.header)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Resolver returning a fixed answer.
#[derive(Debug, Clone, Default)]
pub struct StaticGeoResolver(pub Option<String>);

impl StaticGeoResolver {
    /// Always resolve to `country`.
    pub fn country(country: impl Into<String>) -> Self {
        Self(Some(country.into()))
    }

    /// Never resolve.
    pub fn unresolved() -> Self {
        Self(None)
    }
}

impl GeoResolver for StaticGeoResolver {
    fn resolve(&self, _ctx: &RequestContext) -> Option<String> {
        self.0.clone()
    }
}
