//! Cache declaration and debugging headers.

use std::time::Duration;

use edge_core::RequestContext;
use serde::{Deserialize, Serialize};

use crate::key::CacheKey;
use crate::policy::{CacheDirective, RouteCachePolicy};

/// Header names used for cache declaration and debugging.
pub mod header_names {
    /// Directive for the end-user agent.
    pub const CACHE_CONTROL: &str = "Cache-Control";
    /// Directive for shared/edge caches.
    pub const CDN_CACHE_CONTROL: &str = "Cdn-Cache-Control";
    /// Cache-key variation declaration understood by the edge cache.
    pub const NETLIFY_VARY: &str = "Netlify-Vary";
    /// Request header that turns on debug headers.
    pub const X_DEBUG_CACHE: &str = "X-Debug-Cache";
    /// Cache key computed for the response.
    pub const X_CACHE_KEY: &str = "X-Cache-Key";
    /// Cache TTL at the outermost tier.
    pub const X_CACHE_TTL: &str = "X-Cache-TTL";
    /// Cache scope (public, private, none).
    pub const X_CACHE_SCOPE: &str = "X-Cache-Scope";
    /// Vary rules applied.
    pub const X_CACHE_VARY: &str = "X-Cache-Vary";
    /// Request ID for tracing.
    pub const X_REQUEST_ID: &str = "X-Request-ID";
}

/// Cache explain headers for debugging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheExplainHeaders {
    /// Cache key used.
    pub cache_key: Option<String>,
    /// TTL in seconds.
    pub ttl_secs: Option<u64>,
    /// Cache scope.
    pub scope: Option<String>,
    /// Vary rules applied.
    pub vary: Vec<String>,
}

impl CacheExplainHeaders {
    /// Create new explain headers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cache key.
    pub fn with_key(mut self, key: &CacheKey) -> Self {
        self.cache_key = Some(key.as_str().to_string());
        self
    }

    /// Set TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = Some(ttl.as_secs());
        self
    }

    /// Set scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Set vary rules.
    pub fn with_vary(mut self, vary: Vec<String>) -> Self {
        self.vary = vary;
        self
    }

    /// Build from route cache policy.
    pub fn from_policy(policy: &RouteCachePolicy, key: &CacheKey) -> Self {
        let scope = policy
            .cdn
            .as_ref()
            .map(|d| d.scope)
            .unwrap_or(policy.browser.scope);

        let explain = Self::new()
            .with_key(key)
            .with_scope(scope.cache_control_directive())
            .with_vary(policy.vary.iter().map(ToString::to_string).collect());

        match policy.ttl() {
            Some(ttl) => explain.with_ttl(ttl),
            None => explain,
        }
    }

    /// Convert to HTTP headers.
    pub fn to_headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::new();

        if let Some(key) = &self.cache_key {
            headers.push((header_names::X_CACHE_KEY.to_string(), key.clone()));
        }

        if let Some(ttl) = self.ttl_secs {
            headers.push((header_names::X_CACHE_TTL.to_string(), ttl.to_string()));
        }

        if let Some(scope) = &self.scope {
            headers.push((header_names::X_CACHE_SCOPE.to_string(), scope.clone()));
        }

        if !self.vary.is_empty() {
            headers.push((header_names::X_CACHE_VARY.to_string(), self.vary.join(", ")));
        }

        headers
    }
}

/// Builder for cache response headers.
#[derive(Debug, Default)]
pub struct CacheHeadersBuilder {
    cache_control: Option<String>,
    cdn_cache_control: Option<String>,
    variation: Option<String>,
    explain: Option<CacheExplainHeaders>,
    include_debug: bool,
}

impl CacheHeadersBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both tier directives and the variation declaration from a policy.
    pub fn from_policy(mut self, policy: &RouteCachePolicy) -> Self {
        self.cache_control = Some(policy.cache_control_header());
        self.cdn_cache_control = policy.cdn_cache_control_header();
        self.variation = policy.variation_header();
        self
    }

    /// Set debug explain headers.
    pub fn explain(mut self, headers: CacheExplainHeaders) -> Self {
        self.explain = Some(headers);
        self
    }

    /// Enable debug headers in output.
    pub fn include_debug(mut self, enabled: bool) -> Self {
        self.include_debug = enabled;
        self
    }

    /// Build the headers.
    ///
    /// Debug headers describe one request, so a response carrying them is
    /// `no-store` at both tiers and never lands in a shared cache slot.
    pub fn build(self) -> Vec<(String, String)> {
        let explain = if self.include_debug { self.explain } else { None };
        let (cdn_cache_control, cache_control) = match explain {
            Some(_) => (None, Some(CacheDirective::no_store().header_value())),
            None => (self.cdn_cache_control, self.cache_control),
        };

        let mut headers = Vec::new();

        if let Some(cdn) = cdn_cache_control {
            headers.push((header_names::CDN_CACHE_CONTROL.to_string(), cdn));
        }

        if let Some(cc) = cache_control {
            headers.push((header_names::CACHE_CONTROL.to_string(), cc));
        }

        if let Some(variation) = self.variation {
            headers.push((header_names::NETLIFY_VARY.to_string(), variation));
        }

        if let Some(explain) = explain {
            headers.extend(explain.to_headers());
        }

        headers
    }
}

/// Utility to check if debug headers should be included.
pub fn should_include_debug_headers(ctx: &RequestContext) -> bool {
    ctx.header(header_names::X_DEBUG_CACHE) == Some("1")
}

#[cfg(test)]
mod tests {
    use edge_core::Method;

    use super::*;
    use crate::policy::VaryRule;

    fn demo_policy() -> RouteCachePolicy {
        RouteCachePolicy::edge_cached(Duration::from_secs(31_536_000))
            .vary_on(VaryRule::cookie("visited"))
            .vary_on(VaryRule::header("X-Country"))
            .vary_on(VaryRule::query("value"))
    }

    #[test]
    fn test_contract_headers_from_policy() {
        let headers = CacheHeadersBuilder::new().from_policy(&demo_policy()).build();

        assert_eq!(
            headers,
            vec![
                (
                    "Cdn-Cache-Control".to_string(),
                    "public, s-maxage=31536000, must-revalidate".to_string()
                ),
                (
                    "Cache-Control".to_string(),
                    "public, max-age=0, must-revalidate".to_string()
                ),
                (
                    "Netlify-Vary".to_string(),
                    "cookie=visited,header=X-Country,query=value".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_debug_headers_only_when_enabled() {
        let policy = demo_policy();
        let key = CacheKey::new("abc");
        let explain = CacheExplainHeaders::from_policy(&policy, &key);

        let without = CacheHeadersBuilder::new()
            .from_policy(&policy)
            .explain(explain.clone())
            .build();
        assert!(without.iter().all(|(k, _)| k != header_names::X_CACHE_KEY));

        let with = CacheHeadersBuilder::new()
            .from_policy(&policy)
            .explain(explain)
            .include_debug(true)
            .build();
        assert!(with.contains(&("X-Cache-Key".to_string(), "abc".to_string())));
        assert!(with.contains(&("X-Cache-TTL".to_string(), "31536000".to_string())));
        assert!(with.contains(&("X-Cache-Scope".to_string(), "public".to_string())));
        assert!(with.contains(&(
            "X-Cache-Vary".to_string(),
            "cookie:visited, header:X-Country, query:value".to_string()
        )));
    }

    #[test]
    fn test_debug_response_is_not_stored() {
        let policy = demo_policy();
        let explain = CacheExplainHeaders::from_policy(&policy, &CacheKey::new("abc"));

        let headers = CacheHeadersBuilder::new()
            .from_policy(&policy)
            .explain(explain)
            .include_debug(true)
            .build();

        assert!(headers.iter().all(|(k, _)| k != header_names::CDN_CACHE_CONTROL));
        assert!(headers.contains(&("Cache-Control".to_string(), "no-store".to_string())));
        assert!(headers.contains(&(
            "Netlify-Vary".to_string(),
            "cookie=visited,header=X-Country,query=value".to_string()
        )));
    }

    #[test]
    fn test_should_include_debug_headers() {
        let plain = RequestContext::parse(Method::Get, "/").unwrap();
        assert!(!should_include_debug_headers(&plain));

        let debug = plain.clone().with_header("x-debug-cache", "1");
        assert!(should_include_debug_headers(&debug));

        let off = plain.with_header("X-Debug-Cache", "0");
        assert!(!should_include_debug_headers(&off));
    }
}
