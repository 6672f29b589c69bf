//! Route-level cache policies and cache-key dimensions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cache scope determining who can cache the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheScope {
    /// Cacheable by CDN and browser (shared cache).
    Public,
    /// No caching.
    None,
}

impl CacheScope {
    /// Get the Cache-Control directive for this scope.
    pub fn cache_control_directive(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::None => "no-store",
        }
    }

    /// Check if this scope allows any caching.
    pub fn allows_caching(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Where the value of a cache-key dimension comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionSource {
    Cookie,
    Header,
    Query,
}

impl DimensionSource {
    /// Key used in the variation declaration header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cookie => "cookie",
            Self::Header => "header",
            Self::Query => "query",
        }
    }
}

/// A named request dimension the cache key varies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum VaryRule {
    /// Vary by cookie value.
    Cookie(String),
    /// Vary by HTTP header.
    Header(String),
    /// Vary by query parameter.
    QueryParam(String),
}

impl VaryRule {
    /// Create a cookie vary rule.
    pub fn cookie(name: impl Into<String>) -> Self {
        Self::Cookie(name.into())
    }

    /// Create a header vary rule.
    pub fn header(name: impl Into<String>) -> Self {
        Self::Header(name.into())
    }

    /// Create a query param vary rule.
    pub fn query(name: impl Into<String>) -> Self {
        Self::QueryParam(name.into())
    }

    /// Source of the dimension.
    pub fn source(&self) -> DimensionSource {
        match self {
            Self::Cookie(_) => DimensionSource::Cookie,
            Self::Header(_) => DimensionSource::Header,
            Self::QueryParam(_) => DimensionSource::Query,
        }
    }

    /// Name of the cookie, header or query parameter.
    pub fn name(&self) -> &str {
        match self {
            Self::Cookie(n) | Self::Header(n) | Self::QueryParam(n) => n,
        }
    }
}

// Header names compare case-insensitively; cookie and query names are exact.
impl PartialEq for VaryRule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Header(a), Self::Header(b)) => a.eq_ignore_ascii_case(b),
            (Self::Cookie(a), Self::Cookie(b)) => a == b,
            (Self::QueryParam(a), Self::QueryParam(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for VaryRule {}

impl std::fmt::Display for VaryRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source().as_str(), self.name())
    }
}

/// One Cache-Control style directive set, for a single cache tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDirective {
    /// Cache scope.
    pub scope: CacheScope,
    /// `max-age`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<Duration>,
    /// `s-maxage`, for shared caches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_max_age: Option<Duration>,
    /// `must-revalidate` once stale.
    pub must_revalidate: bool,
}

impl CacheDirective {
    fn with_scope(scope: CacheScope) -> Self {
        Self {
            scope,
            max_age: None,
            shared_max_age: None,
            must_revalidate: false,
        }
    }

    /// A public directive with no lifetimes set yet.
    pub fn public() -> Self {
        Self::with_scope(CacheScope::Public)
    }

    /// The `no-store` directive.
    pub fn no_store() -> Self {
        Self::with_scope(CacheScope::None)
    }

    /// Set `max-age`.
    pub fn with_max_age(mut self, ttl: Duration) -> Self {
        self.max_age = Some(ttl);
        self
    }

    /// Set `s-maxage`.
    pub fn with_shared_max_age(mut self, ttl: Duration) -> Self {
        self.shared_max_age = Some(ttl);
        self
    }

    /// Require revalidation once stale.
    pub fn must_revalidate(mut self) -> Self {
        self.must_revalidate = true;
        self
    }

    /// Effective freshness lifetime for the tier (`s-maxage` wins).
    pub fn ttl(&self) -> Option<Duration> {
        self.shared_max_age.or(self.max_age)
    }

    /// Render the header value.
    pub fn header_value(&self) -> String {
        if !self.scope.allows_caching() {
            return "no-store".to_string();
        }

        let mut parts = vec![self.scope.cache_control_directive().to_string()];

        if let Some(max_age) = self.max_age {
            parts.push(format!("max-age={}", max_age.as_secs()));
        }

        if let Some(s_maxage) = self.shared_max_age {
            parts.push(format!("s-maxage={}", s_maxage.as_secs()));
        }

        if self.must_revalidate {
            parts.push("must-revalidate".to_string());
        }

        parts.join(", ")
    }
}

/// Route-level cache policy.
///
/// Carries one directive for the end-user agent (`Cache-Control`), an
/// optional one for the edge/shared tier (`CDN-Cache-Control`) and the
/// dimensions the cache key varies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteCachePolicy {
    /// Directive for the end-user agent.
    pub browser: CacheDirective,
    /// Directive for shared/edge caches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdn: Option<CacheDirective>,
    /// Vary rules for the cache key.
    pub vary: Vec<VaryRule>,
}

impl RouteCachePolicy {
    /// Long-lived at the edge, always revalidated by the client.
    pub fn edge_cached(cdn_ttl: Duration) -> Self {
        Self {
            browser: CacheDirective::public()
                .with_max_age(Duration::ZERO)
                .must_revalidate(),
            cdn: Some(
                CacheDirective::public()
                    .with_shared_max_age(cdn_ttl)
                    .must_revalidate(),
            ),
            vary: Vec::new(),
        }
    }

    /// Replace the end-user agent directive.
    pub fn with_browser(mut self, directive: CacheDirective) -> Self {
        self.browser = directive;
        self
    }

    /// Add a vary rule. Rules already present are ignored.
    pub fn vary_on(mut self, rule: VaryRule) -> Self {
        if !self.vary.contains(&rule) {
            self.vary.push(rule);
        }
        self
    }

    /// Add multiple vary rules.
    pub fn vary_on_all(self, rules: impl IntoIterator<Item = VaryRule>) -> Self {
        rules.into_iter().fold(self, Self::vary_on)
    }

    /// Effective TTL at the outermost tier that may cache.
    pub fn ttl(&self) -> Option<Duration> {
        self.cdn
            .as_ref()
            .and_then(CacheDirective::ttl)
            .or_else(|| self.browser.ttl())
    }

    /// Generate the `Cache-Control` header value.
    pub fn cache_control_header(&self) -> String {
        self.browser.header_value()
    }

    /// Generate the `CDN-Cache-Control` header value.
    pub fn cdn_cache_control_header(&self) -> Option<String> {
        self.cdn.as_ref().map(CacheDirective::header_value)
    }

    /// Generate the cache-key variation declaration.
    ///
    /// Rules are grouped by source in order of first appearance and names
    /// within a group are joined with `|`:
    /// `cookie=visited,header=X-Country,query=value`.
    pub fn variation_header(&self) -> Option<String> {
        if self.vary.is_empty() {
            return None;
        }

        let mut groups: Vec<(DimensionSource, Vec<&str>)> = Vec::new();
        for rule in &self.vary {
            match groups.iter_mut().find(|(source, _)| *source == rule.source()) {
                Some((_, names)) => names.push(rule.name()),
                None => groups.push((rule.source(), vec![rule.name()])),
            }
        }

        let value = groups
            .iter()
            .map(|(source, names)| format!("{}={}", source.as_str(), names.join("|")))
            .collect::<Vec<_>>()
            .join(",");

        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEAR: Duration = Duration::from_secs(31_536_000);

    // === Directive Tests ===

    #[test]
    fn test_edge_cached_directives() {
        let policy = RouteCachePolicy::edge_cached(YEAR);

        assert_eq!(
            policy.cdn_cache_control_header().as_deref(),
            Some("public, s-maxage=31536000, must-revalidate")
        );
        assert_eq!(
            policy.cache_control_header(),
            "public, max-age=0, must-revalidate"
        );
        assert_eq!(policy.ttl(), Some(YEAR));
    }

    #[test]
    fn test_client_directive_replaced() {
        let policy = RouteCachePolicy::edge_cached(YEAR)
            .with_browser(CacheDirective::public().with_max_age(Duration::from_secs(60)));

        assert_eq!(policy.cache_control_header(), "public, max-age=60");
        assert_eq!(policy.ttl(), Some(YEAR));
    }

    #[test]
    fn test_no_store_ignores_lifetimes() {
        let directive = CacheDirective::no_store()
            .with_max_age(Duration::from_secs(60))
            .must_revalidate();

        assert_eq!(directive.header_value(), "no-store");
        assert!(!directive.scope.allows_caching());
    }

    #[test]
    fn test_no_vary_rules_no_declaration() {
        assert_eq!(RouteCachePolicy::edge_cached(YEAR).variation_header(), None);
    }

    // === Vary Tests ===

    #[test]
    fn test_variation_header_reference_value() {
        let policy = RouteCachePolicy::edge_cached(YEAR)
            .vary_on(VaryRule::cookie("visited"))
            .vary_on(VaryRule::header("X-Country"))
            .vary_on(VaryRule::query("value"));

        assert_eq!(
            policy.variation_header().as_deref(),
            Some("cookie=visited,header=X-Country,query=value")
        );
    }

    #[test]
    fn test_variation_header_groups_by_source() {
        let policy = RouteCachePolicy::edge_cached(YEAR).vary_on_all(vec![
            VaryRule::query("page"),
            VaryRule::header("Accept-Language"),
            VaryRule::query("sort"),
        ]);

        assert_eq!(
            policy.variation_header().as_deref(),
            Some("query=page|sort,header=Accept-Language")
        );
    }

    #[test]
    fn test_duplicate_rules_not_declared_twice() {
        let policy = RouteCachePolicy::edge_cached(YEAR)
            .vary_on(VaryRule::header("X-Country"))
            .vary_on(VaryRule::header("x-country"))
            .vary_on(VaryRule::cookie("visited"))
            .vary_on(VaryRule::cookie("visited"));

        assert_eq!(policy.vary.len(), 2);
    }

    #[test]
    fn test_rule_equality() {
        assert_eq!(VaryRule::header("X-Country"), VaryRule::header("x-country"));
        assert_ne!(VaryRule::cookie("Visited"), VaryRule::cookie("visited"));
        assert_ne!(VaryRule::cookie("value"), VaryRule::query("value"));
    }

    #[test]
    fn test_rule_display() {
        assert_eq!(VaryRule::cookie("visited").to_string(), "cookie:visited");
        assert_eq!(VaryRule::header("X-Country").to_string(), "header:X-Country");
        assert_eq!(VaryRule::query("value").to_string(), "query:value");
    }

    #[test]
    fn test_rule_serde_shape() {
        let json = serde_json::to_string(&VaryRule::cookie("visited")).unwrap();
        assert_eq!(json, r#"{"type":"Cookie","value":"visited"}"#);
    }
}
