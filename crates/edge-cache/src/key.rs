//! Cache key composition.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use edge_core::{CookieJar, RequestContext};
use serde::{Deserialize, Serialize};

use crate::policy::VaryRule;

/// A cache key uniquely identifying a cached response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// The computed key string.
    key: String,
    /// Components that make up the key (for debugging).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    components: Vec<String>,
}

impl CacheKey {
    /// Create a cache key from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            components: Vec::new(),
        }
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Get the key components (for debugging).
    pub fn components(&self) -> &[String] {
        &self.components
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// The request as a cache sees it when computing a key.
#[derive(Debug, Clone, Default)]
pub struct CacheKeyContext {
    /// Route path.
    pub path: String,
    /// Query parameters.
    pub query_params: BTreeMap<String, String>,
    /// HTTP headers, keyed by lowercase name.
    pub headers: BTreeMap<String, String>,
    /// Cookies.
    pub cookies: BTreeMap<String, String>,
}

impl CacheKeyContext {
    /// Capture the key-relevant parts of a request.
    pub fn from_request(ctx: &RequestContext) -> Self {
        let jar = CookieJar::from_request(ctx);

        Self {
            path: ctx.path.clone(),
            query_params: ctx
                .query
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            headers: ctx
                .headers
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                .collect(),
            cookies: jar
                .incoming()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Component of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyComponent {
    /// The route path.
    Route,
    /// A specific query parameter.
    QueryParam(String),
    /// A specific header.
    Header(String),
    /// A specific cookie.
    Cookie(String),
}

/// Builder for composing cache keys.
///
/// Components whose value is absent still contribute to the key, so a
/// request without a cookie never shares a key with one that has it.
#[derive(Debug, Clone, Default)]
pub struct CacheKeyBuilder {
    components: Vec<KeyComponent>,
}

impl CacheKeyBuilder {
    /// Create a new cache key builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Include the route path in the key.
    pub fn route(mut self) -> Self {
        self.components.push(KeyComponent::Route);
        self
    }

    /// Include a query parameter.
    pub fn query_param(mut self, name: impl Into<String>) -> Self {
        self.components.push(KeyComponent::QueryParam(name.into()));
        self
    }

    /// Include a header value.
    pub fn header(mut self, name: impl Into<String>) -> Self {
        self.components.push(KeyComponent::Header(name.into()));
        self
    }

    /// Include a cookie value.
    pub fn cookie(mut self, name: impl Into<String>) -> Self {
        self.components.push(KeyComponent::Cookie(name.into()));
        self
    }

    /// Build from vary rules: the route plus one component per rule.
    pub fn from_vary_rules(rules: &[VaryRule]) -> Self {
        rules
            .iter()
            .fold(Self::new().route(), |builder, rule| match rule {
                VaryRule::Header(h) => builder.header(h),
                VaryRule::Cookie(c) => builder.cookie(c),
                VaryRule::QueryParam(q) => builder.query_param(q),
            })
    }

    /// Build the cache key from context.
    pub fn build(&self, ctx: &CacheKeyContext) -> CacheKey {
        let mut parts: Vec<(String, Option<String>)> = Vec::new();
        let mut component_descs = Vec::new();

        for component in &self.components {
            let (label, value) = match component {
                KeyComponent::Route => ("route".to_string(), Some(ctx.path.clone())),
                KeyComponent::QueryParam(name) => {
                    (format!("query:{}", name), ctx.query_params.get(name).cloned())
                }
                KeyComponent::Header(name) => (
                    format!("header:{}", name.to_ascii_lowercase()),
                    ctx.headers.get(&name.to_ascii_lowercase()).cloned(),
                ),
                KeyComponent::Cookie(name) => {
                    (format!("cookie:{}", name), ctx.cookies.get(name).cloned())
                }
            };

            component_descs.push(match &value {
                Some(v) => format!("{}={}", label, v),
                None => format!("{}=<absent>", label),
            });
            parts.push((label, value));
        }

        // JSON keeps labels and values unambiguous before hashing
        let encoded = serde_json::to_string(&parts).unwrap_or_default();
        let key = format!("{:x}", simple_hash(&encoded));

        CacheKey {
            key,
            components: component_descs,
        }
    }
}

// Simple non-cryptographic hash for cache keys
fn simple_hash(s: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use edge_core::Method;

    use super::*;

    fn dimensions() -> Vec<VaryRule> {
        vec![
            VaryRule::cookie("visited"),
            VaryRule::header("X-Country"),
            VaryRule::query("value"),
        ]
    }

    fn key_for(target: &str, headers: &[(&str, &str)]) -> CacheKey {
        let ctx = headers.iter().fold(
            RequestContext::parse(Method::Get, target).unwrap(),
            |ctx, (name, value)| ctx.with_header(name, *value),
        );
        CacheKeyBuilder::from_vary_rules(&dimensions()).build(&CacheKeyContext::from_request(&ctx))
    }

    // === Conflation Tests ===

    #[test]
    fn test_each_declared_dimension_splits_the_key() {
        let base = key_for("/?value=too_low", &[("X-Country", "ES")]);

        assert_ne!(base, key_for("/?value=too_high", &[("X-Country", "ES")]));
        assert_ne!(base, key_for("/?value=too_low", &[("X-Country", "FR")]));
        assert_ne!(
            base,
            key_for("/?value=too_low", &[("X-Country", "ES"), ("Cookie", "visited=true")])
        );
    }

    #[test]
    fn test_undeclared_dimensions_do_not_split_the_key() {
        let base = key_for("/?value=correct", &[("X-Country", "ES")]);

        assert_eq!(
            base,
            key_for(
                "/?value=correct&utm_source=mail",
                &[("X-Country", "ES"), ("User-Agent", "curl"), ("Cookie", "theme=dark")]
            )
        );
    }

    #[test]
    fn test_absent_and_empty_values_differ() {
        assert_ne!(key_for("/", &[]), key_for("/?value=", &[]));
    }

    #[test]
    fn test_key_is_deterministic() {
        let a = key_for("/?value=correct", &[("X-Country", "ES")]);
        let b = key_for("/?value=correct", &[("x-country", "ES")]);

        assert_eq!(a, b);
        assert_eq!(a.as_str(), b.to_string());
    }

    // === Component Tests ===

    #[test]
    fn test_components_describe_values() {
        let key = key_for("/?value=correct", &[]);

        assert_eq!(
            key.components(),
            &[
                "route=/".to_string(),
                "cookie:visited=<absent>".to_string(),
                "header:x-country=<absent>".to_string(),
                "query:value=correct".to_string(),
            ]
        );
    }
}
