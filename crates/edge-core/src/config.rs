//! Route configuration for mounting stages.

use serde::{Deserialize, Serialize};

use crate::context::Method;

/// Configuration for a single route.
///
/// Patterns are either exact (`/guess`) or a prefix ending in `/*`
/// (`/assets/*`). `/*` matches every path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Route pattern (e.g., "/*").
    pub pattern: String,
    /// Name of the stage mounted here.
    pub handler: String,
    /// HTTP methods this route accepts. Empty accepts every method.
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string(), "HEAD".to_string()]
}

impl RouteConfig {
    /// Create a new route configuration.
    pub fn new(pattern: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            handler: handler.into(),
            methods: default_methods(),
        }
    }

    /// Set allowed HTTP methods.
    pub fn with_methods(mut self, methods: Vec<&str>) -> Self {
        self.methods = methods.into_iter().map(String::from).collect();
        self
    }

    /// Check whether the pattern matches a request path.
    pub fn matches_path(&self, path: &str) -> bool {
        match self.pattern.strip_suffix("/*") {
            Some(prefix) => {
                prefix.is_empty()
                    || path == prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            None => self.pattern == path,
        }
    }

    /// Check whether the route accepts a request.
    pub fn matches(&self, method: Method, path: &str) -> bool {
        let method_ok = self.methods.is_empty()
            || self
                .methods
                .iter()
                .any(|m| m.eq_ignore_ascii_case(method.as_str()));

        method_ok && self.matches_path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_all_matches_everything() {
        let route = RouteConfig::new("/*", "rewrite");

        assert!(route.matches_path("/"));
        assert!(route.matches_path("/guess"));
        assert!(route.matches_path("/main.css"));
    }

    #[test]
    fn test_prefix_pattern() {
        let route = RouteConfig::new("/assets/*", "static");

        assert!(route.matches_path("/assets"));
        assert!(route.matches_path("/assets/app.js"));
        assert!(!route.matches_path("/assetsx"));
        assert!(!route.matches_path("/"));
    }

    #[test]
    fn test_exact_pattern() {
        let route = RouteConfig::new("/guess", "rewrite");

        assert!(route.matches_path("/guess"));
        assert!(!route.matches_path("/guess/again"));
    }

    #[test]
    fn test_method_filter() {
        let route = RouteConfig::new("/*", "content");
        assert!(route.matches(Method::Get, "/"));
        assert!(route.matches(Method::Head, "/"));
        assert!(!route.matches(Method::Post, "/"));

        let any = RouteConfig::new("/*", "content").with_methods(vec![]);
        assert!(any.matches(Method::Post, "/"));
    }
}
