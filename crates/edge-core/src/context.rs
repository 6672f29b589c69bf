//! Request context with typed parameters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use url::Url;

use crate::lifecycle::TimingContext;

/// Base used to resolve request targets that arrive without scheme and host.
pub const DEFAULT_ORIGIN: &str = "http://localhost";

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        let id = format!(
            "{:x}-{:x}-{:x}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
            next_sequence(),
            next_sequence()
        );
        Self(id)
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

fn next_sequence() -> u32 {
    // Spin components have no OS randomness by default
    static SEED: AtomicU32 = AtomicU32::new(12345);
    SEED.fetch_add(1, Ordering::Relaxed)
        .wrapping_mul(1103515245)
        .wrapping_add(12345)
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Query string parameters. The first occurrence of a key wins.
pub type QueryParams = HashMap<String, String>;

/// HTTP headers, keyed by lowercase name.
pub type Headers = HashMap<String, String>;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    /// Parse a method name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            _ => None,
        }
    }

    /// Canonical method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed request context passed through the pipeline stages.
///
/// A context is never mutated once a stage has seen it. Rewrites produce a
/// fresh context through [`RequestContext::rewritten`].
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique request identifier.
    pub request_id: RequestId,
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Request path.
    pub path: String,
    /// Query string parameters.
    pub query: QueryParams,
    /// HTTP headers.
    pub headers: Headers,
    /// Timing context for observability.
    pub timing: TimingContext,
}

impl RequestContext {
    /// Create a new request context for an absolute URL.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            request_id: RequestId::generate(),
            method,
            path: url.path().to_string(),
            query: query_params(&url),
            url,
            headers: HashMap::new(),
            timing: TimingContext::new(),
        }
    }

    /// Create a context from a request target that may be absolute
    /// (`https://site/guess?value=1`) or origin-form (`/guess?value=1`).
    pub fn parse(method: Method, target: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse(DEFAULT_ORIGIN)?;
        let url = Url::options().base_url(Some(&base)).parse(target)?;
        Ok(Self::new(method, url))
    }

    /// Add a header. Repeated headers are folded into one value.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        let name = name.to_ascii_lowercase();
        let separator = if name == "cookie" { "; " } else { ", " };
        self.headers
            .entry(name)
            .and_modify(|existing| {
                existing.push_str(separator);
                existing.push_str(&value);
            })
            .or_insert(value);
        self
    }

    /// Build the context an internal rewrite hands to the next stage.
    ///
    /// The request identity (id, method, headers, timing) is preserved;
    /// only the target changes. Nothing is sent back to the client.
    pub fn rewritten(&self, url: Url) -> Self {
        Self {
            request_id: self.request_id.clone(),
            method: self.method,
            path: url.path().to_string(),
            query: query_params(&url),
            url,
            headers: self.headers.clone(),
            timing: self.timing.clone(),
        }
    }

    /// Path plus query string, as the client would see it.
    pub fn path_and_query(&self) -> String {
        match self.url.query() {
            Some(q) => format!("{}?{}", self.url.path(), q),
            None => self.url.path().to_string(),
        }
    }

    /// Get a query parameter by name.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(|s| s.as_str())
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }
}

fn query_params(url: &Url) -> QueryParams {
    let mut params = QueryParams::new();
    for (key, value) in url.query_pairs() {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    params
}
