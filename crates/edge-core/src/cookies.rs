//! Client-scoped cookie access.

use std::collections::HashMap;

use crate::context::RequestContext;

/// Narrow cookie capability handed to pipeline stages.
///
/// `get` observes the cookies the client sent with this request. `set`
/// queues a cookie for the response and does not affect later `get` calls
/// in the same request.
pub trait CookieStore {
    /// Read a cookie the client sent.
    fn get(&self, name: &str) -> Option<String>;

    /// Queue a cookie to be set on the response.
    fn set(&mut self, name: &str, value: &str);

    /// `Set-Cookie` header values queued during this request.
    fn set_cookie_headers(&self) -> Vec<String>;
}

/// A cookie queued for the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Cookie path attribute.
    pub path: String,
}

impl SetCookie {
    /// Serialize as a `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        format!("{}={}; Path={}", self.name, self.value, self.path)
    }
}

/// Cookie jar backed by the request `Cookie` header.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    incoming: HashMap<String, String>,
    outgoing: Vec<SetCookie>,
}

impl CookieJar {
    /// Create an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `Cookie` header value (`a=1; b=2`). Quoted values
    /// (`a="1"`) are unquoted.
    pub fn from_header(header: Option<&str>) -> Self {
        let mut incoming = HashMap::new();

        if let Some(header) = header {
            for pair in header.split(';') {
                let mut parts = pair.trim().splitn(2, '=');
                let name = parts.next().unwrap_or("").trim();
                if name.is_empty() {
                    continue;
                }
                let value = unquote(parts.next().unwrap_or("").trim());
                incoming
                    .entry(name.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }

        Self {
            incoming,
            outgoing: Vec::new(),
        }
    }

    /// Build a jar from the request's `Cookie` header.
    pub fn from_request(ctx: &RequestContext) -> Self {
        Self::from_header(ctx.header("cookie"))
    }

    /// Add an incoming cookie (as if sent by the client).
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.incoming.insert(name.into(), value.into());
        self
    }

    /// Cookies the client sent.
    pub fn incoming(&self) -> impl Iterator<Item = (&str, &str)> {
        self.incoming.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Cookies queued for the response.
    pub fn outgoing(&self) -> &[SetCookie] {
        &self.outgoing
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

impl CookieStore for CookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.incoming.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str) {
        let cookie = SetCookie {
            name: name.to_string(),
            value: value.to_string(),
            path: "/".to_string(),
        };

        match self.outgoing.iter_mut().find(|c| c.name == name) {
            Some(existing) => *existing = cookie,
            None => self.outgoing.push(cookie),
        }
    }

    fn set_cookie_headers(&self) -> Vec<String> {
        self.outgoing.iter().map(SetCookie::to_header_value).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Method;

    // === Parsing Tests ===

    #[test]
    fn test_parse_cookie_header() {
        let jar = CookieJar::from_header(Some("visited=true; theme=dark"));

        assert_eq!(jar.get("visited"), Some("true".to_string()));
        assert_eq!(jar.get("theme"), Some("dark".to_string()));
        assert_eq!(jar.get("missing"), None);
    }

    #[test]
    fn test_parse_tolerates_junk() {
        let jar = CookieJar::from_header(Some(";; =x; flag; a=b=c"));

        assert_eq!(jar.get("flag"), Some(String::new()));
        assert_eq!(jar.get("a"), Some("b=c".to_string()));
        assert_eq!(jar.get(""), None);
    }

    #[test]
    fn test_quoted_value_is_unquoted() {
        let jar = CookieJar::from_header(Some(r#"visited="true"; empty=""; half="x"#));

        assert_eq!(jar.get("visited"), Some("true".to_string()));
        assert_eq!(jar.get("empty"), Some(String::new()));
        assert_eq!(jar.get("half"), Some("\"x".to_string()));
    }

    #[test]
    fn test_no_header_is_empty() {
        let jar = CookieJar::from_header(None);
        assert_eq!(jar.get("visited"), None);
        assert!(jar.set_cookie_headers().is_empty());
    }

    #[test]
    fn test_from_request() {
        let ctx = RequestContext::parse(Method::Get, "/")
            .unwrap()
            .with_header("Cookie", "visited=true");

        assert_eq!(CookieJar::from_request(&ctx).get("visited"), Some("true".to_string()));
    }

    // === Write Tests ===

    #[test]
    fn test_set_does_not_change_reads() {
        let mut jar = CookieJar::new();
        jar.set("visited", "true");

        assert_eq!(jar.get("visited"), None);
        assert_eq!(jar.set_cookie_headers(), vec!["visited=true; Path=/".to_string()]);
    }

    #[test]
    fn test_set_same_name_replaces() {
        let mut jar = CookieJar::new();
        jar.set("visited", "false");
        jar.set("visited", "true");

        assert_eq!(jar.outgoing().len(), 1);
        assert_eq!(jar.outgoing()[0].value, "true");
    }
}
