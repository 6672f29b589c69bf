//! Recording which request dimensions a response was built from.

use edge_core::{CookieStore, GeoResolver, RequestContext};

use crate::policy::{RouteCachePolicy, VaryRule};

/// Reads request dimensions and remembers every one it handed out.
///
/// Rendering code reads its inputs through the recorder and the declared
/// vary set is taken from it afterwards, so a response declares exactly
/// the dimensions its body was derived from.
#[derive(Debug, Clone, Default)]
pub struct VaryRecorder {
    rules: Vec<VaryRule>,
}

impl VaryRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a dimension directly.
    pub fn record(&mut self, rule: VaryRule) {
        if !self.rules.contains(&rule) {
            self.rules.push(rule);
        }
    }

    /// Read a query parameter.
    pub fn query<'a>(&mut self, ctx: &'a RequestContext, name: &str) -> Option<&'a str> {
        self.record(VaryRule::query(name));
        ctx.query_param(name)
    }

    /// Read a request header.
    pub fn header<'a>(&mut self, ctx: &'a RequestContext, name: &str) -> Option<&'a str> {
        self.record(VaryRule::header(name));
        ctx.header(name)
    }

    /// Read a cookie the client sent.
    pub fn cookie(&mut self, cookies: &dyn CookieStore, name: &str) -> Option<String> {
        self.record(VaryRule::cookie(name));
        cookies.get(name)
    }

    /// Resolve the request's country. The cache sees geolocation through
    /// `carrier_header`, so that header is the recorded dimension.
    pub fn geo(
        &mut self,
        resolver: &dyn GeoResolver,
        ctx: &RequestContext,
        carrier_header: &str,
    ) -> Option<String> {
        self.record(VaryRule::header(carrier_header));
        resolver.resolve(ctx)
    }

    /// Dimensions read so far, in first-read order.
    pub fn rules(&self) -> &[VaryRule] {
        &self.rules
    }

    /// Declare the recorded dimensions on a policy.
    pub fn apply_to(&self, policy: RouteCachePolicy) -> RouteCachePolicy {
        policy.vary_on_all(self.rules.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use edge_core::{CookieJar, Method, StaticGeoResolver};

    use super::*;

    #[test]
    fn test_records_each_read_once() {
        let ctx = RequestContext::parse(Method::Get, "/?value=correct").unwrap();
        let jar = CookieJar::new().with_cookie("visited", "true");
        let mut recorder = VaryRecorder::new();

        assert_eq!(recorder.query(&ctx, "value"), Some("correct"));
        assert_eq!(recorder.query(&ctx, "value"), Some("correct"));
        assert_eq!(recorder.cookie(&jar, "visited"), Some("true".to_string()));
        assert_eq!(
            recorder.geo(&StaticGeoResolver::country("Chile"), &ctx, "X-Country"),
            Some("Chile".to_string())
        );

        assert_eq!(
            recorder.rules(),
            &[
                VaryRule::query("value"),
                VaryRule::cookie("visited"),
                VaryRule::header("X-Country"),
            ]
        );
    }

    #[test]
    fn test_misses_are_still_recorded() {
        let ctx = RequestContext::parse(Method::Get, "/").unwrap();
        let mut recorder = VaryRecorder::new();

        assert_eq!(recorder.header(&ctx, "Accept-Language"), None);
        assert_eq!(recorder.rules(), &[VaryRule::header("accept-language")]);
    }

    #[test]
    fn test_apply_to_policy() {
        let mut recorder = VaryRecorder::new();
        recorder.record(VaryRule::cookie("visited"));
        recorder.record(VaryRule::query("value"));

        let policy = recorder.apply_to(RouteCachePolicy::edge_cached(Duration::from_secs(60)));
        assert_eq!(
            policy.variation_header().as_deref(),
            Some("cookie=visited,query=value")
        );
    }
}
