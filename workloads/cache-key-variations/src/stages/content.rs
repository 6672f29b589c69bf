//! Canonical page rendering with its cache-key declaration.

use chrono::{DateTime, Utc};
use edge_sdk::edge_cache::{
    header_names, should_include_debug_headers, CacheExplainHeaders, CacheHeadersBuilder,
    CacheKeyBuilder, CacheKeyContext, RouteCachePolicy, VaryRecorder,
};
use edge_sdk::edge_core::{CookieStore, EdgeResponse, GeoResolver, RequestContext};
use edge_sdk::edge_pipeline::{Stage, StageEnv, StageOutcome};

use crate::config::VariationConfig;
use crate::data::GuessBucket;
use crate::sections::{render_page, PageContent};

/// Source of the "generated at" timestamp.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Renders the canonical page.
///
/// Every request input the body depends on is read through a
/// [`VaryRecorder`], and the variation header is built from what it
/// recorded. The visit cookie is read before it is written, and the write
/// only affects the outgoing `Set-Cookie`.
pub struct ContentStage {
    config: VariationConfig,
    policy: RouteCachePolicy,
    clock: Box<dyn Clock>,
}

impl ContentStage {
    /// Create the stage with the wall clock.
    pub fn new(config: VariationConfig) -> Self {
        let policy = config.cache.policy();
        Self {
            config,
            policy,
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Render the page, or `None` for any path but the canonical one.
    pub fn render(
        &self,
        ctx: &RequestContext,
        cookies: &mut dyn CookieStore,
        geo: &dyn GeoResolver,
    ) -> Option<EdgeResponse> {
        let guess_config = &self.config.guess;
        if ctx.path != guess_config.canonical_path {
            return None;
        }

        let mut reads = VaryRecorder::new();

        let cookie = &self.config.cookie;
        let first_visit =
            reads.cookie(&*cookies, &cookie.name).as_deref() != Some(cookie.value.as_str());

        let country = reads
            .geo(geo, ctx, &self.config.geo.header)
            .unwrap_or_else(|| self.config.geo.fallback.clone());

        let guess = GuessBucket::from_tag(reads.query(ctx, &guess_config.param).unwrap_or(""));

        cookies.set(&cookie.name, &cookie.value);

        let body = render_page(&PageContent {
            guess,
            first_visit,
            country: &country,
            generated_at: self.clock.now(),
            submission_path: &guess_config.submission_path,
            param: &guess_config.param,
        });

        let policy = reads.apply_to(self.policy.clone());
        let debug = should_include_debug_headers(ctx);
        let mut headers = CacheHeadersBuilder::new().from_policy(&policy);
        if debug {
            let key = CacheKeyBuilder::from_vary_rules(&policy.vary)
                .build(&CacheKeyContext::from_request(ctx));
            headers = headers
                .explain(CacheExplainHeaders::from_policy(&policy, &key))
                .include_debug(true);
        }

        let mut response = EdgeResponse::builder()
            .header("Content-Type", "text/html")
            .headers(headers.build());
        if debug {
            response = response.header(header_names::X_REQUEST_ID, ctx.request_id.to_string());
        }

        Some(response.body(body).build())
    }
}

impl Stage for ContentStage {
    fn name(&self) -> &str {
        "content"
    }

    fn handle(&self, ctx: &RequestContext, env: &mut StageEnv<'_>) -> StageOutcome {
        match self.render(ctx, &mut *env.cookies, env.geo) {
            Some(response) => {
                env.logger
                    .debug_builder("Rendered page")
                    .field(
                        "vary",
                        response.header(header_names::NETLIFY_VARY).unwrap_or_default(),
                    )
                    .emit();
                StageOutcome::Respond(response)
            }
            None => StageOutcome::PassThrough,
        }
    }
}

impl std::fmt::Debug for ContentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStage")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use edge_sdk::edge_core::{CookieJar, Method, StaticGeoResolver};

    use super::*;

    fn stage() -> ContentStage {
        ContentStage::new(VariationConfig::default())
            .with_clock(FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()))
    }

    fn request(target: &str) -> RequestContext {
        RequestContext::parse(Method::Get, target).unwrap()
    }

    fn render(target: &str, jar: &mut CookieJar, country: Option<&str>) -> Option<EdgeResponse> {
        let geo = StaticGeoResolver(country.map(str::to_string));
        stage().render(&request(target), jar, &geo)
    }

    // === Path Tests ===

    #[test]
    fn test_non_canonical_paths_pass_through() {
        let mut jar = CookieJar::new();

        assert!(render("/style.css", &mut jar, None).is_none());
        assert!(render("/guess?value=1", &mut jar, None).is_none());
        assert!(jar.outgoing().is_empty());
    }

    // === Header Tests ===

    #[test]
    fn test_contract_headers() {
        let response = render("/?value=correct", &mut CookieJar::new(), Some("Chile")).unwrap();

        assert_eq!(response.status.as_u16(), 200);
        assert_eq!(response.content_type(), Some("text/html"));
        assert_eq!(
            response.header("Cdn-Cache-Control"),
            Some("public, s-maxage=31536000, must-revalidate")
        );
        assert_eq!(
            response.header("Cache-Control"),
            Some("public, max-age=0, must-revalidate")
        );
        assert_eq!(
            response.header("Netlify-Vary"),
            Some("cookie=visited,header=X-Country,query=value")
        );
        assert!(!response.has_header("X-Cache-Key"));
        assert!(!response.has_header("X-Request-ID"));
    }

    #[test]
    fn test_vary_declared_on_every_branch() {
        let visited = || CookieJar::new().with_cookie("visited", "true");
        let cases = [
            ("/", CookieJar::new(), None),
            ("/?value=too_low", visited(), Some("Peru")),
            ("/?value=bogus", CookieJar::new(), Some("Peru")),
            ("/?value=correct&other=1", visited(), None),
        ];

        for (target, mut jar, country) in cases {
            let response = render(target, &mut jar, country).unwrap();
            assert_eq!(
                response.header("Netlify-Vary"),
                Some("cookie=visited,header=X-Country,query=value"),
                "{}",
                target
            );
        }
    }

    #[test]
    fn test_debug_headers_on_request() {
        let ctx = request("/?value=too_high")
            .with_header("X-Debug-Cache", "1")
            .with_header("X-Country", "Peru");
        let response = stage()
            .render(&ctx, &mut CookieJar::new(), &StaticGeoResolver::country("Peru"))
            .unwrap();

        assert!(response.has_header("X-Cache-Key"));
        assert_eq!(response.header("X-Cache-TTL"), Some("31536000"));
        assert_eq!(response.header("X-Cache-Scope"), Some("public"));
        assert_eq!(
            response.header("X-Cache-Vary"),
            Some("cookie:visited, header:X-Country, query:value")
        );
        assert_eq!(response.header("X-Request-ID"), Some(ctx.request_id.0.as_str()));

        assert!(!response.has_header("Cdn-Cache-Control"));
        assert_eq!(response.header("Cache-Control"), Some("no-store"));
        assert_eq!(
            response.header("Netlify-Vary"),
            Some("cookie=visited,header=X-Country,query=value")
        );
    }

    // === Cookie Tests ===

    #[test]
    fn test_first_visit_sets_cookie() {
        let mut jar = CookieJar::new();
        let response = render("/", &mut jar, None).unwrap();

        assert!(response.body.contains("this is the first time"));
        assert_eq!(jar.set_cookie_headers(), vec!["visited=true; Path=/".to_string()]);
    }

    #[test]
    fn test_repeat_visit_still_sets_cookie() {
        let mut jar = CookieJar::new().with_cookie("visited", "true");
        let response = render("/", &mut jar, None).unwrap();

        assert!(response.body.contains("this is not the first time"));
        assert_eq!(jar.set_cookie_headers(), vec!["visited=true; Path=/".to_string()]);
    }

    #[test]
    fn test_other_cookie_value_counts_as_first_visit() {
        let mut jar = CookieJar::new().with_cookie("visited", "false");
        let response = render("/", &mut jar, None).unwrap();

        assert!(response.body.contains("this is the first time"));
    }

    // === Body Tests ===

    #[test]
    fn test_body_fragments() {
        let body = |target: &str| render(target, &mut CookieJar::new(), None).unwrap().body;

        assert!(body("/?value=too_low").contains("You guessed too low"));
        assert!(body("/?value=too_high").contains("You guessed too high"));
        assert!(body("/?value=correct").contains("You guessed correctly!"));
        assert!(!body("/?value=").contains("You guessed"));
        assert!(!body("/?value=11034").contains("You guessed"));
    }

    #[test]
    fn test_country_fallback() {
        let body = render("/", &mut CookieJar::new(), None).unwrap().body;
        assert!(body.contains("from unknown"));

        let body = render("/", &mut CookieJar::new(), Some("Japan")).unwrap().body;
        assert!(body.contains("from Japan"));
    }

    #[test]
    fn test_same_inputs_same_body() {
        let first = render("/?value=correct", &mut CookieJar::new(), Some("Chile")).unwrap();
        let second = render("/?value=correct", &mut CookieJar::new(), Some("Chile")).unwrap();

        assert_eq!(first.body, second.body);
        assert!(first.body.contains("Fri, 01 Mar 2024 12:00:00 GMT"));
    }
}
