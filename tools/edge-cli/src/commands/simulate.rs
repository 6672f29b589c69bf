//! Run a request through the pipeline locally.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context as _, Result};
use cache_key_variations::{geo_resolver, pipeline, VariationConfig, PIPELINE_NAME};
use edge_cache::header_names;
use edge_core::{CookieJar, LifecycleObserver, LifecyclePhase, Method, RequestContext};
use edge_observability::{LogFormat, LogLevel, StructuredLogger};
use edge_pipeline::PipelineOutcome;
use serde::Serialize;

use super::SimulateArgs;
use crate::context::Context;
use crate::output::status_badge;

/// What happened to a simulated request.
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    /// Method and target as sent.
    pub request: String,
    /// Internal rewrite targets, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rewrites: Vec<String>,
    /// `response` or `pass-through`.
    pub outcome: &'static str,
    /// Request the host would serve on pass-through.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handed_off: Option<String>,
    /// Response status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Response headers in emission order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
    /// Response body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Default)]
struct RewriteLog(Mutex<Vec<String>>);

impl LifecycleObserver for RewriteLog {
    fn on_phase(&self, phase: LifecyclePhase, _elapsed: Duration) {
        if let LifecyclePhase::Rewritten { target, .. } = phase {
            if let Ok(mut targets) = self.0.lock() {
                targets.push(target);
            }
        }
    }
}

/// Run the simulate command.
pub fn run(args: SimulateArgs, ctx: &Context) -> Result<()> {
    let config = ctx.variation_config()?;
    let request = build_request(&args, &config)?;
    ctx.output.debug(&format!("Answer is {}", config.guess.answer));

    let min_level = if ctx.output.is_verbose() {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    let mut report = simulate(config, request, min_level);
    if !args.body {
        report.body = None;
    }

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    ctx.output.header(&report.request);
    for target in &report.rewrites {
        ctx.output.kv("rewritten to", target);
    }

    match report.status {
        Some(status) => {
            ctx.output.kv("status", &status_badge(status));
            ctx.output.info("Headers:");
            for (name, value) in &report.headers {
                ctx.output.kv(name, value);
            }
            if let Some(body) = &report.body {
                ctx.output.info("Body:");
                ctx.output.raw(body);
            }
        }
        None => {
            let handed_off = report.handed_off.as_deref().unwrap_or_default();
            ctx.output.info(&format!("No stage answered; the host serves {}", handed_off));
        }
    }

    Ok(())
}

/// Build the request described by the command line.
pub fn build_request(args: &SimulateArgs, config: &VariationConfig) -> Result<RequestContext> {
    let method = Method::from_name(&args.method)
        .with_context(|| format!("Unsupported method: {}", args.method))?;

    let mut request = RequestContext::parse(method, &args.target)
        .with_context(|| format!("Invalid request target: {}", args.target))?;

    for header in &args.headers {
        let (name, value) = split_pair(header, ':')
            .with_context(|| format!("Expected NAME:VALUE, got {:?}", header))?;
        request = request.with_header(name, value);
    }

    for cookie in &args.cookies {
        let (name, value) = split_pair(cookie, '=')
            .with_context(|| format!("Expected NAME=VALUE, got {:?}", cookie))?;
        request = request.with_header("Cookie", format!("{}={}", name, value));
    }

    if let Some(country) = &args.country {
        request = request.with_header(&config.geo.header, country.as_str());
    }

    if args.debug_cache {
        request = request.with_header(header_names::X_DEBUG_CACHE, "1");
    }

    Ok(request)
}

/// Run one request through the pipeline and describe the result.
pub fn simulate(
    config: VariationConfig,
    request: RequestContext,
    min_level: LogLevel,
) -> SimulationReport {
    let rewrite_log = Arc::new(RewriteLog::default());
    let geo = geo_resolver(&config);
    let pipeline = pipeline(config).with_observer(rewrite_log.clone());

    let logger = StructuredLogger::new(request.request_id.clone())
        .with_pipeline(PIPELINE_NAME)
        .with_path(request.path_and_query())
        .with_min_level(min_level)
        .with_format(LogFormat::Human);

    let description = format!("{} {}", request.method, request.path_and_query());
    let mut cookies = CookieJar::from_request(&request);
    let outcome = pipeline.run(request, &mut cookies, &geo, &logger);

    let rewrites = rewrite_log
        .0
        .lock()
        .map(|targets| targets.clone())
        .unwrap_or_default();

    match outcome {
        PipelineOutcome::Response(response) => SimulationReport {
            request: description,
            rewrites,
            outcome: "response",
            handed_off: None,
            status: Some(response.status.as_u16()),
            headers: response.headers,
            body: Some(response.body),
        },
        PipelineOutcome::PassThrough(final_request) => SimulationReport {
            request: description,
            rewrites,
            outcome: "pass-through",
            handed_off: Some(final_request.path_and_query()),
            status: None,
            headers: Vec::new(),
            body: None,
        },
    }
}

fn split_pair(raw: &str, separator: char) -> Option<(&str, &str)> {
    let (name, value) = raw.split_once(separator)?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(target: &str) -> SimulateArgs {
        SimulateArgs {
            target: target.to_string(),
            method: "GET".to_string(),
            cookies: Vec::new(),
            country: None,
            headers: Vec::new(),
            debug_cache: false,
            body: false,
        }
    }

    fn run_args(args: &SimulateArgs) -> SimulationReport {
        let config = VariationConfig::default();
        let request = build_request(args, &config).unwrap();
        simulate(config, request, LogLevel::Error)
    }

    // === Request Building Tests ===

    #[test]
    fn test_split_pair() {
        assert_eq!(split_pair("visited=true", '='), Some(("visited", "true")));
        assert_eq!(split_pair("X-Country: Peru", ':'), Some(("X-Country", "Peru")));
        assert_eq!(split_pair("a=b=c", '='), Some(("a", "b=c")));
        assert_eq!(split_pair("=true", '='), None);
        assert_eq!(split_pair("visited", '='), None);
    }

    #[test]
    fn test_build_request_headers() {
        let mut args = args("/");
        args.cookies = vec!["visited=true".to_string(), "theme=dark".to_string()];
        args.country = Some("Peru".to_string());
        args.debug_cache = true;

        let request = build_request(&args, &VariationConfig::default()).unwrap();

        assert_eq!(request.header("cookie"), Some("visited=true; theme=dark"));
        assert_eq!(request.header("x-country"), Some("Peru"));
        assert_eq!(request.header("x-debug-cache"), Some("1"));
    }

    #[test]
    fn test_build_request_rejects_bad_input() {
        let mut bad_method = args("/");
        bad_method.method = "BREW".to_string();
        assert!(build_request(&bad_method, &VariationConfig::default()).is_err());

        let mut bad_header = args("/");
        bad_header.headers = vec!["no-colon".to_string()];
        assert!(build_request(&bad_header, &VariationConfig::default()).is_err());
    }

    // === Simulation Tests ===

    #[test]
    fn test_simulate_submission() {
        let report = run_args(&args("/guess?value=5000"));

        assert_eq!(report.request, "GET /guess?value=5000");
        assert_eq!(report.rewrites, vec!["/?value=too_low".to_string()]);
        assert_eq!(report.outcome, "response");
        assert_eq!(report.status, Some(200));
        assert!(report
            .headers
            .iter()
            .any(|(name, value)| name == "Set-Cookie" && value == "visited=true; Path=/"));
        assert!(report.body.unwrap().contains("You guessed too low"));
    }

    #[test]
    fn test_simulate_repeat_visit() {
        let mut args = args("/");
        args.cookies = vec!["visited=true".to_string()];

        let report = run_args(&args);
        assert!(report.rewrites.is_empty());
        assert!(report.body.unwrap().contains("this is not the first time"));
    }

    #[test]
    fn test_simulate_pass_through() {
        let report = run_args(&args("/main.css"));

        assert_eq!(report.outcome, "pass-through");
        assert_eq!(report.handed_off.as_deref(), Some("/main.css"));
        assert!(report.headers.is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("status").is_none());
    }
}
