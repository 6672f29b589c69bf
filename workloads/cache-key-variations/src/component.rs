//! Spin HTTP entry point.

use anyhow::{Context, Result};
use spin_sdk::http::{Method as SpinMethod, Request, Response};
use spin_sdk::http_component;

use edge_sdk::edge_core::{CookieJar, Method, RequestContext};
use edge_sdk::edge_observability::StructuredLogger;
use edge_sdk::edge_pipeline::PipelineOutcome;

use crate::{geo_resolver, pipeline, VariationConfig};

/// Header the Spin HTTP trigger puts the absolute request URL in.
const FULL_URL_HEADER: &str = "spin-full-url";

/// Main HTTP handler.
#[http_component]
fn handle(req: Request) -> Result<Response> {
    let config = VariationConfig::embedded().context("Embedded variations.toml is invalid")?;

    let Some(method) = method(req.method()) else {
        return Ok(not_found());
    };

    let target = req
        .header(FULL_URL_HEADER)
        .and_then(|v| v.as_str())
        .or_else(|| req.path_and_query())
        .unwrap_or("/");

    let mut ctx = RequestContext::parse(method, target)
        .with_context(|| format!("Invalid request target: {}", target))?;
    for (name, value) in req.headers() {
        if let Some(value) = value.as_str() {
            ctx = ctx.with_header(name, value);
        }
    }

    let geo = geo_resolver(&config);
    let pipeline = pipeline(config);

    // JSON at info level
    let logger = StructuredLogger::new(ctx.request_id.clone())
        .with_pipeline(pipeline.name())
        .with_path(ctx.path_and_query());

    logger.info("Request started");

    let mut cookies = CookieJar::from_request(&ctx);
    let response = match pipeline.run(ctx, &mut cookies, &geo, &logger) {
        PipelineOutcome::Response(response) => response,
        PipelineOutcome::PassThrough(_) => return Ok(not_found()),
    };

    let mut builder = Response::builder();
    builder.status(response.status.as_u16());
    for (name, value) in &response.headers {
        builder.header(name.as_str(), value.as_str());
    }

    logger.info("Request complete");
    Ok(builder.body(response.body).build())
}

fn method(method: &SpinMethod) -> Option<Method> {
    match method {
        SpinMethod::Get => Some(Method::Get),
        SpinMethod::Head => Some(Method::Head),
        SpinMethod::Post => Some(Method::Post),
        SpinMethod::Put => Some(Method::Put),
        SpinMethod::Delete => Some(Method::Delete),
        SpinMethod::Patch => Some(Method::Patch),
        SpinMethod::Options => Some(Method::Options),
        _ => None,
    }
}

/// Assets are served by a separate file-server component.
fn not_found() -> Response {
    Response::builder()
        .status(404)
        .header("content-type", "text/plain")
        .body("Not Found")
        .build()
}
