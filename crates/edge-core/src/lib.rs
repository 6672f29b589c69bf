//! Core abstractions for the edge rewrite pipeline.
//!
//! This crate provides the fundamental types and traits:
//! - `RequestContext` - Typed request (URL, query, headers)
//! - `EdgeResponse` - Response produced at the edge
//! - `CookieStore` / `CookieJar` - Client-scoped cookie access
//! - `GeoResolver` - Geolocation lookup capability
//! - `RoutePattern` - Path patterns stages are mounted on
//! - `TimingContext` - Request lifecycle timing

mod config;
mod context;
mod cookies;
mod geo;
mod lifecycle;
mod response;

pub use config::*;
pub use context::*;
pub use cookies::*;
pub use geo::*;
pub use lifecycle::*;
pub use response::*;
