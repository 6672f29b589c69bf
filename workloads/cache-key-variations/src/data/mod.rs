//! Data models for the cache-key variations demo.

mod guess;

pub use guess::*;
