//! Section renderers for the cache-key variations page.

mod page;

pub use page::*;
