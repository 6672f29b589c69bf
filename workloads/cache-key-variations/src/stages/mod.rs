//! The two pipeline stages.

mod content;
mod rewrite;

pub use content::*;
pub use rewrite::*;
