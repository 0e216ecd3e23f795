//! Utility functions shared across the crate

mod markdown;

pub use markdown::{preview, strip_markdown};
