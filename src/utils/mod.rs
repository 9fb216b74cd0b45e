//! Support modules shared across the pipeline:
//! - Source location tracking
//! - Diagnostic types

pub mod errors;
pub mod location;

// Re-exports
pub use errors::*;
pub use location::{SourceLocation, SourceMap, Span};
