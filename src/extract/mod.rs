//! Result normalization
//!
//! Turns engine output into the stable element list, Markdown and
//! statistics returned to clients.

pub mod markdown;
pub mod model;
mod normalizer;

pub use model::{
    BoundingBox, ElementType, ExtractedElement, PlainTextStatistics, ResultEnvelope, Statistics,
    Status, StructuredStatistics,
};
pub use normalizer::{normalize, DoclingExtractor, Escalation, FALLBACK_MODEL, PRIMARY_MODEL};
