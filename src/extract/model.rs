//! Normalized extraction result types
//!
//! These are the records returned to clients regardless of which engine
//! produced them. They are built once per request and never mutated after.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Semantic category of an extracted element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Title,
    Header,
    Paragraph,
    Table,
    Figure,
    List,
    Caption,
}

impl ElementType {
    /// Map an upstream engine label to an element type.
    ///
    /// The lookup is case-insensitive. Labels outside the table become
    /// paragraphs.
    pub fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "title" => ElementType::Title,
            "heading" => ElementType::Header,
            "paragraph" | "text" => ElementType::Paragraph,
            "table" => ElementType::Table,
            "figure" => ElementType::Figure,
            "list" => ElementType::List,
            "caption" => ElementType::Caption,
            _ => ElementType::Paragraph,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Title => "title",
            ElementType::Header => "header",
            ElementType::Paragraph => "paragraph",
            ElementType::Table => "table",
            ElementType::Figure => "figure",
            ElementType::List => "list",
            ElementType::Caption => "caption",
        }
    }
}

/// Location of an element on a page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    /// Page number (1-indexed)
    pub page: u32,
}

/// One semantic unit of document content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedElement {
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub content: String,
    pub bbox: Option<BoundingBox>,
    /// Page number (1-indexed)
    pub page: u32,
    /// Engine confidence, when the engine reports one
    pub confidence: Option<f64>,
}

/// Per-type counts for a structured (primary engine) extraction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredStatistics {
    pub total_elements: usize,
    pub titles: usize,
    pub headers: usize,
    pub paragraphs: usize,
    pub tables: usize,
    pub figures: usize,
    pub lists: usize,
    pub total_pages: u32,
}

impl StructuredStatistics {
    /// Tally element types in one pass.
    ///
    /// `total_pages` is the highest page seen, or 1 for an empty list.
    pub fn tally(elements: &[ExtractedElement]) -> Self {
        let mut stats = Self {
            total_elements: elements.len(),
            total_pages: elements.iter().map(|e| e.page).max().unwrap_or(1),
            ..Self::default()
        };

        for element in elements {
            match element.element_type {
                ElementType::Title => stats.titles += 1,
                ElementType::Header => stats.headers += 1,
                ElementType::Paragraph => stats.paragraphs += 1,
                ElementType::Table => stats.tables += 1,
                ElementType::Figure => stats.figures += 1,
                ElementType::List => stats.lists += 1,
                ElementType::Caption => {}
            }
        }

        stats
    }
}

/// Counts for a plain-text (fallback engine) extraction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainTextStatistics {
    pub total_elements: usize,
    /// Page count reported by the PDF reader, independent of element count
    pub total_pages: u32,
    pub paragraphs: usize,
}

/// Statistics block of an envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Statistics {
    Structured(StructuredStatistics),
    PlainText(PlainTextStatistics),
}

impl Statistics {
    pub fn total_elements(&self) -> usize {
        match self {
            Statistics::Structured(s) => s.total_elements,
            Statistics::PlainText(s) => s.total_elements,
        }
    }

    pub fn total_pages(&self) -> u32 {
        match self {
            Statistics::Structured(s) => s.total_pages,
            Statistics::PlainText(s) => s.total_pages,
        }
    }
}

/// Outcome flag of an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// The uniform response of one extraction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub status: Status,
    /// Engine actually used
    pub model: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<ExtractedElement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
    pub processing_time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultEnvelope {
    /// Build a success envelope
    pub fn success(
        model: impl Into<String>,
        filename: impl Into<String>,
        markdown: String,
        elements: Vec<ExtractedElement>,
        statistics: Statistics,
        processing_time_ms: f64,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            status: Status::Success,
            model: model.into(),
            filename: filename.into(),
            markdown: Some(markdown),
            elements: Some(elements),
            statistics: Some(statistics),
            processing_time_ms: round_millis(processing_time_ms),
            metadata: Some(metadata),
            error: None,
        }
    }

    /// Build an error envelope. It carries no content fields.
    pub fn failure(
        model: impl Into<String>,
        filename: impl Into<String>,
        error: impl Into<String>,
        processing_time_ms: f64,
    ) -> Self {
        Self {
            status: Status::Error,
            model: model.into(),
            filename: filename.into(),
            markdown: None,
            elements: None,
            statistics: None,
            processing_time_ms: round_millis(processing_time_ms),
            metadata: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Round a millisecond duration to two decimals
pub fn round_millis(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}
