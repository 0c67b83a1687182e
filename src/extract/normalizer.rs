//! Extraction pipeline: primary engine, plain-text fallback, error envelope
//!
//! [`DoclingExtractor::extract`] never fails. The primary attempt either
//! produces an envelope or an [`Escalation`]; an escalation triggers exactly
//! one fallback attempt, and a failed fallback becomes an error envelope.

use super::markdown;
use super::model::{
    BoundingBox, ElementType, ExtractedElement, PlainTextStatistics, ResultEnvelope, Statistics,
    StructuredStatistics,
};
use crate::engine::{DocItem, DoclingDocument, DocumentConverter, PdfTextReader};
use crate::error::{Error, Result};
use serde_json::{json, Map, Value};
use std::fmt;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;

/// Engine name reported when the primary engine is used, or when every
/// engine failed
pub const PRIMARY_MODEL: &str = "docling";

/// Engine name reported for plain-text fallback results
pub const FALLBACK_MODEL: &str = "pypdf_fallback";

const FALLBACK_NOTE: &str = "Fallback extraction used (Docling unavailable)";

/// Why the primary engine was abandoned for the fallback
#[derive(Debug)]
pub enum Escalation {
    /// No primary engine was detected at start-up
    EngineUnavailable,
    /// The primary engine, or parsing its output, failed
    EngineFailed(Error),
}

impl fmt::Display for Escalation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Escalation::EngineUnavailable => f.write_str("primary engine unavailable"),
            Escalation::EngineFailed(e) => write!(f, "primary engine failed: {}", e),
        }
    }
}

impl From<Error> for Escalation {
    fn from(e: Error) -> Self {
        Escalation::EngineFailed(e)
    }
}

/// Normalizes engine output into [`ResultEnvelope`]s
pub struct DoclingExtractor {
    primary: Option<Box<dyn DocumentConverter>>,
}

impl DoclingExtractor {
    /// Create an extractor; `None` means only the fallback path is available
    pub fn new(primary: Option<Box<dyn DocumentConverter>>) -> Self {
        match &primary {
            Some(engine) => tracing::info!(engine = engine.name(), "Initializing extractor"),
            None => tracing::info!("Initializing extractor without primary engine"),
        }
        Self { primary }
    }

    pub fn with_engine<C: DocumentConverter + 'static>(engine: C) -> Self {
        Self::new(Some(Box::new(engine)))
    }

    pub fn fallback_only() -> Self {
        Self::new(None)
    }

    /// Whether the primary engine was detected
    pub fn primary_available(&self) -> bool {
        self.primary.is_some()
    }

    /// Extract content from `payload`. Always returns an envelope.
    pub fn extract(&self, payload: &[u8], filename: &str) -> ResultEnvelope {
        let started = Instant::now();

        let escalation = match self.try_primary(payload, filename, started) {
            Ok(envelope) => return envelope,
            Err(escalation) => escalation,
        };

        tracing::warn!(filename, reason = %escalation, "Falling back to plain-text extraction");

        match self.try_fallback(payload, filename, &escalation, started) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(filename, error = %e, "Fallback extraction also failed");
                ResultEnvelope::failure(PRIMARY_MODEL, filename, e.to_string(), elapsed_ms(started))
            }
        }
    }

    /// Run the primary engine on a staged copy of `payload`
    pub fn try_primary(
        &self,
        payload: &[u8],
        filename: &str,
        started: Instant,
    ) -> std::result::Result<ResultEnvelope, Escalation> {
        let engine = self.primary.as_deref().ok_or(Escalation::EngineUnavailable)?;

        tracing::info!(filename, engine = engine.name(), "Starting extraction");

        let document = convert_staged(engine, payload, filename)?;
        let elements = normalize(&document);
        let markdown = markdown::render(&elements);
        let stats = StructuredStatistics::tally(&elements);

        tracing::info!(filename, elements = elements.len(), "Parsed engine output");

        let mut metadata = Map::new();
        metadata.insert("total_pages".to_string(), json!(stats.total_pages));
        metadata.insert("total_elements".to_string(), json!(elements.len()));

        Ok(ResultEnvelope::success(
            engine.name(),
            filename,
            markdown,
            elements,
            Statistics::Structured(stats),
            elapsed_ms(started),
            metadata,
        ))
    }

    /// Extract one paragraph per non-blank page with the plain-text reader
    pub fn try_fallback(
        &self,
        payload: &[u8],
        filename: &str,
        escalation: &Escalation,
        started: Instant,
    ) -> Result<ResultEnvelope> {
        tracing::info!(filename, "Using plain-text fallback extraction");

        let reader = PdfTextReader::open_bytes(payload)?;

        let mut elements = Vec::new();
        let mut sections = Vec::new();
        for (page, text) in reader.page_texts()? {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }
            elements.push(ExtractedElement {
                element_type: ElementType::Paragraph,
                content: trimmed.to_string(),
                bbox: None,
                page,
                confidence: None,
            });
            sections.push(markdown::render_page_section(page, &text));
        }

        let stats = PlainTextStatistics {
            total_elements: elements.len(),
            total_pages: reader.page_count(),
            paragraphs: elements.len(),
        };

        let mut metadata = Map::new();
        metadata.insert("note".to_string(), Value::from(FALLBACK_NOTE));
        metadata.insert(
            "fallback_reason".to_string(),
            Value::from(escalation.to_string()),
        );

        Ok(ResultEnvelope::success(
            FALLBACK_MODEL,
            filename,
            sections.join("\n"),
            elements,
            Statistics::PlainText(stats),
            elapsed_ms(started),
            metadata,
        ))
    }
}

/// Stage `payload` in a temporary file and convert it.
///
/// The file is removed when `staged` drops, whichever way this returns.
fn convert_staged(
    engine: &dyn DocumentConverter,
    payload: &[u8],
    filename: &str,
) -> Result<DoclingDocument> {
    let mut staged = tempfile::Builder::new()
        .prefix("extract-")
        .suffix(&staging_suffix(filename))
        .tempfile()?;
    staged.write_all(payload)?;
    staged.flush()?;

    let path = staged.path();
    panic::catch_unwind(AssertUnwindSafe(|| engine.convert(path))).unwrap_or_else(|_| {
        Err(Error::EngineFailed {
            reason: "engine panicked during conversion".to_string(),
        })
    })
}

/// Temp-file suffix taken from the upload's extension, `.pdf` by default
fn staging_suffix(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| ".pdf".to_string())
}

/// Map a Docling document to normalized elements, in reading order.
///
/// Items without a page inherit the page of the previous item; the first
/// page is 1.
pub fn normalize(document: &DoclingDocument) -> Vec<ExtractedElement> {
    let mut current_page = 1;
    document
        .iterate_items()
        .into_iter()
        .map(|item| {
            if let Some(page) = item.page_no() {
                current_page = page;
            }
            to_element(item, current_page)
        })
        .collect()
}

fn to_element(item: DocItem<'_>, page: u32) -> ExtractedElement {
    let content = match item.text() {
        Some(text) => text.trim().to_string(),
        None => item.to_string().trim().to_string(),
    };

    let bbox = item.bbox().map(|b| BoundingBox {
        x0: b.l,
        y0: b.t,
        x1: b.r,
        y1: b.b,
        page,
    });

    ExtractedElement {
        element_type: ElementType::from_label(item.label()),
        content,
        bbox,
        page,
        confidence: None,
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::{build_pdf, DOCLING_SAMPLE};
    use crate::extract::model::Status;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Converter that returns a fixed JSON document and records what it saw
    #[derive(Clone, Default)]
    struct StubConverter {
        json: Option<&'static str>,
        seen: Arc<Mutex<Option<(PathBuf, Vec<u8>)>>>,
    }

    impl StubConverter {
        fn returning(json: &'static str) -> Self {
            Self {
                json: Some(json),
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self::default()
        }

        fn seen(&self) -> (PathBuf, Vec<u8>) {
            self.seen.lock().unwrap().clone().expect("converter not called")
        }
    }

    impl DocumentConverter for StubConverter {
        fn name(&self) -> &str {
            "docling"
        }

        fn convert(&self, path: &Path) -> Result<DoclingDocument> {
            let bytes = std::fs::read(path)?;
            *self.seen.lock().unwrap() = Some((path.to_path_buf(), bytes));
            match self.json {
                Some(json) => DoclingDocument::from_json(json.as_bytes()),
                None => Err(Error::EngineFailed {
                    reason: "stub failure".to_string(),
                }),
            }
        }
    }

    struct PanickingConverter;

    impl DocumentConverter for PanickingConverter {
        fn name(&self) -> &str {
            "docling"
        }

        fn convert(&self, _path: &Path) -> Result<DoclingDocument> {
            panic!("engine bug")
        }
    }

    #[test]
    fn test_primary_success_envelope() {
        let stub = StubConverter::returning(DOCLING_SAMPLE);
        let extractor = DoclingExtractor::with_engine(stub.clone());

        let envelope = extractor.extract(b"%PDF-fake", "report.pdf");

        assert_eq!(envelope.status, Status::Success);
        assert_eq!(envelope.model, "docling");
        assert_eq!(envelope.filename, "report.pdf");
        assert!(envelope.error.is_none());

        let elements = envelope.elements.as_ref().unwrap();
        let summary: Vec<(ElementType, &str, u32)> = elements
            .iter()
            .map(|e| (e.element_type, e.content.as_str(), e.page))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ElementType::Title, "Annual Report", 1),
                (ElementType::Paragraph, "first", 1),
                (ElementType::Paragraph, "second", 1),
                (ElementType::Table, "| a | b |\n|---|---|\n| 1 | 2 |", 2),
                (ElementType::Paragraph, "#/pictures/0", 2),
                (ElementType::Caption, "Figure 1", 3),
            ]
        );
        assert!(elements.iter().all(|e| e.confidence.is_none()));
        assert_eq!(
            elements[0].bbox,
            Some(BoundingBox {
                x0: 10.0,
                y0: 20.0,
                x1: 300.0,
                y1: 40.0,
                page: 1
            })
        );
        assert_eq!(elements[3].bbox.unwrap().page, 2);
        assert!(elements[2].bbox.is_none());

        assert_eq!(
            envelope.statistics,
            Some(Statistics::Structured(StructuredStatistics {
                total_elements: 6,
                titles: 1,
                headers: 0,
                paragraphs: 3,
                tables: 1,
                figures: 0,
                lists: 0,
                total_pages: 3,
            }))
        );

        let metadata = envelope.metadata.as_ref().unwrap();
        assert_eq!(metadata["total_pages"], 3);
        assert_eq!(metadata["total_elements"], 6);
    }

    #[test]
    fn test_markdown_matches_element_order() {
        let extractor = DoclingExtractor::with_engine(StubConverter::returning(DOCLING_SAMPLE));
        let envelope = extractor.extract(b"%PDF-fake", "report.pdf");

        let elements = envelope.elements.unwrap();
        assert_eq!(envelope.markdown.unwrap(), markdown::render(&elements));
    }

    #[test]
    fn test_staged_file_holds_payload_and_is_removed() {
        let stub = StubConverter::returning(DOCLING_SAMPLE);
        let extractor = DoclingExtractor::with_engine(stub.clone());

        extractor.extract(b"%PDF-payload-bytes", "Scan.PDF");

        let (path, bytes) = stub.seen();
        assert_eq!(bytes, b"%PDF-payload-bytes");
        assert_eq!(path.extension().unwrap(), "pdf");
        assert!(!path.exists(), "staged file should be deleted");
    }

    #[test]
    fn test_staged_file_removed_when_engine_fails() {
        let stub = StubConverter::failing();
        let extractor = DoclingExtractor::with_engine(stub.clone());

        extractor.extract(&build_pdf(&["text"]), "a.pdf");

        let (path, _) = stub.seen();
        assert!(!path.exists());
    }

    #[test]
    fn test_empty_document_reports_one_page() {
        let extractor = DoclingExtractor::with_engine(StubConverter::returning(
            r#"{"body": {"children": []}}"#,
        ));
        let envelope = extractor.extract(b"%PDF-fake", "empty.pdf");

        assert_eq!(envelope.status, Status::Success);
        assert_eq!(envelope.elements, Some(vec![]));
        assert_eq!(envelope.markdown.as_deref(), Some(""));
        assert_eq!(envelope.statistics.unwrap().total_pages(), 1);
    }

    #[test]
    fn test_label_case_and_unknown_labels() {
        let json = r##"{
            "body": {"children": [{"$ref": "#/texts/0"}, {"$ref": "#/texts/1"}]},
            "texts": [
                {"self_ref": "#/texts/0", "label": "Heading", "text": "Methods"},
                {"self_ref": "#/texts/1", "label": "footnote", "text": "see appendix"}
            ]
        }"##;
        let extractor = DoclingExtractor::with_engine(StubConverter::returning(json));
        let elements = extractor.extract(b"%PDF-fake", "a.pdf").elements.unwrap();

        assert_eq!(elements[0].element_type, ElementType::Header);
        assert_eq!(elements[1].element_type, ElementType::Paragraph);
    }

    #[test]
    fn test_unpaged_items_inherit_current_page() {
        let json = r##"{
            "body": {"children": [{"$ref": "#/texts/0"}, {"$ref": "#/texts/1"}]},
            "texts": [
                {"self_ref": "#/texts/0", "label": "text", "text": "a", "prov": [{"page_no": 4}]},
                {"self_ref": "#/texts/1", "label": "text", "text": "b"}
            ]
        }"##;
        let document = DoclingDocument::from_json(json.as_bytes()).unwrap();
        let pages: Vec<u32> = normalize(&document).iter().map(|e| e.page).collect();
        assert_eq!(pages, vec![4, 4]);
    }

    #[test]
    fn test_engine_failure_uses_fallback() {
        let extractor = DoclingExtractor::with_engine(StubConverter::failing());
        let payload = build_pdf(&["First page", "", "Third page"]);

        let envelope = extractor.extract(&payload, "doc.pdf");

        assert_eq!(envelope.status, Status::Success);
        assert_eq!(envelope.model, FALLBACK_MODEL);
        let elements = envelope.elements.as_ref().unwrap();
        assert_eq!(elements.len(), 2);
        assert!(elements
            .iter()
            .all(|e| e.element_type == ElementType::Paragraph && e.bbox.is_none()));
        assert_eq!(elements[0].page, 1);
        assert_eq!(elements[1].page, 3);
        assert_eq!(
            envelope.statistics,
            Some(Statistics::PlainText(PlainTextStatistics {
                total_elements: 2,
                total_pages: 3,
                paragraphs: 2,
            }))
        );

        let markdown = envelope.markdown.as_ref().unwrap();
        assert!(markdown.starts_with("## Page 1\n\n"));
        assert!(markdown.contains("## Page 3\n\n"));
        assert!(!markdown.contains("## Page 2"));

        let metadata = envelope.metadata.as_ref().unwrap();
        assert_eq!(metadata["note"], FALLBACK_NOTE);
        assert!(metadata["fallback_reason"]
            .as_str()
            .unwrap()
            .contains("stub failure"));
    }

    #[test]
    fn test_engine_panic_uses_fallback() {
        let extractor = DoclingExtractor::with_engine(PanickingConverter);
        let envelope = extractor.extract(&build_pdf(&["Recovered"]), "doc.pdf");

        assert_eq!(envelope.model, FALLBACK_MODEL);
        assert!(envelope.elements.unwrap()[0].content.contains("Recovered"));
    }

    #[test]
    fn test_unavailable_engine_with_n_pages() {
        let extractor = DoclingExtractor::fallback_only();
        assert!(!extractor.primary_available());

        let envelope = extractor.extract(&build_pdf(&["one", "two", "three", "four"]), "n.pdf");

        assert_eq!(envelope.model, FALLBACK_MODEL);
        assert_eq!(envelope.elements.as_ref().unwrap().len(), 4);
        assert_eq!(envelope.statistics.as_ref().unwrap().total_pages(), 4);
        assert_eq!(
            envelope.metadata.unwrap()["fallback_reason"],
            "primary engine unavailable"
        );
    }

    #[test]
    fn test_total_failure_is_error_envelope() {
        let extractor = DoclingExtractor::fallback_only();
        let envelope = extractor.extract(b"definitely not a pdf", "bad.pdf");

        assert_eq!(envelope.status, Status::Error);
        assert_eq!(envelope.model, PRIMARY_MODEL);
        assert_eq!(envelope.filename, "bad.pdf");
        assert!(!envelope.error.as_deref().unwrap_or_default().is_empty());

        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json.get("markdown").is_none());
        assert!(json.get("elements").is_none());
    }

    #[test]
    fn test_staging_suffix() {
        assert_eq!(staging_suffix("a.pdf"), ".pdf");
        assert_eq!(staging_suffix("A.PDF"), ".pdf");
        assert_eq!(staging_suffix("noext"), ".pdf");
        assert_eq!(staging_suffix("weird.p d f"), ".pdf");
    }
}
