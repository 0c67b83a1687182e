//! Plain-text PDF reader used when the structured engine is not available
//!
//! lopdf can panic on malformed input rather than returning an error, so
//! every call into it is wrapped in [`std::panic::catch_unwind`].

use crate::error::{Error, Result};
use lopdf::Document;
use std::panic::{self, AssertUnwindSafe};

/// In-memory PDF opened for text extraction
pub struct PdfTextReader {
    document: Document,
    page_count: u32,
}

impl std::fmt::Debug for PdfTextReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfTextReader")
            .field("page_count", &self.page_count)
            .finish()
    }
}

impl PdfTextReader {
    /// Open a PDF from bytes
    pub fn open_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < 4 || &data[0..4] != b"%PDF" {
            return Err(Error::InvalidPdf {
                reason: "Not a valid PDF file".to_string(),
            });
        }

        let document = guarded(|| Document::load_mem(data).map_err(Error::from))?;
        let page_count = document.get_pages().len() as u32;

        Ok(Self {
            document,
            page_count,
        })
    }

    /// Number of pages in the document
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Raw text of every page as `(page_number, text)`, 1-indexed and in
    /// page order
    pub fn page_texts(&self) -> Result<Vec<(u32, String)>> {
        let page_numbers: Vec<u32> = self.document.get_pages().keys().copied().collect();
        page_numbers
            .into_iter()
            .map(|page| {
                let text = guarded(|| self.document.extract_text(&[page]).map_err(Error::from))?;
                Ok((page, text))
            })
            .collect()
    }
}

/// Run a lopdf call, turning a panic into [`Error::InvalidPdf`]
fn guarded<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        Err(Error::InvalidPdf {
            reason: "PDF reader panicked (malformed document)".to_string(),
        })
    })
}
