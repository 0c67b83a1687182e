//! Error types for the PDF extraction gateway

use thiserror::Error;

/// Result type alias for the PDF extraction gateway
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the PDF extraction gateway
#[derive(Error, Debug)]
pub enum Error {
    /// The primary conversion engine cannot be run on this host
    #[error("Conversion engine unavailable: {reason}")]
    EngineUnavailable { reason: String },

    /// The primary conversion engine ran but did not produce a document
    #[error("Conversion engine failed: {reason}")]
    EngineFailed { reason: String },

    /// Invalid PDF file
    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    /// lopdf error
    #[error("PDF read error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Uploaded file does not carry a PDF extension
    #[error("Unsupported file type: {filename}")]
    UnsupportedFileType { filename: String },

    /// Upload larger than the configured ceiling
    #[error("File too large: {size} bytes (max: {max_size} bytes)")]
    FileTooLarge { size: u64, max_size: u64 },

    /// Model selector outside the allow-list
    #[error("Invalid model: {model}")]
    InvalidModel { model: String },

    /// Model is declared in the catalog but has no extractor
    #[error("Model not implemented: {model}")]
    ModelNotImplemented { model: String },

    /// Malformed multipart upload
    #[error("Invalid upload: {reason}")]
    InvalidUpload { reason: String },

    /// Extraction did not finish within the configured time
    #[error("Extraction timed out after {seconds} seconds")]
    Timeout { seconds: u64 },
}

impl Error {
    /// Return a sanitized error message safe to send to clients.
    /// Internal details (paths, library errors) are omitted.
    /// Full details should be logged via tracing before calling this.
    pub fn client_message(&self) -> String {
        match self {
            Error::EngineUnavailable { .. } => "Conversion engine unavailable".to_string(),
            Error::EngineFailed { .. } => "Conversion engine failed".to_string(),
            Error::InvalidPdf { .. } => "Invalid PDF file".to_string(),
            Error::Pdf(_) => "PDF processing error".to_string(),
            Error::Io(_) => "I/O error".to_string(),
            Error::Serialization(_) => "Serialization error".to_string(),
            Error::UnsupportedFileType { .. } => "Only PDF files are supported".to_string(),
            Error::FileTooLarge { max_size, .. } => format!(
                "File size exceeds maximum allowed size of {:.1}MB",
                *max_size as f64 / (1024.0 * 1024.0)
            ),
            Error::InvalidModel { .. } => format!(
                "Invalid model. Choose from: {}",
                crate::upload::ModelKind::NAMES.join(", ")
            ),
            Error::ModelNotImplemented { model } => {
                format!("Model '{}' is not implemented yet. Use 'docling'.", model)
            }
            Error::InvalidUpload { reason } => format!("Invalid upload: {}", reason),
            Error::Timeout { seconds } => format!("Extraction timed out after {} seconds", seconds),
        }
    }

    /// Whether this error was caused by the request rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedFileType { .. }
                | Error::FileTooLarge { .. }
                | Error::InvalidModel { .. }
                | Error::ModelNotImplemented { .. }
                | Error::InvalidUpload { .. }
        )
    }
}
