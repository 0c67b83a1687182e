//! Upload validation and the model catalog

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Default upload ceiling (50 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Extraction models accepted by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Docling,
    Surya,
    Mineru,
}

/// Static description of a model for the catalog endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub capabilities: &'static [&'static str],
    pub best_for: &'static str,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::Docling, ModelKind::Surya, ModelKind::Mineru];
    pub const NAMES: [&'static str; 3] = ["docling", "surya", "mineru"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Docling => "docling",
            ModelKind::Surya => "surya",
            ModelKind::Mineru => "mineru",
        }
    }

    /// Only Docling has an extractor behind it; the others are catalog
    /// entries
    pub fn is_implemented(&self) -> bool {
        matches!(self, ModelKind::Docling)
    }

    pub fn info(&self) -> ModelInfo {
        match self {
            ModelKind::Docling => ModelInfo {
                name: "Docling",
                description: "Document understanding and conversion framework",
                capabilities: &["text", "tables", "layout", "structure"],
                best_for: "General documents and structured content",
            },
            ModelKind::Surya => ModelInfo {
                name: "Surya",
                description: "Multilingual document OCR and layout analysis",
                capabilities: &["text", "layout", "multilingual"],
                best_for: "Multilingual documents and complex layouts",
            },
            ModelKind::Mineru => ModelInfo {
                name: "MinerU",
                description: "PDF extraction for scientific documents",
                capabilities: &["text", "tables", "formulas", "figures"],
                best_for: "Scientific papers and academic documents",
            },
        }
    }

    /// Fail with [`Error::ModelNotImplemented`] for catalog-only models
    pub fn ensure_implemented(self) -> Result<Self> {
        if self.is_implemented() {
            Ok(self)
        } else {
            Err(Error::ModelNotImplemented {
                model: self.as_str().to_string(),
            })
        }
    }
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "docling" => Ok(ModelKind::Docling),
            "surya" => Ok(ModelKind::Surya),
            "mineru" => Ok(ModelKind::Mineru),
            other => Err(Error::InvalidModel {
                model: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Require a `.pdf` extension (case-insensitive)
pub fn validate_extension(filename: &str) -> Result<()> {
    if filename.to_ascii_lowercase().ends_with(".pdf") {
        Ok(())
    } else {
        Err(Error::UnsupportedFileType {
            filename: filename.to_string(),
        })
    }
}

pub fn validate_size(size: u64, max_size: u64) -> Result<()> {
    if size > max_size {
        Err(Error::FileTooLarge { size, max_size })
    } else {
        Ok(())
    }
}

/// Validate an upload and resolve its model selector.
///
/// Checks run in order: extension, size, model name.
pub fn validate_upload(filename: &str, size: u64, model: &str, max_size: u64) -> Result<ModelKind> {
    validate_extension(filename)?;
    validate_size(size, max_size)?;
    model.parse()
}

/// File description returned by the upload endpoint
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub filename: String,
    pub size_bytes: u64,
    pub size_mb: f64,
    pub model_selected: ModelKind,
}

impl FileInfo {
    pub fn new(filename: impl Into<String>, size_bytes: u64, model: ModelKind) -> Self {
        let size_mb = (size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0;
        Self {
            filename: filename.into(),
            size_bytes,
            size_mb,
            model_selected: model,
        }
    }
}
