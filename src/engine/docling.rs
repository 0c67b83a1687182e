//! Docling command-line driver
//!
//! Runs the `docling` executable on a staged file and reads back its JSON
//! export. Availability is probed once, when the driver is constructed.

use super::{DoclingDocument, DocumentConverter};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// [`DocumentConverter`] backed by the `docling` CLI
#[derive(Debug, Clone)]
pub struct DoclingCli {
    bin: PathBuf,
    extra_args: Vec<String>,
    version: String,
}

impl DoclingCli {
    /// Probe `bin --version` and return a driver if the engine can run.
    ///
    /// Returns [`Error::EngineUnavailable`] when the executable is missing
    /// or exits unsuccessfully.
    pub fn detect(bin: impl Into<PathBuf>, extra_args: Vec<String>) -> Result<Self> {
        let bin = bin.into();
        let output = Command::new(&bin)
            .arg("--version")
            .output()
            .map_err(|e| Error::EngineUnavailable {
                reason: format!("cannot run {}: {}", bin.display(), e),
            })?;

        if !output.status.success() {
            return Err(Error::EngineUnavailable {
                reason: format!(
                    "{} --version exited with {}: {}",
                    bin.display(),
                    output.status,
                    last_line(&output.stderr)
                ),
            });
        }

        let version = last_line(&output.stdout);
        tracing::info!(bin = %bin.display(), version = %version, "Docling engine detected");

        Ok(Self {
            bin,
            extra_args,
            version,
        })
    }

    /// Version string reported by the engine
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl DocumentConverter for DoclingCli {
    fn name(&self) -> &str {
        "docling"
    }

    fn convert(&self, path: &Path) -> Result<DoclingDocument> {
        let out_dir = tempfile::Builder::new().prefix("docling-out-").tempdir()?;
        let started = Instant::now();

        let output = Command::new(&self.bin)
            .arg(path)
            .args(["--to", "json", "--output"])
            .arg(out_dir.path())
            .args(&self.extra_args)
            .output()?;

        if !output.status.success() {
            return Err(Error::EngineFailed {
                reason: format!(
                    "docling exited with {}: {}",
                    output.status,
                    last_line(&output.stderr)
                ),
            });
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::EngineFailed {
                reason: format!("input path has no file stem: {}", path.display()),
            })?;
        let document = DoclingDocument::from_path(out_dir.path().join(format!("{}.json", stem)))?;

        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            texts = document.texts.len(),
            tables = document.tables.len(),
            "docling conversion finished"
        );

        Ok(document)
    }
}

/// Last non-empty line of process output
fn last_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}
