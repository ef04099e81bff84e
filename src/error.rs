//! Error types for the docbind library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DocbindError`]: **fatal**. The run cannot produce an output at all
//!   (no source documents, every conversion failed, a converted PDF could not
//!   be merged). Returned as `Err(DocbindError)` from the top-level `run_*`
//!   functions and from [`crate::pipeline::assemble::assemble`].
//!
//! * [`ConversionError`]: **non-fatal**. One source document failed to
//!   convert, but the others are fine. Collected into
//!   [`crate::output::RunReport::failures`] so callers see a degraded run
//!   rather than losing the whole batch to one bad document.
//!
//! Assembly is stricter than conversion: once the batch reaches
//! the merge step every input must be readable, otherwise the page offsets of
//! the bookmarks would silently drift.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docbind library.
///
/// Per-document conversion failures use [`ConversionError`] and are stored in
/// [`crate::output::RunReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum DocbindError {
    // ── Ingestion errors ──────────────────────────────────────────────────
    /// Input directory was not found at the given path.
    #[error("Input directory not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Input path exists but is not a directory.
    #[error("Input path is not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    /// Input directory could not be listed.
    #[error("Failed to read input directory '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory was readable but held no eligible documents.
    #[error("No source documents ({extensions}) found in '{path}'")]
    NoSourceDocuments { path: PathBuf, extensions: String },

    // ── Staging errors ────────────────────────────────────────────────────
    /// The staging directory for intermediate PDFs could not be created.
    #[error("Failed to create staging directory: {source}")]
    StagingFailed {
        #[source]
        source: std::io::Error,
    },

    // ── Conversion policy errors ──────────────────────────────────────────
    /// Every source document failed to convert; output would be empty.
    #[error("All {total} documents failed to convert.\nFirst error: {first_error}")]
    NoConversionsSucceeded { total: usize, first_error: String },

    /// Some documents converted, but fewer than the configured threshold.
    #[error(
        "Only {succeeded}/{total} documents converted, below the required ratio of {required:.2}"
    )]
    InsufficientConversions {
        succeeded: usize,
        total: usize,
        required: f64,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// A PDF handed to [`crate::inspect`] could not be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    // ── Assembly errors ───────────────────────────────────────────────────
    /// The assembler was called with nothing to merge.
    #[error("No PDF files provided for merging")]
    EmptyInput,

    /// A specific PDF could not be read or appended.
    #[error("Failed to merge '{path}': {detail}")]
    Merge { path: PathBuf, detail: String },

    /// Could not create or write the merged output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// The pipeline stage a fatal error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Configuration, before the pipeline starts.
    Setup,
    /// Discovering source documents.
    Ingestion,
    /// Staging and converting each document.
    Conversion,
    /// Merging the converted PDFs and writing the output.
    Assembly,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Setup => "setup",
            Stage::Ingestion => "ingestion",
            Stage::Conversion => "conversion",
            Stage::Assembly => "assembly",
        };
        f.write_str(name)
    }
}

impl DocbindError {
    /// The stage at which this error aborted the run.
    pub fn stage(&self) -> Stage {
        match self {
            DocbindError::InputNotFound { .. }
            | DocbindError::NotADirectory { .. }
            | DocbindError::InputReadFailed { .. }
            | DocbindError::NoSourceDocuments { .. } => Stage::Ingestion,
            DocbindError::StagingFailed { .. }
            | DocbindError::NoConversionsSucceeded { .. }
            | DocbindError::InsufficientConversions { .. } => Stage::Conversion,
            DocbindError::EmptyInput
            | DocbindError::CorruptPdf { .. }
            | DocbindError::Merge { .. }
            | DocbindError::OutputWriteFailed { .. } => Stage::Assembly,
            DocbindError::InvalidConfig(_) => Stage::Setup,
        }
    }
}

/// A non-fatal error for a single source document.
///
/// Stored in [`crate::output::RunReport::failures`]. The run continues unless
/// ALL documents fail.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum ConversionError {
    /// The external converter could not be started.
    #[error("{name}: failed to launch converter: {detail}")]
    LaunchFailed { name: String, detail: String },

    /// The converter ran but exited unsuccessfully.
    #[error("{name}: converter exited with {status}: {detail}")]
    ConverterFailed {
        name: String,
        status: String,
        detail: String,
    },

    /// The converter did not finish in time and was killed.
    #[error("{name}: conversion timed out after {secs}s")]
    Timeout { name: String, secs: u64 },

    /// The converter reported success but produced no usable file.
    #[error("{name}: no PDF produced at '{path}'")]
    MissingOutput { name: String, path: PathBuf },

    /// The produced file does not start with the PDF magic bytes.
    #[error("{name}: converter output is not a PDF (first bytes: {magic:?})")]
    NotAPdf { name: String, magic: [u8; 4] },

    /// Any other per-document failure, e.g. from a custom converter.
    #[error("{name}: {detail}")]
    Other { name: String, detail: String },
}

impl ConversionError {
    /// Display name of the document that failed.
    pub fn item(&self) -> &str {
        match self {
            ConversionError::LaunchFailed { name, .. }
            | ConversionError::ConverterFailed { name, .. }
            | ConversionError::Timeout { name, .. }
            | ConversionError::MissingOutput { name, .. }
            | ConversionError::NotAPdf { name, .. }
            | ConversionError::Other { name, .. } => name,
        }
    }
}
