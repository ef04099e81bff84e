//! Data types flowing through the pipeline and returned to callers.

use crate::error::ConversionError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One source document discovered by the ingestor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceItem {
    /// Full path to the document.
    pub path: PathBuf,
    /// File name, used to derive the bookmark title.
    pub display_name: String,
    /// Zero-based position in discovery order.
    pub rank: usize,
}

impl SourceItem {
    pub fn new(path: impl Into<PathBuf>, rank: usize) -> Self {
        let path = path.into();
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            path,
            display_name,
            rank,
        }
    }
}

/// A single-document PDF ready to be merged.
///
/// `display_name` is the originating document's name, not the staged PDF's,
/// so bookmark titles never depend on how the converter names its output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedItem {
    pub display_name: String,
    pub pdf_path: PathBuf,
}

impl ConvertedItem {
    pub fn new(display_name: impl Into<String>, pdf_path: impl Into<PathBuf>) -> Self {
        Self {
            display_name: display_name.into(),
            pdf_path: pdf_path.into(),
        }
    }

    /// Treat an existing PDF as a merge input, named after its own file name.
    pub fn from_pdf(pdf_path: impl Into<PathBuf>) -> Self {
        let pdf_path = pdf_path.into();
        let display_name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            display_name,
            pdf_path,
        }
    }
}

/// One entry of the merged document's flat outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkEntry {
    pub title: String,
    /// Zero-based index of the item's first page in the merged document.
    pub start_page: usize,
    /// Number of pages the item contributed.
    pub page_count: usize,
}

/// The Info dictionary written into the merged PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub producer: String,
    pub author: String,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            title: "Master PDF Document".to_string(),
            producer: concat!("docbind ", env!("CARGO_PKG_VERSION")).to_string(),
            author: "Automated Agent".to_string(),
        }
    }
}

/// The merged PDF written by the assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledDocument {
    pub output_path: PathBuf,
    pub total_pages: usize,
    pub bookmarks: Vec<BookmarkEntry>,
    pub metadata: DocumentMetadata,
}

/// What the orchestrator reached before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Ready,
    Ingested,
    Converted,
    Assembled,
    Failed,
}

/// Outcome of a successful pipeline run, possibly degraded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub state: PipelineState,
    /// Documents discovered by the ingestor.
    pub total_items: usize,
    /// Documents that converted and were merged.
    pub converted_items: usize,
    /// Per-document conversion failures, in discovery order.
    pub failures: Vec<ConversionError>,
    pub document: AssembledDocument,
    pub stats: RunStats,
}

/// Wall-clock timings for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub conversion_duration_ms: u64,
    pub assembly_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl RunReport {
    /// True when at least one document was dropped because it failed to convert.
    pub fn is_degraded(&self) -> bool {
        self.converted_items < self.total_items
    }

    /// Short human-readable count, e.g. `"2/3 converted"`.
    pub fn summary(&self) -> String {
        format!("{}/{} converted", self.converted_items, self.total_items)
    }
}

/// What [`crate::inspect`] reads back from an existing PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfSummary {
    pub page_count: usize,
    pub pdf_version: String,
    pub title: Option<String>,
    pub producer: Option<String>,
    pub author: Option<String>,
    /// Top-level outline items. `page_count` is derived from the next entry's
    /// start page (or the document end for the last one).
    pub bookmarks: Vec<BookmarkEntry>,
}
