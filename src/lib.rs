//! # docbind
//!
//! Convert a directory of word-processing documents into one merged PDF with
//! a navigable outline: one bookmark per source file, pointing at the page
//! where that file's content begins.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input dir
//!  │
//!  ├─ 1. Ingest    list eligible documents, deterministic order
//!  ├─ 2. Convert   one PDF per document in a scoped staging area
//!  │               (headless office suite, failures isolated per item)
//!  ├─ 3. Assemble  merge in order, one bookmark per document at its
//!  │               first page, write metadata, atomic write
//!  └─ 4. Report    RunReport: counts, failures, bookmarks, timings
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docbind::{run_pipeline, PipelineConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder().title("Handbook").build()?;
//!     let report = run_pipeline("chapters/", "handbook.pdf", &config)?;
//!     eprintln!("{} ({} pages)", report.summary(), report.document.total_pages);
//!     Ok(())
//! }
//! ```
//!
//! Already have PDFs? Skip conversion and call [`assemble_files`] directly.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docbind` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! ```toml
//! docbind = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::{ConversionError, DocbindError, Stage};
pub use output::{
    AssembledDocument, BookmarkEntry, ConvertedItem, DocumentMetadata, PdfSummary, PipelineState,
    RunReport, RunStats, SourceItem,
};
pub use pipeline::assemble::{assemble, assemble_files, bookmark_title};
pub use pipeline::convert::{Converter, SofficeConverter};
pub use pipeline::ingest::discover_sources;
pub use pipeline::toc::{render_toc, write_toc};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
pub use run::{inspect, run_pipeline, run_pipeline_with, StagingArea};
