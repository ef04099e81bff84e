//! Progress-callback trait for per-document pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the pipeline converts each document and assembles the result.
//!
//! # Example
//!
//! ```rust
//! use docbind::{PipelineConfig, PipelineProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     converted: AtomicUsize,
//! }
//!
//! impl PipelineProgressCallback for CountingCallback {
//!     fn on_item_converted(&self, index: usize, total: usize, name: &str) {
//!         self.converted.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("[{}/{}] {}", index + 1, total, name);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { converted: AtomicUsize::new(0) });
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(counter as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The pipeline is sequential, so events for one run
/// never overlap; the `Send + Sync` bound lets the callback live in a shared
/// config.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once after ingestion, before any document is converted.
    fn on_pipeline_start(&self, total_items: usize) {
        let _ = total_items;
    }

    /// Called just before a document is handed to the converter.
    ///
    /// `index` is zero-based.
    fn on_item_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when a document converted successfully.
    fn on_item_converted(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when a document failed to convert. The batch continues.
    fn on_item_failed(&self, index: usize, total: usize, name: &str, error: &str) {
        let _ = (index, total, name, error);
    }

    /// Called once after every document has been attempted.
    fn on_conversion_complete(&self, total: usize, succeeded: usize) {
        let _ = (total, succeeded);
    }

    /// Called before the converted PDFs are merged.
    fn on_assembly_start(&self, items: usize) {
        let _ = items;
    }

    /// Called after the merged PDF has been written.
    fn on_assembly_complete(&self, total_pages: usize) {
        let _ = total_pages;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
