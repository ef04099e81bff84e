//! Pipeline entry points: ingest, convert, assemble.
//!
//! A run is a small state machine:
//!
//! ```text
//! Ready ──▶ Ingested ──▶ Converted ──▶ Assembled
//!   │          │            │
//!   └──────────┴────────────┴──▶ Failed
//! ```
//!
//! The staging area is created on the `Ingested → Converted` edge and owned
//! by the run as a drop guard: every exit after that point removes it along
//! with the intermediate PDFs. Ingestion failures happen before it exists.

use crate::config::PipelineConfig;
use crate::error::DocbindError;
use crate::output::{PdfSummary, PipelineState, RunReport, RunStats};
use crate::pipeline::assemble::{assemble, read_summary};
use crate::pipeline::convert::{convert_all, ConversionBatch, Converter, SofficeConverter};
use crate::pipeline::ingest::discover_sources;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, error, info, warn};

/// Convert every document in `input_dir` and merge them into `output_path`.
///
/// Uses [`SofficeConverter`] configured from `config`.
///
/// # Returns
/// `Ok(RunReport)` on success, even if some documents failed to convert
/// (check [`RunReport::is_degraded`]).
///
/// # Errors
/// Returns `Err(DocbindError)` only for fatal errors; see
/// [`DocbindError::stage`] for where the run stopped.
pub fn run_pipeline(
    input_dir: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<RunReport, DocbindError> {
    let converter = SofficeConverter::from_config(config);
    run_pipeline_with(&converter, input_dir, output_path, config)
}

/// Same as [`run_pipeline`], with a caller-supplied [`Converter`].
pub fn run_pipeline_with<C: Converter + ?Sized>(
    converter: &C,
    input_dir: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<RunReport, DocbindError> {
    let mut run = PipelineRun::new(config);
    let result = run.execute(converter, input_dir.as_ref(), output_path.as_ref());
    if let Err(ref e) = result {
        run.transition(PipelineState::Failed);
        error!("Pipeline failed during {}: {}", e.stage(), e);
    }
    result
}

/// Read page count, metadata and outline of an existing PDF.
///
/// Does not require an office suite.
pub fn inspect(path: impl AsRef<Path>) -> Result<PdfSummary, DocbindError> {
    read_summary(path.as_ref())
}

/// Short-lived directory holding one run's intermediate PDFs.
///
/// Removed with all its contents when dropped.
#[derive(Debug)]
pub struct StagingArea {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl StagingArea {
    /// Create a fresh staging directory under `root`, or the system temp dir.
    pub fn create(root: Option<&Path>) -> Result<Self, DocbindError> {
        let staging_failed = |source| DocbindError::StagingFailed { source };

        let mut builder = tempfile::Builder::new();
        builder.prefix("docbind-staging-");
        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root).map_err(staging_failed)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .map_err(staging_failed)?;

        let path = dir.path().to_path_buf();
        debug!("Created staging directory {}", path.display());
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => debug!("Removed staging directory {}", self.path.display()),
                Err(e) => warn!(
                    "Failed to remove staging directory {}: {}",
                    self.path.display(),
                    e
                ),
            }
        }
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

struct PipelineRun<'a> {
    config: &'a PipelineConfig,
    state: PipelineState,
}

impl<'a> PipelineRun<'a> {
    fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            state: PipelineState::Ready,
        }
    }

    fn transition(&mut self, next: PipelineState) {
        debug!("Pipeline state {:?} → {:?}", self.state, next);
        self.state = next;
    }

    fn execute<C: Converter + ?Sized>(
        &mut self,
        converter: &C,
        input_dir: &Path,
        output_path: &Path,
    ) -> Result<RunReport, DocbindError> {
        let total_start = Instant::now();
        let progress = self.config.progress_callback.as_ref();

        // ── Step 1: Ingest (Ready → Ingested) ────────────────────────────
        info!("Scanning {}", input_dir.display());
        let sources = discover_sources(input_dir, &self.config.extensions)?;
        let total_items = sources.len();
        self.transition(PipelineState::Ingested);
        if let Some(cb) = progress {
            cb.on_pipeline_start(total_items);
        }

        // ── Step 2: Convert (Ingested → Converted) ───────────────────────
        let staging = StagingArea::create(self.config.staging_root.as_deref())?;
        info!(
            "Converting {} documents (staging in {})",
            total_items,
            staging.path().display()
        );
        let conversion_start = Instant::now();
        let batch = convert_all(converter, &sources, staging.path(), progress);
        let conversion_duration_ms = conversion_start.elapsed().as_millis() as u64;

        self.check_conversions(total_items, &batch)?;
        let converted_items = batch.converted.len();
        if converted_items < total_items {
            warn!(
                "Only {}/{} files converted successfully; continuing without: {}",
                converted_items,
                total_items,
                batch
                    .failures
                    .iter()
                    .map(|f| f.item())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        self.transition(PipelineState::Converted);

        // ── Step 3: Assemble (Converted → Assembled) ─────────────────────
        info!("Merging {} PDFs into {}", converted_items, output_path.display());
        if let Some(cb) = progress {
            cb.on_assembly_start(converted_items);
        }
        let assembly_start = Instant::now();
        let document = assemble(&batch.converted, output_path, self.config)?;
        let assembly_duration_ms = assembly_start.elapsed().as_millis() as u64;
        if let Some(cb) = progress {
            cb.on_assembly_complete(document.total_pages);
        }

        drop(staging);
        self.transition(PipelineState::Assembled);

        let stats = RunStats {
            conversion_duration_ms,
            assembly_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };
        info!(
            "Pipeline completed: {}/{} converted, {} pages, {}ms total",
            converted_items, total_items, document.total_pages, stats.total_duration_ms
        );

        Ok(RunReport {
            state: self.state,
            total_items,
            converted_items,
            failures: batch.failures,
            document,
            stats,
        })
    }

    /// Apply the batch-level policy: zero successes, then the ratio threshold.
    fn check_conversions(&self, total: usize, batch: &ConversionBatch) -> Result<(), DocbindError> {
        let succeeded = batch.converted.len();
        if succeeded == 0 {
            let first_error = batch
                .failures
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(DocbindError::NoConversionsSucceeded { total, first_error });
        }

        let ratio = succeeded as f64 / total as f64;
        if ratio < self.config.min_success_ratio {
            return Err(DocbindError::InsufficientConversions {
                succeeded,
                total,
                required: self.config.min_success_ratio,
            });
        }
        Ok(())
    }
}
