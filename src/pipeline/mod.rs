//! Pipeline stages for directory-to-PDF conversion.
//!
//! Each submodule implements exactly one step.
//!
//! ## Data Flow
//!
//! ```text
//! ingest ──▶ convert ──▶ assemble ──▶ toc
//! (dir)      (staging)   (lopdf)      (contents listing)
//! ```
//!
//! 1. [`ingest`]  : list eligible documents in a stable order
//! 2. [`convert`] : render each document to a PDF in the staging area; the
//!    only stage that runs an external process
//! 3. [`assemble`]: merge the PDFs, compute bookmark offsets, write the
//!    output atomically
//! 4. [`toc`]     : optional plain-text contents listing of the bookmarks

pub mod assemble;
pub mod convert;
pub mod ingest;
pub mod toc;

use crate::error::DocbindError;
use std::io::Write;
use std::path::Path;

/// Write `bytes` to `path` via a temp file in the same directory and a rename.
///
/// Missing parent directories are created. On any failure the temp file is
/// removed and nothing appears under `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DocbindError> {
    let write_failed = |source: std::io::Error| DocbindError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_failed)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".docbind-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(write_failed)?;
    tmp.write_all(bytes).map_err(write_failed)?;
    tmp.as_file().sync_all().map_err(write_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;
    Ok(())
}
