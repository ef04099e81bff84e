//! Ingestion: list the source documents of a directory in a stable order.
//!
//! Word processors leave `~$name.docx` owner files next to open documents;
//! those are never real inputs and are skipped, as are hidden files. The
//! order is case-insensitive by file name so `01_intro.docx` and
//! `02_Body.docx` sort the way a person numbering files expects, with the
//! exact name as a tie-breaker to keep the result deterministic.

use crate::error::DocbindError;
use crate::output::SourceItem;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Discover eligible source documents in `dir`.
///
/// # Errors
/// - [`DocbindError::InputNotFound`] / [`DocbindError::NotADirectory`] for a
///   bad input location
/// - [`DocbindError::InputReadFailed`] if the directory cannot be listed
/// - [`DocbindError::NoSourceDocuments`] if nothing matched
pub fn discover_sources(dir: &Path, extensions: &[String]) -> Result<Vec<SourceItem>, DocbindError> {
    if !dir.exists() {
        return Err(DocbindError::InputNotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(DocbindError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let read_failed = |source| DocbindError::InputReadFailed {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_failed)? {
        let entry = entry.map_err(read_failed)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_eligible(&name, extensions) {
            debug!("Skipping {}", name);
            continue;
        }
        paths.push(path);
    }

    if paths.is_empty() {
        return Err(DocbindError::NoSourceDocuments {
            path: dir.to_path_buf(),
            extensions: extensions
                .iter()
                .map(|e| format!("*.{e}"))
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    paths.sort_by_cached_key(|p| {
        let name = p
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (name.to_lowercase(), name)
    });

    let items: Vec<SourceItem> = paths
        .into_iter()
        .enumerate()
        .map(|(rank, path)| SourceItem::new(path, rank))
        .collect();

    info!("Found {} source documents in {}", items.len(), dir.display());
    Ok(items)
}

/// True for a file name with a wanted extension that is not a lock or hidden file.
fn is_eligible(name: &str, extensions: &[String]) -> bool {
    if name.starts_with("~$") || name.starts_with('.') {
        return false;
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
        }
        _ => false,
    }
}
