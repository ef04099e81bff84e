//! Plain-text table of contents for a merged document.
//!
//! Page numbers are printed 1-based, the way a reader sees them in a viewer,
//! while [`BookmarkEntry::start_page`] stays zero-based.

use crate::error::DocbindError;
use crate::output::BookmarkEntry;
use std::path::Path;

/// Width of a title plus its dot leader.
const LINE_WIDTH: usize = 60;

/// Render a contents listing with one dot-leader line per bookmark.
///
/// ```text
/// Table of Contents
///
/// Intro ...................................................... 1
/// Body ....................................................... 3
/// ```
pub fn render_toc(entries: &[BookmarkEntry]) -> String {
    let mut out = String::from("Table of Contents\n\n");
    for entry in entries {
        let title_len = entry.title.chars().count();
        let dots = LINE_WIDTH.saturating_sub(title_len).max(3);
        out.push_str(&format!(
            "{} {} {}\n",
            entry.title,
            ".".repeat(dots),
            entry.start_page + 1
        ));
    }
    out
}

/// Render and atomically write the listing to `path`.
pub fn write_toc(entries: &[BookmarkEntry], path: &Path) -> Result<(), DocbindError> {
    super::write_atomic(path, render_toc(entries).as_bytes())
}
