//! Assembly: merge single-document PDFs into one bookmarked PDF.
//!
//! ## How pages are merged
//!
//! Every input is loaded with `lopdf`, its object ids renumbered above the
//! ids already used, and its pages re-parented under one new page tree.
//! Page content streams are copied untouched. Source catalogs, page trees,
//! outlines and info dictionaries are dropped; the merged document gets its
//! own catalog, a flat `/Outlines` tree, and an Info dictionary.
//!
//! Attributes a page inherits from its old page-tree ancestors (`Resources`,
//! `MediaBox`, `CropBox`, `Rotate`) are copied onto the page itself before
//! re-parenting, otherwise pages would lose their fonts or size.
//!
//! ## Page offsets
//!
//! Bookmark start pages come from a running page counter updated once per
//! input: an item starts where the previous ones ended. Nothing is recomputed
//! from the finished file.
//!
//! ## All or nothing
//!
//! A single unreadable, encrypted or empty input aborts the whole merge with
//! [`DocbindError::Merge`]. The output is serialised in memory and persisted
//! through a temp file in the destination directory, so a failed run never
//! leaves a partial file under the final name.

use crate::config::PipelineConfig;
use crate::error::DocbindError;
use crate::output::{AssembledDocument, BookmarkEntry, ConvertedItem, DocumentMetadata, PdfSummary};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, StringFormat};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Page attributes a page may inherit from its page-tree ancestors.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Merge `items` in order into one PDF at `output_path`.
///
/// # Errors
/// - [`DocbindError::EmptyInput`] if `items` is empty (nothing is written)
/// - [`DocbindError::Merge`] naming the first input that could not be read
/// - [`DocbindError::OutputWriteFailed`] if the result cannot be persisted
pub fn assemble(
    items: &[ConvertedItem],
    output_path: &Path,
    config: &PipelineConfig,
) -> Result<AssembledDocument, DocbindError> {
    if items.is_empty() {
        return Err(DocbindError::EmptyInput);
    }

    let mut merger = Merger::new();
    for item in items {
        info!("Merging {}...", item.display_name);
        let title = bookmark_title(&item.display_name, config.strip_order_prefix);
        let entry = merger.append(&item.pdf_path, title)?;
        debug!(
            "'{}' → pages {}..{}",
            entry.title,
            entry.start_page,
            entry.start_page + entry.page_count
        );
    }

    let total_pages = merger.page_count;
    let bookmarks: Vec<BookmarkEntry> = merger.entries.iter().map(|(e, _)| e.clone()).collect();
    let mut document = merger.finish(&config.metadata);

    let mut bytes = Vec::new();
    document
        .save_to(&mut bytes)
        .map_err(|e| DocbindError::OutputWriteFailed {
            path: output_path.to_path_buf(),
            source: std::io::Error::other(e.to_string()),
        })?;
    super::write_atomic(output_path, &bytes)?;

    info!(
        "Created merged PDF at {} ({} pages, {} bookmarks)",
        output_path.display(),
        total_pages,
        bookmarks.len()
    );

    Ok(AssembledDocument {
        output_path: output_path.to_path_buf(),
        total_pages,
        bookmarks,
        metadata: config.metadata.clone(),
    })
}

/// Merge existing PDF files, titling each bookmark after its file name.
pub fn assemble_files(
    pdf_paths: &[PathBuf],
    output_path: &Path,
    config: &PipelineConfig,
) -> Result<AssembledDocument, DocbindError> {
    let items: Vec<ConvertedItem> = pdf_paths.iter().cloned().map(ConvertedItem::from_pdf).collect();
    assemble(&items, output_path, config)
}

// ── Bookmark titles ──────────────────────────────────────────────────────────

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_ORDER_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.?\s+(\S.*)$").unwrap());

/// Derive a bookmark title from a document name.
///
/// `reports/01_Project_Scope.docx` → `Project Scope` (or `01 Project Scope`
/// with `strip_order_prefix = false`). Directory and extension are removed,
/// underscores become spaces, and whitespace runs collapse. Never fails: a
/// name that would reduce to nothing is returned trimmed as given.
pub fn bookmark_title(display_name: &str, strip_order_prefix: bool) -> String {
    let base = display_name.rsplit(['/', '\\']).next().unwrap_or(display_name);
    let stem = match base.rsplit_once('.') {
        Some((stem, _)) if !stem.trim().is_empty() => stem,
        _ => base,
    };

    let spaced = stem.replace('_', " ");
    let collapsed = RE_WHITESPACE.replace_all(spaced.trim(), " ").into_owned();
    let title = if strip_order_prefix {
        match RE_ORDER_PREFIX.captures(&collapsed) {
            Some(caps) => caps[1].to_string(),
            None => collapsed,
        }
    } else {
        collapsed
    };

    if !title.is_empty() {
        return title;
    }
    let raw = display_name.trim();
    if raw.is_empty() {
        "Untitled".to_string()
    } else {
        raw.to_string()
    }
}

// ── Merging ──────────────────────────────────────────────────────────────────

/// Accumulates pages from successive inputs into one document.
struct Merger {
    document: Document,
    pages_id: ObjectId,
    next_id: u32,
    kids: Vec<ObjectId>,
    entries: Vec<(BookmarkEntry, ObjectId)>,
    page_count: usize,
    version: String,
}

impl Merger {
    fn new() -> Self {
        Self {
            document: Document::with_version("1.4"),
            // Id 1 is reserved for the page tree root so appended pages can
            // point at it immediately.
            pages_id: (1, 0),
            next_id: 2,
            kids: Vec::new(),
            entries: Vec::new(),
            page_count: 0,
            version: "1.4".to_string(),
        }
    }

    /// Append every page of `path` and record its bookmark.
    fn append(&mut self, path: &Path, title: String) -> Result<BookmarkEntry, DocbindError> {
        let merge_err = |detail: String| DocbindError::Merge {
            path: path.to_path_buf(),
            detail,
        };

        let mut doc = Document::load(path).map_err(|e| merge_err(e.to_string()))?;
        if doc.trailer.get(b"Encrypt").is_ok() {
            return Err(merge_err("encrypted documents cannot be merged".into()));
        }

        doc.renumber_objects_with(self.next_id);
        let max_id = doc
            .objects
            .keys()
            .map(|&(id, _)| id)
            .max()
            .unwrap_or(0)
            .max(doc.max_id);
        self.next_id = self.next_id.max(max_id + 1);

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(merge_err("document has no pages".into()));
        }

        let mut pages = Vec::with_capacity(page_ids.len());
        for &page_id in &page_ids {
            let mut page = doc
                .get_dictionary(page_id)
                .map_err(|e| merge_err(format!("page object {page_id:?}: {e}")))?
                .clone();
            for (key, value) in inherited_attributes(&doc, &page) {
                page.set(key, value);
            }
            page.set("Parent", self.pages_id);
            pages.push((page_id, page));
        }

        let page_set: HashSet<ObjectId> = page_ids.iter().copied().collect();
        let info_id = doc
            .trailer
            .get(b"Info")
            .and_then(Object::as_reference)
            .ok();

        for (id, object) in std::mem::take(&mut doc.objects) {
            if page_set.contains(&id) || Some(id) == info_id {
                continue;
            }
            match object.type_name().unwrap_or("") {
                "Catalog" | "Pages" | "Outlines" | "ObjStm" | "XRef" => {}
                _ => {
                    self.document.objects.insert(id, object);
                }
            }
        }
        for (id, page) in pages {
            self.document.objects.insert(id, Object::Dictionary(page));
        }

        if doc.version > self.version {
            self.version = doc.version.clone();
        }

        // The running page counter is read before and advanced after the append.
        let entry = BookmarkEntry {
            title,
            start_page: self.page_count,
            page_count: page_ids.len(),
        };
        self.page_count += page_ids.len();
        self.kids.extend_from_slice(&page_ids);
        self.entries.push((entry.clone(), page_ids[0]));
        Ok(entry)
    }

    /// Build page tree, outline, catalog and info, and return the document.
    fn finish(self, metadata: &DocumentMetadata) -> Document {
        let Merger {
            mut document,
            pages_id,
            next_id,
            kids,
            entries,
            page_count,
            version,
        } = self;

        document.version = version;
        document.max_id = next_id - 1;

        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
                "Count" => page_count as i64,
            }),
        );

        let outlines_id = build_outline(&mut document, &entries);

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };
        if let Some(id) = outlines_id {
            catalog.set("Outlines", id);
            catalog.set("PageMode", "UseOutlines");
        }
        let catalog_id = document.add_object(catalog);

        let info_id = document.add_object(dictionary! {
            "Title" => text_string(&metadata.title),
            "Producer" => text_string(&metadata.producer),
            "Author" => text_string(&metadata.author),
        });

        document.trailer.set("Root", catalog_id);
        document.trailer.set("Info", info_id);

        // Outline items, name trees and other objects only the dropped source
        // catalogs pointed at.
        let pruned = document.prune_objects();
        if !pruned.is_empty() {
            debug!("Pruned {} unreachable objects", pruned.len());
        }
        document
    }
}

/// Copy down inheritable attributes the page does not set itself.
fn inherited_attributes(doc: &Document, page: &Dictionary) -> Vec<(&'static [u8], Object)> {
    let mut found: Vec<(&'static [u8], Object)> = Vec::new();
    let mut seen = HashSet::new();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    while let Some(id) = parent {
        if !seen.insert(id) {
            break;
        }
        let Ok(node) = doc.get_dictionary(id) else {
            break;
        };
        for key in INHERITABLE {
            if page.has(key) || found.iter().any(|(k, _)| *k == key) {
                continue;
            }
            if let Ok(value) = node.get(key) {
                found.push((key, value.clone()));
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    found
}

/// Write a flat outline, one item per merged input, and return its root id.
fn build_outline(document: &mut Document, entries: &[(BookmarkEntry, ObjectId)]) -> Option<ObjectId> {
    if entries.is_empty() {
        return None;
    }

    let outlines_id = document.new_object_id();
    let item_ids: Vec<ObjectId> = entries.iter().map(|_| document.new_object_id()).collect();

    for (i, (entry, page_id)) in entries.iter().enumerate() {
        let mut item = dictionary! {
            "Title" => text_string(&entry.title),
            "Parent" => outlines_id,
            "Dest" => vec![Object::Reference(*page_id), "Fit".into()],
        };
        if i > 0 {
            item.set("Prev", item_ids[i - 1]);
        }
        if i + 1 < item_ids.len() {
            item.set("Next", item_ids[i + 1]);
        }
        document.objects.insert(item_ids[i], Object::Dictionary(item));
    }

    document.objects.insert(
        outlines_id,
        Object::Dictionary(dictionary! {
            "Type" => "Outlines",
            "First" => item_ids[0],
            "Last" => item_ids[item_ids.len() - 1],
            "Count" => item_ids.len() as i64,
        }),
    );
    Some(outlines_id)
}

// ── Text strings ─────────────────────────────────────────────────────────────

/// Encode a PDF text string: literal for ASCII, UTF-16BE with BOM otherwise.
fn text_string(s: &str) -> Object {
    if s.is_ascii() {
        return Object::string_literal(s);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Decode a PDF text string written by any producer.
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // PDFDocEncoding matches Latin-1 for printable text.
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

// ── Reading back ─────────────────────────────────────────────────────────────

/// Read page count, Info metadata and the top-level outline of a PDF.
pub fn read_summary(path: &Path) -> Result<PdfSummary, DocbindError> {
    let corrupt = |detail: String| DocbindError::CorruptPdf {
        path: path.to_path_buf(),
        detail,
    };
    let doc = Document::load(path).map_err(|e| corrupt(e.to_string()))?;

    let page_index: HashMap<ObjectId, usize> = doc
        .get_pages()
        .into_values()
        .enumerate()
        .map(|(idx, id)| (id, idx))
        .collect();
    let page_count = page_index.len();

    let info = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|o| resolve(&doc, o))
        .and_then(|o| o.as_dict().ok());
    let info_field = |key: &[u8]| -> Option<String> {
        match info?.get(key).ok().and_then(|o| resolve(&doc, o))? {
            Object::String(bytes, _) => Some(decode_text_string(bytes)),
            _ => None,
        }
    };

    let mut bookmarks = read_outline(&doc, &page_index);
    for i in 0..bookmarks.len() {
        let end = bookmarks
            .get(i + 1)
            .map(|next| next.start_page)
            .unwrap_or(page_count);
        bookmarks[i].page_count = end.saturating_sub(bookmarks[i].start_page);
    }

    Ok(PdfSummary {
        page_count,
        pdf_version: doc.version.clone(),
        title: info_field(b"Title"),
        producer: info_field(b"Producer"),
        author: info_field(b"Author"),
        bookmarks,
    })
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Walk the top-level `/First`…`/Next` chain; items without a page target are skipped.
fn read_outline(doc: &Document, page_index: &HashMap<ObjectId, usize>) -> Vec<BookmarkEntry> {
    let mut entries = Vec::new();
    let outlines = doc
        .trailer
        .get(b"Root")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok())
        .and_then(|catalog| catalog.get(b"Outlines").ok())
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok());
    let Some(outlines) = outlines else {
        return entries;
    };

    let mut seen = HashSet::new();
    let mut current = outlines.get(b"First").and_then(Object::as_reference).ok();
    while let Some(id) = current {
        if !seen.insert(id) {
            break;
        }
        let Ok(item) = doc.get_dictionary(id) else {
            break;
        };

        let title = match item.get(b"Title").ok().and_then(|o| resolve(doc, o)) {
            Some(Object::String(bytes, _)) => decode_text_string(bytes),
            _ => String::new(),
        };
        if let Some(start_page) = outline_target(doc, item).and_then(|p| page_index.get(&p)) {
            entries.push(BookmarkEntry {
                title,
                start_page: *start_page,
                page_count: 0,
            });
        }
        current = item.get(b"Next").and_then(Object::as_reference).ok();
    }
    entries
}

/// Page targeted by an outline item's `/Dest` or GoTo action `/A /D`.
fn outline_target(doc: &Document, item: &Dictionary) -> Option<ObjectId> {
    let dest = match item.get(b"Dest") {
        Ok(dest) => resolve(doc, dest)?,
        Err(_) => {
            let action = resolve(doc, item.get(b"A").ok()?)?.as_dict().ok()?;
            resolve(doc, action.get(b"D").ok()?)?
        }
    };
    dest.as_array().ok()?.first()?.as_reference().ok()
}
