//! Integration tests: assembly on generated PDFs and full pipeline runs
//! driven through an in-process converter.

use docbind::{
    assemble, assemble_files, inspect, render_toc, run_pipeline_with, ConversionError,
    ConvertedItem, DocbindError, PipelineConfig, PipelineProgressCallback, PipelineState,
    SourceItem, Stage,
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Fixtures ─────────────────────────────────────────────────────────────

/// Write a PDF with `pages` pages; page `i` shows the text `{marker}-{i}`.
///
/// Resources and MediaBox live on the page-tree root so merging has to
/// carry inherited attributes down to the pages.
fn write_pdf(path: &Path, pages: usize, marker: &str) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for i in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("{marker}-{i}"))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// Text markers of every page of `path`, in page order.
fn page_markers(path: &Path) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .into_values()
        .map(|id| {
            let content = doc.get_page_content(id).unwrap();
            let text = String::from_utf8_lossy(&content).into_owned();
            let start = text.find('(').unwrap() + 1;
            let end = text[start..].find(')').unwrap() + start;
            text[start..end].to_string()
        })
        .collect()
}

fn titles_and_starts(bookmarks: &[docbind::BookmarkEntry]) -> Vec<(String, usize)> {
    bookmarks
        .iter()
        .map(|b| (b.title.clone(), b.start_page))
        .collect()
}

fn leftover_temp_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".tmp"))
        .collect()
}

/// A source directory of `.docx` placeholders. Each file's content is the
/// page count its fake conversion produces, or `fail`, or `corrupt`.
fn source_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn fake_convert(source: &SourceItem, staging: &Path) -> Result<PathBuf, ConversionError> {
    let behaviour = std::fs::read_to_string(&source.path).unwrap();
    let out = staging.join(format!("{:04}.pdf", source.rank));
    match behaviour.trim() {
        "fail" => Err(ConversionError::Other {
            name: source.display_name.clone(),
            detail: "converter crashed".into(),
        }),
        "corrupt" => {
            std::fs::write(&out, b"%PDF-1.4\nthis is not a pdf").unwrap();
            Ok(out)
        }
        pages => {
            let stem = Path::new(&source.display_name)
                .file_stem()
                .unwrap()
                .to_string_lossy()
                .into_owned();
            write_pdf(&out, pages.parse().unwrap(), &stem);
            Ok(out)
        }
    }
}

fn config_with_staging(staging: &Path) -> PipelineConfig {
    PipelineConfig::builder()
        .staging_root(staging)
        .build()
        .unwrap()
}

fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

// ── Assembler ────────────────────────────────────────────────────────────

#[test]
fn bookmarks_start_at_running_page_offsets() {
    let tmp = TempDir::new().unwrap();
    let inputs: Vec<PathBuf> = [("01_Intro.pdf", 2), ("02_Body.pdf", 3), ("03_End.pdf", 1)]
        .iter()
        .map(|(name, pages)| {
            let p = tmp.path().join(name);
            write_pdf(&p, *pages, name.trim_end_matches(".pdf"));
            p
        })
        .collect();
    let out = tmp.path().join("master.pdf");

    let doc = assemble_files(&inputs, &out, &PipelineConfig::default()).unwrap();

    assert_eq!(doc.total_pages, 6);
    assert_eq!(
        titles_and_starts(&doc.bookmarks),
        vec![
            ("Intro".to_string(), 0),
            ("Body".to_string(), 2),
            ("End".to_string(), 5)
        ]
    );
    assert_eq!(
        doc.bookmarks.iter().map(|b| b.page_count).collect::<Vec<_>>(),
        vec![2, 3, 1]
    );

    // The file on disk agrees with the returned description.
    let summary = inspect(&out).unwrap();
    assert_eq!(summary.page_count, 6);
    assert_eq!(summary.bookmarks, doc.bookmarks);
    assert_eq!(
        page_markers(&out),
        vec!["01_Intro-1", "01_Intro-2", "02_Body-1", "02_Body-2", "02_Body-3", "03_End-1"]
    );
}

#[test]
fn single_page_inputs_get_consecutive_offsets() {
    let tmp = TempDir::new().unwrap();
    let inputs: Vec<PathBuf> = (0..5)
        .map(|i| {
            let p = tmp.path().join(format!("part{i}.pdf"));
            write_pdf(&p, 1, &format!("part{i}"));
            p
        })
        .collect();
    let out = tmp.path().join("master.pdf");

    let doc = assemble_files(&inputs, &out, &PipelineConfig::default()).unwrap();

    assert_eq!(doc.total_pages, 5);
    let starts: Vec<usize> = doc.bookmarks.iter().map(|b| b.start_page).collect();
    assert_eq!(starts, vec![0, 1, 2, 3, 4]);
}

#[test]
fn permuting_inputs_permutes_pages_and_bookmarks() {
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("Alpha.pdf");
    let b = tmp.path().join("Beta.pdf");
    write_pdf(&a, 1, "Alpha");
    write_pdf(&b, 2, "Beta");

    let forward = tmp.path().join("ab.pdf");
    let backward = tmp.path().join("ba.pdf");
    let config = PipelineConfig::default();
    let ab = assemble_files(&[a.clone(), b.clone()], &forward, &config).unwrap();
    let ba = assemble_files(&[b, a], &backward, &config).unwrap();

    assert_eq!(
        titles_and_starts(&ab.bookmarks),
        vec![("Alpha".to_string(), 0), ("Beta".to_string(), 1)]
    );
    assert_eq!(
        titles_and_starts(&ba.bookmarks),
        vec![("Beta".to_string(), 0), ("Alpha".to_string(), 2)]
    );
    assert_eq!(page_markers(&forward), vec!["Alpha-1", "Beta-1", "Beta-2"]);
    assert_eq!(page_markers(&backward), vec!["Beta-1", "Beta-2", "Alpha-1"]);
}

#[test]
fn merged_pages_keep_inherited_attributes() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("one.pdf");
    write_pdf(&input, 2, "one");
    let out = tmp.path().join("master.pdf");

    assemble_files(&[input], &out, &PipelineConfig::default()).unwrap();

    let doc = Document::load(&out).unwrap();
    for page_id in doc.get_pages().into_values() {
        let page = doc.get_dictionary(page_id).unwrap();
        assert!(page.has(b"Resources"), "page {page_id:?} lost its resources");
        assert!(page.has(b"MediaBox"), "page {page_id:?} lost its media box");
    }
}

#[test]
fn metadata_is_written_to_info_dictionary() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("01_Intro.pdf");
    write_pdf(&input, 1, "Intro");
    let out = tmp.path().join("master.pdf");
    let config = PipelineConfig::builder()
        .title("Handbook – 2024")
        .author("Docs Team")
        .producer("docbind-test")
        .build()
        .unwrap();

    assemble_files(&[input], &out, &config).unwrap();

    let summary = inspect(&out).unwrap();
    assert_eq!(summary.title.as_deref(), Some("Handbook – 2024"));
    assert_eq!(summary.author.as_deref(), Some("Docs Team"));
    assert_eq!(summary.producer.as_deref(), Some("docbind-test"));
}

#[test]
fn default_metadata_is_applied() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("a.pdf");
    write_pdf(&input, 1, "a");
    let out = tmp.path().join("master.pdf");

    assemble_files(&[input], &out, &PipelineConfig::default()).unwrap();

    let summary = inspect(&out).unwrap();
    assert_eq!(summary.title.as_deref(), Some("Master PDF Document"));
    assert_eq!(summary.author.as_deref(), Some("Automated Agent"));
}

#[test]
fn non_ascii_titles_survive() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("src.pdf");
    write_pdf(&input, 1, "x");
    let out = tmp.path().join("master.pdf");
    let items = vec![ConvertedItem::new("02_Résumé_Überblick.docx", &input)];

    let doc = assemble(&items, &out, &PipelineConfig::default()).unwrap();

    assert_eq!(doc.bookmarks[0].title, "Résumé Überblick");
    assert_eq!(inspect(&out).unwrap().bookmarks[0].title, "Résumé Überblick");
}

#[test]
fn output_directories_are_created() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("a.pdf");
    write_pdf(&input, 1, "a");
    let out = tmp.path().join("build/out/master.pdf");

    assemble_files(&[input], &out, &PipelineConfig::default()).unwrap();
    assert!(out.exists());
}

#[test]
fn existing_output_is_replaced() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("a.pdf");
    write_pdf(&input, 3, "a");
    let out = tmp.path().join("master.pdf");
    std::fs::write(&out, b"old contents").unwrap();

    assemble_files(&[input], &out, &PipelineConfig::default()).unwrap();
    assert_eq!(inspect(&out).unwrap().page_count, 3);
}

#[test]
fn empty_input_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("master.pdf");

    let err = assemble_files(&[], &out, &PipelineConfig::default()).unwrap_err();

    assert!(matches!(err, DocbindError::EmptyInput));
    assert!(!out.exists());
}

#[test]
fn unreadable_input_aborts_without_partial_output() {
    let tmp = TempDir::new().unwrap();
    let good = tmp.path().join("good.pdf");
    let bad = tmp.path().join("bad.pdf");
    write_pdf(&good, 2, "good");
    std::fs::write(&bad, b"%PDF-1.4\ngarbage without objects").unwrap();
    let out_dir = tmp.path().join("out");
    std::fs::create_dir(&out_dir).unwrap();
    let out = out_dir.join("master.pdf");

    let err = assemble_files(&[good, bad.clone()], &out, &PipelineConfig::default()).unwrap_err();

    match err {
        DocbindError::Merge { ref path, .. } => assert_eq!(path, &bad),
        other => panic!("expected Merge error, got {other:?}"),
    }
    assert_eq!(err.stage(), Stage::Assembly);
    assert!(!out.exists());
    assert!(leftover_temp_files(&out_dir).is_empty());
}

#[test]
fn missing_input_is_a_merge_error() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("master.pdf");

    let err = assemble_files(
        &[tmp.path().join("nope.pdf")],
        &out,
        &PipelineConfig::default(),
    )
    .unwrap_err();

    assert!(matches!(err, DocbindError::Merge { .. }));
    assert!(!out.exists());
}

#[test]
fn zero_page_input_is_a_merge_error() {
    let tmp = TempDir::new().unwrap();
    let empty = tmp.path().join("empty.pdf");
    write_pdf(&empty, 0, "empty");
    let out = tmp.path().join("master.pdf");

    let err = assemble_files(&[empty], &out, &PipelineConfig::default()).unwrap_err();

    match err {
        DocbindError::Merge { detail, .. } => assert!(detail.contains("no pages"), "{detail}"),
        other => panic!("expected Merge error, got {other:?}"),
    }
    assert!(!out.exists());
}

/// Give an existing fixture its own one-item outline and a `/Names` tree.
fn add_source_navigation(path: &Path) {
    let mut doc = Document::load(path).unwrap();
    let first_page = *doc.get_pages().values().next().unwrap();
    let catalog_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();

    let outlines_id = doc.new_object_id();
    let item_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Stale outline item"),
        "Parent" => outlines_id,
        "Dest" => vec![Object::Reference(first_page), "Fit".into()],
    });
    doc.objects.insert(
        outlines_id,
        Object::Dictionary(dictionary! {
            "Type" => "Outlines",
            "First" => item_id,
            "Last" => item_id,
            "Count" => 1,
        }),
    );
    let dests_id = doc.add_object(dictionary! {
        "Names" => vec![
            Object::string_literal("stale-destination"),
            vec![Object::Reference(first_page), "Fit".into()].into(),
        ],
    });
    let names_id = doc.add_object(dictionary! { "Dests" => dests_id });

    let catalog = doc.get_dictionary_mut(catalog_id).unwrap();
    catalog.set("Outlines", outlines_id);
    catalog.set("Names", names_id);
    doc.save(path).unwrap();
}

fn contains_string(doc: &Document, needle: &[u8]) -> bool {
    fn walk(object: &Object, needle: &[u8]) -> bool {
        match object {
            Object::String(bytes, _) => bytes.as_slice() == needle,
            Object::Array(items) => items.iter().any(|o| walk(o, needle)),
            Object::Dictionary(dict) => dict.iter().any(|(_, o)| walk(o, needle)),
            _ => false,
        }
    }
    doc.objects.values().any(|o| walk(o, needle))
}

#[test]
fn source_outlines_and_name_trees_are_not_carried_over() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("01_Source.pdf");
    write_pdf(&input, 2, "source");
    add_source_navigation(&input);
    let out = tmp.path().join("master.pdf");

    assemble_files(&[input], &out, &PipelineConfig::default()).unwrap();

    let merged = Document::load(&out).unwrap();
    assert!(!contains_string(&merged, b"Stale outline item"));
    assert!(!contains_string(&merged, b"stale-destination"));
    let summary = inspect(&out).unwrap();
    assert_eq!(summary.page_count, 2);
    assert_eq!(titles_and_starts(&summary.bookmarks), vec![("Source".to_string(), 0)]);
    assert_eq!(page_markers(&out), vec!["source-1", "source-2"]);
}

#[test]
fn inspect_rejects_non_pdf() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("notes.pdf");
    std::fs::write(&path, b"plain text").unwrap();

    assert!(matches!(
        inspect(&path),
        Err(DocbindError::CorruptPdf { .. })
    ));
}

#[test]
fn toc_lists_bookmarks_with_one_based_pages() {
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("01_Intro.pdf");
    let b = tmp.path().join("02_Body.pdf");
    write_pdf(&a, 2, "a");
    write_pdf(&b, 1, "b");
    let out = tmp.path().join("master.pdf");

    let doc = assemble_files(&[a, b], &out, &PipelineConfig::default()).unwrap();
    let toc = render_toc(&doc.bookmarks);

    assert!(toc.starts_with("Table of Contents"));
    let lines: Vec<&str> = toc.lines().skip(2).collect();
    assert!(lines[0].starts_with("Intro ") && lines[0].ends_with(" 1"), "{toc}");
    assert!(lines[1].starts_with("Body ") && lines[1].ends_with(" 3"), "{toc}");
}

// ── Orchestrator ─────────────────────────────────────────────────────────

#[test]
fn pipeline_merges_all_documents_in_name_order() {
    let input = source_dir(&[("03_End.docx", "1"), ("01_Intro.docx", "2"), ("02_Body.docx", "3")]);
    let work = TempDir::new().unwrap();
    let staging = work.path().join("staging");
    let out = work.path().join("master.pdf");

    let report = run_pipeline_with(&fake_convert, input.path(), &out, &config_with_staging(&staging))
        .unwrap();

    assert_eq!(report.state, PipelineState::Assembled);
    assert!(!report.is_degraded());
    assert_eq!(report.summary(), "3/3 converted");
    assert_eq!(report.document.total_pages, 6);
    assert_eq!(
        titles_and_starts(&report.document.bookmarks),
        vec![
            ("Intro".to_string(), 0),
            ("Body".to_string(), 2),
            ("End".to_string(), 5)
        ]
    );
    assert!(dir_is_empty(&staging), "staging area was not removed");
}

#[test]
fn one_failed_conversion_degrades_the_run() {
    let input = source_dir(&[("01_Intro.docx", "fail"), ("02_Body.docx", "3"), ("03_End.docx", "1")]);
    let work = TempDir::new().unwrap();
    let staging = work.path().join("staging");
    let out = work.path().join("master.pdf");

    let report = run_pipeline_with(&fake_convert, input.path(), &out, &config_with_staging(&staging))
        .unwrap();

    assert!(report.is_degraded());
    assert_eq!(report.summary(), "2/3 converted");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].item(), "01_Intro.docx");
    assert_eq!(
        titles_and_starts(&report.document.bookmarks),
        vec![("Body".to_string(), 0), ("End".to_string(), 3)]
    );
    assert_eq!(inspect(&out).unwrap().page_count, 4);
    assert!(dir_is_empty(&staging));
}

#[test]
fn all_conversions_failing_is_fatal() {
    let input = source_dir(&[("a.docx", "fail"), ("b.docx", "fail")]);
    let work = TempDir::new().unwrap();
    let staging = work.path().join("staging");
    let out = work.path().join("master.pdf");

    let err = run_pipeline_with(&fake_convert, input.path(), &out, &config_with_staging(&staging))
        .unwrap_err();

    match err {
        DocbindError::NoConversionsSucceeded {
            total,
            ref first_error,
        } => {
            assert_eq!(total, 2);
            assert!(first_error.contains("a.docx"), "{first_error}");
        }
        ref other => panic!("expected NoConversionsSucceeded, got {other:?}"),
    }
    assert_eq!(err.stage(), Stage::Conversion);
    assert!(!out.exists());
    assert!(dir_is_empty(&staging));
}

#[test]
fn success_ratio_threshold_is_enforced() {
    let input = source_dir(&[("a.docx", "1"), ("b.docx", "fail")]);
    let work = TempDir::new().unwrap();
    let staging = work.path().join("staging");
    let out = work.path().join("master.pdf");
    let config = PipelineConfig::builder()
        .staging_root(&staging)
        .min_success_ratio(1.0)
        .build()
        .unwrap();

    let err = run_pipeline_with(&fake_convert, input.path(), &out, &config).unwrap_err();

    assert!(matches!(
        err,
        DocbindError::InsufficientConversions {
            succeeded: 1,
            total: 2,
            ..
        }
    ));
    assert!(!out.exists());
    assert!(dir_is_empty(&staging));
}

#[test]
fn merge_failure_after_conversion_cleans_up() {
    let input = source_dir(&[("a.docx", "2"), ("b.docx", "corrupt")]);
    let work = TempDir::new().unwrap();
    let staging = work.path().join("staging");
    let out = work.path().join("master.pdf");

    let err = run_pipeline_with(&fake_convert, input.path(), &out, &config_with_staging(&staging))
        .unwrap_err();

    assert!(matches!(err, DocbindError::Merge { .. }), "{err:?}");
    assert!(!out.exists());
    assert!(dir_is_empty(&staging));
    assert!(leftover_temp_files(work.path()).is_empty());
}

#[test]
fn empty_directory_fails_before_staging() {
    let input = TempDir::new().unwrap();
    std::fs::write(input.path().join("notes.txt"), "not a document").unwrap();
    let work = TempDir::new().unwrap();
    let staging = work.path().join("staging");
    let out = work.path().join("master.pdf");
    let calls = Cell::new(0);
    let counting = |source: &SourceItem, dir: &Path| -> Result<PathBuf, ConversionError> {
        calls.set(calls.get() + 1);
        fake_convert(source, dir)
    };

    let err =
        run_pipeline_with(&counting, input.path(), &out, &config_with_staging(&staging)).unwrap_err();

    assert!(matches!(err, DocbindError::NoSourceDocuments { .. }));
    assert_eq!(err.stage(), Stage::Ingestion);
    assert_eq!(calls.get(), 0);
    assert!(!staging.exists());
    assert!(!out.exists());
}

#[test]
fn missing_input_directory_is_an_ingestion_error() {
    let work = TempDir::new().unwrap();
    let out = work.path().join("master.pdf");

    let err = run_pipeline_with(
        &fake_convert,
        work.path().join("missing"),
        &out,
        &PipelineConfig::default(),
    )
    .unwrap_err();

    assert!(matches!(err, DocbindError::InputNotFound { .. }));
    assert_eq!(err.stage(), Stage::Ingestion);
}

#[test]
fn lock_and_hidden_files_are_ignored() {
    let input = source_dir(&[
        ("~$01_Intro.docx", "fail"),
        (".hidden.docx", "fail"),
        ("01_Intro.docx", "1"),
    ]);
    let work = TempDir::new().unwrap();
    let out = work.path().join("master.pdf");

    let report = run_pipeline_with(
        &fake_convert,
        input.path(),
        &out,
        &config_with_staging(&work.path().join("staging")),
    )
    .unwrap();

    assert_eq!(report.total_items, 1);
    assert!(report.failures.is_empty());
}

#[test]
fn keep_numbering_leaves_prefixes_in_titles() {
    let input = source_dir(&[("01_Intro.docx", "1"), ("02_Body.docx", "1")]);
    let work = TempDir::new().unwrap();
    let out = work.path().join("master.pdf");
    let config = PipelineConfig::builder()
        .staging_root(work.path().join("staging"))
        .strip_order_prefix(false)
        .build()
        .unwrap();

    let report = run_pipeline_with(&fake_convert, input.path(), &out, &config).unwrap();

    let titles: Vec<&str> = report
        .document
        .bookmarks
        .iter()
        .map(|b| b.title.as_str())
        .collect();
    assert_eq!(titles, vec!["01 Intro", "02 Body"]);
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl PipelineProgressCallback for Recorder {
    fn on_pipeline_start(&self, total_items: usize) {
        self.push(format!("start {total_items}"));
    }
    fn on_item_converted(&self, _index: usize, _total: usize, name: &str) {
        self.push(format!("ok {name}"));
    }
    fn on_item_failed(&self, _index: usize, _total: usize, name: &str, _error: &str) {
        self.push(format!("fail {name}"));
    }
    fn on_conversion_complete(&self, total: usize, succeeded: usize) {
        self.push(format!("converted {succeeded}/{total}"));
    }
    fn on_assembly_complete(&self, total_pages: usize) {
        self.push(format!("assembled {total_pages}"));
    }
}

#[test]
fn progress_events_follow_the_run() {
    let input = source_dir(&[("a.docx", "2"), ("b.docx", "fail"), ("c.docx", "1")]);
    let work = TempDir::new().unwrap();
    let out = work.path().join("master.pdf");
    let recorder = Arc::new(Recorder::default());
    let config = PipelineConfig::builder()
        .staging_root(work.path().join("staging"))
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    run_pipeline_with(&fake_convert, input.path(), &out, &config).unwrap();

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start 3",
            "ok a.docx",
            "fail b.docx",
            "ok c.docx",
            "converted 2/3",
            "assembled 3"
        ]
    );
}

#[test]
fn report_serialises_to_json() {
    let input = source_dir(&[("a.docx", "1"), ("b.docx", "fail")]);
    let work = TempDir::new().unwrap();
    let out = work.path().join("master.pdf");

    let report = run_pipeline_with(
        &fake_convert,
        input.path(),
        &out,
        &config_with_staging(&work.path().join("staging")),
    )
    .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["state"], "Assembled");
    assert_eq!(json["converted_items"], 1);
    assert_eq!(json["document"]["bookmarks"][0]["title"], "a");
}
