//! CLI binary for docbind.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `PipelineConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use docbind::{
    inspect, render_toc, run_pipeline, write_toc, PipelineConfig, PipelineProgressCallback,
    ProgressCallback, RunReport,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over the source documents, one log
/// line per document.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start of the document currently being converted.
    item_started: Mutex<Option<Instant>>,
    failed: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_pipeline_start` tells us how many documents there are.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Scanning");
        bar.set_message("Looking for documents…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            item_started: Mutex::new(None),
            failed: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Converting");
    }

    fn item_elapsed(&self) -> String {
        let secs = self
            .item_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        dim(&format!("{secs:.1}s"))
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_pipeline_start(&self, total_items: usize) {
        self.activate_bar(total_items);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_items} documents…"))
        ));
    }

    fn on_item_start(&self, _index: usize, _total: usize, name: &str) {
        if let Ok(mut t) = self.item_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(name.to_string());
    }

    fn on_item_converted(&self, index: usize, total: usize, name: &str) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index + 1,
            total,
            name,
            self.item_elapsed(),
        ));
        self.bar.inc(1);
    }

    fn on_item_failed(&self, index: usize, total: usize, name: &str, error: &str) {
        self.failed.fetch_add(1, Ordering::SeqCst);

        // Keep one line per document.
        let first_line = error.lines().next().unwrap_or(error);
        let msg = match first_line.char_indices().nth(79) {
            Some((idx, _)) => format!("{}\u{2026}", &first_line[..idx]),
            None => first_line.to_string(),
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            red("✗"),
            index + 1,
            total,
            name,
            red(&msg),
            self.item_elapsed(),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total: usize, succeeded: usize) {
        let failed = total.saturating_sub(succeeded);
        if failed == 0 {
            self.bar.println(format!(
                "{} {} documents converted",
                green("✔"),
                bold(&succeeded.to_string())
            ));
        } else {
            self.bar.println(format!(
                "{} {}/{} documents converted  ({} failed)",
                if succeeded == 0 { red("✘") } else { cyan("⚠") },
                bold(&succeeded.to_string()),
                total,
                red(&failed.to_string()),
            ));
        }
    }

    fn on_assembly_start(&self, items: usize) {
        self.bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        self.bar.set_prefix("Merging");
        self.bar.set_message(format!("{items} PDFs"));
    }

    fn on_assembly_complete(&self, _total_pages: usize) {
        self.bar.finish_and_clear();
    }
}

impl Drop for CliProgressCallback {
    fn drop(&mut self) {
        // A failed run never reaches `on_assembly_complete`.
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Merge every .docx in chapters/ into master.pdf
  docbind chapters/

  # Custom output, title and author
  docbind chapters/ -o handbook.pdf --title "Employee Handbook" --author "HR"

  # Word 97 and OpenDocument files too
  docbind chapters/ --extensions docx,doc,odt

  # Fail unless every document converts
  docbind chapters/ --min-success-ratio 1.0

  # Also write a plain-text table of contents
  docbind chapters/ --toc contents.txt

  # Show page count, metadata and bookmarks of an existing PDF
  docbind --inspect-only master.pdf

  # Machine-readable run report
  docbind --json chapters/ > report.json

ORDERING:
  Documents are merged in case-insensitive file-name order. Prefix names
  with numbers (01_Intro.docx, 02_Body.docx) to control the order; the
  number is dropped from the bookmark title unless --keep-numbering is set.

REQUIREMENTS:
  LibreOffice (or OpenOffice) must be installed; `soffice` is run headless
  for every document. Use --soffice to point at a specific executable.

ENVIRONMENT VARIABLES:
  Every option can also be set with a DOCBIND_* variable, e.g.
  DOCBIND_OUTPUT, DOCBIND_SOFFICE, DOCBIND_TIMEOUT.
  RUST_LOG overrides the log filter.
"#;

/// Convert a directory of documents into one bookmarked PDF.
#[derive(Parser, Debug)]
#[command(
    name = "docbind",
    version,
    about = "Convert a directory of documents into one bookmarked PDF",
    long_about = "Convert every word-processing document in a directory to PDF with a headless \
office suite, then merge the results into a single PDF with one bookmark per source document \
pointing at its first page.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory of source documents (or a PDF with --inspect-only).
    input: PathBuf,

    /// Merged PDF to write.
    #[arg(short, long, env = "DOCBIND_OUTPUT", default_value = "master.pdf")]
    output: PathBuf,

    /// Document title written into the PDF metadata.
    #[arg(long, env = "DOCBIND_TITLE")]
    title: Option<String>,

    /// Document author written into the PDF metadata.
    #[arg(long, env = "DOCBIND_AUTHOR")]
    author: Option<String>,

    /// Producer written into the PDF metadata.
    #[arg(long, env = "DOCBIND_PRODUCER")]
    producer: Option<String>,

    /// Source file extensions, comma-separated.
    #[arg(long, env = "DOCBIND_EXTENSIONS", value_delimiter = ',', default_value = "docx")]
    extensions: Vec<String>,

    /// Keep numeric ordering prefixes (01_, 2. ) in bookmark titles.
    #[arg(long, env = "DOCBIND_KEEP_NUMBERING")]
    keep_numbering: bool,

    /// Minimum fraction of documents that must convert (0.0–1.0).
    #[arg(long, env = "DOCBIND_MIN_SUCCESS_RATIO", default_value_t = 0.0)]
    min_success_ratio: f64,

    /// Parent directory for the temporary staging area.
    #[arg(long, env = "DOCBIND_STAGING_DIR")]
    staging_dir: Option<PathBuf>,

    /// Office-suite executable.
    #[arg(long, env = "DOCBIND_SOFFICE", default_value = "soffice")]
    soffice: PathBuf,

    /// Per-document conversion timeout in seconds.
    #[arg(long, env = "DOCBIND_TIMEOUT")]
    timeout: Option<u64>,

    /// Also write a plain-text table of contents to this file.
    #[arg(long, env = "DOCBIND_TOC")]
    toc: Option<PathBuf>,

    /// Print the run report (or inspection result) as JSON on stdout.
    #[arg(long, env = "DOCBIND_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCBIND_NO_PROGRESS")]
    no_progress: bool,

    /// Print page count, metadata and bookmarks of an existing PDF.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCBIND_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCBIND_QUIET")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; --verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let summary = inspect(&cli.input).context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
            );
        } else {
            println!("File:         {}", cli.input.display());
            if let Some(ref t) = summary.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = summary.author {
                println!("Author:       {}", a);
            }
            if let Some(ref p) = summary.producer {
                println!("Producer:     {}", p);
            }
            println!("Pages:        {}", summary.page_count);
            println!("PDF Version:  {}", summary.pdf_version);
            if !summary.bookmarks.is_empty() {
                println!();
                print!("{}", render_toc(&summary.bookmarks));
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run pipeline ─────────────────────────────────────────────────────
    let report = run_pipeline(&cli.input, &cli.output, &config).with_context(|| {
        format!(
            "Failed to build '{}' from '{}'",
            cli.output.display(),
            cli.input.display()
        )
    })?;

    if let Some(ref toc_path) = cli.toc {
        write_toc(&report.document.bookmarks, toc_path)
            .with_context(|| format!("Failed to write table of contents to {:?}", toc_path))?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&report);
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .extensions(cli.extensions.iter().cloned())
        .strip_order_prefix(!cli.keep_numbering)
        .min_success_ratio(cli.min_success_ratio)
        .soffice_path(&cli.soffice);

    if let Some(ref title) = cli.title {
        builder = builder.title(title);
    }
    if let Some(ref author) = cli.author {
        builder = builder.author(author);
    }
    if let Some(ref producer) = cli.producer {
        builder = builder.producer(producer);
    }
    if let Some(ref dir) = cli.staging_dir {
        builder = builder.staging_root(dir);
    }
    if let Some(secs) = cli.timeout {
        builder = builder.convert_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(report: &RunReport) {
    let doc = &report.document;
    eprintln!(
        "{}  {}  {} pages  {} bookmarks  {}ms  →  {}",
        if report.is_degraded() {
            cyan("⚠")
        } else {
            green("✔")
        },
        report.summary(),
        doc.total_pages,
        doc.bookmarks.len(),
        report.stats.total_duration_ms,
        bold(&doc.output_path.display().to_string()),
    );
    for failure in &report.failures {
        eprintln!("   {} {}", red("skipped"), dim(&failure.to_string()));
    }
}
