//! Conversion: turn each source document into a single-document PDF.
//!
//! The [`Converter`] trait is the seam between the pipeline and whatever
//! actually renders documents. [`SofficeConverter`] drives a headless office
//! suite; tests and embedders can pass any closure with the same shape.
//!
//! ## Sequential conversion
//!
//! An office-suite session holds a lock on its profile directory; two
//! conversions against the same profile at once fail. [`convert_all`] runs
//! one document at a time and isolates each failure instead of aborting the
//! batch.

use crate::config::PipelineConfig;
use crate::error::ConversionError;
use crate::output::{ConvertedItem, SourceItem};
use crate::progress::ProgressCallback;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Renders one source document into one PDF inside `staging_dir`.
///
/// Returns the path of the produced PDF. A failure only affects this item.
pub trait Converter {
    fn convert(&self, source: &SourceItem, staging_dir: &Path) -> Result<PathBuf, ConversionError>;
}

impl<F> Converter for F
where
    F: Fn(&SourceItem, &Path) -> Result<PathBuf, ConversionError>,
{
    fn convert(&self, source: &SourceItem, staging_dir: &Path) -> Result<PathBuf, ConversionError> {
        self(source, staging_dir)
    }
}

/// Result of converting a whole batch.
#[derive(Debug, Default)]
pub struct ConversionBatch {
    /// Successful conversions, in the order the sources were given.
    pub converted: Vec<ConvertedItem>,
    /// Failed conversions, in the order the sources were given.
    pub failures: Vec<ConversionError>,
}

/// Convert every item in order, collecting successes and failures separately.
///
/// Never fails as a whole; the caller decides what an empty or short
/// `converted` list means.
pub fn convert_all<C: Converter + ?Sized>(
    converter: &C,
    items: &[SourceItem],
    staging_dir: &Path,
    progress: Option<&ProgressCallback>,
) -> ConversionBatch {
    let total = items.len();
    let mut batch = ConversionBatch::default();

    for (index, item) in items.iter().enumerate() {
        if let Some(cb) = progress {
            cb.on_item_start(index, total, &item.display_name);
        }
        info!("Converting {} ({}/{})", item.display_name, index + 1, total);

        match converter.convert(item, staging_dir) {
            Ok(pdf_path) => {
                debug!("{} → {}", item.display_name, pdf_path.display());
                if let Some(cb) = progress {
                    cb.on_item_converted(index, total, &item.display_name);
                }
                batch
                    .converted
                    .push(ConvertedItem::new(item.display_name.clone(), pdf_path));
            }
            Err(e) => {
                warn!("Skipping {} due to error: {}", item.display_name, e);
                if let Some(cb) = progress {
                    cb.on_item_failed(index, total, &item.display_name, &e.to_string());
                }
                batch.failures.push(e);
            }
        }
    }

    if let Some(cb) = progress {
        cb.on_conversion_complete(total, batch.converted.len());
    }
    batch
}

/// Converts documents with a headless LibreOffice / OpenOffice `soffice`.
///
/// Each item gets its own subdirectory of the staging area, named after its
/// discovery rank, so two sources with the same stem never overwrite each
/// other's PDF. The office profile also lives in the staging area so a
/// desktop instance the user has open does not block the conversion.
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl SofficeConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        let converter = Self::new(&config.soffice_path);
        match config.convert_timeout_secs {
            Some(secs) => converter.with_timeout(Duration::from_secs(secs)),
            None => converter,
        }
    }

    /// Wait for the child, killing it once the timeout expires.
    fn wait(
        &self,
        child: &mut std::process::Child,
        name: &str,
    ) -> Result<ExitStatus, ConversionError> {
        let io_failed = |e: std::io::Error| ConversionError::Other {
            name: name.to_string(),
            detail: format!("waiting for converter: {e}"),
        };

        let Some(timeout) = self.timeout else {
            return child.wait().map_err(io_failed);
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait().map_err(io_failed)? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                // The child may have exited between the poll and the kill.
                let _ = child.kill();
                let _ = child.wait();
                return Err(ConversionError::Timeout {
                    name: name.to_string(),
                    secs: timeout.as_secs(),
                });
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    }
}

impl Default for SofficeConverter {
    fn default() -> Self {
        Self::new("soffice")
    }
}

impl Converter for SofficeConverter {
    fn convert(&self, source: &SourceItem, staging_dir: &Path) -> Result<PathBuf, ConversionError> {
        let name = source.display_name.as_str();
        let item_dir = staging_dir.join(format!("{:04}", source.rank));
        let profile_dir = staging_dir.join("profile");
        let profile_dir = if profile_dir.is_relative() {
            std::env::current_dir()
                .map(|cwd| cwd.join(&profile_dir))
                .unwrap_or(profile_dir)
        } else {
            profile_dir
        };
        std::fs::create_dir_all(&item_dir).map_err(|e| ConversionError::Other {
            name: name.to_string(),
            detail: format!("creating {}: {e}", item_dir.display()),
        })?;

        let log_path = item_dir.join("converter.log");
        let log = File::create(&log_path).map_err(|e| ConversionError::Other {
            name: name.to_string(),
            detail: format!("creating {}: {e}", log_path.display()),
        })?;
        let log_err = log.try_clone().map_err(|e| ConversionError::Other {
            name: name.to_string(),
            detail: e.to_string(),
        })?;

        let source_path = source
            .path
            .canonicalize()
            .unwrap_or_else(|_| source.path.clone());
        let mut child = Command::new(&self.program)
            .arg(format!("-env:UserInstallation={}", file_url(&profile_dir)))
            .args(["--headless", "--norestore", "--convert-to", "pdf", "--outdir"])
            .arg(&item_dir)
            .arg(&source_path)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .spawn()
            .map_err(|e| ConversionError::LaunchFailed {
                name: name.to_string(),
                detail: format!("{}: {e}", self.program.display()),
            })?;

        let status = self.wait(&mut child, name)?;
        if !status.success() {
            return Err(ConversionError::ConverterFailed {
                name: name.to_string(),
                status: status.to_string(),
                detail: read_log_tail(&log_path),
            });
        }

        let pdf_path = locate_output(&item_dir, &source.path);
        validate_pdf(name, &pdf_path)?;
        Ok(pdf_path)
    }
}

/// `file://` URL for an absolute path, as the office suite expects it.
///
/// Backslashes become slashes, drive paths gain a leading `/`
/// (`C:\x` → `file:///C:/x`), and bytes outside the unreserved set are
/// percent-encoded.
fn file_url(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    let mut url = String::from("file://");
    if !path.starts_with('/') {
        url.push('/');
    }
    for b in path.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' | b':' => {
                url.push(b as char)
            }
            _ => url.push_str(&format!("%{b:02X}")),
        }
    }
    url
}

/// The converter names its output after the source stem; fall back to any
/// PDF it left in the item directory.
fn locate_output(item_dir: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let expected = item_dir.join(format!("{stem}.pdf"));
    if expected.exists() {
        return expected;
    }

    std::fs::read_dir(item_dir)
        .ok()
        .and_then(|entries| {
            entries.filter_map(Result::ok).map(|e| e.path()).find(|p| {
                p.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                    .unwrap_or(false)
            })
        })
        .unwrap_or(expected)
}

/// Check the produced file exists, is non-empty, and starts with `%PDF`.
pub fn validate_pdf(name: &str, path: &Path) -> Result<(), ConversionError> {
    let missing = || ConversionError::MissingOutput {
        name: name.to_string(),
        path: path.to_path_buf(),
    };

    let mut f = File::open(path).map_err(|_| missing())?;
    let mut magic = [0u8; 4];
    match f.read_exact(&mut magic) {
        Ok(()) if &magic == b"%PDF" => Ok(()),
        Ok(()) => Err(ConversionError::NotAPdf {
            name: name.to_string(),
            magic,
        }),
        // Shorter than four bytes, including empty.
        Err(_) => Err(missing()),
    }
}

/// Last few hundred bytes of the converter's output, for error messages.
fn read_log_tail(path: &Path) -> String {
    const TAIL: usize = 400;
    let text = std::fs::read_to_string(path).unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return "no output".to_string();
    }
    match text.char_indices().rev().nth(TAIL) {
        Some((idx, _)) => format!("\u{2026}{}", &text[idx..]),
        None => text.to_string(),
    }
}
