//! Configuration types for a pipeline run.
//!
//! All run behaviour is controlled through [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. The same config is shared by the ingestor, the
//! bundled converter, and the assembler, so one struct describes a run
//! end to end.

use crate::error::DocbindError;
use crate::output::DocumentMetadata;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Configuration for one directory-to-PDF run.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use docbind::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .extensions(["docx", "doc"])
///     .title("Quarterly Report")
///     .min_success_ratio(0.5)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// File extensions (without the dot) picked up by the ingestor.
    /// Matched case-insensitively. Default: `["docx"]`.
    pub extensions: Vec<String>,

    /// Info dictionary written into the merged PDF.
    pub metadata: DocumentMetadata,

    /// Drop a leading numeric ordering prefix (`01_`, `3. `) from bookmark
    /// titles. Default: true.
    ///
    /// Files are usually numbered to force their order on disk; the number
    /// is noise in the outline. A name that is only a number keeps it.
    pub strip_order_prefix: bool,

    /// Minimum fraction of documents that must convert for the run to
    /// proceed to assembly. Range 0.0–1.0. Default: 0.0.
    ///
    /// Zero successes always fail the run regardless of this value. The
    /// default accepts any non-empty subset and reports the shortfall as a
    /// degraded success; raise it to 1.0 to make every conversion failure
    /// fatal.
    pub min_success_ratio: f64,

    /// Parent directory for the per-run staging area. Default: system temp dir.
    pub staging_root: Option<PathBuf>,

    /// Office-suite executable used by [`crate::pipeline::convert::SofficeConverter`].
    /// Default: `soffice`.
    pub soffice_path: PathBuf,

    /// Per-document conversion timeout in seconds. Default: none.
    pub convert_timeout_secs: Option<u64>,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["docx".to_string()],
            metadata: DocumentMetadata::default(),
            strip_order_prefix: true,
            min_success_ratio: 0.0,
            staging_root: None,
            soffice_path: PathBuf::from("soffice"),
            convert_timeout_secs: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("extensions", &self.extensions)
            .field("metadata", &self.metadata)
            .field("strip_order_prefix", &self.strip_order_prefix)
            .field("min_success_ratio", &self.min_success_ratio)
            .field("staging_root", &self.staging_root)
            .field("soffice_path", &self.soffice_path)
            .field("convert_timeout_secs", &self.convert_timeout_secs)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.extensions = extensions
            .into_iter()
            .map(|e| {
                let e: String = e.into();
                e.trim().trim_start_matches('.').to_ascii_lowercase()
            })
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    pub fn metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.config.metadata = metadata;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.metadata.title = title.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.config.metadata.author = author.into();
        self
    }

    pub fn producer(mut self, producer: impl Into<String>) -> Self {
        self.config.metadata.producer = producer.into();
        self
    }

    pub fn strip_order_prefix(mut self, v: bool) -> Self {
        self.config.strip_order_prefix = v;
        self
    }

    pub fn min_success_ratio(mut self, ratio: f64) -> Self {
        self.config.min_success_ratio = ratio;
        self
    }

    pub fn staging_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.staging_root = Some(dir.into());
        self
    }

    pub fn soffice_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.soffice_path = path.into();
        self
    }

    pub fn convert_timeout_secs(mut self, secs: u64) -> Self {
        self.config.convert_timeout_secs = Some(secs.max(1));
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, DocbindError> {
        let c = &self.config;
        if c.extensions.is_empty() {
            return Err(DocbindError::InvalidConfig(
                "At least one source extension is required".into(),
            ));
        }
        if !(0.0..=1.0).contains(&c.min_success_ratio) {
            return Err(DocbindError::InvalidConfig(format!(
                "Minimum success ratio must be 0.0–1.0, got {}",
                c.min_success_ratio
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = PipelineConfig::default();
        assert_eq!(c.extensions, vec!["docx"]);
        assert!(c.strip_order_prefix);
        assert_eq!(c.min_success_ratio, 0.0);
        assert!(c.staging_root.is_none());
    }

    #[test]
    fn extensions_are_normalised() {
        let c = PipelineConfig::builder()
            .extensions([".DOCX", " doc ", ""])
            .build()
            .unwrap();
        assert_eq!(c.extensions, vec!["docx", "doc"]);
    }

    #[test]
    fn empty_extensions_rejected() {
        let err = PipelineConfig::builder()
            .extensions(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, DocbindError::InvalidConfig(_)));
    }

    #[test]
    fn ratio_out_of_range_rejected() {
        assert!(PipelineConfig::builder()
            .min_success_ratio(1.5)
            .build()
            .is_err());
        assert!(PipelineConfig::builder()
            .min_success_ratio(-0.1)
            .build()
            .is_err());
        assert!(PipelineConfig::builder()
            .min_success_ratio(1.0)
            .build()
            .is_ok());
    }

    #[test]
    fn metadata_setters() {
        let c = PipelineConfig::builder()
            .title("Handbook")
            .author("Docs Team")
            .producer("docbind-test")
            .build()
            .unwrap();
        assert_eq!(c.metadata.title, "Handbook");
        assert_eq!(c.metadata.author, "Docs Team");
        assert_eq!(c.metadata.producer, "docbind-test");
    }

    #[test]
    fn debug_hides_callback() {
        let dbg = format!("{:?}", PipelineConfig::default());
        assert!(dbg.contains("PipelineConfig"));
        assert!(dbg.contains("soffice"));
    }
}
