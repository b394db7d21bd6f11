//! Configuration types for a batch conversion run.
//!
//! Everything the orchestration core needs to know is held by
//! [`BatchConfig`], built once via [`BatchConfigBuilder`] and then passed by
//! reference. Converter-specific knobs (OCR, model choice, device) do not
//! live here; they belong to whichever [`crate::transform::DocumentTransformer`]
//! the caller plugs in.

use crate::error::BatchError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// File extensions recognised by default.
pub const SUPPORTED_FORMATS: &[&str] = &[".pdf", ".docx", ".pptx", ".xlsx", ".html", ".md", ".txt"];

/// Default file name for the group of files sitting directly in the input root.
pub const DEFAULT_ROOT_OUTPUT_NAME: &str = "combined_documents.md";

/// Configuration for one batch run.
///
/// # Example
/// ```rust
/// use folder2md::BatchConfig;
///
/// let config = BatchConfig::builder()
///     .input_dir("imports")
///     .output_dir("exports")
///     .root_output_name("root.md")
///     .build()
///     .unwrap();
/// assert!(config.skip_already_converted);
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Directory scanned for documents. Default: `imports`.
    pub input_dir: PathBuf,

    /// Directory receiving combined Markdown files and the summary. Default: `exports`.
    pub output_dir: PathBuf,

    /// Output file name for files found directly in `input_dir`.
    /// Default: `combined_documents.md`.
    pub root_output_name: String,

    /// Recognised extensions, lowercase with a leading dot.
    pub supported_formats: BTreeSet<String>,

    /// Skip folders that already have an artifact in `output_dir`. Default: true.
    ///
    /// The check is name-based only. Files added to a folder after it was
    /// converted are not picked up until its artifact is removed.
    pub skip_already_converted: bool,

    /// How output artifacts are named. Default: [`ArtifactNaming::Plain`].
    pub artifact_naming: ArtifactNaming,

    /// Number of folders converted at the same time. Default: 1.
    ///
    /// Files inside one folder are always converted in order, one at a time.
    pub folder_concurrency: usize,

    /// Write `processing_summary_<ts>.md` at the end of the run. Default: true.
    pub write_summary: bool,

    /// Receives per-folder and per-file events while the run progresses.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("imports"),
            output_dir: PathBuf::from("exports"),
            root_output_name: DEFAULT_ROOT_OUTPUT_NAME.to_string(),
            supported_formats: SUPPORTED_FORMATS.iter().map(|s| s.to_string()).collect(),
            skip_already_converted: true,
            artifact_naming: ArtifactNaming::default(),
            folder_concurrency: 1,
            write_summary: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("root_output_name", &self.root_output_name)
            .field("supported_formats", &self.supported_formats)
            .field("skip_already_converted", &self.skip_already_converted)
            .field("artifact_naming", &self.artifact_naming)
            .field("folder_concurrency", &self.folder_concurrency)
            .field("write_summary", &self.write_summary)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RunProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder for `BatchConfig`.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::default(),
        }
    }

    /// Comma-separated, sorted list of supported extensions.
    pub fn formats_display(&self) -> String {
        self.supported_formats
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Builder for [`BatchConfig`].
#[derive(Debug)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn root_output_name(mut self, name: impl Into<String>) -> Self {
        self.config.root_output_name = name.into();
        self
    }

    /// Replace the supported extensions. `pdf`, `.PDF` and `.pdf` are equivalent.
    pub fn supported_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.supported_formats = formats
            .into_iter()
            .map(|f| normalise_extension(f.as_ref()))
            .filter(|f| f.len() > 1)
            .collect();
        self
    }

    pub fn skip_already_converted(mut self, v: bool) -> Self {
        self.config.skip_already_converted = v;
        self
    }

    pub fn artifact_naming(mut self, naming: ArtifactNaming) -> Self {
        self.config.artifact_naming = naming;
        self
    }

    /// Folders converted at once. `0` is treated as `1`.
    pub fn folder_concurrency(mut self, n: usize) -> Self {
        self.config.folder_concurrency = n.max(1);
        self
    }

    pub fn write_summary(mut self, v: bool) -> Self {
        self.config.write_summary = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, BatchError> {
        let c = &self.config;
        if c.supported_formats.is_empty() {
            return Err(BatchError::InvalidConfig(
                "At least one supported format is required".into(),
            ));
        }
        let root = c.root_output_name.trim();
        if root.is_empty() {
            return Err(BatchError::InvalidConfig(
                "Root output name must not be empty".into(),
            ));
        }
        if root.contains('/') || root.contains('\\') {
            return Err(BatchError::InvalidConfig(format!(
                "Root output name must be a file name, got '{}'",
                c.root_output_name
            )));
        }
        Ok(self.config)
    }
}

/// Lowercase an extension and make sure it starts with a dot.
pub fn normalise_extension(ext: &str) -> String {
    let ext = ext.trim().to_ascii_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Naming scheme for per-folder output artifacts.
///
/// | Variant | Root group | Subfolder `reports` |
/// |---------|------------|---------------------|
/// | `Plain` | `root_output_name` | `reports.md` |
/// | `Timestamped` | `root_output_name` | `reports_2024-01-01_09-30-00.md` |
///
/// Both forms are recognised by [`crate::ledger::ConversionLedger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArtifactNaming {
    /// `<folder>.md`, or the configured root output name. (default)
    #[default]
    Plain,
    /// `<sanitized folder>_<YYYY-MM-DD_HH-MM-SS>.md` using the run start time.
    /// The root group still uses the configured root output name.
    Timestamped,
}
