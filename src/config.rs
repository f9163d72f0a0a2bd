//! Configuration types for a batch image-processing run.
//!
//! All run behaviour is controlled through [`ProcessConfig`], built via its
//! [`ProcessConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to hold two independent parameter sets side by side (one for
//! document-scope runs, one for collection-wide runs — see [`Profiles`]),
//! serialise them for logging, and diff two runs to understand why their
//! outputs differ.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor breaks on every new field. The builder lets
//! callers set only what they care about and rely on documented defaults,
//! and concentrates validation in [`ProcessConfigBuilder::build`] so that a
//! bad configuration is a fatal setup error before any file is touched.

use crate::error::ImgSyncError;
use crate::progress::RunProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The breadth of a run: one note, one folder, or the whole collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// Process every image referenced by a single note; rewrite links in
    /// that note only.
    Note(String),
    /// Process every image file directly under a folder (recursing when
    /// `recursive` is set). Folder scope never consults document content
    /// and therefore never rewrites links.
    Folder { path: String, recursive: bool },
    /// Process every image referenced by any note or canvas document in the
    /// vault; rewrite links in every referring document.
    Collection,
}

/// Output format for a conversion run.
///
/// `Disabled` is the passthrough sentinel: no format conversion happens and
/// files keep their extension (quality/resize may still re-encode in place).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// No format conversion.
    #[default]
    Disabled,
    Webp,
    Jpeg,
    Png,
}

impl OutputFormat {
    /// The extension written for this format, `None` for the passthrough
    /// sentinel.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            OutputFormat::Disabled => None,
            OutputFormat::Webp => Some("webp"),
            OutputFormat::Jpeg => Some("jpg"),
            OutputFormat::Png => Some("png"),
        }
    }

    /// Extensions that already count as this format. `jpg` and `jpeg` are
    /// one format: converting between them is not a rename.
    pub fn matches_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        match self {
            OutputFormat::Disabled => false,
            OutputFormat::Webp => ext == "webp",
            OutputFormat::Jpeg => ext == "jpg" || ext == "jpeg",
            OutputFormat::Png => ext == "png",
        }
    }

    /// True for the passthrough sentinel.
    pub fn is_disabled(&self) -> bool {
        matches!(self, OutputFormat::Disabled)
    }
}

impl FromStr for OutputFormat {
    type Err = ImgSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disabled" | "none" | "keep" => Ok(OutputFormat::Disabled),
            "webp" => Ok(OutputFormat::Webp),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            other => Err(ImgSyncError::InvalidConfig(format!(
                "Unknown output format: '{other}'"
            ))),
        }
    }
}

/// How to resize an image before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResizeMode {
    /// Keep original dimensions (default).
    #[default]
    None,
    /// Scale to an exact width, height following proportionally.
    Width(u32),
    /// Scale to an exact height, width following proportionally.
    Height(u32),
    /// Scale so the longer side equals the given value.
    LongestEdge(u32),
    /// Scale so the shorter side equals the given value.
    ShortestEdge(u32),
    /// Scale to fit within a bounding box, preserving aspect ratio.
    Fit { width: u32, height: u32 },
}

/// Whether a resize may enlarge, reduce, or do either.
///
/// `ReduceOnly` is what vault users usually want: cap oversized photos
/// without blurring small icons up to the target size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalePolicy {
    /// Apply the resize in both directions.
    #[default]
    Auto,
    /// Only shrink images larger than the target.
    ReduceOnly,
    /// Only grow images smaller than the target.
    EnlargeOnly,
}

/// How the renamer handles an existing file at the destination name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictMode {
    /// Keep the desired name; an existing same-named file is overwritten so
    /// the processed bytes occupy that name.
    Reuse,
    /// Probe `name-1.ext`, `name-2.ext`, … until a free name is found.
    #[default]
    Increment,
}

/// Configuration for one batch image-processing run.
///
/// Built via [`ProcessConfig::builder()`] or [`ProcessConfig::default()`].
///
/// # Example
/// ```rust
/// use vault_imgsync::{OutputFormat, ProcessConfig, ResizeMode};
///
/// let config = ProcessConfig::builder()
///     .format(OutputFormat::Webp)
///     .quality(0.8)
///     .resize(ResizeMode::LongestEdge(1600))
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ProcessConfig {
    /// Target format. `Disabled` means no conversion and no rename. Default:
    /// `Disabled`.
    pub format: OutputFormat,

    /// Quality multiplier in `0.0..=1.0`. Default: 0.75.
    ///
    /// 1.0 is the lossless-passthrough sentinel the early no-op law checks:
    /// with format `Disabled` and no resize, a quality of exactly 1.0 means
    /// nothing in the vault could change, so the run does no work at all.
    pub quality: f32,

    /// Resize request applied before encoding. Default: [`ResizeMode::None`].
    pub resize: ResizeMode,

    /// Enlarge/reduce policy for the resize. Default: [`ScalePolicy::Auto`].
    pub scale_policy: ScalePolicy,

    /// Extensions never processed, matched case-insensitively. Parse a user
    /// string with [`parse_skip_list`]. Default: empty.
    pub skip_formats: Vec<String>,

    /// Skip images whose extension already matches [`Self::format`].
    /// Default: false.
    pub skip_if_target_format: bool,

    /// Destination-name conflict handling. Default:
    /// [`ConflictMode::Increment`].
    pub conflict_mode: ConflictMode,

    /// Progress callback fired as the run advances. Default: none.
    pub progress_callback: Option<Arc<dyn RunProgressCallback>>,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Disabled,
            quality: 0.75,
            resize: ResizeMode::None,
            scale_policy: ScalePolicy::Auto,
            skip_formats: Vec::new(),
            skip_if_target_format: false,
            conflict_mode: ConflictMode::Increment,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ProcessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessConfig")
            .field("format", &self.format)
            .field("quality", &self.quality)
            .field("resize", &self.resize)
            .field("scale_policy", &self.scale_policy)
            .field("skip_formats", &self.skip_formats)
            .field("skip_if_target_format", &self.skip_if_target_format)
            .field("conflict_mode", &self.conflict_mode)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl ProcessConfig {
    /// Create a new builder for `ProcessConfig`.
    pub fn builder() -> ProcessConfigBuilder {
        ProcessConfigBuilder {
            config: Self::default(),
        }
    }

    /// The early no-op law: with no conversion, quality 1.0 and no resize,
    /// nothing could change, so a run performs zero reads, zero renames and
    /// zero writes. Checked before scanning anything.
    pub fn is_noop(&self) -> bool {
        self.format.is_disabled() && self.quality >= 1.0 && self.resize == ResizeMode::None
    }
}

/// Builder for [`ProcessConfig`].
#[derive(Debug)]
pub struct ProcessConfigBuilder {
    config: ProcessConfig,
}

impl ProcessConfigBuilder {
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn quality(mut self, quality: f32) -> Self {
        self.config.quality = quality;
        self
    }

    pub fn resize(mut self, resize: ResizeMode) -> Self {
        self.config.resize = resize;
        self
    }

    pub fn scale_policy(mut self, policy: ScalePolicy) -> Self {
        self.config.scale_policy = policy;
        self
    }

    pub fn skip_formats(mut self, formats: Vec<String>) -> Self {
        self.config.skip_formats = formats;
        self
    }

    pub fn skip_if_target_format(mut self, v: bool) -> Self {
        self.config.skip_if_target_format = v;
        self
    }

    pub fn conflict_mode(mut self, mode: ConflictMode) -> Self {
        self.config.conflict_mode = mode;
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn RunProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ProcessConfig, ImgSyncError> {
        let c = &self.config;
        if !(0.0..=1.0).contains(&c.quality) {
            return Err(ImgSyncError::InvalidConfig(format!(
                "Quality must be within 0.0..=1.0, got {}",
                c.quality
            )));
        }
        let zero_dim = match c.resize {
            ResizeMode::None => false,
            ResizeMode::Width(n)
            | ResizeMode::Height(n)
            | ResizeMode::LongestEdge(n)
            | ResizeMode::ShortestEdge(n) => n == 0,
            ResizeMode::Fit { width, height } => width == 0 || height == 0,
        };
        if zero_dim {
            return Err(ImgSyncError::InvalidConfig(
                "Resize dimensions must be non-zero".into(),
            ));
        }
        Ok(self.config)
    }
}

/// The two independent parameter sets the host keeps: one for
/// document-scope runs, one for collection-wide runs. Folder runs use the
/// document set, matching how the host exposes them next to single-note
/// actions.
#[derive(Debug, Clone, Default)]
pub struct Profiles {
    pub document: ProcessConfig,
    pub collection: ProcessConfig,
}

impl Profiles {
    /// Select the parameter set for a scope.
    pub fn for_scope(&self, scope: &Scope) -> &ProcessConfig {
        match scope {
            Scope::Note(_) | Scope::Folder { .. } => &self.document,
            Scope::Collection => &self.collection,
        }
    }
}

/// Parse a user-supplied comma-separated skip list into normalised
/// lowercase extensions. Empty segments and stray dots are dropped.
pub fn parse_skip_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
