//! Configuration structures and constants for the vidtree-core library.
//!
//! A `CoreConfig` is created by the consumer of the library (the CLI) and
//! handed to the batch orchestrator at construction. Nothing in the core
//! reads configuration from globals.

mod builder;

use crate::error::{CoreError, CoreResult};

use std::path::{Path, PathBuf};
use std::time::Duration;

pub use builder::CoreConfigBuilder;

// Default constants

/// Default CRF quality for H.264 compression. Lower values produce higher
/// quality but larger files.
pub const DEFAULT_CRF: u8 = 23;

/// Highest CRF accepted by libx264.
pub const MAX_CRF: u8 = 51;

/// CRF range that gives sensible results for this workload.
pub const PRACTICAL_CRF_RANGE: std::ops::RangeInclusive<u8> = 18..=35;

/// Default libx264 speed preset.
pub const DEFAULT_PRESET: &str = "medium";

/// Default AAC audio bitrate for compression.
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";

/// Default maximum clip duration for trimming, in seconds.
pub const DEFAULT_MAX_DURATION_SECS: f64 = 7.0;

/// Video extensions recognized by default (matched case-insensitively).
pub const DEFAULT_EXTENSIONS: &[&str] = &[".mp4", ".mkv", ".avi", ".mov", ".wmv", ".flv", ".webm"];

/// libx264 presets, fastest first.
pub const X264_PRESETS: &[&str] = &[
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
    "placebo",
];

/// Parameters for the compress transform.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressSettings {
    /// Constant rate factor passed to libx264
    pub crf: u8,
    /// libx264 speed preset ("slow", "medium", ...)
    pub preset: String,
    /// AAC bitrate in ffmpeg notation ("128k")
    pub audio_bitrate: String,
}

impl Default for CompressSettings {
    fn default() -> Self {
        Self {
            crf: DEFAULT_CRF,
            preset: DEFAULT_PRESET.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
        }
    }
}

/// Parameters for the trim transform.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimSettings {
    /// Files longer than this are cut at this mark
    pub max_duration_secs: f64,
}

impl Default for TrimSettings {
    fn default() -> Self {
        Self {
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
        }
    }
}

/// Which transformation a batch run applies. Exactly one per run.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformPolicy {
    Compress(CompressSettings),
    Trim(TrimSettings),
    Passthrough,
}

impl TransformPolicy {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Compress(_) => "compress",
            Self::Trim(_) => "trim",
            Self::Passthrough => "copy",
        }
    }

    /// Suffix used for the default output root (`<root>_<suffix>`).
    #[must_use]
    pub fn output_suffix(&self) -> &'static str {
        match self {
            Self::Compress(_) => "compressed",
            Self::Trim(_) => "cropped",
            Self::Passthrough => "copied",
        }
    }

    /// Whether the decision rule needs a probed duration.
    #[must_use]
    pub fn needs_probe(&self) -> bool {
        matches!(self, Self::Trim(_))
    }

    /// Whether the policy invokes ffmpeg at all.
    #[must_use]
    pub fn needs_ffmpeg(&self) -> bool {
        !matches!(self, Self::Passthrough)
    }
}

/// Main configuration structure for the vidtree-core library.
///
/// All fields have defaults, so only the path fields normally need to be
/// set. `CoreConfigBuilder` offers a fluent alternative.
///
/// # Examples
///
/// ```rust
/// use vidtree_core::config::{CoreConfig, TransformPolicy, TrimSettings};
/// use std::path::PathBuf;
///
/// let mut config = CoreConfig::new(PathBuf::from("/videos"), PathBuf::from("/videos_cropped"));
/// config.policy = TransformPolicy::Trim(TrimSettings { max_duration_secs: 7.0 });
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Root of the source tree to walk
    pub input_dir: PathBuf,

    /// Root of the mirrored output tree
    pub output_dir: PathBuf,

    /// Directory for log and summary files
    pub log_dir: PathBuf,

    /// Recognized extensions, lowercase with a leading dot
    pub extensions: Vec<String>,

    /// Transformation applied to every matching file
    pub policy: TransformPolicy,

    /// Replace the destination extension (e.g. "mp4"); `None` keeps the name
    pub output_extension: Option<String>,

    /// Keep non-empty destinations from a previous run instead of redoing them
    pub skip_existing: bool,

    /// Number of concurrent workers (1 = sequential)
    pub jobs: usize,

    /// Upper bound for each external tool invocation
    pub tool_timeout: Option<Duration>,

    /// ffmpeg binary name or path
    pub ffmpeg_path: String,

    /// ffprobe binary name or path
    pub ffprobe_path: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            log_dir: PathBuf::from("."),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            policy: TransformPolicy::Passthrough,
            output_extension: None,
            skip_existing: false,
            jobs: 1,
            tool_timeout: None,
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
        }
    }
}

impl CoreConfig {
    /// Creates a configuration for the given roots with default settings.
    #[must_use]
    pub fn new(input_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            input_dir,
            output_dir,
            ..Default::default()
        }
    }

    /// Checks the configuration for values the pipeline cannot honor.
    pub fn validate(&self) -> CoreResult<()> {
        if self.output_dir == self.input_dir {
            return Err(CoreError::Config(format!(
                "output directory must differ from input directory ({})",
                self.input_dir.display()
            )));
        }
        if self.output_dir.starts_with(&self.input_dir) {
            return Err(CoreError::Config(format!(
                "output directory '{}' must not be inside the input directory '{}'",
                self.output_dir.display(),
                self.input_dir.display()
            )));
        }
        if self.extensions.is_empty() {
            return Err(CoreError::Config(
                "at least one video extension is required".to_string(),
            ));
        }
        if self
            .extensions
            .iter()
            .any(|ext| ext.trim().trim_start_matches('.').is_empty())
        {
            return Err(CoreError::Config("video extensions must not be blank".to_string()));
        }
        if self.jobs == 0 {
            return Err(CoreError::Config("jobs must be at least 1".to_string()));
        }
        if self.tool_timeout.is_some_and(|t| t.is_zero()) {
            return Err(CoreError::Config("tool timeout must be non-zero".to_string()));
        }
        if let Some(ext) = &self.output_extension {
            if ext.trim_start_matches('.').is_empty() {
                return Err(CoreError::Config("output extension is empty".to_string()));
            }
        }

        match &self.policy {
            TransformPolicy::Compress(settings) => {
                if settings.crf > MAX_CRF {
                    return Err(CoreError::Config(format!(
                        "CRF {} is out of range (0-{MAX_CRF})",
                        settings.crf
                    )));
                }
                if !X264_PRESETS.contains(&settings.preset.as_str()) {
                    return Err(CoreError::Config(format!(
                        "unknown x264 preset '{}'",
                        settings.preset
                    )));
                }
                if settings.audio_bitrate.trim().is_empty() {
                    return Err(CoreError::Config("audio bitrate is empty".to_string()));
                }
                if !PRACTICAL_CRF_RANGE.contains(&settings.crf) {
                    log::warn!(
                        "CRF {} is outside the practical range {}-{}",
                        settings.crf,
                        PRACTICAL_CRF_RANGE.start(),
                        PRACTICAL_CRF_RANGE.end()
                    );
                }
            }
            TransformPolicy::Trim(settings) => {
                if !settings.max_duration_secs.is_finite() || settings.max_duration_secs <= 0.0 {
                    return Err(CoreError::Config(format!(
                        "max duration must be a positive number of seconds, got {}",
                        settings.max_duration_secs
                    )));
                }
            }
            TransformPolicy::Passthrough => {}
        }

        Ok(())
    }
}

/// Normalizes a user-supplied extension to lowercase with a leading dot.
#[must_use]
pub fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim().trim_start_matches('.').to_lowercase();
    format!(".{trimmed}")
}

/// Derives the default output root: a sibling of `input_dir` named
/// `<name>_<suffix>`.
pub fn default_output_dir(input_dir: &Path, policy: &TransformPolicy) -> CoreResult<PathBuf> {
    let name = input_dir.file_name().ok_or_else(|| {
        CoreError::PathError(format!(
            "Cannot derive an output directory from '{}'",
            input_dir.display()
        ))
    })?;
    let sibling = format!("{}_{}", name.to_string_lossy(), policy.output_suffix());
    Ok(match input_dir.parent() {
        Some(parent) => parent.join(sibling),
        None => PathBuf::from(sibling),
    })
}
