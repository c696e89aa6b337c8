// ============================================================================
// vidtree-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Fluent construction of CoreConfig. The input directory is required; the
// output directory defaults to the `<input>_<suffix>` sibling for the chosen
// policy and the log directory defaults to the current directory.

use std::path::PathBuf;
use std::time::Duration;

use super::{
    CompressSettings, CoreConfig, TransformPolicy, TrimSettings, default_output_dir,
    normalize_extension,
};
use crate::error::{CoreError, CoreResult};

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use vidtree_core::config::CoreConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .input_dir(PathBuf::from("/data/downloaded_videos"))
///     .compress(35, "medium", "128k")
///     .jobs(2)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.output_dir, PathBuf::from("/data/downloaded_videos_compressed"));
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfigBuilder {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    extensions: Option<Vec<String>>,
    policy: TransformPolicy,
    output_extension: Option<String>,
    skip_existing: bool,
    jobs: usize,
    tool_timeout: Option<Duration>,
    ffmpeg_path: Option<String>,
    ffprobe_path: Option<String>,
}

impl Default for CoreConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreConfigBuilder {
    /// Creates a new builder with a passthrough policy and default settings.
    pub fn new() -> Self {
        Self {
            input_dir: None,
            output_dir: None,
            log_dir: None,
            extensions: None,
            policy: TransformPolicy::Passthrough,
            output_extension: None,
            skip_existing: false,
            jobs: 1,
            tool_timeout: None,
            ffmpeg_path: None,
            ffprobe_path: None,
        }
    }

    /// Sets the batch root.
    pub fn input_dir(mut self, input_dir: PathBuf) -> Self {
        self.input_dir = Some(input_dir);
        self
    }

    /// Sets the output root. Without it the policy's sibling directory is used.
    pub fn output_dir(mut self, output_dir: PathBuf) -> Self {
        self.output_dir = Some(output_dir);
        self
    }

    /// Sets the directory for log and summary files.
    pub fn log_dir(mut self, log_dir: PathBuf) -> Self {
        self.log_dir = Some(log_dir);
        self
    }

    /// Replaces the recognized extension set. Entries are normalized.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        // Blank entries come from inputs like "mp4," and are dropped
        self.extensions = Some(
            extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .filter(|ext| ext != ".")
                .collect(),
        );
        self
    }

    /// Sets the transform policy directly.
    pub fn policy(mut self, policy: TransformPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Selects compression with the given CRF, preset and audio bitrate.
    pub fn compress(mut self, crf: u8, preset: &str, audio_bitrate: &str) -> Self {
        self.policy = TransformPolicy::Compress(CompressSettings {
            crf,
            preset: preset.to_string(),
            audio_bitrate: audio_bitrate.to_string(),
        });
        self
    }

    /// Selects trimming to at most `max_duration_secs`.
    pub fn trim(mut self, max_duration_secs: f64) -> Self {
        self.policy = TransformPolicy::Trim(TrimSettings { max_duration_secs });
        self
    }

    /// Replaces the destination file extension.
    pub fn output_extension(mut self, ext: &str) -> Self {
        self.output_extension = Some(ext.trim_start_matches('.').to_string());
        self
    }

    /// Keeps non-empty destinations from earlier runs.
    pub fn skip_existing(mut self, skip: bool) -> Self {
        self.skip_existing = skip;
        self
    }

    /// Sets the number of concurrent workers.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Bounds each external tool invocation.
    pub fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    /// Overrides the ffmpeg binary.
    pub fn ffmpeg_path(mut self, path: &str) -> Self {
        self.ffmpeg_path = Some(path.to_string());
        self
    }

    /// Overrides the ffprobe binary.
    pub fn ffprobe_path(mut self, path: &str) -> Self {
        self.ffprobe_path = Some(path.to_string());
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> CoreResult<CoreConfig> {
        let input_dir = self
            .input_dir
            .ok_or_else(|| CoreError::Config("input_dir is required".to_string()))?;
        let output_dir = match self.output_dir {
            Some(dir) => dir,
            None => default_output_dir(&input_dir, &self.policy)?,
        };
        let defaults = CoreConfig::default();

        let config = CoreConfig {
            input_dir,
            output_dir,
            log_dir: self.log_dir.unwrap_or(defaults.log_dir),
            extensions: self.extensions.unwrap_or(defaults.extensions),
            policy: self.policy,
            output_extension: self.output_extension,
            skip_existing: self.skip_existing,
            jobs: self.jobs,
            tool_timeout: self.tool_timeout,
            ffmpeg_path: self.ffmpeg_path.unwrap_or(defaults.ffmpeg_path),
            ffprobe_path: self.ffprobe_path.unwrap_or(defaults.ffprobe_path),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_input_dir() {
        assert!(matches!(
            CoreConfigBuilder::new().build(),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn build_derives_output_dir_from_policy() {
        let config = CoreConfigBuilder::new()
            .input_dir(PathBuf::from("/data/compressed_videos"))
            .trim(7.0)
            .build()
            .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("/data/compressed_videos_cropped"));
        assert_eq!(
            config.policy,
            TransformPolicy::Trim(TrimSettings { max_duration_secs: 7.0 })
        );
    }

    #[test]
    fn build_normalizes_extensions_and_overrides() {
        let config = CoreConfigBuilder::new()
            .input_dir(PathBuf::from("/in"))
            .output_dir(PathBuf::from("/out"))
            .extensions(["MOV", ".Mp4"])
            .output_extension(".mp4")
            .tool_timeout(Duration::from_secs(600))
            .ffprobe_path("/opt/ffmpeg/bin/ffprobe")
            .build()
            .unwrap();

        assert_eq!(config.extensions, vec![".mov".to_string(), ".mp4".to_string()]);
        assert_eq!(config.output_extension.as_deref(), Some("mp4"));
        assert_eq!(config.tool_timeout, Some(Duration::from_secs(600)));
        assert_eq!(config.ffprobe_path, "/opt/ffmpeg/bin/ffprobe");
        assert_eq!(config.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn build_drops_blank_extensions() {
        let config = CoreConfigBuilder::new()
            .input_dir(PathBuf::from("/in"))
            .output_dir(PathBuf::from("/out"))
            .extensions(["mp4", "", " . "])
            .build()
            .unwrap();
        assert_eq!(config.extensions, vec![".mp4".to_string()]);

        let only_blank = CoreConfigBuilder::new()
            .input_dir(PathBuf::from("/in"))
            .output_dir(PathBuf::from("/out"))
            .extensions([""])
            .build();
        assert!(matches!(only_blank, Err(CoreError::Config(_))));
    }

    #[test]
    fn build_validates() {
        let result = CoreConfigBuilder::new()
            .input_dir(PathBuf::from("/in"))
            .output_dir(PathBuf::from("/out"))
            .compress(23, "not-a-preset", "128k")
            .build();
        assert!(result.is_err());
    }
}
