// ============================================================================
// vidtree-core/src/processing/transform.rs
// ============================================================================
//
// MEDIA TRANSFORM: Executing One Job in One Mode
//
// A `TransformJob` names the file, its destination and the chosen mode. A
// `Transformer` runs it and always returns a `TransformResult`: tool and I/O
// failures are folded into `TransformResult::Failure` here and never escape.
//
// Every mode writes to a sibling partial file first. Only a validated output
// is renamed onto the destination, so an interrupted or failed run never
// leaves a truncated file where a finished one is expected.

use crate::config::CompressSettings;
use crate::external::FfmpegSpawner;
use crate::external::ffmpeg::{
    build_compress_command, build_stream_copy_command, build_trim_command, run_ffmpeg,
};
use crate::media::MediaFile;

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Marker inserted before the container extension of in-progress outputs.
pub const PARTIAL_MARKER: &str = "vidtree-part";

/// How a single file is produced at its destination.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformMode {
    /// Re-encode with libx264/AAC
    Compress(CompressSettings),
    /// Cut to `max_duration_secs` when the probed duration of the job's file
    /// exceeds it, else stream copy
    Trim { max_duration_secs: f64 },
    /// Byte-identical copy, no external tool
    PassthroughCopy,
}

impl TransformMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Compress(_) => "compress",
            Self::Trim { .. } => "trim",
            Self::PassthroughCopy => "copy",
        }
    }
}

/// One unit of work.
#[derive(Debug, Clone)]
pub struct TransformJob<'a> {
    /// The file being processed; carries the probed duration for trim jobs
    pub file: &'a MediaFile,
    pub destination: PathBuf,
    pub mode: TransformMode,
}

impl TransformJob<'_> {
    /// Whether a trim job has to cut. `None` for other modes and for files
    /// that were never probed.
    pub fn needs_cut(&self) -> Option<bool> {
        match self.mode {
            TransformMode::Trim { max_duration_secs } => self
                .file
                .duration_secs
                .map(|duration_secs| duration_secs > max_duration_secs),
            _ => None,
        }
    }
}

/// Outcome of one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransformResult {
    Success {
        input_size: u64,
        output_size: u64,
        /// False for copies, including short files under a trim policy
        transformed: bool,
    },
    Failure {
        input_size: u64,
        detail: String,
    },
}

impl TransformResult {
    pub fn failure(input_size: u64, detail: impl Into<String>) -> Self {
        Self::Failure {
            input_size,
            detail: detail.into(),
        }
    }
}

/// Executes transform jobs. Shared by all batch workers.
pub trait Transformer: Send + Sync {
    fn transform(&self, job: &TransformJob<'_>) -> TransformResult;
}

/// Sibling path a job writes to before its output is accepted.
///
/// The container extension is kept last so ffmpeg still picks the muxer
/// from it: `A/clip.mp4` becomes `A/clip.vidtree-part.mp4`.
pub fn partial_path(destination: &Path) -> PathBuf {
    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match destination.extension() {
        Some(ext) => format!("{stem}.{PARTIAL_MARKER}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{PARTIAL_MARKER}"),
    };
    destination.with_file_name(name)
}

fn discard_partial(partial: &Path) {
    match fs::remove_file(partial) {
        Ok(()) => log::debug!("Removed partial output {}", partial.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove partial output {}: {}", partial.display(), e),
    }
}

/// `Transformer` that drives ffmpeg for compress and trim and copies files
/// directly for passthrough.
#[derive(Debug, Clone)]
pub struct FfmpegTransformer<S: FfmpegSpawner> {
    spawner: S,
    ffmpeg_path: String,
    timeout: Option<Duration>,
}

impl<S: FfmpegSpawner> FfmpegTransformer<S> {
    pub fn new(spawner: S, ffmpeg_path: &str, timeout: Option<Duration>) -> Self {
        Self {
            spawner,
            ffmpeg_path: ffmpeg_path.to_string(),
            timeout,
        }
    }

    /// Writes the job's output to `output`, returning whether it counts as
    /// transformed.
    fn produce(&self, job: &TransformJob<'_>, output: &Path) -> Result<bool, String> {
        let input = job.file.path.as_path();

        let (cmd, transformed) = match &job.mode {
            TransformMode::Compress(settings) => (
                build_compress_command(&self.ffmpeg_path, input, output, settings),
                true,
            ),
            TransformMode::Trim { max_duration_secs } => match job.needs_cut() {
                Some(true) => (
                    build_trim_command(&self.ffmpeg_path, input, output, *max_duration_secs),
                    true,
                ),
                Some(false) => (build_stream_copy_command(&self.ffmpeg_path, input, output), false),
                None => return Err(format!("no probed duration for {}", input.display())),
            },
            TransformMode::PassthroughCopy => {
                fs::copy(input, output).map_err(|e| format!("copy failed: {e}"))?;
                return Ok(false);
            }
        };

        run_ffmpeg(&self.spawner, cmd, self.timeout).map_err(|e| e.to_string())?;
        Ok(transformed)
    }

    /// Produces into the partial file, validates it and moves it into place.
    fn produce_and_commit(&self, job: &TransformJob<'_>, partial: &Path) -> Result<(bool, u64), String> {
        let transformed = self.produce(job, partial)?;

        let require_content =
            !matches!(job.mode, TransformMode::PassthroughCopy) || job.file.size_bytes > 0;
        let output_size = validate_output(partial, require_content)?;

        fs::rename(partial, &job.destination).map_err(|e| {
            format!(
                "failed to move output into place at {}: {}",
                job.destination.display(),
                e
            )
        })?;
        Ok((transformed, output_size))
    }
}

impl<S: FfmpegSpawner> Transformer for FfmpegTransformer<S> {
    fn transform(&self, job: &TransformJob<'_>) -> TransformResult {
        let input_size = job.file.size_bytes;
        let partial = partial_path(&job.destination);

        match self.produce_and_commit(job, &partial) {
            Ok((transformed, output_size)) => TransformResult::Success {
                input_size,
                output_size,
                transformed,
            },
            Err(detail) => {
                discard_partial(&partial);
                TransformResult::failure(input_size, detail)
            }
        }
    }
}

/// Checks that a reported output exists and, when required, is non-empty.
pub fn validate_output(path: &Path, require_content: bool) -> Result<u64, String> {
    match fs::metadata(path) {
        Ok(meta) if !meta.is_file() => Err(format!("output {} is not a file", path.display())),
        Ok(meta) if require_content && meta.len() == 0 => {
            Err(format!("output {} is empty", path.display()))
        }
        Ok(meta) => Ok(meta.len()),
        Err(e) => Err(format!("output {} missing: {}", path.display(), e)),
    }
}
