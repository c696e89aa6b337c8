// ============================================================================
// vidtree-core/src/external/ffprobe_executor.rs
// ============================================================================
//
// FFPROBE EXECUTOR: Duration Probing via ffprobe
//
// ffprobe is invoked as a plain subprocess so the call can be bounded by the
// configured tool timeout. Every failure mode (spawn error, non-zero exit,
// timeout, unparsable output) surfaces as a `ProbeError` value.

use super::command::{STDERR_TAIL_LINES, tail_lines, wait_for_child};
use crate::error::command_start_error;

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use thiserror::Error;

/// Failure to determine a file's duration.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("probe failed for {}: {detail}", path.display())]
pub struct ProbeError {
    pub path: PathBuf,
    /// Tool diagnostic or parse failure description
    pub detail: String,
}

impl ProbeError {
    pub fn new(path: &Path, detail: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            detail: detail.into(),
        }
    }
}

/// Reads the container duration of a media file.
pub trait FfprobeExecutor: Send + Sync {
    fn probe_duration(&self, path: &Path) -> Result<f64, ProbeError>;
}

/// `FfprobeExecutor` that runs the ffprobe binary.
#[derive(Debug, Clone)]
pub struct CommandFfprobeExecutor {
    ffprobe_path: String,
    timeout: Option<Duration>,
}

impl Default for CommandFfprobeExecutor {
    fn default() -> Self {
        Self::new("ffprobe", None)
    }
}

impl CommandFfprobeExecutor {
    pub fn new(ffprobe_path: &str, timeout: Option<Duration>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.to_string(),
            timeout,
        }
    }
}

impl FfprobeExecutor for CommandFfprobeExecutor {
    fn probe_duration(&self, path: &Path) -> Result<f64, ProbeError> {
        let mut command = Command::new(&self.ffprobe_path);
        command
            .args(["-v", "error"])
            .args(["-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        log::debug!("Running: {:?}", command);

        let mut child = command
            .spawn()
            .map_err(|e| ProbeError::new(path, command_start_error(&self.ffprobe_path, e).to_string()))?;
        let outcome = wait_for_child(&mut child, &self.ffprobe_path, self.timeout)
            .map_err(|e| ProbeError::new(path, e.to_string()))?;

        if !outcome.status.success() {
            let stderr = tail_lines(&outcome.stderr, STDERR_TAIL_LINES);
            let detail = if stderr.is_empty() {
                format!("ffprobe exited with {}", outcome.status)
            } else {
                format!("ffprobe exited with {}: {}", outcome.status, stderr)
            };
            return Err(ProbeError::new(path, detail));
        }

        parse_duration_output(&outcome.stdout).map_err(|detail| ProbeError::new(path, detail))
    }
}

/// Parses ffprobe's bare duration output ("12.345000").
///
/// Rejects empty, non-numeric ("N/A"), non-finite and negative values.
pub fn parse_duration_output(stdout: &str) -> Result<f64, String> {
    let text = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| "ffprobe returned no duration".to_string())?;

    let value: f64 = text
        .parse()
        .map_err(|_| format!("unparsable duration '{text}'"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("invalid duration '{text}'"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_duration() {
        assert_eq!(parse_duration_output("12.345000\n"), Ok(12.345));
        assert_eq!(parse_duration_output("\n  5\n"), Ok(5.0));
        assert_eq!(parse_duration_output("0.000000"), Ok(0.0));
    }

    #[test]
    fn rejects_bad_duration_output() {
        assert!(parse_duration_output("").is_err());
        assert!(parse_duration_output("N/A").is_err());
        assert!(parse_duration_output("-3.0").is_err());
        assert!(parse_duration_output("inf").is_err());
        assert!(parse_duration_output("NaN").is_err());
    }

    #[test]
    fn missing_binary_is_a_probe_error() {
        let probe = CommandFfprobeExecutor::new("/nonexistent/vidtree-ffprobe", None);
        let err = probe.probe_duration(Path::new("/tmp/missing.mp4")).unwrap_err();
        assert_eq!(err.path, PathBuf::from("/tmp/missing.mp4"));
        assert!(!err.detail.is_empty());
    }
}
