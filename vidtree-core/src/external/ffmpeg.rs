//! FFmpeg command building and execution for the three transform modes.
//!
//! Every command starts from the configured binary, disables stdin
//! interaction and overwrites the destination (`-y`) so repeated runs replace
//! earlier outputs.

use super::command::{STDERR_TAIL_LINES, tail_lines, wait_for_child};
use super::ffmpeg_executor::FfmpegSpawner;
use crate::config::CompressSettings;
use crate::error::{CoreResult, command_failed_error};

use ffmpeg_sidecar::command::FfmpegCommand;
use log::debug;

use std::path::Path;
use std::time::Duration;

fn base_command(ffmpeg_path: &str, input: &Path) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new_with_path(ffmpeg_path);
    cmd.args(["-hide_banner", "-nostdin"]);
    cmd.input(input.to_string_lossy().as_ref());
    cmd
}

fn finish(mut cmd: FfmpegCommand, output: &Path) -> FfmpegCommand {
    cmd.overwrite();
    cmd.output(output.to_string_lossy().as_ref());
    cmd
}

/// Formats a seconds value for `-t`, dropping a trailing `.0`.
pub fn format_seconds_arg(secs: f64) -> String {
    if secs.fract() == 0.0 {
        format!("{}", secs as i64)
    } else {
        format!("{secs}")
    }
}

/// Re-encode video with libx264 and audio with AAC.
pub fn build_compress_command(
    ffmpeg_path: &str,
    input: &Path,
    output: &Path,
    settings: &CompressSettings,
) -> FfmpegCommand {
    let mut cmd = base_command(ffmpeg_path, input);
    cmd.args(["-c:v", "libx264"]);
    cmd.args(["-crf", &settings.crf.to_string()]);
    cmd.args(["-preset", &settings.preset]);
    cmd.args(["-pix_fmt", "yuv420p"]);
    cmd.args(["-c:a", "aac"]);
    cmd.args(["-b:a", &settings.audio_bitrate]);
    finish(cmd, output)
}

/// Cut at `max_duration_secs` without re-encoding.
pub fn build_trim_command(
    ffmpeg_path: &str,
    input: &Path,
    output: &Path,
    max_duration_secs: f64,
) -> FfmpegCommand {
    let mut cmd = base_command(ffmpeg_path, input);
    cmd.args(["-t", &format_seconds_arg(max_duration_secs)]);
    cmd.args(["-c:v", "copy"]);
    cmd.args(["-c:a", "copy"]);
    finish(cmd, output)
}

/// Remux every stream unchanged.
pub fn build_stream_copy_command(ffmpeg_path: &str, input: &Path, output: &Path) -> FfmpegCommand {
    let mut cmd = base_command(ffmpeg_path, input);
    cmd.args(["-c", "copy"]);
    finish(cmd, output)
}

/// Renders the command line for logs.
pub fn command_line(cmd: &FfmpegCommand) -> String {
    let args: Vec<String> = cmd
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    format!("ffmpeg {}", args.join(" "))
}

/// Runs an ffmpeg command to completion.
///
/// A non-zero exit becomes `CoreError::CommandFailed` carrying the tail of
/// ffmpeg's stderr; expiry of `timeout` kills the process and returns
/// `CoreError::CommandTimeout`.
pub fn run_ffmpeg<S: FfmpegSpawner>(
    spawner: &S,
    cmd: FfmpegCommand,
    timeout: Option<Duration>,
) -> CoreResult<()> {
    let rendered = command_line(&cmd);
    debug!("Running: {rendered}");

    let mut process = spawner.spawn(cmd)?;
    let outcome = wait_for_child(&mut process, "ffmpeg", timeout)?;

    if outcome.status.success() {
        Ok(())
    } else {
        Err(command_failed_error(
            rendered,
            outcome.status,
            tail_lines(&outcome.stderr, STDERR_TAIL_LINES),
        ))
    }
}
