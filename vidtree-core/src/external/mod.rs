// ============================================================================
// vidtree-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffmpeg and ffprobe
//
// This module encapsulates every interaction with the external media tools.
// Traits (`FfmpegSpawner`, `FfprobeExecutor`) sit at the seam so the batch
// pipeline can be driven by the test doubles in `mocks` instead of real
// processes.
//
// KEY COMPONENTS:
// - command: child process supervision with optional timeout
// - ffmpeg: argument building for compress, trim and stream copy
// - ffmpeg_executor: spawning through ffmpeg-sidecar
// - ffprobe_executor: duration probing
// - mocks: in-memory doubles used by the test suites

use crate::error::{CoreError, CoreResult};

use std::io;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Child process supervision shared by ffmpeg and ffprobe
pub mod command;

/// ffmpeg argument building and execution
pub mod ffmpeg;

/// Traits and implementations for spawning ffmpeg
pub mod ffmpeg_executor;

/// Traits and implementations for probing durations
pub mod ffprobe_executor;

/// Test doubles for the external tool traits and the directory reader
pub mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use command::{ChildProcess, CommandOutcome};
pub use ffmpeg_executor::{FfmpegSpawner, SidecarProcess, SidecarSpawner};
pub use ffprobe_executor::{CommandFfprobeExecutor, FfprobeExecutor, ProbeError};

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks that an external command can be started.
///
/// Runs `<cmd_path> -version` with output discarded. Only the ability to
/// start the process matters; its exit status is logged but not judged.
///
/// # Errors
///
/// * `CoreError::DependencyNotFound` when the binary does not exist
/// * `CoreError::CommandStart` when it exists but cannot be started
pub fn check_dependency(cmd_path: &str) -> CoreResult<()> {
    let result = Command::new(cmd_path)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(status) => {
            log::debug!("Found dependency '{}' ({})", cmd_path, status);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::error!("Dependency '{}' not found.", cmd_path);
            Err(CoreError::DependencyNotFound(cmd_path.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check '{}': {}", cmd_path, e);
            Err(crate::error::command_start_error(cmd_path, e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dependency_is_reported() {
        let result = check_dependency("vidtree-definitely-not-installed");
        assert!(matches!(result, Err(CoreError::DependencyNotFound(name)) if name == "vidtree-definitely-not-installed"));
    }
}
