// ============================================================================
// vidtree-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: FFmpeg Process Management and Abstraction
//
// `FfmpegSpawner` turns a built `FfmpegCommand` into a running process. The
// production implementation goes through ffmpeg-sidecar; tests substitute
// `mocks::MockFfmpegSpawner`. Spawners are shared across worker threads.

use super::command::ChildProcess;
use crate::error::{CoreResult, command_start_error};

use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use std::io::Read;
use std::process::ExitStatus;

/// Something that can spawn ffmpeg processes.
pub trait FfmpegSpawner: Send + Sync {
    type Process: ChildProcess;
    /// Spawns the ffmpeg command, consuming the command object.
    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process>;
}

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild`.
pub struct SidecarProcess(SidecarChild);

impl ChildProcess for SidecarProcess {
    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>> {
        self.0
            .take_stdout()
            .map(|out| Box::new(out) as Box<dyn Read + Send>)
    }

    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>> {
        self.0
            .take_stderr()
            .map(|err| Box::new(err) as Box<dyn Read + Send>)
    }

    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        self.0.as_inner_mut().try_wait()
    }

    fn kill(&mut self) -> std::io::Result<()> {
        self.0.kill()
    }

    fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.0.wait()
    }
}

/// `FfmpegSpawner` backed by ffmpeg-sidecar.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        cmd.spawn()
            .map(SidecarProcess)
            .map_err(|e| command_start_error("ffmpeg", e))
    }
}
