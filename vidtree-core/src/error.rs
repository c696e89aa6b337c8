// ============================================================================
// vidtree-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Core Error Types for vidtree
//
// Fatal and infrastructure errors surface as `CoreError`. Per-file failures
// during a batch are not `CoreError`s that escape the batch: they are folded
// into `TransformResult::Failure` / `ProbeError` values at the file boundary.

use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the vidtree core library.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("Batch root is not a readable directory: {0}")]
    InvalidBatchRoot(String),

    #[error("Failed to create output root '{path}': {source}")]
    OutputRoot {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Required external command '{0}' was not found")]
    DependencyNotFound(String),

    #[error("Failed to start '{0}': {1}")]
    CommandStart(String, #[source] std::io::Error),

    #[error("Failed waiting for '{0}': {1}")]
    CommandWait(String, #[source] std::io::Error),

    #[error("'{cmd}' exited with {status}: {stderr}")]
    CommandFailed {
        cmd: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("'{0}' timed out after {1:?}")]
    CommandTimeout(String, Duration),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Could not extract a remote file id from link '{0}'")]
    InvalidRemoteLink(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type used throughout the core library.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Builds a `CommandStart` error for a process that could not be spawned.
pub fn command_start_error(cmd: impl Into<String>, err: std::io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

/// Builds a `CommandWait` error for a process whose exit could not be collected.
pub fn command_wait_error(cmd: impl Into<String>, err: std::io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

/// Builds a `CommandFailed` error from an exit status and captured stderr.
pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        cmd: cmd.into(),
        status,
        stderr: stderr.into(),
    }
}
