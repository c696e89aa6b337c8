// ============================================================================
// vidtree-core/src/external/command.rs
// ============================================================================
//
// COMMAND SUPERVISION: Waiting on External Tools with an Optional Timeout
//
// Both ffmpeg (through ffmpeg-sidecar) and ffprobe (through std::process)
// run as child processes. This module drains their output pipes on helper
// threads and waits for them, killing the child when a timeout elapses.

use crate::error::{CoreError, CoreResult, command_wait_error};

use std::io::Read;
use std::process::ExitStatus;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Interval between exit checks while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Number of stderr lines kept in failure details.
pub const STDERR_TAIL_LINES: usize = 20;

/// A running child process that can be supervised.
pub trait ChildProcess {
    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>>;
    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>>;
    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>>;
    fn kill(&mut self) -> std::io::Result<()>;
    fn wait(&mut self) -> std::io::Result<ExitStatus>;
}

impl ChildProcess for std::process::Child {
    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>> {
        self.stdout
            .take()
            .map(|out| Box::new(out) as Box<dyn Read + Send>)
    }

    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>> {
        self.stderr
            .take()
            .map(|err| Box::new(err) as Box<dyn Read + Send>)
    }

    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        std::process::Child::try_wait(self)
    }

    fn kill(&mut self) -> std::io::Result<()> {
        std::process::Child::kill(self)
    }

    fn wait(&mut self) -> std::io::Result<ExitStatus> {
        std::process::Child::wait(self)
    }
}

/// Exit status and captured output of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

fn drain(reader: Option<Box<dyn Read + Send>>) -> Option<JoinHandle<Vec<u8>>> {
    reader.map(|mut reader| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            if let Err(e) = reader.read_to_end(&mut buf) {
                log::debug!("Error reading child output: {}", e);
            }
            buf
        })
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .map(|h| String::from_utf8_lossy(&h.join().unwrap_or_default()).into_owned())
        .unwrap_or_default()
}

/// Waits for `child` to exit while draining its output.
///
/// With a timeout the child is polled and killed once the deadline passes,
/// producing `CoreError::CommandTimeout`. A non-zero exit is not an error
/// here; callers inspect `CommandOutcome::status`.
pub fn wait_for_child<C: ChildProcess>(
    child: &mut C,
    cmd_name: &str,
    timeout: Option<Duration>,
) -> CoreResult<CommandOutcome> {
    let stdout_handle = drain(child.take_stdout());
    let stderr_handle = drain(child.take_stderr());

    let status = match timeout {
        None => child.wait().map_err(|e| command_wait_error(cmd_name, e))?,
        Some(limit) => {
            let start = Instant::now();
            loop {
                match child.try_wait() {
                    Ok(Some(status)) => break status,
                    Ok(None) if start.elapsed() >= limit => {
                        log::warn!("'{}' exceeded {:?}, killing it", cmd_name, limit);
                        if let Err(e) = child.kill() {
                            log::debug!("Failed to kill '{}': {}", cmd_name, e);
                        }
                        // Reap so the pipes close and the readers finish
                        let _ = child.wait();
                        let _ = collect(stdout_handle);
                        let _ = collect(stderr_handle);
                        return Err(CoreError::CommandTimeout(cmd_name.to_string(), limit));
                    }
                    Ok(None) => std::thread::sleep(POLL_INTERVAL),
                    Err(e) => return Err(command_wait_error(cmd_name, e)),
                }
            }
        }
    };

    Ok(CommandOutcome {
        status,
        stdout: collect(stdout_handle),
        stderr: collect(stderr_handle),
    })
}

/// Last `max_lines` non-empty lines of `text`, joined with newlines.
pub fn tail_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
