// vidtree-core/src/external/mocks.rs

// --- Test doubles for the external tool seams ---
//
// Shared-state doubles (Arc<Mutex<..>>) so they satisfy the Send + Sync
// bounds of the batch workers and can be inspected after a run.

use super::command::ChildProcess;
use super::ffmpeg_executor::FfmpegSpawner;
use super::ffprobe_executor::{FfprobeExecutor, ProbeError};
use crate::discovery::{DirEntryInfo, DirectoryReader, EntryKind};
use crate::error::{CoreError, CoreResult, command_start_error};
use crate::media::MediaFile;
use crate::processing::transform::{TransformJob, TransformMode, TransformResult, Transformer};

use ffmpeg_sidecar::command::FfmpegCommand;
use std::collections::{HashMap, HashSet};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Builds an `ExitStatus` carrying the given exit code.
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

/// Builds an `ExitStatus` carrying the given exit code.
#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code as u32)
}

// ============================================================================
// FFMPEG
// ============================================================================

/// Mock ffmpeg process.
pub struct MockFfmpegProcess {
    status: ExitStatus,
    stderr: Option<String>,
    hang: bool,
    killed: Arc<AtomicBool>,
}

impl ChildProcess for MockFfmpegProcess {
    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>> {
        None
    }

    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>> {
        self.stderr
            .take()
            .map(|text| Box::new(Cursor::new(text.into_bytes())) as Box<dyn Read + Send>)
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        if self.hang && !self.killed.load(Ordering::SeqCst) {
            Ok(None)
        } else {
            Ok(Some(self.status))
        }
    }

    fn kill(&mut self) -> io::Result<()> {
        self.killed.store(true, Ordering::SeqCst);
        self.status = exit_status(137);
        Ok(())
    }

    fn wait(&mut self) -> io::Result<ExitStatus> {
        Ok(self.status)
    }
}

/// What a matched expectation does.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Exit 0, optionally writing these bytes to the output path (last argument)
    Success { output: Option<Vec<u8>> },
    /// Exit with `code`, writing `stderr` and optionally a truncated output
    ExitError {
        code: i32,
        stderr: String,
        output: Option<Vec<u8>>,
    },
    /// Fail to spawn
    SpawnError(String),
    /// Never exit until killed
    Hang,
}

/// An expected ffmpeg call. Matches when any argument contains `arg_pattern`.
#[derive(Debug, Clone)]
pub struct MockFfmpegExpectation {
    pub arg_pattern: String,
    pub outcome: MockOutcome,
}

/// Mock `FfmpegSpawner` with one-shot expectations.
///
/// Each spawn consumes the first expectation whose pattern appears in one of
/// the arguments. An unmatched call is a spawn error.
#[derive(Clone, Default)]
pub struct MockFfmpegSpawner {
    expectations: Arc<Mutex<Vec<MockFfmpegExpectation>>>,
    received_calls: Arc<Mutex<Vec<Vec<String>>>>,
    killed: Arc<AtomicBool>,
}

impl std::fmt::Debug for MockFfmpegSpawner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockFfmpegSpawner")
            .field("pending", &lock(&self.expectations).len())
            .field("received", &lock(&self.received_calls).len())
            .finish()
    }
}

impl MockFfmpegSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_expectation(&self, arg_pattern: &str, outcome: MockOutcome) {
        lock(&self.expectations).push(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            outcome,
        });
    }

    /// Succeeds and writes `output` to the destination.
    pub fn add_success_expectation(&self, arg_pattern: &str, output: &[u8]) {
        self.add_expectation(
            arg_pattern,
            MockOutcome::Success {
                output: Some(output.to_vec()),
            },
        );
    }

    pub fn add_exit_error_expectation(&self, arg_pattern: &str, code: i32, stderr: &str) {
        self.add_expectation(
            arg_pattern,
            MockOutcome::ExitError {
                code,
                stderr: stderr.to_string(),
                output: None,
            },
        );
    }

    /// Writes `output` to the destination, then exits with `code`.
    pub fn add_truncated_output_expectation(&self, arg_pattern: &str, output: &[u8], code: i32) {
        self.add_expectation(
            arg_pattern,
            MockOutcome::ExitError {
                code,
                stderr: "Conversion failed!".to_string(),
                output: Some(output.to_vec()),
            },
        );
    }

    pub fn add_spawn_error_expectation(&self, arg_pattern: &str, message: &str) {
        self.add_expectation(arg_pattern, MockOutcome::SpawnError(message.to_string()));
    }

    pub fn add_hanging_expectation(&self, arg_pattern: &str) {
        self.add_expectation(arg_pattern, MockOutcome::Hang);
    }

    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        lock(&self.received_calls).clone()
    }

    pub fn pending_expectations(&self) -> usize {
        lock(&self.expectations).len()
    }

    /// Whether any spawned process was killed.
    pub fn was_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }

    fn process(&self, status: ExitStatus, stderr: Option<String>, hang: bool) -> MockFfmpegProcess {
        MockFfmpegProcess {
            status,
            stderr,
            hang,
            killed: Arc::clone(&self.killed),
        }
    }
}

/// Writes `output` to the path in the last argument, as ffmpeg would.
fn write_mock_output(args: &[String], output: Option<Vec<u8>>) -> CoreResult<()> {
    if let (Some(bytes), Some(path)) = (output, args.last()) {
        let path = PathBuf::from(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
    }
    Ok(())
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        let args: Vec<String> = cmd
            .get_args()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        lock(&self.received_calls).push(args.clone());

        let expectation = {
            let mut expectations = lock(&self.expectations);
            let found = expectations
                .iter()
                .position(|exp| args.iter().any(|arg| arg.contains(&exp.arg_pattern)));
            found.map(|index| expectations.remove(index))
        };

        let Some(expectation) = expectation else {
            log::error!("MockFfmpegSpawner: no expectation for args {:?}", args);
            return Err(CoreError::OperationFailed(format!(
                "MockFfmpegSpawner: no expectation for args {args:?}"
            )));
        };
        log::debug!("MockFfmpegSpawner: matched '{}'", expectation.arg_pattern);

        match expectation.outcome {
            MockOutcome::Success { output } => {
                write_mock_output(&args, output)?;
                Ok(self.process(exit_status(0), None, false))
            }
            MockOutcome::ExitError {
                code,
                stderr,
                output,
            } => {
                write_mock_output(&args, output)?;
                Ok(self.process(exit_status(code), Some(stderr), false))
            }
            MockOutcome::SpawnError(message) => Err(command_start_error(
                "ffmpeg",
                io::Error::new(io::ErrorKind::NotFound, message),
            )),
            MockOutcome::Hang => Ok(self.process(exit_status(0), None, true)),
        }
    }
}

// ============================================================================
// FFPROBE
// ============================================================================

/// Mock `FfprobeExecutor` answering from a path-keyed table.
#[derive(Clone, Default)]
pub struct MockFfprobeExecutor {
    results: Arc<Mutex<HashMap<PathBuf, Result<f64, String>>>>,
    calls: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockFfprobeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_duration(&self, path: impl AsRef<Path>, secs: f64) {
        lock(&self.results).insert(path.as_ref().to_path_buf(), Ok(secs));
    }

    pub fn expect_failure(&self, path: impl AsRef<Path>, detail: &str) {
        lock(&self.results).insert(path.as_ref().to_path_buf(), Err(detail.to_string()));
    }

    /// Number of probes made for `path`.
    pub fn probe_count(&self, path: impl AsRef<Path>) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|p| p.as_path() == path.as_ref())
            .count()
    }

    pub fn total_probes(&self) -> usize {
        lock(&self.calls).len()
    }
}

impl FfprobeExecutor for MockFfprobeExecutor {
    fn probe_duration(&self, path: &Path) -> Result<f64, ProbeError> {
        lock(&self.calls).push(path.to_path_buf());
        match lock(&self.results).get(path) {
            Some(Ok(secs)) => Ok(*secs),
            Some(Err(detail)) => Err(ProbeError::new(path, detail.clone())),
            None => Err(ProbeError::new(path, "MockFfprobeExecutor: no expectation set")),
        }
    }
}

// ============================================================================
// TRANSFORMER
// ============================================================================

/// `Transformer` that never touches the filesystem.
///
/// Transforming modes report half the input size; copies report the input
/// size. Files whose path contains a registered pattern fail.
#[derive(Clone, Default)]
pub struct ScriptedTransformer {
    failures: Arc<Mutex<Vec<(String, String)>>>,
    jobs: Arc<Mutex<Vec<(MediaFile, TransformMode)>>>,
}

impl ScriptedTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, path_pattern: &str, detail: &str) {
        lock(&self.failures).push((path_pattern.to_string(), detail.to_string()));
    }

    /// Files and modes received so far, in arrival order.
    pub fn jobs(&self) -> Vec<(MediaFile, TransformMode)> {
        lock(&self.jobs).clone()
    }
}

impl Transformer for ScriptedTransformer {
    fn transform(&self, job: &TransformJob<'_>) -> TransformResult {
        lock(&self.jobs).push((job.file.clone(), job.mode.clone()));
        let input_size = job.file.size_bytes;
        let path = job.file.path.to_string_lossy();

        if let Some((_, detail)) = lock(&self.failures)
            .iter()
            .find(|(pattern, _)| path.contains(pattern.as_str()))
        {
            return TransformResult::failure(input_size, detail.clone());
        }

        let transformed = match &job.mode {
            TransformMode::Compress(_) => true,
            TransformMode::Trim { .. } => job.needs_cut().unwrap_or(false),
            TransformMode::PassthroughCopy => false,
        };
        TransformResult::Success {
            input_size,
            output_size: if transformed { input_size / 2 } else { input_size },
            transformed,
        }
    }
}

// ============================================================================
// DIRECTORY READER
// ============================================================================

/// In-memory directory tree implementing `DirectoryReader`.
#[derive(Debug, Clone, Default)]
pub struct VirtualFs {
    dirs: HashMap<PathBuf, Vec<DirEntryInfo>>,
    denied: HashSet<PathBuf>,
}

impl VirtualFs {
    /// Creates a tree containing only `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let mut fs = Self::default();
        fs.add_dir(root);
        fs
    }

    /// Adds a directory and any missing ancestors.
    pub fn add_dir(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        self.ensure_dir(dir.as_ref());
        self
    }

    /// Adds a file of `size` bytes and any missing ancestor directories.
    pub fn add_file(&mut self, path: impl AsRef<Path>, size: u64) -> &mut Self {
        self.add_entry(path.as_ref(), EntryKind::File, size);
        self
    }

    /// Adds an entry that is neither a file nor a directory.
    pub fn add_other(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.add_entry(path.as_ref(), EntryKind::Other, 0);
        self
    }

    /// Makes listing `dir` fail with permission denied.
    pub fn deny(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        self.denied.insert(dir.as_ref().to_path_buf());
        self
    }

    fn add_entry(&mut self, path: &Path, kind: EntryKind, size: u64) {
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            self.ensure_dir(parent);
            if let Some(entries) = self.dirs.get_mut(parent) {
                entries.push(DirEntryInfo {
                    name: name.to_os_string(),
                    kind,
                    size,
                });
            }
        }
    }

    fn ensure_dir(&mut self, dir: &Path) {
        if self.dirs.contains_key(dir) {
            return;
        }
        self.dirs.insert(dir.to_path_buf(), Vec::new());
        if let (Some(parent), Some(name)) = (dir.parent(), dir.file_name()) {
            self.ensure_dir(parent);
            if let Some(entries) = self.dirs.get_mut(parent) {
                entries.push(DirEntryInfo {
                    name: name.to_os_string(),
                    kind: EntryKind::Directory,
                    size: 0,
                });
            }
        }
    }
}

impl DirectoryReader for VirtualFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>> {
        if self.denied.contains(dir) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }
        self.dirs
            .get(dir)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such directory"))
    }
}
