// ============================================================================
// vidtree-core/src/processing/batch.rs
// ============================================================================
//
// BATCH ORCHESTRATION: Walking, Deciding, Transforming, Accounting
//
// `BatchOrchestrator` drives a `TreeWalker` over the batch root, mirrors each
// directory into the output root, applies the per-file decision rule and
// folds every outcome into `BatchStats`. A file's failure is recorded and the
// batch moves on; only an unreadable batch root or an output root that
// cannot be created abort the run, and both happen before any file.
//
// WORKFLOW (per file):
// 1. Claim the destination; a second input mapping to it fails
// 2. Ensure the mirrored parent directory exists
// 3. Optionally keep an existing non-empty destination
// 4. Probe the duration once when the policy is Trim
// 5. Run the transform, fold the result, emit one outcome event

use crate::config::{CoreConfig, TransformPolicy};
use crate::discovery::{DirectoryReader, OutputTree, StdFsReader, TreeWalker, WalkEntry};
use crate::error::{CoreError, CoreResult};
use crate::events::{Event, EventDispatcher, EventHandler};
use crate::external::{FfprobeExecutor, check_dependency};
use crate::media::MediaFile;
use crate::processing::transform::{TransformJob, TransformMode, TransformResult, Transformer};
use crate::reporting::{BatchStats, BatchSummary};

use rayon::iter::{ParallelBridge, ParallelIterator};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Verifies the external tools the configured policy needs.
///
/// Passthrough runs need nothing; compress needs ffmpeg; trim needs ffmpeg
/// and ffprobe.
pub fn check_required_tools(config: &CoreConfig) -> CoreResult<()> {
    if config.policy.needs_ffmpeg() {
        check_dependency(&config.ffmpeg_path)?;
    }
    if config.policy.needs_probe() {
        check_dependency(&config.ffprobe_path)?;
    }
    Ok(())
}

/// Runs one batch over `config.input_dir`.
///
/// # Examples
///
/// ```rust,no_run
/// use vidtree_core::config::CoreConfigBuilder;
/// use vidtree_core::events::LogEventHandler;
/// use vidtree_core::external::{CommandFfprobeExecutor, SidecarSpawner};
/// use vidtree_core::processing::{BatchOrchestrator, FfmpegTransformer};
/// use std::path::PathBuf;
/// use std::sync::Arc;
///
/// let config = CoreConfigBuilder::new()
///     .input_dir(PathBuf::from("/data/compressed_videos"))
///     .trim(7.0)
///     .build()
///     .unwrap();
/// let transformer = FfmpegTransformer::new(SidecarSpawner, &config.ffmpeg_path, config.tool_timeout);
/// let prober = CommandFfprobeExecutor::new(&config.ffprobe_path, config.tool_timeout);
///
/// let summary = BatchOrchestrator::new(config, transformer, prober)
///     .with_handler(Arc::new(LogEventHandler))
///     .run()
///     .unwrap();
/// println!("{} files, {} failed", summary.total_seen, summary.failed);
/// ```
pub struct BatchOrchestrator<T: Transformer, P: FfprobeExecutor> {
    config: CoreConfig,
    transformer: T,
    prober: P,
    events: EventDispatcher,
}

impl<T: Transformer, P: FfprobeExecutor> BatchOrchestrator<T, P> {
    pub fn new(config: CoreConfig, transformer: T, prober: P) -> Self {
        Self {
            config,
            transformer,
            prober,
            events: EventDispatcher::new(),
        }
    }

    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.events.add_handler(handler);
        self
    }

    /// Runs the batch against the real filesystem.
    pub fn run(&self) -> CoreResult<BatchSummary> {
        self.run_with_reader(&StdFsReader)
    }

    /// Runs the batch, listing directories through `reader`.
    pub fn run_with_reader<R: DirectoryReader + Sync>(&self, reader: &R) -> CoreResult<BatchSummary> {
        let started = Instant::now();

        let pool = if self.config.jobs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.jobs)
                .thread_name(|i| format!("vidtree-worker-{i}"))
                .build()
                .map_err(|e| CoreError::OperationFailed(format!("failed to start workers: {e}")))?;
            Some(pool)
        } else {
            None
        };

        let walker = TreeWalker::new(reader, &self.config.input_dir, &self.config.extensions)?;
        let tree = OutputTree::new(self.config.output_dir.clone());
        tree.create_root()?;

        self.events.emit(Event::BatchStarted {
            input_dir: self.config.input_dir.clone(),
            output_dir: self.config.output_dir.clone(),
            policy: self.config.policy.name().to_string(),
            jobs: self.config.jobs,
        });

        let stats = Mutex::new(BatchStats::new());

        // Directory entries arrive before anything beneath them, so creating
        // them here keeps the mirror ahead of the workers. Destinations are
        // claimed here too, so the first input in walk order wins a collision.
        let output_extension = self.config.output_extension.as_deref();
        let files = walker.filter_map(|entry| match entry {
            WalkEntry::Directory(relative) => {
                if let Err(e) = tree.ensure_dir(&relative) {
                    log::warn!(
                        "Failed to create output directory for {}: {}",
                        relative.display(),
                        e
                    );
                }
                None
            }
            WalkEntry::File(file) => {
                let destination = file.destination(tree.root(), output_extension);
                let claimed = tree.claim_destination(&destination);
                Some(Claimed {
                    file,
                    destination,
                    claimed,
                })
            }
        });

        match pool {
            Some(pool) => pool.install(|| {
                files
                    .par_bridge()
                    .for_each(|item| self.process_file(item, &tree, &stats));
            }),
            None => {
                for item in files {
                    self.process_file(item, &tree, &stats);
                }
            }
        }

        let stats = stats.into_inner().unwrap_or_else(PoisonError::into_inner);
        debug_assert!(stats.is_consistent());
        let summary = stats.summary(started.elapsed());
        self.events.emit(Event::BatchCompleted {
            summary: summary.clone(),
        });
        Ok(summary)
    }

    fn process_file(&self, item: Claimed, tree: &OutputTree, stats: &Mutex<BatchStats>) {
        let started = Instant::now();
        let Claimed {
            file,
            destination,
            claimed,
        } = item;
        self.events.emit(Event::FileStarted {
            path: file.path.clone(),
        });

        let (mode, result) = if claimed {
            self.execute(&file, &destination, tree)
        } else {
            log::warn!(
                "{} maps to {}, which another input already produces",
                file.path.display(),
                destination.display()
            );
            (
                None,
                TransformResult::failure(
                    file.size_bytes,
                    format!(
                        "destination {} collides with another input's output",
                        destination.display()
                    ),
                ),
            )
        };

        stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(&result);

        self.events.emit(Event::FileOutcome {
            path: file.path.clone(),
            destination,
            mode,
            result,
            elapsed_secs: started.elapsed().as_secs_f64(),
        });
    }

    /// Applies the decision rule to one file. Never fails: every problem
    /// becomes a `TransformResult::Failure`.
    fn execute(
        &self,
        file: &MediaFile,
        destination: &Path,
        tree: &OutputTree,
    ) -> (Option<&'static str>, TransformResult) {
        let input_size = file.size_bytes;

        if let Some(parent) = file.relative_path.parent() {
            if let Err(e) = tree.ensure_dir(parent) {
                return (
                    None,
                    TransformResult::failure(input_size, format!("failed to create output directory: {e}")),
                );
            }
        }

        if self.config.skip_existing {
            if let Ok(meta) = fs::metadata(destination) {
                if meta.is_file() && meta.len() > 0 {
                    log::debug!("Keeping existing output {}", destination.display());
                    return (
                        Some("skip"),
                        TransformResult::Success {
                            input_size,
                            output_size: meta.len(),
                            transformed: false,
                        },
                    );
                }
            }
        }

        let probed;
        let (subject, mode) = match &self.config.policy {
            TransformPolicy::Compress(settings) => (file, TransformMode::Compress(settings.clone())),
            TransformPolicy::Trim(settings) => match self.prober.probe_duration(&file.path) {
                Ok(duration_secs) => {
                    probed = file.with_duration(duration_secs);
                    (
                        &probed,
                        TransformMode::Trim {
                            max_duration_secs: settings.max_duration_secs,
                        },
                    )
                }
                Err(e) => return (None, TransformResult::failure(input_size, e.to_string())),
            },
            TransformPolicy::Passthrough => (file, TransformMode::PassthroughCopy),
        };

        let name = mode.name();
        let job = TransformJob {
            file: subject,
            destination: destination.to_path_buf(),
            mode,
        };
        (Some(name), self.transformer.transform(&job))
    }
}

/// A discovered file together with its reserved destination.
struct Claimed {
    file: MediaFile,
    destination: PathBuf,
    /// False when an earlier input already maps to `destination`
    claimed: bool,
}
