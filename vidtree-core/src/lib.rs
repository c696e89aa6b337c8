//! Core library for mirroring a tree of videos through ffmpeg.
//!
//! This crate walks a batch root, mirrors its directory structure into an
//! output root and applies one transform policy per run (compress, trim or
//! plain copy), accounting for every file in a `BatchSummary`. It also
//! provides the download organizer that builds a batch root from a manifest
//! of shared-drive links.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use vidtree_core::config::CoreConfigBuilder;
//! use vidtree_core::events::LogEventHandler;
//! use vidtree_core::external::{CommandFfprobeExecutor, SidecarSpawner};
//! use vidtree_core::processing::{BatchOrchestrator, FfmpegTransformer, check_required_tools};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! let config = CoreConfigBuilder::new()
//!     .input_dir(PathBuf::from("/path/to/downloaded_videos"))
//!     .compress(35, "medium", "128k")
//!     .jobs(2)
//!     .build()
//!     .unwrap();
//! check_required_tools(&config).unwrap();
//!
//! let transformer = FfmpegTransformer::new(SidecarSpawner, &config.ffmpeg_path, config.tool_timeout);
//! let prober = CommandFfprobeExecutor::new(&config.ffprobe_path, config.tool_timeout);
//! let summary = BatchOrchestrator::new(config, transformer, prober)
//!     .with_handler(Arc::new(LogEventHandler))
//!     .run()
//!     .unwrap();
//!
//! println!("{}", summary.summary_line());
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod external;
pub mod media;
pub mod organizer;
pub mod processing;
pub mod reporting;
pub mod utils;

// Re-exports for public API
pub use config::{CoreConfig, CoreConfigBuilder, TransformPolicy};
pub use discovery::{TreeWalker, WalkEntry, find_processable_files};
pub use error::{CoreError, CoreResult};
pub use media::MediaFile;
pub use processing::{BatchOrchestrator, TransformResult};
pub use reporting::{BatchStats, BatchSummary};
pub use utils::{format_bytes, format_duration};
