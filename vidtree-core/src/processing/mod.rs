//! Batch processing: per-file transforms and the orchestrator that drives them.

/// Batch orchestration over a walked directory tree
pub mod batch;

/// Transform modes, jobs and results
pub mod transform;

pub use batch::{BatchOrchestrator, check_required_tools};
pub use transform::{FfmpegTransformer, TransformJob, TransformMode, TransformResult, Transformer};
