//! Implementation of the batch subcommands: `compress`, `trim` and `copy`.
//!
//! All three share the same flow: resolve paths, build and validate a
//! `CoreConfig`, check the external tools the policy needs, run the
//! orchestrator and report.

use crate::cli::WalkArgs;
use crate::commands::RunContext;
use crate::logging::get_timestamp;
use crate::terminal;

use anyhow::Context;
use log::info;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use vidtree_core::config::{CoreConfig, CoreConfigBuilder, TransformPolicy};
use vidtree_core::events::{JsonEventHandler, LogEventHandler};
use vidtree_core::external::{CommandFfprobeExecutor, SidecarSpawner};
use vidtree_core::processing::{BatchOrchestrator, FfmpegTransformer, check_required_tools};
use vidtree_core::BatchSummary;

/// Exit status for a completed batch: 2 when `strict` and any file failed.
pub fn exit_code(summary: &BatchSummary, strict: bool) -> i32 {
    if strict && summary.has_failures() { 2 } else { 0 }
}

/// Absolute form of a possibly not yet existing output path, with symlinks
/// resolved along its deepest existing ancestor.
pub fn resolve_output_dir(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        match existing.canonicalize() {
            Ok(resolved) => {
                return Ok(missing
                    .iter()
                    .rev()
                    .fold(resolved, |acc, part| acc.join(part)));
            }
            Err(_) => match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    missing.push(name.to_os_string());
                    existing = parent;
                }
                _ => return Ok(absolute),
            },
        }
    }
}

/// Builds the core configuration from the shared walk flags.
pub fn build_config(
    walk: &WalkArgs,
    policy: TransformPolicy,
    log_dir: &Path,
) -> anyhow::Result<CoreConfig> {
    let input_dir = walk
        .input_dir
        .canonicalize()
        .with_context(|| format!("Invalid input path '{}'", walk.input_dir.display()))?;

    let mut builder = CoreConfigBuilder::new()
        .input_dir(input_dir)
        .log_dir(log_dir.to_path_buf())
        .policy(policy)
        .skip_existing(walk.skip_existing)
        .jobs(walk.jobs)
        .ffmpeg_path(&walk.ffmpeg)
        .ffprobe_path(&walk.ffprobe);

    if let Some(output_dir) = &walk.output_dir {
        let output_dir = resolve_output_dir(output_dir).with_context(|| {
            format!("Invalid output path '{}'", output_dir.display())
        })?;
        builder = builder.output_dir(output_dir);
    }
    if let Some(extensions) = &walk.extensions {
        builder = builder.extensions(extensions);
    }
    if let Some(ext) = &walk.output_extension {
        builder = builder.output_extension(ext);
    }
    if let Some(secs) = walk.timeout {
        builder = builder.tool_timeout(Duration::from_secs(secs));
    }

    builder.build().context("Invalid configuration")
}

/// Writes the summary as pretty JSON next to the run log.
pub fn write_summary_json(summary: &BatchSummary, log_dir: &Path) -> anyhow::Result<PathBuf> {
    let path = log_dir.join(format!("vidtree_summary_{}.json", get_timestamp()));
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;
    fs::write(&path, json)
        .with_context(|| format!("Failed to write summary '{}'", path.display()))?;
    Ok(path)
}

/// Runs one batch and returns the process exit status.
pub fn run_batch(
    ctx: &RunContext,
    walk: &WalkArgs,
    policy: TransformPolicy,
) -> anyhow::Result<i32> {
    let config = build_config(walk, policy, &ctx.log_dir)?;
    check_required_tools(&config).context("Dependency check failed")?;

    info!("Input directory: {}", config.input_dir.display());
    info!("Output directory: {}", config.output_dir.display());
    info!("Policy: {}", config.policy.name());

    let transformer =
        FfmpegTransformer::new(SidecarSpawner, &config.ffmpeg_path, config.tool_timeout);
    let prober = CommandFfprobeExecutor::new(&config.ffprobe_path, config.tool_timeout);

    // The run log always gets per-file lines; JSON events are added on top.
    let mut orchestrator =
        BatchOrchestrator::new(config, transformer, prober).with_handler(Arc::new(LogEventHandler));
    if ctx.json {
        orchestrator = orchestrator.with_handler(Arc::new(JsonEventHandler::new()));
    }
    let summary = orchestrator.run().context("Batch aborted")?;

    if ctx.json {
        let path = write_summary_json(&summary, &ctx.log_dir)?;
        info!("Summary written to {}", path.display());
    } else {
        terminal::print_batch_summary(&summary, ctx.colored);
    }

    Ok(exit_code(&summary, walk.strict))
}
