//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of one or more subcommands.

/// `compress`, `trim` and `copy`: one batch over a mirrored tree.
pub mod batch;
/// `organize`: builds a batch root from a download manifest.
pub mod organize;

use crate::cli::{Cli, Commands};
use crate::logging::{init_logging, use_color};

use std::path::PathBuf;
use vidtree_core::config::{CompressSettings, TransformPolicy, TrimSettings};

/// Per-invocation settings shared by every command.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub log_dir: PathBuf,
    pub json: bool,
    pub colored: bool,
}

/// Installs logging and runs the selected command, returning the exit status.
pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let ctx = RunContext {
        log_dir: cli.log_dir.clone().unwrap_or_else(|| PathBuf::from(".")),
        json: cli.json,
        colored: use_color(supports_color::Stream::Stdout),
    };
    let log_path = init_logging(cli.command.name(), &ctx.log_dir, cli.verbose, cli.json)?;
    log::info!("vidtree {} ({})", env!("CARGO_PKG_VERSION"), log_path.display());

    match &cli.command {
        Commands::Compress(args) => {
            let policy = TransformPolicy::Compress(CompressSettings {
                crf: args.crf,
                preset: args.preset.clone(),
                audio_bitrate: args.audio_bitrate.clone(),
            });
            batch::run_batch(&ctx, &args.walk, policy)
        }
        Commands::Trim(args) => {
            let policy = TransformPolicy::Trim(TrimSettings {
                max_duration_secs: args.max_duration,
            });
            batch::run_batch(&ctx, &args.walk, policy)
        }
        Commands::Copy(args) => batch::run_batch(&ctx, &args.walk, TransformPolicy::Passthrough),
        Commands::Organize(args) => organize::run_organize(&ctx, args),
    }
}
