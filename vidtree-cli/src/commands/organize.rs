//! Implementation of the `organize` subcommand.

use crate::cli::OrganizeArgs;
use crate::commands::RunContext;
use crate::terminal;

use anyhow::{Context, bail};
use log::info;

use vidtree_core::organizer::{DownloadOrganizer, DriveFileSource, load_manifest};

/// Downloads every manifest row; per-row failures are counted, not fatal.
pub fn run_organize(ctx: &RunContext, args: &OrganizeArgs) -> anyhow::Result<i32> {
    let rows = load_manifest(&args.manifest)
        .with_context(|| format!("Failed to load manifest '{}'", args.manifest.display()))?;
    info!("Loaded {} manifest rows from {}", rows.len(), args.manifest.display());

    let Some(token) = args.token.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
        bail!("A Drive access token is required (--token or VIDTREE_DRIVE_TOKEN)");
    };

    let mut source = DriveFileSource::new(token).context("Failed to create Drive client")?;
    if let Some(base) = &args.api_base {
        source = source.with_base_url(base);
    }

    let stats = DownloadOrganizer::new(source, args.output_dir.clone())
        .run(&rows)
        .context("Organizer aborted")?;

    if ctx.json {
        println!("{}", serde_json::to_string(&stats).context("Failed to serialize stats")?);
    } else {
        terminal::print_organize_stats(&stats, ctx.colored);
    }
    Ok(0)
}
