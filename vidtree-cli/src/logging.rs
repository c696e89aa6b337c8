// ============================================================================
// vidtree-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: fern dispatch to the console and a run log file
//
// The core only talks to the `log` facade; this module installs the single
// global backend. Console lines carry a colored level tag when the terminal
// supports it, the file gets plain timestamped lines. In JSON mode the
// console copy moves to stderr so stdout carries only events.

use anyhow::Context;
use log::{Level, LevelFilter};
use owo_colors::OwoColorize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Log target for fatal errors. Written to the log file only; the console
/// copy is printed by `terminal::print_fatal`.
pub const FATAL_TARGET: &str = "vidtree::fatal";

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// ```
/// let log_filename = format!("vidtree_trim_{}.log", vidtree_cli::logging::get_timestamp());
/// assert!(log_filename.ends_with(".log"));
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Path of the run log for `command` inside `log_dir`.
pub fn log_file_path(log_dir: &Path, command: &str, timestamp: &str) -> PathBuf {
    log_dir.join(format!("vidtree_{command}_{timestamp}.log"))
}

/// Whether the given console stream should get ANSI colors.
pub fn use_color(stream: supports_color::Stream) -> bool {
    supports_color::on(stream).is_some()
}

fn colored_level(level: Level) -> String {
    match level {
        Level::Error => "ERROR".red().bold().to_string(),
        Level::Warn => "WARN ".yellow().to_string(),
        Level::Info => "INFO ".green().to_string(),
        Level::Debug => "DEBUG".blue().to_string(),
        Level::Trace => "TRACE".magenta().to_string(),
    }
}

/// Installs the global logger and returns the log file path.
pub fn init_logging(
    command: &str,
    log_dir: &Path,
    verbose: bool,
    json: bool,
) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory '{}'", log_dir.display()))?;
    let log_path = log_file_path(log_dir, command, &get_timestamp());

    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let file_dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{:<5}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                message
            ))
        })
        .chain(
            fern::log_file(&log_path)
                .with_context(|| format!("Failed to create log file '{}'", log_path.display()))?,
        );

    let stream = if json {
        supports_color::Stream::Stderr
    } else {
        supports_color::Stream::Stdout
    };
    let colored = use_color(stream);
    let console_dispatch = fern::Dispatch::new()
        .filter(|metadata| metadata.target() != FATAL_TARGET)
        .format(move |out, message, record| {
            if colored {
                out.finish(format_args!("{} {}", colored_level(record.level()), message))
            } else {
                out.finish(format_args!("{:<5} {}", record.level(), message))
            }
        });
    let console_dispatch = if json {
        console_dispatch.chain(io::stderr())
    } else {
        console_dispatch.chain(io::stdout())
    };

    fern::Dispatch::new()
        .level(level)
        .chain(file_dispatch)
        .chain(console_dispatch)
        .apply()
        .context("Failed to install logger")?;

    log::debug!("Logging to {}", log_path.display());
    Ok(log_path)
}
