//! Event handler that reports batch progress through the `log` facade.

use super::{Event, EventHandler};
use crate::processing::TransformResult;
use crate::utils::{format_bytes, format_duration, percent_saved};

/// One log line per file plus start and summary lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventHandler;

impl EventHandler for LogEventHandler {
    fn handle(&self, event: &Event) {
        match event {
            Event::BatchStarted {
                input_dir,
                output_dir,
                policy,
                jobs,
            } => {
                log::info!(
                    "Starting {} batch: {} -> {} ({} job{})",
                    policy,
                    input_dir.display(),
                    output_dir.display(),
                    jobs,
                    if *jobs == 1 { "" } else { "s" }
                );
            }
            Event::FileStarted { path } => {
                log::debug!("Processing {}", path.display());
            }
            Event::FileOutcome {
                path,
                mode,
                result,
                elapsed_secs,
                ..
            } => match result {
                TransformResult::Success {
                    input_size,
                    output_size,
                    transformed: true,
                } => log::info!(
                    "{}: {} OK, {} -> {} ({:.1}% saved) in {}",
                    path.display(),
                    mode.unwrap_or("transform"),
                    format_bytes(*input_size),
                    format_bytes(*output_size),
                    percent_saved(*input_size, *output_size),
                    format_duration(*elapsed_secs)
                ),
                TransformResult::Success {
                    output_size,
                    transformed: false,
                    ..
                } if *mode == Some("skip") => log::info!(
                    "{}: kept existing output ({})",
                    path.display(),
                    format_bytes(*output_size)
                ),
                TransformResult::Success {
                    output_size,
                    transformed: false,
                    ..
                } => log::info!(
                    "{}: copied unchanged ({})",
                    path.display(),
                    format_bytes(*output_size)
                ),
                TransformResult::Failure { input_size, detail } => log::error!(
                    "{}: FAILED ({}): {}",
                    path.display(),
                    format_bytes(*input_size),
                    detail
                ),
            },
            Event::BatchCompleted { summary } => {
                log::info!("{}", summary.summary_line());
            }
        }
    }
}
