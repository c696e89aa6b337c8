//! Terminal output for run summaries and fatal errors.
//!
//! Log lines go through `log`; this module prints the closing blocks that
//! are meant for a human reading the terminal.

use owo_colors::OwoColorize;
use vidtree_core::organizer::OrganizeStats;
use vidtree_core::utils::{format_bytes, format_duration, format_signed_bytes};
use vidtree_core::BatchSummary;

const RULE_WIDTH: usize = 50;

fn rule(colored: bool) -> String {
    let line = "=".repeat(RULE_WIDTH);
    if colored {
        line.bright_blue().to_string()
    } else {
        line
    }
}

fn label(text: &str, colored: bool) -> String {
    let padded = format!("{text:<14}");
    if colored {
        padded.bold().to_string()
    } else {
        padded
    }
}

/// Renders the closing block of a batch run.
pub fn render_batch_summary(summary: &BatchSummary, colored: bool) -> String {
    let failed = summary.failed.to_string();
    let failed = if colored && summary.failed > 0 {
        failed.red().bold().to_string()
    } else {
        failed
    };
    let saved = format!(
        "{} ({:.1}%)",
        format_signed_bytes(summary.bytes_saved),
        summary.percent_saved
    );
    let saved = if colored && summary.bytes_saved > 0 {
        saved.green().to_string()
    } else {
        saved
    };

    let mut lines = vec![
        rule(colored),
        summary.summary_line(),
        rule(colored),
        format!("{}{}", label("Files:", colored), summary.total_seen),
        format!("{}{}", label("Succeeded:", colored), summary.succeeded),
        format!("{}{}", label("Failed:", colored), failed),
        format!("{}{}", label("Transformed:", colored), summary.transformed),
        format!("{}{}", label("Skipped:", colored), summary.skipped),
    ];
    if summary.transformed > 0 {
        lines.push(format!(
            "{}{}",
            label("Input size:", colored),
            format_bytes(summary.input_bytes)
        ));
        lines.push(format!(
            "{}{}",
            label("Output size:", colored),
            format_bytes(summary.output_bytes)
        ));
    }
    lines.push(format!("{}{}", label("Saved:", colored), saved));
    lines.push(format!(
        "{}{}",
        label("Elapsed:", colored),
        format_duration(summary.elapsed_secs)
    ));
    lines.join("\n")
}

pub fn print_batch_summary(summary: &BatchSummary, colored: bool) {
    println!("{}", render_batch_summary(summary, colored));
}

pub fn print_organize_stats(stats: &OrganizeStats, colored: bool) {
    println!("{}", rule(colored));
    println!("{}{}", label("Rows:", colored), stats.rows);
    println!("{}{}", label("Downloaded:", colored), stats.downloaded);
    println!("{}{}", label("Skipped:", colored), stats.skipped);
    println!("{}{}", label("Failed:", colored), stats.failed);
    println!("{}{}", label("Bytes:", colored), format_bytes(stats.bytes));
}

/// Prints a fatal error with its full cause chain to stderr.
pub fn print_fatal(error: &anyhow::Error, colored: bool) {
    if colored {
        eprintln!("{} {:#}", "Error:".red().bold(), error);
    } else {
        eprintln!("Error: {error:#}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vidtree_core::BatchStats;
    use vidtree_core::TransformResult;

    #[test]
    fn plain_summary_lists_counts() {
        let mut stats = BatchStats::new();
        stats.record(&TransformResult::Success {
            input_size: 1000,
            output_size: 400,
            transformed: true,
        });
        stats.record(&TransformResult::failure(10, "boom"));
        let text = render_batch_summary(&stats.summary(Duration::from_secs(65)), false);

        assert!(text.contains("Processed 2 files: 1 succeeded, 1 failed"));
        assert!(text.contains("Failed:       1"));
        assert!(text.contains("(60.0%)"));
        assert!(text.contains("Input size:"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn sizes_hidden_when_nothing_transformed() {
        let text = render_batch_summary(&BatchStats::new().summary(Duration::ZERO), false);
        assert!(!text.contains("Input size:"));
        assert!(text.contains("(0.0%)"));
    }
}
