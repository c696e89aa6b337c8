//! Batch statistics and the final run summary.
//!
//! `BatchStats` is the accumulator folded after every file; `BatchSummary`
//! is the immutable snapshot handed to reporters and written as JSON.

use crate::processing::TransformResult;
use crate::utils::percent_saved;

use chrono::{DateTime, Local};
use serde::Serialize;
use std::time::Duration;

/// Running totals for one batch.
///
/// `succeeded + failed == total_seen` holds after every `record`. Byte
/// totals cover transformed files only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub total_seen: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub transformed: usize,
    /// Successes that were not transformed (copies and resumed files)
    pub skipped: usize,
    pub input_bytes: u64,
    pub output_bytes: u64,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one outcome into the totals.
    pub fn record(&mut self, result: &TransformResult) {
        self.total_seen += 1;
        match result {
            TransformResult::Success {
                input_size,
                output_size,
                transformed,
            } => {
                self.succeeded += 1;
                if *transformed {
                    self.transformed += 1;
                    self.input_bytes += input_size;
                    self.output_bytes += output_size;
                } else {
                    self.skipped += 1;
                }
            }
            TransformResult::Failure { .. } => self.failed += 1,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.succeeded + self.failed == self.total_seen
            && self.transformed + self.skipped == self.succeeded
    }

    pub fn bytes_saved(&self) -> i64 {
        self.input_bytes as i64 - self.output_bytes as i64
    }

    pub fn percent_saved(&self) -> f64 {
        percent_saved(self.input_bytes, self.output_bytes)
    }

    /// Snapshot of the current totals.
    pub fn summary(&self, elapsed: Duration) -> BatchSummary {
        BatchSummary {
            total_seen: self.total_seen,
            succeeded: self.succeeded,
            failed: self.failed,
            transformed: self.transformed,
            skipped: self.skipped,
            input_bytes: self.input_bytes,
            output_bytes: self.output_bytes,
            bytes_saved: self.bytes_saved(),
            percent_saved: self.percent_saved(),
            elapsed_secs: elapsed.as_secs_f64(),
            finished_at: Local::now(),
        }
    }
}

/// Final report of a completed batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total_seen: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub transformed: usize,
    pub skipped: usize,
    pub input_bytes: u64,
    pub output_bytes: u64,
    /// Negative when transformed outputs grew
    pub bytes_saved: i64,
    pub percent_saved: f64,
    pub elapsed_secs: f64,
    pub finished_at: DateTime<Local>,
}

impl BatchSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// One-line human readable summary.
    pub fn summary_line(&self) -> String {
        format!(
            "Processed {} files: {} succeeded, {} failed, {} transformed, {} skipped; saved {} ({:.1}%) in {}",
            self.total_seen,
            self.succeeded,
            self.failed,
            self.transformed,
            self.skipped,
            crate::utils::format_signed_bytes(self.bytes_saved),
            self.percent_saved,
            crate::utils::format_duration(self.elapsed_secs),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(input: u64, output: u64, transformed: bool) -> TransformResult {
        TransformResult::Success {
            input_size: input,
            output_size: output,
            transformed,
        }
    }

    #[test]
    fn record_keeps_counts_consistent() {
        let mut stats = BatchStats::new();
        let results = [
            success(100, 40, true),
            TransformResult::failure(50, "ffmpeg exited with 1"),
            success(30, 30, false),
            success(200, 60, true),
        ];

        for result in &results {
            stats.record(result);
            assert!(stats.is_consistent());
        }

        assert_eq!(stats.total_seen, 4);
        assert_eq!(stats.succeeded, 3);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.transformed, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.input_bytes, 300);
        assert_eq!(stats.output_bytes, 100);
    }

    #[test]
    fn percent_saved_is_over_transformed_files() {
        let mut stats = BatchStats::new();
        stats.record(&success(1000, 250, true));
        stats.record(&success(500, 500, false));

        let summary = stats.summary(Duration::from_secs(3));
        assert_eq!(summary.bytes_saved, 750);
        assert!((summary.percent_saved - 75.0).abs() < 1e-9);
        assert_eq!(summary.elapsed_secs, 3.0);
    }

    #[test]
    fn empty_batch_reports_zero_percent() {
        let summary = BatchStats::new().summary(Duration::ZERO);
        assert_eq!(summary.total_seen, 0);
        assert_eq!(summary.percent_saved, 0.0);
        assert_eq!(summary.bytes_saved, 0);
        assert!(!summary.has_failures());
    }

    #[test]
    fn growth_is_negative_savings() {
        let mut stats = BatchStats::new();
        stats.record(&success(100, 150, true));
        let summary = stats.summary(Duration::ZERO);
        assert_eq!(summary.bytes_saved, -50);
        assert!(summary.percent_saved < 0.0);
        assert!(summary.summary_line().contains("-50 B"));
    }

    #[test]
    fn summary_serializes_to_json() {
        let summary = BatchStats::new().summary(Duration::from_millis(1500));
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["total_seen"], 0);
        assert_eq!(value["elapsed_secs"], 1.5);
        assert!(value["finished_at"].is_string());
    }
}
