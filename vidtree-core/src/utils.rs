//! Utility functions for formatting and file operations.
//!
//! General-purpose helpers used throughout vidtree-core and the CLI:
//! duration and byte formatting, savings arithmetic and path handling.

use std::path::Path;

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats bytes with appropriate binary units (B, KiB, MiB, GiB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let bytes_f64 = bytes as f64;
    if bytes_f64 >= GIB {
        format!("{:.2} GiB", bytes_f64 / GIB)
    } else if bytes_f64 >= MIB {
        format!("{:.2} MiB", bytes_f64 / MIB)
    } else if bytes_f64 >= KIB {
        format!("{:.2} KiB", bytes_f64 / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// Like `format_bytes` for a signed delta; negative values get a leading '-'.
#[must_use]
pub fn format_signed_bytes(bytes: i64) -> String {
    let magnitude = bytes.unsigned_abs();
    if bytes < 0 {
        format!("-{}", format_bytes(magnitude))
    } else {
        format_bytes(magnitude)
    }
}

/// Safely extracts filename from a path with consistent error handling.
/// Returns the filename as a String, or an error if the path has no filename component.
pub fn get_filename_safe(path: &Path) -> crate::CoreResult<String> {
    Ok(path
        .file_name()
        .ok_or_else(|| {
            crate::CoreError::PathError(format!("Failed to get filename for {}", path.display()))
        })?
        .to_string_lossy()
        .to_string())
}

/// Percentage saved going from `input_size` to `output_size`.
///
/// Negative when the output grew. Returns 0 if `input_size` is 0.
#[must_use]
pub fn percent_saved(input_size: u64, output_size: u64) -> f64 {
    if input_size == 0 {
        0.0
    } else {
        (1.0 - output_size as f64 / input_size as f64) * 100.0
    }
}
