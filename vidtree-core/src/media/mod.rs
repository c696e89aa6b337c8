//! Media file records produced by discovery.

use std::path::{Path, PathBuf};

/// A video file discovered under the batch root.
///
/// Identity is the input path. The record is not mutated after discovery;
/// `with_duration` returns a copy carrying the probed duration.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    /// Full input path
    pub path: PathBuf,
    /// Path relative to the batch root, file name included
    pub relative_path: PathBuf,
    /// Size in bytes at discovery time
    pub size_bytes: u64,
    /// Probed duration in seconds, absent until probed
    pub duration_secs: Option<f64>,
    /// Lowercase extension with a leading dot (".mp4")
    pub extension: String,
}

impl MediaFile {
    pub fn new(path: PathBuf, relative_path: PathBuf, size_bytes: u64) -> Self {
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        Self {
            path,
            relative_path,
            size_bytes,
            duration_secs: None,
            extension,
        }
    }

    #[must_use]
    pub fn with_duration(&self, duration_secs: f64) -> Self {
        Self {
            duration_secs: Some(duration_secs),
            ..self.clone()
        }
    }

    /// Mirrored destination under `output_root`, optionally with a new extension.
    pub fn destination(&self, output_root: &Path, output_extension: Option<&str>) -> PathBuf {
        let mirrored = output_root.join(&self.relative_path);
        match output_extension {
            Some(ext) => mirrored.with_extension(ext.trim_start_matches('.')),
            None => mirrored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_mirrors_relative_path() {
        let file = MediaFile::new(
            PathBuf::from("/in/A/clip.MOV"),
            PathBuf::from("A/clip.MOV"),
            10,
        );
        assert_eq!(file.extension, ".mov");
        assert_eq!(
            file.destination(Path::new("/out"), None),
            PathBuf::from("/out/A/clip.MOV")
        );
        assert_eq!(
            file.destination(Path::new("/out"), Some(".mp4")),
            PathBuf::from("/out/A/clip.mp4")
        );
    }

    #[test]
    fn with_duration_leaves_original_untouched() {
        let file = MediaFile::new(PathBuf::from("/in/a.mp4"), PathBuf::from("a.mp4"), 1);
        let probed = file.with_duration(12.5);
        assert_eq!(file.duration_secs, None);
        assert_eq!(probed.duration_secs, Some(12.5));
        assert_eq!(probed.path, file.path);
    }
}
