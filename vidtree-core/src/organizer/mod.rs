// ============================================================================
// vidtree-core/src/organizer/mod.rs
// ============================================================================
//
// DOWNLOAD ORGANIZER: Building a Batch Root from a Manifest
//
// Each manifest row names a video and a shared-drive link. The organizer
// creates `<output>/<sanitized name>/` and downloads the remote file into it
// under its original name, producing a tree the batch pipeline can walk.
// A bad row is logged and counted; the run continues.

use crate::error::{CoreError, CoreResult};
use crate::utils::get_filename_safe;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub mod drive;

pub use drive::DriveFileSource;

static INVALID_NAME_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[<>:"/\\|?*]"#).expect("valid name pattern")
});

/// Link formats carrying a file id, tried in order.
static FILE_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"/d/([a-zA-Z0-9_-]+)", r"id=([a-zA-Z0-9_-]+)", r"/file/d/([a-zA-Z0-9_-]+)"]
        .iter()
        .map(|p| Regex::new(p).expect("valid link pattern"))
        .collect()
});

/// One manifest row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ManifestRow {
    #[serde(default)]
    pub video_name: Option<String>,
    #[serde(default, alias = "Download")]
    pub download: Option<String>,
}

/// Parses a JSON array of `{"video_name": .., "download": ..}` objects.
pub fn parse_manifest(text: &str) -> CoreResult<Vec<ManifestRow>> {
    Ok(serde_json::from_str(text)?)
}

pub fn load_manifest(path: &Path) -> CoreResult<Vec<ManifestRow>> {
    let text = fs::read_to_string(path).map_err(|e| {
        CoreError::Config(format!("cannot read manifest {}: {}", path.display(), e))
    })?;
    parse_manifest(&text)
}

/// Replaces characters that are invalid in folder names with '_'.
pub fn sanitize_folder_name(name: &str) -> String {
    INVALID_NAME_CHARS.replace_all(name, "_").into_owned()
}

/// Extracts the file id from a shared-drive link.
pub fn extract_file_id(link: &str) -> Option<String> {
    FILE_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(link))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// A remote store files can be fetched from by id.
pub trait RemoteFileSource {
    /// Original file name of the remote file.
    fn file_name(&self, file_id: &str) -> CoreResult<String>;
    /// Streams the file's bytes into `dest`, returning the byte count.
    fn download(&self, file_id: &str, dest: &mut dyn Write) -> CoreResult<u64>;
}

/// Totals for one organizer run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrganizeStats {
    pub rows: usize,
    pub downloaded: usize,
    /// Rows missing a name or link
    pub skipped: usize,
    pub failed: usize,
    pub bytes: u64,
}

/// Downloads manifest rows into per-name folders under `output_root`.
pub struct DownloadOrganizer<S: RemoteFileSource> {
    source: S,
    output_root: PathBuf,
}

impl<S: RemoteFileSource> DownloadOrganizer<S> {
    pub fn new(source: S, output_root: PathBuf) -> Self {
        Self {
            source,
            output_root,
        }
    }

    /// Processes every row. Only failing to create the output root is fatal.
    pub fn run(&self, rows: &[ManifestRow]) -> CoreResult<OrganizeStats> {
        fs::create_dir_all(&self.output_root).map_err(|source| CoreError::OutputRoot {
            path: self.output_root.display().to_string(),
            source,
        })?;

        let mut stats = OrganizeStats::default();
        for (index, row) in rows.iter().enumerate() {
            let row_number = index + 1;
            stats.rows += 1;

            let name = row.video_name.as_deref().map(str::trim).filter(|s| !s.is_empty());
            let link = row.download.as_deref().map(str::trim).filter(|s| !s.is_empty());
            let (Some(name), Some(link)) = (name, link) else {
                log::warn!("Skipping row {}: missing required information", row_number);
                stats.skipped += 1;
                continue;
            };

            log::info!("Processing video: {}", name);
            match self.fetch_row(name, link) {
                Ok((path, bytes)) => {
                    log::info!(
                        "Downloaded {} ({})",
                        path.display(),
                        crate::utils::format_bytes(bytes)
                    );
                    stats.downloaded += 1;
                    stats.bytes += bytes;
                }
                Err(e) => {
                    log::error!("Row {} ({}): {}", row_number, name, e);
                    stats.failed += 1;
                }
            }
        }

        log::info!(
            "Organizer finished: {} rows, {} downloaded, {} skipped, {} failed",
            stats.rows,
            stats.downloaded,
            stats.skipped,
            stats.failed
        );
        Ok(stats)
    }

    fn fetch_row(&self, name: &str, link: &str) -> CoreResult<(PathBuf, u64)> {
        let folder = self.output_root.join(sanitize_folder_name(name));
        fs::create_dir_all(&folder)?;

        let file_id =
            extract_file_id(link).ok_or_else(|| CoreError::InvalidRemoteLink(link.to_string()))?;
        let remote_name = self.source.file_name(&file_id)?;
        let file_name = get_filename_safe(Path::new(&remote_name))?;
        let target = folder.join(&file_name);

        // Bytes land in a side file first so an interrupted download never
        // leaves a truncated video in the tree.
        let partial = folder.join(format!("{file_name}.part"));
        let result = (|| -> CoreResult<u64> {
            let mut writer = BufWriter::new(fs::File::create(&partial)?);
            let bytes = self.source.download(&file_id, &mut writer)?;
            writer.flush()?;
            Ok(bytes)
        })();

        match result {
            Ok(bytes) => {
                fs::rename(&partial, &target)?;
                Ok((target, bytes))
            }
            Err(e) => {
                let _ = fs::remove_file(&partial);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_invalid_characters() {
        assert_eq!(sanitize_folder_name(r#"a<b>c:d"e/f\g|h?i*j"#), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_folder_name("Clip 01 - intro"), "Clip 01 - intro");
    }

    #[test]
    fn extracts_file_ids_from_link_formats() {
        assert_eq!(
            extract_file_id("https://drive.google.com/file/d/1AbC-d_9/view?usp=sharing").as_deref(),
            Some("1AbC-d_9")
        );
        assert_eq!(
            extract_file_id("https://drive.google.com/open?id=XYZ_123-a").as_deref(),
            Some("XYZ_123-a")
        );
        assert_eq!(
            extract_file_id("https://docs.google.com/d/QQQ/edit").as_deref(),
            Some("QQQ")
        );
        assert_eq!(extract_file_id("https://example.com/video.mp4"), None);
    }

    #[test]
    fn parses_manifest_rows() {
        let rows = parse_manifest(
            r#"[
                {"video_name": "Intro", "download": "https://drive.google.com/file/d/abc/view"},
                {"video_name": "No link"},
                {"Download": "https://drive.google.com/open?id=def"}
            ]"#,
        )
        .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].video_name.as_deref(), Some("Intro"));
        assert_eq!(rows[1].download, None);
        assert_eq!(rows[2].video_name, None);
        assert_eq!(rows[2].download.as_deref(), Some("https://drive.google.com/open?id=def"));
    }

    #[test]
    fn rejects_malformed_manifest() {
        assert!(matches!(parse_manifest("{not json"), Err(CoreError::Json(_))));
    }
}
