//! File discovery: walking the batch root and mirroring its directories.
//!
//! Discovery is split in two. `TreeWalker` is a pure enumeration over a
//! `DirectoryReader`, so it runs unchanged against the real filesystem or an
//! in-memory tree. `OutputTree` is the side-effecting half that creates the
//! mirrored destination directories, idempotently and safely from several
//! workers at once.

use crate::error::{CoreError, CoreResult};
use crate::media::MediaFile;

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// ============================================================================
// DIRECTORY READING ABSTRACTION
// ============================================================================

/// Kind of a directory entry as seen by the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: OsString,
    pub kind: EntryKind,
    /// Size in bytes, meaningful for files only
    pub size: u64,
}

/// Lists directory contents. Implemented for the real filesystem by
/// `StdFsReader` and for tests by `external::mocks::VirtualFs`.
pub trait DirectoryReader {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>>;
}

/// `DirectoryReader` backed by `std::fs`.
///
/// Symlinks to files are followed; symlinks to directories are not
/// descended into, which keeps cyclic links from looping the walk.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFsReader;

impl DirectoryReader for StdFsReader {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::debug!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(e) => {
                    log::debug!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            let (kind, size) = if file_type.is_dir() {
                (EntryKind::Directory, 0)
            } else if file_type.is_file() || file_type.is_symlink() {
                match fs::metadata(entry.path()) {
                    Ok(meta) if meta.is_file() => (EntryKind::File, meta.len()),
                    _ => (EntryKind::Other, 0),
                }
            } else {
                (EntryKind::Other, 0)
            };

            entries.push(DirEntryInfo {
                name: entry.file_name(),
                kind,
                size,
            });
        }
        Ok(entries)
    }
}

// ============================================================================
// TREE WALKER
// ============================================================================

/// An item produced by `TreeWalker`.
#[derive(Debug, Clone, PartialEq)]
pub enum WalkEntry {
    /// A directory, relative to the root (empty for the root itself).
    /// Always yielded before anything beneath it.
    Directory(PathBuf),
    /// A file with a recognized extension.
    File(MediaFile),
}

/// Returns true when `name` ends with one of `extensions`, ignoring case.
/// Extensions are expected in normalized form (lowercase, leading dot).
#[must_use]
pub fn has_recognized_extension(name: &str, extensions: &[String]) -> bool {
    let lowered = name.to_lowercase();
    extensions.iter().any(|ext| lowered.ends_with(ext.as_str()))
}

/// Lazy depth-first enumeration of a batch root.
///
/// Each directory is listed when it is reached; its matching files are
/// yielded (sorted by name) before its subdirectories are descended. The
/// sequence is finite and cannot be restarted. Unreadable subdirectories are
/// logged and skipped.
pub struct TreeWalker<'a, R: DirectoryReader> {
    reader: &'a R,
    root: PathBuf,
    extensions: Vec<String>,
    /// Directories still to visit, relative to root; popped from the end
    stack: Vec<PathBuf>,
    /// Entries of the directory currently being emitted
    queue: std::collections::VecDeque<WalkEntry>,
}

impl<'a, R: DirectoryReader> TreeWalker<'a, R> {
    /// Starts a walk. The root is listed immediately so an unreadable root
    /// fails here, before anything is processed.
    pub fn new(reader: &'a R, root: &Path, extensions: &[String]) -> CoreResult<Self> {
        let mut walker = Self {
            reader,
            root: root.to_path_buf(),
            extensions: extensions.to_vec(),
            stack: Vec::new(),
            queue: std::collections::VecDeque::new(),
        };

        let listing = reader.read_dir(root).map_err(|e| {
            CoreError::InvalidBatchRoot(format!("{}: {}", root.display(), e))
        })?;
        walker.enqueue_directory(PathBuf::new(), listing);
        Ok(walker)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn enqueue_directory(&mut self, relative: PathBuf, mut listing: Vec<DirEntryInfo>) {
        listing.sort_by(|a, b| a.name.cmp(&b.name));
        self.queue.push_back(WalkEntry::Directory(relative.clone()));

        let mut subdirs = Vec::new();
        for entry in listing {
            let rel_path = relative.join(&entry.name);
            match entry.kind {
                EntryKind::Directory => subdirs.push(rel_path),
                EntryKind::File => {
                    let name = entry.name.to_string_lossy();
                    if has_recognized_extension(&name, &self.extensions) {
                        let file = MediaFile::new(self.root.join(&rel_path), rel_path, entry.size);
                        self.queue.push_back(WalkEntry::File(file));
                    } else {
                        log::trace!("Ignoring non-video file {}", rel_path.display());
                    }
                }
                EntryKind::Other => {}
            }
        }

        // Reverse so the alphabetically first subdirectory is visited next
        self.stack.extend(subdirs.into_iter().rev());
    }
}

impl<R: DirectoryReader> Iterator for TreeWalker<'_, R> {
    type Item = WalkEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.queue.pop_front() {
                return Some(entry);
            }
            let relative = self.stack.pop()?;
            let absolute = self.root.join(&relative);
            match self.reader.read_dir(&absolute) {
                Ok(listing) => self.enqueue_directory(relative, listing),
                Err(e) => {
                    log::warn!("Skipping unreadable directory {}: {}", absolute.display(), e);
                }
            }
        }
    }
}

/// Collects every matching file under `input_dir` using the real filesystem.
///
/// # Examples
///
/// ```rust,no_run
/// use vidtree_core::discovery::find_processable_files;
/// use vidtree_core::config::CoreConfig;
/// use std::path::Path;
///
/// let extensions = CoreConfig::default().extensions;
/// let files = find_processable_files(Path::new("/path/to/videos"), &extensions).unwrap();
/// println!("Found {} video files", files.len());
/// ```
pub fn find_processable_files(input_dir: &Path, extensions: &[String]) -> CoreResult<Vec<MediaFile>> {
    let reader = StdFsReader;
    let walker = TreeWalker::new(&reader, input_dir, extensions)?;
    Ok(walker
        .filter_map(|entry| match entry {
            WalkEntry::File(file) => Some(file),
            WalkEntry::Directory(_) => None,
        })
        .collect())
}

// ============================================================================
// OUTPUT TREE
// ============================================================================

/// Creates mirrored output directories.
///
/// Each distinct relative directory is created at most once per run;
/// directories that already exist are not an error.
#[derive(Debug)]
pub struct OutputTree {
    root: PathBuf,
    created: Mutex<HashSet<PathBuf>>,
    claimed: Mutex<HashSet<PathBuf>>,
}

impl OutputTree {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            created: Mutex::new(HashSet::new()),
            claimed: Mutex::new(HashSet::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the output root. Failure here is fatal for the run.
    pub fn create_root(&self) -> CoreResult<()> {
        self.ensure_dir(Path::new("")).map(|_| ()).map_err(|source| CoreError::OutputRoot {
            path: self.root.display().to_string(),
            source,
        })
    }

    /// Creates `root/relative` (and parents) unless already done this run.
    pub fn ensure_dir(&self, relative: &Path) -> io::Result<PathBuf> {
        let target = self.root.join(relative);
        let mut created = self
            .created
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if !created.contains(&target) {
            fs::create_dir_all(&target)?;
            log::debug!("Created output directory {}", target.display());
            created.insert(target.clone());
        }
        Ok(target)
    }

    /// Reserves `destination` for one input file. Returns false when another
    /// input of this run already maps to the same path.
    pub fn claim_destination(&self, destination: &Path) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(destination.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts() -> Vec<String> {
        crate::config::DEFAULT_EXTENSIONS
            .iter()
            .map(|e| (*e).to_string())
            .collect()
    }

    #[test]
    fn recognizes_extensions_case_insensitively() {
        let exts = exts();
        assert!(has_recognized_extension("clip.MP4", &exts));
        assert!(has_recognized_extension("clip.WebM", &exts));
        assert!(has_recognized_extension("archive.tar.mkv", &exts));
        assert!(!has_recognized_extension("notes.txt", &exts));
        assert!(!has_recognized_extension("mp4", &exts));
    }

    #[test]
    fn output_tree_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let tree = OutputTree::new(dir.path().join("out"));
        tree.create_root().unwrap();

        let first = tree.ensure_dir(Path::new("A/B")).unwrap();
        let second = tree.ensure_dir(Path::new("A/B")).unwrap();
        assert_eq!(first, second);
        assert!(first.is_dir());
        assert!(dir.path().join("out/A").is_dir());

        // A directory created outside the tracker is still fine
        std::fs::create_dir_all(dir.path().join("out/C")).unwrap();
        assert!(tree.ensure_dir(Path::new("C")).is_ok());
    }

    #[test]
    fn destinations_are_claimed_once() {
        let tree = OutputTree::new(PathBuf::from("/out"));
        assert!(tree.claim_destination(Path::new("/out/A/x.mp4")));
        assert!(!tree.claim_destination(Path::new("/out/A/x.mp4")));
        assert!(tree.claim_destination(Path::new("/out/B/x.mp4")));
    }

    #[test]
    fn create_root_reports_fatal_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let tree = OutputTree::new(blocker.join("out"));
        assert!(matches!(tree.create_root(), Err(CoreError::OutputRoot { .. })));
    }
}
