// vidtree-core/tests/discovery_tests.rs

use vidtree_core::config::DEFAULT_EXTENSIONS;
use vidtree_core::discovery::{OutputTree, StdFsReader, TreeWalker, WalkEntry, find_processable_files};
use vidtree_core::error::CoreError;
use vidtree_core::external::mocks::VirtualFs;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect()
}

fn sample_tree() -> VirtualFs {
    let mut vfs = VirtualFs::new("/videos");
    vfs.add_file("/videos/A/1.mp4", 500)
        .add_file("/videos/A/2.mp4", 1200)
        .add_file("/videos/A/notes.txt", 3)
        .add_file("/videos/B/3.MOV", 300)
        .add_file("/videos/B/deep/er/4.mkv", 40)
        .add_file("/videos/top.webm", 10)
        .add_dir("/videos/Empty")
        .add_other("/videos/A/socket.mp4");
    vfs
}

#[test]
fn test_walker_yields_every_matching_file_once() {
    let vfs = sample_tree();
    let walker = TreeWalker::new(&vfs, Path::new("/videos"), &default_extensions()).unwrap();

    let files: Vec<PathBuf> = walker
        .filter_map(|entry| match entry {
            WalkEntry::File(file) => Some(file.relative_path),
            WalkEntry::Directory(_) => None,
        })
        .collect();

    let expected: Vec<PathBuf> = [
        "top.webm",
        "A/1.mp4",
        "A/2.mp4",
        "B/3.MOV",
        "B/deep/er/4.mkv",
    ]
    .iter()
    .map(PathBuf::from)
    .collect();
    assert_eq!(files, expected);

    let unique: HashSet<&PathBuf> = files.iter().collect();
    assert_eq!(unique.len(), files.len());
}

#[test]
fn test_walker_yields_directories_before_their_contents() {
    let vfs = sample_tree();
    let walker = TreeWalker::new(&vfs, Path::new("/videos"), &default_extensions()).unwrap();

    let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
    let mut all_dirs = Vec::new();
    for entry in walker {
        match entry {
            WalkEntry::Directory(rel) => {
                if let Some(parent) = rel.parent() {
                    assert!(seen_dirs.contains(parent), "{} before its parent", rel.display());
                }
                seen_dirs.insert(rel.clone());
                all_dirs.push(rel);
            }
            WalkEntry::File(file) => {
                let parent = file.relative_path.parent().unwrap();
                assert!(seen_dirs.contains(parent), "{} before its directory", file.relative_path.display());
            }
        }
    }

    assert_eq!(all_dirs[0], PathBuf::new());
    for dir in ["A", "B", "B/deep", "B/deep/er", "Empty"] {
        assert!(seen_dirs.contains(Path::new(dir)), "missing directory {dir}");
    }
}

#[test]
fn test_walker_records_file_attributes() {
    let vfs = sample_tree();
    let walker = TreeWalker::new(&vfs, Path::new("/videos"), &default_extensions()).unwrap();

    let mov = walker
        .filter_map(|entry| match entry {
            WalkEntry::File(file) if file.relative_path == Path::new("B/3.MOV") => Some(file),
            _ => None,
        })
        .next()
        .unwrap();

    assert_eq!(mov.path, PathBuf::from("/videos/B/3.MOV"));
    assert_eq!(mov.size_bytes, 300);
    assert_eq!(mov.extension, ".mov");
    assert_eq!(mov.duration_secs, None);
}

#[test]
fn test_walker_honors_custom_extensions() {
    let vfs = sample_tree();
    let extensions = vec![".mov".to_string()];
    let files: Vec<WalkEntry> = TreeWalker::new(&vfs, Path::new("/videos"), &extensions)
        .unwrap()
        .filter(|entry| matches!(entry, WalkEntry::File(_)))
        .collect();
    assert_eq!(files.len(), 1);
}

#[test]
fn test_walker_skips_unreadable_subdirectory() {
    let mut vfs = sample_tree();
    vfs.deny("/videos/B");

    let files: Vec<PathBuf> = TreeWalker::new(&vfs, Path::new("/videos"), &default_extensions())
        .unwrap()
        .filter_map(|entry| match entry {
            WalkEntry::File(file) => Some(file.relative_path),
            WalkEntry::Directory(_) => None,
        })
        .collect();

    assert_eq!(
        files,
        vec![PathBuf::from("top.webm"), PathBuf::from("A/1.mp4"), PathBuf::from("A/2.mp4")]
    );
}

#[test]
fn test_unreadable_root_is_fatal() {
    let mut vfs = sample_tree();
    vfs.deny("/videos");
    let result = TreeWalker::new(&vfs, Path::new("/videos"), &default_extensions());
    assert!(matches!(result, Err(CoreError::InvalidBatchRoot(_))));

    let missing = TreeWalker::new(&StdFsReader, Path::new("/definitely/not/here"), &default_extensions());
    assert!(matches!(missing, Err(CoreError::InvalidBatchRoot(_))));
}

#[test]
fn test_find_processable_files_on_disk() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("season/ep")).unwrap();
    fs::write(root.join("a.mp4"), b"aaaa").unwrap();
    fs::write(root.join("season/ep/b.MKV"), b"bb").unwrap();
    fs::write(root.join("season/readme.md"), b"#").unwrap();

    let files = find_processable_files(root, &default_extensions()).unwrap();
    let relative: Vec<PathBuf> = files.iter().map(|f| f.relative_path.clone()).collect();
    assert_eq!(relative, vec![PathBuf::from("a.mp4"), PathBuf::from("season/ep/b.MKV")]);
    assert_eq!(files[0].size_bytes, 4);
    assert_eq!(files[1].path, root.join("season/ep/b.MKV"));
}

#[test]
fn test_output_tree_concurrent_creation() {
    let temp_dir = tempdir().unwrap();
    let tree = Arc::new(OutputTree::new(temp_dir.path().join("out")));
    tree.create_root().unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let tree = Arc::clone(&tree);
            std::thread::spawn(move || {
                tree.ensure_dir(Path::new("shared/nested")).unwrap();
                tree.ensure_dir(&PathBuf::from(format!("own/{i}"))).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(temp_dir.path().join("out/shared/nested").is_dir());
    for i in 0..8 {
        assert!(temp_dir.path().join(format!("out/own/{i}")).is_dir());
    }
}
