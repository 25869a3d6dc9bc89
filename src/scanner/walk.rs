//! Directory walking shared by the catalog scanner and the channel
//! playlist resolver.

use homereel_common::paths::is_video_file;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}

/// Immediate subdirectories of `dir`, sorted by name. Hidden entries are skipped.
pub fn child_dirs(dir: &Path) -> Vec<PathBuf> {
    children(dir, |entry| entry.file_type().is_dir())
}

/// Immediate regular files of `dir`, sorted by name. Hidden entries are skipped.
pub fn child_files(dir: &Path) -> Vec<PathBuf> {
    children(dir, |entry| entry.file_type().is_file())
}

fn children(dir: &Path, keep: impl Fn(&walkdir::DirEntry) -> bool) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!("Skipping unreadable entry in {:?}: {}", dir, err);
                None
            }
        })
        .filter(|entry| !is_hidden(entry.file_name()))
        .filter(|entry| keep(entry))
        .map(|entry| entry.into_path())
        .collect()
}

/// Every video file under `folders`, recursing into subfolders.
///
/// The result is sorted by full path and free of duplicates, so overlapping
/// folders contribute each file once. Missing or unreadable folders are
/// skipped.
pub fn collect_videos(folders: &[PathBuf]) -> Vec<PathBuf> {
    let mut videos = Vec::new();

    for folder in folders {
        if !folder.is_dir() {
            tracing::warn!("Channel folder is not a directory: {:?}", folder);
            continue;
        }

        let walker = WalkDir::new(folder)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

        for entry in walker.filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && is_video_file(entry.path()) {
                videos.push(entry.into_path());
            }
        }
    }

    videos.sort();
    videos.dedup();
    videos
}
