//! Parallel usage search over a project tree.
//!
//! The directory walk runs sequentially through `WalkDir`; reading and
//! matching files is spread across Rayon's global pool, which is sized to
//! the available parallelism. Every call joins its workers before returning.
//!
//! A file "uses" a needle when its full text contains the needle as a raw
//! substring. Files that are not valid UTF-8 never match and are skipped
//! silently; any other read failure is logged, echoed on stdout unless
//! [`ScanConfig::echo_read_errors`] is off, and treated as no match.

use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ScanConfig;

/// Outcome of reading one candidate file.
#[derive(Debug)]
pub enum FileContent {
    /// Decoded UTF-8 text.
    Text(String),
    /// Bytes that are not valid UTF-8.
    NotUtf8,
    /// Any other I/O failure.
    Failed(io::Error),
}

/// Whether a file name ends with one of the recognized suffixes.
#[inline]
pub fn is_scan_target(file_name: &str, extensions: &[String]) -> bool {
    extensions.iter().any(|ext| file_name.ends_with(ext.as_str()))
}

/// Checks if a directory entry should be pruned from the walk.
#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry, excludes: &HashSet<&str>) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excludes.contains(name))
}

/// Lazily walks `root`, yielding every non-directory entry that matches the
/// configured suffixes.
///
/// Symlinks are not followed into directories, but a link whose target is
/// missing is still yielded so that reading it reports the failure. Entries
/// the walk itself cannot read are logged and skipped.
fn walk_scan_files<'a>(
    root: &Path,
    config: &'a ScanConfig,
) -> impl Iterator<Item = PathBuf> + Send + 'a {
    let excludes: HashSet<&'a str> = config.exclude_dirs.iter().map(String::as_str).collect();

    WalkDir::new(root)
        .into_iter()
        .filter_entry(move |e| !is_excluded_dir(e, &excludes))
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                tracing::debug!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| !e.path().is_dir())
        .filter(move |e| {
            e.file_name()
                .to_str()
                .is_some_and(|name| is_scan_target(name, &config.extensions))
        })
        .map(walkdir::DirEntry::into_path)
}

/// Collects every file under `root` that would be searched.
pub fn gather_scan_files(root: &Path, config: &ScanConfig) -> Vec<PathBuf> {
    walk_scan_files(root, config).collect()
}

/// Reads a file, separating decode failures from other I/O errors.
pub fn read_scan_file(path: &Path) -> FileContent {
    match fs::read(path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => FileContent::Text(text),
            Err(_) => FileContent::NotUtf8,
        },
        Err(e) => FileContent::Failed(e),
    }
}

/// Reports a non-decode read failure without aborting the scan.
fn report_read_error(path: &Path, err: &io::Error, echo: bool) {
    if echo {
        println!("Error occurred while reading {}: {}", path.display(), err);
    }
    tracing::warn!(path = %path.display(), error = %err, "failed to read file");
}

fn search_file(path: &Path, needle: &str, echo: bool) -> Option<PathBuf> {
    match read_scan_file(path) {
        FileContent::Text(text) if text.contains(needle) => Some(path.to_path_buf()),
        FileContent::Text(_) | FileContent::NotUtf8 => None,
        FileContent::Failed(err) => {
            report_read_error(path, &err, echo);
            None
        }
    }
}

/// Returns `path` if the file contains `needle`.
pub fn search_string_in_file(path: &Path, needle: &str) -> Option<PathBuf> {
    search_file(path, needle, true)
}

/// Searches all recognized files under `root` for `needle` with default settings.
pub fn search_string_in_files(root: &Path, needle: &str) -> Vec<PathBuf> {
    search_string_in_files_with(root, needle, &ScanConfig::default())
}

/// Searches all recognized files under `root` for `needle`.
///
/// Result order follows worker completion and is not stable between runs.
pub fn search_string_in_files_with(
    root: &Path,
    needle: &str,
    config: &ScanConfig,
) -> Vec<PathBuf> {
    walk_scan_files(root, config)
        .par_bridge()
        .filter_map(|path| search_file(&path, needle, config.echo_read_errors))
        .collect()
}

/// Per-needle hits gathered in one pass over the tree.
///
/// Each file is read once and tested against every needle, which replaces
/// one full walk per needle with a single walk.
#[derive(Debug, Clone, Default)]
pub struct UsageIndex {
    hits: BTreeMap<String, Vec<PathBuf>>,
    files_scanned: usize,
}

impl UsageIndex {
    /// Walks `root` once and records, for every needle, the files containing it.
    pub fn build<I, S>(root: &Path, needles: I, config: &ScanConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut needles: Vec<String> = needles.into_iter().map(Into::into).collect();
        needles.sort();
        needles.dedup();

        let files = gather_scan_files(root, config);
        let files_scanned = files.len();

        let found: Vec<(usize, PathBuf)> = files
            .par_iter()
            .flat_map_iter(|path| {
                let matched: Vec<(usize, PathBuf)> = match read_scan_file(path) {
                    FileContent::Text(text) => needles
                        .iter()
                        .enumerate()
                        .filter(|(_, needle)| text.contains(needle.as_str()))
                        .map(|(i, _)| (i, path.clone()))
                        .collect(),
                    FileContent::NotUtf8 => Vec::new(),
                    FileContent::Failed(err) => {
                        report_read_error(path, &err, config.echo_read_errors);
                        Vec::new()
                    }
                };
                matched
            })
            .collect();

        let mut hits: BTreeMap<String, Vec<PathBuf>> =
            needles.iter().map(|n| (n.clone(), Vec::new())).collect();
        for (i, path) in found {
            if let Some(paths) = hits.get_mut(&needles[i]) {
                paths.push(path);
            }
        }

        tracing::debug!(files = files_scanned, needles = needles.len(), "built usage index");
        Self {
            hits,
            files_scanned,
        }
    }

    /// Files containing `needle`; empty for needles that were not indexed.
    pub fn hits(&self, needle: &str) -> &[PathBuf] {
        self.hits.get(needle).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_used(&self, needle: &str) -> bool {
        !self.hits(needle).is_empty()
    }

    /// Number of files read to build the index.
    pub fn files_scanned(&self) -> usize {
        self.files_scanned
    }
}
