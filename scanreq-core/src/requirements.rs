//! Requirements manifest parsing.

use std::fs;
use std::path::Path;

use crate::error::{IoResultExt, ScanreqError, ScanreqResult};
use crate::normalize::clean_package_name;

/// Parses manifest text into normalized package names.
///
/// Everything from the first `#` on a line is a comment. Lines that are
/// empty after stripping are skipped. Declaration order is preserved and
/// duplicates are kept.
pub fn parse_requirements(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| match line.find('#') {
            Some(idx) => line[..idx].trim(),
            None => line.trim(),
        })
        .filter(|line| !line.is_empty())
        .map(clean_package_name)
        .collect()
}

/// Reads a requirements file and returns its normalized package names.
///
/// For example: `["django", "django-cors-headers"]`.
///
/// Fails with [`ScanreqError::RequirementsNotFound`] when `path` is not an
/// existing regular file.
pub fn read_requirements(path: &Path) -> ScanreqResult<Vec<String>> {
    if !path.is_file() {
        return Err(ScanreqError::RequirementsNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).with_path(path)?;
    let names = parse_requirements(&content);
    tracing::debug!(path = %path.display(), count = names.len(), "parsed requirements");
    Ok(names)
}
