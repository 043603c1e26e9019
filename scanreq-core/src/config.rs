//! Scan configuration and `scanreq.toml` loading.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::normalize::clean_package_name;

/// Name of the optional per-project configuration file.
pub const CONFIG_FILE_NAME: &str = "scanreq.toml";

/// File suffixes scanned for module usage by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".py", ".conf", ".cfg", ".yml", ".yaml", "Dockerfile"];

/// Tooling, lint and test packages that are never reported as unused.
pub const DEFAULT_IGNORED_PACKAGES: &[&str] = &[
    "scanreq",
    "ipdb",
    "mypy",
    "isort",
    "black",
    "flake8",
    "twine",
    "codespell",
    "django-coverage-plugin",
    "pytest-sugar",
    "pytest-cov",
    "pytest-asyncio",
    "pytest-mock",
    "pytest-subtests",
    "pytest-xdist",
    "pylint-django",
    "pylint-celery",
    "pytest-django",
    "pre-commit",
];

/// Immutable settings for one scan run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Normalized package names excluded from the report.
    pub ignored_packages: BTreeSet<String>,
    /// File name suffixes that are searched for module names.
    pub extensions: Vec<String>,
    /// Directory names pruned from the walk.
    pub exclude_dirs: BTreeSet<String>,
    /// Print per-file read failures to stdout in addition to the log.
    pub echo_read_errors: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignored_packages: DEFAULT_IGNORED_PACKAGES.iter().map(|s| s.to_string()).collect(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude_dirs: BTreeSet::new(),
            echo_read_errors: true,
        }
    }
}

impl ScanConfig {
    /// Adds user-supplied ignore names, normalizing each one.
    pub fn with_ignored<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignored_packages.extend(
            names
                .into_iter()
                .map(|n| clean_package_name(n.as_ref()))
                .filter(|n| !n.is_empty()),
        );
        self
    }

    /// Replaces the recognized file suffixes.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Adds directory names to prune from the walk.
    pub fn with_exclude_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Toggles printing of per-file read failures to stdout.
    pub fn with_echo_read_errors(mut self, enabled: bool) -> Self {
        self.echo_read_errors = enabled;
        self
    }

    /// Whether a normalized package name is suppressed from reporting.
    pub fn is_ignored(&self, package: &str) -> bool {
        self.ignored_packages.contains(package)
    }

    /// Merges the settings of a `scanreq.toml` file on top of these.
    pub fn merge_file(self, file: &FileConfig) -> Self {
        let mut merged = self.with_ignored(file.ignored_packages.iter().flatten());
        if let Some(extensions) = &file.extensions {
            merged = merged.with_extensions(extensions.iter().cloned());
        }
        merged.with_exclude_dirs(file.exclude_dirs.iter().flatten().cloned())
    }
}

/// Contents of `scanreq.toml`.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    /// Extra packages to ignore.
    pub ignored_packages: Option<Vec<String>>,
    /// Replacement list of scanned file suffixes.
    pub extensions: Option<Vec<String>>,
    /// Directory names to skip.
    pub exclude_dirs: Option<Vec<String>>,
    /// Python interpreter used to query installed distributions.
    pub python: Option<String>,
    /// site-packages directories to read instead of running Python.
    pub site_packages: Option<Vec<PathBuf>>,
}

/// Loads `scanreq.toml` from the project root if it exists.
pub fn load_config(root: &Path) -> Result<Option<FileConfig>> {
    let path = root.join(CONFIG_FILE_NAME);
    if !path.is_file() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let cfg = toml::from_str(&content)
        .map_err(|e| crate::error::ScanreqError::config(&path, e.to_string()))
        .context("Invalid scanreq.toml")?;
    Ok(Some(cfg))
}
