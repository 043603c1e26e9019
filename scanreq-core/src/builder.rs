//! Builder pattern API for unused-requirement analysis.
//!
//! ```rust,ignore
//! use scanreq_core::prelude::*;
//!
//! let result = Scanreq::new("requirements.txt", ".")
//!     .ignore_packages(["celery"])
//!     .analyze(&PythonInterpreter::default())?;
//!
//! for package in &result.unused {
//!     println!("Unused: {}", package);
//! }
//! ```

use std::collections::{BTreeSet, HashSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::ScanConfig;
use crate::distributions::{
    get_main_packages, DistributionIndex, DistributionSource, PythonInterpreter,
};
use crate::report;
use crate::requirements::read_requirements;
use crate::scan::{search_string_in_files_with, UsageIndex};

/// How module usage is searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanStrategy {
    /// Walk the tree once and test every candidate module against each file.
    #[default]
    SinglePass,
    /// Walk the whole tree again for every (requirement, module) candidate.
    PerModule,
}

/// Progress notifications emitted while a scan runs.
#[derive(Debug, Clone, Copy)]
pub enum ScanEvent<'a> {
    /// Requirements and the distribution index are loaded; scanning begins.
    Started { requirements: usize, modules: usize },
    /// A requirement was found to be unused.
    Unused(&'a UnusedFinding),
}

/// One reported unused requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnusedFinding {
    /// 1-based position in discovery order.
    pub index: usize,
    /// Module name that matched no file.
    pub module: String,
    /// Normalized requirement name.
    pub package: String,
}

/// Builder for configuring an unused-requirement scan.
#[derive(Debug, Clone)]
pub struct Scanreq {
    /// Requirements manifest
    requirements: PathBuf,

    /// Project tree searched for module usage
    project: PathBuf,

    config: ScanConfig,

    strategy: ScanStrategy,
}

impl Scanreq {
    /// Create a new scan builder with the default configuration.
    pub fn new(requirements: impl Into<PathBuf>, project: impl Into<PathBuf>) -> Self {
        Self {
            requirements: requirements.into(),
            project: project.into(),
            config: ScanConfig::default(),
            strategy: ScanStrategy::default(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Add package names that must never be reported.
    pub fn ignore_packages(mut self, names: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        self.config = self.config.with_ignored(names);
        self
    }

    /// Replace the scanned file suffixes.
    pub fn extensions(mut self, extensions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.config = self.config.with_extensions(extensions);
        self
    }

    /// Add directory names to skip during the walk.
    pub fn exclude_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.config = self.config.with_exclude_dirs(dirs);
        self
    }

    /// Choose how usage is searched for.
    pub fn strategy(mut self, strategy: ScanStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Run the scan and return results.
    pub fn analyze(&self, source: &dyn DistributionSource) -> Result<AnalysisResult> {
        self.analyze_with(source, |_| {})
    }

    /// Run the scan, reporting progress through `on_event`.
    pub fn analyze_with<F>(
        &self,
        source: &dyn DistributionSource,
        mut on_event: F,
    ) -> Result<AnalysisResult>
    where
        F: FnMut(ScanEvent<'_>),
    {
        // 1. Requirements
        let requirements = read_requirements(&self.requirements).with_context(|| {
            format!("Failed to read requirements from {}", self.requirements.display())
        })?;

        // 2. Installed distributions
        let index = get_main_packages(source).context("Failed to query installed distributions")?;
        if index.is_empty() {
            tracing::warn!("no installed distributions found; nothing can be reported");
        }

        // 3. Candidate (requirement, module) pairs, in manifest then index order
        let candidates = self.candidates(&requirements, &index);
        let unresolved = self.unresolved(&requirements, &index);
        for name in &unresolved {
            tracing::warn!(package = %name, "requirement does not map to any installed module");
        }

        on_event(ScanEvent::Started {
            requirements: requirements.len(),
            modules: index.len(),
        });

        // 4. Usage search
        let usage = match self.strategy {
            ScanStrategy::SinglePass => Some(UsageIndex::build(
                &self.project,
                candidates.iter().map(|(_, module)| module.clone()),
                &self.config,
            )),
            ScanStrategy::PerModule => None,
        };

        let mut findings: Vec<UnusedFinding> = Vec::new();
        let mut recorded_modules: HashSet<&str> = HashSet::new();
        for (package, module) in &candidates {
            let used = match &usage {
                Some(usage) => usage.is_used(module),
                None => {
                    !search_string_in_files_with(&self.project, module, &self.config).is_empty()
                }
            };
            if used || !recorded_modules.insert(module.as_str()) {
                continue;
            }

            let finding = UnusedFinding {
                index: findings.len() + 1,
                module: module.clone(),
                package: package.clone(),
            };
            on_event(ScanEvent::Unused(&finding));
            findings.push(finding);
        }

        // 5. Deduplicate
        let unused: BTreeSet<String> = findings.iter().map(|f| f.package.clone()).collect();
        tracing::info!(
            requirements = requirements.len(),
            candidates = candidates.len(),
            unused = unused.len(),
            "scan complete"
        );

        Ok(AnalysisResult {
            project: self.project.clone(),
            requirements,
            scanned_modules: candidates.len(),
            findings,
            unused,
            unresolved,
        })
    }

    /// Pairs every non-ignored requirement with each module its distribution provides.
    fn candidates(
        &self,
        requirements: &[String],
        index: &DistributionIndex,
    ) -> Vec<(String, String)> {
        requirements
            .iter()
            .filter(|name| !self.config.is_ignored(name))
            .flat_map(|name| {
                index
                    .modules_for(name)
                    .map(move |module| (name.clone(), module.to_string()))
            })
            .collect()
    }

    /// Requirements that no installed distribution accounts for.
    fn unresolved(&self, requirements: &[String], index: &DistributionIndex) -> Vec<String> {
        let mut seen = HashSet::new();
        requirements
            .iter()
            .filter(|name| !self.config.is_ignored(name) && !index.provides(name))
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect()
    }
}

/// Result of running a scan.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Project tree that was scanned
    pub project: PathBuf,

    /// Normalized requirement names in manifest order
    pub requirements: Vec<String>,

    /// Number of (requirement, module) pairs checked
    pub scanned_modules: usize,

    /// Unused requirements in discovery order
    pub findings: Vec<UnusedFinding>,

    /// Deduplicated unused package names
    pub unused: BTreeSet<String>,

    /// Requirements not provided by any installed distribution
    pub unresolved: Vec<String>,
}

impl AnalysisResult {
    /// Check if any unused requirement was found.
    pub fn has_unused(&self) -> bool {
        !self.unused.is_empty()
    }
}

/// Runs `scanreq` against `source`, writing the plain report protocol to `out`:
/// wait notice, scanning header, one numbered line per finding, and the
/// closing line when nothing is unused.
///
/// When `output_path` is given and something is unused, the names are
/// written there, one per line. Returns the deduplicated unused names.
pub fn scan_with(
    scanreq: &Scanreq,
    source: &dyn DistributionSource,
    output_path: Option<&Path>,
    out: &mut dyn Write,
) -> Result<BTreeSet<String>> {
    writeln!(out, "{}", report::WAIT_NOTICE)?;

    let mut write_error: Option<io::Error> = None;
    let result = scanreq.analyze_with(source, |event| {
        if write_error.is_none() {
            write_error = report::write_event(&mut *out, event).err();
        }
    })?;
    if let Some(err) = write_error {
        return Err(err).context("Failed to write scan progress");
    }

    report::write_plain(out, &result)?;
    if let Some(path) = output_path {
        report::write_output(path, &result.unused)?;
    }
    Ok(result.unused)
}

/// Scans `project_path` for requirements of `requirement_file` that are never
/// used, printing progress and results to stdout.
///
/// Distributions are read from the default `python3` interpreter.
pub fn scan(
    requirement_file: &Path,
    project_path: &Path,
    output_path: Option<&Path>,
    ignored_packages: &[String],
) -> Result<BTreeSet<String>> {
    let scanreq = Scanreq::new(requirement_file, project_path).ignore_packages(ignored_packages);
    // Unlocked handle: scan workers print read failures to stdout concurrently.
    let mut stdout = io::stdout();
    scan_with(&scanreq, &PythonInterpreter::default(), output_path, &mut stdout)
}
