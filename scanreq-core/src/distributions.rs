//! Installed-distribution discovery.
//!
//! Builds the module → distribution mapping that links requirement names to
//! the importable module names searched for in the project. The host
//! environment is reached through [`DistributionSource`]; every source feeds
//! the same filtering in [`DistributionIndex::from_entries`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;

use crate::error::{IoResultExt, ScanreqError, ScanreqResult};
use crate::normalize::clean_package_name;

/// Substrings marking module names that are not real top-level modules:
/// invalid names, nested paths and mypyc-compiled helpers.
const EXCLUDED_MARKERS: &[&str] = &["-", "/", "__mypyc"];

/// Prefix of private/internal modules.
const INTERNAL_PREFIX: char = '_';

/// Prints `packages_distributions()` as JSON, preferring the stdlib module.
const PACKAGES_DISTRIBUTIONS_SCRIPT: &str = "import json\n\
try:\n    from importlib.metadata import packages_distributions\n\
except ImportError:\n    from importlib_metadata import packages_distributions\n\
print(json.dumps(packages_distributions()))\n";

/// Module name → names of the distributions providing it.
///
/// Keys are ordered so that scans and reports are deterministic for a fixed
/// environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributionIndex {
    modules: BTreeMap<String, Vec<String>>,
}

impl DistributionIndex {
    /// Builds an index from raw `(module, distributions)` pairs, dropping
    /// invalid, nested, compiled-internal and private module names as well as
    /// modules without any distribution.
    pub fn from_entries<I, M, D>(entries: I) -> Self
    where
        I: IntoIterator<Item = (M, D)>,
        M: Into<String>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        let mut modules: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (module, distributions) in entries {
            let module = module.into();
            if !is_main_module(&module) {
                tracing::debug!(module = %module, "skipping non-main module");
                continue;
            }

            let mut names: Vec<String> = Vec::new();
            for dist in distributions {
                let name = clean_package_name(dist.as_ref());
                if !name.is_empty() && !names.contains(&name) {
                    names.push(name);
                }
            }
            if names.is_empty() {
                continue;
            }

            let slot = modules.entry(module).or_default();
            for name in names {
                if !slot.contains(&name) {
                    slot.push(name);
                }
            }
        }

        Self { modules }
    }

    /// Builds an index from the JSON object printed by
    /// `importlib.metadata.packages_distributions()`.
    ///
    /// Values that are not lists of strings are dropped here, before
    /// [`Self::from_entries`] applies the module-name rules.
    pub fn from_json(json: &str) -> ScanreqResult<Self> {
        let raw: BTreeMap<String, Value> = serde_json::from_str(json).map_err(|e| {
            ScanreqError::environment(format!("invalid packages_distributions output: {}", e))
        })?;

        let entries = raw.into_iter().filter_map(|(module, value)| match value {
            Value::Array(items) => {
                let names: Option<Vec<String>> = items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect();
                names.map(|names| (module, names))
            }
            _ => None,
        });

        Ok(Self::from_entries(entries))
    }

    /// Distributions providing `module`, if it is indexed.
    pub fn distributions(&self, module: &str) -> Option<&[String]> {
        self.modules.get(module).map(Vec::as_slice)
    }

    /// Modules provided by the (normalized) distribution name, in index order.
    pub fn modules_for<'a>(&'a self, package: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.modules
            .iter()
            .filter(move |(_, dists)| dists.iter().any(|d| d == package))
            .map(|(module, _)| module.as_str())
    }

    /// Whether any indexed module belongs to `package`.
    pub fn provides(&self, package: &str) -> bool {
        self.modules_for(package).next().is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.modules.iter().map(|(m, d)| (m.as_str(), d.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Whether a module name is a real, public top-level module.
fn is_main_module(module: &str) -> bool {
    !module.is_empty()
        && !EXCLUDED_MARKERS.iter().any(|marker| module.contains(marker))
        && !module.starts_with(INTERNAL_PREFIX)
}

/// Adapter over the environment's installed-package metadata.
pub trait DistributionSource {
    /// Queries the environment for its module → distribution mapping.
    fn packages_distributions(&self) -> ScanreqResult<DistributionIndex>;
}

/// Returns the filtered main-package index of `source`.
///
/// Kept as a free function so callers can name the operation without
/// reaching for the trait.
pub fn get_main_packages(source: &dyn DistributionSource) -> ScanreqResult<DistributionIndex> {
    let index = source.packages_distributions()?;
    tracing::info!(modules = index.len(), "loaded distribution index");
    Ok(index)
}

/// Queries a Python interpreter through `importlib.metadata`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonInterpreter {
    program: String,
}

impl PythonInterpreter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PythonInterpreter {
    fn default() -> Self {
        Self::new("python3")
    }
}

impl DistributionSource for PythonInterpreter {
    fn packages_distributions(&self) -> ScanreqResult<DistributionIndex> {
        let output = Command::new(&self.program)
            .args(["-c", PACKAGES_DISTRIBUTIONS_SCRIPT])
            .output()
            .map_err(|e| {
                ScanreqError::environment(format!("failed to run {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            return Err(ScanreqError::environment(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout).map_err(|e| {
            ScanreqError::environment(format!("{} printed non-UTF-8 output: {}", self.program, e))
        })?;
        DistributionIndex::from_json(&stdout)
    }
}

/// Reads `*.dist-info` metadata straight from site-packages directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitePackages {
    dirs: Vec<PathBuf>,
}

impl SitePackages {
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Collects `(module, distribution)` pairs from one site-packages directory.
    fn read_dir(dir: &Path) -> ScanreqResult<Vec<(String, String)>> {
        let mut entries: Vec<PathBuf> = fs::read_dir(dir)
            .with_path(dir)?
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.is_dir()
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.ends_with(".dist-info"))
            })
            .collect();
        entries.sort();

        let mut pairs = Vec::new();
        for dist_info in entries {
            let Some(name) = read_distribution_name(&dist_info) else {
                tracing::debug!(path = %dist_info.display(), "dist-info without Name header");
                continue;
            };
            for module in read_top_level_modules(&dist_info) {
                pairs.push((module, name.clone()));
            }
        }
        Ok(pairs)
    }
}

impl DistributionSource for SitePackages {
    fn packages_distributions(&self) -> ScanreqResult<DistributionIndex> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for dir in &self.dirs {
            for (module, dist) in Self::read_dir(dir)
                .map_err(|e| ScanreqError::environment(e.to_string()))?
            {
                grouped.entry(module).or_default().push(dist);
            }
        }
        Ok(DistributionIndex::from_entries(grouped))
    }
}

/// Distribution name from the `Name:` header of `METADATA`.
fn read_distribution_name(dist_info: &Path) -> Option<String> {
    let metadata = fs::read_to_string(dist_info.join("METADATA")).ok()?;
    metadata
        .lines()
        .take_while(|line| !line.is_empty())
        .find_map(|line| line.strip_prefix("Name:"))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Top-level modules from `top_level.txt`, inferred from `RECORD` otherwise.
fn read_top_level_modules(dist_info: &Path) -> Vec<String> {
    if let Ok(top_level) = fs::read_to_string(dist_info.join("top_level.txt")) {
        return top_level
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
    }

    let Ok(record) = fs::read_to_string(dist_info.join("RECORD")) else {
        return Vec::new();
    };

    let mut modules: Vec<String> = Vec::new();
    for line in record.lines() {
        let Some(module) = line.split(',').next().and_then(module_from_record_path) else {
            continue;
        };
        if !modules.contains(&module) {
            modules.push(module);
        }
    }
    modules
}

/// Top-level module for one `RECORD` path, if it names one.
fn module_from_record_path(path: &str) -> Option<String> {
    let path = path.trim();
    if path.is_empty() || path.starts_with("..") {
        return None;
    }

    let mut parts = path.split('/');
    let first = parts.next()?;
    if parts.next().is_some() {
        return Some(first.to_string());
    }

    // Single file at the top level: only importable modules count.
    const MODULE_SUFFIXES: &[&str] = &[".py", ".pyc", ".so", ".pyd"];
    MODULE_SUFFIXES.iter().find_map(|suffix| {
        first
            .strip_suffix(suffix)
            // Extension modules carry an ABI tag: `foo.cpython-312-x86_64-linux-gnu.so`.
            .map(|stem| stem.split('.').next().unwrap_or(stem).to_string())
            .filter(|stem| !stem.is_empty())
    })
}

/// In-memory source for tests and embedders.
#[derive(Debug, Clone, Default)]
pub struct StaticDistributions {
    entries: Vec<(String, Vec<String>)>,
}

impl StaticDistributions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `module` as provided by `distributions`.
    pub fn with(mut self, module: impl Into<String>, distributions: &[&str]) -> Self {
        self.entries.push((
            module.into(),
            distributions.iter().map(|d| d.to_string()).collect(),
        ));
        self
    }
}

impl DistributionSource for StaticDistributions {
    fn packages_distributions(&self) -> ScanreqResult<DistributionIndex> {
        Ok(DistributionIndex::from_entries(self.entries.iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("scanreq_distributions_test")
            .join(format!("{}_{}", name, std::process::id()));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_get_main_packages_filters() {
        let source = StaticDistributions::new()
            .with("valid_package", &["folder-name"])
            .with("valid2", &["folder-name2"])
            .with("_private_package", &["should-not-include"])
            .with("package-with-dash", &["should-not-include"])
            .with("package/with-slash", &["should-not-include"])
            .with("package__mypyc", &["should-not-include"])
            .with("empty", &[]);

        let index = get_main_packages(&source).unwrap();
        let modules: Vec<_> = index.iter().map(|(m, _)| m).collect();
        assert_eq!(modules, vec!["valid2", "valid_package"]);
        assert_eq!(
            index.distributions("valid_package"),
            Some(&["folder-name".to_string()][..])
        );
    }

    #[test]
    fn test_from_json_drops_non_list_values() {
        let json = r#"{
            "yaml": ["PyYAML"],
            "odd": "not-a-list",
            "mixed": ["ok", 3],
            "nothing": [],
            "nullish": null,
            "_distutils_hack": ["setuptools"]
        }"#;
        let index = DistributionIndex::from_json(json).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.distributions("yaml"), Some(&["pyyaml".to_string()][..]));
    }

    #[test]
    fn test_from_json_invalid() {
        let err = DistributionIndex::from_json("[1, 2]").unwrap_err();
        assert!(matches!(err, ScanreqError::Environment { .. }));
    }

    #[test]
    fn test_modules_for_distribution() {
        let index = DistributionIndex::from_entries([
            ("google", vec!["protobuf", "googleapis-common-protos"]),
            ("grpc", vec!["grpcio"]),
            ("proto", vec!["protobuf"]),
        ]);
        let modules: Vec<_> = index.modules_for("protobuf").collect();
        assert_eq!(modules, vec!["google", "proto"]);
        assert!(index.provides("grpcio"));
        assert!(!index.provides("django"));
    }

    #[test]
    fn test_distribution_names_are_normalized() {
        let index = DistributionIndex::from_entries([("django", vec!["Django", "Django"])]);
        assert_eq!(index.distributions("django"), Some(&["django".to_string()][..]));
    }

    #[test]
    fn test_missing_interpreter_is_environment_error() {
        let source = PythonInterpreter::new("scanreq-definitely-not-a-python");
        let err = source.packages_distributions().unwrap_err();
        assert!(matches!(err, ScanreqError::Environment { .. }));
    }

    #[test]
    fn test_module_from_record_path() {
        assert_eq!(module_from_record_path("requests/__init__.py"), Some("requests".into()));
        assert_eq!(module_from_record_path("six.py"), Some("six".into()));
        assert_eq!(
            module_from_record_path("_cffi_backend.cpython-312-x86_64-linux-gnu.so"),
            Some("_cffi_backend".into())
        );
        assert_eq!(module_from_record_path("README.txt"), None);
        assert_eq!(module_from_record_path("../../bin/black"), None);
    }

    #[test]
    fn test_site_packages_source() {
        let site = temp_dir("site");

        let yaml = site.join("PyYAML-6.0.1.dist-info");
        fs::create_dir_all(&yaml).unwrap();
        fs::write(
            yaml.join("METADATA"),
            "Metadata-Version: 2.1\nName: PyYAML\nVersion: 6.0.1\n\nbody",
        )
        .unwrap();
        fs::write(yaml.join("top_level.txt"), "_yaml\nyaml\n").unwrap();

        let six = site.join("six-1.16.0.dist-info");
        fs::create_dir_all(&six).unwrap();
        fs::write(six.join("METADATA"), "Name: six\n").unwrap();
        fs::write(
            six.join("RECORD"),
            "six.py,sha256=abc,100\nsix-1.16.0.dist-info/RECORD,,\n",
        )
        .unwrap();

        let index = SitePackages::new([&site]).packages_distributions().unwrap();
        assert_eq!(index.distributions("yaml"), Some(&["pyyaml".to_string()][..]));
        assert_eq!(index.distributions("six"), Some(&["six".to_string()][..]));
        assert!(index.distributions("_yaml").is_none());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_site_packages_missing_dir() {
        let source = SitePackages::new(["/definitely/not/site-packages"]);
        assert!(matches!(
            source.packages_distributions().unwrap_err(),
            ScanreqError::Environment { .. }
        ));
    }
}
