//! scanreq-core: unused Python requirement detection.
//!
//! Finds packages declared in a `requirements.txt` whose importable modules
//! are never mentioned anywhere in the project tree.
//!
//! # Pipeline
//!
//! 1. [`requirements`]: read the manifest into normalized package names
//! 2. [`distributions`]: map installed modules to their distributions
//! 3. [`scan`](mod@scan): search the project for each candidate module name
//! 4. [`report`]: print findings and optionally write them to a file
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use scanreq_core::prelude::*;
//!
//! let result = Scanreq::new("requirements.txt", ".")
//!     .analyze(&PythonInterpreter::default())?;
//!
//! for package in &result.unused {
//!     println!("Unused package: {}", package);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`normalize`]: requirement name canonicalization
//! - [`config`]: scan settings and `scanreq.toml`
//! - [`builder`]: the scan orchestrator
//! - [`error`]: typed error handling
//! - [`logging`]: structured logging setup

pub mod builder;
pub mod config;
pub mod distributions;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod prelude;
pub mod report;
pub mod requirements;
pub mod scan;

// ============================================================================
// Explicit Re-exports
// ============================================================================

// Error types
pub use error::{IoResultExt, ScanreqError, ScanreqResult};

// Orchestration
pub use builder::{
    scan, scan_with, AnalysisResult, ScanEvent, ScanStrategy, Scanreq, UnusedFinding,
};

// Configuration
pub use config::{
    load_config, FileConfig, ScanConfig, CONFIG_FILE_NAME, DEFAULT_EXTENSIONS,
    DEFAULT_IGNORED_PACKAGES,
};

// Distribution index
pub use distributions::{
    get_main_packages, DistributionIndex, DistributionSource, PythonInterpreter, SitePackages,
    StaticDistributions,
};

// Logging
pub use logging::{init_structured_logging, log_error, log_info};

// Requirement parsing
pub use normalize::clean_package_name;
pub use requirements::{parse_requirements, read_requirements};

// Reporting
pub use report::{
    format_finding, print_json, render_output, write_event, write_output, write_plain,
    NO_UNUSED_MESSAGE, SCANNING_HEADER, WAIT_NOTICE,
};

// Usage search
pub use scan::{
    gather_scan_files, is_scan_target, read_scan_file, search_string_in_file,
    search_string_in_files, search_string_in_files_with, FileContent, UsageIndex,
};

#[cfg(test)]
mod tests;
