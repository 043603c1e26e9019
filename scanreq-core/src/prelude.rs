//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use scanreq_core::prelude::*;
//! ```

// Errors
pub use crate::error::{ScanreqError, ScanreqResult};

// Builder API
pub use crate::builder::{AnalysisResult, ScanStrategy, Scanreq, UnusedFinding};

// Configuration
pub use crate::config::{load_config, ScanConfig};

// Distribution sources
pub use crate::distributions::{
    DistributionIndex, DistributionSource, PythonInterpreter, SitePackages,
};

// Parsing and search
pub use crate::normalize::clean_package_name;
pub use crate::requirements::read_requirements;
pub use crate::scan::search_string_in_files;
