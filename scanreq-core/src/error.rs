//! Typed error handling for scanreq.
//!
//! Only two failures abort a run: a missing requirements file and an
//! environment whose package metadata cannot be queried. Per-file read
//! failures during a usage scan never surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scanreq operations.
#[derive(Error, Debug)]
pub enum ScanreqError {
    /// The requirements manifest does not exist or is not a regular file
    #[error("File not found: {path}")]
    RequirementsNotFound { path: PathBuf },

    /// I/O error when reading/writing files
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The installed-package registry could not be queried
    #[error("Environment error: {message}")]
    Environment { message: String },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl ScanreqError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an environment query error.
    pub fn environment(message: impl Into<String>) -> Self {
        Self::Environment {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error means a file was missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::RequirementsNotFound { .. } => true,
            Self::Io {
                source: Some(source),
                ..
            } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::RequirementsNotFound { path } => Some(path),
            Self::Io { path, .. } => Some(path),
            Self::Config { path, .. } => Some(path),
            Self::Environment { .. } => None,
        }
    }
}

/// Convenience type alias for scanreq results.
pub type ScanreqResult<T> = Result<T, ScanreqError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> ScanreqResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> ScanreqResult<T> {
        self.map_err(|e| ScanreqError::io(path, e))
    }
}
