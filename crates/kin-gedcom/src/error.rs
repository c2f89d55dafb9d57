//! Error types for GEDCOM file handling
//!
//! Parsing and mapping never fail: malformed lines are skipped and dangling
//! references are tolerated. Only file access produces errors.

use std::path::PathBuf;

/// Errors reading or writing GEDCOM files
#[derive(Debug, thiserror::Error)]
pub enum GedcomError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Read {
        /// File that could not be read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// IO error during file write
    #[error("io error writing {path}: {source}")]
    Write {
        /// File that could not be written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl GedcomError {
    /// Create read error for path
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create write error for path
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Path involved in the failure
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Read { path, .. } | Self::Write { path, .. } => path,
        }
    }
}

/// Result type for GEDCOM file operations
pub type GedcomResult<T> = Result<T, GedcomError>;
