//! Error types for the tree store and its collaborators
//!
//! Missing persons are never errors here: mutations report a
//! [`kin_model::MutationStatus`] instead. Errors cover:
//! - GEDCOM file access
//! - layout engine failures
//! - knowledge-base lookups
//! - configuration loading

use kin_gedcom::GedcomError;
use kin_layout::LayoutError;
use std::path::PathBuf;

/// Knowledge-base lookup failures
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeBaseError {
    /// The service could not be reached or rejected the request
    #[error("knowledge base unavailable: {0}")]
    Unavailable(String),

    /// The service answered with something that could not be read
    #[error("malformed knowledge base response: {0}")]
    Malformed(String),

    /// No entity with this id
    #[error("unknown knowledge base entity: {0}")]
    NotFound(String),
}

/// Configuration loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::KinConfig`]
    #[error("invalid config {path}: {source}")]
    Parse {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },
}

/// Umbrella error for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// GEDCOM file access failed
    #[error(transparent)]
    Gedcom(#[from] GedcomError),

    /// Layout engine failed
    #[error("layout failed: {0}")]
    Layout(#[from] LayoutError),

    /// Knowledge-base lookup failed
    #[error("knowledge base lookup failed: {0}")]
    KnowledgeBase(#[from] KnowledgeBaseError),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl StoreError {
    /// Whether the failure came from file access
    #[inline]
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Gedcom(_) | Self::Config(ConfigError::Read { .. }))
    }
}

/// Result type for knowledge-base lookups
pub type KnowledgeBaseResult<T> = Result<T, KnowledgeBaseError>;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
