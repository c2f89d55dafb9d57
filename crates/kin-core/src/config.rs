//! Application configuration
//!
//! Every field has a default, so an empty TOML file is a valid config:
//!
//! ```toml
//! storage_dir = "~/.kin"
//! log_filter = "kin=debug"
//! gedcom_source = "FamilyTreeEditor"
//!
//! [layout]
//! node_width = 200.0
//!
//! [layout.options]
//! layer_spacing = 150.0
//! ```

use crate::error::ConfigError;
use kin_gedcom::DEFAULT_SOURCE;
use kin_layout::LayoutConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Store and CLI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinConfig {
    /// Layout geometry and engine options
    pub layout: LayoutConfig,
    /// Directory for persisted person lists, in-memory storage when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub log_filter: String,
    /// `SOUR` written into fresh-export headers
    pub gedcom_source: String,
}

impl KinConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With layout configuration
    #[inline]
    #[must_use]
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// With storage directory
    #[inline]
    #[must_use]
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// With default log filter
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// With header source name
    #[inline]
    #[must_use]
    pub fn with_gedcom_source(mut self, source: impl Into<String>) -> Self {
        self.gedcom_source = source.into();
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// [`ConfigError::Parse`] tagged with `origin` when the text is invalid.
    pub fn from_toml_str(text: &str, origin: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.into(),
            source,
        })
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text, path)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

impl Default for KinConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            storage_dir: None,
            log_filter: "info".to_string(),
            gedcom_source: DEFAULT_SOURCE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_toml_is_default() {
        let config = KinConfig::from_toml_str("", "kin.toml").unwrap();
        assert_eq!(config, KinConfig::default());
        assert_eq!(config.gedcom_source, "FamilyTreeEditor");
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let text = r#"
            log_filter = "kin=debug"
            storage_dir = "/tmp/kin"

            [layout]
            node_width = 180.0

            [layout.options]
            layer_spacing = 90.0
        "#;
        let config = KinConfig::from_toml_str(text, "kin.toml").unwrap();
        assert_eq!(config.log_filter, "kin=debug");
        assert_eq!(config.storage_dir, Some(PathBuf::from("/tmp/kin")));
        assert_eq!(config.layout.node_width, 180.0);
        assert_eq!(config.layout.node_height, 60.0);
        assert_eq!(config.layout.options.layer_spacing, 90.0);
        assert_eq!(config.layout.options.direction, "DOWN");
    }

    #[test]
    fn invalid_toml_names_the_file() {
        let err = KinConfig::from_toml_str("log_filter = [", "bad.toml").unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kin.toml");
        std::fs::write(&path, "gedcom_source = \"Kin\"\n").unwrap();
        let config = KinConfig::load(&path).unwrap();
        assert_eq!(config.gedcom_source, "Kin");

        let missing = KinConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }

    #[test]
    fn builders_chain() {
        let config = KinConfig::new()
            .with_storage_dir("/data")
            .with_log_filter("warn")
            .with_gedcom_source("Kin");
        assert_eq!(config.storage_dir.as_deref(), Some(Path::new("/data")));
        assert_eq!(config.log_filter, "warn");
    }
}
