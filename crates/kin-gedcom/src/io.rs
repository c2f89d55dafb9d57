//! Async GEDCOM file access

use crate::error::{GedcomError, GedcomResult};
use crate::node::GedcomNode;
use crate::parser::parse_gedcom;
use std::path::Path;
use tracing::info;

/// Read and parse a GEDCOM file
pub async fn read_gedcom_file(path: impl AsRef<Path>) -> GedcomResult<Vec<GedcomNode>> {
    let text = read_gedcom_text(path.as_ref()).await?;
    Ok(parse_gedcom(&text))
}

/// Read a GEDCOM file as text
pub async fn read_gedcom_text(path: impl AsRef<Path>) -> GedcomResult<String> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| GedcomError::read(path, e))?;
    info!(path = %path.display(), bytes = text.len(), "read gedcom file");
    Ok(text)
}

/// Write GEDCOM text to a file, replacing it
pub async fn write_gedcom_file(path: impl AsRef<Path>, text: &str) -> GedcomResult<()> {
    let path = path.as_ref();
    tokio::fs::write(path, text)
        .await
        .map_err(|e| GedcomError::write(path, e))?;
    info!(path = %path.display(), bytes = text.len(), "wrote gedcom file");
    Ok(())
}

/// Tree name for a GEDCOM file: its stem
#[must_use]
pub fn tree_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
