//! Generic GEDCOM tree

use serde::{Deserialize, Serialize};

/// One line of a GEDCOM document together with its nested lines
///
/// The tree mirrors the level numbers of the source text exactly. Tags are
/// never validated, so records the mapper does not understand survive
/// parse → merge → serialize as opaque subtrees.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GedcomNode {
    /// Nesting depth
    pub level: u32,
    /// Cross-reference label including the `@` delimiters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xref_id: Option<String>,
    /// Record or field tag
    pub tag: String,
    /// Line value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Nested lines in document order
    #[serde(default)]
    pub children: Vec<GedcomNode>,
}

impl GedcomNode {
    /// Create a node with no xref, value or children
    #[must_use]
    pub fn new(level: u32, tag: impl Into<String>) -> Self {
        Self {
            level,
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// With cross-reference label
    #[inline]
    #[must_use]
    pub fn with_xref(mut self, xref_id: impl Into<String>) -> Self {
        self.xref_id = Some(xref_id.into());
        self
    }

    /// With value
    #[inline]
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// With an appended child
    #[inline]
    #[must_use]
    pub fn with_child(mut self, child: GedcomNode) -> Self {
        self.children.push(child);
        self
    }

    /// First child with `tag`
    #[must_use]
    pub fn child(&self, tag: &str) -> Option<&GedcomNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// First child with `tag`, mutably
    pub fn child_mut(&mut self, tag: &str) -> Option<&mut GedcomNode> {
        self.children.iter_mut().find(|c| c.tag == tag)
    }

    /// All children with `tag`
    pub fn children_with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a GedcomNode> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Value, or the empty string
    #[inline]
    #[must_use]
    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }

    /// Xref id with `@` delimiters removed
    #[must_use]
    pub fn record_id(&self) -> Option<String> {
        self.xref_id.as_deref().map(strip_xref)
    }
}

/// Remove every `@` from a cross-reference
#[must_use]
pub fn strip_xref(raw: &str) -> String {
    raw.replace('@', "")
}

/// Wrap an id in `@` delimiters
#[must_use]
pub fn to_xref(id: &str) -> String {
    format!("@{id}@")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_and_lookup() {
        let node = GedcomNode::new(0, "INDI")
            .with_xref("@I1@")
            .with_child(GedcomNode::new(1, "NAME").with_value("John /Smith/"))
            .with_child(GedcomNode::new(1, "FAMS").with_value("@F1@"))
            .with_child(GedcomNode::new(1, "FAMS").with_value("@F2@"));

        assert_eq!(node.record_id().as_deref(), Some("I1"));
        assert_eq!(node.child("NAME").map(GedcomNode::value_str), Some("John /Smith/"));
        assert_eq!(node.children_with_tag("FAMS").count(), 2);
        assert!(node.child("SEX").is_none());
    }

    #[test]
    fn xref_helpers() {
        assert_eq!(strip_xref("@F12@"), "F12");
        assert_eq!(to_xref("I3"), "@I3@");
    }
}
