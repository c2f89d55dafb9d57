//! Positioned layout handed to rendering

use crate::engine::{EdgeKind, Point};
use serde::{Deserialize, Serialize};

/// Connection anchor on a rendered node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    /// Top edge of the node
    Top,
    /// Bottom edge of the node
    Bottom,
}

/// Positioned person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonNode {
    /// Person id
    pub id: String,
    /// Top-left corner
    pub position: Point,
    /// Family this person descends from in the layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_family_id: Option<String>,
}

/// Positioned family union marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyNode {
    /// Family id
    pub id: String,
    /// Top-left corner
    pub position: Point,
    /// Spouse ids
    pub spouse_ids: Vec<String>,
    /// Child ids
    pub children_ids: Vec<String>,
    /// Palette colour
    pub color: String,
}

/// Rendered edge
///
/// `source`/`target` follow drawing order: spouse edges run person → family,
/// child edges run child → family so both attach to the family from below
/// and above respectively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyEdge {
    /// Edge id
    pub id: String,
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    /// Anchor on the source node
    pub source_handle: Handle,
    /// Anchor on the target node
    pub target_handle: Handle,
    /// Relationship kind
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    /// Family the edge belongs to
    pub family_id: String,
    /// Child end of a child edge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_id: Option<String>,
    /// Spouse end of a spouse edge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spouse_id: Option<String>,
    /// Palette colour of the family
    pub color: String,
}

/// A fully positioned tree
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeLayout {
    /// Person nodes in person order
    pub person_nodes: Vec<PersonNode>,
    /// Family nodes in family order
    pub family_nodes: Vec<FamilyNode>,
    /// Visible edges
    pub edges: Vec<FamilyEdge>,
}

impl TreeLayout {
    /// Whether nothing was laid out
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.person_nodes.is_empty() && self.family_nodes.is_empty()
    }

    /// Person node by id
    #[must_use]
    pub fn person(&self, id: &str) -> Option<&PersonNode> {
        self.person_nodes.iter().find(|n| n.id == id)
    }

    /// Family node by id
    #[must_use]
    pub fn family(&self, id: &str) -> Option<&FamilyNode> {
        self.family_nodes.iter().find(|n| n.id == id)
    }

    /// Edge by id
    #[must_use]
    pub fn edge(&self, id: &str) -> Option<&FamilyEdge> {
        self.edges.iter().find(|e| e.id == id)
    }
}
