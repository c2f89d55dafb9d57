//! Layout engine seam
//!
//! The tree builder hands an [`EngineGraph`] to a [`LayoutEngine`] and reads
//! back one position per node. Engines report top-left corners.
//!
//! - [`LayeredEngine`]: built-in layered placement over a petgraph DAG
//! - any external engine can be plugged in by implementing the trait

use crate::error::LayoutResult;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

mod layered;

pub use layered::LayeredEngine;

/// 2D point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a point
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Relationship carried by an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Person → family
    Spouse,
    /// Family → person
    Child,
}

/// Node submitted to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineNode {
    /// Node id
    pub id: String,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

/// Directed edge submitted to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEdge {
    /// Edge id
    pub id: String,
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    /// Relationship kind
    pub kind: EdgeKind,
}

/// Complete engine input
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineGraph {
    /// Root id
    pub id: String,
    /// Engine properties (`elk.*` keys)
    pub layout_options: IndexMap<String, String>,
    /// Nodes, visible and dummy
    pub children: Vec<EngineNode>,
    /// Edges, visible and dummy
    pub edges: Vec<EngineEdge>,
}

impl EngineGraph {
    /// Look up a node
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&EngineNode> {
        self.children.iter().find(|n| n.id == id)
    }
}

/// Positions assigned by an engine, keyed by node id
pub type EnginePositions = HashMap<String, Point>;

/// A graph layout engine
///
/// Implementations must assign a position to every node of the graph or fail;
/// nodes missing from the result are placed at the origin.
#[async_trait::async_trait]
pub trait LayoutEngine: Send + Sync {
    /// Lay out a graph
    async fn layout(&self, graph: EngineGraph) -> LayoutResult<EnginePositions>;

    /// Engine name for logs
    fn name(&self) -> &'static str {
        "engine"
    }
}
