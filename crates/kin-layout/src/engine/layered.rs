//! Built-in layered layout
//!
//! A small Sugiyama-style placement for environments without an external
//! engine:
//! - cycles broken by reversing the back edges of a depth-first search, so
//!   ancestry loops still lay out
//! - longest-path layering over the resulting DAG
//! - one top-down barycentre sweep to order each layer
//! - layers packed left to right and centred on a common axis
//!
//! Only top-to-bottom flow is produced. Spacing is read from the
//! `elk.spacing.nodeNode` and `elk.layered.spacing.nodeNodeBetweenLayers`
//! properties of the graph.

use super::{EngineGraph, EnginePositions, LayoutEngine, Point};
use crate::config::LayoutOptions;
use crate::error::{LayoutError, LayoutResult};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{depth_first_search, DfsEvent};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use tracing::debug;

const NODE_SPACING_KEY: &str = "elk.spacing.nodeNode";
const LAYER_SPACING_KEY: &str = "elk.layered.spacing.nodeNodeBetweenLayers";

/// Layered layout engine backed by petgraph
#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredEngine;

impl LayeredEngine {
    /// Create engine
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Lay out synchronously
    ///
    /// # Errors
    /// [`LayoutError::UnknownNode`] when an edge endpoint is not a node.
    pub fn layout_sync(&self, graph: &EngineGraph) -> LayoutResult<EnginePositions> {
        let defaults = LayoutOptions::default();
        let node_spacing = spacing(graph, NODE_SPACING_KEY, defaults.node_spacing);
        let layer_spacing = spacing(graph, LAYER_SPACING_KEY, defaults.layer_spacing);

        // Node weights index into graph.children
        let mut input: DiGraph<usize, ()> =
            DiGraph::with_capacity(graph.children.len(), graph.edges.len());
        let mut index: HashMap<&str, NodeIndex> = HashMap::with_capacity(graph.children.len());
        for (i, node) in graph.children.iter().enumerate() {
            index.insert(node.id.as_str(), input.add_node(i));
        }
        for edge in &graph.edges {
            let endpoint = |id: &str| {
                index.get(id).copied().ok_or_else(|| LayoutError::UnknownNode {
                    edge: edge.id.clone(),
                    node: id.to_string(),
                })
            };
            input.add_edge(endpoint(&edge.source)?, endpoint(&edge.target)?, ());
        }

        let (dag, order) = break_cycles(&input);

        // Longest-path layering
        let mut layer_of: HashMap<NodeIndex, usize> = HashMap::with_capacity(order.len());
        for &n in &order {
            let layer = dag
                .neighbors_directed(n, Direction::Incoming)
                .filter_map(|p| layer_of.get(&p))
                .map(|l| l + 1)
                .max()
                .unwrap_or(0);
            layer_of.insert(n, layer);
        }
        let depth = layer_of.values().copied().max().map_or(0, |d| d + 1);
        let mut layers: Vec<Vec<NodeIndex>> = vec![Vec::new(); depth];
        for n in dag.node_indices() {
            layers[layer_of[&n]].push(n);
        }

        let mut centers: HashMap<NodeIndex, f64> = HashMap::with_capacity(order.len());
        let mut positions = EnginePositions::with_capacity(order.len());
        let mut y = 0.0;

        for layer in &mut layers {
            // Barycentre of already placed predecessors; layer 0 keeps input order
            let mut keyed: Vec<(f64, NodeIndex)> = layer
                .iter()
                .enumerate()
                .map(|(i, &n)| {
                    let preds: Vec<f64> = dag
                        .neighbors_directed(n, Direction::Incoming)
                        .filter_map(|p| centers.get(&p).copied())
                        .collect();
                    #[allow(clippy::cast_precision_loss)]
                    let key = if preds.is_empty() {
                        i as f64
                    } else {
                        preds.iter().sum::<f64>() / preds.len() as f64
                    };
                    (key, n)
                })
                .collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
            *layer = keyed.into_iter().map(|(_, n)| n).collect();

            let nodes: Vec<_> = layer.iter().map(|&n| &graph.children[dag[n]]).collect();
            #[allow(clippy::cast_precision_loss)]
            let width = nodes.iter().map(|n| n.width).sum::<f64>()
                + node_spacing * nodes.len().saturating_sub(1) as f64;
            let height = nodes.iter().map(|n| n.height).fold(0.0, f64::max);

            let mut x = -width / 2.0;
            for (&n, node) in layer.iter().zip(&nodes) {
                centers.insert(n, x + node.width / 2.0);
                positions.insert(node.id.clone(), Point::new(x, y));
                x += node.width + node_spacing;
            }
            y += height + layer_spacing;
        }

        // Shift so the leftmost node touches x = 0
        let min_x = positions.values().map(|p| p.x).fold(f64::INFINITY, f64::min);
        if min_x.is_finite() {
            for p in positions.values_mut() {
                p.x -= min_x;
            }
        }

        debug!(nodes = positions.len(), layers = layers.len(), "layered layout done");
        Ok(positions)
    }
}

#[async_trait::async_trait]
impl LayoutEngine for LayeredEngine {
    async fn layout(&self, graph: EngineGraph) -> LayoutResult<EnginePositions> {
        self.layout_sync(&graph)
    }

    fn name(&self) -> &'static str {
        "layered"
    }
}

/// Reverse the back edges of a depth-first search and drop self-loops
///
/// Returns the acyclic graph, with the node indices of `graph`, and a
/// topological order of it. Every remaining edge runs from a node that
/// finished later to one that finished earlier, so decreasing finish time
/// is a topological order.
fn break_cycles(graph: &DiGraph<usize, ()>) -> (DiGraph<usize, ()>, Vec<NodeIndex>) {
    let mut back_edges: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
    let mut finished: Vec<NodeIndex> = Vec::with_capacity(graph.node_count());
    depth_first_search(graph, graph.node_indices(), |event| match event {
        DfsEvent::BackEdge(u, v) => {
            back_edges.insert((u, v));
        }
        DfsEvent::Finish(n, _) => finished.push(n),
        _ => {}
    });

    let mut dag: DiGraph<usize, ()> =
        DiGraph::with_capacity(graph.node_count(), graph.edge_count());
    for n in graph.node_indices() {
        dag.add_node(graph[n]);
    }
    let mut reversed = 0usize;
    for edge in graph.raw_edges() {
        let (source, target) = (edge.source(), edge.target());
        if source == target {
            continue;
        }
        if back_edges.contains(&(source, target)) {
            reversed += 1;
            dag.add_edge(target, source, ());
        } else {
            dag.add_edge(source, target, ());
        }
    }
    if reversed > 0 {
        debug!(reversed, "broke cycles by reversing edges");
    }

    finished.reverse();
    (dag, finished)
}

fn spacing(graph: &EngineGraph, key: &str, default: f64) -> f64 {
    graph
        .layout_options
        .get(key)
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(default)
}
