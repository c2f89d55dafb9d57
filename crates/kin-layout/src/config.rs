//! Layout configuration
//!
//! Node geometry used when building the engine graph and positioning family
//! nodes, plus the layered-layout options handed to the engine.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Geometry and engine options for a layout pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Person node width
    pub node_width: f64,
    /// Person node height
    pub node_height: f64,
    /// Radius of the family union marker
    pub family_node_radius: f64,
    /// Vertical offset of a family node below its lower spouse
    pub family_node_top_padding: f64,
    /// Size of invisible anchor nodes
    pub dummy_node_size: f64,
    /// Options passed to the layout engine
    pub options: LayoutOptions,
}

impl LayoutConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With person node size; the family top padding follows the height
    #[must_use]
    pub fn with_node_size(mut self, width: f64, height: f64) -> Self {
        self.node_width = width;
        self.node_height = height;
        self.family_node_top_padding = height + 100.0;
        self
    }

    /// With family marker radius
    #[inline]
    #[must_use]
    pub fn with_family_node_radius(mut self, radius: f64) -> Self {
        self.family_node_radius = radius;
        self
    }

    /// With family node top padding
    #[inline]
    #[must_use]
    pub fn with_family_node_top_padding(mut self, padding: f64) -> Self {
        self.family_node_top_padding = padding;
        self
    }

    /// With engine options
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: LayoutOptions) -> Self {
        self.options = options;
        self
    }

    /// Family node width and height: half a person node
    #[inline]
    #[must_use]
    pub fn family_node_size(&self) -> (f64, f64) {
        (self.node_width / 2.0, self.node_height / 2.0)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 200.0,
            node_height: 60.0,
            family_node_radius: 8.0,
            family_node_top_padding: 160.0,
            dummy_node_size: 1.0,
            options: LayoutOptions::default(),
        }
    }
}

/// Layered layout options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Layout algorithm
    pub algorithm: String,
    /// Flow direction of layers
    pub direction: String,
    /// Spacing between nodes of one layer
    pub node_spacing: f64,
    /// Spacing between layers
    pub layer_spacing: f64,
    /// Spacing between edges and nodes
    pub edge_node_spacing: f64,
    /// Spacing between parallel edges
    pub edge_edge_spacing: f64,
    /// Crossing minimisation strategy
    pub crossing_minimization: String,
    /// Node placement strategy
    pub node_placement: String,
    /// Cycle breaking strategy
    pub cycle_breaking: String,
    /// Hierarchy handling
    pub hierarchy_handling: String,
    /// Edge routing style
    pub edge_routing: String,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            algorithm: "layered".to_string(),
            direction: "DOWN".to_string(),
            node_spacing: 50.0,
            layer_spacing: 120.0,
            edge_node_spacing: 20.0,
            edge_edge_spacing: 15.0,
            crossing_minimization: "LAYER_SWEEP".to_string(),
            node_placement: "SIMPLE".to_string(),
            cycle_breaking: "GREEDY".to_string(),
            hierarchy_handling: "INCLUDE_CHILDREN".to_string(),
            edge_routing: "ORTHOGONAL".to_string(),
        }
    }
}

impl LayoutOptions {
    /// With node and layer spacing
    #[inline]
    #[must_use]
    pub fn with_spacing(mut self, node_spacing: f64, layer_spacing: f64) -> Self {
        self.node_spacing = node_spacing;
        self.layer_spacing = layer_spacing;
        self
    }

    /// Render as ELK-style `elk.*` properties
    #[must_use]
    pub fn to_properties(&self) -> IndexMap<String, String> {
        [
            ("elk.algorithm", self.algorithm.clone()),
            ("elk.direction", self.direction.clone()),
            ("elk.spacing.nodeNode", number(self.node_spacing)),
            ("elk.layered.spacing.nodeNodeBetweenLayers", number(self.layer_spacing)),
            ("elk.spacing.edgeNode", number(self.edge_node_spacing)),
            ("elk.spacing.edgeEdge", number(self.edge_edge_spacing)),
            ("elk.layered.crossingMinimization.strategy", self.crossing_minimization.clone()),
            ("elk.layered.nodePlacement.strategy", self.node_placement.clone()),
            ("elk.layered.cycleBreaking.strategy", self.cycle_breaking.clone()),
            ("elk.hierarchyHandling", self.hierarchy_handling.clone()),
            ("elk.edgeRouting", self.edge_routing.clone()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

// 50.0 renders as "50", 12.5 as "12.5"
fn number(value: f64) -> String {
    format!("{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tree_geometry() {
        let config = LayoutConfig::default();
        assert_eq!(config.node_width, 200.0);
        assert_eq!(config.node_height, 60.0);
        assert_eq!(config.family_node_top_padding, 160.0);
        assert_eq!(config.family_node_size(), (100.0, 30.0));
    }

    #[test]
    fn properties_render_engine_keys() {
        let props = LayoutOptions::default().to_properties();
        assert_eq!(props["elk.algorithm"], "layered");
        assert_eq!(props["elk.direction"], "DOWN");
        assert_eq!(props["elk.spacing.nodeNode"], "50");
        assert_eq!(props["elk.layered.spacing.nodeNodeBetweenLayers"], "120");
        assert_eq!(props["elk.edgeRouting"], "ORTHOGONAL");
        assert_eq!(props.len(), 11);
    }

    #[test]
    fn node_size_moves_top_padding() {
        let config = LayoutConfig::new().with_node_size(180.0, 80.0);
        assert_eq!(config.family_node_top_padding, 180.0);
    }

    #[test]
    fn partial_config_deserializes_with_defaults() {
        let config: LayoutConfig =
            serde_json::from_str(r#"{"node_width": 150, "options": {"node_spacing": 30}}"#).unwrap();
        assert_eq!(config.node_width, 150.0);
        assert_eq!(config.node_height, 60.0);
        assert_eq!(config.options.node_spacing, 30.0);
        assert_eq!(config.options.direction, "DOWN");
    }
}
