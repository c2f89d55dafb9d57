//! Engine graph construction and position read-back
//!
//! [`LayoutPlan::build`] turns a person graph into engine input:
//! - one node per person and one half-size node per family
//! - spouse edges (person → family) and child edges (family → child)
//! - an invisible child under each childless family, and an invisible parent
//!   above each spouse that has no parents, so every union gets a layer above
//!   and below it
//!
//! [`LayoutPlan::apply`] maps the engine positions back, re-centres two-spouse
//! family nodes between the spouses and drops the invisible helpers.

use crate::config::LayoutConfig;
use crate::engine::{EdgeKind, EngineEdge, EngineGraph, EngineNode, EnginePositions, LayoutEngine, Point};
use crate::error::LayoutResult;
use crate::family::{group_families, FamilyGroup};
use crate::tree::{FamilyEdge, FamilyNode, Handle, PersonNode, TreeLayout};
use indexmap::IndexMap;
use kin_model::{family_color, PersonGraph};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
struct VisibleEdge {
    id: String,
    source: String,
    target: String,
    kind: EdgeKind,
    family_id: String,
    member_id: String,
}

/// Engine input plus what is needed to interpret the engine's answer
#[derive(Debug, Clone)]
pub struct LayoutPlan {
    config: LayoutConfig,
    graph: EngineGraph,
    persons: Vec<String>,
    families: IndexMap<String, FamilyGroup>,
    edges: Vec<VisibleEdge>,
    parent_family: HashMap<String, String>,
    dummies: HashSet<String>,
}

impl LayoutPlan {
    /// Build the engine graph for a person graph
    #[must_use]
    pub fn build(persons: &PersonGraph, config: &LayoutConfig) -> Self {
        let mut plan = Self {
            config: config.clone(),
            graph: EngineGraph {
                id: "root".to_string(),
                layout_options: config.options.to_properties(),
                ..EngineGraph::default()
            },
            persons: persons.ids().map(str::to_string).collect(),
            families: group_families(persons),
            edges: Vec::new(),
            parent_family: HashMap::new(),
            dummies: HashSet::new(),
        };

        for id in &plan.persons {
            plan.graph.children.push(EngineNode {
                id: id.clone(),
                width: config.node_width,
                height: config.node_height,
            });
        }

        let (family_width, family_height) = config.family_node_size();
        let families: Vec<FamilyGroup> = plan.families.values().cloned().collect();
        let mut spouses_in_families: HashSet<String> = HashSet::new();

        for family in &families {
            plan.graph.children.push(EngineNode {
                id: family.id.clone(),
                width: family_width,
                height: family_height,
            });

            for spouse in &family.spouse_ids {
                spouses_in_families.insert(spouse.clone());
                plan.push_visible(VisibleEdge {
                    id: format!("spouse_{spouse}_{}", family.id),
                    source: spouse.clone(),
                    target: family.id.clone(),
                    kind: EdgeKind::Spouse,
                    family_id: family.id.clone(),
                    member_id: spouse.clone(),
                });
            }

            for child in &family.children_ids {
                plan.parent_family.insert(child.clone(), family.id.clone());
                plan.push_visible(VisibleEdge {
                    id: format!("child_{}_{child}", family.id),
                    source: family.id.clone(),
                    target: child.clone(),
                    kind: EdgeKind::Child,
                    family_id: family.id.clone(),
                    member_id: child.clone(),
                });
            }

            if family.children_ids.is_empty() {
                let dummy = format!("dummy_child_{}", family.id);
                plan.push_dummy(
                    dummy.clone(),
                    format!("dummy_child_edge_{}", family.id),
                    family.id.clone(),
                    dummy,
                    EdgeKind::Child,
                );
            }
        }

        for person in persons.iter() {
            if !person.rels.has_parents() && spouses_in_families.contains(&person.id) {
                let dummy = format!("dummy_parent_{}", person.id);
                plan.push_dummy(
                    dummy.clone(),
                    format!("dummy_parent_edge_{}", person.id),
                    dummy,
                    person.id.clone(),
                    EdgeKind::Spouse,
                );
            }
        }

        debug!(
            persons = plan.persons.len(),
            families = plan.families.len(),
            nodes = plan.graph.children.len(),
            edges = plan.graph.edges.len(),
            "built layout graph"
        );
        plan
    }

    fn push_visible(&mut self, edge: VisibleEdge) {
        self.graph.edges.push(EngineEdge {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            kind: edge.kind,
        });
        self.edges.push(edge);
    }

    fn push_dummy(&mut self, node: String, edge: String, source: String, target: String, kind: EdgeKind) {
        let size = self.config.dummy_node_size;
        self.graph.children.push(EngineNode {
            id: node.clone(),
            width: size,
            height: size,
        });
        self.graph.edges.push(EngineEdge {
            id: edge.clone(),
            source,
            target,
            kind,
        });
        self.dummies.insert(node);
        self.dummies.insert(edge);
    }

    /// Engine input
    #[inline]
    #[must_use]
    pub fn engine_graph(&self) -> &EngineGraph {
        &self.graph
    }

    /// Family groups in layout order
    #[inline]
    #[must_use]
    pub fn families(&self) -> &IndexMap<String, FamilyGroup> {
        &self.families
    }

    /// Whether a node or edge id is an invisible helper
    #[inline]
    #[must_use]
    pub fn is_dummy(&self, id: &str) -> bool {
        self.dummies.contains(id)
    }

    /// Interpret engine positions
    ///
    /// Nodes the engine did not position fall back to the origin.
    #[must_use]
    pub fn apply(&self, positions: &EnginePositions) -> TreeLayout {
        let at = |id: &str| positions.get(id).copied().unwrap_or_default();

        let person_nodes: Vec<PersonNode> = self
            .persons
            .iter()
            .map(|id| PersonNode {
                id: id.clone(),
                position: at(id),
                parent_family_id: self.parent_family.get(id).cloned(),
            })
            .collect();
        let person_at: HashMap<&str, Point> = person_nodes
            .iter()
            .map(|n| (n.id.as_str(), n.position))
            .collect();

        let family_nodes = self
            .families
            .values()
            .map(|family| FamilyNode {
                id: family.id.clone(),
                position: self.family_position(family, at(&family.id), &person_at),
                spouse_ids: family.spouse_ids.clone(),
                children_ids: family.children_ids.clone(),
                color: family_color(&family.id).to_string(),
            })
            .collect();

        let edges = self.edges.iter().map(render_edge).collect();

        TreeLayout {
            person_nodes,
            family_nodes,
            edges,
        }
    }

    fn family_position(
        &self,
        family: &FamilyGroup,
        engine: Point,
        persons: &HashMap<&str, Point>,
    ) -> Point {
        let half = self.config.node_width / 2.0;
        let radius = self.config.family_node_radius;
        let padding = self.config.family_node_top_padding;
        let spouse = |i: usize| {
            family
                .spouse_ids
                .get(i)
                .and_then(|id| persons.get(id.as_str()))
                .copied()
        };

        match family.spouse_ids.len() {
            2 => match (spouse(0), spouse(1)) {
                (Some(a), Some(b)) => Point::new(
                    ((a.x + half) + (b.x + half)) / 2.0 - radius,
                    a.y.max(b.y) + padding,
                ),
                _ => engine,
            },
            1 => spouse(0).map_or(engine, |s| Point::new(s.x + half - radius, s.y + padding)),
            _ => engine,
        }
    }

    /// Submit the plan to an engine and interpret the result
    ///
    /// # Errors
    /// Propagates the engine's error unchanged.
    #[instrument(skip_all, fields(engine = engine.name(), nodes = self.graph.children.len()))]
    pub async fn execute(&self, engine: &dyn LayoutEngine) -> LayoutResult<TreeLayout> {
        let positions = engine.layout(self.graph.clone()).await?;
        Ok(self.apply(&positions))
    }
}

fn render_edge(edge: &VisibleEdge) -> FamilyEdge {
    let (source, target, source_handle, target_handle, child_id, spouse_id) = match edge.kind {
        EdgeKind::Child => (
            edge.target.clone(),
            edge.source.clone(),
            Handle::Top,
            Handle::Bottom,
            Some(edge.member_id.clone()),
            None,
        ),
        EdgeKind::Spouse => (
            edge.source.clone(),
            edge.target.clone(),
            Handle::Bottom,
            Handle::Top,
            None,
            Some(edge.member_id.clone()),
        ),
    };
    FamilyEdge {
        id: edge.id.clone(),
        source,
        target,
        source_handle,
        target_handle,
        kind: edge.kind,
        family_id: edge.family_id.clone(),
        child_id,
        spouse_id,
        color: family_color(&edge.family_id).to_string(),
    }
}

/// Lay out a person graph with `engine`
///
/// An empty graph produces an empty layout without calling the engine.
///
/// # Errors
/// Propagates the engine's error unchanged.
pub async fn compute_layout(
    persons: &PersonGraph,
    engine: &dyn LayoutEngine,
    config: &LayoutConfig,
) -> LayoutResult<TreeLayout> {
    if persons.is_empty() {
        return Ok(TreeLayout::default());
    }
    LayoutPlan::build(persons, config).execute(engine).await
}
