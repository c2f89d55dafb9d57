//! Kin Layout
//!
//! Turns a person graph into positioned nodes and edges for a family-tree
//! view.
//!
//! # Pipeline
//!
//! 1. [`group_families`] derives spouse unions and single-parent groups
//! 2. [`LayoutPlan::build`] emits an engine graph with family nodes between
//!    generations and invisible anchors that keep unions on their own layer
//! 3. a [`LayoutEngine`] assigns positions ([`LayeredEngine`] is built in)
//! 4. [`LayoutPlan::apply`] centres family nodes under their spouses, strips
//!    anchors and orients edges for rendering
//!
//! # Example
//!
//! ```rust
//! use kin_layout::{compute_layout, LayeredEngine, LayoutConfig};
//! use kin_model::{Gender, Person, PersonGraph};
//!
//! # tokio_test_block(async {
//! let mut graph = PersonGraph::new();
//! graph.insert(Person::new("I1", "John").with_gender(Gender::Male));
//! graph.insert(Person::new("I2", "Jane").with_gender(Gender::Female));
//! graph.add_spouse("I1", "I2");
//!
//! let layout = compute_layout(&graph, &LayeredEngine, &LayoutConfig::default())
//!     .await
//!     .unwrap();
//! assert_eq!(layout.person_nodes.len(), 2);
//! assert_eq!(layout.family_nodes[0].id, "family_I1_I2");
//! # });
//! # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod engine;
pub mod error;
pub mod family;
pub mod plan;
pub mod tree;

pub use config::{LayoutConfig, LayoutOptions};
pub use engine::{
    EdgeKind, EngineEdge, EngineGraph, EngineNode, EnginePositions, LayeredEngine, LayoutEngine,
    Point,
};
pub use error::{LayoutError, LayoutResult};
pub use family::{family_id, group_families, FamilyGroup};
pub use plan::{compute_layout, LayoutPlan};
pub use tree::{FamilyEdge, FamilyNode, Handle, PersonNode, TreeLayout};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for laying out a tree
    pub use crate::config::LayoutConfig;
    pub use crate::engine::{LayeredEngine, LayoutEngine};
    pub use crate::plan::compute_layout;
    pub use crate::tree::TreeLayout;
}
