//! Kin Model
//!
//! In-memory person graph for family trees.
//!
//! # Core Concepts
//!
//! - **Person**: a record keyed by a stable string id, carrying display data
//!   and relationship pointers (`father`, `mother`, `spouses`, `children`)
//! - **PersonGraph**: an id-indexed arena. Relationship pointers are plain ids
//!   resolved through the graph, so the cyclic parent/child and spouse links
//!   never become ownership cycles
//! - **Mutations**: relationship edits that keep both ends of every link in
//!   sync and report a [`MutationStatus`] instead of failing on unknown ids
//!
//! # Example
//!
//! ```rust
//! use kin_model::{Gender, Person, PersonGraph};
//!
//! let mut graph = PersonGraph::new();
//! graph.insert(Person::new("I1", "John").with_gender(Gender::Male));
//! graph.insert(Person::new("I2", "Jane").with_gender(Gender::Female));
//! graph.insert(Person::new("I3", "Jack"));
//!
//! graph.add_spouse("I1", "I2");
//! graph.add_child("I3", "I2", Some("I1"));
//!
//! let child = graph.get("I3").unwrap();
//! assert_eq!(child.rels.father.as_deref(), Some("I1"));
//! assert_eq!(child.rels.mother.as_deref(), Some("I2"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod color;
pub mod graph;
pub mod mutation;
pub mod person;

pub use color::{family_color, FAMILY_COLORS};
pub use graph::{FamilyGroupView, PersonGraph, RelationshipKind};
pub use mutation::{resolve_parents, MutationStatus, ParentSlots, SkipReason};
pub use person::{Gender, Person, PersonData, PersonPatch, Relations};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the person graph
    pub use crate::graph::{PersonGraph, RelationshipKind};
    pub use crate::mutation::MutationStatus;
    pub use crate::person::{Gender, Person, PersonData, PersonPatch, Relations};
}
