//! Kin GEDCOM
//!
//! GEDCOM interchange for the person graph:
//! - [`parse_gedcom`]: text → generic node forest
//! - [`gedcom_to_persons`]: node forest → persons
//! - [`persons_to_gedcom`]: persons → node forest, reusing family labels of
//!   an original document
//! - [`merge_gedcom_nodes`]: apply current persons to an imported document
//!   without losing anything the mapper does not understand
//! - [`export_gedcom`]: node forest → text
//!
//! # Example
//!
//! ```rust
//! use kin_gedcom::{export_gedcom, gedcom_to_persons, parse_gedcom, persons_to_gedcom};
//!
//! let nodes = parse_gedcom("0 @I1@ INDI\n1 NAME Ada /Lovelace/\n1 SEX F");
//! let persons = gedcom_to_persons(&nodes);
//! assert_eq!(persons[0].data.last_name.as_deref(), Some("Lovelace"));
//!
//! let text = export_gedcom(&persons_to_gedcom(&persons, &[]), None);
//! assert_eq!(text, "0 @I1@ INDI\n1 NAME Ada /Lovelace/\n1 SEX F");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod export;
pub mod import;
pub mod io;
pub mod merge;
pub mod node;
pub mod note;
pub mod parser;
pub mod serializer;

pub use error::{GedcomError, GedcomResult};
pub use export::{assign_family_ids, extract_families, family_key, persons_to_gedcom, FamilyRecord};
pub use import::{gedcom_to_graph, gedcom_to_persons, parse_name};
pub use io::{read_gedcom_file, read_gedcom_text, tree_name_from_path, write_gedcom_file};
pub use merge::merge_gedcom_nodes;
pub use node::GedcomNode;
pub use note::{compose_note, decode_note, DecodedNote};
pub use parser::parse_gedcom;
pub use serializer::{export_gedcom, DEFAULT_SOURCE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
