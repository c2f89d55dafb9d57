//! Kin Core
//!
//! The family-tree store and its collaborators.
//!
//! # Core Concepts
//!
//! - **TreeStore**: owns the person graph, selection, unsaved flag and the
//!   current layout. Mutations persist synchronously and schedule an async
//!   layout pass; stale passes are discarded
//! - **PersonStorage**: key-value persistence of the person list and tree
//!   name ([`MemoryStorage`], [`JsonFileStorage`])
//! - **Notifier**: user-visible error reporting, separate from logs
//! - **KnowledgeBase**: external source of people and their immediate family
//!
//! # Example
//!
//! ```rust
//! use kin_core::{KinConfig, TreeStore};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let mut store = TreeStore::new(KinConfig::default());
//! store.import_gedcom(
//!     "0 @I1@ INDI\n1 NAME John /Smith/\n1 SEX M\n0 TRLR",
//!     "Smiths",
//! );
//! store.settle().await;
//!
//! assert_eq!(store.persons().len(), 1);
//! assert_eq!(store.layout().person_nodes.len(), 1);
//! assert_eq!(store.tree_name(), Some("Smiths"));
//! # });
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod knowledge;
pub mod notify;
pub mod stats;
pub mod storage;
pub mod store;

pub use config::KinConfig;
pub use error::{ConfigError, KnowledgeBaseError, KnowledgeBaseResult, StoreError, StoreResult};
pub use knowledge::{
    apply_immediate_family, convert_kb_person, gender_from_entity, normalize_date, thumbnail_url,
    ImmediateFamily, InMemoryKnowledgeBase, KbChild, KbPerson, KbSibling, KnowledgeBase,
};
pub use notify::{Notification, Notifier, RecordingNotifier, Severity, TracingNotifier};
pub use stats::TreeStats;
pub use storage::{JsonFileStorage, MemoryStorage, PersonStorage};
pub use store::TreeStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a tree store
    pub use crate::config::KinConfig;
    pub use crate::error::{StoreError, StoreResult};
    pub use crate::notify::{Notification, Notifier};
    pub use crate::storage::PersonStorage;
    pub use crate::store::TreeStore;
    pub use kin_model::prelude::*;
}
