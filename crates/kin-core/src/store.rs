//! The family-tree store
//!
//! [`TreeStore`] owns the person graph and everything derived from it:
//! selection, the unsaved flag, the tree name, the imported GEDCOM document
//! and the current layout.
//!
//! # Layout recomputation
//!
//! Mutations run synchronously. A mutation that changed something persists
//! the person list and schedules a layout pass on the ambient tokio runtime.
//! Each pass is stamped with a generation number; a finished pass is applied
//! only if no newer pass was scheduled since. Engine failures produce a
//! notification and keep the previous layout.

use crate::config::KinConfig;
use crate::error::{StoreError, StoreResult};
use crate::knowledge::{apply_immediate_family, KbPerson, KnowledgeBase};
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::stats::TreeStats;
use crate::storage::{JsonFileStorage, MemoryStorage, PersonStorage};
use kin_gedcom::{
    export_gedcom, gedcom_to_persons, merge_gedcom_nodes, parse_gedcom, persons_to_gedcom,
    read_gedcom_text, tree_name_from_path, write_gedcom_file, GedcomNode,
};
use kin_layout::{FamilyNode, LayeredEngine, LayoutEngine, LayoutPlan, TreeLayout};
use kin_model::{MutationStatus, Person, PersonGraph, PersonPatch};
use parking_lot::Mutex;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const ERROR_TITLE: &str = "Family Tree Error";

/// Layout shared with in-flight recomputation tasks
#[derive(Debug, Default)]
struct LayoutState {
    current: Mutex<TreeLayout>,
    generation: AtomicU64,
    loading: AtomicBool,
}

impl LayoutState {
    fn begin(&self) -> u64 {
        self.loading.store(true, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Install a result if it is still the latest; false when discarded
    fn publish(&self, generation: u64, layout: TreeLayout) -> bool {
        let mut current = self.current.lock();
        if !self.is_latest(generation) {
            return false;
        }
        *current = layout;
        self.loading.store(false, Ordering::SeqCst);
        true
    }

    fn finish(&self, generation: u64) {
        if self.is_latest(generation) {
            self.loading.store(false, Ordering::SeqCst);
        }
    }

    fn reset(&self) {
        let mut current = self.current.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        *current = TreeLayout::default();
        self.loading.store(false, Ordering::SeqCst);
    }
}

async fn recompute(
    state: Arc<LayoutState>,
    engine: Arc<dyn LayoutEngine>,
    notifier: Arc<dyn Notifier>,
    plan: LayoutPlan,
    generation: u64,
) {
    match plan.execute(engine.as_ref()).await {
        Ok(layout) => {
            let families = layout.family_nodes.len();
            if state.publish(generation, layout) {
                debug!(generation, families, "layout applied");
            } else {
                debug!(generation, "discarding stale layout");
            }
        }
        Err(err) => {
            error!(generation, error = %err, "layout recomputation failed");
            notifier.notify(Notification::error(
                ERROR_TITLE,
                format!("Failed to recalculate family tree: {err}"),
            ));
            state.finish(generation);
        }
    }
}

/// Central family-tree store
pub struct TreeStore {
    config: KinConfig,
    graph: PersonGraph,
    engine: Arc<dyn LayoutEngine>,
    storage: Arc<dyn PersonStorage>,
    notifier: Arc<dyn Notifier>,
    layout: Arc<LayoutState>,
    pending: Vec<JoinHandle<()>>,
    selected_person_id: Option<String>,
    selected_family_id: Option<String>,
    unsaved: bool,
    tree_name: Option<String>,
    original: Option<Vec<GedcomNode>>,
}

impl fmt::Debug for TreeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeStore")
            .field("persons", &self.graph.len())
            .field("engine", &self.engine.name())
            .field("selected_person_id", &self.selected_person_id)
            .field("selected_family_id", &self.selected_family_id)
            .field("unsaved", &self.unsaved)
            .field("tree_name", &self.tree_name)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new(KinConfig::default())
    }
}

impl TreeStore {
    /// Create a store with the layered engine and tracing notifications
    ///
    /// Persons are stored in `config.storage_dir` when set, in memory
    /// otherwise.
    #[must_use]
    pub fn new(config: KinConfig) -> Self {
        let storage: Arc<dyn PersonStorage> = match &config.storage_dir {
            Some(dir) => Arc::new(JsonFileStorage::new(dir)),
            None => Arc::new(MemoryStorage::new()),
        };
        Self {
            config,
            graph: PersonGraph::new(),
            engine: Arc::new(LayeredEngine),
            storage,
            notifier: Arc::new(TracingNotifier),
            layout: Arc::default(),
            pending: Vec::new(),
            selected_person_id: None,
            selected_family_id: None,
            unsaved: false,
            tree_name: None,
            original: None,
        }
    }

    /// With layout engine
    #[must_use]
    pub fn with_engine(mut self, engine: Arc<dyn LayoutEngine>) -> Self {
        self.engine = engine;
        self
    }

    /// With storage collaborator
    #[must_use]
    pub fn with_storage(mut self, storage: Arc<dyn PersonStorage>) -> Self {
        self.storage = storage;
        self
    }

    /// With notification sink
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &KinConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The person graph
    #[inline]
    #[must_use]
    pub fn persons(&self) -> &PersonGraph {
        &self.graph
    }

    /// Look up a person
    #[inline]
    #[must_use]
    pub fn person(&self, id: &str) -> Option<&Person> {
        self.graph.get(id)
    }

    /// Resolved father of a person
    #[inline]
    #[must_use]
    pub fn get_father(&self, id: &str) -> Option<&Person> {
        self.graph.get_father(id)
    }

    /// Resolved mother of a person
    #[inline]
    #[must_use]
    pub fn get_mother(&self, id: &str) -> Option<&Person> {
        self.graph.get_mother(id)
    }

    /// Next free `I<n>` person id
    #[inline]
    #[must_use]
    pub fn next_person_id(&self) -> String {
        self.graph.next_person_id()
    }

    /// Snapshot of the current layout
    #[must_use]
    pub fn layout(&self) -> TreeLayout {
        self.layout.current.lock().clone()
    }

    /// Whether a layout pass is outstanding
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.layout.loading.load(Ordering::SeqCst)
    }

    /// Generation of the most recently scheduled layout pass
    #[inline]
    #[must_use]
    pub fn layout_generation(&self) -> u64 {
        self.layout.generation.load(Ordering::SeqCst)
    }

    /// Statistics over persons and the current layout
    #[must_use]
    pub fn stats(&self) -> TreeStats {
        TreeStats::compute(&self.graph, &self.layout.current.lock())
    }

    /// Whether there are edits not yet exported
    #[inline]
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Override the unsaved flag
    pub fn set_unsaved_changes(&mut self, unsaved: bool) {
        self.unsaved = unsaved;
    }

    /// Tree name
    #[inline]
    #[must_use]
    pub fn tree_name(&self) -> Option<&str> {
        self.tree_name.as_deref()
    }

    /// Set and persist the tree name
    pub fn set_tree_name(&mut self, name: Option<&str>) {
        self.tree_name = name.map(str::to_string);
        self.storage.save_name(name.unwrap_or_default());
    }

    /// Document the current tree was imported from
    #[inline]
    #[must_use]
    pub fn original_nodes(&self) -> Option<&[GedcomNode]> {
        self.original.as_deref()
    }

    /// Replace the retained import document used for merge-based export
    pub fn set_original_nodes(&mut self, nodes: Option<Vec<GedcomNode>>) {
        self.original = nodes;
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Select a person; clears the family selection
    pub fn select_person(&mut self, id: Option<&str>) {
        self.selected_person_id = id.map(str::to_string);
        if id.is_some() {
            self.selected_family_id = None;
        }
    }

    /// Select a family node; clears the person selection
    pub fn select_family(&mut self, id: Option<&str>) {
        self.selected_family_id = id.map(str::to_string);
        if id.is_some() {
            self.selected_person_id = None;
        }
    }

    /// Selected person id
    #[inline]
    #[must_use]
    pub fn selected_person_id(&self) -> Option<&str> {
        self.selected_person_id.as_deref()
    }

    /// Selected family id
    #[inline]
    #[must_use]
    pub fn selected_family_id(&self) -> Option<&str> {
        self.selected_family_id.as_deref()
    }

    /// Selected person
    #[must_use]
    pub fn selected_person(&self) -> Option<&Person> {
        self.selected_person_id.as_deref().and_then(|id| self.graph.get(id))
    }

    /// Selected family node of the current layout
    #[must_use]
    pub fn selected_family_node(&self) -> Option<FamilyNode> {
        let id = self.selected_family_id.as_deref()?;
        self.layout.current.lock().family(id).cloned()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Add a person
    ///
    /// Without `recalculate` the person is persisted and the tree marked
    /// unsaved, but no layout pass is scheduled.
    pub fn add_person(&mut self, person: Person, recalculate: bool) -> MutationStatus {
        let status = self.graph.add_person(person);
        if recalculate {
            self.after_mutation(status);
        } else {
            self.unsaved = true;
            self.persist();
        }
        status
    }

    /// Replace the supplied top-level fields of a person
    pub fn update_person(&mut self, id: &str, patch: PersonPatch) -> MutationStatus {
        let status = self.graph.update_person(id, patch);
        self.after_mutation(status)
    }

    /// Delete a person and every reference to it
    pub fn delete_person(&mut self, id: &str) -> MutationStatus {
        if self.selected_person_id.as_deref() == Some(id) {
            self.selected_person_id = None;
        }
        let status = self.graph.delete_person(id);
        self.after_mutation(status)
    }

    /// Link two spouses
    pub fn add_spouse(&mut self, person_id: &str, spouse_id: &str) -> MutationStatus {
        let status = self.graph.add_spouse(person_id, spouse_id);
        self.after_mutation(status)
    }

    /// Unlink two spouses
    pub fn remove_spouse(&mut self, person_id: &str, spouse_id: &str) -> MutationStatus {
        let status = self.graph.remove_spouse(person_id, spouse_id);
        self.after_mutation(status)
    }

    /// Attach a child to one or two parents
    pub fn add_child(
        &mut self,
        child_id: &str,
        parent_id: &str,
        other_parent_id: Option<&str>,
    ) -> MutationStatus {
        let status = self.graph.add_child(child_id, parent_id, other_parent_id);
        self.after_mutation(status)
    }

    /// Detach a child from one parent
    pub fn remove_child(&mut self, parent_id: &str, child_id: &str) -> MutationStatus {
        let status = self.graph.remove_child(parent_id, child_id);
        self.after_mutation(status)
    }

    /// Set a child's father
    pub fn add_father(&mut self, child_id: &str, father_id: &str) -> MutationStatus {
        let status = self.graph.add_father(child_id, father_id);
        self.after_mutation(status)
    }

    /// Set a child's mother
    pub fn add_mother(&mut self, child_id: &str, mother_id: &str) -> MutationStatus {
        let status = self.graph.add_mother(child_id, mother_id);
        self.after_mutation(status)
    }

    fn after_mutation(&mut self, status: MutationStatus) -> MutationStatus {
        if status.is_applied() {
            self.unsaved = true;
            self.persist();
            self.recalculate();
        } else {
            debug!(?status, "mutation skipped");
        }
        status
    }

    fn persist(&self) {
        self.storage.save(&self.graph.to_vec());
    }

    // ------------------------------------------------------------------
    // Layout scheduling
    // ------------------------------------------------------------------

    /// Schedule a layout pass over the current persons
    ///
    /// Returns the generation of the new pass. Without a tokio runtime the
    /// pass cannot run and the previous layout stays in place.
    pub fn recalculate(&mut self) -> u64 {
        self.pending.retain(|task| !task.is_finished());
        let generation = self.layout.begin();

        if self.graph.is_empty() {
            self.layout.publish(generation, TreeLayout::default());
            return generation;
        }

        let plan = LayoutPlan::build(&self.graph, &self.config.layout);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                debug!(generation, engine = self.engine.name(), "scheduling layout");
                self.pending.push(runtime.spawn(recompute(
                    Arc::clone(&self.layout),
                    Arc::clone(&self.engine),
                    Arc::clone(&self.notifier),
                    plan,
                    generation,
                )));
            }
            Err(_) => {
                warn!(generation, "no async runtime, layout not recomputed");
                self.layout.finish(generation);
            }
        }
        generation
    }

    /// Lay out the current persons now and install the result
    ///
    /// Unlike [`Self::recalculate`] the engine runs on the caller's task and
    /// a failure is returned. Passes still in flight become stale.
    ///
    /// # Errors
    /// [`StoreError::Layout`] when the engine fails; the previous layout is
    /// kept.
    pub async fn refresh_layout(&mut self) -> StoreResult<()> {
        let generation = self.layout.begin();
        if self.graph.is_empty() {
            self.layout.publish(generation, TreeLayout::default());
            return Ok(());
        }

        let plan = LayoutPlan::build(&self.graph, &self.config.layout);
        match plan.execute(self.engine.as_ref()).await {
            Ok(layout) => {
                self.layout.publish(generation, layout);
                Ok(())
            }
            Err(err) => {
                error!(generation, error = %err, "layout refresh failed");
                self.notifier.notify(Notification::error(
                    ERROR_TITLE,
                    format!("Failed to recalculate family tree: {err}"),
                ));
                self.layout.finish(generation);
                Err(StoreError::from(err))
            }
        }
    }

    /// Wait for every scheduled layout pass to finish
    pub async fn settle(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for result in futures::future::join_all(pending).await {
            if let Err(e) = result {
                warn!(error = %e, "layout task did not complete");
            }
        }
    }

    // ------------------------------------------------------------------
    // Document lifecycle
    // ------------------------------------------------------------------

    /// Replace all persons and schedule a layout pass
    ///
    /// The unsaved flag is left alone: loaded data is not an edit.
    pub fn set_persons(&mut self, persons: Vec<Person>) {
        self.graph = PersonGraph::from_persons(persons);
        self.persist();
        self.recalculate();
    }

    /// Forget everything, including persisted data
    pub fn reset(&mut self) {
        self.graph.clear();
        self.selected_person_id = None;
        self.selected_family_id = None;
        self.layout.reset();
        self.unsaved = false;
        self.tree_name = None;
        self.original = None;
        self.storage.clear();
        info!("tree reset");
    }

    /// Reload persons and tree name from storage
    pub fn restore(&mut self) {
        let persons = self.storage.load();
        let name = self.storage.load_name();
        self.tree_name = (!name.is_empty()).then_some(name);
        info!(persons = persons.len(), "restored tree from storage");
        self.graph = PersonGraph::from_persons(persons);
        self.recalculate();
    }

    /// Replace the tree with a GEDCOM document
    ///
    /// The document is retained so a later export can merge into it.
    pub fn import_gedcom(&mut self, text: &str, name: &str) {
        self.reset();
        let nodes = parse_gedcom(text);
        let persons = gedcom_to_persons(&nodes);
        info!(name, records = nodes.len(), persons = persons.len(), "imported gedcom");
        self.original = Some(nodes);
        self.set_tree_name(Some(name));
        self.set_persons(persons);
    }

    /// Replace the tree with a GEDCOM file, named after the file stem
    ///
    /// The tree is cleared before reading and stays cleared if reading fails.
    ///
    /// # Errors
    /// [`StoreError::Gedcom`] when the file cannot be read.
    pub async fn import_gedcom_file(&mut self, path: impl AsRef<Path>) -> StoreResult<()> {
        let path = path.as_ref();
        self.reset();
        let text = match read_gedcom_text(path).await {
            Ok(text) => text,
            Err(err) => {
                self.notifier.notify(Notification::error(
                    ERROR_TITLE,
                    format!("Failed to import family tree: {err}"),
                ));
                return Err(err.into());
            }
        };
        self.import_gedcom(&text, &tree_name_from_path(path));
        Ok(())
    }

    /// Render the tree as GEDCOM text
    ///
    /// Merges into the imported document when there is one, otherwise writes
    /// a fresh document with a header and trailer.
    #[must_use]
    pub fn render_gedcom(&self) -> String {
        let persons = self.graph.to_vec();
        match &self.original {
            Some(original) => export_gedcom(&merge_gedcom_nodes(original, &persons), None),
            None => export_gedcom(
                &persons_to_gedcom(&persons, &[]),
                Some(self.config.gedcom_source.as_str()),
            ),
        }
    }

    /// Export under a tree name and clear the unsaved flag
    pub fn export_gedcom(&mut self, name: &str) -> String {
        self.set_tree_name(Some(name));
        let text = self.render_gedcom();
        self.unsaved = false;
        info!(name, bytes = text.len(), merged = self.original.is_some(), "exported gedcom");
        text
    }

    /// Export to a file; the tree is renamed after the file stem
    ///
    /// # Errors
    /// [`StoreError::Gedcom`] when the file cannot be written. The unsaved
    /// flag is kept in that case.
    pub async fn export_gedcom_file(&mut self, path: impl AsRef<Path>) -> StoreResult<()> {
        let path = path.as_ref();
        let text = self.render_gedcom();
        if let Err(err) = write_gedcom_file(path, &text).await {
            self.notifier.notify(Notification::error(
                ERROR_TITLE,
                format!("Failed to export family tree: {err}"),
            ));
            return Err(err.into());
        }
        let name = tree_name_from_path(path);
        self.set_tree_name(Some(name.as_str()));
        self.unsaved = false;
        Ok(())
    }

    /// Merge the knowledge-base family of `root` into the tree
    ///
    /// Returns the id of the root person.
    ///
    /// # Errors
    /// [`StoreError::KnowledgeBase`] when the lookup fails; the tree is left
    /// untouched.
    pub async fn load_immediate_family(
        &mut self,
        kb: &dyn KnowledgeBase,
        root: &KbPerson,
    ) -> StoreResult<String> {
        let family = match kb.fetch_immediate_family(&root.id).await {
            Ok(family) => family,
            Err(err) => {
                warn!(entity = %root.id, error = %err, "knowledge base lookup failed");
                self.notifier.notify(Notification::error(
                    ERROR_TITLE,
                    format!("Failed to load family of {}: {err}", root.label),
                ));
                return Err(StoreError::from(err));
            }
        };

        let mut graph = self.graph.clone();
        let root_id = apply_immediate_family(&mut graph, root, &family);
        info!(root = %root_id, persons = graph.len(), "loaded immediate family");
        self.set_persons(graph.into_vec());
        Ok(root_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MockPersonStorage;
    use kin_model::Gender;

    fn person(id: &str, gender: Gender) -> Person {
        Person::new(id, id).with_gender(gender)
    }

    #[test]
    fn mutations_persist_through_storage() {
        let mut storage = MockPersonStorage::new();
        storage
            .expect_save()
            .withf(|persons| persons.len() == 1)
            .times(1)
            .return_const(());
        storage
            .expect_save()
            .withf(|persons| persons.len() == 2)
            .times(2)
            .return_const(());

        let mut store = TreeStore::default().with_storage(Arc::new(storage));
        store.add_person(person("I1", Gender::Male), false);
        store.add_person(person("I2", Gender::Female), false);
        store.add_spouse("I1", "I2");
        assert!(store.has_unsaved_changes());
        assert!(store.persons().get("I1").is_some_and(|p| p.rels.has_spouse("I2")));
    }

    #[test]
    fn skipped_mutation_neither_persists_nor_schedules() {
        let mut storage = MockPersonStorage::new();
        storage.expect_save().never();

        let mut store = TreeStore::default().with_storage(Arc::new(storage));
        let status = store.add_spouse("I1", "I2");
        assert!(!status.is_applied());
        assert!(!store.has_unsaved_changes());
        assert_eq!(store.layout_generation(), 0);
    }

    #[test]
    fn reset_clears_storage_and_name() {
        let mut storage = MockPersonStorage::new();
        storage.expect_save_name().return_const(());
        storage.expect_clear().times(1).return_const(());

        let mut store = TreeStore::default().with_storage(Arc::new(storage));
        store.set_tree_name(Some("Smiths"));
        store.reset();
        assert!(store.tree_name().is_none());
        assert!(store.original_nodes().is_none());
    }

    #[test]
    fn without_runtime_layout_is_left_stale() {
        let mut store = TreeStore::default();
        store.add_person(person("I1", Gender::Male), true);
        assert_eq!(store.layout_generation(), 1);
        assert!(!store.is_loading());
        assert!(store.layout().is_empty());
    }

    #[test]
    fn selection_is_exclusive() {
        let mut store = TreeStore::default();
        store.add_person(person("I1", Gender::Male), false);
        store.select_person(Some("I1"));
        assert_eq!(store.selected_person().map(|p| p.id.as_str()), Some("I1"));

        store.select_family(Some("family_I1"));
        assert!(store.selected_person_id().is_none());
        assert_eq!(store.selected_family_id(), Some("family_I1"));

        store.select_person(Some("I1"));
        assert!(store.selected_family_id().is_none());

        store.delete_person("I1");
        assert!(store.selected_person_id().is_none());
    }
}
