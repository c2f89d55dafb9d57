//! External person knowledge base
//!
//! Lookups are asynchronous and go through [`KnowledgeBase`]. The conversion
//! of its records into persons lives here and is synchronous:
//! - [`convert_kb_person`] reuses a person already linked to the same entity
//! - [`apply_immediate_family`] wires parents, spouses, children and siblings
//!   of a root entity into a person graph with symmetric links

use crate::error::{KnowledgeBaseError, KnowledgeBaseResult};
use indexmap::IndexMap;
use kin_model::{Gender, Person, PersonGraph};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

const MALE_ENTITY: &str = "Q6581097";
const FEMALE_ENTITY: &str = "Q6581072";
const ENTITY_PAGE: &str = "https://www.wikidata.org/wiki/";
const THUMBNAIL_WIDTH: &str = "?width=120";

static DATE_PARTS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)-(\d{2})-(\d{2})").expect("valid regex"));
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,4}-\d{2}-\d{2}$").expect("valid regex"));

/// A person entity as returned by the knowledge base
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KbPerson {
    /// Entity id (e.g. `Q7186`)
    pub id: String,
    /// Display label, usually the full name
    pub label: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Birth date, already normalized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    /// Death date, already normalized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,
    /// Gender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

impl KbPerson {
    /// Entity with an id and a label
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            ..Self::default()
        }
    }

    /// With gender
    #[inline]
    #[must_use]
    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A child of the root entity and the child's other parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KbChild {
    /// The child
    pub child: KbPerson,
    /// The parent that is not the root entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_parent: Option<KbPerson>,
}

/// A sibling of the root entity with the sibling's own parents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KbSibling {
    /// The sibling
    pub sibling: KbPerson,
    /// Sibling's father
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father: Option<KbPerson>,
    /// Sibling's mother
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother: Option<KbPerson>,
}

/// Immediate family of one entity
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImmediateFamily {
    /// Father
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father: Option<KbPerson>,
    /// Mother
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother: Option<KbPerson>,
    /// Spouses
    #[serde(default)]
    pub spouses: Vec<KbPerson>,
    /// Children
    #[serde(default)]
    pub children: Vec<KbChild>,
    /// Siblings
    #[serde(default)]
    pub siblings: Vec<KbSibling>,
}

/// Person lookup service
#[async_trait::async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Persons matching a free-text query
    async fn search(&self, query: &str) -> KnowledgeBaseResult<Vec<KbPerson>>;

    /// Parents, spouses, children and siblings of an entity
    async fn fetch_immediate_family(&self, entity_id: &str) -> KnowledgeBaseResult<ImmediateFamily>;
}

/// Knowledge base backed by in-memory records
///
/// Useful offline and as a test double. A snapshot file is JSON of the form
/// `{"persons": [KbPerson...], "families": {"<entity id>": ImmediateFamily}}`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKnowledgeBase {
    persons: IndexMap<String, KbPerson>,
    families: IndexMap<String, ImmediateFamily>,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    persons: Vec<KbPerson>,
    #[serde(default)]
    families: IndexMap<String, ImmediateFamily>,
}

impl InMemoryKnowledgeBase {
    /// Create empty knowledge base
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a searchable person
    #[must_use]
    pub fn with_person(mut self, person: KbPerson) -> Self {
        self.persons.insert(person.id.clone(), person);
        self
    }

    /// With the immediate family of an entity
    #[must_use]
    pub fn with_family(mut self, entity_id: impl Into<String>, family: ImmediateFamily) -> Self {
        self.families.insert(entity_id.into(), family);
        self
    }

    /// Build from snapshot JSON
    ///
    /// # Errors
    /// [`KnowledgeBaseError::Malformed`] when the text is not a snapshot.
    pub fn from_json(text: &str) -> KnowledgeBaseResult<Self> {
        let snapshot: Snapshot =
            serde_json::from_str(text).map_err(|e| KnowledgeBaseError::Malformed(e.to_string()))?;
        let mut kb = snapshot
            .persons
            .into_iter()
            .fold(Self::new(), Self::with_person);
        kb.families = snapshot.families;
        Ok(kb)
    }

    /// Load a snapshot file
    ///
    /// # Errors
    /// - [`KnowledgeBaseError::Unavailable`] when the file cannot be read
    /// - [`KnowledgeBaseError::Malformed`] when it is not a snapshot
    pub async fn load(path: impl AsRef<Path>) -> KnowledgeBaseResult<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| KnowledgeBaseError::Unavailable(format!("{}: {e}", path.display())))?;
        let kb = Self::from_json(&text)?;
        debug!(
            path = %path.display(),
            persons = kb.persons.len(),
            families = kb.families.len(),
            "loaded knowledge base snapshot"
        );
        Ok(kb)
    }
}

#[async_trait::async_trait]
impl KnowledgeBase for InMemoryKnowledgeBase {
    async fn search(&self, query: &str) -> KnowledgeBaseResult<Vec<KbPerson>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .persons
            .values()
            .filter(|p| p.label.to_lowercase().contains(&query))
            .cloned()
            .collect())
    }

    async fn fetch_immediate_family(&self, entity_id: &str) -> KnowledgeBaseResult<ImmediateFamily> {
        self.families
            .get(entity_id)
            .cloned()
            .ok_or_else(|| KnowledgeBaseError::NotFound(entity_id.to_string()))
    }
}

/// Gender of a gender entity URI or id
#[must_use]
pub fn gender_from_entity(entity: Option<&str>) -> Gender {
    match entity {
        Some(e) if e.contains(MALE_ENTITY) => Gender::Male,
        Some(e) if e.contains(FEMALE_ENTITY) => Gender::Female,
        _ => Gender::Unknown,
    }
}

/// Normalize a knowledge-base timestamp to `Y-MM-DD`
///
/// The time part is dropped and leading zeros of the year are removed;
/// negative years get a ` BCE` suffix. Anything else yields `None`.
///
/// ```rust
/// use kin_core::knowledge::normalize_date;
///
/// assert_eq!(normalize_date("+1867-11-07T00:00:00Z").as_deref(), Some("1867-11-07"));
/// assert_eq!(normalize_date("-0044-03-15T00:00:00Z").as_deref(), Some("44-03-15 BCE"));
/// assert_eq!(normalize_date("unknown"), None);
/// ```
#[must_use]
pub fn normalize_date(raw: &str) -> Option<String> {
    let mut date = raw.split('T').next().unwrap_or_default().to_string();
    let bce = date.starts_with('-');
    if let Some(caps) = DATE_PARTS_RE.captures(&date) {
        let year = caps[1].trim_start_matches('0');
        let year = if year.is_empty() { "0" } else { year };
        date = format!("{year}-{}-{}", &caps[2], &caps[3]);
    }
    if !DATE_RE.is_match(&date) {
        return None;
    }
    Some(if bce { format!("{date} BCE") } else { date })
}

/// Image URL sized for an avatar
#[must_use]
pub fn thumbnail_url(url: &str) -> String {
    if url.contains("?width=") {
        url.to_string()
    } else {
        format!("{url}{THUMBNAIL_WIDTH}")
    }
}

/// Id of the person for an entity, inserting a new person when none is linked
///
/// Persons are matched on `wiki_id`. A new person takes the entity id as its
/// id, the first word of the label as first name and the rest as last name.
pub fn convert_kb_person(entity: &KbPerson, graph: &mut PersonGraph) -> String {
    if let Some(existing) = graph
        .iter()
        .find(|p| p.wiki_id.as_deref() == Some(entity.id.as_str()))
    {
        return existing.id.clone();
    }

    let (first, last) = entity.label.split_once(' ').unwrap_or((entity.label.as_str(), ""));
    let mut note = String::new();
    if !entity.description.is_empty() {
        note.push_str(&entity.description);
        note.push('\n');
    }
    note.push_str("WikiData: ");
    note.push_str(ENTITY_PAGE);
    note.push_str(&entity.id);

    let mut person = Person::new(entity.id.clone(), first)
        .with_gender(entity.gender.unwrap_or_default())
        .with_note(note);
    person.wiki_id = Some(entity.id.clone());
    person.data.last_name = (!last.is_empty()).then(|| last.to_string());
    person.data.birth_day.clone_from(&entity.birth_date);
    person.data.death_day.clone_from(&entity.death_date);
    person.data.avatar = entity.image.as_deref().map(thumbnail_url);

    debug!(id = %entity.id, "adding knowledge base person");
    graph.insert(person);
    entity.id.clone()
}

fn link_parent(graph: &mut PersonGraph, parent_id: &str, child_id: &str, as_father: bool) {
    if let Some(parent) = graph.get_mut(parent_id) {
        if !parent.rels.has_child(child_id) {
            parent.rels.children.push(child_id.to_string());
        }
    }
    if let Some(child) = graph.get_mut(child_id) {
        let slot = if as_father {
            &mut child.rels.father
        } else {
            &mut child.rels.mother
        };
        *slot = Some(parent_id.to_string());
    }
}

fn link_spouses(graph: &mut PersonGraph, a: &str, b: &str) {
    if a != b {
        graph.add_spouse(a, b);
    }
}

fn is_male(graph: &PersonGraph, id: &str) -> bool {
    graph.get(id).and_then(|p| p.data.gender) == Some(Gender::Male)
}

/// Merge the immediate family of `root` into `graph`, returning the root id
///
/// Every referenced entity is converted with [`convert_kb_person`], so
/// persons already in the graph are reused. The root is marked as loaded.
pub fn apply_immediate_family(
    graph: &mut PersonGraph,
    root: &KbPerson,
    family: &ImmediateFamily,
) -> String {
    let root_id = convert_kb_person(root, graph);
    if let Some(person) = graph.get_mut(&root_id) {
        person.wiki_loaded = Some(true);
    }

    // Parents
    let father = family.father.as_ref().map(|f| convert_kb_person(f, graph));
    let mother = family.mother.as_ref().map(|m| convert_kb_person(m, graph));
    if let Some(father) = &father {
        link_parent(graph, father, &root_id, true);
    }
    if let Some(mother) = &mother {
        link_parent(graph, mother, &root_id, false);
    }
    if let (Some(father), Some(mother)) = (&father, &mother) {
        link_spouses(graph, father, mother);
    }

    for spouse in &family.spouses {
        let spouse_id = convert_kb_person(spouse, graph);
        link_spouses(graph, &root_id, &spouse_id);
    }

    for entry in &family.children {
        let child_id = convert_kb_person(&entry.child, graph);
        let root_is_father = is_male(graph, &root_id);
        link_parent(graph, &root_id, &child_id, root_is_father);

        if let Some(other) = &entry.other_parent {
            let other_id = convert_kb_person(other, graph);
            let other_is_father = is_male(graph, &other_id);
            link_parent(graph, &other_id, &child_id, other_is_father);
            link_spouses(graph, &root_id, &other_id);
        }
    }

    for entry in &family.siblings {
        let sibling_id = convert_kb_person(&entry.sibling, graph);
        let father = entry.father.as_ref().map(|f| convert_kb_person(f, graph));
        let mother = entry.mother.as_ref().map(|m| convert_kb_person(m, graph));
        if let Some(father) = &father {
            link_parent(graph, father, &sibling_id, true);
        }
        if let Some(mother) = &mother {
            link_parent(graph, mother, &sibling_id, false);
        }
        if let (Some(father), Some(mother)) = (&father, &mother) {
            link_spouses(graph, father, mother);
        }
    }

    debug!(
        root = %root_id,
        spouses = family.spouses.len(),
        children = family.children.len(),
        siblings = family.siblings.len(),
        "applied immediate family"
    );
    root_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn gender_entities() {
        assert_eq!(
            gender_from_entity(Some("http://www.wikidata.org/entity/Q6581097")),
            Gender::Male
        );
        assert_eq!(gender_from_entity(Some("Q6581072")), Gender::Female);
        assert_eq!(gender_from_entity(Some("Q1052281")), Gender::Unknown);
        assert_eq!(gender_from_entity(None), Gender::Unknown);
    }

    #[test]
    fn dates_are_normalized() {
        assert_eq!(normalize_date("1815-12-10T00:00:00Z").as_deref(), Some("1815-12-10"));
        assert_eq!(normalize_date("0800-12-25").as_deref(), Some("800-12-25"));
        assert_eq!(normalize_date("-0000-01-01T00:00:00Z").as_deref(), Some("0-01-01 BCE"));
        assert_eq!(normalize_date("12345-01-01"), None);
        assert_eq!(normalize_date(""), None);
    }

    #[test]
    fn thumbnails_get_width_once() {
        assert_eq!(thumbnail_url("http://img/a.jpg"), "http://img/a.jpg?width=120");
        assert_eq!(thumbnail_url("http://img/a.jpg?width=300"), "http://img/a.jpg?width=300");
    }

    #[test]
    fn conversion_builds_person_from_entity() {
        let mut graph = PersonGraph::new();
        let mut entity = KbPerson::new("Q7186", "Marie Salomea Curie")
            .with_gender(Gender::Female)
            .with_description("physicist and chemist");
        entity.image = Some("http://img/curie.jpg".into());
        entity.birth_date = Some("1867-11-07".into());

        let id = convert_kb_person(&entity, &mut graph);
        let person = graph.get(&id).unwrap();
        assert_eq!(id, "Q7186");
        assert_eq!(person.wiki_id.as_deref(), Some("Q7186"));
        assert_eq!(person.data.first_name, "Marie");
        assert_eq!(person.data.last_name.as_deref(), Some("Salomea Curie"));
        assert_eq!(person.data.gender, Some(Gender::Female));
        assert_eq!(person.data.birth_day.as_deref(), Some("1867-11-07"));
        assert_eq!(person.data.avatar.as_deref(), Some("http://img/curie.jpg?width=120"));
        assert_eq!(
            person.data.note.as_deref(),
            Some("physicist and chemist\nWikiData: https://www.wikidata.org/wiki/Q7186")
        );
    }

    #[test]
    fn conversion_reuses_linked_person() {
        let mut existing = Person::new("I4", "Marie");
        existing.wiki_id = Some("Q7186".into());
        let mut graph: PersonGraph = [existing].into_iter().collect();

        let id = convert_kb_person(&KbPerson::new("Q7186", "Marie Curie"), &mut graph);
        assert_eq!(id, "I4");
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn single_word_label_has_no_last_name() {
        let mut graph = PersonGraph::new();
        let id = convert_kb_person(&KbPerson::new("Q1", "Plato"), &mut graph);
        let person = graph.get(&id).unwrap();
        assert_eq!(person.data.first_name, "Plato");
        assert!(person.data.last_name.is_none());
        assert_eq!(person.data.gender, Some(Gender::Unknown));
        assert_eq!(
            person.data.note.as_deref(),
            Some("WikiData: https://www.wikidata.org/wiki/Q1")
        );
    }

    #[tokio::test]
    async fn in_memory_search_and_fetch() {
        let kb = InMemoryKnowledgeBase::new()
            .with_person(KbPerson::new("Q7186", "Marie Curie"))
            .with_person(KbPerson::new("Q37463", "Pierre Curie"))
            .with_family("Q7186", ImmediateFamily::default());

        assert_eq!(kb.search("curie").await.unwrap().len(), 2);
        assert!(kb.search("   ").await.unwrap().is_empty());
        assert!(kb.fetch_immediate_family("Q7186").await.is_ok());
        assert!(matches!(
            kb.fetch_immediate_family("Q1").await,
            Err(KnowledgeBaseError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn snapshot_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        std::fs::write(
            &path,
            r#"{
                "persons": [{"id": "Q7186", "label": "Marie Curie", "gender": "F"}],
                "families": {"Q7186": {"spouses": [{"id": "Q37463", "label": "Pierre Curie"}]}}
            }"#,
        )
        .unwrap();

        let kb = InMemoryKnowledgeBase::load(&path).await.unwrap();
        let found = kb.search("marie").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].gender, Some(Gender::Female));
        let family = kb.fetch_immediate_family("Q7186").await.unwrap();
        assert_eq!(family.spouses[0].label, "Pierre Curie");
        assert!(family.children.is_empty());
    }

    #[tokio::test]
    async fn missing_snapshot_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = InMemoryKnowledgeBase::load(dir.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::Unavailable(_)));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn snapshot_must_be_an_object() {
        assert!(matches!(
            InMemoryKnowledgeBase::from_json("[1, 2]"),
            Err(KnowledgeBaseError::Malformed(_))
        ));
        assert!(InMemoryKnowledgeBase::from_json("{}").unwrap().persons.is_empty());
    }
}
