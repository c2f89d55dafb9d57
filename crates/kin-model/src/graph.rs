//! Id-indexed person store with derived relationship queries
//!
//! All lookups tolerate dangling ids: a reference to a person that is not in
//! the graph is silently dropped from results.

use crate::person::{Gender, Person};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static PERSON_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^I(\d+)$").expect("valid regex"));

/// Relationship a candidate person could be linked through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipKind {
    /// Spouse
    Spouse,
    /// Child
    Child,
    /// Father
    Father,
    /// Mother
    Mother,
}

/// A spouse together with the children shared with that spouse
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyGroupView<'a> {
    /// The spouse
    pub spouse: &'a Person,
    /// Children whose other parent is this spouse
    pub children: Vec<&'a Person>,
}

/// Arena of persons keyed by id, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonGraph {
    pub(crate) persons: IndexMap<String, Person>,
}

impl PersonGraph {
    /// Create empty graph
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a list of persons; later duplicates replace earlier ones
    #[must_use]
    pub fn from_persons(persons: impl IntoIterator<Item = Person>) -> Self {
        Self {
            persons: persons.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    /// Number of persons
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.persons.len()
    }

    /// Whether the graph holds no persons
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    /// Look up a person
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Person> {
        self.persons.get(id)
    }

    /// Mutable access to a person
    ///
    /// Relationship fields edited through this handle are not mirrored on the
    /// other end; prefer the mutation methods for links.
    #[inline]
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Person> {
        self.persons.get_mut(id)
    }

    /// Whether a person with this id exists
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.persons.contains_key(id)
    }

    /// Iterate persons in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Person> {
        self.persons.values()
    }

    /// Iterate person ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.persons.keys().map(String::as_str)
    }

    /// Underlying id → person map
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &IndexMap<String, Person> {
        &self.persons
    }

    /// Clone all persons into a list
    #[must_use]
    pub fn to_vec(&self) -> Vec<Person> {
        self.persons.values().cloned().collect()
    }

    /// Consume the graph into a list of persons
    #[must_use]
    pub fn into_vec(self) -> Vec<Person> {
        self.persons.into_values().collect()
    }

    /// Insert or replace a person, returning the previous record
    pub fn insert(&mut self, person: Person) -> Option<Person> {
        self.persons.insert(person.id.clone(), person)
    }

    /// Remove every person
    pub fn clear(&mut self) {
        self.persons.clear();
    }

    fn resolve<'a>(&'a self, ids: &'a [String]) -> Vec<&'a Person> {
        ids.iter().filter_map(|id| self.persons.get(id)).collect()
    }

    /// Resolved spouses of a person
    #[must_use]
    pub fn get_spouses(&self, id: &str) -> Vec<&Person> {
        self.get(id)
            .map(|p| self.resolve(&p.rels.spouses))
            .unwrap_or_default()
    }

    /// Resolved children of a person
    #[must_use]
    pub fn get_children(&self, id: &str) -> Vec<&Person> {
        self.get(id)
            .map(|p| self.resolve(&p.rels.children))
            .unwrap_or_default()
    }

    /// Resolved father of a person
    #[must_use]
    pub fn get_father(&self, id: &str) -> Option<&Person> {
        self.get(id)?.rels.father.as_deref().and_then(|f| self.get(f))
    }

    /// Resolved mother of a person
    #[must_use]
    pub fn get_mother(&self, id: &str) -> Option<&Person> {
        self.get(id)?.rels.mother.as_deref().and_then(|m| self.get(m))
    }

    /// For each spouse, the children shared with that spouse
    #[must_use]
    pub fn get_family_groups(&self, id: &str) -> Vec<FamilyGroupView<'_>> {
        let children = self.get_children(id);
        self.get_spouses(id)
            .into_iter()
            .map(|spouse| FamilyGroupView {
                spouse,
                children: children
                    .iter()
                    .copied()
                    .filter(|child| is_shared_child(child, id, &spouse.id))
                    .collect(),
            })
            .collect()
    }

    /// Children not shared with any recognized spouse
    #[must_use]
    pub fn get_single_parent_children(&self, id: &str) -> Vec<&Person> {
        let spouses = self.get_spouses(id);
        self.get_children(id)
            .into_iter()
            .filter(|child| {
                !spouses
                    .iter()
                    .any(|spouse| is_shared_child(child, id, &spouse.id))
            })
            .collect()
    }

    /// Persons that could be linked to `id` through `kind`
    ///
    /// Never includes the person itself. Father/mother candidates are only
    /// offered while the slot is empty and must have the matching gender.
    #[must_use]
    pub fn get_available_persons(&self, id: &str, kind: RelationshipKind) -> Vec<&Person> {
        let Some(person) = self.get(id) else {
            return Vec::new();
        };
        self.iter()
            .filter(|candidate| candidate.id != id)
            .filter(|candidate| match kind {
                RelationshipKind::Spouse => !person.rels.has_spouse(&candidate.id),
                RelationshipKind::Child => !person.rels.has_child(&candidate.id),
                RelationshipKind::Father => {
                    person.rels.father.is_none() && candidate.data.gender == Some(Gender::Male)
                }
                RelationshipKind::Mother => {
                    person.rels.mother.is_none() && candidate.data.gender == Some(Gender::Female)
                }
            })
            .collect()
    }

    /// Next free `I<n>` person id
    #[must_use]
    pub fn next_person_id(&self) -> String {
        let max = self
            .ids()
            .filter_map(|id| PERSON_ID_RE.captures(id))
            .filter_map(|caps| caps[1].parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("I{}", max + 1)
    }
}

impl FromIterator<Person> for PersonGraph {
    fn from_iter<I: IntoIterator<Item = Person>>(iter: I) -> Self {
        Self::from_persons(iter)
    }
}

fn is_shared_child(child: &Person, parent_id: &str, spouse_id: &str) -> bool {
    let father = child.rels.father.as_deref();
    let mother = child.rels.mother.as_deref();
    (father == Some(parent_id) && mother == Some(spouse_id))
        || (mother == Some(parent_id) && father == Some(spouse_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn family() -> PersonGraph {
        let mut dad = Person::new("I1", "Dad").with_gender(Gender::Male);
        let mut mom = Person::new("I2", "Mom").with_gender(Gender::Female);
        let mut kid = Person::new("I3", "Kid");
        let mut half = Person::new("I4", "Half");

        dad.rels.spouses = vec!["I2".into(), "I99".into()];
        dad.rels.children = vec!["I3".into(), "I4".into()];
        mom.rels.spouses = vec!["I1".into()];
        mom.rels.children = vec!["I3".into()];
        kid.rels.father = Some("I1".into());
        kid.rels.mother = Some("I2".into());
        half.rels.father = Some("I1".into());

        PersonGraph::from_persons([dad, mom, kid, half])
    }

    #[test]
    fn spouses_drop_dangling_ids() {
        let graph = family();
        let spouses = graph.get_spouses("I1");
        assert_eq!(spouses.len(), 1);
        assert_eq!(spouses[0].id, "I2");
    }

    #[test]
    fn missing_person_yields_empty_results() {
        let graph = family();
        assert!(graph.get_spouses("nobody").is_empty());
        assert!(graph.get_children("nobody").is_empty());
        assert!(graph.get_family_groups("nobody").is_empty());
        assert!(graph.get_father("nobody").is_none());
    }

    #[test]
    fn family_groups_and_single_parent_children() {
        let graph = family();

        let groups = graph.get_family_groups("I1");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].spouse.id, "I2");
        let shared: Vec<_> = groups[0].children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(shared, vec!["I3"]);

        let single: Vec<_> = graph
            .get_single_parent_children("I1")
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(single, vec!["I4"]);
    }

    #[test]
    fn parents_resolve() {
        let graph = family();
        assert_eq!(graph.get_father("I3").map(|p| p.id.as_str()), Some("I1"));
        assert_eq!(graph.get_mother("I3").map(|p| p.id.as_str()), Some("I2"));
        assert!(graph.get_mother("I4").is_none());
    }

    #[test]
    fn available_persons_by_kind() {
        let graph = family();

        let spouses: Vec<_> = graph
            .get_available_persons("I1", RelationshipKind::Spouse)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(spouses, vec!["I3", "I4"]);

        // I3 already has a father
        assert!(graph
            .get_available_persons("I3", RelationshipKind::Father)
            .is_empty());

        let mothers: Vec<_> = graph
            .get_available_persons("I4", RelationshipKind::Mother)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(mothers, vec!["I2"]);
    }

    #[test]
    fn next_person_id_skips_foreign_ids() {
        let mut graph = family();
        graph.insert(Person::new("Q42", "Douglas"));
        graph.insert(Person::new("I17", "Late"));
        assert_eq!(graph.next_person_id(), "I18");
        assert_eq!(PersonGraph::new().next_person_id(), "I1");
    }
}
