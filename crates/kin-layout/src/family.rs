//! Family union groups derived from person relationships
//!
//! Groups are rebuilt from scratch on every layout pass and never stored.

use indexmap::IndexMap;
use kin_model::PersonGraph;
use serde::{Deserialize, Serialize};

/// A spouse union or a single-parent group with its children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyGroup {
    /// Family id, `family_` followed by the sorted member ids
    pub id: String,
    /// Spouse ids: the person that introduced the union, then the partner
    pub spouse_ids: Vec<String>,
    /// Child ids in person order
    pub children_ids: Vec<String>,
}

/// Family id for a set of spouse ids
#[must_use]
pub fn family_id<S: AsRef<str>>(spouse_ids: &[S]) -> String {
    let mut ids: Vec<&str> = spouse_ids.iter().map(AsRef::as_ref).collect();
    ids.sort_unstable();
    format!("family_{}", ids.join("_"))
}

/// Group persons into families, keyed by family id
///
/// 1. every resolvable spouse pair becomes a union
/// 2. a child joins the union of its two parents; when the parents are not a
///    recorded union the child joins a single-parent group of its first
///    existing parent (father before mother)
///
/// Children whose parents are all unknown to the graph are left out.
#[must_use]
pub fn group_families(graph: &PersonGraph) -> IndexMap<String, FamilyGroup> {
    let mut families: IndexMap<String, FamilyGroup> = IndexMap::new();

    for person in graph.iter() {
        for spouse in graph.get_spouses(&person.id) {
            let id = family_id(&[person.id.as_str(), spouse.id.as_str()]);
            families.entry(id.clone()).or_insert_with(|| FamilyGroup {
                id,
                spouse_ids: vec![person.id.clone(), spouse.id.clone()],
                children_ids: Vec::new(),
            });
        }
    }

    for person in graph.iter() {
        let parents: Vec<&str> = person.rels.parent_ids().collect();
        if parents.is_empty() {
            continue;
        }
        if let Some(union) = families.get_mut(&family_id(&parents)) {
            union.children_ids.push(person.id.clone());
            continue;
        }
        let Some(parent) = parents.iter().find(|id| graph.contains(id)) else {
            continue;
        };
        let id = family_id(&[*parent]);
        families
            .entry(id.clone())
            .or_insert_with(|| FamilyGroup {
                id,
                spouse_ids: vec![(*parent).to_string()],
                children_ids: Vec::new(),
            })
            .children_ids
            .push(person.id.clone());
    }

    families
}

#[cfg(test)]
mod tests {
    use super::*;
    use kin_model::{Gender, Person};
    use pretty_assertions::assert_eq;

    fn graph() -> PersonGraph {
        let mut g: PersonGraph = [
            Person::new("I1", "Dad").with_gender(Gender::Male),
            Person::new("I2", "Mom").with_gender(Gender::Female),
            Person::new("I3", "Kid"),
            Person::new("I4", "Other"),
            Person::new("I5", "Half"),
        ]
        .into_iter()
        .collect();
        g.add_spouse("I1", "I2");
        g.add_child("I3", "I1", Some("I2"));
        g.add_child("I5", "I2", Some("I4"));
        g
    }

    #[test]
    fn family_id_is_order_independent() {
        assert_eq!(family_id(&["I2", "I1"]), "family_I1_I2");
        assert_eq!(family_id(&["I1", "I2"]), "family_I1_I2");
        assert_eq!(family_id(&["I9"]), "family_I9");
    }

    #[test]
    fn unions_and_single_parent_groups() {
        let families = group_families(&graph());
        let ids: Vec<_> = families.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["family_I1_I2", "family_I4"]);

        let union = &families["family_I1_I2"];
        assert_eq!(union.spouse_ids, vec!["I1", "I2"]);
        assert_eq!(union.children_ids, vec!["I3"]);

        // I5's parents are I4 (father slot) and I2 but not a union
        let single = &families["family_I4"];
        assert_eq!(single.spouse_ids, vec!["I4"]);
        assert_eq!(single.children_ids, vec!["I5"]);
    }

    #[test]
    fn dangling_parents_are_skipped() {
        let mut orphan = Person::new("I1", "Orphan");
        orphan.rels.father = Some("ghost".into());
        let g: PersonGraph = [orphan].into_iter().collect();
        assert!(group_families(&g).is_empty());
    }

    #[test]
    fn dangling_spouse_is_ignored() {
        let mut person = Person::new("I1", "Widow");
        person.rels.spouses.push("ghost".into());
        let g: PersonGraph = [person].into_iter().collect();
        assert!(group_families(&g).is_empty());
    }
}
