//! GEDCOM node forest → persons
//!
//! Only root-level `INDI` and `FAM` records are read. Within an `INDI`:
//! - `NAME` splits on `/` into first name, last name and suffix
//! - `SEX` maps onto [`Gender`]
//! - `BIRT`/`DEAT` take the value of their `DATE` child verbatim
//! - `NOTE` is reassembled from `CONC`/`CONT` continuations and then stripped
//!   of extension tokens (see [`crate::note`])
//!
//! `FAM` records then wire up parent/child and spouse links.

use crate::node::{strip_xref, GedcomNode};
use crate::note::decode_note;
use indexmap::IndexMap;
use kin_model::{Gender, Person, PersonGraph};
use tracing::debug;

#[derive(Debug, Default)]
struct ParsedFamily {
    husband: Option<String>,
    wife: Option<String>,
    children: Vec<String>,
}

/// Convert root records into persons, in `INDI` record order
#[must_use]
pub fn gedcom_to_persons(nodes: &[GedcomNode]) -> Vec<Person> {
    let mut persons: IndexMap<String, Person> = IndexMap::new();
    for node in nodes.iter().filter(|n| n.tag == "INDI") {
        let person = parse_person(node);
        persons.insert(person.id.clone(), person);
    }

    let families: Vec<ParsedFamily> = nodes
        .iter()
        .filter(|n| n.tag == "FAM")
        .map(parse_family)
        .collect();
    for family in &families {
        link_parents_and_children(&mut persons, family);
        link_spouses(&mut persons, family);
    }

    debug!(persons = persons.len(), families = families.len(), "mapped gedcom to persons");
    persons.into_values().collect()
}

/// Convert root records into a person graph
#[must_use]
pub fn gedcom_to_graph(nodes: &[GedcomNode]) -> PersonGraph {
    gedcom_to_persons(nodes).into_iter().collect()
}

/// Split a GEDCOM name into `(first, last, suffix)`
///
/// `Robert "Bobby" /Shriver/ III` → (`Robert "Bobby"`, `Shriver`, `III`).
/// Without a closing slash everything after the first slash is the last name.
#[must_use]
pub fn parse_name(value: &str) -> (String, Option<String>, Option<String>) {
    let Some((first, rest)) = value.split_once('/') else {
        return (value.trim().to_string(), None, None);
    };
    let first = first.trim().to_string();
    match rest.split_once('/') {
        Some((last, after)) => {
            let suffix = after.trim();
            (
                first,
                Some(last.trim().to_string()),
                (!suffix.is_empty()).then(|| suffix.to_string()),
            )
        }
        None => (first, Some(rest.trim().to_string()), None),
    }
}

fn parse_person(node: &GedcomNode) -> Person {
    let mut person = Person {
        id: node.record_id().unwrap_or_default(),
        ..Person::default()
    };

    for child in &node.children {
        match child.tag.as_str() {
            "NAME" => {
                let (first, last, suffix) = parse_name(child.value_str());
                person.data.first_name = first;
                person.data.last_name = last;
                person.data.suffix = suffix;
            }
            "SEX" => {
                person.data.gender =
                    (!child.value_str().is_empty()).then(|| Gender::from_code(child.value_str()));
            }
            "BIRT" => person.data.birth_day = event_date(child),
            "DEAT" => person.data.death_day = event_date(child),
            "NOTE" => apply_note(&mut person, child),
            _ => {}
        }
    }
    person
}

fn event_date(event: &GedcomNode) -> Option<String> {
    event.child("DATE").map(|d| d.value_str().to_string())
}

fn full_note_text(note: &GedcomNode) -> String {
    let mut text = note.value_str().to_string();
    for part in &note.children {
        match part.tag.as_str() {
            "CONC" => text.push_str(part.value_str()),
            "CONT" => {
                text.push('\n');
                text.push_str(part.value_str());
            }
            _ => {}
        }
    }
    text
}

fn apply_note(person: &mut Person, note: &GedcomNode) {
    let text = full_note_text(note);
    if text.is_empty() {
        return;
    }
    let decoded = decode_note(&text);
    person.data.note = decoded.note;
    if decoded.avatar.is_some() {
        person.data.avatar = decoded.avatar;
    }
    if let Some(wiki_id) = decoded.wiki_id.filter(|w| !w.is_empty()) {
        person.wiki_id = Some(wiki_id);
    }
    if decoded.wiki_loaded.is_some() {
        person.wiki_loaded = decoded.wiki_loaded;
    }
}

fn parse_family(node: &GedcomNode) -> ParsedFamily {
    let mut family = ParsedFamily::default();
    for child in &node.children {
        // Empty pointers are treated as absent
        let id = strip_xref(child.value_str());
        if id.is_empty() {
            continue;
        }
        match child.tag.as_str() {
            "HUSB" => family.husband = Some(id),
            "WIFE" => family.wife = Some(id),
            "CHIL" => family.children.push(id),
            _ => {}
        }
    }
    family
}

fn push_unique(list: &mut Vec<String>, id: &str) {
    if !list.iter().any(|x| x == id) {
        list.push(id.to_string());
    }
}

fn link_parents_and_children(persons: &mut IndexMap<String, Person>, family: &ParsedFamily) {
    for child_id in &family.children {
        let Some(child) = persons.get_mut(child_id) else {
            continue;
        };
        // The family record is authoritative: both slots are overwritten
        child.rels.father.clone_from(&family.husband);
        child.rels.mother.clone_from(&family.wife);

        for parent_id in [&family.husband, &family.wife].into_iter().flatten() {
            if let Some(parent) = persons.get_mut(parent_id) {
                push_unique(&mut parent.rels.children, child_id);
            }
        }
    }
}

fn link_spouses(persons: &mut IndexMap<String, Person>, family: &ParsedFamily) {
    let (Some(husband), Some(wife)) = (&family.husband, &family.wife) else {
        return;
    };
    for (id, spouse) in [(husband, wife), (wife, husband)] {
        if let Some(person) = persons.get_mut(id) {
            push_unique(&mut person.rels.spouses, spouse);
            // Spouses take the family's child list as-is, replacing what the
            // parent/child pass accumulated
            person.rels.children.clone_from(&family.children);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_gedcom;
    use pretty_assertions::assert_eq;

    #[test]
    fn name_variants() {
        assert_eq!(
            parse_name("Robert Sargent \"Bobby\" /Shriver/ III"),
            (
                "Robert Sargent \"Bobby\"".to_string(),
                Some("Shriver".to_string()),
                Some("III".to_string())
            )
        );
        assert_eq!(parse_name("Plato"), ("Plato".to_string(), None, None));
        assert_eq!(
            parse_name("/Smith/"),
            (String::new(), Some("Smith".to_string()), None)
        );
        assert_eq!(
            parse_name("Jan /van Dyck"),
            ("Jan".to_string(), Some("van Dyck".to_string()), None)
        );
    }

    #[test]
    fn reads_individual_fields() {
        let nodes = parse_gedcom(
            "0 @I1@ INDI\n\
             1 NAME Marie /Curie/\n\
             1 SEX F\n\
             1 BIRT\n2 DATE 7 NOV 1867\n2 PLAC Warsaw\n\
             1 DEAT\n\
             1 NOTE Chem\n2 CONC ist and physicist\n2 CONT Nobel laureate; wikiId:Q7186",
        );
        let persons = gedcom_to_persons(&nodes);
        let marie = &persons[0];

        assert_eq!(marie.id, "I1");
        assert_eq!(marie.data.first_name, "Marie");
        assert_eq!(marie.data.last_name.as_deref(), Some("Curie"));
        assert_eq!(marie.data.gender, Some(Gender::Female));
        assert_eq!(marie.data.birth_day.as_deref(), Some("7 NOV 1867"));
        // DEAT without DATE
        assert!(marie.data.death_day.is_none());
        assert_eq!(
            marie.data.note.as_deref(),
            Some("Chemist and physicist\nNobel laureate")
        );
        assert_eq!(marie.wiki_id.as_deref(), Some("Q7186"));
    }

    #[test]
    fn family_wires_spouses_and_children() {
        let nodes = parse_gedcom(
            "0 @I1@ INDI\n0 @I2@ INDI\n0 @I3@ INDI\n0 @I4@ INDI\n\
             0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I2@\n1 CHIL @I3@\n1 CHIL @I4@",
        );
        let graph = gedcom_to_graph(&nodes);

        let dad = graph.get("I1").unwrap();
        assert_eq!(dad.rels.spouses, vec!["I2"]);
        assert_eq!(dad.rels.children, vec!["I3", "I4"]);
        assert_eq!(graph.get("I2").unwrap().rels.spouses, vec!["I1"]);
        let kid = graph.get("I4").unwrap();
        assert_eq!(kid.rels.father.as_deref(), Some("I1"));
        assert_eq!(kid.rels.mother.as_deref(), Some("I2"));
    }

    #[test]
    fn spouse_children_come_from_latest_family() {
        // I1 has a child with I2 and then a childless marriage with I5
        let nodes = parse_gedcom(
            "0 @I1@ INDI\n0 @I2@ INDI\n0 @I3@ INDI\n0 @I5@ INDI\n\
             0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I2@\n1 CHIL @I3@\n\
             0 @F2@ FAM\n1 HUSB @I1@\n1 WIFE @I5@",
        );
        let graph = gedcom_to_graph(&nodes);
        let dad = graph.get("I1").unwrap();
        assert_eq!(dad.rels.spouses, vec!["I2", "I5"]);
        assert!(dad.rels.children.is_empty());
        assert_eq!(graph.get("I2").unwrap().rels.children, vec!["I3"]);
    }

    #[test]
    fn single_parent_family_clears_missing_slot() {
        let nodes = parse_gedcom(
            "0 @I1@ INDI\n0 @I3@ INDI\n0 @F1@ FAM\n1 WIFE @I1@\n1 CHIL @I3@",
        );
        let graph = gedcom_to_graph(&nodes);
        let kid = graph.get("I3").unwrap();
        assert!(kid.rels.father.is_none());
        assert_eq!(kid.rels.mother.as_deref(), Some("I1"));
        assert_eq!(graph.get("I1").unwrap().rels.children, vec!["I3"]);
        assert!(graph.get("I1").unwrap().rels.spouses.is_empty());
    }

    #[test]
    fn empty_family_pointers_are_ignored() {
        let nodes = parse_gedcom(
            "0 @I1@ INDI\n0 @I2@ INDI\n0 @I3@ INDI\n\
             0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I2@\n1 CHIL @I3@\n1 CHIL\n\
             0 @F2@ FAM\n1 HUSB\n1 WIFE @I2@\n1 CHIL @I3@",
        );
        let graph = gedcom_to_graph(&nodes);

        assert_eq!(graph.get("I1").unwrap().rels.children, vec!["I3"]);
        assert_eq!(graph.get("I2").unwrap().rels.children, vec!["I3"]);
        assert!(graph.iter().all(|p| p.rels.spouses.iter().all(|s| !s.is_empty())));
        // The second family names only a mother
        let kid = graph.get("I3").unwrap();
        assert!(kid.rels.father.is_none());
        assert_eq!(kid.rels.mother.as_deref(), Some("I2"));
    }

    #[test]
    fn ignores_nested_and_unknown_records() {
        let nodes = parse_gedcom("0 HEAD\n1 INDI\n0 @S1@ SOUR\n0 @I1@ INDI\n1 _CUSTOM x");
        let persons = gedcom_to_persons(&nodes);
        assert_eq!(persons.len(), 1);
        assert_eq!(persons[0].id, "I1");
    }
}
