//! Merge current persons back into an imported document
//!
//! The merge edits a copy of the original forest in place instead of
//! regenerating it, so everything the mapper does not understand (sources,
//! places, custom `_TAG`s, the header) survives a re-export untouched.
//!
//! For each `INDI` record:
//! - deleted persons lose their record
//! - `NAME`, `SEX`, `BIRT`/`DEAT` dates and the composed `NOTE` are rewritten
//!   only when they differ from what the original record imported as
//! - `FAMC`/`FAMS` references are reconciled against a fresh export
//!
//! `FAM` records are reconciled on `HUSB`/`WIFE`/`CHIL` only. New records are
//! inserted after the last record with the same tag.

use crate::export::{event_node, format_name, persons_to_gedcom};
use crate::import::gedcom_to_persons;
use crate::node::GedcomNode;
use crate::note::compose_note;
use kin_model::Person;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

const FAMILY_MEMBER_TAGS: [&str; 3] = ["HUSB", "WIFE", "CHIL"];

/// Merge `persons` into a copy of `original`
#[must_use]
pub fn merge_gedcom_nodes(original: &[GedcomNode], persons: &[Person]) -> Vec<GedcomNode> {
    let mut result = original.to_vec();

    let original_persons: HashMap<String, Person> = gedcom_to_persons(original)
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();
    let current: HashMap<&str, &Person> = persons.iter().map(|p| (p.id.as_str(), p)).collect();
    let fresh = persons_to_gedcom(persons, original);
    let fresh_indi: HashMap<String, &GedcomNode> = fresh
        .iter()
        .filter(|n| n.tag == "INDI")
        .filter_map(|n| n.record_id().map(|id| (id, n)))
        .collect();

    // Individuals
    let before = result.len();
    result.retain(|node| {
        node.tag != "INDI"
            || node
                .record_id()
                .is_some_and(|id| current.contains_key(id.as_str()))
    });
    debug!(removed = before - result.len(), "dropped deleted individuals");

    for node in result.iter_mut().filter(|n| n.tag == "INDI") {
        let Some(id) = node.record_id() else { continue };
        if let (Some(old), Some(new)) = (original_persons.get(&id), current.get(id.as_str())) {
            update_individual(node, old, new, fresh_indi.get(&id).copied());
        }
    }

    let new_individuals: Vec<GedcomNode> = fresh
        .iter()
        .filter(|n| n.tag == "INDI")
        .filter(|n| {
            n.record_id()
                .is_some_and(|id| !original_persons.contains_key(&id))
        })
        .cloned()
        .collect();
    debug!(added = new_individuals.len(), "appending new individuals");
    insert_after_last(&mut result, new_individuals, "INDI");

    // Families
    let fresh_families: Vec<&GedcomNode> = fresh.iter().filter(|n| n.tag == "FAM").collect();
    let fresh_family_ids: HashSet<&str> = fresh_families
        .iter()
        .filter_map(|n| n.xref_id.as_deref())
        .collect();

    result.retain(|node| {
        node.tag != "FAM"
            || node
                .xref_id
                .as_deref()
                .is_some_and(|x| fresh_family_ids.contains(x))
    });
    for node in result.iter_mut().filter(|n| n.tag == "FAM") {
        if let Some(update) = fresh_families
            .iter()
            .find(|f| f.xref_id.is_some() && f.xref_id == node.xref_id)
        {
            update_family(node, update);
        }
    }

    let kept_families: HashSet<String> = result
        .iter()
        .filter(|n| n.tag == "FAM")
        .filter_map(GedcomNode::record_id)
        .collect();
    let new_families: Vec<GedcomNode> = fresh_families
        .into_iter()
        .filter(|n| n.record_id().is_some_and(|id| !kept_families.contains(&id)))
        .cloned()
        .collect();
    debug!(added = new_families.len(), "appending new families");
    insert_after_last(&mut result, new_families, "FAM");

    result
}

fn update_individual(
    node: &mut GedcomNode,
    old: &Person,
    new: &Person,
    fresh: Option<&GedcomNode>,
) {
    let (od, nd) = (&old.data, &new.data);

    if (&od.first_name, &od.last_name, &od.suffix) != (&nd.first_name, &nd.last_name, &nd.suffix) {
        trace!(id = %new.id, "name changed");
        let name = format_name(new);
        match node.child_mut("NAME") {
            // Keep sub-structure such as GIVN/SURN
            Some(existing) if name.is_some() => existing.value = name,
            _ => set_or_update_child(node, "NAME", name, Vec::new()),
        }
    }

    if od.gender != nd.gender {
        trace!(id = %new.id, "gender changed");
        let code = nd.gender.map(|g| g.code().to_string());
        set_or_update_child(node, "SEX", code, Vec::new());
    }

    if od.birth_day != nd.birth_day {
        update_event(node, "BIRT", nd.birth_day.as_deref());
    }
    if od.death_day != nd.death_day {
        update_event(node, "DEAT", nd.death_day.as_deref());
    }

    let note = compose_note(new);
    if compose_note(old) != note {
        trace!(id = %new.id, "note changed");
        set_or_update_child(node, "NOTE", note, Vec::new());
    }

    if let Some(fresh) = fresh {
        for tag in ["FAMC", "FAMS"] {
            let wanted: Vec<&GedcomNode> = fresh.children_with_tag(tag).collect();
            reconcile_references(node, tag, &wanted);
        }
    }
}

/// Set the value and children of the first `tag` child, creating it when
/// missing. A child with neither value nor children is removed instead.
fn set_or_update_child(
    node: &mut GedcomNode,
    tag: &str,
    value: Option<String>,
    children: Vec<GedcomNode>,
) {
    if value.is_none() && children.is_empty() {
        node.children.retain(|c| c.tag != tag);
        return;
    }
    match node.child_mut(tag) {
        Some(existing) => {
            existing.value = value;
            existing.children = children;
        }
        None => node.children.push(GedcomNode {
            level: node.level + 1,
            tag: tag.to_string(),
            value,
            children,
            xref_id: None,
        }),
    }
}

fn update_event(node: &mut GedcomNode, tag: &str, date: Option<&str>) {
    let Some(event) = node.child_mut(tag) else {
        if let Some(date) = date.filter(|d| !d.is_empty()) {
            let mut event = event_node(tag, date);
            event.level = node.level + 1;
            if let Some(date_node) = event.children.first_mut() {
                date_node.level = event.level + 1;
            }
            node.children.push(event);
        }
        return;
    };

    match date {
        None => event.children.retain(|c| c.tag != "DATE"),
        Some(date) => match event.child_mut("DATE") {
            Some(existing) => existing.value = Some(date.to_string()),
            None => {
                let level = event.level + 1;
                event
                    .children
                    .push(GedcomNode::new(level, "DATE").with_value(date));
            }
        },
    }
}

/// Make the `tag` children of `node` match `wanted` by value, leaving
/// matching references and their sub-structure as they are
fn reconcile_references(node: &mut GedcomNode, tag: &str, wanted: &[&GedcomNode]) {
    node.children
        .retain(|c| c.tag != tag || wanted.iter().any(|w| w.value == c.value));
    for want in wanted {
        let present = node
            .children
            .iter()
            .any(|c| c.tag == tag && c.value == want.value);
        if !present {
            node.children.push(GedcomNode {
                level: node.level + 1,
                ..(*want).clone()
            });
        }
    }
}

fn update_family(node: &mut GedcomNode, fresh: &GedcomNode) {
    for tag in FAMILY_MEMBER_TAGS {
        let wanted: Vec<&GedcomNode> = fresh.children_with_tag(tag).collect();
        reconcile_references(node, tag, &wanted);
    }
}

/// Insert `records` after the last root record with `tag`
///
/// With no such record they go before a trailing `TRLR`, or at the end.
fn insert_after_last(nodes: &mut Vec<GedcomNode>, records: Vec<GedcomNode>, tag: &str) {
    if records.is_empty() {
        return;
    }
    let at = match nodes.iter().rposition(|n| n.tag == tag) {
        Some(last) => last + 1,
        None if nodes.last().is_some_and(|n| n.tag == "TRLR") => nodes.len() - 1,
        None => nodes.len(),
    };
    nodes.splice(at..at, records);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_gedcom;
    use crate::serializer::export_gedcom;
    use kin_model::Gender;
    use pretty_assertions::assert_eq;

    const DOC: &str = "0 HEAD\n1 SOUR Other\n\
        0 @I1@ INDI\n1 NAME John /Smith/\n2 GIVN John\n1 SEX M\n1 BIRT\n2 DATE 1900\n2 PLAC Boston\n1 _UID abc\n1 FAMS @F1@\n\
        0 @I2@ INDI\n1 NAME Jane /Doe/\n1 SEX F\n1 FAMS @F1@\n\
        0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I2@\n1 MARR\n2 DATE 1925\n\
        0 TRLR";

    fn original() -> (Vec<GedcomNode>, Vec<Person>) {
        let nodes = parse_gedcom(DOC);
        let persons = gedcom_to_persons(&nodes);
        (nodes, persons)
    }

    #[test]
    fn unchanged_persons_reproduce_the_document() {
        let (nodes, persons) = original();
        let merged = merge_gedcom_nodes(&nodes, &persons);
        assert_eq!(export_gedcom(&merged, None), DOC);
    }

    #[test]
    fn field_edits_touch_only_their_tags() {
        let (nodes, mut persons) = original();
        persons[0].data.first_name = "Johnny".into();
        persons[0].data.birth_day = Some("1901".into());

        let merged = merge_gedcom_nodes(&nodes, &persons);
        let john = &merged[1];
        let name = john.child("NAME").unwrap();
        assert_eq!(name.value_str(), "Johnny /Smith/");
        assert_eq!(name.child("GIVN").map(GedcomNode::value_str), Some("John"));

        let birth = john.child("BIRT").unwrap();
        assert_eq!(birth.child("DATE").map(GedcomNode::value_str), Some("1901"));
        assert_eq!(birth.child("PLAC").map(GedcomNode::value_str), Some("Boston"));
        assert_eq!(john.child("_UID").map(GedcomNode::value_str), Some("abc"));
    }

    #[test]
    fn clearing_fields_removes_their_tags() {
        let (nodes, mut persons) = original();
        persons[0].data.gender = None;
        persons[0].data.birth_day = None;

        let merged = merge_gedcom_nodes(&nodes, &persons);
        let john = &merged[1];
        assert!(john.child("SEX").is_none());
        // BIRT keeps its place but loses DATE
        let birth = john.child("BIRT").unwrap();
        assert!(birth.child("DATE").is_none());
        assert!(birth.child("PLAC").is_some());
    }

    #[test]
    fn note_change_rewrites_note() {
        let (nodes, mut persons) = original();
        persons[1].wiki_id = Some("Q1".into());
        let merged = merge_gedcom_nodes(&nodes, &persons);
        assert_eq!(merged[2].child("NOTE").map(GedcomNode::value_str), Some("wikiId:Q1"));
    }

    #[test]
    fn deleted_person_and_family_are_removed() {
        let (nodes, mut persons) = original();
        persons.retain(|p| p.id == "I1");
        persons[0].rels.spouses.clear();

        let merged = merge_gedcom_nodes(&nodes, &persons);
        let tags: Vec<_> = merged.iter().map(|n| n.tag.as_str()).collect();
        assert_eq!(tags, vec!["HEAD", "INDI", "TRLR"]);
        assert!(merged[1].child("FAMS").is_none());
    }

    #[test]
    fn new_records_follow_their_kind() {
        let (nodes, mut persons) = original();
        let mut kid = Person::new("I3", "Jack").with_gender(Gender::Male);
        kid.rels.father = Some("I1".into());
        kid.rels.mother = Some("I2".into());
        persons[0].rels.children.push("I3".into());
        persons[1].rels.children.push("I3".into());
        persons.push(kid);

        let merged = merge_gedcom_nodes(&nodes, &persons);
        let tags: Vec<_> = merged.iter().map(|n| n.tag.as_str()).collect();
        assert_eq!(tags, vec!["HEAD", "INDI", "INDI", "INDI", "FAM", "TRLR"]);
        assert_eq!(merged[3].xref_id.as_deref(), Some("@I3@"));

        let fam = &merged[4];
        assert_eq!(fam.xref_id.as_deref(), Some("@F1@"));
        assert_eq!(fam.child("CHIL").map(GedcomNode::value_str), Some("@I3@"));
        assert!(fam.child("MARR").is_some());
        assert_eq!(merged[3].child("FAMC").map(GedcomNode::value_str), Some("@F1@"));
    }

    #[test]
    fn records_without_same_tag_go_before_trailer() {
        let nodes = parse_gedcom("0 HEAD\n0 TRLR");
        let persons = vec![Person::new("I1", "Solo")];
        let merged = merge_gedcom_nodes(&nodes, &persons);
        let tags: Vec<_> = merged.iter().map(|n| n.tag.as_str()).collect();
        assert_eq!(tags, vec!["HEAD", "INDI", "TRLR"]);
    }
}
