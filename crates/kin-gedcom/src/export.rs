//! Persons → GEDCOM node forest
//!
//! Family records are derived from relationship pointers in two passes:
//! 1. every distinct (father, mother) pair seen on a child, including pairs
//!    where only one parent is known
//! 2. every spouse pair not already covered by pass 1, carrying the
//!    children listed on the person that introduced it
//!
//! Families are identified by their sorted parent ids. When an original
//! document is supplied, a family whose (husband, wife) pair matches one of
//! its `FAM` records keeps that record's xref; new families get the next free
//! `@F<n>@` label.

use crate::node::{strip_xref, to_xref, GedcomNode};
use crate::note::compose_note;
use indexmap::IndexMap;
use kin_model::{Gender, Person};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

static FAMILY_XREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@F(\d+)@$").expect("valid regex"));

/// A family derived from person relationships
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilyRecord {
    /// Husband (or the only known father)
    pub husband: Option<String>,
    /// Wife (or the only known mother)
    pub wife: Option<String>,
    /// Child ids in discovery order
    pub children: Vec<String>,
}

impl FamilyRecord {
    /// Identity key of this family
    #[must_use]
    pub fn key(&self) -> String {
        family_key([self.husband.as_deref(), self.wife.as_deref()])
    }

    fn has_child(&self, id: &str) -> bool {
        self.children.iter().any(|c| c == id)
    }

    fn has_spouse(&self, id: &str) -> bool {
        self.husband.as_deref() == Some(id) || self.wife.as_deref() == Some(id)
    }
}

/// Identity key for a set of parent ids: present ids, sorted, joined by `|`
#[must_use]
pub fn family_key<'a>(ids: impl IntoIterator<Item = Option<&'a str>>) -> String {
    let mut ids: Vec<&str> = ids.into_iter().flatten().filter(|id| !id.is_empty()).collect();
    ids.sort_unstable();
    ids.join("|")
}

/// Derive the family records implied by a person list
#[must_use]
pub fn extract_families(persons: &[Person]) -> Vec<FamilyRecord> {
    let mut families: IndexMap<String, FamilyRecord> = IndexMap::new();

    for person in persons.iter().filter(|p| p.rels.has_parents()) {
        let record = FamilyRecord {
            husband: person.rels.father.clone(),
            wife: person.rels.mother.clone(),
            children: Vec::new(),
        };
        let family = families.entry(record.key()).or_insert(record);
        if !family.has_child(&person.id) {
            family.children.push(person.id.clone());
        }
    }

    for person in persons {
        let is_husband = person.data.gender == Some(Gender::Male);
        for spouse in &person.rels.spouses {
            let key = family_key([Some(person.id.as_str()), Some(spouse.as_str())]);
            families.entry(key).or_insert_with(|| {
                let (husband, wife) = if is_husband {
                    (person.id.clone(), spouse.clone())
                } else {
                    (spouse.clone(), person.id.clone())
                };
                FamilyRecord {
                    husband: Some(husband),
                    wife: Some(wife),
                    children: person.rels.children.clone(),
                }
            });
        }
    }

    families.into_values().collect()
}

/// Assign an xref label to each family, in family order
///
/// Families whose key matches a `FAM` record of `original` reuse its label.
/// Fresh labels continue after the highest `@F<n>@` in `original` and never
/// collide with a label it already uses.
#[must_use]
pub fn assign_family_ids(families: &[FamilyRecord], original: &[GedcomNode]) -> Vec<String> {
    let mut existing: HashMap<String, String> = HashMap::new();
    let mut used: HashSet<String> = HashSet::new();

    for node in original.iter().filter(|n| n.tag == "FAM") {
        let Some(xref) = node.xref_id.as_ref().filter(|x| !x.is_empty()) else {
            continue;
        };
        let husband = node.child("HUSB").map(|c| strip_xref(c.value_str()));
        let wife = node.child("WIFE").map(|c| strip_xref(c.value_str()));
        existing.insert(family_key([husband.as_deref(), wife.as_deref()]), xref.clone());
        used.insert(xref.clone());
    }

    let mut max = used
        .iter()
        .filter_map(|id| FAMILY_XREF_RE.captures(id))
        .filter_map(|caps| caps[1].parse::<u64>().ok())
        .max()
        .unwrap_or(0);

    families
        .iter()
        .map(|family| {
            if let Some(xref) = existing.get(&family.key()) {
                return xref.clone();
            }
            loop {
                max += 1;
                let candidate = format!("@F{max}@");
                if used.insert(candidate.clone()) {
                    return candidate;
                }
            }
        })
        .collect()
}

/// Format a GEDCOM `NAME` value, `None` when both first and last name are empty
#[must_use]
pub fn format_name(person: &Person) -> Option<String> {
    let first = person.data.first_name.as_str();
    let last = person.data.last_name.as_deref().unwrap_or_default();
    if first.is_empty() && last.is_empty() {
        return None;
    }
    let mut name = format!("{first} /{last}/");
    if let Some(suffix) = person.data.suffix.as_deref().filter(|s| !s.is_empty()) {
        name.push(' ');
        name.push_str(suffix);
    }
    Some(name.trim().to_string())
}

/// Event node (`BIRT`/`DEAT`) holding a level-2 `DATE`
#[must_use]
pub fn event_node(tag: &str, date: &str) -> GedcomNode {
    GedcomNode::new(1, tag).with_child(GedcomNode::new(2, "DATE").with_value(date))
}

fn person_node(person: &Person) -> GedcomNode {
    let mut node = GedcomNode::new(0, "INDI").with_xref(to_xref(&person.id));

    if let Some(name) = format_name(person) {
        node.children.push(GedcomNode::new(1, "NAME").with_value(name));
    }
    if let Some(gender) = person.data.gender {
        node.children.push(GedcomNode::new(1, "SEX").with_value(gender.code()));
    }
    if let Some(birth) = person.data.birth_day.as_deref().filter(|d| !d.is_empty()) {
        node.children.push(event_node("BIRT", birth));
    }
    if let Some(death) = person.data.death_day.as_deref().filter(|d| !d.is_empty()) {
        node.children.push(event_node("DEAT", death));
    }
    if let Some(note) = compose_note(person) {
        node.children.push(GedcomNode::new(1, "NOTE").with_value(note));
    }
    node
}

fn family_node(family: &FamilyRecord, xref: &str) -> GedcomNode {
    let mut node = GedcomNode::new(0, "FAM").with_xref(xref);
    if let Some(husband) = &family.husband {
        node.children.push(GedcomNode::new(1, "HUSB").with_value(to_xref(husband)));
    }
    if let Some(wife) = &family.wife {
        node.children.push(GedcomNode::new(1, "WIFE").with_value(to_xref(wife)));
    }
    for child in &family.children {
        node.children.push(GedcomNode::new(1, "CHIL").with_value(to_xref(child)));
    }
    node
}

/// Convert persons into `INDI` records followed by `FAM` records
///
/// `original` is the previously imported document, if any; it only
/// influences family xref labels. An empty person list yields no records.
#[must_use]
pub fn persons_to_gedcom(persons: &[Person], original: &[GedcomNode]) -> Vec<GedcomNode> {
    if persons.is_empty() {
        return Vec::new();
    }
    let families = extract_families(persons);
    let xrefs = assign_family_ids(&families, original);

    let mut nodes: Vec<GedcomNode> = persons
        .iter()
        .map(|person| {
            let mut node = person_node(person);
            let links = families.iter().zip(&xrefs);
            for (_, xref) in links.clone().filter(|(f, _)| f.has_child(&person.id)) {
                node.children.push(GedcomNode::new(1, "FAMC").with_value(xref.clone()));
            }
            for (_, xref) in links.filter(|(f, _)| f.has_spouse(&person.id)) {
                node.children.push(GedcomNode::new(1, "FAMS").with_value(xref.clone()));
            }
            node
        })
        .collect();

    nodes.extend(
        families
            .iter()
            .zip(&xrefs)
            .map(|(family, xref)| family_node(family, xref)),
    );

    debug!(persons = persons.len(), families = families.len(), "exported persons to gedcom");
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn couple_with_child() -> Vec<Person> {
        let mut dad = Person::new("I1", "John").with_last_name("Smith").with_gender(Gender::Male);
        let mut mom = Person::new("I2", "Jane").with_last_name("Doe").with_gender(Gender::Female);
        let mut kid = Person::new("I3", "Jack").with_last_name("Smith");
        dad.rels.spouses = vec!["I2".into()];
        dad.rels.children = vec!["I3".into()];
        mom.rels.spouses = vec!["I1".into()];
        mom.rels.children = vec!["I3".into()];
        kid.rels.father = Some("I1".into());
        kid.rels.mother = Some("I2".into());
        vec![dad, mom, kid]
    }

    fn values<'a>(node: &'a GedcomNode, tag: &'a str) -> Vec<&'a str> {
        node.children_with_tag(tag).map(GedcomNode::value_str).collect()
    }

    #[test]
    fn family_key_sorts_and_skips_missing() {
        assert_eq!(family_key([Some("I2"), Some("I1")]), "I1|I2");
        assert_eq!(family_key([None, Some("I7")]), "I7");
        assert_eq!(family_key([None, None]), "");
    }

    #[test]
    fn parent_pair_and_spouse_pair_share_a_family() {
        let families = extract_families(&couple_with_child());
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].husband.as_deref(), Some("I1"));
        assert_eq!(families[0].wife.as_deref(), Some("I2"));
        assert_eq!(families[0].children, vec!["I3"]);
    }

    #[test]
    fn spouse_family_husband_follows_gender() {
        let mut wife = Person::new("A", "Ann").with_gender(Gender::Female);
        let husband = Person::new("B", "Bob");
        wife.rels.spouses = vec!["B".into()];
        let families = extract_families(&[wife, husband]);
        assert_eq!(families[0].husband.as_deref(), Some("B"));
        assert_eq!(families[0].wife.as_deref(), Some("A"));
    }

    #[test]
    fn single_parent_family() {
        let mom = Person::new("I1", "Mom").with_gender(Gender::Female);
        let mut kid = Person::new("I2", "Kid");
        kid.rels.mother = Some("I1".into());
        let families = extract_families(&[mom, kid]);
        assert_eq!(families.len(), 1);
        assert!(families[0].husband.is_none());
        assert_eq!(families[0].wife.as_deref(), Some("I1"));
    }

    #[test]
    fn writes_records_and_back_references() {
        let nodes = persons_to_gedcom(&couple_with_child(), &[]);
        let tags: Vec<_> = nodes.iter().map(|n| n.tag.as_str()).collect();
        assert_eq!(tags, vec!["INDI", "INDI", "INDI", "FAM"]);

        let dad = &nodes[0];
        assert_eq!(dad.xref_id.as_deref(), Some("@I1@"));
        assert_eq!(values(dad, "NAME"), vec!["John /Smith/"]);
        assert_eq!(values(dad, "SEX"), vec!["M"]);
        assert_eq!(values(dad, "FAMS"), vec!["@F1@"]);
        assert_eq!(values(&nodes[2], "FAMC"), vec!["@F1@"]);
        assert!(nodes[2].child("SEX").is_none());

        let fam = &nodes[3];
        assert_eq!(fam.xref_id.as_deref(), Some("@F1@"));
        assert_eq!(values(fam, "HUSB"), vec!["@I1@"]);
        assert_eq!(values(fam, "WIFE"), vec!["@I2@"]);
        assert_eq!(values(fam, "CHIL"), vec!["@I3@"]);
    }

    #[test]
    fn optional_fields_are_written_only_when_present() {
        let mut person = Person::new("I1", "").with_birth("1900").with_death("");
        person.wiki_loaded = Some(true);
        let node = &persons_to_gedcom(&[person], &[])[0];

        assert!(node.child("NAME").is_none());
        assert_eq!(
            node.child("BIRT").and_then(|b| b.child("DATE")).map(GedcomNode::value_str),
            Some("1900")
        );
        assert!(node.child("DEAT").is_none());
        assert_eq!(values(node, "NOTE"), vec!["wikiLoaded:true"]);
    }

    #[test]
    fn name_with_suffix_and_missing_first_name() {
        let mut person = Person::new("I1", "").with_last_name("Kennedy");
        person.data.suffix = Some("Jr.".into());
        assert_eq!(format_name(&person).as_deref(), Some("/Kennedy/ Jr."));
    }

    #[test]
    fn reuses_original_family_ids_and_avoids_collisions() {
        let original = vec![
            GedcomNode::new(0, "FAM")
                .with_xref("@F7@")
                .with_child(GedcomNode::new(1, "HUSB").with_value("@I1@"))
                .with_child(GedcomNode::new(1, "WIFE").with_value("@I2@")),
            GedcomNode::new(0, "FAM").with_xref("@F9@"),
        ];
        let families = vec![
            FamilyRecord {
                husband: Some("I5".into()),
                ..FamilyRecord::default()
            },
            FamilyRecord {
                husband: Some("I1".into()),
                wife: Some("I2".into()),
                children: Vec::new(),
            },
        ];
        assert_eq!(assign_family_ids(&families, &original), vec!["@F10@", "@F7@"]);
    }

    #[test]
    fn empty_persons_yield_no_records() {
        assert!(persons_to_gedcom(&[], &[]).is_empty());
    }
}
