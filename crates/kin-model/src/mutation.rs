//! Relationship-editing operations
//!
//! Every operation keeps both ends of a link consistent:
//! - spouse links are written on both persons
//! - a child's `father`/`mother` slot and the parent's `children` list move together
//!
//! Operations on unknown ids do nothing and report
//! [`MutationStatus::Skipped`]; callers that do not care can ignore the status.

use crate::graph::PersonGraph;
use crate::person::{Gender, Person, PersonPatch};
use tracing::debug;

/// Outcome of a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    /// The graph was updated
    Applied,
    /// Nothing changed
    Skipped(SkipReason),
}

impl MutationStatus {
    /// Whether the graph was updated
    #[inline]
    #[must_use]
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Why a mutation did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A referenced person does not exist
    UnknownPerson,
}

/// Father/mother assignment for a child
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentSlots {
    /// Father id
    pub father: Option<String>,
    /// Mother id
    pub mother: Option<String>,
}

/// Decide which parent slot each supplied parent fills
///
/// Known genders claim their own slot; a parent of unknown gender fills the
/// slot the other parent left open, falling back to whichever of father and
/// mother is still empty on the child (father first). Slots already set on
/// the child survive unless the resolution overwrites them.
#[must_use]
pub fn resolve_parents(child: &Person, first: &Person, second: Option<&Person>) -> ParentSlots {
    let father = child.rels.father.clone();
    let mother = child.rels.mother.clone();
    let id = |p: &Person| Some(p.id.clone());

    let Some(second) = second else {
        let (father, mother) = match first.known_gender() {
            Some(Gender::Male) => (id(first), mother),
            Some(Gender::Female) => (father, id(first)),
            _ if father.is_none() => (id(first), mother),
            _ if mother.is_none() => (father, id(first)),
            _ => (father, mother),
        };
        return ParentSlots { father, mother };
    };

    let (father, mother) = match (first.known_gender(), second.known_gender()) {
        (Some(Gender::Male), Some(Gender::Female)) => (id(first), id(second)),
        (Some(Gender::Female), Some(Gender::Male)) => (id(second), id(first)),
        (Some(Gender::Male), _) => (id(first), mother.or_else(|| id(second))),
        (Some(Gender::Female), _) => (father.or_else(|| id(second)), id(first)),
        (_, Some(Gender::Male)) => (id(second), mother.or_else(|| id(first))),
        (_, Some(Gender::Female)) => (father.or_else(|| id(first)), id(second)),
        _ if father.is_none() => (id(first), mother.or_else(|| id(second))),
        _ if mother.is_none() => (father, id(first)),
        _ => (father, mother),
    };
    ParentSlots { father, mother }
}

impl PersonGraph {
    fn push_unique(&mut self, person_id: &str, item: &str, spouses: bool) {
        if let Some(person) = self.persons.get_mut(person_id) {
            let list = if spouses {
                &mut person.rels.spouses
            } else {
                &mut person.rels.children
            };
            if !list.iter().any(|i| i == item) {
                list.push(item.to_string());
            }
        }
    }

    fn remove_from(&mut self, person_id: &str, item: &str, spouses: bool) {
        if let Some(person) = self.persons.get_mut(person_id) {
            let list = if spouses {
                &mut person.rels.spouses
            } else {
                &mut person.rels.children
            };
            list.retain(|i| i != item);
        }
    }

    fn link_spouses(&mut self, a: &str, b: &str) {
        self.push_unique(a, b, true);
        self.push_unique(b, a, true);
    }

    fn both_exist(&self, a: &str, b: &str) -> bool {
        self.contains(a) && self.contains(b)
    }

    /// Add a person, replacing any record with the same id
    pub fn add_person(&mut self, person: Person) -> MutationStatus {
        debug!(id = %person.id, "adding person");
        self.insert(person);
        MutationStatus::Applied
    }

    /// Shallow-update a person's top-level fields
    pub fn update_person(&mut self, id: &str, patch: PersonPatch) -> MutationStatus {
        match self.persons.get_mut(id) {
            Some(person) => {
                patch.apply(person);
                MutationStatus::Applied
            }
            None => MutationStatus::Skipped(SkipReason::UnknownPerson),
        }
    }

    /// Link two persons as spouses on both sides
    pub fn add_spouse(&mut self, person_id: &str, spouse_id: &str) -> MutationStatus {
        if !self.both_exist(person_id, spouse_id) {
            return MutationStatus::Skipped(SkipReason::UnknownPerson);
        }
        self.link_spouses(person_id, spouse_id);
        MutationStatus::Applied
    }

    /// Unlink two spouses on both sides
    pub fn remove_spouse(&mut self, person_id: &str, spouse_id: &str) -> MutationStatus {
        if !self.both_exist(person_id, spouse_id) {
            return MutationStatus::Skipped(SkipReason::UnknownPerson);
        }
        self.remove_from(person_id, spouse_id, true);
        self.remove_from(spouse_id, person_id, true);
        MutationStatus::Applied
    }

    /// Attach a child to one or two parents
    ///
    /// Slots are chosen by [`resolve_parents`]. The parents are not linked as
    /// spouses by this operation.
    pub fn add_child(
        &mut self,
        child_id: &str,
        parent_id: &str,
        other_parent_id: Option<&str>,
    ) -> MutationStatus {
        let (Some(child), Some(first)) = (self.get(child_id), self.get(parent_id)) else {
            return MutationStatus::Skipped(SkipReason::UnknownPerson);
        };
        let second = other_parent_id.and_then(|id| self.get(id));
        let slots = resolve_parents(child, first, second);
        debug!(child = child_id, father = ?slots.father, mother = ?slots.mother, "resolved parents");

        if let Some(child) = self.persons.get_mut(child_id) {
            child.rels.father.clone_from(&slots.father);
            child.rels.mother.clone_from(&slots.mother);
        }
        for parent in [slots.father, slots.mother].into_iter().flatten() {
            self.push_unique(&parent, child_id, false);
        }
        MutationStatus::Applied
    }

    /// Detach a child from one parent, leaving the other parent untouched
    pub fn remove_child(&mut self, parent_id: &str, child_id: &str) -> MutationStatus {
        if !self.both_exist(parent_id, child_id) {
            return MutationStatus::Skipped(SkipReason::UnknownPerson);
        }
        self.remove_from(parent_id, child_id, false);
        if let Some(child) = self.persons.get_mut(child_id) {
            if child.rels.father.as_deref() == Some(parent_id) {
                child.rels.father = None;
            }
            if child.rels.mother.as_deref() == Some(parent_id) {
                child.rels.mother = None;
            }
        }
        MutationStatus::Applied
    }

    /// Set a child's father; links him with an existing mother as spouses
    pub fn add_father(&mut self, child_id: &str, father_id: &str) -> MutationStatus {
        self.add_parent(child_id, father_id, Gender::Male)
    }

    /// Set a child's mother; links her with an existing father as spouses
    pub fn add_mother(&mut self, child_id: &str, mother_id: &str) -> MutationStatus {
        self.add_parent(child_id, mother_id, Gender::Female)
    }

    fn add_parent(&mut self, child_id: &str, parent_id: &str, slot: Gender) -> MutationStatus {
        if !self.both_exist(child_id, parent_id) {
            return MutationStatus::Skipped(SkipReason::UnknownPerson);
        }
        let mut other_parent = None;
        if let Some(child) = self.persons.get_mut(child_id) {
            if slot == Gender::Male {
                child.rels.father = Some(parent_id.to_string());
                other_parent.clone_from(&child.rels.mother);
            } else {
                child.rels.mother = Some(parent_id.to_string());
                other_parent.clone_from(&child.rels.father);
            }
        }
        self.push_unique(parent_id, child_id, false);

        if let Some(other) = other_parent {
            if other != parent_id && self.contains(&other) {
                debug!(parent = parent_id, other = %other, "linking co-parents as spouses");
                self.link_spouses(parent_id, &other);
            }
        }
        MutationStatus::Applied
    }

    /// Remove a person and every reference to it
    pub fn delete_person(&mut self, id: &str) -> MutationStatus {
        let existed = self.persons.shift_remove(id).is_some();
        let mut scrubbed = false;

        for person in self.persons.values_mut() {
            let before = (person.rels.spouses.len(), person.rels.children.len());
            person.rels.spouses.retain(|s| s != id);
            person.rels.children.retain(|c| c != id);
            if before != (person.rels.spouses.len(), person.rels.children.len()) {
                scrubbed = true;
            }
            if person.rels.father.as_deref() == Some(id) {
                person.rels.father = None;
                scrubbed = true;
            }
            if person.rels.mother.as_deref() == Some(id) {
                person.rels.mother = None;
                scrubbed = true;
            }
        }

        if existed || scrubbed {
            debug!(id, existed, "deleted person");
            MutationStatus::Applied
        } else {
            MutationStatus::Skipped(SkipReason::UnknownPerson)
        }
    }
}
