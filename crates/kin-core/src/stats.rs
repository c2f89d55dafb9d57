//! Tree statistics

use kin_layout::TreeLayout;
use kin_model::{Gender, PersonGraph};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Counts shown in the statistics panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeStats {
    /// Persons in the tree
    pub total_persons: usize,
    /// Family nodes in the current layout
    pub total_families: usize,
    /// Persons recorded as male
    pub males: usize,
    /// Persons recorded as female
    pub females: usize,
    /// Everyone else
    pub unknown: usize,
    /// Spouse links counted once per pair
    pub spouse_pairs: usize,
    /// Persons with at least one parent
    pub children: usize,
}

impl TreeStats {
    /// Compute statistics for a graph and its layout
    #[must_use]
    pub fn compute(graph: &PersonGraph, layout: &TreeLayout) -> Self {
        let count = |gender| graph.iter().filter(|p| p.data.gender == Some(gender)).count();
        let total_persons = graph.len();
        let males = count(Gender::Male);
        let females = count(Gender::Female);
        Self {
            total_persons,
            total_families: layout.family_nodes.len(),
            males,
            females,
            unknown: total_persons - males - females,
            spouse_pairs: graph.iter().map(|p| p.rels.spouses.len()).sum::<usize>() / 2,
            children: graph.iter().filter(|p| p.rels.has_parents()).count(),
        }
    }
}

impl fmt::Display for TreeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Persons:      {}", self.total_persons)?;
        writeln!(f, "Families:     {}", self.total_families)?;
        writeln!(f, "Males:        {}", self.males)?;
        writeln!(f, "Females:      {}", self.females)?;
        writeln!(f, "Unknown:      {}", self.unknown)?;
        writeln!(f, "Spouse pairs: {}", self.spouse_pairs)?;
        write!(f, "Children:     {}", self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kin_model::Person;
    use pretty_assertions::assert_eq;

    #[test]
    fn counts_people_and_links() {
        let mut graph: PersonGraph = [
            Person::new("I1", "Dad").with_gender(Gender::Male),
            Person::new("I2", "Mom").with_gender(Gender::Female),
            Person::new("I3", "Kid"),
            Person::new("I4", "Kid2").with_gender(Gender::Unknown),
        ]
        .into_iter()
        .collect();
        graph.add_spouse("I1", "I2");
        graph.add_child("I3", "I1", Some("I2"));
        graph.add_child("I4", "I2", None);

        let stats = TreeStats::compute(&graph, &TreeLayout::default());
        assert_eq!(
            stats,
            TreeStats {
                total_persons: 4,
                total_families: 0,
                males: 1,
                females: 1,
                unknown: 2,
                spouse_pairs: 1,
                children: 2,
            }
        );
        assert!(stats.to_string().starts_with("Persons:      4"));
    }

    proptest::proptest! {
        #[test]
        fn gender_counts_cover_everyone(codes in proptest::collection::vec(0u8..4, 0..30)) {
            let graph: PersonGraph = codes
                .iter()
                .enumerate()
                .map(|(i, code)| {
                    let person = Person::new(format!("I{i}"), "P");
                    match code {
                        0 => person.with_gender(Gender::Male),
                        1 => person.with_gender(Gender::Female),
                        2 => person.with_gender(Gender::Unknown),
                        _ => person,
                    }
                })
                .collect();
            let stats = TreeStats::compute(&graph, &TreeLayout::default());
            proptest::prop_assert_eq!(stats.males + stats.females + stats.unknown, codes.len());
            proptest::prop_assert_eq!(stats.males, codes.iter().filter(|c| **c == 0).count());
        }
    }
}
