//! Person records
//!
//! Field names serialize in camelCase so persisted person lists keep the
//! `wikiId` / `firstName` / `birthDay` shape used by stored trees.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Recorded gender of a person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gender {
    /// Male (`M`)
    #[serde(rename = "M")]
    Male,
    /// Female (`F`)
    #[serde(rename = "F")]
    Female,
    /// Unknown (`U`)
    #[default]
    #[serde(rename = "U")]
    Unknown,
}

impl Gender {
    /// Parse a one-letter gender code; anything other than `M`/`F` is unknown
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "M" => Self::Male,
            "F" => Self::Female,
            _ => Self::Unknown,
        }
    }

    /// One-letter code used by GEDCOM `SEX` and persisted JSON
    #[inline]
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Unknown => "U",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Descriptive attributes of a person
///
/// Dates are free-form strings and are never parsed as calendar dates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonData {
    /// Given name(s)
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Name suffix (e.g. `Jr.`, `III`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Birth date text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_day: Option<String>,
    /// Death date text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_day: Option<String>,
    /// Gender, absent when never recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    /// Avatar image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Free-text note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Relationship pointers of a person
///
/// `spouses` and `children` are ordered but behave as sets: an id never
/// appears twice.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Relations {
    /// Father id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father: Option<String>,
    /// Mother id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother: Option<String>,
    /// Spouse ids
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spouses: Vec<String>,
    /// Child ids
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

impl Relations {
    /// Father then mother, skipping unset slots
    pub fn parent_ids(&self) -> impl Iterator<Item = &str> {
        self.father
            .as_deref()
            .into_iter()
            .chain(self.mother.as_deref())
    }

    /// Whether either parent slot is set
    #[inline]
    #[must_use]
    pub fn has_parents(&self) -> bool {
        self.father.is_some() || self.mother.is_some()
    }

    /// Whether this person lists `id` as a spouse
    #[inline]
    #[must_use]
    pub fn has_spouse(&self, id: &str) -> bool {
        self.spouses.iter().any(|s| s == id)
    }

    /// Whether this person lists `id` as a child
    #[inline]
    #[must_use]
    pub fn has_child(&self, id: &str) -> bool {
        self.children.iter().any(|c| c == id)
    }
}

/// A person in the family tree
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Stable unique identifier
    pub id: String,
    /// Linked knowledge-base entity id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki_id: Option<String>,
    /// Whether the knowledge-base family of this person was already loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki_loaded: Option<bool>,
    /// Relationship pointers
    #[serde(default)]
    pub rels: Relations,
    /// Descriptive attributes
    #[serde(default)]
    pub data: PersonData,
}

impl Person {
    /// Create a person with an id and a first name
    #[must_use]
    pub fn new(id: impl Into<String>, first_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: PersonData {
                first_name: first_name.into(),
                ..PersonData::default()
            },
            ..Self::default()
        }
    }

    /// With gender
    #[inline]
    #[must_use]
    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.data.gender = Some(gender);
        self
    }

    /// With last name
    #[inline]
    #[must_use]
    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.data.last_name = Some(last_name.into());
        self
    }

    /// With birth date text
    #[inline]
    #[must_use]
    pub fn with_birth(mut self, date: impl Into<String>) -> Self {
        self.data.birth_day = Some(date.into());
        self
    }

    /// With death date text
    #[inline]
    #[must_use]
    pub fn with_death(mut self, date: impl Into<String>) -> Self {
        self.data.death_day = Some(date.into());
        self
    }

    /// With note
    #[inline]
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.data.note = Some(note.into());
        self
    }

    /// Gender if it is male or female
    #[inline]
    #[must_use]
    pub fn known_gender(&self) -> Option<Gender> {
        self.data.gender.filter(|g| *g != Gender::Unknown)
    }

    /// Full display name: first, last and suffix
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut name = format!(
            "{} {}",
            self.data.first_name,
            self.data.last_name.as_deref().unwrap_or_default()
        );
        if let Some(suffix) = self.data.suffix.as_deref().filter(|s| !s.is_empty()) {
            name.push(' ');
            name.push_str(suffix);
        }
        name.trim().to_string()
    }

    /// Birth/death summary, `None` when neither date is known
    #[must_use]
    pub fn life_span(&self) -> Option<String> {
        match (self.data.birth_day.as_deref(), self.data.death_day.as_deref()) {
            (Some(birth), Some(death)) => Some(format!("{birth} - {death}")),
            (Some(birth), None) => Some(format!("Born: {birth}")),
            (None, Some(death)) => Some(format!("Died: {death}")),
            (None, None) => None,
        }
    }
}

/// Shallow update of a person's top-level fields
///
/// Only the fields set to `Some` are replaced.
#[derive(Debug, Clone, Default)]
pub struct PersonPatch {
    /// Replacement data
    pub data: Option<PersonData>,
    /// Replacement relationship pointers
    pub rels: Option<Relations>,
    /// Replacement knowledge-base id
    pub wiki_id: Option<Option<String>>,
    /// Replacement knowledge-base loaded flag
    pub wiki_loaded: Option<Option<bool>>,
}

impl PersonPatch {
    /// Patch replacing only the data block
    #[must_use]
    pub fn data(data: PersonData) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    pub(crate) fn apply(self, person: &mut Person) {
        if let Some(data) = self.data {
            person.data = data;
        }
        if let Some(rels) = self.rels {
            person.rels = rels;
        }
        if let Some(wiki_id) = self.wiki_id {
            person.wiki_id = wiki_id;
        }
        if let Some(wiki_loaded) = self.wiki_loaded {
            person.wiki_loaded = wiki_loaded;
        }
    }
}
