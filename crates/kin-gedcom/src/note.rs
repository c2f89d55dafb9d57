//! Extension fields packed into NOTE text
//!
//! `wikiId`, `wikiLoaded` and `avatar` have no native GEDCOM tag. They travel
//! as `key:value` tokens inside the NOTE value, separated from the visible
//! note text and from each other by `; `.

use kin_model::Person;
use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|;\s*)(wikiId|wikiLoaded|avatar):([^;]+)").expect("valid regex")
});

/// Separator between note parts
pub const NOTE_SEPARATOR: &str = "; ";

/// Fields recovered from a NOTE value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedNote {
    /// Visible note text with the tokens removed
    pub note: Option<String>,
    /// `wikiId` token
    pub wiki_id: Option<String>,
    /// `wikiLoaded` token; anything but `true` reads as false
    pub wiki_loaded: Option<bool>,
    /// `avatar` token
    pub avatar: Option<String>,
}

/// Split NOTE text into visible text and extension tokens
#[must_use]
pub fn decode_note(text: &str) -> DecodedNote {
    let mut decoded = DecodedNote::default();
    let mut found = Vec::new();

    for caps in TOKEN_RE.captures_iter(text) {
        let key = &caps[1];
        let value = caps[2].trim();
        match key {
            "wikiId" => decoded.wiki_id = Some(value.to_string()),
            "wikiLoaded" => decoded.wiki_loaded = Some(value == "true"),
            _ => decoded.avatar = Some(value.to_string()),
        }
        found.push((key.to_string(), value.to_string()));
    }

    let mut cleaned = text.to_string();
    for (key, value) in &found {
        let pattern = format!(r"(?:^|;\s*){key}:{}", regex::escape(value));
        if let Ok(re) = Regex::new(&pattern) {
            cleaned = re.replacen(&cleaned, 1, "").trim().to_string();
        }
    }
    let cleaned = cleaned.trim_start_matches(';').trim_end_matches(';').trim();

    decoded.note = (!cleaned.is_empty()).then(|| cleaned.to_string());
    decoded
}

/// Compose the NOTE value for a person, `None` when there is nothing to write
///
/// Line breaks in the visible note are flattened to spaces so the value fits
/// on one GEDCOM line.
#[must_use]
pub fn compose_note(person: &Person) -> Option<String> {
    let mut parts = Vec::new();

    if let Some(note) = person.data.note.as_deref().filter(|n| !n.is_empty()) {
        parts.push(flatten_lines(note));
    }
    if let Some(wiki_id) = person.wiki_id.as_deref().filter(|w| !w.is_empty()) {
        parts.push(format!("wikiId:{wiki_id}"));
    }
    if let Some(loaded) = person.wiki_loaded {
        parts.push(format!("wikiLoaded:{loaded}"));
    }
    if let Some(avatar) = person.data.avatar.as_deref().filter(|a| !a.is_empty()) {
        parts.push(format!("avatar:{avatar}"));
    }

    (!parts.is_empty()).then(|| parts.join(NOTE_SEPARATOR))
}

fn flatten_lines(text: &str) -> String {
    text.replace("\r\n", " ").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_tokens_after_text() {
        let decoded =
            decode_note("Physicist; wikiId:Q937; wikiLoaded:true; avatar:http://img/a.jpg");
        assert_eq!(decoded.note.as_deref(), Some("Physicist"));
        assert_eq!(decoded.wiki_id.as_deref(), Some("Q937"));
        assert_eq!(decoded.wiki_loaded, Some(true));
        assert_eq!(decoded.avatar.as_deref(), Some("http://img/a.jpg"));
    }

    #[test]
    fn token_only_note_leaves_no_text() {
        let decoded = decode_note("wikiId:Q1; wikiLoaded:false");
        assert!(decoded.note.is_none());
        assert_eq!(decoded.wiki_id.as_deref(), Some("Q1"));
        assert_eq!(decoded.wiki_loaded, Some(false));
    }

    #[test]
    fn plain_note_is_untouched() {
        let decoded = decode_note("Emigrated in 1902 (maybe)");
        assert_eq!(decoded.note.as_deref(), Some("Emigrated in 1902 (maybe)"));
        assert!(decoded.wiki_id.is_none());
        assert!(decoded.wiki_loaded.is_none());
    }

    #[test]
    fn token_values_with_regex_characters_are_removed() {
        let decoded = decode_note("x; avatar:http://a.b/c?width=120&v=(1)");
        assert_eq!(decoded.avatar.as_deref(), Some("http://a.b/c?width=120&v=(1)"));
        assert_eq!(decoded.note.as_deref(), Some("x"));
    }

    #[test]
    fn key_inside_words_is_not_a_token() {
        let decoded = decode_note("see mywikiId:Q5");
        assert!(decoded.wiki_id.is_none());
        assert_eq!(decoded.note.as_deref(), Some("see mywikiId:Q5"));
    }

    #[test]
    fn compose_orders_parts_and_flattens_lines() {
        let mut person = Person::new("I1", "Ada").with_note("line one\nline two");
        person.wiki_id = Some("Q7259".into());
        person.wiki_loaded = Some(false);
        person.data.avatar = Some("http://img".into());

        assert_eq!(
            compose_note(&person).as_deref(),
            Some("line one line two; wikiId:Q7259; wikiLoaded:false; avatar:http://img")
        );
        assert!(compose_note(&Person::new("I2", "Bare")).is_none());
    }

    #[test]
    fn compose_then_decode_recovers_fields() {
        let mut person = Person::new("I1", "Ada").with_note("Mathematician");
        person.wiki_id = Some("Q7259".into());
        person.wiki_loaded = Some(true);

        let composed = compose_note(&person).unwrap();
        let decoded = decode_note(&composed);
        assert_eq!(decoded.note.as_deref(), Some("Mathematician"));
        assert_eq!(decoded.wiki_id, person.wiki_id);
        assert_eq!(decoded.wiki_loaded, Some(true));
    }
}
