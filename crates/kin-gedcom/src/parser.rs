//! GEDCOM text → node forest
//!
//! Lines are `<level> [@xref@] <TAG> [value]`. Nesting follows the level
//! numbers: a line becomes a child of the nearest preceding line with a
//! smaller level. Lines that do not fit the pattern are skipped.

use crate::node::GedcomNode;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]+)\s+(@[^@]+@)?\s*([^\s]+)(?:\s+(.*))?$").expect("valid regex")
});

/// Parse GEDCOM text into its root records
#[must_use]
pub fn parse_gedcom(text: &str) -> Vec<GedcomNode> {
    let mut roots = Vec::new();
    // Open nodes, innermost last; a node is attached to its parent when popped
    let mut stack: Vec<GedcomNode> = Vec::new();
    let mut skipped = 0usize;

    for line in text.split('\n').map(str::trim).filter(|l| !l.is_empty()) {
        let Some(node) = parse_line(line) else {
            skipped += 1;
            continue;
        };

        while stack.last().is_some_and(|top| top.level >= node.level) {
            close_top(&mut stack, &mut roots);
        }
        stack.push(node);
    }
    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }

    debug!(records = roots.len(), skipped, "parsed gedcom");
    roots
}

fn parse_line(line: &str) -> Option<GedcomNode> {
    let caps = LINE_RE.captures(line)?;
    // Digits only, so parsing fails on overflow alone; saturate
    let level = caps[1].parse::<u32>().unwrap_or(u32::MAX);
    Some(GedcomNode {
        level,
        xref_id: caps.get(2).map(|m| m.as_str().trim().to_string()),
        tag: caps[3].to_string(),
        value: caps.get(4).map(|m| m.as_str().trim().to_string()),
        children: Vec::new(),
    })
}

fn close_top(stack: &mut Vec<GedcomNode>, roots: &mut Vec<GedcomNode>) {
    if let Some(node) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nests_by_level() {
        let nodes = parse_gedcom("0 @I1@ INDI\n1 BIRT\n2 DATE 1 JAN 1900\n1 SEX M\n0 TRLR");

        assert_eq!(nodes.len(), 2);
        let indi = &nodes[0];
        assert_eq!(indi.xref_id.as_deref(), Some("@I1@"));
        assert_eq!(indi.tag, "INDI");
        assert!(indi.value.is_none());
        assert_eq!(indi.children.len(), 2);
        assert_eq!(indi.children[0].tag, "BIRT");
        assert_eq!(indi.children[0].children[0].value.as_deref(), Some("1 JAN 1900"));
        assert_eq!(indi.children[1].tag, "SEX");
        assert_eq!(nodes[1].tag, "TRLR");
    }

    #[test]
    fn handles_crlf_blank_lines_and_indentation() {
        let nodes = parse_gedcom("  0 HEAD  \r\n\r\n   1 CHAR UTF-8\r\n0 TRLR\r\n");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].children[0].value.as_deref(), Some("UTF-8"));
    }

    #[test]
    fn skips_malformed_lines() {
        let nodes = parse_gedcom("garbage\n0 @I1@ INDI\nNAME without level\n1 NAME Ann /Lee/");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].children.len(), 1);
        assert_eq!(nodes[0].children[0].value.as_deref(), Some("Ann /Lee/"));
    }

    #[test]
    fn level_jump_attaches_to_nearest_open_parent() {
        // Level 3 directly under level 1 still nests under it
        let nodes = parse_gedcom("0 INDI\n1 NOTE a\n3 CONT b\n1 SEX F");
        let indi = &nodes[0];
        assert_eq!(indi.children.len(), 2);
        assert_eq!(indi.children[0].children[0].tag, "CONT");
    }

    #[test]
    fn oversized_level_nests_as_deepest() {
        let nodes = parse_gedcom("0 INDI\n1 NOTE a\n99999999999 CONT b\n1 SEX F");
        let indi = &nodes[0];
        assert_eq!(indi.children.len(), 2);
        let cont = &indi.children[0].children[0];
        assert_eq!(cont.tag, "CONT");
        assert_eq!(cont.level, u32::MAX);
        assert_eq!(cont.value.as_deref(), Some("b"));
    }

    #[test]
    fn value_keeps_inner_spacing() {
        let nodes = parse_gedcom("1 NOTE hello   world");
        assert_eq!(nodes[0].value.as_deref(), Some("hello   world"));
    }

    #[test]
    fn empty_input() {
        assert!(parse_gedcom("").is_empty());
        assert!(parse_gedcom("\n\n  \n").is_empty());
    }
}
