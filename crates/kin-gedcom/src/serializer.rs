//! Node forest → GEDCOM text

use crate::node::GedcomNode;

/// Source name written into generated headers
pub const DEFAULT_SOURCE: &str = "FamilyTreeEditor";

/// GEDCOM version declared in generated headers
pub const GEDCOM_VERSION: &str = "5.5.1";

/// Serialize nodes depth-first, one line per node
///
/// With `envelope` set to a source name, a `HEAD` record naming that source
/// is prepended and a `TRLR` record appended. Documents produced by merging
/// into an imported original already carry their own envelope and should be
/// written with `None`.
#[must_use]
pub fn export_gedcom(nodes: &[GedcomNode], envelope: Option<&str>) -> String {
    let mut lines = Vec::new();

    if let Some(source) = envelope {
        lines.push("0 HEAD".to_string());
        lines.push(format!("1 SOUR {source}"));
        lines.push("1 GEDC".to_string());
        lines.push(format!("2 VERS {GEDCOM_VERSION}"));
        lines.push("1 CHAR UTF-8".to_string());
    }
    for node in nodes {
        write_node(node, &mut lines);
    }
    if envelope.is_some() {
        lines.push("0 TRLR".to_string());
    }

    lines.join("\n")
}

fn write_node(node: &GedcomNode, lines: &mut Vec<String>) {
    let level = node.level.to_string();
    let parts = [
        Some(level.as_str()),
        node.xref_id.as_deref(),
        Some(node.tag.as_str()),
        node.value.as_deref(),
    ];
    let line = parts
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    lines.push(line);

    for child in &node.children {
        write_node(child, lines);
    }
}
