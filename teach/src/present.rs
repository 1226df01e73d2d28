//! Tree presentation of captured diffs.
//!
//! [`build_diff_tree`] turns a finalized diff list into labelled entries
//! that front ends render as they like: [`render_text`] for logs and
//! consoles, an egui panel in the editor.

use std::fmt::Write;

use crate::diff::{PropertyDiff, TransactionDiff};

pub const NO_DIFFERENCES: &str = "No differences";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Placeholder,
    Transaction,
    Object,
    ObjectAdded,
    ObjectRemoved,
    Property,
    PropertyAdded,
    PropertyRemoved,
}

/// One node of the diff tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffTreeEntry {
    pub label: String,
    /// Secondary text shown next to the label.
    pub detail: Option<String>,
    pub kind: EntryKind,
    pub children: Vec<DiffTreeEntry>,
}

impl DiffTreeEntry {
    fn leaf(label: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            label: label.into(),
            detail: None,
            kind,
            children: Vec::new(),
        }
    }
}

/// Builds one root entry per transaction, or a single placeholder when there
/// is nothing to show.
pub fn build_diff_tree(diffs: &[TransactionDiff]) -> Vec<DiffTreeEntry> {
    if diffs.is_empty() {
        return vec![DiffTreeEntry::leaf(NO_DIFFERENCES, EntryKind::Placeholder)];
    }

    diffs
        .iter()
        .map(|transaction| {
            let children = transaction
                .objects
                .iter()
                .map(|object| {
                    let mut children = Vec::new();
                    if object.object_added {
                        children.push(DiffTreeEntry::leaf("Object added", EntryKind::ObjectAdded));
                    }
                    if object.object_removed {
                        children.push(DiffTreeEntry::leaf(
                            "Object removed",
                            EntryKind::ObjectRemoved,
                        ));
                    }
                    children.extend(object.properties.iter().map(property_entry));
                    DiffTreeEntry {
                        label: format!("{} ({})", object.path, object.type_name),
                        detail: None,
                        kind: EntryKind::Object,
                        children,
                    }
                })
                .collect();
            DiffTreeEntry {
                label: format!("Transaction {}: {}", transaction.index, transaction.title),
                detail: (!transaction.context.is_empty()).then(|| transaction.context.clone()),
                kind: EntryKind::Transaction,
                children,
            }
        })
        .collect()
}

fn property_entry(property: &PropertyDiff) -> DiffTreeEntry {
    let (label, detail, kind) = if property.added {
        (
            format!("Property {} [added]", property.name),
            property.new_value.clone(),
            EntryKind::PropertyAdded,
        )
    } else if property.removed {
        (
            format!("Property {} [removed]", property.name),
            property.old_value.clone(),
            EntryKind::PropertyRemoved,
        )
    } else {
        (
            format!("Property {}", property.name),
            format!("{} -> {}", property.old_value, property.new_value),
            EntryKind::Property,
        )
    };
    DiffTreeEntry {
        label,
        detail: Some(detail),
        kind,
        children: Vec::new(),
    }
}

/// Renders entries as an indented outline, two spaces per level.
pub fn render_text(entries: &[DiffTreeEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        render_entry(&mut out, entry, 0);
    }
    out
}

fn render_entry(out: &mut String, entry: &DiffTreeEntry, depth: usize) {
    let pad = "  ".repeat(depth);
    // Writing to a String cannot fail.
    match &entry.detail {
        Some(detail) if detail.contains('\n') => {
            let _ = writeln!(out, "{pad}{}:", entry.label);
            for line in detail.lines() {
                let _ = writeln!(out, "{pad}    {line}");
            }
        }
        Some(detail) => {
            let _ = writeln!(out, "{pad}{}: {detail}", entry.label);
        }
        None => {
            let _ = writeln!(out, "{pad}{}", entry.label);
        }
    }
    for child in &entry.children {
        render_entry(out, child, depth + 1);
    }
}

/// Receives the finalized diff list of a capture.
pub trait PresentationSink: Send {
    fn present(&mut self, diffs: &[TransactionDiff]);
}

/// Writes the diff tree to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPresentationSink;

impl PresentationSink for LogPresentationSink {
    fn present(&mut self, diffs: &[TransactionDiff]) {
        let text = render_text(&build_diff_tree(diffs));
        log::info!("Teaching session diff:\n{text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ObjectDiff;

    #[test]
    fn empty_list_shows_placeholder() {
        let tree = build_diff_tree(&[]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].label, NO_DIFFERENCES);
        assert_eq!(tree[0].kind, EntryKind::Placeholder);
    }

    #[test]
    fn labels_follow_tree_levels() {
        let mut door = ObjectDiff::new("/Game/Map.Door", "Actor");
        door.properties = vec![
            PropertyDiff::changed("Health", "100", "50"),
            PropertyDiff::added("Armor", "3"),
            PropertyDiff::removed("Speed", "1.000000"),
        ];
        let mut spawned = ObjectDiff::new("/Game/Map.Lamp", "Actor");
        spawned.object_added = true;
        let diffs = vec![TransactionDiff {
            index: 5,
            title: "Set Health".to_string(),
            context: String::new(),
            objects: vec![door, spawned],
        }];

        let tree = build_diff_tree(&diffs);
        assert_eq!(tree[0].label, "Transaction 5: Set Health");
        assert_eq!(tree[0].detail, None);
        let door = &tree[0].children[0];
        assert_eq!(door.label, "/Game/Map.Door (Actor)");
        let labels: Vec<_> = door.children.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(
            labels,
            ["Property Health", "Property Armor [added]", "Property Speed [removed]"]
        );
        assert_eq!(door.children[0].detail.as_deref(), Some("100 -> 50"));
        assert_eq!(door.children[1].detail.as_deref(), Some("3"));
        assert_eq!(door.children[2].detail.as_deref(), Some("1.000000"));
        assert_eq!(tree[0].children[1].children[0].label, "Object added");
    }

    #[test]
    fn text_rendering_indents_children() {
        let mut object = ObjectDiff::new("/Game/Map.A", "Actor");
        object.properties = vec![PropertyDiff::changed("Health", "1", "2")];
        let diffs = vec![TransactionDiff {
            index: 0,
            title: "Edit".to_string(),
            context: String::new(),
            objects: vec![object],
        }];

        let text = render_text(&build_diff_tree(&diffs));
        assert_eq!(
            text,
            "Transaction 0: Edit\n  /Game/Map.A (Actor)\n    Property Health: 1 -> 2\n"
        );
    }
}
