//! Panel showing the diff tree of the last teaching capture.

use std::sync::Arc;

use mentor_teach::present::{DiffTreeEntry, EntryKind, build_diff_tree, render_text};
use mentor_teach::{PresentationSink, TransactionDiff};
use parking_lot::Mutex;

/// Collapsible diff tree with a text filter.
///
/// The tree is filled through the [`PresentationSink`] returned by
/// [`sink`](Self::sink), so captures update the panel without holding it.
pub struct DiffPanel {
    tree: Arc<Mutex<Vec<DiffTreeEntry>>>,
    /// Case-insensitive label filter.
    filter_text: String,
}

impl DiffPanel {
    pub fn new() -> Self {
        Self {
            tree: Arc::new(Mutex::new(build_diff_tree(&[]))),
            filter_text: String::new(),
        }
    }

    /// A sink that replaces the panel's tree on every capture.
    pub fn sink(&self) -> PanelPresentationSink {
        PanelPresentationSink {
            tree: Arc::clone(&self.tree),
        }
    }

    pub fn entries(&self) -> Vec<DiffTreeEntry> {
        self.tree.lock().clone()
    }

    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter_text = text.into();
    }

    /// Entries that match the filter, with their matching descendants.
    pub fn visible_entries(&self) -> Vec<DiffTreeEntry> {
        let filter = self.filter_text.to_lowercase();
        let tree = self.tree.lock();
        if filter.is_empty() {
            return tree.clone();
        }
        tree.iter().filter_map(|e| filter_entry(e, &filter)).collect()
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let count = self
                .tree
                .lock()
                .iter()
                .filter(|e| e.kind == EntryKind::Transaction)
                .count();
            ui.label(
                egui::RichText::new(format!("Transactions: {count}"))
                    .monospace()
                    .color(crate::theme::ACCENT),
            );
            ui.separator();
            ui.label("Filter:");
            ui.text_edit_singleline(&mut self.filter_text);
        });

        ui.separator();

        let entries = self.visible_entries();
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (i, entry) in entries.iter().enumerate() {
                    show_entry(ui, entry, i.to_string());
                }
            });
    }
}

impl Default for DiffPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn filter_entry(entry: &DiffTreeEntry, filter: &str) -> Option<DiffTreeEntry> {
    if entry.label.to_lowercase().contains(filter) {
        return Some(entry.clone());
    }
    let children: Vec<_> = entry
        .children
        .iter()
        .filter_map(|c| filter_entry(c, filter))
        .collect();
    (!children.is_empty()).then(|| DiffTreeEntry {
        children,
        ..entry.clone()
    })
}

fn show_entry(ui: &mut egui::Ui, entry: &DiffTreeEntry, id: String) {
    let label = egui::RichText::new(&entry.label)
        .monospace()
        .color(kind_color(entry.kind));

    if entry.children.is_empty() {
        ui.horizontal(|ui| {
            ui.spacing_mut().item_spacing.x = 4.0;
            ui.label(label);
            if let Some(detail) = &entry.detail {
                ui.label(
                    egui::RichText::new(detail)
                        .monospace()
                        .color(crate::theme::TEXT_SECONDARY),
                );
            }
        });
        return;
    }

    egui::CollapsingHeader::new(label)
        .id_salt(&id)
        .default_open(entry.kind == EntryKind::Transaction)
        .show(ui, |ui| {
            if let Some(detail) = &entry.detail {
                ui.label(
                    egui::RichText::new(detail)
                        .italics()
                        .color(crate::theme::TEXT_MUTED),
                );
            }
            for (i, child) in entry.children.iter().enumerate() {
                show_entry(ui, child, format!("{id}/{i}"));
            }
        });
}

fn kind_color(kind: EntryKind) -> egui::Color32 {
    match kind {
        EntryKind::Placeholder => crate::theme::TEXT_MUTED,
        EntryKind::Transaction => crate::theme::TEXT_PRIMARY,
        EntryKind::Object => crate::theme::INFO,
        EntryKind::ObjectAdded | EntryKind::PropertyAdded => crate::theme::ADDED,
        EntryKind::ObjectRemoved | EntryKind::PropertyRemoved => crate::theme::REMOVED,
        EntryKind::Property => crate::theme::CHANGED,
    }
}

/// Presentation sink feeding a [`DiffPanel`]. Also writes the tree to the log.
pub struct PanelPresentationSink {
    tree: Arc<Mutex<Vec<DiffTreeEntry>>>,
}

impl PresentationSink for PanelPresentationSink {
    fn present(&mut self, diffs: &[TransactionDiff]) {
        let tree = build_diff_tree(diffs);
        log::info!("Teaching session diff:\n{}", render_text(&tree));
        *self.tree.lock() = tree;
    }
}
