//! Editor color palette used by the diff panel.

use egui::Color32;

// --- Accent (Burgundy Soft) ---

pub const ACCENT: Color32 = Color32::from_rgb(166, 74, 92);

// --- Text ---

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(232, 236, 242);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(170, 178, 191);
pub const TEXT_MUTED: Color32 = Color32::from_rgb(120, 129, 145);

// --- Diff states ---

pub const ADDED: Color32 = Color32::from_rgb(74, 166, 126);
pub const CHANGED: Color32 = Color32::from_rgb(230, 185, 92);
pub const REMOVED: Color32 = Color32::from_rgb(220, 88, 88);
pub const INFO: Color32 = Color32::from_rgb(92, 150, 230);
