//! Mentor Editor - a headless editor host for teaching sessions.
//!
//! Holds a scene with its undo history, exposes edits and teaching-session
//! control as console commands, and shows captured diffs in an egui panel.

pub mod actions;
pub mod config;
pub mod console;
pub mod demo;
pub mod diff_panel;
pub mod log_capture;
pub mod module;
pub mod theme;

pub use config::{ConfigError, EditorConfig};
pub use console::{Console, ConsoleError};
pub use module::EditorModule;
