//! # Mentor Core
//!
//! Editing primitives shared by the teaching recorder and the editor host:
//! the undo/redo history, reflected type schemas, the live object scene and
//! the text dump of reflected values.

pub mod abstract_editor;
pub mod dump;
pub mod reflect;
pub mod scene;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
