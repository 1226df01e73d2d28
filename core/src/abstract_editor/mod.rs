//! Abstract editor framework for reversible editing operations.
//!
//! This module provides the foundational traits and types for building
//! an undo/redo-capable editor system. It is decoupled from specific
//! editable types so that higher-level crates can implement concrete
//! editors and observers.
//!
//! - [`Editable`]: trait for types that can be edited, naming their object keys
//! - [`EditAction`]: an edit operation (Command pattern)
//! - [`EditActionHistory`]: undo/redo stack managing action sequences
//!
//! # Transaction queue
//!
//! The history exposes its two stacks as a single ordered queue so that
//! observers can rewind it to the start and step forward one transaction at
//! a time, fetching each record by ordinal.

mod action;
mod history;

pub use action::{EditAction, EditActionError, EditActionResult, Editable};
pub use history::{DEFAULT_MAX_UNDO, EditActionHistory};
