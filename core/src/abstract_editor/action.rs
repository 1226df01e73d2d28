//! Editable targets and reversible editor transactions.
//!
//! - [`Editable`]: a type that transactions operate on, with a key type
//!   naming the objects inside it
//! - [`EditAction`]: a reversible edit operation (Command pattern)
//! - [`EditActionError`] / [`EditActionResult`]: error handling for actions
//!
//! Actions are self-contained: each implementation stores whatever data it
//! needs (target keys, old/new values) to undo and redo itself.

use std::fmt;
use std::hash::Hash;

use thiserror::Error;

/// A type that serves as an editing target.
///
/// The associated [`Key`](Self::Key) identifies individual objects inside
/// the target. Actions report the keys they touch so that observers (the
/// teaching recorder, for instance) can snapshot exactly those objects
/// around a redo step.
///
/// ```ignore
/// struct MyScene { /* ... */ }
/// impl Editable for MyScene {
///     type Key = ObjectId;
/// }
/// ```
pub trait Editable: 'static {
    /// Identifier of one object within the target.
    type Key: Copy + Eq + Hash + Ord + fmt::Debug + Send;
}

/// Error type for action execution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditActionError {
    /// The target object was not found.
    #[error("target not found: {0}")]
    TargetNotFound(String),
    /// The target is in an invalid state for this action.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// There is no transaction to undo.
    #[error("nothing to undo")]
    NothingToUndo,
    /// There is no transaction to redo.
    #[error("nothing to redo")]
    NothingToRedo,
    /// A custom error with a description.
    #[error("{0}")]
    Custom(String),
}

/// Result type for action operations.
pub type EditActionResult<T = ()> = Result<T, EditActionError>;

/// A reversible editor transaction.
///
/// # Object Safety
///
/// This trait is dyn-compatible so that different action types can share a
/// single [`EditActionHistory`](super::EditActionHistory) as
/// `Box<dyn EditAction<T>>`.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug)]
/// struct SetHealth {
///     object: ObjectId,
///     old: i64,
///     new: i64,
/// }
///
/// impl EditAction<Scene> for SetHealth {
///     fn apply(&mut self, scene: &mut Scene) -> EditActionResult {
///         scene.set_int(self.object, "Health", self.new)
///     }
///
///     fn undo(&mut self, scene: &mut Scene) -> EditActionResult {
///         scene.set_int(self.object, "Health", self.old)
///     }
///
///     fn description(&self) -> &str {
///         "Set health"
///     }
///
///     fn touched(&self) -> Vec<ObjectId> {
///         vec![self.object]
///     }
/// }
/// ```
pub trait EditAction<T: Editable>: fmt::Debug + Send {
    /// Applies the action to the target (forward / redo direction).
    fn apply(&mut self, target: &mut T) -> EditActionResult;

    /// Reverses the action (undo direction).
    ///
    /// Must restore the target to the state before [`apply`](Self::apply)
    /// was called.
    fn undo(&mut self, target: &mut T) -> EditActionResult;

    /// A short, human-readable title for the edit menu and diff reports.
    fn description(&self) -> &str;

    /// Free-form context recorded with the transaction (the tool or panel
    /// that issued it). Empty by default.
    fn context(&self) -> &str {
        ""
    }

    /// Objects this action modifies, in a stable order.
    ///
    /// The list is queried while the action is on either stack, so it must
    /// not depend on whether the action is currently applied.
    fn touched(&self) -> Vec<T::Key> {
        Vec::new()
    }
}
