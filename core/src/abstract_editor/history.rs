//! Undo/redo action history.
//!
//! [`EditActionHistory`] manages a linear undo/redo stack of [`EditAction`] trait
//! objects. When a new action is pushed after undoing, the redo stack is
//! cleared (standard editor behavior).
//!
//! Both stacks together form the *transaction queue*: entries are indexed
//! from the oldest undoable action (`0`) through the most recently undone
//! one (`queue_length() - 1`). Indices are stable across undo and redo, which
//! lets observers fetch a transaction by ordinal while stepping through it.

use std::collections::VecDeque;
use std::fmt;

use super::action::{EditAction, EditActionError, EditActionResult, Editable};

/// Default maximum number of undo steps.
pub const DEFAULT_MAX_UNDO: usize = 100;

struct Entry<T: Editable> {
    action: Box<dyn EditAction<T>>,
    /// `false` when the last redo of this entry failed. Undoing such an
    /// entry only moves it back onto the redo stack.
    applied: bool,
}

/// Manages an undo/redo stack of editor actions.
///
/// The undo stack is a bounded [`VecDeque`]: when it exceeds `max_undo`,
/// the oldest action is dropped from the front. The redo stack is an
/// unbounded [`Vec`] (it can never grow larger than the undo stack was).
///
/// A redo that fails still advances past its entry so later entries stay
/// reachable; the entry is remembered as not applied.
///
/// # Example
///
/// ```ignore
/// let mut history = EditActionHistory::new(50);
/// let mut target = MyScene::new();
///
/// // Execute and record an action
/// history.execute(Box::new(my_action), &mut target).unwrap();
///
/// // Undo the last action
/// history.undo(&mut target).unwrap();
///
/// // Redo it
/// history.redo(&mut target).unwrap();
/// ```
pub struct EditActionHistory<T: Editable> {
    undo_stack: VecDeque<Entry<T>>,
    redo_stack: Vec<Box<dyn EditAction<T>>>,
    max_undo: usize,
}

impl<T: Editable> EditActionHistory<T> {
    /// Creates a new empty action history with the given maximum undo depth.
    ///
    /// When the undo stack exceeds `max_undo`, the oldest action is dropped.
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_undo,
        }
    }

    /// Applies an action to the target and pushes it onto the undo stack.
    ///
    /// Clears the redo stack. If the action fails, it is not pushed.
    pub fn execute(
        &mut self,
        mut action: Box<dyn EditAction<T>>,
        target: &mut T,
    ) -> EditActionResult {
        action.apply(target)?;
        self.redo_stack.clear();
        self.push_undo(Entry {
            action,
            applied: true,
        });
        Ok(())
    }

    /// Undoes the most recent action.
    ///
    /// Returns an error if the undo stack is empty or the undo failed. A
    /// failed undo leaves the action on the undo stack.
    pub fn undo(&mut self, target: &mut T) -> EditActionResult {
        let mut entry = self
            .undo_stack
            .pop_back()
            .ok_or(EditActionError::NothingToUndo)?;
        if entry.applied {
            if let Err(err) = entry.action.undo(target) {
                self.undo_stack.push_back(entry);
                return Err(err);
            }
        }
        self.redo_stack.push(entry.action);
        Ok(())
    }

    /// Redoes the most recently undone action.
    ///
    /// Returns an error if the redo stack is empty or the redo failed. A
    /// failed redo still moves the entry onto the undo stack.
    pub fn redo(&mut self, target: &mut T) -> EditActionResult {
        let mut action = self.redo_stack.pop().ok_or(EditActionError::NothingToRedo)?;
        let result = action.apply(target);
        self.push_undo(Entry {
            action,
            applied: result.is_ok(),
        });
        result
    }

    fn push_undo(&mut self, entry: Entry<T>) {
        self.undo_stack.push_back(entry);
        if self.undo_stack.len() > self.max_undo {
            self.undo_stack.pop_front();
        }
    }

    /// Returns the transaction at queue position `index`.
    ///
    /// Position `0` is the oldest undoable action; positions past the undo
    /// stack continue into the redo stack in redo order.
    pub fn transaction(&self, index: usize) -> Option<&dyn EditAction<T>> {
        let undo_len = self.undo_stack.len();
        if index < undo_len {
            return self.undo_stack.get(index).map(|e| e.action.as_ref());
        }
        let from_top = index - undo_len;
        let redo_len = self.redo_stack.len();
        if from_top >= redo_len {
            return None;
        }
        self.redo_stack
            .get(redo_len - 1 - from_top)
            .map(|a| a.as_ref())
    }

    /// Returns the total number of transactions in both stacks.
    pub fn queue_length(&self) -> usize {
        self.undo_stack.len() + self.redo_stack.len()
    }

    /// Returns `true` if there are actions that can be undone.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns `true` if there are actions that can be redone.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Returns an iterator over undo action descriptions, most recent first.
    pub fn undo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.undo_stack.iter().rev().map(|e| e.action.description())
    }

    /// Returns an iterator over redo action descriptions, most recent first.
    pub fn redo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.redo_stack.iter().rev().map(|a| a.description())
    }

    /// Returns the number of actions in the undo stack.
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Returns the number of actions in the redo stack.
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Returns the maximum undo depth.
    pub fn max_undo(&self) -> usize {
        self.max_undo
    }

    /// Clears both undo and redo stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl<T: Editable> fmt::Debug for EditActionHistory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditActionHistory")
            .field("undo_count", &self.undo_stack.len())
            .field("redo_count", &self.redo_stack.len())
            .field("max_undo", &self.max_undo)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        value: i32,
    }

    impl Editable for Counter {
        type Key = u32;
    }

    #[derive(Debug)]
    struct Add {
        amount: i32,
    }

    impl EditAction<Counter> for Add {
        fn apply(&mut self, target: &mut Counter) -> EditActionResult {
            target.value += self.amount;
            Ok(())
        }

        fn undo(&mut self, target: &mut Counter) -> EditActionResult {
            target.value -= self.amount;
            Ok(())
        }

        fn description(&self) -> &str {
            "Add"
        }
    }

    #[derive(Debug)]
    struct Named(&'static str);

    impl EditAction<Counter> for Named {
        fn apply(&mut self, target: &mut Counter) -> EditActionResult {
            target.value += 1;
            Ok(())
        }

        fn undo(&mut self, target: &mut Counter) -> EditActionResult {
            target.value -= 1;
            Ok(())
        }

        fn description(&self) -> &str {
            self.0
        }
    }

    #[derive(Debug)]
    struct FailingAction;

    impl EditAction<Counter> for FailingAction {
        fn apply(&mut self, _target: &mut Counter) -> EditActionResult {
            Err(EditActionError::Custom("always fails".into()))
        }

        fn undo(&mut self, _target: &mut Counter) -> EditActionResult {
            Err(EditActionError::Custom("always fails".into()))
        }

        fn description(&self) -> &str {
            "Failing"
        }
    }

    /// Applies fine once, then fails on every redo.
    #[derive(Debug)]
    struct FailOnRedo {
        applied_once: bool,
    }

    impl EditAction<Counter> for FailOnRedo {
        fn apply(&mut self, target: &mut Counter) -> EditActionResult {
            if self.applied_once {
                return Err(EditActionError::InvalidState("redo refused".into()));
            }
            self.applied_once = true;
            target.value += 100;
            Ok(())
        }

        fn undo(&mut self, target: &mut Counter) -> EditActionResult {
            target.value -= 100;
            Ok(())
        }

        fn description(&self) -> &str {
            "Fail on redo"
        }
    }

    #[derive(Debug)]
    struct FailingUndo;

    impl EditAction<Counter> for FailingUndo {
        fn apply(&mut self, _target: &mut Counter) -> EditActionResult {
            Ok(())
        }

        fn undo(&mut self, _target: &mut Counter) -> EditActionResult {
            Err(EditActionError::Custom("cannot undo".into()))
        }

        fn description(&self) -> &str {
            "Failing undo"
        }
    }

    fn history_with(names: &[&'static str], counter: &mut Counter) -> EditActionHistory<Counter> {
        let mut history = EditActionHistory::new(DEFAULT_MAX_UNDO);
        for name in names {
            history.execute(Box::new(Named(name)), counter).unwrap();
        }
        history
    }

    #[test]
    fn execute_applies_and_pushes() {
        let mut history = EditActionHistory::new(DEFAULT_MAX_UNDO);
        let mut counter = Counter { value: 0 };

        history
            .execute(Box::new(Add { amount: 5 }), &mut counter)
            .unwrap();
        assert_eq!(counter.value, 5);
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.redo_count(), 0);
    }

    #[test]
    fn undo_reverses_and_moves_to_redo() {
        let mut history = EditActionHistory::new(DEFAULT_MAX_UNDO);
        let mut counter = Counter { value: 0 };

        history
            .execute(Box::new(Add { amount: 5 }), &mut counter)
            .unwrap();
        history.undo(&mut counter).unwrap();
        assert_eq!(counter.value, 0);
        assert_eq!(history.undo_count(), 0);
        assert_eq!(history.redo_count(), 1);
        assert_eq!(history.queue_length(), 1);
    }

    #[test]
    fn redo_reapplies_and_moves_to_undo() {
        let mut history = EditActionHistory::new(DEFAULT_MAX_UNDO);
        let mut counter = Counter { value: 0 };

        history
            .execute(Box::new(Add { amount: 5 }), &mut counter)
            .unwrap();
        history.undo(&mut counter).unwrap();
        history.redo(&mut counter).unwrap();
        assert_eq!(counter.value, 5);
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.redo_count(), 0);
    }

    #[test]
    fn execute_clears_redo_stack() {
        let mut counter = Counter { value: 0 };
        let mut history = history_with(&["a", "b"], &mut counter);
        history.undo(&mut counter).unwrap();
        assert_eq!(history.redo_count(), 1);

        history.execute(Box::new(Named("c")), &mut counter).unwrap();
        assert_eq!(history.redo_count(), 0);
        assert_eq!(history.queue_length(), 2);
    }

    #[test]
    fn undo_empty_returns_error() {
        let mut history: EditActionHistory<Counter> = EditActionHistory::new(DEFAULT_MAX_UNDO);
        let mut counter = Counter { value: 0 };
        assert_eq!(
            history.undo(&mut counter),
            Err(EditActionError::NothingToUndo)
        );
    }

    #[test]
    fn redo_empty_returns_error() {
        let mut history: EditActionHistory<Counter> = EditActionHistory::new(DEFAULT_MAX_UNDO);
        let mut counter = Counter { value: 0 };
        assert_eq!(
            history.redo(&mut counter),
            Err(EditActionError::NothingToRedo)
        );
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut history = EditActionHistory::new(3);
        let mut counter = Counter { value: 0 };

        for i in 1..=5 {
            history
                .execute(Box::new(Add { amount: i }), &mut counter)
                .unwrap();
        }
        assert_eq!(counter.value, 15);
        assert_eq!(history.undo_count(), 3);

        history.undo(&mut counter).unwrap();
        history.undo(&mut counter).unwrap();
        history.undo(&mut counter).unwrap();
        assert_eq!(counter.value, 3);
        assert!(!history.can_undo());
    }

    #[test]
    fn transaction_indices_are_stable_across_undo() {
        let mut counter = Counter { value: 0 };
        let mut history = history_with(&["a", "b", "c", "d"], &mut counter);

        let titles = |h: &EditActionHistory<Counter>| -> Vec<String> {
            (0..h.queue_length())
                .filter_map(|i| h.transaction(i))
                .map(|a| a.description().to_string())
                .collect()
        };
        assert_eq!(titles(&history), ["a", "b", "c", "d"]);

        history.undo(&mut counter).unwrap();
        history.undo(&mut counter).unwrap();
        history.undo(&mut counter).unwrap();
        assert_eq!(titles(&history), ["a", "b", "c", "d"]);

        history.redo(&mut counter).unwrap();
        assert_eq!(titles(&history), ["a", "b", "c", "d"]);
        assert!(history.transaction(4).is_none());
    }

    #[test]
    fn failed_redo_advances_past_entry() {
        let mut history = EditActionHistory::new(DEFAULT_MAX_UNDO);
        let mut counter = Counter { value: 0 };
        history.execute(Box::new(Add { amount: 1 }), &mut counter).unwrap();
        history
            .execute(Box::new(FailOnRedo { applied_once: false }), &mut counter)
            .unwrap();
        history.execute(Box::new(Add { amount: 10 }), &mut counter).unwrap();
        assert_eq!(counter.value, 111);

        while history.can_undo() {
            history.undo(&mut counter).unwrap();
        }
        assert_eq!(counter.value, 0);

        history.redo(&mut counter).unwrap();
        assert!(history.redo(&mut counter).is_err());
        history.redo(&mut counter).unwrap();
        assert_eq!(counter.value, 11);
        assert_eq!(history.undo_count(), 3);

        // The failed entry was never applied, so undoing it is a no-op.
        history.undo(&mut counter).unwrap();
        history.undo(&mut counter).unwrap();
        assert_eq!(counter.value, 1);
    }

    #[test]
    fn failed_undo_keeps_entry() {
        let mut history = EditActionHistory::new(DEFAULT_MAX_UNDO);
        let mut counter = Counter { value: 0 };
        history.execute(Box::new(FailingUndo), &mut counter).unwrap();

        assert!(history.undo(&mut counter).is_err());
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.redo_count(), 0);
    }

    #[test]
    fn descriptions() {
        let mut counter = Counter { value: 0 };
        let mut history = history_with(&["first", "second", "third"], &mut counter);
        history.undo(&mut counter).unwrap();

        let undo: Vec<&str> = history.undo_descriptions().collect();
        let redo: Vec<&str> = history.redo_descriptions().collect();
        assert_eq!(undo, ["second", "first"]);
        assert_eq!(redo, ["third"]);
    }

    #[test]
    fn clear_empties_both_stacks() {
        let mut counter = Counter { value: 0 };
        let mut history = history_with(&["a", "b"], &mut counter);
        history.undo(&mut counter).unwrap();

        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.queue_length(), 0);
    }

    #[test]
    fn failed_execute_does_not_push() {
        let mut history = EditActionHistory::new(DEFAULT_MAX_UNDO);
        let mut counter = Counter { value: 0 };

        let result = history.execute(Box::new(FailingAction), &mut counter);
        assert!(result.is_err());
        assert_eq!(history.undo_count(), 0);
    }

    #[test]
    fn debug_impl() {
        let history: EditActionHistory<Counter> = EditActionHistory::new(10);
        let debug = format!("{history:?}");
        assert!(debug.contains("EditActionHistory"));
        assert!(debug.contains("max_undo: 10"));
    }
}
