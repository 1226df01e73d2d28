//! The edit-history service the recorder drives.
//!
//! The recorder never reaches into globals: whoever owns the scene and its
//! undo history hands it over as a [`TransactionHost`]. [`SceneHost`] is the
//! standard implementation over a [`Scene`] and an [`EditActionHistory`].

use mentor_core::abstract_editor::{
    EditAction, EditActionHistory, EditActionResult, DEFAULT_MAX_UNDO,
};
use mentor_core::scene::{ObjectId, Scene};

/// What the recorder needs to know about one historical transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub title: String,
    pub context: String,
    pub objects: Vec<ObjectId>,
}

/// Access to an undo/redo history and the scene it edits.
///
/// Queue positions are stable: position `0` is the oldest transaction that
/// can still be undone, and positions past the undo stack continue into the
/// redo stack.
pub trait TransactionHost {
    /// Total number of transactions, or `None` if the history is not
    /// available.
    fn queue_length(&self) -> Option<usize>;

    /// Number of transactions that are currently applied.
    fn undo_count(&self) -> usize;

    fn undo(&mut self) -> EditActionResult;

    fn redo(&mut self) -> EditActionResult;

    /// The transaction at queue position `index`.
    fn transaction(&self, index: usize) -> Option<TransactionRecord>;

    fn scene(&self) -> &Scene;

    fn scene_mut(&mut self) -> &mut Scene;
}

/// A scene paired with its undo history.
pub struct SceneHost {
    scene: Scene,
    history: EditActionHistory<Scene>,
}

impl SceneHost {
    pub fn new(scene: Scene) -> Self {
        Self::with_max_undo(scene, DEFAULT_MAX_UNDO)
    }

    pub fn with_max_undo(scene: Scene, max_undo: usize) -> Self {
        Self {
            scene,
            history: EditActionHistory::new(max_undo),
        }
    }

    /// Applies an action and records it in the history.
    pub fn execute(&mut self, action: Box<dyn EditAction<Scene>>) -> EditActionResult {
        let description = action.description().to_string();
        self.history.execute(action, &mut self.scene)?;
        log::debug!("Executed '{description}'");
        Ok(())
    }

    pub fn history(&self) -> &EditActionHistory<Scene> {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut EditActionHistory<Scene> {
        &mut self.history
    }
}

impl TransactionHost for SceneHost {
    fn queue_length(&self) -> Option<usize> {
        Some(self.history.queue_length())
    }

    fn undo_count(&self) -> usize {
        self.history.undo_count()
    }

    fn undo(&mut self) -> EditActionResult {
        self.history.undo(&mut self.scene)
    }

    fn redo(&mut self) -> EditActionResult {
        self.history.redo(&mut self.scene)
    }

    fn transaction(&self, index: usize) -> Option<TransactionRecord> {
        self.history.transaction(index).map(|action| TransactionRecord {
            title: action.description().to_string(),
            context: action.context().to_string(),
            objects: action.touched(),
        })
    }

    fn scene(&self) -> &Scene {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }
}
