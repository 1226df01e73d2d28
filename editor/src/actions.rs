//! Undoable scene edits issued by console commands.

use std::sync::Arc;

use mentor_core::abstract_editor::{EditAction, EditActionError, EditActionResult};
use mentor_core::reflect::{TypeDef, Value};
use mentor_core::scene::{Object, ObjectId, Scene, SceneError};

// ---------------------------------------------------------------------------
// Set property
// ---------------------------------------------------------------------------

/// Assigns one field, remembering the previous value.
#[derive(Debug)]
pub struct SetPropertyAction {
    object: ObjectId,
    field: String,
    old: Value,
    new: Value,
    title: String,
}

impl SetPropertyAction {
    /// Captures the field's current value as the undo state.
    pub fn new(
        scene: &Scene,
        object: ObjectId,
        field: impl Into<String>,
        new: Value,
    ) -> Result<Self, SceneError> {
        let field = field.into();
        let target = scene.get(object).ok_or(SceneError::ObjectNotFound(object))?;
        let old = target
            .get(&field)
            .cloned()
            .ok_or_else(|| SceneError::FieldNotFound {
                type_name: target.class_name().to_string(),
                field: field.clone(),
            })?;
        Ok(Self {
            title: format!("Set {field}"),
            object,
            field,
            old,
            new,
        })
    }
}

impl EditAction<Scene> for SetPropertyAction {
    fn apply(&mut self, scene: &mut Scene) -> EditActionResult {
        scene.set_field(self.object, &self.field, self.new.clone())?;
        Ok(())
    }

    fn undo(&mut self, scene: &mut Scene) -> EditActionResult {
        scene.set_field(self.object, &self.field, self.old.clone())?;
        Ok(())
    }

    fn description(&self) -> &str {
        &self.title
    }

    fn context(&self) -> &str {
        "Details"
    }

    fn touched(&self) -> Vec<ObjectId> {
        vec![self.object]
    }
}

// ---------------------------------------------------------------------------
// Spawn / destroy
// ---------------------------------------------------------------------------

/// Spawns a new object. Redo brings back the same id.
#[derive(Debug)]
pub struct SpawnAction {
    type_name: String,
    outer: Option<ObjectId>,
    name: String,
    spawned: Option<ObjectId>,
    title: String,
}

impl SpawnAction {
    pub fn new(type_name: impl Into<String>, outer: Option<ObjectId>, name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            title: format!("Spawn {type_name}"),
            type_name,
            outer,
            name: name.into(),
            spawned: None,
        }
    }

    /// Id of the spawned object, once applied.
    pub fn spawned(&self) -> Option<ObjectId> {
        self.spawned
    }
}

impl EditAction<Scene> for SpawnAction {
    fn apply(&mut self, scene: &mut Scene) -> EditActionResult {
        match self.spawned {
            Some(id) => scene.spawn_as(id, &self.type_name, self.outer, &self.name)?,
            None => self.spawned = Some(scene.spawn(&self.type_name, self.outer, &self.name)?),
        }
        Ok(())
    }

    fn undo(&mut self, scene: &mut Scene) -> EditActionResult {
        let id = self
            .spawned
            .ok_or_else(|| EditActionError::InvalidState("spawn was never applied".into()))?;
        scene.remove(id)?;
        Ok(())
    }

    fn description(&self) -> &str {
        &self.title
    }

    fn context(&self) -> &str {
        "Outliner"
    }

    fn touched(&self) -> Vec<ObjectId> {
        self.spawned.into_iter().collect()
    }
}

/// Removes an object and its subobjects. Undo restores them with their ids.
#[derive(Debug)]
pub struct DestroyAction {
    object: ObjectId,
    removed: Vec<Object>,
}

impl DestroyAction {
    pub fn new(object: ObjectId) -> Self {
        Self {
            object,
            removed: Vec::new(),
        }
    }
}

impl EditAction<Scene> for DestroyAction {
    fn apply(&mut self, scene: &mut Scene) -> EditActionResult {
        self.removed = scene.remove(self.object)?;
        Ok(())
    }

    fn undo(&mut self, scene: &mut Scene) -> EditActionResult {
        if self.removed.is_empty() {
            return Err(EditActionError::InvalidState("nothing to restore".into()));
        }
        scene.restore(std::mem::take(&mut self.removed))?;
        Ok(())
    }

    fn description(&self) -> &str {
        "Destroy object"
    }

    fn context(&self) -> &str {
        "Outliner"
    }

    fn touched(&self) -> Vec<ObjectId> {
        vec![self.object]
    }
}

// ---------------------------------------------------------------------------
// Retype
// ---------------------------------------------------------------------------

/// Changes an object's type, carrying over compatible field values.
#[derive(Debug)]
pub struct RetypeAction {
    object: ObjectId,
    type_name: String,
    previous: Option<(Arc<TypeDef>, Vec<Value>)>,
    title: String,
}

impl RetypeAction {
    pub fn new(object: ObjectId, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            title: format!("Change type to {type_name}"),
            object,
            type_name,
            previous: None,
        }
    }
}

impl EditAction<Scene> for RetypeAction {
    fn apply(&mut self, scene: &mut Scene) -> EditActionResult {
        self.previous = Some(scene.retype(self.object, &self.type_name)?);
        Ok(())
    }

    fn undo(&mut self, scene: &mut Scene) -> EditActionResult {
        let (class, values) = self
            .previous
            .take()
            .ok_or_else(|| EditActionError::InvalidState("retype was never applied".into()))?;
        scene.replace_class(self.object, class, values)?;
        Ok(())
    }

    fn description(&self) -> &str {
        &self.title
    }

    fn context(&self) -> &str {
        "Details"
    }

    fn touched(&self) -> Vec<ObjectId> {
        vec![self.object]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;

    #[test]
    fn set_property_round_trips() {
        let (mut scene, ids) = demo::demo_scene().unwrap();
        let mut action =
            SetPropertyAction::new(&scene, ids.door, "Health", Value::Int(5)).unwrap();
        action.apply(&mut scene).unwrap();
        assert_eq!(scene.get(ids.door).unwrap().get("Health"), Some(&Value::Int(5)));
        action.undo(&mut scene).unwrap();
        assert_eq!(scene.get(ids.door).unwrap().get("Health"), Some(&Value::Int(250)));
        assert_eq!(action.description(), "Set Health");
    }

    #[test]
    fn set_property_rejects_unknown_field() {
        let (scene, ids) = demo::demo_scene().unwrap();
        assert!(matches!(
            SetPropertyAction::new(&scene, ids.door, "Nope", Value::Int(1)),
            Err(SceneError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn spawn_redo_reuses_id() {
        let (mut scene, ids) = demo::demo_scene().unwrap();
        let mut action = SpawnAction::new("StaticMeshActor", Some(ids.level), "Crate");
        action.apply(&mut scene).unwrap();
        let id = action.spawned().unwrap();
        action.undo(&mut scene).unwrap();
        assert!(scene.get(id).is_none());
        action.apply(&mut scene).unwrap();
        assert_eq!(scene.get(id).unwrap().path(), "/Game/Maps/Demo.Crate");
        assert_eq!(action.touched(), vec![id]);
    }

    #[test]
    fn destroy_restores_subobjects() {
        let (mut scene, ids) = demo::demo_scene().unwrap();
        let before = scene.len();
        let mut action = DestroyAction::new(ids.door);
        action.apply(&mut scene).unwrap();
        assert!(scene.len() < before);
        action.undo(&mut scene).unwrap();
        assert_eq!(scene.len(), before);
        assert!(scene.get(ids.door).is_some());
    }

    #[test]
    fn retype_undo_restores_type_and_values() {
        let (mut scene, ids) = demo::demo_scene().unwrap();
        let mut action = RetypeAction::new(ids.door, "StaticMeshActor");
        action.apply(&mut scene).unwrap();
        assert_eq!(scene.get(ids.door).unwrap().class_name(), "StaticMeshActor");
        action.undo(&mut scene).unwrap();
        assert_eq!(scene.get(ids.door).unwrap().class_name(), "BP_Door_C");
        assert_eq!(scene.get(ids.door).unwrap().get("bIsOpen"), Some(&Value::Bool(false)));
    }

    #[test]
    fn missing_target_maps_to_target_not_found() {
        let (mut scene, _ids) = demo::demo_scene().unwrap();
        let mut action = DestroyAction::new(ObjectId(9999));
        assert!(matches!(
            action.apply(&mut scene),
            Err(EditActionError::TargetNotFound(_))
        ));
    }
}
