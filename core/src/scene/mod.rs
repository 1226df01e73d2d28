//! Live object store edited through the undo history.
//!
//! - [`Scene`]: owns every [`Object`], indexed by [`ObjectId`]
//! - [`Object`]: an instance of a reflected [`TypeDef`]
//! - [`ObjectFlags`]: lifecycle markers (templates, transient, garbage)
//! - [`SceneError`]: failures of scene operations
//!
//! Objects form an ownership tree through their `outer` link. Removing or
//! collecting an object takes its subobjects with it, and duplicating an
//! object deep-copies the subobjects it owns through strong references.

mod object;

pub use object::{Object, ObjectFlags, ObjectId};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;

use crate::abstract_editor::{EditActionError, Editable};
use crate::reflect::{FieldKind, TypeDef, TypeRegistry, Value};

/// Name of the container holding transient objects.
pub const TRANSIENT_PACKAGE: &str = "/Engine/Transient";

/// Name prefix of class-default objects.
pub const CLASS_DEFAULT_PREFIX: &str = "Default__";

/// Errors from scene operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("unknown type '{0}'")]
    UnknownType(String),
    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),
    #[error("no object at path '{0}'")]
    PathNotFound(String),
    #[error("type '{type_name}' has no field '{field}'")]
    FieldNotFound { type_name: String, field: String },
    #[error("field '{field}' holds {expected}, got {found}")]
    KindMismatch {
        field: String,
        expected: FieldKind,
        found: FieldKind,
    },
    #[error("name '{0}' is already taken")]
    NameTaken(String),
    #[error("object id {0} is already in use")]
    IdInUse(ObjectId),
}

impl From<SceneError> for EditActionError {
    fn from(err: SceneError) -> Self {
        match err {
            SceneError::ObjectNotFound(id) => Self::TargetNotFound(format!("object {id}")),
            SceneError::PathNotFound(path) => Self::TargetNotFound(path),
            other => Self::InvalidState(other.to_string()),
        }
    }
}

/// The editable object store.
pub struct Scene {
    registry: Arc<TypeRegistry>,
    objects: BTreeMap<ObjectId, Object>,
    next_id: u64,
    transient_package: ObjectId,
}

impl Editable for Scene {
    type Key = ObjectId;
}

impl Scene {
    /// Creates a scene with the transient package and one class-default
    /// object per registered type.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        let package_class = registry
            .get("Package")
            .cloned()
            .unwrap_or_else(|| Arc::new(TypeDef::builder("Package").build()));

        let mut scene = Self {
            registry,
            objects: BTreeMap::new(),
            next_id: 1,
            transient_package: ObjectId(0),
        };

        scene.transient_package = scene.insert_new(
            package_class,
            None,
            TRANSIENT_PACKAGE.to_string(),
            ObjectFlags::TRANSIENT | ObjectFlags::STANDALONE,
        );

        let types: Vec<Arc<TypeDef>> = scene.registry.iter().cloned().collect();
        for class in types {
            let name = format!("{CLASS_DEFAULT_PREFIX}{}", class.name());
            scene.insert_new(
                class,
                None,
                name,
                ObjectFlags::CLASS_DEFAULT | ObjectFlags::STANDALONE,
            );
        }

        log::debug!("Scene created with {} class defaults", scene.objects.len() - 1);
        scene
    }

    fn insert_new(
        &mut self,
        class: Arc<TypeDef>,
        outer: Option<ObjectId>,
        name: String,
        flags: ObjectFlags,
    ) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let path = self.child_path(outer, &name);
        let values = class.default_values();
        self.objects.insert(
            id,
            Object {
                id,
                name,
                outer,
                path,
                class,
                flags,
                values,
            },
        );
        id
    }

    fn child_path(&self, outer: Option<ObjectId>, name: &str) -> String {
        match outer.and_then(|o| self.objects.get(&o)) {
            Some(parent) => format!("{}.{}", parent.path, name),
            None => name.to_string(),
        }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Container for transient objects such as snapshots.
    pub fn transient_package(&self) -> ObjectId {
        self.transient_package
    }

    /// Spawns a new object with default field values.
    pub fn spawn(
        &mut self,
        type_name: &str,
        outer: Option<ObjectId>,
        name: &str,
    ) -> Result<ObjectId, SceneError> {
        let class = self.resolve_type(type_name)?;
        self.check_spawn(outer, name)?;
        Ok(self.insert_new(class, outer, name.to_string(), ObjectFlags::NONE))
    }

    /// Spawns an object with a caller-chosen id, used to redo a spawn so
    /// that later records referring to the id stay valid.
    pub fn spawn_as(
        &mut self,
        id: ObjectId,
        type_name: &str,
        outer: Option<ObjectId>,
        name: &str,
    ) -> Result<(), SceneError> {
        if self.objects.contains_key(&id) {
            return Err(SceneError::IdInUse(id));
        }
        let class = self.resolve_type(type_name)?;
        self.check_spawn(outer, name)?;
        let path = self.child_path(outer, name);
        let values = class.default_values();
        self.objects.insert(
            id,
            Object {
                id,
                name: name.to_string(),
                outer,
                path,
                class,
                flags: ObjectFlags::NONE,
                values,
            },
        );
        self.next_id = self.next_id.max(id.0 + 1);
        Ok(())
    }

    fn resolve_type(&self, type_name: &str) -> Result<Arc<TypeDef>, SceneError> {
        self.registry
            .get(type_name)
            .cloned()
            .ok_or_else(|| SceneError::UnknownType(type_name.to_string()))
    }

    fn check_spawn(&self, outer: Option<ObjectId>, name: &str) -> Result<(), SceneError> {
        if let Some(outer) = outer {
            if !self.objects.contains_key(&outer) {
                return Err(SceneError::ObjectNotFound(outer));
            }
        }
        if self.name_taken(outer, name) {
            return Err(SceneError::NameTaken(name.to_string()));
        }
        Ok(())
    }

    fn name_taken(&self, outer: Option<ObjectId>, name: &str) -> bool {
        self.objects
            .values()
            .any(|o| o.outer == outer && o.name == name)
    }

    /// Returns `base` if free under `outer`, otherwise `base_<n>` with the
    /// smallest free `n`.
    pub fn unique_name(&self, outer: Option<ObjectId>, base: &str) -> String {
        if !self.name_taken(outer, base) {
            return base.to_string();
        }
        let mut n = 1u64;
        loop {
            let candidate = format!("{base}_{n}");
            if !self.name_taken(outer, &candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn find_by_path(&self, path: &str) -> Option<&Object> {
        self.objects.values().find(|o| o.path == path)
    }

    /// The class-default object of `type_name`.
    pub fn class_default(&self, type_name: &str) -> Option<&Object> {
        self.objects.values().find(|o| {
            o.flags.contains(ObjectFlags::CLASS_DEFAULT) && o.class.name() == type_name
        })
    }

    /// All objects in id order.
    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Direct subobjects of `id`.
    pub fn children(&self, id: ObjectId) -> Vec<ObjectId> {
        self.objects
            .values()
            .filter(|o| o.outer == Some(id))
            .map(|o| o.id)
            .collect()
    }

    /// `id` followed by all objects it transitively owns, owners first.
    pub fn subtree(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut out = vec![id];
        let mut cursor = 0;
        while cursor < out.len() {
            let children = self.children(out[cursor]);
            out.extend(children);
            cursor += 1;
        }
        out
    }

    /// Sets a field, returning the previous value.
    pub fn set_field(
        &mut self,
        id: ObjectId,
        field: &str,
        value: Value,
    ) -> Result<Value, SceneError> {
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(SceneError::ObjectNotFound(id))?;
        let index = object
            .class
            .field_index(field)
            .ok_or_else(|| SceneError::FieldNotFound {
                type_name: object.class.name().to_string(),
                field: field.to_string(),
            })?;
        let slot = &mut object.values[index];
        if slot.kind() != value.kind() {
            return Err(SceneError::KindMismatch {
                field: field.to_string(),
                expected: slot.kind(),
                found: value.kind(),
            });
        }
        Ok(std::mem::replace(slot, value))
    }

    pub fn set_flags(&mut self, id: ObjectId, flags: ObjectFlags) -> Result<(), SceneError> {
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(SceneError::ObjectNotFound(id))?;
        object.flags = object.flags.with(flags);
        Ok(())
    }

    pub fn clear_flags(&mut self, id: ObjectId, flags: ObjectFlags) -> Result<(), SceneError> {
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(SceneError::ObjectNotFound(id))?;
        object.flags = object.flags.without(flags);
        Ok(())
    }

    /// Removes an object with everything it owns, returning the removed
    /// objects owners first so they can be [`restore`](Self::restore)d.
    pub fn remove(&mut self, id: ObjectId) -> Result<Vec<Object>, SceneError> {
        if !self.objects.contains_key(&id) {
            return Err(SceneError::ObjectNotFound(id));
        }
        Ok(self
            .subtree(id)
            .into_iter()
            .filter_map(|id| self.objects.remove(&id))
            .collect())
    }

    /// Reinserts objects previously returned by [`remove`](Self::remove).
    pub fn restore(&mut self, objects: Vec<Object>) -> Result<(), SceneError> {
        if let Some(taken) = objects.iter().find(|o| self.objects.contains_key(&o.id)) {
            return Err(SceneError::IdInUse(taken.id));
        }
        for object in objects {
            self.next_id = self.next_id.max(object.id.0 + 1);
            self.objects.insert(object.id, object);
        }
        Ok(())
    }

    /// Changes the type of an object. Values of fields that keep the same
    /// name and declaration are carried over; the rest take the new type's
    /// defaults. Returns the previous type and values.
    pub fn retype(
        &mut self,
        id: ObjectId,
        type_name: &str,
    ) -> Result<(Arc<TypeDef>, Vec<Value>), SceneError> {
        let class = self.resolve_type(type_name)?;
        let object = self.objects.get(&id).ok_or(SceneError::ObjectNotFound(id))?;
        let mut values = class.default_values();
        for (new_field, slot) in class.fields().into_iter().zip(values.iter_mut()) {
            let carried = object
                .fields()
                .find(|(old_field, _)| {
                    old_field.name == new_field.name && old_field.same_declaration(new_field)
                })
                .map(|(_, value)| value.clone());
            if let Some(value) = carried {
                *slot = value;
            }
        }
        self.replace_class(id, class, values)
    }

    /// Swaps an object's type and values wholesale, returning the old ones.
    pub fn replace_class(
        &mut self,
        id: ObjectId,
        class: Arc<TypeDef>,
        values: Vec<Value>,
    ) -> Result<(Arc<TypeDef>, Vec<Value>), SceneError> {
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(SceneError::ObjectNotFound(id))?;
        let old_class = std::mem::replace(&mut object.class, class);
        let old_values = std::mem::replace(&mut object.values, values);
        Ok((old_class, old_values))
    }

    /// Deep-copies `source` into `outer` under `name`.
    ///
    /// Subobjects owned by `source` and referenced through strong
    /// references are duplicated as well, and the copy's references are
    /// rewired to the duplicated subobjects. All other references keep
    /// pointing at the original targets.
    pub fn duplicate(
        &mut self,
        source: ObjectId,
        outer: ObjectId,
        name: &str,
        flags: ObjectFlags,
    ) -> Result<ObjectId, SceneError> {
        let template = self
            .objects
            .get(&source)
            .cloned()
            .ok_or(SceneError::ObjectNotFound(source))?;
        self.check_spawn(Some(outer), name)?;

        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let path = self.child_path(Some(outer), name);
        self.objects.insert(
            id,
            Object {
                id,
                name: name.to_string(),
                outer: Some(outer),
                path,
                class: Arc::clone(&template.class),
                flags,
                values: template.values.clone(),
            },
        );

        let mut remap = HashMap::new();
        for child in template.values.iter().flat_map(Value::strong_refs) {
            if remap.contains_key(&child) {
                continue;
            }
            let owned = self
                .objects
                .get(&child)
                .filter(|c| c.outer == Some(source))
                .map(|c| c.name.clone());
            if let Some(child_name) = owned {
                let copy = self.duplicate(child, id, &child_name, flags)?;
                remap.insert(child, copy);
            }
        }

        if !remap.is_empty() {
            if let Some(copy) = self.objects.get_mut(&id) {
                for value in &mut copy.values {
                    value.remap_strong_refs(&|old| remap.get(&old).copied());
                }
            }
        }
        Ok(id)
    }

    /// Removes every object marked as garbage that is not standalone,
    /// together with its subobjects. Returns the number of objects removed.
    pub fn collect_garbage(&mut self) -> usize {
        let doomed: Vec<ObjectId> = self
            .objects
            .values()
            .filter(|o| {
                o.flags.contains(ObjectFlags::GARBAGE) && !o.flags.contains(ObjectFlags::STANDALONE)
            })
            .map(|o| o.id)
            .collect();
        let mut removed = 0;
        for id in doomed {
            if let Ok(objects) = self.remove(id) {
                removed += objects.len();
            }
        }
        if removed > 0 {
            log::debug!("Garbage collection removed {removed} objects");
        }
        removed
    }
}
