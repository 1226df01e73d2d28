//! Field-by-field comparison of object snapshots.
//!
//! Reference fields follow their own equality rules:
//!
//! | kind       | reported when                                             |
//! |------------|-----------------------------------------------------------|
//! | strong ref | exactly one side is null, or the targets' types differ    |
//! | weak ref   | exactly one side is null, or the targets' paths differ    |
//! | path ref   | the stored paths differ                                   |
//!
//! Strong references deliberately ignore target identity: snapshot clones
//! own fresh copies of their subobjects, so identities never match across
//! two snapshots. Reassigning a reference to another object of the same
//! type therefore goes unreported.
//!
//! Every other kind uses bit-level structural equality.

use std::collections::HashMap;

use mentor_core::dump::format_value;
use mentor_core::reflect::{FieldDef, Value};
use mentor_core::scene::{Object, ObjectId, Scene};

use crate::diff::{ObjectDiff, PropertyDiff};
use crate::snapshot::SnapshotMap;

/// Compares two objects over the union of their field names.
///
/// Fields of `old` come first in declaration order, followed by fields
/// only `new` has.
pub fn diff_objects(scene: &Scene, old: &Object, new: &Object) -> Vec<PropertyDiff> {
    let mut diffs = Vec::new();
    let old_fields = field_map(old);
    let new_fields = field_map(new);

    for (old_field, old_value) in old.fields() {
        let Some(&(new_field, new_value)) = new_fields.get(old_field.name.as_str()) else {
            diffs.push(PropertyDiff::removed(
                old_field.name.clone(),
                export(scene, old_field, old_value),
            ));
            continue;
        };

        if old_field.kind != new_field.kind {
            diffs.push(PropertyDiff::changed(
                old_field.name.clone(),
                format!(
                    "{} (type: {})",
                    export(scene, old_field, old_value),
                    old_field.kind.property_class()
                ),
                format!(
                    "{} (type: {})",
                    export(scene, new_field, new_value),
                    new_field.kind.property_class()
                ),
            ));
            continue;
        }

        if values_differ(scene, old_value, new_value) {
            diffs.push(PropertyDiff::changed(
                old_field.name.clone(),
                export(scene, old_field, old_value),
                export(scene, new_field, new_value),
            ));
        }
    }

    for (new_field, new_value) in new.fields() {
        if !old_fields.contains_key(new_field.name.as_str()) {
            diffs.push(PropertyDiff::added(
                new_field.name.clone(),
                export(scene, new_field, new_value),
            ));
        }
    }

    diffs
}

fn field_map(object: &Object) -> HashMap<&str, (&FieldDef, &Value)> {
    object
        .fields()
        .map(|(field, value)| (field.name.as_str(), (field, value)))
        .collect()
}

fn export(scene: &Scene, field: &FieldDef, value: &Value) -> String {
    format_value(scene, Some(field), Some(value), false, false, None)
}

/// Whether two values of the same field kind count as different.
pub fn values_differ(scene: &Scene, old: &Value, new: &Value) -> bool {
    match (old, new) {
        (Value::Object(a), Value::Object(b)) => {
            let a = a.and_then(|id| scene.get(id));
            let b = b.and_then(|id| scene.get(id));
            match (a, b) {
                (Some(a), Some(b)) => a.class_name() != b.class_name(),
                (None, None) => false,
                _ => true,
            }
        }
        (Value::WeakObject(a), Value::WeakObject(b)) => {
            let a = resolve_path(scene, *a);
            let b = resolve_path(scene, *b);
            a != b
        }
        (Value::SoftObject(a), Value::SoftObject(b)) => a != b,
        _ => !old.identical(new),
    }
}

fn resolve_path(scene: &Scene, id: Option<ObjectId>) -> Option<&str> {
    id.and_then(|id| scene.get(id)).map(Object::path)
}

/// Diffs two snapshot maps taken around one transaction.
///
/// Objects only in `before` are reported removed, objects only in `after`
/// added. Only diffs with differences are returned.
pub fn diff_object_sets(scene: &Scene, before: &SnapshotMap, after: &SnapshotMap) -> Vec<ObjectDiff> {
    let mut result = Vec::new();

    for (live, old_snapshot) in before.iter() {
        let mut object = ObjectDiff::new(old_snapshot.path.clone(), old_snapshot.type_name.clone());
        match after.get(live) {
            None => object.object_removed = true,
            Some(new_snapshot) => {
                let (Some(old), Some(new)) = (
                    scene.get(old_snapshot.clone),
                    scene.get(new_snapshot.clone),
                ) else {
                    log::error!("Snapshot of {} is no longer in the scene", old_snapshot.path);
                    continue;
                };
                object.type_name = new_snapshot.type_name.clone();
                object.properties = diff_objects(scene, old, new);
            }
        }
        if object.has_differences() {
            result.push(object);
        }
    }

    for (live, new_snapshot) in after.iter() {
        if !before.contains(live) {
            let mut object =
                ObjectDiff::new(new_snapshot.path.clone(), new_snapshot.type_name.clone());
            object.object_added = true;
            result.push(object);
        }
    }

    result
}
