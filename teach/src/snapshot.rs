//! Isolated before/after copies of live objects.
//!
//! [`clone_all`] deep-copies objects into the scene's transient package and
//! pins them against garbage collection; [`release`] unpins them and marks
//! them as garbage. A [`SnapshotMap`] is consumed by `release`, and dropping
//! one that still holds clones is reported as a leak.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use mentor_core::scene::{ObjectFlags, ObjectId, Scene};

/// Name prefix of snapshot clones.
pub const SNAPSHOT_PREFIX: &str = "MentorTeach_Snapshot_";

/// Monotonic for the whole process so clone names never collide.
static SNAPSHOT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A clone of one live object, with the live object's identity at the time
/// the clone was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub clone: ObjectId,
    pub path: String,
    pub type_name: String,
}

/// Live object id to snapshot mapping produced by [`clone_all`].
#[derive(Debug, Default)]
#[must_use = "snapshot maps must be passed to `release`"]
pub struct SnapshotMap {
    entries: BTreeMap<ObjectId, Snapshot>,
}

impl SnapshotMap {
    pub fn get(&self, live: ObjectId) -> Option<&Snapshot> {
        self.entries.get(&live)
    }

    pub fn contains(&self, live: ObjectId) -> bool {
        self.entries.contains_key(&live)
    }

    /// Entries ordered by live object id.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Snapshot)> {
        self.entries.iter().map(|(id, snapshot)| (*id, snapshot))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for SnapshotMap {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            log::error!(
                "Snapshot map dropped without release, leaking {} clones",
                self.entries.len()
            );
        }
    }
}

/// Clones every object in `objects` that exists and is not a template.
///
/// Failures are logged and the object is left out, so the map may be
/// partial.
pub fn clone_all(scene: &mut Scene, objects: &[ObjectId]) -> SnapshotMap {
    let mut map = SnapshotMap::default();
    let outer = scene.transient_package();

    for &live in objects {
        let Some(object) = scene.get(live) else {
            log::debug!("Skipping snapshot for missing object {live}");
            continue;
        };
        if !object.is_valid() {
            continue;
        }
        if object.is_template() {
            log::trace!("Skipping snapshot for class default/archetype: {}", object.name());
            continue;
        }

        let counter = SNAPSHOT_COUNTER.fetch_add(1, Ordering::Relaxed);
        let base = format!("{SNAPSHOT_PREFIX}{}_{counter}", object.name());
        let name = scene.unique_name(Some(outer), &base);
        let path = object.path().to_string();
        let class = Arc::clone(object.class());
        let flags = object
            .flags()
            .without(ObjectFlags::CLASS_DEFAULT | ObjectFlags::ARCHETYPE)
            .with(ObjectFlags::TRANSIENT | ObjectFlags::STANDALONE);

        let clone = match scene.duplicate(live, outer, &name, flags) {
            Ok(clone) => clone,
            Err(err) => {
                log::error!("Duplicating {path} for snapshot failed: {err}");
                continue;
            }
        };

        let Some(copy) = scene.get(clone) else {
            log::error!("Snapshot of {path} vanished right after duplication");
            continue;
        };
        if !copy.is_valid() {
            log::error!("Snapshot of {path} is invalid");
            discard(scene, clone);
            continue;
        }
        if !Arc::ptr_eq(copy.class(), &class) {
            log::error!(
                "Snapshot class mismatch for {path} (expected {}, got {})",
                class.name(),
                copy.class_name()
            );
            discard(scene, clone);
            continue;
        }

        map.entries.insert(
            live,
            Snapshot {
                clone,
                path,
                type_name: class.name().to_string(),
            },
        );
    }
    map
}

/// Unpins every clone in `map` and marks it as garbage.
pub fn release(scene: &mut Scene, mut map: SnapshotMap) {
    for (_, snapshot) in std::mem::take(&mut map.entries) {
        discard(scene, snapshot.clone);
        log::trace!("Released snapshot of {}", snapshot.path);
    }
}

fn discard(scene: &mut Scene, clone: ObjectId) {
    let result = scene
        .clear_flags(clone, ObjectFlags::STANDALONE)
        .and_then(|()| scene.set_flags(clone, ObjectFlags::GARBAGE));
    if let Err(err) = result {
        log::warn!("Releasing snapshot {clone} failed: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_core::reflect::{FieldDef, TypeDef, TypeRegistry, Value};

    fn scene() -> (Scene, ObjectId) {
        let mut registry = TypeRegistry::new();
        registry.register(TypeDef::builder("Package").build());
        registry.register(
            TypeDef::builder("Actor")
                .field(FieldDef::new("Health", "int32", Value::Int(100)).editable())
                .build(),
        );
        let mut scene = Scene::new(Arc::new(registry));
        let level = scene.spawn("Package", None, "/Game/Map").unwrap();
        let actor = scene.spawn("Actor", Some(level), "Hero").unwrap();
        (scene, actor)
    }

    #[test]
    fn clones_are_pinned_transient_copies() {
        let (mut scene, actor) = scene();
        let map = clone_all(&mut scene, &[actor]);
        assert_eq!(map.len(), 1);

        let snapshot = map.get(actor).unwrap();
        assert_eq!(snapshot.path, "/Game/Map.Hero");
        assert_eq!(snapshot.type_name, "Actor");
        let clone = scene.get(snapshot.clone).unwrap();
        assert!(clone.name().starts_with("MentorTeach_Snapshot_Hero_"));
        assert!(clone
            .flags()
            .contains(ObjectFlags::TRANSIENT | ObjectFlags::STANDALONE));
        assert_eq!(clone.get("Health"), Some(&Value::Int(100)));

        assert_eq!(scene.collect_garbage(), 0);
        release(&mut scene, map);
    }

    #[test]
    fn release_marks_clones_as_garbage() {
        let (mut scene, actor) = scene();
        let map = clone_all(&mut scene, &[actor]);
        let clone = map.get(actor).unwrap().clone;
        release(&mut scene, map);

        let object = scene.get(clone).unwrap();
        assert!(!object.is_valid());
        assert!(!object.flags().contains(ObjectFlags::STANDALONE));
        assert_eq!(scene.collect_garbage(), 1);
        assert!(scene.get(actor).is_some());
    }

    #[test]
    fn templates_and_missing_objects_are_skipped() {
        let (mut scene, actor) = scene();
        let cdo = scene.class_default("Actor").unwrap().id();
        let map = clone_all(&mut scene, &[cdo, ObjectId(9999), actor]);
        assert_eq!(map.len(), 1);
        assert!(map.contains(actor));
        assert!(!map.contains(cdo));
        release(&mut scene, map);
    }

    #[test]
    fn clone_names_are_unique() {
        let (mut scene, actor) = scene();
        let first = clone_all(&mut scene, &[actor]);
        let second = clone_all(&mut scene, &[actor]);
        let a = scene.get(first.get(actor).unwrap().clone).unwrap().name().to_string();
        let b = scene.get(second.get(actor).unwrap().clone).unwrap().name().to_string();
        assert_ne!(a, b);
        release(&mut scene, first);
        release(&mut scene, second);
    }
}
