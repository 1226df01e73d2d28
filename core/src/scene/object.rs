//! Scene objects and their identity.

use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::reflect::{FieldDef, TypeDef, Value};

/// Stable identity of an object within a [`Scene`](super::Scene).
///
/// Ids are never reused while the scene is alive, so an id held by an undo
/// record stays valid across destroy/restore cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle markers on an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjectFlags(pub u32);

impl ObjectFlags {
    pub const NONE: Self = Self(0);
    /// The per-type default object holding field defaults.
    pub const CLASS_DEFAULT: Self = Self(1 << 0);
    /// Template shared by instances (e.g. component templates of an asset).
    pub const ARCHETYPE: Self = Self(1 << 1);
    /// Lives in the transient package and is never saved.
    pub const TRANSIENT: Self = Self(1 << 2);
    /// Exempt from garbage collection.
    pub const STANDALONE: Self = Self(1 << 3);
    /// Scheduled for removal on the next garbage collection.
    pub const GARBAGE: Self = Self(1 << 4);

    #[inline]
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub const fn intersects(&self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    #[inline]
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for ObjectFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A live instance of a reflected type.
///
/// `values` holds one entry per field of `class`, in
/// [`TypeDef::fields`] order.
#[derive(Debug, Clone)]
pub struct Object {
    pub(crate) id: ObjectId,
    pub(crate) name: String,
    pub(crate) outer: Option<ObjectId>,
    pub(crate) path: String,
    pub(crate) class: Arc<TypeDef>,
    pub(crate) flags: ObjectFlags,
    pub(crate) values: Vec<Value>,
}

impl Object {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The object that owns this one, if any.
    pub fn outer(&self) -> Option<ObjectId> {
        self.outer
    }

    /// Dotted path from the outermost owner, e.g. `/Game/Maps/Demo.Door`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn class(&self) -> &Arc<TypeDef> {
        &self.class
    }

    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    pub fn flags(&self) -> ObjectFlags {
        self.flags
    }

    /// Class-default and archetype objects are shared templates.
    pub fn is_template(&self) -> bool {
        self.flags
            .intersects(ObjectFlags::CLASS_DEFAULT | ObjectFlags::ARCHETYPE)
    }

    /// `false` once the object has been marked as garbage.
    pub fn is_valid(&self) -> bool {
        !self.flags.contains(ObjectFlags::GARBAGE)
    }

    /// Current value of a field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.class
            .field_index(field)
            .and_then(|index| self.values.get(index))
    }

    /// Fields paired with their current values, inherited fields first.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldDef, &Value)> {
        self.class.fields().into_iter().zip(self.values.iter())
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_flags_ops() {
        let flags = ObjectFlags::TRANSIENT | ObjectFlags::STANDALONE;
        assert!(flags.contains(ObjectFlags::TRANSIENT));
        assert!(!flags.contains(ObjectFlags::GARBAGE));
        let flags = flags.without(ObjectFlags::STANDALONE).with(ObjectFlags::GARBAGE);
        assert!(!flags.contains(ObjectFlags::STANDALONE));
        assert!(flags.intersects(ObjectFlags::GARBAGE | ObjectFlags::ARCHETYPE));
    }

    #[test]
    fn object_id_display() {
        assert_eq!(ObjectId(7).to_string(), "#7");
    }
}
