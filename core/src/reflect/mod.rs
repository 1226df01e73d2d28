//! Registered-schema reflection for scene objects.
//!
//! Every object type is described once by a [`TypeDef`]: its name, an
//! optional parent type, and the [`FieldDef`]s it declares. Objects store
//! one [`Value`] per field of their type (inherited fields first), so the
//! schema is the only thing needed to enumerate, compare and print them.
//!
//! Types are collected in a [`TypeRegistry`] that is built once at startup
//! and shared read-only afterwards.

mod value;

pub use value::{DelegateBinding, Value};

use std::collections::BTreeMap;
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

/// Classification of a reflected field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    String,
    Enum,
    Struct,
    /// Owning object reference.
    StrongRef,
    /// Non-owning object reference resolved by identity.
    WeakRef,
    /// Path-based reference to a possibly-unloaded object.
    PathRef,
    Array,
    Set,
    Map,
    /// Callback binding (single or multicast).
    Delegate,
    Other,
}

impl FieldKind {
    /// Name of the property class reported in property dumps.
    pub fn property_class(self) -> &'static str {
        match self {
            Self::Bool => "BoolProperty",
            Self::Int => "IntProperty",
            Self::Float => "DoubleProperty",
            Self::String => "StrProperty",
            Self::Enum => "EnumProperty",
            Self::Struct => "StructProperty",
            Self::StrongRef => "ObjectProperty",
            Self::WeakRef => "WeakObjectProperty",
            Self::PathRef => "SoftObjectProperty",
            Self::Array => "ArrayProperty",
            Self::Set => "SetProperty",
            Self::Map => "MapProperty",
            Self::Delegate => "DelegateProperty",
            Self::Other => "Property",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.property_class())
    }
}

/// Editor-facing markers on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldFlags(pub u32);

impl FieldFlags {
    pub const NONE: Self = Self(0);
    /// Editable in the details panel.
    pub const EDIT: Self = Self(1 << 0);
    /// Readable (and writable unless read-only) from scripts.
    pub const BLUEPRINT_VISIBLE: Self = Self(1 << 1);
    /// Shown but not editable.
    pub const EDIT_CONST: Self = Self(1 << 2);
    pub const BLUEPRINT_READ_ONLY: Self = Self(1 << 3);
    pub const DISABLE_EDIT_ON_INSTANCE: Self = Self(1 << 4);
    pub const DISABLE_EDIT_ON_TEMPLATE: Self = Self(1 << 5);
    /// Delegate that scripts can bind to.
    pub const BLUEPRINT_ASSIGNABLE: Self = Self(1 << 6);
    /// Delegate that scripts can call.
    pub const BLUEPRINT_CALLABLE: Self = Self(1 << 7);

    const EDITABLE_MARKERS: u32 = Self::EDIT.0 | Self::BLUEPRINT_VISIBLE.0;
    const READ_ONLY_MARKERS: u32 = Self::EDIT_CONST.0
        | Self::BLUEPRINT_READ_ONLY.0
        | Self::DISABLE_EDIT_ON_INSTANCE.0
        | Self::DISABLE_EDIT_ON_TEMPLATE.0;
    const VISIBLE_MARKERS: u32 = Self::EDITABLE_MARKERS
        | Self::BLUEPRINT_ASSIGNABLE.0
        | Self::BLUEPRINT_CALLABLE.0;

    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// A field is user-editable iff it carries at least one editable marker
    /// and none of the read-only markers.
    #[inline]
    pub const fn is_editable(&self) -> bool {
        (self.0 & Self::READ_ONLY_MARKERS) == 0 && (self.0 & Self::EDITABLE_MARKERS) != 0
    }

    /// Visible to the user in any form (editable, read-only or bindable).
    #[inline]
    pub const fn is_visible(&self) -> bool {
        (self.0 & Self::VISIBLE_MARKERS) != 0
    }
}

impl BitOr for FieldFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Declaration of one field of a type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    /// Declared type as shown to users, e.g. `float` or `TArray<FName>`.
    pub type_name: String,
    pub flags: FieldFlags,
    /// Value the field holds on a freshly spawned object.
    pub default: Value,
}

impl FieldDef {
    /// Creates a field with no flags. The kind is taken from `default`.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            kind: default.kind(),
            type_name: type_name.into(),
            flags: FieldFlags::NONE,
            default,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: FieldFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Shorthand for a details-panel editable, script read-write field.
    #[must_use]
    pub fn editable(self) -> Self {
        self.with_flags(FieldFlags::EDIT | FieldFlags::BLUEPRINT_VISIBLE)
    }

    /// Same kind and declared type; the field can be compared by value.
    pub fn same_declaration(&self, other: &FieldDef) -> bool {
        self.kind == other.kind && self.type_name == other.type_name
    }
}

/// Schema of one object type.
#[derive(Debug)]
pub struct TypeDef {
    name: String,
    parent: Option<Arc<TypeDef>>,
    own_fields: Vec<FieldDef>,
    /// Default values this type overrides for inherited fields.
    default_overrides: BTreeMap<String, Value>,
}

impl TypeDef {
    /// Starts building a root type.
    pub fn builder(name: impl Into<String>) -> TypeDefBuilder {
        TypeDefBuilder {
            def: TypeDef {
                name: name.into(),
                parent: None,
                own_fields: Vec::new(),
                default_overrides: BTreeMap::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<TypeDef>> {
        self.parent.as_ref()
    }

    /// Fields declared by this type only, excluding inherited ones.
    pub fn own_fields(&self) -> &[FieldDef] {
        &self.own_fields
    }

    /// All fields, inherited first, in the order objects store their values.
    pub fn fields(&self) -> Vec<&FieldDef> {
        let mut fields = match &self.parent {
            Some(parent) => parent.fields(),
            None => Vec::new(),
        };
        fields.extend(self.own_fields.iter());
        fields
    }

    /// Total number of fields including inherited ones.
    pub fn field_count(&self) -> usize {
        self.own_fields.len() + self.parent.as_ref().map_or(0, |p| p.field_count())
    }

    /// Index of `name` in [`fields`](Self::fields).
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields().iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.own_fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.parent.as_ref().and_then(|p| p.field(name)))
    }

    /// Default value of a field on objects of this type, honoring overrides
    /// made by this type or any ancestor.
    pub fn default_value(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.default_overrides.get(name) {
            return Some(value);
        }
        if let Some(field) = self.own_fields.iter().find(|f| f.name == name) {
            return Some(&field.default);
        }
        self.parent.as_ref().and_then(|p| p.default_value(name))
    }

    /// Default values for all fields, aligned with [`fields`](Self::fields).
    pub fn default_values(&self) -> Vec<Value> {
        self.fields()
            .iter()
            .map(|f| {
                self.default_value(&f.name)
                    .cloned()
                    .unwrap_or_else(|| f.default.clone())
            })
            .collect()
    }

    /// Returns `true` if this type is `type_name` or derives from it.
    pub fn is_a(&self, type_name: &str) -> bool {
        self.name == type_name || self.parent.as_ref().is_some_and(|p| p.is_a(type_name))
    }
}

/// Builder for [`TypeDef`].
pub struct TypeDefBuilder {
    def: TypeDef,
}

impl TypeDefBuilder {
    #[must_use]
    pub fn parent(mut self, parent: &Arc<TypeDef>) -> Self {
        self.def.parent = Some(Arc::clone(parent));
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.def.own_fields.push(field);
        self
    }

    /// Overrides the default of an inherited field.
    #[must_use]
    pub fn default_override(mut self, name: impl Into<String>, value: Value) -> Self {
        self.def.default_overrides.insert(name.into(), value);
        self
    }

    pub fn build(self) -> TypeDef {
        self.def
    }
}

/// Name-indexed collection of all known types.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, Arc<TypeDef>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type, replacing any previous type with the same name.
    pub fn register(&mut self, def: TypeDef) -> Arc<TypeDef> {
        let def = Arc::new(def);
        if self
            .types
            .insert(def.name.clone(), Arc::clone(&def))
            .is_some()
        {
            log::warn!("Type '{}' registered twice, keeping the latest", def.name);
        }
        def
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TypeDef>> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Iterates over all types in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TypeDef>> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor_types() -> (Arc<TypeDef>, Arc<TypeDef>) {
        let mut registry = TypeRegistry::new();
        let actor = registry.register(
            TypeDef::builder("Actor")
                .field(FieldDef::new("bHidden", "bool", Value::Bool(false)).editable())
                .field(
                    FieldDef::new("Tags", "TArray<FName>", Value::Array(Vec::new()))
                        .with_flags(FieldFlags::EDIT | FieldFlags::BLUEPRINT_READ_ONLY),
                )
                .build(),
        );
        let door = registry.register(
            TypeDef::builder("BP_Door_C")
                .parent(&actor)
                .field(FieldDef::new("OpenAngle", "double", Value::Float(90.0)).editable())
                .default_override("bHidden", Value::Bool(true))
                .build(),
        );
        (actor, door)
    }

    #[test]
    fn field_flags_editability() {
        assert!(FieldFlags::EDIT.is_editable());
        assert!(FieldFlags::BLUEPRINT_VISIBLE.is_editable());
        assert!(!FieldFlags::NONE.is_editable());
        assert!(!(FieldFlags::EDIT | FieldFlags::EDIT_CONST).is_editable());
        assert!(!(FieldFlags::BLUEPRINT_VISIBLE | FieldFlags::BLUEPRINT_READ_ONLY).is_editable());
        assert!(!(FieldFlags::EDIT | FieldFlags::DISABLE_EDIT_ON_INSTANCE).is_editable());
        assert!(!(FieldFlags::EDIT | FieldFlags::DISABLE_EDIT_ON_TEMPLATE).is_editable());
    }

    #[test]
    fn field_flags_visibility() {
        assert!(FieldFlags::BLUEPRINT_ASSIGNABLE.is_visible());
        assert!((FieldFlags::EDIT | FieldFlags::EDIT_CONST).is_visible());
        assert!(!FieldFlags::EDIT_CONST.is_visible());
        assert!((FieldFlags::EDIT | FieldFlags::BLUEPRINT_CALLABLE).contains(FieldFlags::EDIT));
    }

    #[test]
    fn inherited_fields_come_first() {
        let (_, door) = actor_types();
        let names: Vec<&str> = door.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["bHidden", "Tags", "OpenAngle"]);
        assert_eq!(door.field_count(), 3);
        assert_eq!(door.own_fields().len(), 1);
        assert_eq!(door.field_index("OpenAngle"), Some(2));
        assert_eq!(door.field("Tags").map(|f| f.kind), Some(FieldKind::Array));
    }

    #[test]
    fn default_overrides_apply_to_descendants_only() {
        let (actor, door) = actor_types();
        assert_eq!(actor.default_value("bHidden"), Some(&Value::Bool(false)));
        assert_eq!(door.default_value("bHidden"), Some(&Value::Bool(true)));
        assert_eq!(
            door.default_values(),
            vec![
                Value::Bool(true),
                Value::Array(Vec::new()),
                Value::Float(90.0)
            ]
        );
    }

    #[test]
    fn is_a_walks_parents() {
        let (actor, door) = actor_types();
        assert!(door.is_a("Actor"));
        assert!(door.is_a("BP_Door_C"));
        assert!(!actor.is_a("BP_Door_C"));
    }

    #[test]
    fn same_declaration_compares_kind_and_type() {
        let a = FieldDef::new("Speed", "float", Value::Float(1.0));
        let b = FieldDef::new("Speed", "float", Value::Float(2.0)).editable();
        let c = FieldDef::new("Speed", "int32", Value::Int(2));
        assert!(a.same_declaration(&b));
        assert!(!a.same_declaration(&c));
    }

    #[test]
    fn registry_lookup() {
        let mut registry = TypeRegistry::new();
        registry.register(TypeDef::builder("Object").build());
        assert!(registry.contains("Object"));
        assert!(registry.get("Missing").is_none());
        assert_eq!(registry.len(), 1);
    }
}
