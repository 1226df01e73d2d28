//! Human-readable text export of reflected values and objects.
//!
//! [`format_value`] turns a single field value into text and never fails.
//! [`dump_object`] and [`dump_type`] produce multi-line property listings
//! of an object or of a type's default object, optionally restricted to
//! user-editable fields and to fields that differ from a reference object.
//!
//! Object references are followed into small subobjects. Every traversal
//! keeps a visited set and prints a circular-reference marker instead of
//! recursing into an object twice.

use std::borrow::Cow;
use std::collections::HashSet;

use crate::reflect::{FieldDef, Value};
use crate::scene::{Object, ObjectId, Scene, SceneError};

/// Text returned for missing input.
pub const NULL_TEXT: &str = "<null>";

/// Container elements printed before eliding the rest.
const MAX_ELEMENTS: usize = 10;

/// Referenced objects declaring more own fields than this are not expanded.
const MAX_INLINE_FIELDS: usize = 20;

/// Types whose references print as a path and are never expanded.
const OPAQUE_TYPES: [&str; 3] = ["Class", "Blueprint", "Package"];

/// Formats one field value.
///
/// `default` is the reference value used by `modified_only` when the value
/// is a record: members identical to the reference are left out.
pub fn format_value(
    scene: &Scene,
    field: Option<&FieldDef>,
    value: Option<&Value>,
    visible_only: bool,
    modified_only: bool,
    default: Option<&Value>,
) -> String {
    match (field, value) {
        (Some(_), Some(value)) => {
            Dumper::new(scene, visible_only, modified_only).value(value, 0, default)
        }
        _ => NULL_TEXT.to_string(),
    }
}

/// Lists the fields of `object`.
///
/// With `modified_only`, fields identical to the same field of `default`
/// are skipped. Fields `default` does not have are always listed.
pub fn dump_object_properties(
    scene: &Scene,
    object: &Object,
    visible_only: bool,
    modified_only: bool,
    default: Option<&Object>,
) -> String {
    Dumper::new(scene, visible_only, modified_only).object(object, 0, default)
}

/// Property report of a live object, compared against its type's default
/// object when `modified_only` is set.
pub fn dump_object(
    scene: &Scene,
    id: ObjectId,
    visible_only: bool,
    modified_only: bool,
) -> Result<String, SceneError> {
    let object = scene.get(id).ok_or(SceneError::ObjectNotFound(id))?;
    let default = if modified_only {
        scene.class_default(object.class_name())
    } else {
        None
    };

    let mut out = String::from("=== Object Property Dump ===\n");
    out += &format!("Path: {}\n", object.path());
    out += &format!("Type: {}\n", object.class_name());
    out += &filter_line(visible_only, modified_only);
    out += "\n=== Properties ===\n";
    out += &dump_object_properties(scene, object, visible_only, modified_only, default);
    Ok(out)
}

/// Property report of a type's default object, compared against the parent
/// type's default object when `modified_only` is set.
pub fn dump_type(
    scene: &Scene,
    type_name: &str,
    visible_only: bool,
    modified_only: bool,
) -> Result<String, SceneError> {
    let class = scene
        .registry()
        .get(type_name)
        .ok_or_else(|| SceneError::UnknownType(type_name.to_string()))?;
    let default_object = scene
        .class_default(type_name)
        .ok_or_else(|| SceneError::UnknownType(type_name.to_string()))?;

    let mut out = String::from("=== Type Property Dump ===\n");
    out += &format!("Type: {}\n", class.name());
    let parent_default = match class.parent() {
        Some(parent) => {
            out += &format!("Parent Type: {}\n", parent.name());
            if modified_only {
                scene.class_default(parent.name())
            } else {
                None
            }
        }
        None => None,
    };
    out += &filter_line(visible_only, modified_only);
    out += "\n=== Properties ===\n";
    out += &dump_object_properties(
        scene,
        default_object,
        visible_only,
        modified_only,
        parent_default,
    );
    Ok(out)
}

fn filter_line(visible_only: bool, modified_only: bool) -> String {
    format!("Filter: VisibleOnly={visible_only}, ModifiedOnly={modified_only}\n")
}

fn indent_str(indent: usize) -> String {
    " ".repeat(indent * 2)
}

/// One field or record member to print.
struct Entry<'v> {
    name: &'v str,
    type_name: Cow<'v, str>,
    property_class: &'static str,
    /// `None` for record members, which carry no editor markers.
    editable: Option<bool>,
    value: &'v Value,
    default: Option<&'v Value>,
}

struct Dumper<'a> {
    scene: &'a Scene,
    visible_only: bool,
    modified_only: bool,
    visited: HashSet<ObjectId>,
}

impl<'a> Dumper<'a> {
    fn new(scene: &'a Scene, visible_only: bool, modified_only: bool) -> Self {
        Self {
            scene,
            visible_only,
            modified_only,
            visited: HashSet::new(),
        }
    }

    fn object(&mut self, object: &Object, indent: usize, default: Option<&Object>) -> String {
        if !self.visited.insert(object.id()) {
            return format!("[Circular Reference: {}]", object.name());
        }
        let entries = object
            .fields()
            .map(|(field, value)| Entry {
                name: &field.name,
                type_name: Cow::Borrowed(&field.type_name),
                property_class: field.kind.property_class(),
                editable: Some(field.flags.is_editable()),
                value,
                default: default.and_then(|d| d.get(&field.name)),
            })
            .collect();
        self.entries(entries, indent)
    }

    fn entries(&mut self, entries: Vec<Entry<'_>>, indent: usize) -> String {
        let pad = indent_str(indent);
        let mut out = String::new();
        for entry in entries {
            if self.visible_only && entry.editable == Some(false) {
                continue;
            }
            if self.modified_only {
                if let Some(default) = entry.default {
                    if entry.value.identical(default) {
                        continue;
                    }
                }
            }
            let text = self.value(entry.value, indent + 1, entry.default);
            out += &format!("{pad}Property: {}\n", entry.name);
            out += &format!("{pad}  Type: {}\n", entry.type_name);
            out += &format!("{pad}  PropertyClass: {}\n", entry.property_class);
            out += &format!("{pad}  Value: {text}\n\n");
        }
        out
    }

    fn value(&mut self, value: &Value, indent: usize, default: Option<&Value>) -> String {
        match value {
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format!("{f:.6}"),
            Value::String(s) => format!("\"{s}\""),
            Value::Enum { name, value } => format!("{name} ({value})"),
            Value::Struct { fields, .. } => {
                let default_fields = match default {
                    Some(Value::Struct { fields, .. }) => Some(fields),
                    _ => None,
                };
                let entries = fields
                    .iter()
                    .map(|(name, member)| Entry {
                        name,
                        type_name: Cow::Owned(member.type_name()),
                        property_class: member.kind().property_class(),
                        editable: None,
                        value: member,
                        default: default_fields
                            .and_then(|d| d.iter().find(|(n, _)| n == name))
                            .map(|(_, v)| v),
                    })
                    .collect();
                format!(
                    "{{\n{}{}}}",
                    self.entries(entries, indent),
                    indent_str(indent.saturating_sub(1))
                )
            }
            Value::Object(None) => "null".to_string(),
            Value::Object(Some(id)) => self.object_ref(*id, indent),
            Value::WeakObject(target) => match target.and_then(|id| self.scene.get(id)) {
                Some(object) => format!("WeakRef'{}' [{}]", object.name(), object.class_name()),
                None => "WeakRef'null'".to_string(),
            },
            Value::SoftObject(path) => format!("SoftObject'{path}'"),
            Value::Array(items) => self.sequence(items, indent, "", ('[', ']')),
            Value::Set(items) => self.sequence(items, indent, "Set", ('{', '}')),
            Value::Map(entries) => {
                if entries.is_empty() {
                    return "Map{}".to_string();
                }
                let pad = indent_str(indent);
                let mut out = format!("Map{{Count: {}}}\n", entries.len());
                for (key, item) in entries.iter().take(MAX_ELEMENTS) {
                    let key = self.value(key, indent + 1, None);
                    let item = self.value(item, indent + 1, None);
                    out += &format!("{pad}  [{key}]: {item}\n");
                }
                out += &more_line(&pad, entries.len());
                out
            }
            Value::Delegate(Some(binding)) => {
                let object = binding
                    .object
                    .and_then(|id| self.scene.get(id))
                    .map_or("null", |o| o.name());
                format!("Delegate{{Object: {object}, Function: {}}}", binding.function)
            }
            Value::Delegate(None) => "Delegate{Unbound}".to_string(),
            Value::MulticastDelegate(_) => "MulticastDelegate{...}".to_string(),
            Value::Other(text) => text.clone(),
        }
    }

    fn sequence(
        &mut self,
        items: &[Value],
        indent: usize,
        label: &str,
        (open, close): (char, char),
    ) -> String {
        if items.is_empty() {
            return format!("{label}{open}{close}");
        }
        let pad = indent_str(indent);
        let mut out = format!("{label}{open}Count: {}{close}\n", items.len());
        for (i, item) in items.iter().take(MAX_ELEMENTS).enumerate() {
            let text = self.value(item, indent + 1, None);
            out += &format!("{pad}  {open}{i}{close}: {text}\n");
        }
        out += &more_line(&pad, items.len());
        out
    }

    fn object_ref(&mut self, id: ObjectId, indent: usize) -> String {
        let scene = self.scene;
        let Some(object) = scene.get(id) else {
            return "null".to_string();
        };
        let class = object.class();
        if OPAQUE_TYPES.iter().any(|t| class.is_a(t)) {
            return format!("{} [{}]", object.path(), class.name());
        }
        if self.visited.contains(&id) {
            return format!(
                "[Circular Reference: {} ({})]",
                object.name(),
                class.name()
            );
        }

        let mut out = format!("{} [{}]", object.name(), class.name());
        let own_fields = class.own_fields().len();
        if (1..=MAX_INLINE_FIELDS).contains(&own_fields) {
            out += " {\n";
            out += &self.object(object, indent, None);
            out += &format!("{}}}", indent_str(indent.saturating_sub(1)));
        }
        out
    }
}

fn more_line(pad: &str, len: usize) -> String {
    if len > MAX_ELEMENTS {
        format!("{pad}  ... and {} more elements\n", len - MAX_ELEMENTS)
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::reflect::{DelegateBinding, FieldFlags, TypeDef, TypeRegistry};

    fn scene() -> (Scene, ObjectId) {
        let mut registry = TypeRegistry::new();
        registry.register(TypeDef::builder("Package").build());
        let node = registry.register(
            TypeDef::builder("Node")
                .field(FieldDef::new("Next", "TObjectPtr<UNode>", Value::Object(None)).editable())
                .build(),
        );
        registry.register(
            TypeDef::builder("Door")
                .parent(&node)
                .field(FieldDef::new("Angle", "double", Value::Float(90.0)).editable())
                .field(
                    FieldDef::new("Locked", "bool", Value::Bool(false))
                        .with_flags(FieldFlags::EDIT | FieldFlags::EDIT_CONST),
                )
                .default_override("Angle", Value::Float(45.0))
                .build(),
        );
        let mut scene = Scene::new(Arc::new(registry));
        let level = scene.spawn("Package", None, "/Game/Level").unwrap();
        (scene, level)
    }

    fn field() -> FieldDef {
        FieldDef::new("Value", "int32", Value::Int(0))
    }

    fn fmt(scene: &Scene, value: Value) -> String {
        format_value(scene, Some(&field()), Some(&value), false, false, None)
    }

    #[test]
    fn missing_input_is_null_text() {
        let (scene, _) = scene();
        assert_eq!(format_value(&scene, None, Some(&Value::Int(1)), false, false, None), "<null>");
        assert_eq!(format_value(&scene, Some(&field()), None, false, false, None), "<null>");
    }

    #[test]
    fn primitives() {
        let (scene, _) = scene();
        assert_eq!(fmt(&scene, Value::Bool(true)), "true");
        assert_eq!(fmt(&scene, Value::Int(-42)), "-42");
        assert_eq!(fmt(&scene, Value::Float(1.5)), "1.500000");
        assert_eq!(fmt(&scene, Value::String("hi".into())), "\"hi\"");
        assert_eq!(
            fmt(
                &scene,
                Value::Enum {
                    name: "Open".into(),
                    value: 2
                }
            ),
            "Open (2)"
        );
        assert_eq!(fmt(&scene, Value::SoftObject("/Game/Mesh".into())), "SoftObject'/Game/Mesh'");
        assert_eq!(fmt(&scene, Value::Other("(1,2)".into())), "(1,2)");
    }

    #[test]
    fn containers() {
        let (scene, _) = scene();
        assert_eq!(fmt(&scene, Value::Array(Vec::new())), "[]");
        assert_eq!(fmt(&scene, Value::Set(Vec::new())), "Set{}");
        assert_eq!(fmt(&scene, Value::Map(Vec::new())), "Map{}");
        assert_eq!(
            fmt(&scene, Value::Array(vec![Value::Int(1), Value::Int(2)])),
            "[Count: 2]\n  [0]: 1\n  [1]: 2\n"
        );
        assert_eq!(
            fmt(&scene, Value::Set(vec![Value::Int(7)])),
            "Set{Count: 1}\n  {0}: 7\n"
        );
        assert_eq!(
            fmt(&scene, Value::Map(vec![(Value::String("a".into()), Value::Bool(false))])),
            "Map{Count: 1}\n  [\"a\"]: false\n"
        );
    }

    #[test]
    fn long_arrays_are_elided() {
        let (scene, _) = scene();
        let text = fmt(&scene, Value::Array((0..13).map(Value::Int).collect()));
        assert!(text.starts_with("[Count: 13]\n"));
        assert!(text.contains("  [9]: 9\n"));
        assert!(!text.contains("[10]"));
        assert!(text.ends_with("  ... and 3 more elements\n"));
    }

    #[test]
    fn delegates() {
        let (scene, level) = scene();
        assert_eq!(fmt(&scene, Value::Delegate(None)), "Delegate{Unbound}");
        assert_eq!(
            fmt(
                &scene,
                Value::Delegate(Some(DelegateBinding {
                    object: Some(level),
                    function: "OnOpen".into()
                }))
            ),
            "Delegate{Object: /Game/Level, Function: OnOpen}"
        );
        assert_eq!(
            fmt(&scene, Value::MulticastDelegate(Vec::new())),
            "MulticastDelegate{...}"
        );
    }

    #[test]
    fn struct_members_are_listed() {
        let (scene, _) = scene();
        let text = fmt(
            &scene,
            Value::Struct {
                name: "FVector2D".into(),
                fields: vec![("X".into(), Value::Float(1.0))],
            },
        );
        assert_eq!(
            text,
            "{\nProperty: X\n  Type: double\n  PropertyClass: DoubleProperty\n  Value: 1.000000\n\n}"
        );
    }

    #[test]
    fn references() {
        let (mut scene, level) = scene();
        let door = scene.spawn("Door", Some(level), "Door").unwrap();
        assert_eq!(fmt(&scene, Value::Object(None)), "null");
        assert_eq!(fmt(&scene, Value::Object(Some(ObjectId(9999)))), "null");
        assert_eq!(
            fmt(&scene, Value::Object(Some(level))),
            "/Game/Level [Package]"
        );
        assert_eq!(
            fmt(&scene, Value::WeakObject(Some(door))),
            "WeakRef'Door' [Door]"
        );
        assert_eq!(fmt(&scene, Value::WeakObject(None)), "WeakRef'null'");

        let text = fmt(&scene, Value::Object(Some(door)));
        assert!(text.starts_with("Door [Door] {\n"));
        assert!(text.contains("Property: Angle"));
        assert!(text.ends_with('}'));
    }

    #[test]
    fn cycles_print_a_marker() {
        let (mut scene, level) = scene();
        let a = scene.spawn("Door", Some(level), "A").unwrap();
        let b = scene.spawn("Door", Some(level), "B").unwrap();
        scene.set_field(a, "Next", Value::Object(Some(b))).unwrap();
        scene.set_field(b, "Next", Value::Object(Some(a))).unwrap();

        let text = dump_object(&scene, a, false, false).unwrap();
        assert!(text.contains("[Circular Reference: A (Door)]"));
    }

    #[test]
    fn visible_only_skips_read_only_fields() {
        let (mut scene, level) = scene();
        let door = scene.spawn("Door", Some(level), "Door").unwrap();
        let all = dump_object(&scene, door, false, false).unwrap();
        let visible = dump_object(&scene, door, true, false).unwrap();
        assert!(all.contains("Property: Locked"));
        assert!(!visible.contains("Property: Locked"));
        assert!(visible.contains("Property: Angle"));
    }

    #[test]
    fn modified_only_compares_against_defaults() {
        let (mut scene, level) = scene();
        let door = scene.spawn("Door", Some(level), "Door").unwrap();
        scene.set_field(door, "Locked", Value::Bool(true)).unwrap();

        let text = dump_object(&scene, door, false, true).unwrap();
        assert!(text.contains("Filter: VisibleOnly=false, ModifiedOnly=true"));
        assert!(text.contains("Property: Locked"));
        assert!(!text.contains("Property: Angle"));

        let type_text = dump_type(&scene, "Door", false, true).unwrap();
        assert!(type_text.contains("Parent Type: Node"));
        assert!(type_text.contains("Property: Angle"));
        assert!(!type_text.contains("Property: Next"));
    }

    #[test]
    fn unknown_type_is_an_error() {
        let (scene, _) = scene();
        assert!(matches!(
            dump_type(&scene, "Missing", false, false),
            Err(SceneError::UnknownType(_))
        ));
    }
}
