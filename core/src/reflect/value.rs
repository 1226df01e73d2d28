//! Reflected field values.
//!
//! A [`Value`] is self-describing: its variant determines the
//! [`FieldKind`] it belongs to, so containers and nested records can be
//! compared and printed without consulting an inner schema.

use serde::{Deserialize, Serialize};

use super::FieldKind;
use crate::scene::ObjectId;

/// Object and function a delegate is bound to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateBinding {
    pub object: Option<ObjectId>,
    pub function: String,
}

/// Value stored in one reflected field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Enumerator name with its numeric value.
    Enum {
        name: String,
        value: i64,
    },
    /// Nested record with named members in declaration order.
    Struct {
        name: String,
        fields: Vec<(String, Value)>,
    },
    /// Owning reference.
    Object(Option<ObjectId>),
    /// Non-owning reference.
    WeakObject(Option<ObjectId>),
    /// Path of a possibly-unloaded object; empty when unset.
    SoftObject(String),
    Array(Vec<Value>),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Delegate(Option<DelegateBinding>),
    MulticastDelegate(Vec<DelegateBinding>),
    /// Opaque value carried as its exported text.
    Other(String),
}

impl Value {
    /// Field kind this value belongs to.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Bool(_) => FieldKind::Bool,
            Self::Int(_) => FieldKind::Int,
            Self::Float(_) => FieldKind::Float,
            Self::String(_) => FieldKind::String,
            Self::Enum { .. } => FieldKind::Enum,
            Self::Struct { .. } => FieldKind::Struct,
            Self::Object(_) => FieldKind::StrongRef,
            Self::WeakObject(_) => FieldKind::WeakRef,
            Self::SoftObject(_) => FieldKind::PathRef,
            Self::Array(_) => FieldKind::Array,
            Self::Set(_) => FieldKind::Set,
            Self::Map(_) => FieldKind::Map,
            Self::Delegate(_) | Self::MulticastDelegate(_) => FieldKind::Delegate,
            Self::Other(_) => FieldKind::Other,
        }
    }

    /// Type label used for record members, which carry no declaration.
    pub fn type_name(&self) -> String {
        match self {
            Self::Bool(_) => "bool".into(),
            Self::Int(_) => "int64".into(),
            Self::Float(_) => "double".into(),
            Self::String(_) => "FString".into(),
            Self::Enum { .. } => "uint8".into(),
            Self::Struct { name, .. } => name.clone(),
            Self::Object(_) => "TObjectPtr<UObject>".into(),
            Self::WeakObject(_) => "TWeakObjectPtr<UObject>".into(),
            Self::SoftObject(_) => "TSoftObjectPtr<UObject>".into(),
            Self::Array(_) => "TArray".into(),
            Self::Set(_) => "TSet".into(),
            Self::Map(_) => "TMap".into(),
            Self::Delegate(_) => "FScriptDelegate".into(),
            Self::MulticastDelegate(_) => "FMulticastScriptDelegate".into(),
            Self::Other(_) => "unknown".into(),
        }
    }

    /// Structural, bit-level equality.
    ///
    /// Unlike `==`, floats compare by their bit patterns, so `NaN` equals
    /// itself and `0.0` differs from `-0.0`.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (
                Self::Struct {
                    name: na,
                    fields: fa,
                },
                Self::Struct {
                    name: nb,
                    fields: fb,
                },
            ) => {
                na == nb
                    && fa.len() == fb.len()
                    && fa
                        .iter()
                        .zip(fb)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.identical(vb))
            }
            (Self::Array(a), Self::Array(b)) | (Self::Set(a), Self::Set(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.identical(y))
            }
            (Self::Map(a), Self::Map(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka.identical(kb) && va.identical(vb))
            }
            _ => self == other,
        }
    }

    /// Object ids referenced by this value through owning references,
    /// including those nested in records and containers.
    pub fn strong_refs(&self) -> Vec<ObjectId> {
        let mut out = Vec::new();
        self.collect_strong_refs(&mut out);
        out
    }

    fn collect_strong_refs(&self, out: &mut Vec<ObjectId>) {
        match self {
            Self::Object(Some(id)) => out.push(*id),
            Self::Struct { fields, .. } => {
                for (_, v) in fields {
                    v.collect_strong_refs(out);
                }
            }
            Self::Array(items) | Self::Set(items) => {
                for v in items {
                    v.collect_strong_refs(out);
                }
            }
            Self::Map(entries) => {
                for (k, v) in entries {
                    k.collect_strong_refs(out);
                    v.collect_strong_refs(out);
                }
            }
            _ => {}
        }
    }

    /// Rewrites owning references through `remap`, leaving ids it does not
    /// know untouched.
    pub fn remap_strong_refs(&mut self, remap: &dyn Fn(ObjectId) -> Option<ObjectId>) {
        match self {
            Self::Object(Some(id)) => {
                if let Some(new_id) = remap(*id) {
                    *id = new_id;
                }
            }
            Self::Struct { fields, .. } => {
                for (_, v) in fields {
                    v.remap_strong_refs(remap);
                }
            }
            Self::Array(items) | Self::Set(items) => {
                for v in items {
                    v.remap_strong_refs(remap);
                }
            }
            Self::Map(entries) => {
                for (k, v) in entries {
                    k.remap_strong_refs(remap);
                    v.remap_strong_refs(remap);
                }
            }
            _ => {}
        }
    }
}
