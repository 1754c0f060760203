//! # Parsed Values
//!
//! The output of a parse: a tree whose shape mirrors the schema. Leaves
//! are scalars or constructed [`Object`]s; inner nodes are sequences and
//! keyed mappings.
//!
//! Keyed mappings come in two forms. [`Parsed::Map`] is a plain mapping
//! that only supports keyed access. [`Parsed::Attrs`] is the strict
//! attribute view, which additionally supports attribute access through
//! [`Parsed::attr`]. [`Parsed::into_attrs`] converts every mapping in a
//! tree to the attribute view; applying it twice is the same as once.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::attrs::AttrMap;
use crate::error::AttributeError;
use crate::types::{inherits_from, InstanceValue, TypeDef, TypeRef};

/// A node of a parsed object graph.
#[derive(Debug, Clone)]
pub enum Parsed {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Parsed>),
    /// Plain keyed mapping.
    Map(BTreeMap<String, Parsed>),
    /// Keyed mapping wrapped in the strict attribute view.
    Attrs(AttrMap<Parsed>),
    /// Instance of a registered user type.
    Object(Object),
}

impl Parsed {
    /// Convert a raw value without any schema.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            Value::String(s) => Self::Str(s.clone()),
            Value::Array(items) => Self::Seq(items.iter().map(Self::from_value).collect()),
            Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_value(v)))
                    .collect(),
            ),
        }
    }

    /// Short name of the value's kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Seq(_) => "sequence",
            Self::Map(_) | Self::Attrs(_) => "mapping",
            Self::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Parsed]> {
        match self {
            Self::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Entries of either mapping form.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Parsed>> {
        match self {
            Self::Map(entries) => Some(entries),
            Self::Attrs(view) => Some(view.as_map()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Keyed access on either mapping form.
    pub fn get(&self, key: &str) -> Option<&Parsed> {
        self.as_map().and_then(|entries| entries.get(key))
    }

    /// Attribute access. Only the attribute view supports it.
    ///
    /// # Errors
    ///
    /// `AttributeError::Missing` for absent attributes on an attribute
    /// view, `AttributeError::NotAnAttrView` for every other value.
    pub fn attr(&self, name: &str) -> Result<&Parsed, AttributeError> {
        match self {
            Self::Attrs(view) => view.attr(name),
            other => Err(AttributeError::NotAnAttrView(other.kind())),
        }
    }

    /// Borrow a constructed instance as its concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_object().and_then(Object::downcast_ref)
    }

    /// Whether the value is an instance of `ty` or one of its subtypes.
    pub fn is_instance_of(&self, ty: &TypeDef) -> bool {
        self.as_object().is_some_and(|object| object.is_instance_of(ty))
    }

    /// Wrap every keyed mapping in the tree in the strict attribute view.
    pub fn into_attrs(self) -> Parsed {
        match self {
            Self::Seq(items) => Self::Seq(items.into_iter().map(Self::into_attrs).collect()),
            Self::Map(entries) => Self::Attrs(AttrMap::new(wrap_entries(entries))),
            Self::Attrs(view) => Self::Attrs(AttrMap::new(wrap_entries(view.into_inner()))),
            other => other,
        }
    }
}

fn wrap_entries(entries: BTreeMap<String, Parsed>) -> BTreeMap<String, Parsed> {
    entries
        .into_iter()
        .map(|(k, v)| (k, v.into_attrs()))
        .collect()
}

impl PartialEq for Parsed {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Seq(a), Self::Seq(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (a, b) => match (a.as_map(), b.as_map()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl PartialEq<Value> for Parsed {
    fn eq(&self, other: &Value) -> bool {
        *self == Parsed::from_value(other)
    }
}

impl From<&Value> for Parsed {
    fn from(value: &Value) -> Self {
        Self::from_value(value)
    }
}

impl Serialize for Parsed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(_) | Self::Attrs(_) => {
                let entries = self.as_map().into_iter().flatten();
                let mut map = serializer.serialize_map(None)?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Self::Object(object) => object.serialize(serializer),
        }
    }
}

impl fmt::Display for Parsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(rendered) => f.write_str(&rendered),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}

/// An instance of a registered type, tagged with the type that built it.
#[derive(Clone)]
pub struct Object {
    ty: TypeRef,
    value: InstanceValue,
}

impl Object {
    pub fn new(ty: TypeRef, value: InstanceValue) -> Self {
        Self { ty, value }
    }

    /// The type that constructed this instance.
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    pub fn is_instance_of(&self, ty: &TypeDef) -> bool {
        inherits_from(&self.ty, ty)
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.value.ptr_eq(&other.value)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("type", &self.ty.qualified_name())
            .field("value", &self.value)
            .finish()
    }
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("$type", &self.ty.qualified_name())?;
        map.serialize_entry("repr", &format!("{:?}", self.value))?;
        map.end()
    }
}

/// Short name of a raw value's kind, for diagnostics.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_scalars_and_containers() {
        let parsed = Parsed::from_value(&json!({"a": [1, 2.5, "x", true, null]}));
        let items = parsed.get("a").and_then(Parsed::as_seq).unwrap();
        assert_eq!(items[0], Parsed::Int(1));
        assert_eq!(items[1], Parsed::Float(2.5));
        assert_eq!(items[2], Parsed::Str("x".to_string()));
        assert_eq!(items[3], Parsed::Bool(true));
        assert!(items[4].is_null());
    }

    #[test]
    fn test_plain_map_has_no_attributes() {
        let parsed = Parsed::from_value(&json!({"foo": "bar"}));
        assert_eq!(parsed.get("foo"), Some(&Parsed::Str("bar".to_string())));
        assert_eq!(
            parsed.attr("foo"),
            Err(AttributeError::NotAnAttrView("mapping"))
        );
    }

    #[test]
    fn test_into_attrs_wraps_nested_mappings() {
        let parsed = Parsed::from_value(&json!({"key": {"key": [{"key": 1}]}})).into_attrs();
        let inner = parsed.attr("key").unwrap().attr("key").unwrap();
        let first = &inner.as_seq().unwrap()[0];
        assert_eq!(first.attr("key"), Ok(&Parsed::Int(1)));
        assert_eq!(parsed.get("key").and_then(|v| v.get("key")), Some(inner));
    }

    #[test]
    fn test_into_attrs_is_idempotent() {
        let once = Parsed::from_value(&json!({"a": {"b": [1, {"c": 2}]}})).into_attrs();
        let twice = once.clone().into_attrs();
        assert_eq!(once, twice);
        assert_eq!(twice.attr("a").unwrap().attr("b").unwrap(), &json!([1, {"c": 2}]));
    }

    #[test]
    fn test_map_equals_attrs_with_same_entries() {
        let plain = Parsed::from_value(&json!({"x": 1}));
        let wrapped = plain.clone().into_attrs();
        assert_eq!(plain, wrapped);
    }

    #[test]
    fn test_serialize_and_display() {
        let parsed = Parsed::from_value(&json!({"a": [1, "b"]})).into_attrs();
        assert_eq!(serde_json::to_value(&parsed).unwrap(), json!({"a": [1, "b"]}));
        assert_eq!(parsed.to_string(), r#"{"a":[1,"b"]}"#);
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(value_kind(&json!(1)), "integer");
        assert_eq!(value_kind(&json!(1.5)), "float");
        assert_eq!(value_kind(&json!({})), "mapping");
        assert_eq!(value_kind(&json!(null)), "null");
    }
}
