//! # Normalized Schema Nodes
//!
//! A validated schema tree is normalized into [`SchemaNode`]s before any
//! definition is parsed. Optional fields become `Option`s, the declared
//! type is resolved once up front, and the mutually exclusive structural
//! keys become the [`Shape`] enum, so the parser dispatches by pattern
//! matching instead of probing keys.
//!
//! An absent or empty schema node (`null` or `{}`) normalizes to `None`
//! and means "accept anything".

use std::collections::BTreeMap;

use serde_json::Value;

use defs_core::{DiagnosticPath, FallbackAttrMap, SchemaError, TypeRef, TypeRegistry};

use crate::validate::{
    children_of, module_name, type_name_of, SchemaValidator, ARGUMENTS_KEY, DEFAULT_KEY,
    ELEMENTS_KEY, MAPPING_KEY, MODULE_KEY, TYPE_KEY,
};

/// Child schemas keyed by argument name or mapping key.
pub type Children = BTreeMap<String, Option<SchemaNode>>;

/// Structural shape of a schema node.
#[derive(Debug, Clone)]
pub enum Shape {
    /// No structural key: a single value, an argument bundle with no
    /// declared arguments, or a bare type name.
    Single,
    /// Named constructor parameters.
    Arguments(Children),
    /// Homogeneous sequence; `None` accepts any items.
    Elements(Option<Box<SchemaNode>>),
    /// Closed set of mapping keys.
    Mapping(Children),
}

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Arguments(_) => ARGUMENTS_KEY,
            Self::Elements(_) => ELEMENTS_KEY,
            Self::Mapping(_) => MAPPING_KEY,
        }
    }
}

/// A validated, normalized schema node.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    type_name: Option<String>,
    module: Option<String>,
    ty: Option<TypeRef>,
    default: Option<Value>,
    shape: Shape,
}

impl SchemaNode {
    /// Validate a schema tree and normalize it.
    ///
    /// Returns `None` for an absent or empty schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the tree is not well-formed.
    pub fn compile(schema: Value, registry: &TypeRegistry) -> Result<Option<SchemaNode>, SchemaError> {
        SchemaValidator::new(registry).validate(&schema)?;
        normalize(&DiagnosticPath::root(), schema, registry)
    }

    /// The declared type name as written in the schema.
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// The resolved declared type.
    pub fn ty(&self) -> Option<&TypeRef> {
        self.ty.as_ref()
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Declared arguments, if the node is an argument bundle.
    pub fn arguments(&self) -> Option<&Children> {
        match &self.shape {
            Shape::Arguments(children) => Some(children),
            _ => None,
        }
    }

    /// Whether omitting this node can be resolved without an error: the
    /// node has a default, or it is an argument bundle whose arguments
    /// all can.
    pub fn has_default(&self) -> bool {
        self.default.is_some() || self.is_fully_defaulted()
    }

    /// Whether the node is an argument bundle and every declared argument
    /// resolves a default.
    pub fn is_fully_defaulted(&self) -> bool {
        self.arguments().is_some_and(|children| {
            children
                .values()
                .all(|child| child.as_ref().is_some_and(SchemaNode::has_default))
        })
    }
}

fn normalize(
    path: &DiagnosticPath,
    schema: Value,
    registry: &TypeRegistry,
) -> Result<Option<SchemaNode>, SchemaError> {
    let node = match schema {
        Value::Object(node) if !node.is_empty() => node,
        _ => return Ok(None),
    };
    let module = module_name(path, &node)?.map(str::to_string);
    let mut fields = FallbackAttrMap::from(node);

    for key in fields.keys() {
        if ![TYPE_KEY, MODULE_KEY, DEFAULT_KEY, ARGUMENTS_KEY, ELEMENTS_KEY, MAPPING_KEY].contains(&key) {
            tracing::warn!(path = %path, key, "ignoring unrecognized schema key");
        }
    }

    let (type_name, ty) = match fields.take_attr(TYPE_KEY) {
        None | Some(Value::Null) => (None, None),
        Some(name) => {
            let ty = registry.resolve(module.as_deref(), &name).ok_or_else(|| {
                SchemaError::TypeNotFound {
                    path: path.to_string(),
                    name: type_name_of(&name),
                    module: module.clone(),
                }
            })?;
            (Some(type_name_of(&name)), Some(ty))
        }
    };

    let default = fields.take_attr(DEFAULT_KEY).filter(|value| !value.is_null());

    let shape = if let Some(children) = fields.take_attr(ARGUMENTS_KEY) {
        Shape::Arguments(normalize_children(path, ARGUMENTS_KEY, children, registry)?)
    } else if let Some(elements) = fields.take_attr(ELEMENTS_KEY) {
        let item = normalize(&path.key(ELEMENTS_KEY), elements, registry)?;
        Shape::Elements(item.map(Box::new))
    } else if let Some(children) = fields.take_attr(MAPPING_KEY) {
        Shape::Mapping(normalize_children(path, MAPPING_KEY, children, registry)?)
    } else {
        Shape::Single
    };

    Ok(Some(SchemaNode {
        type_name,
        module,
        ty,
        default,
        shape,
    }))
}

fn normalize_children(
    path: &DiagnosticPath,
    field: &'static str,
    children: Value,
    registry: &TypeRegistry,
) -> Result<Children, SchemaError> {
    children_of(path, field, &children)?;
    let field_path = path.key(field);
    let mut normalized = Children::new();
    if let Value::Object(children) = children {
        for (name, child) in children {
            let child = normalize(&field_path.key(&name), child, registry)?;
            normalized.insert(name, child);
        }
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(schema: Value) -> Option<SchemaNode> {
        SchemaNode::compile(schema, &TypeRegistry::with_builtins()).unwrap()
    }

    #[test]
    fn test_empty_schema_accepts_anything() {
        assert!(compile(json!(null)).is_none());
        assert!(compile(json!({})).is_none());
    }

    #[test]
    fn test_optional_fields() {
        let node = compile(json!({"type": "int", "default": 42})).unwrap();
        assert_eq!(node.type_name(), Some("int"));
        assert_eq!(node.ty().map(|t| t.name()), Some("int"));
        assert_eq!(node.default(), Some(&json!(42)));
        assert!(node.module().is_none());
        assert!(matches!(node.shape(), Shape::Single));
    }

    #[test]
    fn test_null_default_is_no_default() {
        let node = compile(json!({"type": "int", "default": null})).unwrap();
        assert!(node.default().is_none());
        assert!(!node.has_default());
    }

    #[test]
    fn test_elements_shape() {
        let node = compile(json!({"type": "list", "elements": {"type": "int"}})).unwrap();
        match node.shape() {
            Shape::Elements(Some(item)) => assert_eq!(item.type_name(), Some("int")),
            other => panic!("expected elements, got {other:?}"),
        }
        let node = compile(json!({"type": "list", "elements": null})).unwrap();
        assert!(matches!(node.shape(), Shape::Elements(None)));
    }

    #[test]
    fn test_mapping_children() {
        let node = compile(json!({"type": "dict", "mapping": {"foo": {}, "bar": {"type": "str"}}})).unwrap();
        match node.shape() {
            Shape::Mapping(children) => {
                assert!(children["foo"].is_none());
                assert_eq!(children["bar"].as_ref().and_then(|c| c.type_name()), Some("str"));
            }
            other => panic!("expected mapping, got {other:?}"),
        }
    }

    #[test]
    fn test_fully_defaulted_arguments() {
        let node = compile(json!({
            "type": "dict",
            "arguments": {
                "a": {"default": 1},
                "b": {"arguments": {"c": {"default": 2}}}
            }
        }))
        .unwrap();
        assert!(node.is_fully_defaulted());
        assert!(node.has_default());

        let node = compile(json!({"type": "dict", "arguments": {"a": {"default": 1}, "b": {}}})).unwrap();
        assert!(!node.is_fully_defaulted());
    }

    #[test]
    fn test_empty_arguments_are_fully_defaulted() {
        let node = compile(json!({"type": "dict", "arguments": {}})).unwrap();
        assert!(node.is_fully_defaulted());
    }

    #[test]
    fn test_compile_rejects_invalid_schema() {
        let err = SchemaNode::compile(json!({"elements": {}, "mapping": {}}), &TypeRegistry::with_builtins())
            .unwrap_err();
        assert!(matches!(err, SchemaError::ExclusiveKeys { .. }));
    }
}
