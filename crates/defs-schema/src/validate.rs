//! # Schema Validation
//!
//! Checks that a schema tree is well-formed before any definition is
//! parsed against it. Validation is a read-only traversal; the only
//! outside state it consults is the type registry.
//!
//! ## Rules
//!
//! - A node is absent (`null`), empty (`{}`, accept anything), or a
//!   keyed mapping.
//! - `module`, when present, is a string.
//! - `type`, when present, resolves in `module` or the built-ins.
//! - At most one of `arguments`, `elements`, `mapping` is present.
//! - `arguments` and `mapping` are keyed mappings whose values are schema
//!   nodes; `elements` is a single schema node.

use serde_json::{Map, Value};

use defs_core::{value_kind, DiagnosticPath, SchemaError, TypeRegistry};

/// Key naming a node's target type.
pub const TYPE_KEY: &str = "type";
/// Key naming the module `type` is resolved in.
pub const MODULE_KEY: &str = "module";
/// Key holding the value used when a definition omits the node.
pub const DEFAULT_KEY: &str = "default";
/// Structural key binding constructor parameters to child schemas.
pub const ARGUMENTS_KEY: &str = "arguments";
/// Structural key describing every item of a sequence.
pub const ELEMENTS_KEY: &str = "elements";
/// Structural key describing a closed set of mapping keys.
pub const MAPPING_KEY: &str = "mapping";

/// Mutually exclusive structural keys, in reporting order.
pub const STRUCTURAL_KEYS: [&str; 3] = [ARGUMENTS_KEY, ELEMENTS_KEY, MAPPING_KEY];

/// Validates schema trees against a type registry.
#[derive(Debug, Clone, Copy)]
pub struct SchemaValidator<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> SchemaValidator<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Validate a whole schema tree.
    ///
    /// # Errors
    ///
    /// Returns the first `SchemaError` found, depth-first, with the path
    /// of the offending node.
    pub fn validate(&self, schema: &Value) -> Result<(), SchemaError> {
        self.validate_node(&DiagnosticPath::root(), schema)
    }

    fn validate_node(&self, path: &DiagnosticPath, schema: &Value) -> Result<(), SchemaError> {
        let node = match schema {
            Value::Null => return Ok(()),
            Value::Object(node) => node,
            other => {
                return Err(SchemaError::NotAMapping {
                    path: path.to_string(),
                    found: value_kind(other),
                })
            }
        };
        self.validate_type(path, node)?;
        validate_exclusives(path, node)?;
        self.validate_nested(path, node)
    }

    /// The declared type, if any, must be registered.
    fn validate_type(&self, path: &DiagnosticPath, node: &Map<String, Value>) -> Result<(), SchemaError> {
        let module = module_name(path, node)?;
        match node.get(TYPE_KEY) {
            None | Some(Value::Null) => Ok(()),
            Some(name) => match self.registry.resolve(module, name) {
                Some(_) => Ok(()),
                None => Err(SchemaError::TypeNotFound {
                    path: path.to_string(),
                    name: type_name_of(name),
                    module: module.map(str::to_string),
                }),
            },
        }
    }

    /// Recursively check nested schemas.
    fn validate_nested(&self, path: &DiagnosticPath, node: &Map<String, Value>) -> Result<(), SchemaError> {
        for field in [ARGUMENTS_KEY, MAPPING_KEY] {
            if let Some(children) = node.get(field) {
                let children = children_of(path, field, children)?;
                let field_path = path.key(field);
                for (name, child) in children {
                    self.validate_node(&field_path.key(name), child)?;
                }
            }
        }
        if let Some(elements) = node.get(ELEMENTS_KEY) {
            self.validate_node(&path.key(ELEMENTS_KEY), elements)?;
        }
        Ok(())
    }
}

/// Validate a schema tree against `registry`.
pub fn validate(schema: &Value, registry: &TypeRegistry) -> Result<(), SchemaError> {
    SchemaValidator::new(registry).validate(schema)
}

fn validate_exclusives(path: &DiagnosticPath, node: &Map<String, Value>) -> Result<(), SchemaError> {
    let present: Vec<&'static str> = STRUCTURAL_KEYS
        .into_iter()
        .filter(|key| node.contains_key(*key))
        .collect();
    if present.len() > 1 {
        return Err(SchemaError::ExclusiveKeys {
            path: path.to_string(),
            keys: present,
        });
    }
    Ok(())
}

pub(crate) fn module_name<'a>(
    path: &DiagnosticPath,
    node: &'a Map<String, Value>,
) -> Result<Option<&'a str>, SchemaError> {
    match node.get(MODULE_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(module)) => Ok(Some(module)),
        Some(other) => Err(SchemaError::FieldNotAString {
            path: path.to_string(),
            field: MODULE_KEY,
            found: value_kind(other),
        }),
    }
}

pub(crate) fn children_of<'a>(
    path: &DiagnosticPath,
    field: &'static str,
    value: &'a Value,
) -> Result<&'a Map<String, Value>, SchemaError> {
    match value {
        Value::Object(children) => Ok(children),
        other => Err(SchemaError::FieldNotAMapping {
            path: path.to_string(),
            field,
            found: value_kind(other),
        }),
    }
}

/// Render a type reference for diagnostics.
pub(crate) fn type_name_of(name: &Value) -> String {
    match name {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
