//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout definitions. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Schema errors are raised only while a schema is being validated.
//! - Definition errors are raised while a definition is parsed and always
//!   carry the diagnostic path of the offending node (`root.key[2]`).
//! - Construction errors are raised by type constructors. The parser
//!   translates them into `DefinitionError::Construction`, so callers of
//!   the parser never observe them directly.

use thiserror::Error;

/// Top-level error type for definitions.
#[derive(Error, Debug)]
pub enum DefsError {
    /// The schema is not well-formed.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The definition does not satisfy the schema.
    #[error("definition error: {0}")]
    Definition(#[from] DefinitionError),

    /// Attribute access on a parsed result failed.
    #[error("attribute error: {0}")]
    Attribute(#[from] AttributeError),

    /// A schema or definition source could not be loaded.
    #[error("load error: {0}")]
    Load(String),

    /// Parser configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A schema node is not well-formed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A schema node is neither absent nor a keyed mapping.
    #[error("{path}: schema must be nested mappings, found {found}")]
    NotAMapping {
        /// Location of the node within the schema.
        path: String,
        /// Kind of value found instead.
        found: &'static str,
    },

    /// `arguments` or `mapping` is present but is not a keyed mapping.
    #[error("{path}: {field} must be a mapping, found {found}")]
    FieldNotAMapping {
        /// Location of the node within the schema.
        path: String,
        /// The offending structural key.
        field: &'static str,
        /// Kind of value found instead.
        found: &'static str,
    },

    /// `type` or `module` is present but is not a string.
    #[error("{path}: {field} must be a string, found {found}")]
    FieldNotAString {
        /// Location of the node within the schema.
        path: String,
        /// The offending key.
        field: &'static str,
        /// Kind of value found instead.
        found: &'static str,
    },

    /// More than one of `arguments`, `elements`, `mapping` on one node.
    #[error("{path}: {} are mutually exclusive", .keys.join(", "))]
    ExclusiveKeys {
        /// Location of the node within the schema.
        path: String,
        /// The structural keys present on the node.
        keys: Vec<&'static str>,
    },

    /// The declared type is not registered.
    #[error("{path}: type {name} not found in module {}", .module.as_deref().unwrap_or("builtins"))]
    TypeNotFound {
        /// Location of the node within the schema.
        path: String,
        /// The declared type name.
        name: String,
        /// The declared module, if any.
        module: Option<String>,
    },
}

impl SchemaError {
    /// Location of the offending node within the schema.
    pub fn path(&self) -> &str {
        match self {
            Self::NotAMapping { path, .. }
            | Self::FieldNotAMapping { path, .. }
            | Self::FieldNotAString { path, .. }
            | Self::ExclusiveKeys { path, .. }
            | Self::TypeNotFound { path, .. } => path,
        }
    }
}

/// A definition does not satisfy its schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// No schema constrains this node, but a value is still required.
    #[error("{path}: no value for required argument")]
    MissingValue {
        /// Diagnostic path of the node.
        path: String,
    },

    /// The value was omitted and the schema provides no default.
    #[error("{path}: omitted value that has no default")]
    NoDefault {
        /// Diagnostic path of the node.
        path: String,
    },

    /// The schema declares a mapping but the definition is not one.
    #[error("{path}: expected a mapping, found {found}")]
    ExpectedMapping {
        /// Diagnostic path of the node.
        path: String,
        /// Kind of value found instead.
        found: &'static str,
    },

    /// The schema declares elements but the definition is not a sequence.
    #[error("{path}: expected a sequence, found {found}")]
    ExpectedSequence {
        /// Diagnostic path of the node.
        path: String,
        /// Kind of value found instead.
        found: &'static str,
    },

    /// The definition has a key that the closed mapping does not declare.
    #[error("{path}: unexpected mapping key {key}")]
    UnexpectedKey {
        /// Diagnostic path of the mapping.
        path: String,
        /// The undeclared key.
        key: String,
    },

    /// A type override names a type that is not registered.
    #[error("{path}: type {name} not found")]
    UnknownType {
        /// Diagnostic path of the node.
        path: String,
        /// The requested type name.
        name: String,
    },

    /// A type override does not conform to the declared base type.
    #[error("{path}: {subtype} does not inherit from {base}")]
    NotSubtype {
        /// Diagnostic path of the node.
        path: String,
        /// The requested type.
        subtype: String,
        /// The declared base type.
        base: String,
    },

    /// The target type rejected the assembled arguments.
    #[error("{path}: cannot instantiate {type_name} from {arguments}. {reason}")]
    Construction {
        /// Diagnostic path of the node.
        path: String,
        /// Name of the type that failed to construct.
        type_name: String,
        /// Rendering of the arguments that were passed.
        arguments: String,
        /// Message of the underlying construction failure.
        reason: String,
    },

    /// The configured recursion limit was reached.
    #[error("{path}: recursion depth limit of {limit} exceeded")]
    DepthExceeded {
        /// Diagnostic path of the node.
        path: String,
        /// The configured limit.
        limit: usize,
    },
}

impl DefinitionError {
    /// Diagnostic path of the offending node.
    pub fn path(&self) -> &str {
        match self {
            Self::MissingValue { path }
            | Self::NoDefault { path }
            | Self::ExpectedMapping { path, .. }
            | Self::ExpectedSequence { path, .. }
            | Self::UnexpectedKey { path, .. }
            | Self::UnknownType { path, .. }
            | Self::NotSubtype { path, .. }
            | Self::Construction { path, .. }
            | Self::DepthExceeded { path, .. } => path,
        }
    }
}

/// Raised by a type constructor that rejects its arguments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructError {
    /// A required parameter was neither passed by keyword nor by position.
    #[error("missing required argument '{0}'")]
    MissingArgument(String),

    /// A keyword argument that no parameter consumed.
    #[error("unexpected keyword argument '{0}'")]
    UnexpectedKeyword(String),

    /// More positional arguments than the constructor accepts.
    #[error("takes {expected} positional argument(s) but {given} were given")]
    TooManyPositional {
        /// Number of positional arguments consumed.
        expected: usize,
        /// Number of positional arguments passed.
        given: usize,
    },

    /// An argument has the wrong kind or an invalid value.
    #[error("{0}")]
    Invalid(String),
}

impl ConstructError {
    /// Shorthand for [`ConstructError::Invalid`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Attribute access on an attribute view failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeError {
    /// The attribute is not present.
    #[error("no attribute '{0}'")]
    Missing(String),

    /// Writes are only allowed to attributes that already exist.
    #[error("cannot add attribute '{0}' to a closed attribute view")]
    Closed(String),

    /// The value is not an attribute view.
    #[error("{0} has no attributes")]
    NotAnAttrView(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_error_carries_path() {
        let err = DefinitionError::UnexpectedKey {
            path: "root.layers[2]".to_string(),
            key: "extra".to_string(),
        };
        assert_eq!(err.path(), "root.layers[2]");
        assert_eq!(err.to_string(), "root.layers[2]: unexpected mapping key extra");
    }

    #[test]
    fn test_exclusive_keys_display_names_keys() {
        let err = SchemaError::ExclusiveKeys {
            path: "root".to_string(),
            keys: vec!["arguments", "elements"],
        };
        assert_eq!(err.to_string(), "root: arguments, elements are mutually exclusive");
    }

    #[test]
    fn test_type_not_found_without_module() {
        let err = SchemaError::TypeNotFound {
            path: "root".to_string(),
            name: "Foo".to_string(),
            module: None,
        };
        assert!(err.to_string().contains("not found in module builtins"));
    }

    #[test]
    fn test_defs_error_from_definition_error() {
        let err: DefsError = DefinitionError::NoDefault {
            path: "root".to_string(),
        }
        .into();
        assert!(matches!(err, DefsError::Definition(_)));
        assert!(err.to_string().contains("omitted value that has no default"));
    }
}
