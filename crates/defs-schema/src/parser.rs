//! # Definition Parser
//!
//! Walks a definition in lock-step with its compiled schema and builds
//! the parsed object graph.
//!
//! ## Dispatch
//!
//! For every node, in order:
//!
//! 1. No schema: the definition is returned unchanged. It must still be
//!    present.
//! 2. No definition: the schema's default is parsed in its place. A node
//!    whose declared arguments all resolve defaults is built from an empty
//!    argument bundle. Anything else fails.
//! 3. `arguments`: a mapping definition supplies keyword arguments and an
//!    optional `type` override; a scalar is a single value.
//! 4. `mapping`: a closed mapping passed to the declared type.
//! 5. `elements`: a sequence whose items share one schema, passed to the
//!    declared type.
//! 6. Single value: a bare name of a conforming type selects that type;
//!    anything else becomes the sole constructor argument.
//!
//! `null` in a definition means "absent" everywhere.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use defs_core::{
    inherits_from, value_kind, Arguments, DefinitionError, DefsError, DiagnosticPath, Parsed,
    SchemaError, TypeRegistry,
};

use crate::config::ParserConfig;
use crate::instantiate::instantiate;
use crate::node::{Children, SchemaNode, Shape};
use crate::source::load_source;
use crate::validate::{type_name_of, TYPE_KEY};

/// Parses definitions against one compiled schema.
///
/// A parser is immutable after construction and can be shared between
/// threads.
#[derive(Debug, Clone)]
pub struct Parser {
    registry: Arc<TypeRegistry>,
    schema: Option<SchemaNode>,
    config: ParserConfig,
}

impl Parser {
    /// Compile `schema` against `registry` with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the schema is not well-formed.
    pub fn new(registry: Arc<TypeRegistry>, schema: Value) -> Result<Self, SchemaError> {
        Self::with_config(registry, schema, ParserConfig::default())
    }

    /// Compile `schema` against `registry` with an explicit configuration.
    pub fn with_config(
        registry: Arc<TypeRegistry>,
        schema: Value,
        config: ParserConfig,
    ) -> Result<Self, SchemaError> {
        let schema = SchemaNode::compile(schema, &registry)?;
        tracing::debug!(
            shape = schema.as_ref().map_or("any", |s| s.shape().name()),
            type_name = schema.as_ref().and_then(SchemaNode::type_name),
            "compiled schema"
        );
        Ok(Self {
            registry,
            schema,
            config,
        })
    }

    /// Load the schema from a file path or inline YAML and compile it.
    pub fn from_source(
        registry: Arc<TypeRegistry>,
        text: &str,
        config: ParserConfig,
    ) -> Result<Self, DefsError> {
        let schema = load_source(text)?;
        Ok(Self::with_config(registry, schema, config)?)
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The compiled schema; `None` accepts anything.
    pub fn schema(&self) -> Option<&SchemaNode> {
        self.schema.as_ref()
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a definition, wrapping mappings in attribute views as
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns the first `DefinitionError` encountered; a single invalid
    /// node rejects the whole definition.
    pub fn parse(&self, definition: &Value) -> Result<Parsed, DefinitionError> {
        self.parse_with(definition, self.config.attrdicts)
    }

    /// Parse a definition, choosing per call whether mappings in the
    /// result are wrapped in attribute views.
    pub fn parse_with(&self, definition: &Value, attrdicts: bool) -> Result<Parsed, DefinitionError> {
        tracing::debug!(attrdicts, kind = value_kind(definition), "parsing definition");
        let walk = Walk {
            registry: &self.registry,
            max_depth: self.config.max_depth,
        };
        let parsed = walk.node(&DiagnosticPath::root(), self.schema.as_ref(), Some(definition))?;
        tracing::debug!(kind = parsed.kind(), "parsed definition");
        Ok(if attrdicts { parsed.into_attrs() } else { parsed })
    }

    /// Load a definition from a file path or inline YAML and parse it.
    pub fn parse_source(&self, text: &str) -> Result<Parsed, DefsError> {
        let definition = load_source(text)?;
        Ok(self.parse(&definition)?)
    }
}

/// State of one parse call.
struct Walk<'a> {
    registry: &'a TypeRegistry,
    max_depth: Option<usize>,
}

impl Walk<'_> {
    fn node(
        &self,
        path: &DiagnosticPath,
        schema: Option<&SchemaNode>,
        definition: Option<&Value>,
    ) -> Result<Parsed, DefinitionError> {
        self.check_depth(path)?;
        let definition = definition.filter(|d| !d.is_null());
        match (schema, definition) {
            (None, Some(definition)) => self.passthrough(path, definition),
            (None, None) => Err(DefinitionError::MissingValue {
                path: path.to_string(),
            }),
            (Some(schema), None) => self.default(path, schema),
            (Some(schema), Some(definition)) => self.dispatch(path, schema, definition),
        }
    }

    fn dispatch(
        &self,
        path: &DiagnosticPath,
        schema: &SchemaNode,
        definition: &Value,
    ) -> Result<Parsed, DefinitionError> {
        tracing::trace!(path = %path, shape = schema.shape().name(), "dispatch");
        match (schema.shape(), definition) {
            (Shape::Arguments(children), Value::Object(bundle)) => {
                self.arguments(path, schema, Some(children), bundle)
            }
            (Shape::Arguments(_), _) => self.single(path, schema, definition),
            (Shape::Mapping(children), _) => self.mapping(path, schema, children, definition),
            (Shape::Elements(item), _) => {
                self.elements(path, schema, item.as_deref(), definition)
            }
            (Shape::Single, _) if schema.ty().is_none() => self.passthrough(path, definition),
            (Shape::Single, Value::Object(bundle)) => self.arguments(path, schema, None, bundle),
            (Shape::Single, _) => self.single(path, schema, definition),
        }
    }

    /// Omitted value: parse the default, or build from an all-default
    /// argument bundle.
    fn default(&self, path: &DiagnosticPath, schema: &SchemaNode) -> Result<Parsed, DefinitionError> {
        if let Some(default) = schema.default() {
            tracing::trace!(path = %path, "using schema default");
            return self.dispatch(path, schema, default);
        }
        if schema.is_fully_defaulted() {
            tracing::trace!(path = %path, "building from argument defaults");
            return self.arguments(path, schema, schema.arguments(), &Map::new());
        }
        Err(DefinitionError::NoDefault {
            path: path.to_string(),
        })
    }

    fn arguments(
        &self,
        path: &DiagnosticPath,
        schema: &SchemaNode,
        declared: Option<&Children>,
        bundle: &Map<String, Value>,
    ) -> Result<Parsed, DefinitionError> {
        let target = match bundle.get(TYPE_KEY).filter(|name| !name.is_null()) {
            Some(name) => {
                let subtype = self.registry.resolve(schema.module(), name).ok_or_else(|| {
                    DefinitionError::UnknownType {
                        path: path.to_string(),
                        name: type_name_of(name),
                    }
                })?;
                if let Some(base) = schema.ty() {
                    if !inherits_from(&subtype, base) {
                        return Err(DefinitionError::NotSubtype {
                            path: path.to_string(),
                            subtype: subtype.name().to_string(),
                            base: base.name().to_string(),
                        });
                    }
                }
                Some(subtype)
            }
            None => schema.ty().cloned(),
        };

        let mut keywords = BTreeMap::new();
        if let Some(declared) = declared {
            for (name, child) in declared {
                let value = self.node(&path.key(name), child.as_ref(), bundle.get(name))?;
                keywords.insert(name.clone(), value);
            }
        }
        for (name, value) in bundle {
            if name == TYPE_KEY || declared.is_some_and(|d| d.contains_key(name)) {
                continue;
            }
            keywords.insert(name.clone(), self.passthrough(&path.key(name), value)?);
        }

        match target {
            Some(ty) => instantiate(path, &ty, Arguments::keywords(keywords)),
            None => Ok(Parsed::Map(keywords)),
        }
    }

    fn mapping(
        &self,
        path: &DiagnosticPath,
        schema: &SchemaNode,
        children: &Children,
        definition: &Value,
    ) -> Result<Parsed, DefinitionError> {
        let Value::Object(entries) = definition else {
            return Err(DefinitionError::ExpectedMapping {
                path: path.to_string(),
                found: value_kind(definition),
            });
        };
        if let Some(key) = entries.keys().find(|key| !children.contains_key(*key)) {
            return Err(DefinitionError::UnexpectedKey {
                path: path.to_string(),
                key: key.clone(),
            });
        }
        let mut parsed = BTreeMap::new();
        for (key, child) in children {
            let value = self.node(&path.key(key), child.as_ref(), entries.get(key))?;
            parsed.insert(key.clone(), value);
        }
        self.construct_or(path, schema, Parsed::Map(parsed))
    }

    fn elements(
        &self,
        path: &DiagnosticPath,
        schema: &SchemaNode,
        item: Option<&SchemaNode>,
        definition: &Value,
    ) -> Result<Parsed, DefinitionError> {
        let Value::Array(items) = definition else {
            return Err(DefinitionError::ExpectedSequence {
                path: path.to_string(),
                found: value_kind(definition),
            });
        };
        let parsed = items
            .iter()
            .enumerate()
            .map(|(i, value)| self.node(&path.index(i), item, Some(value)))
            .collect::<Result<Vec<_>, _>>()?;
        self.construct_or(path, schema, Parsed::Seq(parsed))
    }

    /// A bare type name or a single constructor argument.
    fn single(
        &self,
        path: &DiagnosticPath,
        schema: &SchemaNode,
        definition: &Value,
    ) -> Result<Parsed, DefinitionError> {
        let Some(base) = schema.ty() else {
            return self.passthrough(path, definition);
        };
        if let Some(subtype) = self.registry.resolve(schema.module(), definition) {
            if inherits_from(&subtype, base) {
                tracing::trace!(path = %path, type_name = subtype.name(), "selected type by name");
                let mut bundle = Map::new();
                bundle.insert(TYPE_KEY.to_string(), definition.clone());
                return self.arguments(path, schema, schema.arguments(), &bundle);
            }
        }
        let value = match schema.arguments() {
            Some(declared) if declared.len() == 1 => match declared.iter().next() {
                Some((name, child)) => self.node(&path.key(name), child.as_ref(), Some(definition))?,
                None => self.passthrough(path, definition)?,
            },
            _ => self.passthrough(path, definition)?,
        };
        instantiate(path, base, Arguments::positional(value))
    }

    fn construct_or(
        &self,
        path: &DiagnosticPath,
        schema: &SchemaNode,
        value: Parsed,
    ) -> Result<Parsed, DefinitionError> {
        match schema.ty() {
            Some(ty) => instantiate(path, ty, Arguments::positional(value)),
            None => Ok(value),
        }
    }

    /// Copy a value without a schema, honoring the depth limit.
    fn passthrough(&self, path: &DiagnosticPath, value: &Value) -> Result<Parsed, DefinitionError> {
        self.check_depth(path)?;
        Ok(match value {
            Value::Array(items) => Parsed::Seq(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.passthrough(&path.index(i), item))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(entries) => Parsed::Map(
                entries
                    .iter()
                    .map(|(key, item)| Ok((key.clone(), self.passthrough(&path.key(key), item)?)))
                    .collect::<Result<_, DefinitionError>>()?,
            ),
            scalar => Parsed::from_value(scalar),
        })
    }

    fn check_depth(&self, path: &DiagnosticPath) -> Result<(), DefinitionError> {
        match self.max_depth {
            Some(limit) if path.depth() > limit => Err(DefinitionError::DepthExceeded {
                path: path.to_string(),
                limit,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use defs_core::{AttributeError, TypeDef};
    use serde_json::json;

    fn parser(schema: Value) -> Parser {
        Parser::new(Arc::new(TypeRegistry::with_standard_modules()), schema).unwrap()
    }

    #[derive(Debug, PartialEq)]
    struct Sides {
        sides: i64,
    }

    fn registry_with_polygon() -> Arc<TypeRegistry> {
        let mut registry = TypeRegistry::with_builtins();
        let polygon = TypeDef::class("Polygon", |args| {
            Ok(Sides {
                sides: args.take_i64(0, "sides")?,
            })
        })
        .in_module("geometry")
        .into_ref();
        let triangle = TypeDef::class("Triangle", |args| {
            args.take_opt(0, "sides")?;
            Ok(Sides { sides: 3 })
        })
        .extends(&polygon)
        .in_module("geometry")
        .into_ref();
        registry.register(polygon);
        registry.register(triangle);
        Arc::new(registry)
    }

    #[test]
    fn test_untyped_schema_passes_definition_through() {
        let p = parser(json!({}));
        assert_eq!(p.parse(&json!(13)).unwrap(), Parsed::Int(13));
        assert_eq!(p.parse(&json!([1, 2, "Foo"])).unwrap(), json!([1, 2, "Foo"]));
        let err = p.parse(&Value::Null).unwrap_err();
        assert!(matches!(err, DefinitionError::MissingValue { .. }));
    }

    #[test]
    fn test_default_replaces_omitted_value() {
        let p = parser(json!({"default": 42}));
        assert_eq!(p.parse(&Value::Null).unwrap(), Parsed::Int(42));
        assert_eq!(p.parse(&json!(13)).unwrap(), Parsed::Int(13));
    }

    #[test]
    fn test_typed_default_is_parsed() {
        let p = parser(json!({"type": "int", "default": "7"}));
        assert_eq!(p.parse(&Value::Null).unwrap(), Parsed::Int(7));
    }

    #[test]
    fn test_omitted_without_default() {
        let p = parser(json!({"type": "int"}));
        let err = p.parse(&Value::Null).unwrap_err();
        assert_eq!(err, DefinitionError::NoDefault { path: "root".into() });
    }

    #[test]
    fn test_elements() {
        let p = parser(json!({"type": "List", "elements": {"type": "Int"}}));
        assert_eq!(p.parse(&json!([1, 2, 3])).unwrap(), json!([1, 2, 3]));
        assert!(matches!(
            p.parse(&json!("notalist")).unwrap_err(),
            DefinitionError::ExpectedSequence { found: "string", .. }
        ));
        let err = p.parse(&json!([1, "x"])).unwrap_err();
        assert_eq!(err.path(), "root[1]");
        assert!(matches!(err, DefinitionError::Construction { .. }));
    }

    #[test]
    fn test_mapping_is_closed() {
        let p = parser(json!({"type": "Dict", "mapping": {"foo": {}}}));
        let parsed = p.parse(&json!({"foo": "bar"})).unwrap();
        assert_eq!(parsed.attr("foo"), Ok(&Parsed::Str("bar".into())));
        let err = p.parse(&json!({"foo": "bar", "extra": 1})).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::UnexpectedKey {
                path: "root".into(),
                key: "extra".into()
            }
        );
    }

    #[test]
    fn test_mapping_requires_declared_keys() {
        let p = parser(json!({"type": "dict", "mapping": {"foo": {}, "bar": {"default": 1}}}));
        let parsed = p.parse(&json!({"foo": 0})).unwrap();
        assert_eq!(parsed, json!({"foo": 0, "bar": 1}));
        let err = p.parse(&json!({"bar": 2})).unwrap_err();
        assert_eq!(err.path(), "root.foo");
    }

    #[test]
    fn test_attrdicts_can_be_disabled() {
        let p = parser(json!({"type": "dict", "mapping": {"foo": {}}}));
        let parsed = p.parse_with(&json!({"foo": "bar"}), false).unwrap();
        assert_eq!(parsed.get("foo"), Some(&Parsed::Str("bar".into())));
        assert_eq!(parsed.attr("foo"), Err(AttributeError::NotAnAttrView("mapping")));
    }

    #[test]
    fn test_type_override_and_shorthand() {
        let schema = json!({"type": "Polygon", "module": "geometry", "arguments": {"sides": {"type": "int", "default": 4}}});
        let p = Parser::new(registry_with_polygon(), schema).unwrap();

        let square = p.parse(&Value::Null).unwrap();
        assert_eq!(square.downcast_ref::<Sides>(), Some(&Sides { sides: 4 }));

        let triangle = p.parse(&json!({"type": "Triangle"})).unwrap();
        assert_eq!(triangle.as_object().map(|o| o.type_name()), Some("Triangle"));

        let shorthand = p.parse(&json!("Triangle")).unwrap();
        assert_eq!(shorthand.as_object().map(|o| o.type_name()), Some("Triangle"));
    }

    #[test]
    fn test_override_must_conform() {
        let schema = json!({"type": "Triangle", "module": "geometry"});
        let p = Parser::new(registry_with_polygon(), schema).unwrap();
        let err = p.parse(&json!({"type": "Polygon", "sides": 5})).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::NotSubtype {
                path: "root".into(),
                subtype: "Polygon".into(),
                base: "Triangle".into()
            }
        );
        let err = p.parse(&json!({"type": "Hexagon"})).unwrap_err();
        assert!(matches!(err, DefinitionError::UnknownType { ref name, .. } if name == "Hexagon"));
    }

    #[test]
    fn test_single_scalar_under_one_argument() {
        let schema = json!({"type": "Polygon", "module": "geometry", "arguments": {"sides": {"type": "int"}}});
        let p = Parser::new(registry_with_polygon(), schema).unwrap();
        let parsed = p.parse(&json!("6")).unwrap();
        assert_eq!(parsed.downcast_ref::<Sides>(), Some(&Sides { sides: 6 }));
    }

    #[test]
    fn test_undeclared_arguments_pass_through() {
        let p = parser(json!({"type": "dict", "arguments": {"a": {"type": "int"}}}));
        let parsed = p.parse_with(&json!({"a": "1", "b": [true]}), false).unwrap();
        assert_eq!(parsed, json!({"a": 1, "b": [true]}));
    }

    #[test]
    fn test_untyped_structural_nodes() {
        let p = parser(json!({"elements": {"type": "float"}}));
        assert_eq!(p.parse(&json!([1, 2])).unwrap(), json!([1.0, 2.0]));
        let p = parser(json!({"arguments": {"x": {"default": 0}}}));
        assert_eq!(p.parse(&Value::Null).unwrap(), json!({"x": 0}));
    }

    #[test]
    fn test_construction_error_names_arguments() {
        let p = parser(json!({"type": "date", "module": "datetime", "arguments": {
            "year": {"type": "int"}, "month": {"type": "int"}, "day": {"type": "int"}
        }}));
        let err = p.parse(&json!({"year": 2020, "month": 2, "day": 30})).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("root: cannot instantiate date from args=[] and kwargs={"));
        assert!(message.ends_with("day is out of range for month"));
    }

    #[test]
    fn test_depth_limit() {
        let registry = Arc::new(TypeRegistry::with_builtins());
        let config = ParserConfig::default().with_max_depth(2);
        let p = Parser::with_config(registry, json!({}), config).unwrap();
        p.parse(&json!({"a": {"b": 1}})).unwrap();
        let err = p.parse(&json!({"a": {"b": {"c": 1}}})).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DepthExceeded {
                path: "root.a.b.c".into(),
                limit: 2
            }
        );
    }

    #[test]
    fn test_parser_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Parser>();
    }
}
