//! # Type Registry
//!
//! Resolves type names from schemas and definitions to constructible
//! types. A registry holds one built-in namespace and any number of named
//! module namespaces. A name is looked up in the requested module first
//! and then among the built-ins.
//!
//! Registries are populated at startup by whichever code defines the
//! constructible types and are read-only afterwards. They are `Send +
//! Sync` and carry no interior mutability, so resolution is a pure
//! lookup with no import side effects.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::builtins;
use crate::types::TypeRef;

/// Names bound to types within one module.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    types: HashMap<String, TypeRef>,
}

impl Namespace {
    pub fn get(&self, name: &str) -> Option<&TypeRef> {
        self.types.get(name)
    }

    /// Bind `name` to `ty`, returning the previous binding.
    pub fn bind(&mut self, name: impl Into<String>, ty: TypeRef) -> Option<TypeRef> {
        self.types.insert(name.into(), ty)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Bound names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Built-in and module namespaces for type resolution.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    builtins: Namespace,
    modules: HashMap<String, Namespace>,
}

impl TypeRegistry {
    /// A registry holding the built-in types (`object`, `bool`, `int`,
    /// `float`, `str`, `list`, `dict`) and their capitalized aliases.
    pub fn with_builtins() -> Self {
        Self {
            builtins: builtins::namespace(),
            modules: HashMap::new(),
        }
    }

    /// Built-ins plus the standard modules (`datetime`).
    pub fn with_standard_modules() -> Self {
        let mut registry = Self::with_builtins();
        registry.register(builtins::date_type());
        registry
    }

    /// Register a type under its own name in its declared module, or among
    /// the built-ins if it declares none. Returns the previous binding.
    pub fn register(&mut self, ty: TypeRef) -> Option<TypeRef> {
        let name = ty.name().to_string();
        let module = ty.module().map(str::to_string);
        self.bind(module.as_deref(), name, ty)
    }

    /// Bind an additional name to a type.
    pub fn bind(
        &mut self,
        module: Option<&str>,
        name: impl Into<String>,
        ty: TypeRef,
    ) -> Option<TypeRef> {
        let namespace = match module {
            Some(module) => self.modules.entry(module.to_string()).or_default(),
            None => &mut self.builtins,
        };
        namespace.bind(name, ty)
    }

    /// The root type every type inherits from.
    pub fn object(&self) -> Option<&TypeRef> {
        self.builtins.get("object")
    }

    pub fn builtins(&self) -> &Namespace {
        &self.builtins
    }

    pub fn module(&self, name: &str) -> Option<&Namespace> {
        self.modules.get(name)
    }

    /// Registered module names, sorted.
    pub fn module_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a type reference taken from a schema or definition.
    ///
    /// Only strings name types; any other value resolves to nothing.
    pub fn resolve(&self, module: Option<&str>, name: &Value) -> Option<TypeRef> {
        name.as_str()
            .and_then(|name| self.resolve_name(module, name))
    }

    /// Resolve a type name, searching `module` (if any) before the
    /// built-ins. An unknown module contributes no names.
    pub fn resolve_name(&self, module: Option<&str>, name: &str) -> Option<TypeRef> {
        module
            .and_then(|m| self.modules.get(m))
            .and_then(|ns| ns.get(name))
            .or_else(|| self.builtins.get(name))
            .map(Arc::clone)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
