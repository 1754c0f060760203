//! # Type Descriptors
//!
//! Constructible types are described by [`TypeDef`] values and shared as
//! [`TypeRef`] (`Arc<TypeDef>`). Type identity is pointer identity: two
//! names bound to the same `TypeRef` denote the same type.
//!
//! A descriptor carries the type's name, the module it was declared in,
//! its nominal base types, and a constructor. Constructors receive the
//! assembled [`Arguments`] and bind parameters keyword-first, then by
//! position, the way a call with `*args, **kwargs` binds them.
//!
//! ## Subclass Conformance
//!
//! [`inherits_from`] holds when the candidate is the base itself or a
//! strict descendant of it through declared bases. Every type inherits
//! from the root `object` type. Polymorphic overrides in definitions are
//! only accepted when this predicate holds.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ConstructError;
use crate::value::Parsed;

/// Shared handle to a type descriptor.
pub type TypeRef = Arc<TypeDef>;

type ConstructorFn = dyn Fn(Arguments) -> Result<Constructed, ConstructError> + Send + Sync;

type DebugFn = fn(&(dyn Any + Send + Sync), &mut fmt::Formatter<'_>) -> fmt::Result;

/// A constructible type.
pub struct TypeDef {
    name: String,
    module: Option<String>,
    bases: Vec<TypeRef>,
    root: bool,
    constructor: Box<ConstructorFn>,
}

impl TypeDef {
    /// Describe a type whose constructor produces a plain value or an
    /// instance directly.
    pub fn new<F>(name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(Arguments) -> Result<Constructed, ConstructError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            module: None,
            bases: Vec::new(),
            root: false,
            constructor: Box::new(constructor),
        }
    }

    /// Describe a user type built from its arguments by `build`.
    ///
    /// Arguments left unconsumed by `build` are rejected, so a constructor
    /// only has to take the parameters it knows about.
    pub fn class<T, F>(name: impl Into<String>, build: F) -> Self
    where
        T: Any + fmt::Debug + Send + Sync,
        F: Fn(&mut Arguments) -> Result<T, ConstructError> + Send + Sync + 'static,
    {
        Self::new(name, move |mut args| {
            let value = build(&mut args)?;
            args.finish()?;
            Ok(Constructed::Instance(InstanceValue::new(value)))
        })
    }

    /// The root type every other type inherits from.
    pub(crate) fn object_root<F>(constructor: F) -> Self
    where
        F: Fn(Arguments) -> Result<Constructed, ConstructError> + Send + Sync + 'static,
    {
        let mut ty = Self::new("object", constructor);
        ty.root = true;
        ty
    }

    /// Declare a nominal base type.
    pub fn extends(mut self, base: &TypeRef) -> Self {
        self.bases.push(Arc::clone(base));
        self
    }

    /// Declare the module namespace the type is registered in.
    pub fn in_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Finish the descriptor.
    pub fn into_ref(self) -> TypeRef {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn bases(&self) -> &[TypeRef] {
        &self.bases
    }

    /// `module.name`, or just `name` for types outside any module.
    pub fn qualified_name(&self) -> String {
        match &self.module {
            Some(module) => format!("{module}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Invoke the constructor.
    pub fn construct(&self, args: Arguments) -> Result<Constructed, ConstructError> {
        (self.constructor)(args)
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field("module", &self.module)
            .field(
                "bases",
                &self.bases.iter().map(|b| b.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Whether `sub` is `base` or a strict descendant of it.
pub fn inherits_from(sub: &TypeDef, base: &TypeDef) -> bool {
    if base.root || std::ptr::eq(sub, base) {
        return true;
    }
    sub.bases.iter().any(|parent| inherits_from(parent, base))
}

/// Result of a constructor call.
#[derive(Debug, Clone)]
pub enum Constructed {
    /// A plain value (scalars, sequences, mappings).
    Value(Parsed),
    /// An instance of a user type; wrapped into `Parsed::Object` together
    /// with the type that built it.
    Instance(InstanceValue),
}

/// Type-erased instance payload.
#[derive(Clone)]
pub struct InstanceValue {
    value: Arc<dyn Any + Send + Sync>,
    debug: DebugFn,
}

impl InstanceValue {
    pub fn new<T>(value: T) -> Self
    where
        T: Any + fmt::Debug + Send + Sync,
    {
        Self {
            value: Arc::new(value),
            debug: debug_erased::<T>,
        }
    }

    /// Borrow the payload as its concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.value).downcast_ref::<T>()
    }

    /// Whether both handles share one payload.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for InstanceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.debug)(&*self.value, f)
    }
}

fn debug_erased<T>(value: &(dyn Any + Send + Sync), f: &mut fmt::Formatter<'_>) -> fmt::Result
where
    T: Any + fmt::Debug,
{
    match value.downcast_ref::<T>() {
        Some(concrete) => fmt::Debug::fmt(concrete, f),
        None => f.write_str("<instance>"),
    }
}

/// Arguments assembled for a constructor call.
///
/// Parameters are consumed with [`Arguments::take`] and friends. Taken
/// positional slots are left empty so indices stay stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<Option<Parsed>>,
    keywords: BTreeMap<String, Parsed>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single positional argument.
    pub fn positional(value: Parsed) -> Self {
        Self {
            positional: vec![Some(value)],
            keywords: BTreeMap::new(),
        }
    }

    /// Keyword arguments only.
    pub fn keywords(keywords: BTreeMap<String, Parsed>) -> Self {
        Self {
            positional: Vec::new(),
            keywords,
        }
    }

    /// Append a positional argument.
    pub fn with_positional(mut self, value: Parsed) -> Self {
        self.positional.push(Some(value));
        self
    }

    /// Add a keyword argument.
    pub fn with_keyword(mut self, name: impl Into<String>, value: Parsed) -> Self {
        self.keywords.insert(name.into(), value);
        self
    }

    /// Whether no arguments remain.
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.positional.iter().all(Option::is_none)
    }

    /// Take a parameter by keyword, falling back to its position.
    ///
    /// # Errors
    ///
    /// `MissingArgument` if neither is present; `Invalid` if both are.
    pub fn take(&mut self, index: usize, name: &str) -> Result<Parsed, ConstructError> {
        self.take_opt(index, name)?
            .ok_or_else(|| ConstructError::MissingArgument(name.to_string()))
    }

    /// Take an optional parameter by keyword, falling back to its position.
    pub fn take_opt(&mut self, index: usize, name: &str) -> Result<Option<Parsed>, ConstructError> {
        let keyword = self.keywords.remove(name);
        let positional = self.take_positional(index);
        match (keyword, positional) {
            (Some(_), Some(_)) => Err(ConstructError::invalid(format!(
                "got multiple values for argument '{name}'"
            ))),
            (Some(value), None) | (None, Some(value)) => Ok(Some(value)),
            (None, None) => Ok(None),
        }
    }

    /// Take a positional argument.
    pub fn take_positional(&mut self, index: usize) -> Option<Parsed> {
        self.positional.get_mut(index).and_then(Option::take)
    }

    /// Take all remaining keyword arguments.
    pub fn take_keywords(&mut self) -> BTreeMap<String, Parsed> {
        std::mem::take(&mut self.keywords)
    }

    /// Take an integer parameter.
    pub fn take_i64(&mut self, index: usize, name: &str) -> Result<i64, ConstructError> {
        let value = self.take(index, name)?;
        value.as_i64().ok_or_else(|| {
            ConstructError::invalid(format!(
                "argument '{name}' must be an integer, not {}",
                value.kind()
            ))
        })
    }

    /// Take a numeric parameter. Integers are widened.
    pub fn take_f64(&mut self, index: usize, name: &str) -> Result<f64, ConstructError> {
        let value = self.take(index, name)?;
        value.as_f64().ok_or_else(|| {
            ConstructError::invalid(format!(
                "argument '{name}' must be a number, not {}",
                value.kind()
            ))
        })
    }

    /// Take a string parameter.
    pub fn take_string(&mut self, index: usize, name: &str) -> Result<String, ConstructError> {
        match self.take(index, name)? {
            Parsed::Str(s) => Ok(s),
            other => Err(ConstructError::invalid(format!(
                "argument '{name}' must be a string, not {}",
                other.kind()
            ))),
        }
    }

    /// Reject anything the constructor did not consume.
    pub fn finish(self) -> Result<(), ConstructError> {
        if let Some(name) = self.keywords.keys().next() {
            return Err(ConstructError::UnexpectedKeyword(name.clone()));
        }
        let given = self.positional.len();
        if let Some(last) = self.positional.iter().rposition(Option::is_some) {
            let expected = self.positional[..last].iter().filter(|v| v.is_none()).count();
            return Err(ConstructError::TooManyPositional { expected, given });
        }
        Ok(())
    }
}

impl fmt::Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("args=[")?;
        for (i, value) in self.positional.iter().flatten().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str("] and kwargs={")?;
        for (i, (name, value)) in self.keywords.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    fn point_type() -> TypeRef {
        TypeDef::class("Point", |args| {
            Ok(Point {
                x: args.take_i64(0, "x")?,
                y: args.take_i64(1, "y")?,
            })
        })
        .into_ref()
    }

    #[test]
    fn test_inherits_from_self_and_ancestors() {
        let base = TypeDef::class("Base", |_| Ok(())).into_ref();
        let mid = TypeDef::class("Mid", |_| Ok(())).extends(&base).into_ref();
        let leaf = TypeDef::class("Leaf", |_| Ok(())).extends(&mid).into_ref();
        let other = TypeDef::class("Other", |_| Ok(())).into_ref();

        assert!(inherits_from(&base, &base));
        assert!(inherits_from(&leaf, &base));
        assert!(!inherits_from(&base, &leaf));
        assert!(!inherits_from(&other, &base));
    }

    #[test]
    fn test_same_name_is_not_same_type() {
        let a = TypeDef::class("Thing", |_| Ok(())).into_ref();
        let b = TypeDef::class("Thing", |_| Ok(())).into_ref();
        assert!(!inherits_from(&a, &b));
    }

    #[test]
    fn test_class_binds_keywords_and_positions() {
        let ty = point_type();
        let args = Arguments::positional(Parsed::Int(1)).with_keyword("y", Parsed::Int(2));
        let built = ty.construct(args).unwrap();
        match built {
            Constructed::Instance(instance) => {
                assert_eq!(instance.downcast_ref::<Point>(), Some(&Point { x: 1, y: 2 }));
            }
            other => panic!("expected instance, got {other:?}"),
        }
    }

    #[test]
    fn test_class_rejects_unexpected_keyword() {
        let ty = point_type();
        let args = Arguments::keywords(BTreeMap::from([
            ("x".to_string(), Parsed::Int(1)),
            ("y".to_string(), Parsed::Int(2)),
            ("z".to_string(), Parsed::Int(3)),
        ]));
        assert_eq!(
            ty.construct(args).unwrap_err(),
            ConstructError::UnexpectedKeyword("z".to_string())
        );
    }

    #[test]
    fn test_class_rejects_missing_argument() {
        let ty = point_type();
        let args = Arguments::keywords(BTreeMap::from([("x".to_string(), Parsed::Int(1))]));
        assert_eq!(
            ty.construct(args).unwrap_err(),
            ConstructError::MissingArgument("y".to_string())
        );
    }

    #[test]
    fn test_take_rejects_duplicate_binding() {
        let mut args = Arguments::positional(Parsed::Int(1)).with_keyword("x", Parsed::Int(2));
        assert!(matches!(
            args.take(0, "x"),
            Err(ConstructError::Invalid(msg)) if msg.contains("multiple values")
        ));
    }

    #[test]
    fn test_finish_reports_extra_positional() {
        let args = Arguments::positional(Parsed::Int(1)).with_positional(Parsed::Int(2));
        assert_eq!(
            args.finish().unwrap_err(),
            ConstructError::TooManyPositional { expected: 0, given: 2 }
        );
    }

    #[test]
    fn test_arguments_display() {
        let args = Arguments::positional(Parsed::Str("x".to_string()))
            .with_keyword("n", Parsed::Int(3));
        assert_eq!(args.to_string(), r#"args=["x"] and kwargs={n: 3}"#);
    }

    #[test]
    fn test_qualified_name() {
        let ty = TypeDef::class("date", |_| Ok(())).in_module("datetime");
        assert_eq!(ty.qualified_name(), "datetime.date");
        assert_eq!(ty.module(), Some("datetime"));
    }
}
