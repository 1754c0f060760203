//! # defs-core — Foundational Types for Definitions
//!
//! This crate holds the types every other crate in the workspace builds
//! on. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Explicit type registry.** Type names in schemas and definitions
//!    resolve through a [`TypeRegistry`] populated at startup, never
//!    through reflection. A name is searched in an optional module
//!    namespace first, then among the built-ins.
//!
//! 2. **Nominal subtyping by identity.** [`TypeRef`] is an `Arc`; two
//!    types are the same only if they are the same allocation.
//!    [`inherits_from`] walks declared bases and gates every polymorphic
//!    override.
//!
//! 3. **Closed attribute views.** [`AttrMap`] rejects reads of absent
//!    attributes and writes that would add new ones. [`FallbackAttrMap`]
//!    yields `None` for absent attributes and backs optional schema
//!    fields.
//!
//! 4. **Path-qualified errors.** Every [`DefinitionError`] carries the
//!    [`DiagnosticPath`] of the node that caused it.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `defs-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod attrs;
pub mod builtins;
pub mod error;
pub mod path;
pub mod registry;
pub mod types;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use attrs::{AttrMap, FallbackAttrMap};
pub use builtins::BareObject;
pub use error::{AttributeError, ConstructError, DefinitionError, DefsError, SchemaError};
pub use path::DiagnosticPath;
pub use registry::{Namespace, TypeRegistry};
pub use types::{inherits_from, Arguments, Constructed, InstanceValue, TypeDef, TypeRef};
pub use value::{value_kind, Object, Parsed};
