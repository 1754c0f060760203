//! # defs-schema — Schema Validation & Definition Parsing
//!
//! Turns declarative definitions into typed object graphs, driven by a
//! separately authored schema.
//!
//! ## Schema Validation (`validate`, `node`)
//!
//! [`SchemaValidator`] checks that a schema tree is well-formed: every
//! node is a mapping, declared types resolve in the registry, and the
//! structural keys `arguments`, `elements` and `mapping` are mutually
//! exclusive. [`SchemaNode::compile`] validates and normalizes the tree
//! into [`SchemaNode`]s whose [`Shape`] drives dispatch.
//!
//! ## Definition Parsing (`parser`, `instantiate`)
//!
//! [`Parser`] walks a definition in lock-step with its compiled schema,
//! resolving defaults, polymorphic `type` overrides and structural shape,
//! and constructs registered types through [`instantiate`]. Every failure
//! is a `DefinitionError` naming the offending node, e.g.
//! `root.layers[2].activation`.
//!
//! ## Sources and Configuration
//!
//! [`load_source`] reads a file path or inline YAML into a generic value.
//! [`ParserConfig`] carries the attribute-view default and the optional
//! recursion limit for untrusted definitions.
//!
//! ## Crate Policy
//!
//! - Depends only on `defs-core` internally.
//! - Schemas are validated once, at parser construction; parsing never
//!   re-validates.
//! - Definitions are a trust boundary: invalid input is rejected with a
//!   structured, path-qualified error, never a panic.

pub mod config;
pub mod instantiate;
pub mod node;
pub mod parser;
pub mod source;
pub mod validate;

pub use config::{ConfigError, ParserConfig};
pub use instantiate::instantiate;
pub use node::{Children, SchemaNode, Shape};
pub use parser::Parser;
pub use source::{load_file, load_source, load_str, LoadError};
pub use validate::{validate, SchemaValidator};
