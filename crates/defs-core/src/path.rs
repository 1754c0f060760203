//! # Diagnostic Paths
//!
//! Dotted/bracketed names that locate a node inside a definition or a
//! schema, e.g. `root.layers[2].activation`. Built incrementally while
//! recursing so every error can name the offending node.

use std::fmt;

/// Name of the outermost node.
pub const ROOT: &str = "root";

/// Location of a node within a nested definition or schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiagnosticPath {
    rendered: String,
    depth: usize,
}

impl DiagnosticPath {
    /// The outermost node.
    pub fn root() -> Self {
        Self {
            rendered: ROOT.to_string(),
            depth: 0,
        }
    }

    /// Path of a keyed child.
    pub fn key(&self, key: &str) -> Self {
        Self {
            rendered: format!("{}.{}", self.rendered, key),
            depth: self.depth + 1,
        }
    }

    /// Path of a positional child.
    pub fn index(&self, index: usize) -> Self {
        Self {
            rendered: format!("{}[{}]", self.rendered, index),
            depth: self.depth + 1,
        }
    }

    /// Number of keys and indices below the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The rendered path.
    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

impl Default for DiagnosticPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for DiagnosticPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

impl From<&DiagnosticPath> for String {
    fn from(path: &DiagnosticPath) -> Self {
        path.rendered.clone()
    }
}
