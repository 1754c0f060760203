//! # Instantiation
//!
//! Invokes a type's constructor with the assembled arguments and
//! translates any construction failure into
//! `DefinitionError::Construction`, embedding the diagnostic path, the
//! type name, the attempted arguments, and the constructor's message.

use std::sync::Arc;

use defs_core::{Arguments, Constructed, DefinitionError, DiagnosticPath, Object, Parsed, TypeRef};

/// Construct `ty` from `args`.
///
/// # Errors
///
/// Returns `DefinitionError::Construction` if the constructor rejects
/// the arguments.
pub fn instantiate(
    path: &DiagnosticPath,
    ty: &TypeRef,
    args: Arguments,
) -> Result<Parsed, DefinitionError> {
    let attempted = args.to_string();
    tracing::trace!(path = %path, type_name = ty.name(), args = %attempted, "instantiating");
    match ty.construct(args) {
        Ok(Constructed::Value(value)) => Ok(value),
        Ok(Constructed::Instance(instance)) => Ok(Parsed::Object(Object::new(Arc::clone(ty), instance))),
        Err(e) => Err(DefinitionError::Construction {
            path: path.to_string(),
            type_name: ty.name().to_string(),
            arguments: attempted,
            reason: e.to_string(),
        }),
    }
}
