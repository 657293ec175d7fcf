//! Resolution errors surfaced at fixpoint.
//!
//! Nothing in the reduction engine raises these during a sweep:
//! irreducible nodes simply pass through unchanged, because a later
//! sweep may supply the missing information. Only once the whole
//! constraint set stops making progress does the driver walk the
//! remaining types and turn each stuck node into one of these, so a
//! single underlying problem is reported once rather than per attempt.

use std::fmt;

use tern_common::Span;

use crate::ty::{AssocSym, Ty};

/// Why a type failed to reduce to normal form.
///
/// Each variant carries the source span of the expression the type
/// was inferred for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolutionError {
    /// The type still contains flexible variables or unreduced nodes,
    /// and no sweep managed to pin them down.
    UndeterminedType { ty: Ty, span: Span },
    /// A projection whose receiver is fully known, but no registered
    /// instance matches it.
    NoMatchingInstance { sym: AssocSym, receiver: Ty, span: Span },
    /// A constructor call with fully known arguments that matches no
    /// accessible constructor.
    ConstructorNotFound { class: String, args: Vec<Ty>, span: Span },
    /// A method call with fully known receiver and arguments that
    /// matches no accessible method.
    MethodNotFound {
        name: String,
        receiver: Ty,
        args: Vec<Ty>,
        is_static: bool,
        span: Span,
    },
    /// A field access on a fully known receiver with no accessible
    /// field of that name.
    FieldNotFound { name: String, receiver: Ty, span: Span },
}

impl ResolutionError {
    /// The source span the error points at.
    pub fn span(&self) -> Span {
        match self {
            ResolutionError::UndeterminedType { span, .. }
            | ResolutionError::NoMatchingInstance { span, .. }
            | ResolutionError::ConstructorNotFound { span, .. }
            | ResolutionError::MethodNotFound { span, .. }
            | ResolutionError::FieldNotFound { span, .. } => *span,
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Ty]) -> fmt::Result {
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", a)?;
    }
    Ok(())
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionError::UndeterminedType { ty, .. } => {
                write!(f, "unable to determine the type of `{}`", ty)
            }
            ResolutionError::NoMatchingInstance { sym, receiver, .. } => {
                write!(f, "no instance defines `{}` for `{}`", sym, receiver)
            }
            ResolutionError::ConstructorNotFound { class, args, .. } => {
                write!(f, "no accessible constructor `new {}(", class)?;
                write_args(f, args)?;
                write!(f, ")`")
            }
            ResolutionError::MethodNotFound { name, receiver, args, is_static, .. } => {
                let qualifier = if *is_static { "static method" } else { "method" };
                write!(f, "no accessible {} `{}(", qualifier, name)?;
                write_args(f, args)?;
                write!(f, ")` on `{}`", receiver)
            }
            ResolutionError::FieldNotFound { name, receiver, .. } => {
                write!(f, "no accessible field `{}` on `{}`", name, receiver)
            }
        }
    }
}

impl std::error::Error for ResolutionError {}
