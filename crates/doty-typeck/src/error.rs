use doty_ast::Span;
use smol_str::SmolStr;

use crate::types::{Domain, PrimaryType};

/// The first fatal condition found while checking. Types and domains are
/// stored already resolved through the domain table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("unknown type: let `{name}` needs either a type or an initial value")]
    UnknownType { name: SmolStr, span: Span },

    #[error(
        "invalid number of call arguments; `{callee}` expects {expected}, but call provides {found}"
    )]
    ArityMismatch {
        callee: SmolStr,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("`{name}` cannot be used in an expression")]
    NotAValue { name: SmolStr, span: Span },

    #[error("`{name}` cannot be called")]
    NotCallable { name: SmolStr, span: Span },

    #[error("`{name}` cannot be used as domain")]
    NotADomain { name: SmolStr, span: Span },

    #[error("incompatible types: `{lhs}` and `{rhs}`")]
    IncompatibleTypes {
        lhs: PrimaryType,
        rhs: PrimaryType,
        span: Span,
    },

    #[error("incompatible domains: `{lhs}` and `{rhs}`")]
    IncompatibleDomains { lhs: Domain, rhs: Domain, span: Span },

    #[error("cannot unify named tuples `{lhs}` and `{rhs}`")]
    NamedTupleUnification {
        lhs: PrimaryType,
        rhs: PrimaryType,
        span: Span,
    },

    #[error("node has no type")]
    NoType { span: Span },

    #[error("node has no domain")]
    NoDomain { span: Span },

    /// A use site with no entry in the binding table.
    #[error("unresolved name `{name}`")]
    Unresolved { name: SmolStr, span: Span },
}

impl TypeError {
    pub fn span(&self) -> Span {
        match self {
            TypeError::UnknownType { span, .. }
            | TypeError::ArityMismatch { span, .. }
            | TypeError::NotAValue { span, .. }
            | TypeError::NotCallable { span, .. }
            | TypeError::NotADomain { span, .. }
            | TypeError::IncompatibleTypes { span, .. }
            | TypeError::IncompatibleDomains { span, .. }
            | TypeError::NamedTupleUnification { span, .. }
            | TypeError::NoType { span }
            | TypeError::NoDomain { span }
            | TypeError::Unresolved { span, .. } => *span,
        }
    }
}
