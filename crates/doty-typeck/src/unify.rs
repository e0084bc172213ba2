use doty_ast::Span;

use crate::checker::TypeChecker;
use crate::error::TypeError;
use crate::types::{Domain, PrimaryType, Type};

// ── Unification ──────────────────────────────────────────────────

impl TypeChecker<'_> {
    /// Unify primary types structurally, then the domains.
    pub(crate) fn unify_types(&mut self, lhs: &Type, rhs: &Type, span: Span) -> Result<(), TypeError> {
        self.unify_primary(&lhs.primary, &rhs.primary, span)?;
        self.unify_domains(&lhs.domain, &rhs.domain, span)
    }

    fn unify_primary(
        &mut self,
        lhs: &PrimaryType,
        rhs: &PrimaryType,
        span: Span,
    ) -> Result<(), TypeError> {
        match (lhs, rhs) {
            (PrimaryType::Unit, PrimaryType::Unit) | (PrimaryType::U32, PrimaryType::U32) => Ok(()),
            (PrimaryType::Clock(a), PrimaryType::Clock(b)) => self.unify_domains(a, b, span),
            (PrimaryType::NamedTuple(_), PrimaryType::NamedTuple(_)) => {
                Err(TypeError::NamedTupleUnification {
                    lhs: self.root.domains.resolve_primary(lhs),
                    rhs: self.root.domains.resolve_primary(rhs),
                    span,
                })
            }
            _ => Err(TypeError::IncompatibleTypes {
                lhs: self.root.domains.resolve_primary(lhs),
                rhs: self.root.domains.resolve_primary(rhs),
                span,
            }),
        }
    }

    fn unify_domains(&mut self, lhs: &Domain, rhs: &Domain, span: Span) -> Result<(), TypeError> {
        self.root
            .domains
            .unify(lhs, rhs)
            .map_err(|conflict| TypeError::IncompatibleDomains {
                lhs: conflict.lhs,
                rhs: conflict.rhs,
                span,
            })
    }
}
