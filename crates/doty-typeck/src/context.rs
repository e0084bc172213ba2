use doty_ast::NodeId;
use la_arena::ArenaMap;
use smol_str::SmolStr;
use tracing::trace;

use crate::types::{Domain, FreeVar, InferVar, PrimaryType, Type, VarId};

// ── Union-find over inferrable domains ───────────────────────────

/// Two domains that cannot be made equal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainConflict {
    pub lhs: Domain,
    pub rhs: Domain,
}

/// Assignment table for inferrable domain variables, indexed by id.
/// An unassigned entry is its own representative.
#[derive(Clone, Debug, Default)]
pub struct DomainTable {
    assignments: Vec<Option<Domain>>,
}

impl DomainTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> InferVar {
        let var = InferVar(self.assignments.len() as VarId);
        self.assignments.push(None);
        var
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Follow assignments to the representative of `domain`, pointing every
    /// variable on the way directly at it.
    pub fn find(&mut self, domain: &Domain) -> Domain {
        let Domain::Infer(start) = domain else {
            return domain.clone();
        };

        let mut path = Vec::new();
        let mut current = *start;
        let root = loop {
            match self.assignment(current) {
                Some(Domain::Infer(next)) => {
                    path.push(current);
                    current = next;
                }
                Some(free) => {
                    path.push(current);
                    break free;
                }
                None => break Domain::Infer(current),
            }
        };

        for var in path {
            self.assign(var, root.clone());
        }
        root
    }

    /// Make `lhs` and `rhs` the same domain. Two unassigned inferrable
    /// variables merge into the lower id.
    pub fn unify(&mut self, lhs: &Domain, rhs: &Domain) -> Result<(), DomainConflict> {
        let lhs = self.find(lhs);
        let rhs = self.find(rhs);
        if lhs == rhs {
            return Ok(());
        }

        match (&lhs, &rhs) {
            (Domain::Infer(a), Domain::Infer(b)) => {
                let (lo, hi) = if a < b { (*a, *b) } else { (*b, *a) };
                trace!(
                    "marking inferrable vars equivalent: {} = {}",
                    Domain::Infer(hi),
                    Domain::Infer(lo)
                );
                self.assign(hi, Domain::Infer(lo));
                Ok(())
            }
            (Domain::Infer(var), other) | (other, Domain::Infer(var)) => {
                trace!("inferring {} = {}", Domain::Infer(*var), other);
                self.assign(*var, other.clone());
                Ok(())
            }
            _ => Err(DomainConflict {
                lhs: lhs.clone(),
                rhs: rhs.clone(),
            }),
        }
    }

    /// `ty` with every domain replaced by its representative.
    pub fn resolve_type(&mut self, ty: &Type) -> Type {
        Type {
            primary: self.resolve_primary(&ty.primary),
            domain: self.find(&ty.domain),
        }
    }

    pub fn resolve_primary(&mut self, primary: &PrimaryType) -> PrimaryType {
        match primary {
            PrimaryType::Unit => PrimaryType::Unit,
            PrimaryType::U32 => PrimaryType::U32,
            PrimaryType::Clock(d) => PrimaryType::Clock(self.find(d)),
            PrimaryType::NamedTuple(fields) => PrimaryType::NamedTuple(
                fields
                    .iter()
                    .map(|(name, ty)| (name.clone(), self.resolve_type(ty)))
                    .collect(),
            ),
        }
    }

    fn assignment(&self, var: InferVar) -> Option<Domain> {
        self.assignments.get(var.0 as usize).cloned().flatten()
    }

    fn assign(&mut self, var: InferVar, value: Domain) {
        let idx = var.0 as usize;
        if idx >= self.assignments.len() {
            self.assignments.resize(idx + 1, None);
        }
        self.assignments[idx] = Some(value);
    }
}

// ── Checking contexts ────────────────────────────────────────────

/// State shared by every context of one `check` run, so variable ids stay
/// unique across modules and call sites.
#[derive(Debug, Default)]
pub(crate) struct RootContext {
    next_free: VarId,
    pub(crate) domains: DomainTable,
}

impl RootContext {
    pub(crate) fn free_var(&mut self, name: Option<SmolStr>) -> Domain {
        let id = self.next_free;
        self.next_free += 1;
        let var = Domain::Free(FreeVar { id, name });
        trace!(%var, "new free domain variable");
        var
    }

    pub(crate) fn inferrable_var(&mut self) -> Domain {
        let var = Domain::Infer(self.domains.fresh());
        trace!(%var, "new inferrable domain variable");
        var
    }
}

/// Per-module or per-call-site memo tables.
#[derive(Default)]
pub(crate) struct LocalContext {
    pub(crate) types: ArenaMap<NodeId, Type>,
    pub(crate) domains: ArenaMap<NodeId, Domain>,
}
