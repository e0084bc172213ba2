use smol_str::SmolStr;
use std::fmt;

// ── Domains ──────────────────────────────────────────────────────

pub type VarId = u32;

/// Rigid domain variable: a module type parameter, a `typevar`, or an
/// anonymous tag for a call result. Never assigned by unification.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FreeVar {
    pub id: VarId,
    pub name: Option<SmolStr>,
}

/// Flexible domain variable. Its id indexes the root context's
/// `DomainTable`, where its assignment (if any) lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InferVar(pub VarId);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    Free(FreeVar),
    Infer(InferVar),
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Free(FreeVar {
                name: Some(name), ..
            }) => write!(f, "{}", name),
            Domain::Free(FreeVar { id, name: None }) => write!(f, "${}", id),
            Domain::Infer(InferVar(id)) => write!(f, "?{}", id),
        }
    }
}

// ── Types ────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrimaryType {
    Unit,
    U32,
    /// `clock<d>`: a clock signal ticking in domain `d`.
    Clock(Domain),
    /// Results of a multi-result module call, in declaration order.
    NamedTuple(Vec<(SmolStr, Type)>),
}

impl fmt::Display for PrimaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryType::Unit => write!(f, "()"),
            PrimaryType::U32 => write!(f, "u32"),
            PrimaryType::Clock(domain) => write!(f, "Clock<{}>", domain),
            PrimaryType::NamedTuple(fields) => {
                write!(f, "(")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A primary type tagged with the domain its values live in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Type {
    pub primary: PrimaryType,
    pub domain: Domain,
}

impl Type {
    pub fn new(primary: PrimaryType, domain: Domain) -> Self {
        Self { primary, domain }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @{}", self.primary, self.domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(id: VarId, name: &str) -> Domain {
        Domain::Free(FreeVar {
            id,
            name: Some(name.into()),
        })
    }

    #[test]
    fn domain_display() {
        assert_eq!(named(0, "D").to_string(), "D");
        assert_eq!(Domain::Free(FreeVar { id: 3, name: None }).to_string(), "$3");
        assert_eq!(Domain::Infer(InferVar(7)).to_string(), "?7");
    }

    #[test]
    fn type_display() {
        let clk = Type::new(PrimaryType::Clock(named(0, "A")), Domain::Infer(InferVar(1)));
        assert_eq!(clk.to_string(), "Clock<A> @?1");

        let unit = Type::new(PrimaryType::Unit, Domain::Free(FreeVar { id: 2, name: None }));
        assert_eq!(unit.to_string(), "() @$2");

        let tuple = Type::new(
            PrimaryType::NamedTuple(vec![
                ("a".into(), Type::new(PrimaryType::U32, named(0, "A"))),
                ("b".into(), clk),
            ]),
            Domain::Free(FreeVar { id: 4, name: None }),
        );
        assert_eq!(tuple.to_string(), "(a: u32 @A, b: Clock<A> @?1) @$4");
    }
}
