use doty_ast::Span;
use smol_str::SmolStr;
use std::fmt;

use crate::types::Type;

/// Final types of every module in a file, in source order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckResult {
    pub modules: Vec<ModuleReport>,
}

impl CheckResult {
    pub fn module(&self, name: &str) -> Option<&ModuleReport> {
        self.modules.iter().find(|m| m.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleReport {
    pub name: SmolStr,
    pub span: Span,
    /// One entry per `let`, in statement order.
    pub lets: Vec<LetReport>,
}

impl ModuleReport {
    /// Final type of the first `let` named `name`.
    pub fn let_type(&self, name: &str) -> Option<&Type> {
        self.lets.iter().find(|l| l.name == name).map(|l| &l.ty)
    }
}

impl fmt::Display for ModuleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module {}", self.name)?;
        for binding in &self.lets {
            write!(f, "\n- final {} = {}", binding.name, binding.ty)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LetReport {
    pub name: SmolStr,
    pub span: Span,
    /// Resolved through the domain table after the whole module was checked.
    pub ty: Type,
}
