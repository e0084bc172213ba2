//! Type and domain checking.
//!
//! Every value carries a structural type (`u32`, `clock<d>`, ...) and a
//! domain tag. Module type parameters are rigid inside the module body and
//! become fresh inferrable variables at each call site; inferrable domains
//! are solved with a union-find table shared by the whole run.

mod checker;
mod context;
mod error;
mod result;
mod types;
mod unify;


use doty_ast::{Ast, Bindings};

use crate::checker::TypeChecker;

pub use crate::context::{DomainConflict, DomainTable};
pub use crate::error::TypeError;
pub use crate::result::{CheckResult, LetReport, ModuleReport};
pub use crate::types::{Domain, FreeVar, InferVar, PrimaryType, Type, VarId};

/// Check every module of `ast` in source order. The first error aborts.
pub fn check(ast: &Ast, bindings: &Bindings) -> Result<CheckResult, TypeError> {
    let mut checker = TypeChecker::new(ast, bindings);
    let mut modules = Vec::with_capacity(ast.items.len());
    for &item in &ast.items {
        modules.push(checker.check_module(item)?);
    }
    Ok(CheckResult { modules })
}
