//! Name resolution: links every identifier and domain reference to the
//! node that declares it.
//!
//! Scopes nest lexically. The file scope holds module names, declared up
//! front so modules can call each other in any order. Each module body gets
//! a child scope holding its type parameters, arguments, `typevar`s and
//! `let`s, declared in source order. A declaration's own sub-tree is
//! resolved before the declaration becomes visible, so `let x = x;` refers
//! to an outer `x`. Results are never names in scope.

use std::collections::HashMap;

use doty_ast::{Ast, Bindings, NodeId, NodeKind, Span};
use smol_str::SmolStr;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("unknown name `{name}`")]
    UnknownName { name: SmolStr, span: Span },

    /// `previous` points at the first declaration of the same name.
    #[error("name `{name}` already defined")]
    Redefinition {
        name: SmolStr,
        span: Span,
        previous: Span,
    },
}

impl ResolveError {
    pub fn span(&self) -> Span {
        match self {
            ResolveError::UnknownName { span, .. } | ResolveError::Redefinition { span, .. } => {
                *span
            }
        }
    }
}

/// Resolve all names in `ast`. On success every `Ident` and `DomainRef`
/// node has exactly one entry in the returned table.
pub fn resolve(ast: &Ast) -> Result<Bindings, ResolveError> {
    let mut resolver = Resolver {
        ast,
        scopes: vec![HashMap::new()],
        bindings: Bindings::new(),
    };

    for &item in &ast.items {
        resolver.declare(item)?;
    }
    for &item in &ast.items {
        resolver.resolve_node(item)?;
    }

    Ok(resolver.bindings)
}

struct Resolver<'a> {
    ast: &'a Ast,
    scopes: Vec<HashMap<SmolStr, NodeId>>,
    bindings: Bindings,
}

impl<'a> Resolver<'a> {
    fn resolve_node(&mut self, id: NodeId) -> Result<(), ResolveError> {
        let ast = self.ast;
        let node = &ast[id];

        if let NodeKind::Mod(_) = node.kind {
            self.scopes.push(HashMap::new());
            let result = self.resolve_children(id);
            self.scopes.pop();
            return result;
        }

        self.resolve_children(id)?;

        match &node.kind {
            NodeKind::Ident(name) | NodeKind::DomainRef(name) => {
                let target = self.lookup(&name.text).ok_or_else(|| ResolveError::UnknownName {
                    name: name.text.clone(),
                    span: name.span,
                })?;
                trace!(name = %name.text, target = ?target, "resolved");
                self.bindings.bind(id, target);
            }
            NodeKind::Let(_)
            | NodeKind::TypeVar(_)
            | NodeKind::ModTypeParam(_)
            | NodeKind::ModArg(_) => self.declare(id)?,
            _ => {}
        }
        Ok(())
    }

    fn resolve_children(&mut self, id: NodeId) -> Result<(), ResolveError> {
        for (_, child) in self.ast[id].kind.children() {
            self.resolve_node(child)?;
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<NodeId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    /// Add the name carried by `id` to the innermost scope.
    fn declare(&mut self, id: NodeId) -> Result<(), ResolveError> {
        let ast = self.ast;
        let Some(name) = ast[id].kind.name() else {
            return Ok(());
        };
        let Some(scope) = self.scopes.last_mut() else {
            return Ok(());
        };

        if let Some(&previous) = scope.get(&name.text) {
            return Err(ResolveError::Redefinition {
                name: name.text.clone(),
                span: name.span,
                previous: ast[previous].span,
            });
        }
        trace!(name = %name.text, kind = ast[id].kind.describe(), "declared");
        scope.insert(name.text.clone(), id);
        Ok(())
    }
}
