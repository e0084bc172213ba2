use doty_ast::*;
use tracing::{debug, trace};

use crate::context::{LocalContext, RootContext};
use crate::error::TypeError;
use crate::result::{LetReport, ModuleReport};
use crate::types::{Domain, PrimaryType, Type};

// ── Type checker ─────────────────────────────────────────────────

pub(crate) struct TypeChecker<'a> {
    ast: &'a Ast,
    bindings: &'a Bindings,
    pub(crate) root: RootContext,
}

impl<'a> TypeChecker<'a> {
    pub(crate) fn new(ast: &'a Ast, bindings: &'a Bindings) -> Self {
        Self {
            ast,
            bindings,
            root: RootContext::default(),
        }
    }

    // ── Modules and statements ───────────────────────────────────

    pub(crate) fn check_module(&mut self, id: NodeId) -> Result<ModuleReport, TypeError> {
        let ast = self.ast;
        let Some(module) = ast.as_mod(id) else {
            return Err(TypeError::NoType { span: ast[id].span });
        };
        debug!(module = %module.name.text, "checking module");

        let mut cx = LocalContext::default();
        for &param in &module.type_params {
            let name = ast[param].kind.name().map(|n| n.text.clone());
            let var = self.root.free_var(name);
            cx.domains.insert(param, var);
        }
        for &arg in &module.args {
            self.type_of(&mut cx, arg)?;
        }
        for &result in &module.results {
            self.type_of(&mut cx, result)?;
        }
        for &stmt in &module.stmts {
            self.check_stmt(&mut cx, stmt)?;
        }

        let mut lets = Vec::new();
        for &stmt in &module.stmts {
            if let NodeKind::Let(l) = &ast[stmt].kind {
                let ty = self.type_of(&mut cx, stmt)?;
                let ty = self.root.domains.resolve_type(&ty);
                debug!(name = %l.name.text, %ty, "final type");
                lets.push(LetReport {
                    name: l.name.text.clone(),
                    span: l.name.span,
                    ty,
                });
            }
        }

        Ok(ModuleReport {
            name: module.name.text.clone(),
            span: module.name.span,
            lets,
        })
    }

    fn check_stmt(&mut self, cx: &mut LocalContext, id: NodeId) -> Result<(), TypeError> {
        let ast = self.ast;
        let node = &ast[id];
        debug!(kind = node.kind.describe(), "checking statement");

        match &node.kind {
            NodeKind::Assign { lhs, rhs } => {
                let lhs_ty = self.type_of(cx, *lhs)?;
                let rhs_ty = self.type_of(cx, *rhs)?;
                self.unify_types(&lhs_ty, &rhs_ty, node.span)
            }
            NodeKind::ExprStmt(expr) => self.type_of(cx, *expr).map(|_| ()),
            NodeKind::Let(l) => {
                let ty = self.type_of(cx, id)?;
                if let (Some(_), Some(init)) = (l.ty, l.init) {
                    let init_ty = self.type_of(cx, init)?;
                    self.unify_types(&ty, &init_ty, node.span)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    // ── Types ────────────────────────────────────────────────────

    pub(crate) fn type_of(&mut self, cx: &mut LocalContext, id: NodeId) -> Result<Type, TypeError> {
        if let Some(ty) = cx.types.get(id) {
            return Ok(ty.clone());
        }
        let ty = self.type_of_inner(cx, id)?;
        cx.types.insert(id, ty.clone());
        Ok(ty)
    }

    fn type_of_inner(&mut self, cx: &mut LocalContext, id: NodeId) -> Result<Type, TypeError> {
        let ast = self.ast;
        let node = &ast[id];

        match &node.kind {
            NodeKind::Let(l) => match (l.ty, l.init) {
                (Some(ty), _) => self.declare_ast_type(cx, ty),
                (None, Some(init)) => self.type_of(cx, init),
                (None, None) => Err(TypeError::UnknownType {
                    name: l.name.text.clone(),
                    span: node.span,
                }),
            },
            NodeKind::ModArg(p) | NodeKind::ModResult(p) => self.declare_ast_type(cx, p.ty),
            NodeKind::Ident(name) => {
                let target = self.target(id)?;
                match ast[target].kind {
                    NodeKind::Let(_) | NodeKind::ModArg(_) => self.type_of(cx, target),
                    _ => Err(TypeError::NotAValue {
                        name: name.text.clone(),
                        span: node.span,
                    }),
                }
            }
            NodeKind::Call { callee, args } => {
                let target = self.target(*callee)?;
                if ast.as_mod(target).is_none() {
                    let name = ast[*callee]
                        .kind
                        .name()
                        .map(|n| n.text.clone())
                        .unwrap_or_default();
                    return Err(TypeError::NotCallable {
                        name,
                        span: node.span,
                    });
                }
                self.type_of_call(cx, id, target, args)
            }
            _ => Err(TypeError::NoType { span: node.span }),
        }
    }

    /// Instantiate `callee`'s signature for one call site: each of its type
    /// parameters becomes a fresh inferrable variable, then arguments are
    /// unified pairwise.
    fn type_of_call(
        &mut self,
        cx: &mut LocalContext,
        call: NodeId,
        callee: NodeId,
        args: &[NodeId],
    ) -> Result<Type, TypeError> {
        let ast = self.ast;
        let Some(module) = ast.as_mod(callee) else {
            return Err(TypeError::NoType {
                span: ast[call].span,
            });
        };

        if args.len() != module.args.len() {
            return Err(TypeError::ArityMismatch {
                callee: module.name.text.clone(),
                expected: module.args.len(),
                found: args.len(),
                span: ast[call].span,
            });
        }
        debug!(callee = %module.name.text, "instantiating call");

        let mut call_cx = LocalContext::default();
        for &param in &module.type_params {
            let var = self.root.inferrable_var();
            trace!(
                %var,
                param = ?ast[param].kind.name().map(|n| &n.text),
                callee = %module.name.text,
                "type parameter instantiated"
            );
            call_cx.domains.insert(param, var);
        }

        for (&call_arg, &mod_arg) in args.iter().zip(&module.args) {
            let call_ty = self.type_of(cx, call_arg)?;
            let mod_ty = self.type_of(&mut call_cx, mod_arg)?;
            self.unify_types(&call_ty, &mod_ty, ast[call_arg].span)?;
        }

        match module.results.as_slice() {
            [] => Ok(Type::new(PrimaryType::Unit, self.root.free_var(None))),
            [only] => self.type_of(&mut call_cx, *only),
            results => {
                let mut fields = Vec::with_capacity(results.len());
                for &result in results {
                    let ty = self.type_of(&mut call_cx, result)?;
                    let name = ast[result]
                        .kind
                        .name()
                        .map(|n| n.text.clone())
                        .unwrap_or_default();
                    fields.push((name, ty));
                }
                Ok(Type::new(
                    PrimaryType::NamedTuple(fields),
                    self.root.free_var(None),
                ))
            }
        }
    }

    /// Type denoted by a type-syntax node. A missing `@` annotation gets a
    /// fresh inferrable domain.
    fn declare_ast_type(&mut self, cx: &mut LocalContext, id: NodeId) -> Result<Type, TypeError> {
        let ast = self.ast;
        let NodeKind::Type(texpr) = &ast[id].kind else {
            return Err(TypeError::NoType { span: ast[id].span });
        };

        let domain = match texpr.domain {
            Some(annotation) => self.domain_of(cx, annotation)?,
            None => {
                let var = self.root.inferrable_var();
                trace!(%var, span = ?ast[id].span, "implicit domain");
                var
            }
        };

        let primary = match texpr.kind {
            TypeExprKind::U32 => PrimaryType::U32,
            TypeExprKind::Clock(clock_domain) => {
                PrimaryType::Clock(self.domain_of(cx, clock_domain)?)
            }
        };
        Ok(Type::new(primary, domain))
    }

    // ── Domains ──────────────────────────────────────────────────

    fn domain_of(
        &mut self,
        cx: &mut LocalContext,
        id: NodeId,
    ) -> Result<Domain, TypeError> {
        if let Some(domain) = cx.domains.get(id) {
            return Ok(domain.clone());
        }
        let domain = self.domain_of_inner(cx, id)?;
        cx.domains.insert(id, domain.clone());
        Ok(domain)
    }

    fn domain_of_inner(
        &mut self,
        cx: &mut LocalContext,
        id: NodeId,
    ) -> Result<Domain, TypeError> {
        let ast = self.ast;
        let node = &ast[id];

        match &node.kind {
            NodeKind::TypeVar(name) => Ok(self.root.free_var(Some(name.text.clone()))),
            NodeKind::DomainRef(name) => {
                let target = self.target(id)?;
                match ast[target].kind {
                    NodeKind::TypeVar(_) | NodeKind::ModTypeParam(_) => self.domain_of(cx, target),
                    _ => Err(TypeError::NotADomain {
                        name: name.text.clone(),
                        span: node.span,
                    }),
                }
            }
            _ => Err(TypeError::NoDomain { span: node.span }),
        }
    }

    /// Declaration that the use site `id` resolved to.
    fn target(&self, id: NodeId) -> Result<NodeId, TypeError> {
        self.bindings.get(id).ok_or_else(|| {
            let node = &self.ast[id];
            TypeError::Unresolved {
                name: node.kind.name().map(|n| n.text.clone()).unwrap_or_default(),
                span: node.span,
            }
        })
    }
}
