use la_arena::{Arena, ArenaMap, Idx};
use smol_str::SmolStr;
use std::ops::Index;

pub use doty_lexer::Span;

// ── ID types ──────────────────────────────────────────────────────

pub type NodeId = Idx<Node>;

/// Stable numeric index of a node, as shown in tree dumps.
pub fn node_index(id: NodeId) -> u32 {
    u32::from(id.into_raw())
}

// ── Syntax tree ───────────────────────────────────────────────────

/// A parsed source file. All nodes live in one arena; `items` lists the
/// top-level modules in source order.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    pub nodes: Arena<Node>,
    pub items: Vec<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.nodes.alloc(Node { kind, span })
    }

    /// The `mod` item behind `id`, if it is one.
    pub fn as_mod(&self, id: NodeId) -> Option<&ModItem> {
        match &self[id].kind {
            NodeKind::Mod(m) => Some(m),
            _ => None,
        }
    }
}

impl Index<NodeId> for Ast {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Primary location: the name for declarations, the whole
    /// expression for calls, the `=` for assignments.
    pub span: Span,
}

/// An identifier together with where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub text: SmolStr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// `mod name<T...>(args...) -> (results...) { stmts... }`
    Mod(ModItem),
    /// Domain type parameter in a module header: the `D` in `mod m<D>`.
    ModTypeParam(Name),
    /// Module argument `name: type`.
    ModArg(Param),
    /// Module result `name: type`.
    ModResult(Param),

    /// `let name: type = init;` with at least one of type/init in valid code.
    Let(LetStmt),
    /// `typevar Name;`
    TypeVar(Name),
    /// `expr;`
    ExprStmt(NodeId),
    /// `lhs = rhs;`
    Assign { lhs: NodeId, rhs: NodeId },

    /// Type syntax with optional `@domain` annotation.
    Type(TypeExpr),
    /// A name used in domain position: `@D`, `clock<D>`.
    DomainRef(Name),

    /// Identifier reference in an expression.
    Ident(Name),
    /// `callee(args...)`; `callee` is always an `Ident` node.
    Call { callee: NodeId, args: Vec<NodeId> },
}

#[derive(Debug, Clone)]
pub struct ModItem {
    pub name: Name,
    pub type_params: Vec<NodeId>,
    pub args: Vec<NodeId>,
    pub results: Vec<NodeId>,
    pub stmts: Vec<NodeId>,
    /// From the `mod` keyword to the closing brace.
    pub full_span: Span,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: Name,
    pub ty: NodeId,
}

#[derive(Debug, Clone)]
pub struct LetStmt {
    pub name: Name,
    pub ty: Option<NodeId>,
    pub init: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    /// `@name` annotation; `None` means the domain is inferred.
    pub domain: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub enum TypeExprKind {
    U32,
    /// `clock<d>`; the payload is a `DomainRef` node.
    Clock(NodeId),
}

impl NodeKind {
    /// Node kind as shown in tree dumps.
    pub fn describe(&self) -> &'static str {
        match self {
            NodeKind::Mod(_) => "ModItem",
            NodeKind::ModTypeParam(_) => "ModTypeParam",
            NodeKind::ModArg(_) => "ModArg",
            NodeKind::ModResult(_) => "ModResult",
            NodeKind::Let(_) => "LetStmt",
            NodeKind::TypeVar(_) => "TypeVarStmt",
            NodeKind::ExprStmt(_) => "ExprStmt",
            NodeKind::Assign { .. } => "AssignStmt",
            NodeKind::Type(TypeExpr {
                kind: TypeExprKind::U32,
                ..
            }) => "U32Type",
            NodeKind::Type(TypeExpr {
                kind: TypeExprKind::Clock(_),
                ..
            }) => "ClockType",
            NodeKind::DomainRef(_) => "DomainIdent",
            NodeKind::Ident(_) => "IdentExpr",
            NodeKind::Call { .. } => "CallExpr",
        }
    }

    /// The declared or referenced name carried by this node, if any.
    pub fn name(&self) -> Option<&Name> {
        match self {
            NodeKind::Mod(m) => Some(&m.name),
            NodeKind::ModTypeParam(n)
            | NodeKind::TypeVar(n)
            | NodeKind::DomainRef(n)
            | NodeKind::Ident(n) => Some(n),
            NodeKind::ModArg(p) | NodeKind::ModResult(p) => Some(&p.name),
            NodeKind::Let(l) => Some(&l.name),
            NodeKind::ExprStmt(_)
            | NodeKind::Assign { .. }
            | NodeKind::Type(_)
            | NodeKind::Call { .. } => None,
        }
    }

    /// Child nodes with the field they hang off, in source order.
    pub fn children(&self) -> Vec<(String, NodeId)> {
        fn list(out: &mut Vec<(String, NodeId)>, field: &str, ids: &[NodeId]) {
            for (i, &id) in ids.iter().enumerate() {
                out.push((format!("{}[{}]", field, i), id));
            }
        }

        let mut out = Vec::new();
        match self {
            NodeKind::Mod(m) => {
                list(&mut out, "type_params", &m.type_params);
                list(&mut out, "args", &m.args);
                list(&mut out, "results", &m.results);
                list(&mut out, "stmts", &m.stmts);
            }
            NodeKind::ModArg(p) | NodeKind::ModResult(p) => out.push(("ty".into(), p.ty)),
            NodeKind::Let(l) => {
                if let Some(ty) = l.ty {
                    out.push(("ty".into(), ty));
                }
                if let Some(init) = l.init {
                    out.push(("init".into(), init));
                }
            }
            NodeKind::ExprStmt(e) => out.push(("expr".into(), *e)),
            NodeKind::Assign { lhs, rhs } => {
                out.push(("lhs".into(), *lhs));
                out.push(("rhs".into(), *rhs));
            }
            NodeKind::Type(t) => {
                if let TypeExprKind::Clock(d) = t.kind {
                    out.push(("clock_domain".into(), d));
                }
                if let Some(d) = t.domain {
                    out.push(("domain".into(), d));
                }
            }
            NodeKind::Call { callee, args } => {
                out.push(("callee".into(), *callee));
                list(&mut out, "args", args);
            }
            NodeKind::ModTypeParam(_)
            | NodeKind::TypeVar(_)
            | NodeKind::DomainRef(_)
            | NodeKind::Ident(_) => {}
        }
        out
    }
}

// ── Bindings ──────────────────────────────────────────────────────

/// Resolved links from use sites (`Ident`, `DomainRef`) to declarations.
/// Filled once by name resolution; the tree itself stays immutable.
#[derive(Clone, Default)]
pub struct Bindings {
    targets: ArenaMap<NodeId, NodeId>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `use_site` refers to `decl`. Returns the previous target
    /// if the use site was already bound.
    pub fn bind(&mut self, use_site: NodeId, decl: NodeId) -> Option<NodeId> {
        let previous = self.targets.get(use_site).copied();
        self.targets.insert(use_site, decl);
        previous
    }

    pub fn get(&self, use_site: NodeId) -> Option<NodeId> {
        self.targets.get(use_site).copied()
    }

    pub fn len(&self) -> usize {
        self.targets.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.targets
                    .iter()
                    .map(|(site, decl)| (node_index(site), node_index(*decl))),
            )
            .finish()
    }
}

// ── Tree dump ─────────────────────────────────────────────────────

/// Render the tree one node per line, with `|-`/`` `- `` connectors.
/// When `bindings` is given, use sites show the node they resolve to.
pub fn dump(ast: &Ast, bindings: Option<&Bindings>) -> String {
    let dumper = Dumper { ast, bindings };
    let fields: Vec<String> = ast
        .items
        .iter()
        .enumerate()
        .map(|(i, &id)| dumper.dump_node(id, &format!("items[{}]", i)))
        .collect();
    let mut out = String::from("Root");
    push_fields(&mut out, &fields);
    out
}

struct Dumper<'a> {
    ast: &'a Ast,
    bindings: Option<&'a Bindings>,
}

impl<'a> Dumper<'a> {
    fn dump_node(&self, id: NodeId, field: &str) -> String {
        let node = &self.ast[id];
        let mut line = format!("{}: {} @{}", field, node.kind.describe(), node_index(id));
        if let Some(name) = node.kind.name() {
            line.push_str(&format!(" \"{}\"", name.text));
        }
        if let Some(target) = self.bindings.and_then(|b| b.get(id)) {
            line.push_str(&format!(
                " binding={}(@{})",
                self.ast[target].kind.describe(),
                node_index(target)
            ));
        }

        let fields: Vec<String> = node
            .kind
            .children()
            .iter()
            .map(|(name, child)| self.dump_node(*child, name))
            .collect();
        push_fields(&mut line, &fields);
        line
    }
}

fn push_fields(line: &mut String, fields: &[String]) {
    for (i, field) in fields.iter().enumerate() {
        let is_last = i + 1 == fields.len();
        let (sep_first, sep_rest) = if is_last { ("`-", "  ") } else { ("|-", "| ") };
        line.push('\n');
        line.push_str(sep_first);
        line.push_str(&field.replace('\n', &format!("\n{}", sep_rest)));
    }
}
