//! The AST model: a per-module arena of tagged nodes addressed by `NodeId`.
//!
//! Parent/child links are integer handles into the arena, so the ownership
//! graph is acyclic and the whole tree serializes for the disk cache without
//! any back-reference fixups. Only the module root carries the source path
//! and content hash; every other node inherits them through the parent chain.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a node stored inside a [`ModuleAst`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(index: usize) -> Self {
        Self(index.try_into().expect("node arena overflow"))
    }

    /// Returns the raw index value.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Index of a loaded module within the analyzer's module registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(u32);

impl ModuleId {
    pub fn new(index: usize) -> Self {
        Self(index.try_into().expect("module registry overflow"))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node addressed across modules: which module arena, which slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef {
    pub module: ModuleId,
    pub node: NodeId,
}

impl NodeRef {
    pub fn new(module: ModuleId, node: NodeId) -> Self {
        Self { module, node }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum BinOpKind {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mult,
    #[strum(serialize = "@")]
    MatMult,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Mod,
    #[strum(serialize = "**")]
    Pow,
    #[strum(serialize = "<<")]
    LShift,
    #[strum(serialize = ">>")]
    RShift,
    #[strum(serialize = "|")]
    BitOr,
    #[strum(serialize = "^")]
    BitXor,
    #[strum(serialize = "&")]
    BitAnd,
    #[strum(serialize = "//")]
    FloorDiv,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum UnaryOpKind {
    #[strum(serialize = "not")]
    Not,
    #[strum(serialize = "+")]
    UAdd,
    #[strum(serialize = "-")]
    USub,
    #[strum(serialize = "~")]
    Invert,
}

/// Short-circuit boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum BoolOpKind {
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "or")]
    Or,
}

/// Comparison operators. Always produce a boolean-typed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum CmpOpKind {
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    NotEq,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    LtE,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    GtE,
    #[strum(serialize = "is")]
    Is,
    #[strum(serialize = "is not")]
    IsNot,
    #[strum(serialize = "in")]
    In,
    #[strum(serialize = "not in")]
    NotIn,
}

/// The `True`/`False`/`None` literal constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameConstValue {
    True,
    False,
    None,
}

/// Tagged node variant. Statements and expressions share one taxonomy since
/// the analyzer assigns a type to every node uniformly.
///
/// `vararg`/`kwarg`/`after_rest`/`blockarg` slots exist on functions and
/// calls so the taxonomy covers the whole interpreter family; the Python
/// frontend leaves `after_rest` and `blockarg` empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Module {
        body: Vec<NodeId>,
    },
    /// A `def`, or a `lambda` when `is_lambda` is set (then `name` is None
    /// and `body` is the single wrapped expression).
    FunctionDef {
        name: Option<NodeId>,
        args: Vec<NodeId>,
        defaults: Vec<NodeId>,
        vararg: Option<NodeId>,
        kwarg: Option<NodeId>,
        after_rest: Vec<NodeId>,
        blockarg: Option<NodeId>,
        body: Vec<NodeId>,
        decorators: Vec<NodeId>,
        is_lambda: bool,
        is_async: bool,
        /// Set when the body contains a yield at this function's own level.
        is_generator: bool,
    },
    ClassDef {
        name: NodeId,
        bases: Vec<NodeId>,
        keywords: Vec<NodeId>,
        body: Vec<NodeId>,
        decorators: Vec<NodeId>,
    },
    Return {
        value: Option<NodeId>,
    },
    Delete {
        targets: Vec<NodeId>,
    },
    Assign {
        targets: Vec<NodeId>,
        value: NodeId,
    },
    AugAssign {
        target: NodeId,
        op: BinOpKind,
        value: NodeId,
    },
    /// Named expression (walrus): binds `target` and yields the value as
    /// the expression result.
    Named {
        target: NodeId,
        value: NodeId,
    },
    AnnAssign {
        target: NodeId,
        annotation: NodeId,
        value: Option<NodeId>,
    },
    For {
        target: NodeId,
        iter: NodeId,
        body: Vec<NodeId>,
        orelse: Vec<NodeId>,
        is_async: bool,
    },
    While {
        test: NodeId,
        body: Vec<NodeId>,
        orelse: Vec<NodeId>,
    },
    If {
        test: NodeId,
        body: Vec<NodeId>,
        orelse: Vec<NodeId>,
    },
    With {
        items: Vec<NodeId>,
        body: Vec<NodeId>,
        is_async: bool,
    },
    WithItem {
        context: NodeId,
        var: Option<NodeId>,
    },
    Raise {
        exc: Option<NodeId>,
        cause: Option<NodeId>,
    },
    Try {
        body: Vec<NodeId>,
        handlers: Vec<NodeId>,
        orelse: Vec<NodeId>,
        finalbody: Vec<NodeId>,
    },
    /// One `except` clause. `name` is the `as` binding target (a Name node).
    Handler {
        exc_type: Option<NodeId>,
        name: Option<NodeId>,
        body: Vec<NodeId>,
    },
    Assert {
        test: NodeId,
        msg: Option<NodeId>,
    },
    Import {
        names: Vec<NodeId>,
    },
    ImportFrom {
        module: Option<String>,
        names: Vec<NodeId>,
        level: u32,
    },
    /// An import alias: `name` as written in the source, `asname` the local
    /// binding name when aliased.
    Alias {
        name: String,
        asname: Option<String>,
    },
    Global {
        names: Vec<String>,
    },
    /// A `match` statement, kept coarse: case bodies are analyzed as
    /// alternative branches; patterns themselves are not modeled.
    Match {
        subject: NodeId,
        bodies: Vec<Vec<NodeId>>,
    },
    ExprStmt {
        value: NodeId,
    },
    Pass,
    Break,
    Continue,
    BoolOp {
        op: BoolOpKind,
        values: Vec<NodeId>,
    },
    BinOp {
        left: NodeId,
        op: BinOpKind,
        right: NodeId,
    },
    UnaryOp {
        op: UnaryOpKind,
        operand: NodeId,
    },
    IfExp {
        test: NodeId,
        body: NodeId,
        orelse: NodeId,
    },
    Dict {
        keys: Vec<Option<NodeId>>,
        values: Vec<NodeId>,
    },
    Set {
        elts: Vec<NodeId>,
    },
    ListComp {
        elt: NodeId,
        generators: Vec<NodeId>,
    },
    SetComp {
        elt: NodeId,
        generators: Vec<NodeId>,
    },
    DictComp {
        key: NodeId,
        value: NodeId,
        generators: Vec<NodeId>,
    },
    GeneratorExp {
        elt: NodeId,
        generators: Vec<NodeId>,
    },
    /// One `for target in iter [if cond]*` clause of a comprehension.
    Comprehension {
        target: NodeId,
        iter: NodeId,
        ifs: Vec<NodeId>,
    },
    Yield {
        value: Option<NodeId>,
    },
    YieldFrom {
        value: NodeId,
    },
    Await {
        value: NodeId,
    },
    Compare {
        left: NodeId,
        ops: Vec<CmpOpKind>,
        comparators: Vec<NodeId>,
    },
    Call {
        func: NodeId,
        args: Vec<NodeId>,
        keywords: Vec<NodeId>,
        starargs: Option<NodeId>,
        kwargs: Option<NodeId>,
        blockarg: Option<NodeId>,
    },
    /// A named keyword argument in a call; `**expr` splats are carried on the
    /// enclosing call's `kwargs` slot instead.
    Keyword {
        arg: String,
        value: NodeId,
    },
    /// Integer literal. Values beyond the i64 range saturate; the interval
    /// lattice treats a saturated bound like any other bound.
    Int {
        value: i64,
    },
    Float {
        value: f64,
    },
    Str {
        value: String,
    },
    Bytes,
    /// An f-string; `parts` holds the interpolated expressions only.
    FString {
        parts: Vec<NodeId>,
    },
    NameConst {
        value: NameConstValue,
    },
    EllipsisLit,
    Attribute {
        value: NodeId,
        attr: NodeId,
    },
    Subscript {
        value: NodeId,
        index: Option<NodeId>,
    },
    Starred {
        value: NodeId,
    },
    Name {
        id: String,
    },
    List {
        elts: Vec<NodeId>,
    },
    Tuple {
        elts: Vec<NodeId>,
    },
    Slice {
        lower: Option<NodeId>,
        upper: Option<NodeId>,
        step: Option<NodeId>,
    },
    /// Placeholder for source constructs the analyzer does not model
    /// (template strings, IPython escapes). Always types as Unknown.
    Unsupported,
}

impl NodeKind {
    /// Collects the direct child node ids, in source order.
    ///
    /// This drives parent assignment after parsing and the parent-consistency
    /// checks in tests, so every variant must enumerate all its children.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let one = |n: &NodeId, out: &mut Vec<NodeId>| out.push(*n);
        let opt = |n: &Option<NodeId>, out: &mut Vec<NodeId>| out.extend(n.iter().copied());
        let many = |ns: &[NodeId], out: &mut Vec<NodeId>| out.extend_from_slice(ns);
        match self {
            Self::Module { body } => many(body, &mut out),
            Self::FunctionDef {
                name,
                args,
                defaults,
                vararg,
                kwarg,
                after_rest,
                blockarg,
                body,
                decorators,
                ..
            } => {
                opt(name, &mut out);
                many(args, &mut out);
                many(defaults, &mut out);
                opt(vararg, &mut out);
                opt(kwarg, &mut out);
                many(after_rest, &mut out);
                opt(blockarg, &mut out);
                many(body, &mut out);
                many(decorators, &mut out);
            }
            Self::ClassDef {
                name,
                bases,
                keywords,
                body,
                decorators,
            } => {
                one(name, &mut out);
                many(bases, &mut out);
                many(keywords, &mut out);
                many(body, &mut out);
                many(decorators, &mut out);
            }
            Self::Return { value } | Self::Yield { value } => opt(value, &mut out),
            Self::Delete { targets } => many(targets, &mut out),
            Self::Assign { targets, value } => {
                many(targets, &mut out);
                one(value, &mut out);
            }
            Self::AugAssign { target, value, .. } | Self::Named { target, value } => {
                one(target, &mut out);
                one(value, &mut out);
            }
            Self::AnnAssign {
                target,
                annotation,
                value,
            } => {
                one(target, &mut out);
                one(annotation, &mut out);
                opt(value, &mut out);
            }
            Self::For {
                target,
                iter,
                body,
                orelse,
                ..
            } => {
                one(target, &mut out);
                one(iter, &mut out);
                many(body, &mut out);
                many(orelse, &mut out);
            }
            Self::While { test, body, orelse } | Self::If { test, body, orelse } => {
                one(test, &mut out);
                many(body, &mut out);
                many(orelse, &mut out);
            }
            Self::With { items, body, .. } => {
                many(items, &mut out);
                many(body, &mut out);
            }
            Self::WithItem { context, var } => {
                one(context, &mut out);
                opt(var, &mut out);
            }
            Self::Raise { exc, cause } => {
                opt(exc, &mut out);
                opt(cause, &mut out);
            }
            Self::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                many(body, &mut out);
                many(handlers, &mut out);
                many(orelse, &mut out);
                many(finalbody, &mut out);
            }
            Self::Handler { exc_type, name, body } => {
                opt(exc_type, &mut out);
                opt(name, &mut out);
                many(body, &mut out);
            }
            Self::Assert { test, msg } => {
                one(test, &mut out);
                opt(msg, &mut out);
            }
            Self::Import { names } | Self::ImportFrom { names, .. } => many(names, &mut out),
            Self::Match { subject, bodies } => {
                one(subject, &mut out);
                for body in bodies {
                    many(body, &mut out);
                }
            }
            Self::ExprStmt { value } | Self::YieldFrom { value } | Self::Await { value } => one(value, &mut out),
            Self::BoolOp { values, .. } => many(values, &mut out),
            Self::BinOp { left, right, .. } => {
                one(left, &mut out);
                one(right, &mut out);
            }
            Self::UnaryOp { operand, .. } => one(operand, &mut out),
            Self::IfExp { test, body, orelse } => {
                one(test, &mut out);
                one(body, &mut out);
                one(orelse, &mut out);
            }
            Self::Dict { keys, values } => {
                for key in keys {
                    opt(key, &mut out);
                }
                many(values, &mut out);
            }
            Self::Set { elts } | Self::List { elts } | Self::Tuple { elts } => many(elts, &mut out),
            Self::ListComp { elt, generators } | Self::SetComp { elt, generators } | Self::GeneratorExp { elt, generators } => {
                one(elt, &mut out);
                many(generators, &mut out);
            }
            Self::DictComp { key, value, generators } => {
                one(key, &mut out);
                one(value, &mut out);
                many(generators, &mut out);
            }
            Self::Comprehension { target, iter, ifs } => {
                one(target, &mut out);
                one(iter, &mut out);
                many(ifs, &mut out);
            }
            Self::Compare { left, comparators, .. } => {
                one(left, &mut out);
                many(comparators, &mut out);
            }
            Self::Call {
                func,
                args,
                keywords,
                starargs,
                kwargs,
                blockarg,
            } => {
                one(func, &mut out);
                many(args, &mut out);
                many(keywords, &mut out);
                opt(starargs, &mut out);
                opt(kwargs, &mut out);
                opt(blockarg, &mut out);
            }
            Self::Keyword { value, .. } => one(value, &mut out),
            Self::FString { parts } => many(parts, &mut out),
            Self::Attribute { value, attr } => {
                one(value, &mut out);
                one(attr, &mut out);
            }
            Self::Subscript { value, index } => {
                one(value, &mut out);
                opt(index, &mut out);
            }
            Self::Starred { value } => one(value, &mut out),
            Self::Slice { lower, upper, step } => {
                opt(lower, &mut out);
                opt(upper, &mut out);
                opt(step, &mut out);
            }
            Self::Alias { .. }
            | Self::Global { .. }
            | Self::Pass
            | Self::Break
            | Self::Continue
            | Self::Int { .. }
            | Self::Float { .. }
            | Self::Str { .. }
            | Self::Bytes
            | Self::NameConst { .. }
            | Self::EllipsisLit
            | Self::Name { .. }
            | Self::Unsupported => {}
        }
        out
    }
}

/// A single AST node: its variant plus byte offsets into the source and the
/// back-link to its parent (None only on the module root).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub start: u32,
    pub end: u32,
    pub parent: Option<NodeId>,
}

impl Node {
    pub fn length(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }
}

/// An arena-allocated module tree.
///
/// The `file` field is resettable after cache deserialization because files
/// with identical content share one on-disk cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleAst {
    nodes: Vec<Node>,
    root: NodeId,
    file: String,
    sha1: String,
}

impl ModuleAst {
    pub fn new(nodes: Vec<Node>, root: NodeId, file: String, sha1: String) -> Self {
        Self { nodes, root, file, sha1 }
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn sha1(&self) -> &str {
        &self.sha1
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Re-points the tree at a different source path. Used when a disk-cache
    /// entry produced for one path is adopted for another with equal content.
    pub fn set_file(&mut self, file: impl Into<String>) {
        self.file = file.into();
    }

    pub fn iter_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId::new)
    }

    /// The docstring of a statement block: present only when the first
    /// statement is a bare string-literal expression. Later strings and
    /// leading comments never count.
    pub fn doc_string(&self, body: &[NodeId]) -> Option<String> {
        let first = *body.first()?;
        if let NodeKind::ExprStmt { value } = self.kind(first)
            && let NodeKind::Str { value: s } = self.kind(*value)
        {
            return Some(s.clone());
        }
        None
    }

    /// Pre-order traversal from `from`, calling the visitor on every node.
    pub fn visit(&self, from: NodeId, f: &mut impl FnMut(NodeId)) {
        f(from);
        for child in self.kind(from).children() {
            self.visit(child, f);
        }
    }

    /// Walks up the parent chain to the enclosing function or class node.
    pub fn enclosing_scope_node(&self, mut id: NodeId) -> Option<NodeId> {
        while let Some(parent) = self.node(id).parent {
            match self.kind(parent) {
                NodeKind::FunctionDef { .. } | NodeKind::ClassDef { .. } | NodeKind::Module { .. } => {
                    return Some(parent);
                }
                _ => id = parent,
            }
        }
        None
    }
}

/// Mutable builder used by the parser bridge while lowering a module.
#[derive(Debug, Default)]
pub struct AstBuilder {
    nodes: Vec<Node>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Byte span of an already-allocated node.
    pub fn span(&self, id: NodeId) -> (u32, u32) {
        let node = &self.nodes[id.index()];
        (node.start, node.end)
    }

    /// Allocates a node; children must already be allocated. Parent links are
    /// assigned in one pass by [`AstBuilder::finish`].
    pub fn push(&mut self, kind: NodeKind, start: u32, end: u32) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node {
            kind,
            start,
            end,
            parent: None,
        });
        id
    }

    /// Seals the arena: wires every child's parent link, then wraps the node
    /// vector into a [`ModuleAst`] rooted at `root`.
    pub fn finish(mut self, root: NodeId, file: String, sha1: String) -> ModuleAst {
        let edges: Vec<(NodeId, Vec<NodeId>)> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId::new(i), node.kind.children()))
            .collect();
        for (parent, children) in edges {
            for child in children {
                self.nodes[child.index()].parent = Some(parent);
            }
        }
        ModuleAst::new(self.nodes, root, file, sha1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_string_only_first_statement() {
        let mut b = AstBuilder::new();
        let doc = b.push(
            NodeKind::Str {
                value: "module doc".to_owned(),
            },
            0,
            12,
        );
        let stmt = b.push(NodeKind::ExprStmt { value: doc }, 0, 12);
        let pass = b.push(NodeKind::Pass, 13, 17);
        let root = b.push(NodeKind::Module { body: vec![stmt, pass] }, 0, 17);
        let ast = b.finish(root, "m.py".to_owned(), "0".repeat(40));

        let NodeKind::Module { body } = ast.kind(ast.root()) else {
            panic!("expected module root");
        };
        assert_eq!(ast.doc_string(body), Some("module doc".to_owned()));
        // A leading pass statement hides the string from docstring position.
        assert_eq!(ast.doc_string(&[pass, stmt]), None);
    }

    #[test]
    fn finish_assigns_parents() {
        let mut b = AstBuilder::new();
        let lhs = b.push(NodeKind::Name { id: "x".to_owned() }, 0, 1);
        let rhs = b.push(NodeKind::Int { value: 1 }, 4, 5);
        let assign = b.push(
            NodeKind::Assign {
                targets: vec![lhs],
                value: rhs,
            },
            0,
            5,
        );
        let root = b.push(NodeKind::Module { body: vec![assign] }, 0, 5);
        let ast = b.finish(root, "m.py".to_owned(), "0".repeat(40));

        assert_eq!(ast.node(lhs).parent, Some(assign));
        assert_eq!(ast.node(rhs).parent, Some(assign));
        assert_eq!(ast.node(assign).parent, Some(root));
        assert_eq!(ast.node(root).parent, None);
    }
}
