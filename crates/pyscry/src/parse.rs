//! Parser bridge: lowers the ruff AST into the arena [`ModuleAst`] model.
//!
//! Parsing proper is delegated to `ruff_python_parser`; this module walks the
//! ruff tree once, allocating arena nodes with byte offsets and wiring parent
//! links at the end. A hard parse failure surfaces as [`ParseError`] and is
//! cached as a null tree by the AST cache.

use ruff_python_ast::{
    self as ast, Expr as AstExpr, InterpolatedStringElement, Number, Stmt,
};
use ruff_python_parser::parse_module;
use ruff_text_size::{Ranged, TextRange};
use sha1::{Digest, Sha1};

use crate::nodes::{
    AstBuilder, BinOpKind, BoolOpKind, CmpOpKind, ModuleAst, NameConstValue, NodeId, NodeKind, UnaryOpKind,
};

/// Maximum nesting depth for AST structures during lowering. Matches
/// CPython's limit of ~200 for nested parentheses and keeps deeply nested
/// sources from overflowing the native stack before analysis begins.
#[cfg(not(debug_assertions))]
pub const MAX_NESTING_DEPTH: u16 = 200;
/// In debug builds stack frames are much larger, so the limit is set lower.
#[cfg(debug_assertions)]
pub const MAX_NESTING_DEPTH: u16 = 80;

/// A failed parse. Analysis of the affected module is skipped; other modules
/// proceed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("syntax error in {file}: {message}")]
    Syntax { file: String, message: String, start: u32, end: u32 },
    #[error("{file}: nesting too deep")]
    TooDeep { file: String },
}

impl ParseError {
    pub fn file(&self) -> &str {
        match self {
            Self::Syntax { file, .. } | Self::TooDeep { file } => file,
        }
    }
}

/// Hex-encoded SHA-1 of the given bytes; the cache key for source content.
pub fn sha1_hex(bytes: &[u8]) -> String {
    let digest = Sha1::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Parses Python source into an arena tree rooted at a Module node.
pub fn parse_source(code: &str, file: &str) -> Result<ModuleAst, ParseError> {
    let parsed = parse_module(code).map_err(|e| {
        let range = e.range();
        ParseError::Syntax {
            file: file.to_owned(),
            message: e.to_string(),
            start: range.start().to_u32(),
            end: range.end().to_u32(),
        }
    })?;
    let module = parsed.into_syntax();
    let mut lowerer = Lowerer {
        builder: AstBuilder::new(),
        file: file.to_owned(),
        depth_remaining: MAX_NESTING_DEPTH,
        yield_stack: Vec::new(),
    };
    let body = lowerer.stmts(module.body)?;
    let end = u32::try_from(code.len()).unwrap_or(u32::MAX);
    let root = lowerer.builder.push(NodeKind::Module { body }, 0, end);
    Ok(lowerer.builder.finish(root, file.to_owned(), sha1_hex(code.as_bytes())))
}

/// Walks the ruff AST, allocating arena nodes.
struct Lowerer {
    builder: AstBuilder,
    file: String,
    /// Remaining nesting depth; decremented per recursion level.
    depth_remaining: u16,
    /// One flag per enclosing function body, set when a yield is seen at
    /// that level.
    yield_stack: Vec<bool>,
}

impl Lowerer {
    fn push(&mut self, kind: NodeKind, range: TextRange) -> NodeId {
        self.builder.push(kind, range.start().to_u32(), range.end().to_u32())
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth_remaining == 0 {
            return Err(ParseError::TooDeep { file: self.file.clone() });
        }
        self.depth_remaining -= 1;
        Ok(())
    }

    fn stmts(&mut self, statements: impl IntoIterator<Item = Stmt>) -> Result<Vec<NodeId>, ParseError> {
        statements.into_iter().map(|s| self.stmt(s)).collect()
    }

    fn exprs(&mut self, expressions: impl IntoIterator<Item = AstExpr>) -> Result<Vec<NodeId>, ParseError> {
        expressions.into_iter().map(|e| self.expr(e)).collect()
    }

    fn opt_expr(&mut self, expression: Option<Box<AstExpr>>) -> Result<Option<NodeId>, ParseError> {
        expression.map(|e| self.expr(*e)).transpose()
    }

    fn name_node(&mut self, id: &str, range: TextRange) -> NodeId {
        self.push(NodeKind::Name { id: id.to_owned() }, range)
    }

    /// Flattens posonly/regular/keyword-only formals into one list of Name
    /// nodes, with defaults covering the positional tail (scanned from the
    /// end; a defaulted formal followed by an undefaulted one drops out of
    /// the tail).
    fn parameters(
        &mut self,
        params: &ast::Parameters,
    ) -> Result<(Vec<NodeId>, Vec<NodeId>, Option<NodeId>, Option<NodeId>), ParseError> {
        let all: Vec<&ast::ParameterWithDefault> = params
            .posonlyargs
            .iter()
            .chain(params.args.iter())
            .chain(params.kwonlyargs.iter())
            .collect();
        let mut args = Vec::with_capacity(all.len());
        for p in &all {
            args.push(self.name_node(p.parameter.name.id.as_str(), p.parameter.name.range));
        }
        let tail_len = all.iter().rev().take_while(|p| p.default.is_some()).count();
        let mut defaults = Vec::with_capacity(tail_len);
        for p in &all[all.len() - tail_len..] {
            let default = p.default.clone().expect("tail formals carry defaults");
            defaults.push(self.expr(*default)?);
        }
        let vararg = params
            .vararg
            .as_ref()
            .map(|p| self.name_node(p.name.id.as_str(), p.name.range));
        let kwarg = params
            .kwarg
            .as_ref()
            .map(|p| self.name_node(p.name.id.as_str(), p.name.range));
        Ok((args, defaults, vararg, kwarg))
    }

    fn stmt(&mut self, statement: Stmt) -> Result<NodeId, ParseError> {
        self.descend()?;
        let result = self.stmt_impl(statement);
        self.depth_remaining += 1;
        result
    }

    fn stmt_impl(&mut self, statement: Stmt) -> Result<NodeId, ParseError> {
        match statement {
            Stmt::FunctionDef(f) => {
                let range = f.range();
                let name = self.name_node(f.name.id.as_str(), f.name.range);
                let (args, defaults, vararg, kwarg) = self.parameters(&f.parameters)?;
                self.yield_stack.push(false);
                let body = self.stmts(f.body);
                let is_generator = self.yield_stack.pop().unwrap_or(false);
                let body = body?;
                let decorators = f
                    .decorator_list
                    .into_iter()
                    .map(|d| self.expr(d.expression))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(self.push(
                    NodeKind::FunctionDef {
                        name: Some(name),
                        args,
                        defaults,
                        vararg,
                        kwarg,
                        after_rest: Vec::new(),
                        blockarg: None,
                        body,
                        decorators,
                        is_lambda: false,
                        is_async: f.is_async,
                        is_generator,
                    },
                    range,
                ))
            }
            Stmt::ClassDef(c) => {
                let range = c.range();
                let name = self.name_node(c.name.id.as_str(), c.name.range);
                let (bases, keywords) = match c.arguments {
                    Some(arguments) => {
                        let mut bases = self.exprs(arguments.args.into_vec())?;
                        let mut keywords = Vec::new();
                        for kw in arguments.keywords {
                            let value = self.expr(kw.value)?;
                            match kw.arg {
                                Some(arg) => keywords.push(self.push(
                                    NodeKind::Keyword {
                                        arg: arg.id.to_string(),
                                        value,
                                    },
                                    kw.range,
                                )),
                                // `class C(**kw)`: keep the splat in the
                                // tree so its references are indexed
                                None => bases.push(value),
                            }
                        }
                        (bases, keywords)
                    }
                    None => (Vec::new(), Vec::new()),
                };
                let body = self.stmts(c.body)?;
                let decorators = c
                    .decorator_list
                    .into_iter()
                    .map(|d| self.expr(d.expression))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(self.push(
                    NodeKind::ClassDef {
                        name,
                        bases,
                        keywords,
                        body,
                        decorators,
                    },
                    range,
                ))
            }
            Stmt::Return(r) => {
                let range = r.range();
                let value = self.opt_expr(r.value)?;
                Ok(self.push(NodeKind::Return { value }, range))
            }
            Stmt::Delete(d) => {
                let range = d.range();
                let targets = self.exprs(d.targets)?;
                Ok(self.push(NodeKind::Delete { targets }, range))
            }
            Stmt::Assign(a) => {
                let range = a.range();
                let targets = self.exprs(a.targets)?;
                let value = self.expr(*a.value)?;
                Ok(self.push(NodeKind::Assign { targets, value }, range))
            }
            Stmt::AugAssign(a) => {
                let range = a.range();
                let target = self.expr(*a.target)?;
                let value = self.expr(*a.value)?;
                Ok(self.push(
                    NodeKind::AugAssign {
                        target,
                        op: bin_op(a.op),
                        value,
                    },
                    range,
                ))
            }
            Stmt::AnnAssign(a) => {
                let range = a.range();
                let target = self.expr(*a.target)?;
                let annotation = self.expr(*a.annotation)?;
                let value = self.opt_expr(a.value)?;
                Ok(self.push(
                    NodeKind::AnnAssign {
                        target,
                        annotation,
                        value,
                    },
                    range,
                ))
            }
            Stmt::For(f) => {
                let range = f.range();
                let target = self.expr(*f.target)?;
                let iter = self.expr(*f.iter)?;
                let body = self.stmts(f.body)?;
                let orelse = self.stmts(f.orelse)?;
                Ok(self.push(
                    NodeKind::For {
                        target,
                        iter,
                        body,
                        orelse,
                        is_async: f.is_async,
                    },
                    range,
                ))
            }
            Stmt::While(w) => {
                let range = w.range();
                let test = self.expr(*w.test)?;
                let body = self.stmts(w.body)?;
                let orelse = self.stmts(w.orelse)?;
                Ok(self.push(NodeKind::While { test, body, orelse }, range))
            }
            Stmt::If(i) => {
                let range = i.range();
                let test = self.expr(*i.test)?;
                let body = self.stmts(i.body)?;
                let orelse = self.elif_else(i.elif_else_clauses)?;
                Ok(self.push(NodeKind::If { test, body, orelse }, range))
            }
            Stmt::With(w) => {
                let range = w.range();
                let mut items = Vec::with_capacity(w.items.len());
                for item in w.items {
                    let item_range = item.range();
                    let context = self.expr(item.context_expr)?;
                    let var = item.optional_vars.map(|v| self.expr(*v)).transpose()?;
                    items.push(self.push(NodeKind::WithItem { context, var }, item_range));
                }
                let body = self.stmts(w.body)?;
                Ok(self.push(
                    NodeKind::With {
                        items,
                        body,
                        is_async: w.is_async,
                    },
                    range,
                ))
            }
            Stmt::Raise(r) => {
                let range = r.range();
                let exc = self.opt_expr(r.exc)?;
                let cause = self.opt_expr(r.cause)?;
                Ok(self.push(NodeKind::Raise { exc, cause }, range))
            }
            Stmt::Try(t) => {
                let range = t.range();
                let body = self.stmts(t.body)?;
                let mut handlers = Vec::with_capacity(t.handlers.len());
                for handler in t.handlers {
                    let ast::ExceptHandler::ExceptHandler(h) = handler;
                    let handler_range = h.range();
                    let exc_type = self.opt_expr(h.type_)?;
                    let name = h.name.map(|n| self.name_node(n.id.as_str(), n.range));
                    let handler_body = self.stmts(h.body)?;
                    handlers.push(self.push(
                        NodeKind::Handler {
                            exc_type,
                            name,
                            body: handler_body,
                        },
                        handler_range,
                    ));
                }
                let orelse = self.stmts(t.orelse)?;
                let finalbody = self.stmts(t.finalbody)?;
                Ok(self.push(
                    NodeKind::Try {
                        body,
                        handlers,
                        orelse,
                        finalbody,
                    },
                    range,
                ))
            }
            Stmt::Assert(a) => {
                let range = a.range();
                let test = self.expr(*a.test)?;
                let msg = self.opt_expr(a.msg)?;
                Ok(self.push(NodeKind::Assert { test, msg }, range))
            }
            Stmt::Import(i) => {
                let range = i.range();
                let names = self.aliases(i.names);
                Ok(self.push(NodeKind::Import { names }, range))
            }
            Stmt::ImportFrom(i) => {
                let range = i.range();
                let names = self.aliases(i.names);
                Ok(self.push(
                    NodeKind::ImportFrom {
                        module: i.module.map(|m| m.id.to_string()),
                        names,
                        level: i.level,
                    },
                    range,
                ))
            }
            Stmt::Global(g) => {
                let range = g.range();
                let names = g.names.iter().map(|n| n.id.to_string()).collect();
                Ok(self.push(NodeKind::Global { names }, range))
            }
            // nonlocal reads resolve through the parent-chain walk anyway;
            // rebinding precision is not modeled
            Stmt::Nonlocal(n) => Ok(self.push(NodeKind::Pass, n.range())),
            Stmt::Match(m) => {
                let range = m.range();
                let subject = self.expr(*m.subject)?;
                let mut bodies = Vec::with_capacity(m.cases.len());
                for case in m.cases {
                    bodies.push(self.stmts(case.body)?);
                }
                Ok(self.push(NodeKind::Match { subject, bodies }, range))
            }
            Stmt::Expr(e) => {
                let range = e.range();
                let value = self.expr(*e.value)?;
                Ok(self.push(NodeKind::ExprStmt { value }, range))
            }
            Stmt::Pass(p) => Ok(self.push(NodeKind::Pass, p.range())),
            Stmt::Break(b) => Ok(self.push(NodeKind::Break, b.range())),
            Stmt::Continue(c) => Ok(self.push(NodeKind::Continue, c.range())),
            other => Ok(self.push(NodeKind::Unsupported, other.range())),
        }
    }

    /// Folds ruff's flattened elif/else clause list back into nested If
    /// nodes, innermost first.
    fn elif_else(&mut self, clauses: Vec<ast::ElifElseClause>) -> Result<Vec<NodeId>, ParseError> {
        let mut tail: Vec<NodeId> = Vec::new();
        for clause in clauses.into_iter().rev() {
            let range = clause.range();
            match clause.test {
                Some(test) => {
                    let test = self.expr(test)?;
                    let body = self.stmts(clause.body)?;
                    let nested = self.push(
                        NodeKind::If {
                            test,
                            body,
                            orelse: tail,
                        },
                        range,
                    );
                    tail = vec![nested];
                }
                None => {
                    tail = self.stmts(clause.body)?;
                }
            }
        }
        Ok(tail)
    }

    fn aliases(&mut self, names: Vec<ast::Alias>) -> Vec<NodeId> {
        names
            .into_iter()
            .map(|alias| {
                let range = alias.range();
                self.push(
                    NodeKind::Alias {
                        name: alias.name.id.to_string(),
                        asname: alias.asname.map(|a| a.id.to_string()),
                    },
                    range,
                )
            })
            .collect()
    }

    fn expr(&mut self, expression: AstExpr) -> Result<NodeId, ParseError> {
        self.descend()?;
        let result = self.expr_impl(expression);
        self.depth_remaining += 1;
        result
    }

    fn expr_impl(&mut self, expression: AstExpr) -> Result<NodeId, ParseError> {
        match expression {
            AstExpr::BoolOp(b) => {
                let range = b.range();
                let values = self.exprs(b.values)?;
                Ok(self.push(
                    NodeKind::BoolOp {
                        op: match b.op {
                            ast::BoolOp::And => BoolOpKind::And,
                            ast::BoolOp::Or => BoolOpKind::Or,
                        },
                        values,
                    },
                    range,
                ))
            }
            AstExpr::Named(n) => {
                let range = n.range();
                let target = self.expr(*n.target)?;
                let value = self.expr(*n.value)?;
                Ok(self.push(NodeKind::Named { target, value }, range))
            }
            AstExpr::BinOp(b) => {
                let range = b.range();
                let left = self.expr(*b.left)?;
                let right = self.expr(*b.right)?;
                Ok(self.push(
                    NodeKind::BinOp {
                        left,
                        op: bin_op(b.op),
                        right,
                    },
                    range,
                ))
            }
            AstExpr::UnaryOp(u) => {
                let range = u.range();
                let operand = self.expr(*u.operand)?;
                Ok(self.push(
                    NodeKind::UnaryOp {
                        op: match u.op {
                            ast::UnaryOp::Not => UnaryOpKind::Not,
                            ast::UnaryOp::UAdd => UnaryOpKind::UAdd,
                            ast::UnaryOp::USub => UnaryOpKind::USub,
                            ast::UnaryOp::Invert => UnaryOpKind::Invert,
                        },
                        operand,
                    },
                    range,
                ))
            }
            AstExpr::Lambda(l) => {
                let range = l.range();
                let (args, defaults, vararg, kwarg) = match l.parameters {
                    Some(ref params) => self.parameters(params)?,
                    None => (Vec::new(), Vec::new(), None, None),
                };
                let body_expr = self.expr(*l.body)?;
                // the synthesized Return reuses the wrapped expression's span
                let (body_start, body_end) = self.builder.span(body_expr);
                let ret = self.builder.push(NodeKind::Return { value: Some(body_expr) }, body_start, body_end);
                Ok(self.push(
                    NodeKind::FunctionDef {
                        name: None,
                        args,
                        defaults,
                        vararg,
                        kwarg,
                        after_rest: Vec::new(),
                        blockarg: None,
                        body: vec![ret],
                        decorators: Vec::new(),
                        is_lambda: true,
                        is_async: false,
                        is_generator: false,
                    },
                    range,
                ))
            }
            AstExpr::If(i) => {
                let range = i.range();
                let test = self.expr(*i.test)?;
                let body = self.expr(*i.body)?;
                let orelse = self.expr(*i.orelse)?;
                Ok(self.push(NodeKind::IfExp { test, body, orelse }, range))
            }
            AstExpr::Dict(d) => {
                let range = d.range();
                let mut keys = Vec::with_capacity(d.items.len());
                let mut values = Vec::with_capacity(d.items.len());
                for item in d.items {
                    keys.push(item.key.map(|k| self.expr(k)).transpose()?);
                    values.push(self.expr(item.value)?);
                }
                Ok(self.push(NodeKind::Dict { keys, values }, range))
            }
            AstExpr::Set(s) => {
                let range = s.range();
                let elts = self.exprs(s.elts)?;
                Ok(self.push(NodeKind::Set { elts }, range))
            }
            AstExpr::ListComp(c) => {
                let range = c.range();
                let elt = self.expr(*c.elt)?;
                let generators = self.comprehensions(c.generators)?;
                Ok(self.push(NodeKind::ListComp { elt, generators }, range))
            }
            AstExpr::SetComp(c) => {
                let range = c.range();
                let elt = self.expr(*c.elt)?;
                let generators = self.comprehensions(c.generators)?;
                Ok(self.push(NodeKind::SetComp { elt, generators }, range))
            }
            AstExpr::DictComp(c) => {
                let range = c.range();
                let key = self.expr(*c.key.expect("dict comprehension key"))?;
                let value = self.expr(*c.value)?;
                let generators = self.comprehensions(c.generators)?;
                Ok(self.push(NodeKind::DictComp { key, value, generators }, range))
            }
            AstExpr::Generator(g) => {
                let range = g.range();
                let elt = self.expr(*g.elt)?;
                let generators = self.comprehensions(g.generators)?;
                Ok(self.push(NodeKind::GeneratorExp { elt, generators }, range))
            }
            AstExpr::Await(a) => {
                let range = a.range();
                let value = self.expr(*a.value)?;
                Ok(self.push(NodeKind::Await { value }, range))
            }
            AstExpr::Yield(y) => {
                let range = y.range();
                if let Some(flag) = self.yield_stack.last_mut() {
                    *flag = true;
                }
                let value = self.opt_expr(y.value)?;
                Ok(self.push(NodeKind::Yield { value }, range))
            }
            AstExpr::YieldFrom(y) => {
                let range = y.range();
                if let Some(flag) = self.yield_stack.last_mut() {
                    *flag = true;
                }
                let value = self.expr(*y.value)?;
                Ok(self.push(NodeKind::YieldFrom { value }, range))
            }
            AstExpr::Compare(c) => {
                let range = c.range();
                let left = self.expr(*c.left)?;
                let ops = c.ops.iter().map(|op| cmp_op(*op)).collect();
                let comparators = self.exprs(c.comparators.into_vec())?;
                Ok(self.push(NodeKind::Compare { left, ops, comparators }, range))
            }
            AstExpr::Call(c) => {
                let range = c.range();
                let func = self.expr(*c.func)?;
                let ast::Arguments { args, keywords, .. } = c.arguments;
                let mut pos = Vec::new();
                let mut starargs = None;
                for arg in args.into_vec() {
                    match arg {
                        AstExpr::Starred(star) => {
                            // the first `*args` splat wins the slot; later
                            // ones stay in the tree as plain positionals
                            let value = self.expr(*star.value)?;
                            if starargs.is_none() {
                                starargs = Some(value);
                            } else {
                                pos.push(value);
                            }
                        }
                        other => pos.push(self.expr(other)?),
                    }
                }
                let mut kw_nodes = Vec::new();
                let mut kwargs = None;
                for kw in keywords {
                    let kw_range = kw.range;
                    let value = self.expr(kw.value)?;
                    match kw.arg {
                        Some(arg) => kw_nodes.push(self.push(
                            NodeKind::Keyword {
                                arg: arg.id.to_string(),
                                value,
                            },
                            kw_range,
                        )),
                        // `**splat`: the first one wins the slot; later
                        // ones stay in the tree as plain positionals
                        None => {
                            if kwargs.is_none() {
                                kwargs = Some(value);
                            } else {
                                pos.push(value);
                            }
                        }
                    }
                }
                Ok(self.push(
                    NodeKind::Call {
                        func,
                        args: pos,
                        keywords: kw_nodes,
                        starargs,
                        kwargs,
                        blockarg: None,
                    },
                    range,
                ))
            }
            AstExpr::FString(f) => {
                let range = f.range();
                let mut parts = Vec::new();
                for part in f.value.iter() {
                    if let ast::FStringPart::FString(fstring) = part {
                        for element in &fstring.elements {
                            if let InterpolatedStringElement::Interpolation(interp) = element {
                                parts.push(self.expr((*interp.expression).clone())?);
                            }
                        }
                    }
                }
                Ok(self.push(NodeKind::FString { parts }, range))
            }
            AstExpr::StringLiteral(s) => {
                let range = s.range();
                let value = s.value.to_string();
                Ok(self.push(NodeKind::Str { value }, range))
            }
            AstExpr::BytesLiteral(b) => Ok(self.push(NodeKind::Bytes, b.range())),
            AstExpr::NumberLiteral(n) => {
                let range = n.range();
                match n.value {
                    Number::Int(i) => {
                        // out-of-range literals saturate; the interval
                        // lattice keeps them bounded
                        let value = i.as_i64().unwrap_or(i64::MAX);
                        Ok(self.push(NodeKind::Int { value }, range))
                    }
                    Number::Float(value) => Ok(self.push(NodeKind::Float { value }, range)),
                    Number::Complex { .. } => Ok(self.push(NodeKind::Float { value: 0.0 }, range)),
                }
            }
            AstExpr::BooleanLiteral(b) => {
                let value = if b.value {
                    NameConstValue::True
                } else {
                    NameConstValue::False
                };
                Ok(self.push(NodeKind::NameConst { value }, b.range()))
            }
            AstExpr::NoneLiteral(n) => Ok(self.push(
                NodeKind::NameConst {
                    value: NameConstValue::None,
                },
                n.range(),
            )),
            AstExpr::EllipsisLiteral(e) => Ok(self.push(NodeKind::EllipsisLit, e.range())),
            AstExpr::Attribute(a) => {
                let range = a.range();
                let value = self.expr(*a.value)?;
                let attr = self.name_node(a.attr.id.as_str(), a.attr.range);
                Ok(self.push(NodeKind::Attribute { value, attr }, range))
            }
            AstExpr::Subscript(s) => {
                let range = s.range();
                let value = self.expr(*s.value)?;
                let index = Some(self.expr(*s.slice)?);
                Ok(self.push(NodeKind::Subscript { value, index }, range))
            }
            AstExpr::Starred(s) => {
                let range = s.range();
                let value = self.expr(*s.value)?;
                Ok(self.push(NodeKind::Starred { value }, range))
            }
            AstExpr::Name(n) => Ok(self.name_node(n.id.as_str(), n.range)),
            AstExpr::List(l) => {
                let range = l.range();
                let elts = self.exprs(l.elts)?;
                Ok(self.push(NodeKind::List { elts }, range))
            }
            AstExpr::Tuple(t) => {
                let range = t.range();
                let elts = self.exprs(t.elts)?;
                Ok(self.push(NodeKind::Tuple { elts }, range))
            }
            AstExpr::Slice(s) => {
                let range = s.range();
                let lower = self.opt_expr(s.lower)?;
                let upper = self.opt_expr(s.upper)?;
                let step = self.opt_expr(s.step)?;
                Ok(self.push(NodeKind::Slice { lower, upper, step }, range))
            }
            other => Ok(self.push(NodeKind::Unsupported, other.range())),
        }
    }

    fn comprehensions(&mut self, generators: Vec<ast::Comprehension>) -> Result<Vec<NodeId>, ParseError> {
        let mut out = Vec::with_capacity(generators.len());
        for generator in generators {
            let range = generator.range();
            let target = self.expr(generator.target)?;
            let iter = self.expr(generator.iter)?;
            let ifs = self.exprs(generator.ifs)?;
            out.push(self.push(NodeKind::Comprehension { target, iter, ifs }, range));
        }
        Ok(out)
    }

}

fn bin_op(op: ast::Operator) -> BinOpKind {
    match op {
        ast::Operator::Add => BinOpKind::Add,
        ast::Operator::Sub => BinOpKind::Sub,
        ast::Operator::Mult => BinOpKind::Mult,
        ast::Operator::MatMult => BinOpKind::MatMult,
        ast::Operator::Div => BinOpKind::Div,
        ast::Operator::Mod => BinOpKind::Mod,
        ast::Operator::Pow => BinOpKind::Pow,
        ast::Operator::LShift => BinOpKind::LShift,
        ast::Operator::RShift => BinOpKind::RShift,
        ast::Operator::BitOr => BinOpKind::BitOr,
        ast::Operator::BitXor => BinOpKind::BitXor,
        ast::Operator::BitAnd => BinOpKind::BitAnd,
        ast::Operator::FloorDiv => BinOpKind::FloorDiv,
    }
}

fn cmp_op(op: ast::CmpOp) -> CmpOpKind {
    match op {
        ast::CmpOp::Eq => CmpOpKind::Eq,
        ast::CmpOp::NotEq => CmpOpKind::NotEq,
        ast::CmpOp::Lt => CmpOpKind::Lt,
        ast::CmpOp::LtE => CmpOpKind::LtE,
        ast::CmpOp::Gt => CmpOpKind::Gt,
        ast::CmpOp::GtE => CmpOpKind::GtE,
        ast::CmpOp::Is => CmpOpKind::Is,
        ast::CmpOp::IsNot => CmpOpKind::IsNot,
        ast::CmpOp::In => CmpOpKind::In,
        ast::CmpOp::NotIn => CmpOpKind::NotIn,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_wires_parents() {
        let ast = parse_source("x = 1\ny = x + 2\n", "m.py").expect("parse");
        // every non-root node's parent lists it among its children
        for id in ast.iter_ids() {
            let node = ast.node(id);
            match node.parent {
                Some(parent) => {
                    assert!(
                        ast.kind(parent).children().contains(&id),
                        "{id} missing from its parent's children"
                    );
                }
                None => assert_eq!(id, ast.root(), "only the root may be parentless"),
            }
        }
    }

    #[test]
    fn sha1_is_stable_and_content_keyed() {
        let a = parse_source("x = 1\n", "a.py").expect("parse");
        let b = parse_source("x = 1\n", "b.py").expect("parse");
        assert_eq!(a.sha1(), b.sha1());
        assert_eq!(a.sha1().len(), 40);
        let c = parse_source("x = 2\n", "c.py").expect("parse");
        assert_ne!(a.sha1(), c.sha1());
    }

    #[test]
    fn syntax_error_reports_file() {
        let err = parse_source("def f(:\n", "bad.py").expect_err("must fail");
        assert_eq!(err.file(), "bad.py");
    }

    #[test]
    fn elif_chain_nests() {
        let ast = parse_source("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n", "m.py").expect("parse");
        let NodeKind::Module { body } = ast.kind(ast.root()) else {
            panic!("no module root");
        };
        let NodeKind::If { orelse, .. } = ast.kind(body[0]) else {
            panic!("expected if");
        };
        assert_eq!(orelse.len(), 1);
        assert!(matches!(ast.kind(orelse[0]), NodeKind::If { .. }), "elif nests as If");
    }
}
