//! The inference core: one `transform(node, state)` dispatch over the node
//! taxonomy, threading a lexical state through every expression and yielding
//! a type for every node.
//!
//! Calls are evaluated by applying the callee to the actual argument types;
//! results are memoized per argument-type tuple on the function payload, and
//! a call-stack guard cuts recursive cycles by answering Unknown for the
//! recursive edge. Control flow is handled flow-sensitively: `if` branches
//! analyze under copied states that are merged (or selected) afterwards.

use indexmap::IndexMap;

use crate::{
    analyzer::{Analyzer, Cx},
    nodes::{BinOpKind, CmpOpKind, NameConstValue, NodeId, NodeKind, NodeRef, UnaryOpKind},
    scopes::{BindingKind, ScopeId, ScopeKind},
    types::{
        BOOL, BYTES, CONT, ClassId, FALSE, FLOAT, FunId, FunctionData, INT, IntRange, NONE, STR, TRUE, TypeId,
        TypeKind, UNKNOWN,
    },
};

/// Actual arguments of one call, already transformed to types.
#[derive(Debug, Clone, Default)]
pub(crate) struct CallArgs {
    pub pos: Vec<TypeId>,
    pub kw: Vec<(String, TypeId)>,
    pub star: Option<TypeId>,
    pub kw_splat: Option<TypeId>,
    pub block: Option<TypeId>,
}

fn name_of(cx: &Cx, node: NodeId) -> String {
    match cx.ast.kind(node) {
        NodeKind::Name { id } => id.clone(),
        _ => String::new(),
    }
}

impl Analyzer {
    /// Transforms a statement block.
    ///
    /// The block's type is the union of the value types of its return-like
    /// exits, plus CONT iff the block can fall through. Statements behind a
    /// definite exit are still transformed (dead code stays indexed) but do
    /// not contribute to the block type.
    pub(crate) fn transform_block(&mut self, cx: &Cx, body: &[NodeId], state: ScopeId) -> TypeId {
        let mut exits: Vec<TypeId> = Vec::new();
        let mut falls = true;
        for &stmt in body {
            let t = self.transform(cx, stmt, state);
            if !falls {
                continue;
            }
            match cx.ast.kind(stmt) {
                NodeKind::Return { .. } => {
                    exits.push(t);
                    falls = false;
                }
                NodeKind::Raise { .. } => falls = false,
                NodeKind::Break | NodeKind::Continue => falls = false,
                NodeKind::If { .. }
                | NodeKind::Try { .. }
                | NodeKind::While { .. }
                | NodeKind::For { .. }
                | NodeKind::With { .. }
                | NodeKind::Match { .. } => {
                    let stripped = self.types.without_cont(t);
                    if !self.types.is_cont(stripped) {
                        exits.push(stripped);
                    }
                    if !self.types.contains(t, CONT) {
                        falls = false;
                    }
                }
                // only yields make an expression statement contribute
                NodeKind::ExprStmt { .. } => {
                    if !self.types.is_cont(t) {
                        exits.push(t);
                    }
                }
                _ => {}
            }
        }
        let mut result = self.types.union_all(&exits);
        if falls {
            result = self.types.union(result, CONT);
        } else if exits.is_empty() {
            result = CONT;
        }
        result
    }

    /// Transforms one node, producing its type. Every failure path yields
    /// Unknown plus a diagnostic; the pass never aborts a module.
    pub(crate) fn transform(&mut self, cx: &Cx, node: NodeId, state: ScopeId) -> TypeId {
        match cx.ast.kind(node) {
            NodeKind::Module { body } => {
                let body = body.clone();
                self.transform_block(cx, &body, state)
            }
            NodeKind::FunctionDef { .. } => self.transform_function_def(cx, node, state),
            NodeKind::ClassDef { .. } => self.transform_class_def(cx, node, state),
            NodeKind::Return { value } => match value {
                Some(v) => {
                    let v = *v;
                    self.transform(cx, v, state)
                }
                None => NONE,
            },
            NodeKind::Delete { targets } => {
                for &t in &targets.clone() {
                    self.transform(cx, t, state);
                }
                CONT
            }
            NodeKind::Assign { targets, value } => {
                let (targets, value) = (targets.clone(), *value);
                let t = self.transform(cx, value, state);
                for &target in &targets {
                    self.bind(cx, state, target, t, BindingKind::Variable);
                }
                CONT
            }
            NodeKind::AugAssign { target, op, value } => {
                let (target, op, value) = (*target, *op, *value);
                let lt = self.transform(cx, target, state);
                let rt = self.transform(cx, value, state);
                let t = self.binop_type(op, lt, rt);
                self.bind(cx, state, target, t, BindingKind::Variable);
                CONT
            }
            NodeKind::Named { target, value } => {
                let (target, value) = (*target, *value);
                let t = self.transform(cx, value, state);
                self.bind(cx, state, target, t, BindingKind::Variable);
                t
            }
            NodeKind::AnnAssign {
                target,
                annotation,
                value,
            } => {
                let (target, annotation, value) = (*target, *annotation, *value);
                self.transform(cx, annotation, state);
                let t = match value {
                    Some(v) => self.transform(cx, v, state),
                    None => UNKNOWN,
                };
                self.bind(cx, state, target, t, BindingKind::Variable);
                CONT
            }
            NodeKind::For {
                target, iter, body, orelse, ..
            } => {
                let (target, iter) = (*target, *iter);
                let (body, orelse) = (body.clone(), orelse.clone());
                let iter_t = self.transform(cx, iter, state);
                let elem = self.types.iterated_elem(iter_t);
                self.bind(cx, state, target, elem, BindingKind::Variable);
                let t1 = self.transform_block(cx, &body, state);
                let t2 = self.transform_block(cx, &orelse, state);
                let joined = self.types.union(t1, t2);
                // the iteration may not run at all
                self.types.union(joined, CONT)
            }
            NodeKind::While { test, body, orelse } => {
                let test = *test;
                let (body, orelse) = (body.clone(), orelse.clone());
                self.transform(cx, test, state);
                let t1 = self.transform_block(cx, &body, state);
                let t2 = self.transform_block(cx, &orelse, state);
                let joined = self.types.union(t1, t2);
                self.types.union(joined, CONT)
            }
            NodeKind::If { test, body, orelse } => {
                let test = *test;
                let (body, orelse) = (body.clone(), orelse.clone());
                self.transform_if(cx, test, &body, &orelse, state)
            }
            NodeKind::With { items, body, .. } => {
                let (items, body) = (items.clone(), body.clone());
                for &item in &items {
                    let NodeKind::WithItem { context, var } = cx.ast.kind(item) else {
                        continue;
                    };
                    let (context, var) = (*context, *var);
                    let t = self.transform(cx, context, state);
                    if let Some(var) = var {
                        self.bind(cx, state, var, t, BindingKind::Variable);
                    }
                }
                self.transform_block(cx, &body, state)
            }
            NodeKind::Raise { exc, cause } => {
                let (exc, cause) = (*exc, *cause);
                if let Some(e) = exc {
                    self.transform(cx, e, state);
                }
                if let Some(c) = cause {
                    self.transform(cx, c, state);
                }
                CONT
            }
            NodeKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                let (body, handlers) = (body.clone(), handlers.clone());
                let (orelse, finalbody) = (orelse.clone(), finalbody.clone());
                let mut parts = vec![self.transform_block(cx, &body, state)];
                for &handler in &handlers {
                    let NodeKind::Handler { exc_type, name, body } = cx.ast.kind(handler) else {
                        continue;
                    };
                    let (exc_type, name) = (*exc_type, *name);
                    let handler_body = body.clone();
                    let exc_t = exc_type.map(|e| self.transform(cx, e, state));
                    if let Some(name_node) = name {
                        let bound = match exc_t {
                            Some(t) => self.exception_instance(t),
                            None => UNKNOWN,
                        };
                        let id = name_of(cx, name_node);
                        self.bind_name(cx, state, name_node, &id, bound, BindingKind::Parameter);
                    }
                    parts.push(self.transform_block(cx, &handler_body, state));
                }
                parts.push(self.transform_block(cx, &orelse, state));
                parts.push(self.transform_block(cx, &finalbody, state));
                self.types.union_all(&parts)
            }
            NodeKind::Assert { test, msg } => {
                let (test, msg) = (*test, *msg);
                let t = self.transform(cx, test, state);
                // a passing assert narrows the downstream state
                if let TypeKind::Bool {
                    branches: Some((s1, _)), ..
                } = self.types.kind(t)
                {
                    let s1 = *s1;
                    self.scopes.overwrite(state, s1);
                }
                if let Some(m) = msg {
                    self.transform(cx, m, state);
                }
                CONT
            }
            NodeKind::Import { names } => {
                let names = names.clone();
                self.transform_import(cx, &names, state);
                CONT
            }
            NodeKind::ImportFrom { module, names, level } => {
                let (module, names, level) = (module.clone(), names.clone(), *level);
                self.transform_import_from(cx, module.as_deref(), &names, level, state);
                CONT
            }
            NodeKind::Global { names } => {
                let names = names.clone();
                self.scopes.add_globals(state, names);
                CONT
            }
            NodeKind::Match { subject, bodies } => {
                let (subject, bodies) = (*subject, bodies.clone());
                self.transform(cx, subject, state);
                let mut parts = Vec::with_capacity(bodies.len() + 1);
                for body in &bodies {
                    parts.push(self.transform_block(cx, body, state));
                }
                // no case may match
                parts.push(CONT);
                self.types.union_all(&parts)
            }
            NodeKind::ExprStmt { value } => {
                let value = *value;
                let t = self.transform(cx, value, state);
                match cx.ast.kind(value) {
                    NodeKind::Yield { .. } | NodeKind::YieldFrom { .. } => t,
                    _ => CONT,
                }
            }
            NodeKind::Pass | NodeKind::Break | NodeKind::Continue => CONT,
            NodeKind::BoolOp { values, .. } => {
                let values = values.clone();
                let ts: Vec<TypeId> = values.iter().map(|&v| self.transform(cx, v, state)).collect();
                self.types.union_all(&ts)
            }
            NodeKind::BinOp { left, op, right } => {
                let (left, op, right) = (*left, *op, *right);
                let lt = self.transform(cx, left, state);
                let rt = self.transform(cx, right, state);
                self.binop_type(op, lt, rt)
            }
            NodeKind::UnaryOp { op, operand } => {
                let (op, operand) = (*op, *operand);
                let t = self.transform(cx, operand, state);
                self.unary_type(op, t)
            }
            NodeKind::IfExp { test, body, orelse } => {
                let (test, body, orelse) = (*test, *body, *orelse);
                let test_t = self.transform(cx, test, state);
                let (s1, s2) = match self.types.kind(test_t) {
                    TypeKind::Bool {
                        branches: Some((a, b)), ..
                    } => (*a, *b),
                    _ => (state, state),
                };
                let t1 = self.transform(cx, body, s1);
                let t2 = self.transform(cx, orelse, s2);
                if test_t == TRUE {
                    t1
                } else if test_t == FALSE {
                    t2
                } else {
                    self.types.union(t1, t2)
                }
            }
            NodeKind::Dict { keys, values } => {
                let (keys, values) = (keys.clone(), values.clone());
                let mut key_ts = Vec::new();
                let mut value_ts = Vec::new();
                for (key, &value) in keys.iter().zip(values.iter()) {
                    match key {
                        Some(k) => {
                            key_ts.push(self.transform(cx, *k, state));
                            value_ts.push(self.transform(cx, value, state));
                        }
                        None => {
                            // `**mapping` entry: contribute its own key/value
                            let m = self.transform(cx, value, state);
                            if let TypeKind::Dict { key, value } = self.types.kind(m) {
                                key_ts.push(*key);
                                value_ts.push(*value);
                            }
                        }
                    }
                }
                let k = if key_ts.is_empty() {
                    UNKNOWN
                } else {
                    self.types.union_all(&key_ts)
                };
                let v = if value_ts.is_empty() {
                    UNKNOWN
                } else {
                    self.types.union_all(&value_ts)
                };
                self.types.dict_of(k, v)
            }
            NodeKind::Set { elts } => {
                let elts = elts.clone();
                let ts: Vec<TypeId> = elts.iter().map(|&e| self.transform(cx, e, state)).collect();
                let elem = if ts.is_empty() { UNKNOWN } else { self.types.union_all(&ts) };
                self.types.set_of(elem)
            }
            NodeKind::List { elts } => {
                let elts = elts.clone();
                let ts: Vec<TypeId> = elts.iter().map(|&e| self.transform(cx, e, state)).collect();
                let elem = if ts.is_empty() { UNKNOWN } else { self.types.union_all(&ts) };
                self.types.list_of(elem)
            }
            NodeKind::Tuple { elts } => {
                let elts = elts.clone();
                let ts: Vec<TypeId> = elts.iter().map(|&e| self.transform(cx, e, state)).collect();
                self.types.tuple_of(ts)
            }
            NodeKind::ListComp { elt, generators } | NodeKind::GeneratorExp { elt, generators } => {
                let (elt, generators) = (*elt, generators.clone());
                let elem = self.transform_comprehension(cx, elt, &generators, state);
                self.types.list_of(elem)
            }
            NodeKind::SetComp { elt, generators } => {
                let (elt, generators) = (*elt, generators.clone());
                let elem = self.transform_comprehension(cx, elt, &generators, state);
                self.types.set_of(elem)
            }
            NodeKind::DictComp { key, value, generators } => {
                let (key, value, generators) = (*key, *value, generators.clone());
                let scope = self.comprehension_scope(cx, &generators, state);
                let k = self.transform(cx, key, scope);
                let v = self.transform(cx, value, scope);
                self.types.dict_of(k, v)
            }
            NodeKind::Comprehension { .. } => UNKNOWN,
            NodeKind::Yield { value } => match value {
                Some(v) => {
                    let v = *v;
                    self.transform(cx, v, state)
                }
                None => NONE,
            },
            NodeKind::YieldFrom { value } => {
                let value = *value;
                let t = self.transform(cx, value, state);
                self.types.iterated_elem(t)
            }
            NodeKind::Await { value } => {
                let value = *value;
                self.transform(cx, value, state)
            }
            NodeKind::Compare {
                left, ops, comparators, ..
            } => {
                let (left, ops, comparators) = (*left, ops.clone(), comparators.clone());
                self.transform_compare(cx, left, &ops, &comparators, state)
            }
            NodeKind::Call { .. } => self.transform_call(cx, node, state),
            NodeKind::Keyword { value, .. } => {
                let value = *value;
                self.transform(cx, value, state)
            }
            NodeKind::Int { value } => {
                let value = *value;
                self.types.int_value(value)
            }
            NodeKind::Float { .. } => FLOAT,
            NodeKind::Str { value } => {
                let value = value.clone();
                self.types.str_literal(&value)
            }
            NodeKind::Bytes => BYTES,
            NodeKind::FString { parts } => {
                for &p in &parts.clone() {
                    self.transform(cx, p, state);
                }
                STR
            }
            NodeKind::NameConst { value } => match value {
                NameConstValue::True => TRUE,
                NameConstValue::False => FALSE,
                NameConstValue::None => NONE,
            },
            NodeKind::EllipsisLit => UNKNOWN,
            NodeKind::Attribute { value, attr } => {
                let (value, attr) = (*value, *attr);
                let obj = self.transform(cx, value, state);
                self.attr_load(cx, attr, obj)
            }
            NodeKind::Subscript { value, index } => {
                let (value, index) = (*value, *index);
                let obj = self.transform(cx, value, state);
                let slice = index.is_some_and(|ix| matches!(cx.ast.kind(ix), NodeKind::Slice { .. }));
                let idx_t = index.map(|ix| self.transform(cx, ix, state));
                self.subscript_type(obj, idx_t, slice)
            }
            NodeKind::Starred { value } => {
                let value = *value;
                self.transform(cx, value, state)
            }
            NodeKind::Name { .. } => self.resolve_name(cx, node, state),
            NodeKind::Slice { lower, upper, step } => {
                let (lower, upper, step) = (*lower, *upper, *step);
                for part in [lower, upper, step].into_iter().flatten() {
                    self.transform(cx, part, state);
                }
                UNKNOWN
            }
            NodeKind::Alias { .. } | NodeKind::WithItem { .. } | NodeKind::Handler { .. } | NodeKind::Unsupported => {
                UNKNOWN
            }
        }
    }

    // --- definitions -------------------------------------------------------

    fn transform_function_def(&mut self, cx: &Cx, node: NodeId, state: ScopeId) -> TypeId {
        let NodeKind::FunctionDef {
            name,
            body,
            defaults,
            decorators,
            is_lambda,
            ..
        } = cx.ast.kind(node)
        else {
            return UNKNOWN;
        };
        let (name, is_lambda) = (*name, *is_lambda);
        let (body, defaults, decorators) = (body.clone(), defaults.clone(), decorators.clone());
        for &d in &decorators {
            self.transform(cx, d, state);
        }
        // defaults are evaluated once, at definition time, in the defining
        // state; they cover the positional tail of the formals
        let default_types: Vec<TypeId> = defaults.iter().map(|&d| self.transform(cx, d, state)).collect();
        let env = self.scopes.forwarding(state);
        let fname = match name {
            Some(n) => name_of(cx, n),
            None => {
                self.lambda_counter += 1;
                format!("lambda%{}", self.lambda_counter)
            }
        };
        let qname = self.scopes.extend_path(state, &fname);
        let (fid, fty) = self.types.alloc_fun(FunctionData {
            name: fname.clone(),
            qname,
            def: Some(cx.node_ref(node)),
            env,
            defaults: default_types,
            ret: None,
            cache: Vec::new(),
            called: false,
            is_lambda,
        });
        self.uncalled.insert(fid);
        if let Some(name_node) = name {
            let kind = if self.scopes.scope(state).kind == ScopeKind::Class {
                if fname == "__init__" {
                    BindingKind::Constructor
                } else {
                    BindingKind::Method
                }
            } else {
                BindingKind::Function
            };
            let bid = self.bind_name(cx, state, name_node, &fname, fty, kind);
            if let Some(doc) = cx.ast.doc_string(&body) {
                self.scopes.binding_mut(bid).doc = Some(doc);
            }
        }
        if is_lambda { fty } else { CONT }
    }

    fn transform_class_def(&mut self, cx: &Cx, node: NodeId, state: ScopeId) -> TypeId {
        let NodeKind::ClassDef {
            name,
            bases,
            keywords,
            body,
            decorators,
        } = cx.ast.kind(node)
        else {
            return UNKNOWN;
        };
        let name = *name;
        let (bases, keywords, body, decorators) = (bases.clone(), keywords.clone(), body.clone(), decorators.clone());
        for &d in &decorators {
            self.transform(cx, d, state);
        }
        let base_types: Vec<TypeId> = bases.iter().map(|&b| self.transform(cx, b, state)).collect();
        for &kw in &keywords {
            self.transform(cx, kw, state);
        }
        let cname = name_of(cx, name);
        let qname = self.scopes.extend_path(state, &cname);
        let class_scope = self.scopes.new_scope(Some(state), ScopeKind::Class, qname.clone());
        let (_, cty) = self.types.alloc_class(crate::types::ClassData {
            name: cname.clone(),
            qname,
            def: Some(cx.node_ref(node)),
            scope: class_scope,
            bases: base_types,
        });
        let bid = self.bind_name(cx, state, name, &cname, cty, BindingKind::Class);
        if let Some(doc) = cx.ast.doc_string(&body) {
            self.scopes.binding_mut(bid).doc = Some(doc);
        }
        self.transform_block(cx, &body, class_scope);
        CONT
    }

    // --- control flow ------------------------------------------------------

    fn transform_if(&mut self, cx: &Cx, test: NodeId, body: &[NodeId], orelse: &[NodeId], state: ScopeId) -> TypeId {
        let test_t = self.transform(cx, test, state);
        let (s1, s2) = match self.types.kind(test_t) {
            TypeKind::Bool {
                branches: Some((a, b)), ..
            } => (*a, *b),
            _ => (self.scopes.copy(state), self.scopes.copy(state)),
        };
        let t1 = self.transform_block(cx, body, s1);
        let t2 = self.transform_block(cx, orelse, s2);
        // a literal-constant test decides feasibility outright
        if test_t == TRUE {
            self.scopes.overwrite(state, s1);
            return t1;
        }
        if test_t == FALSE {
            self.scopes.overwrite(state, s2);
            return t2;
        }
        let falls1 = self.types.contains(t1, CONT);
        let falls2 = self.types.contains(t2, CONT);
        match (falls1, falls2) {
            (true, false) => self.scopes.overwrite(state, s1),
            (false, true) => self.scopes.overwrite(state, s2),
            _ => self.scopes.merge_into(state, s1, s2),
        }
        self.types.union(t1, t2)
    }

    fn transform_compare(
        &mut self,
        cx: &Cx,
        left: NodeId,
        ops: &[CmpOpKind],
        comparators: &[NodeId],
        state: ScopeId,
    ) -> TypeId {
        let _ = self.transform(cx, left, state);
        for &c in comparators {
            self.transform(cx, c, state);
        }
        // a None test narrows x: `x is None` in its true branch,
        // `x is not None` in its false branch
        if let [op] = ops
            && matches!(
                op,
                CmpOpKind::Is | CmpOpKind::Eq | CmpOpKind::IsNot | CmpOpKind::NotEq
            )
            && let [comparator] = comparators
            && matches!(
                cx.ast.kind(*comparator),
                NodeKind::NameConst {
                    value: NameConstValue::None
                }
            )
            && let NodeKind::Name { id } = cx.ast.kind(left)
        {
            let id = id.clone();
            let none_side = self.scopes.copy(state);
            self.bind_name(cx, none_side, left, &id, NONE, BindingKind::Variable);
            let other_side = self.scopes.copy(state);
            return match op {
                CmpOpKind::Is | CmpOpKind::Eq => self.types.bool_with_branches(none_side, other_side),
                _ => self.types.bool_with_branches(other_side, none_side),
            };
        }
        BOOL
    }

    fn transform_comprehension(&mut self, cx: &Cx, elt: NodeId, generators: &[NodeId], state: ScopeId) -> TypeId {
        let scope = self.comprehension_scope(cx, generators, state);
        self.transform(cx, elt, scope)
    }

    /// Fresh SCOPE-kind state with every generator target bound to its
    /// iterable's element type. Comprehension variables never leak out.
    fn comprehension_scope(&mut self, cx: &Cx, generators: &[NodeId], state: ScopeId) -> ScopeId {
        let path = self.scopes.scope(state).path.clone();
        let scope = self.scopes.new_scope(Some(state), ScopeKind::Scope, path);
        for &g in generators {
            let NodeKind::Comprehension { target, iter, ifs } = cx.ast.kind(g) else {
                continue;
            };
            let (target, iter, ifs) = (*target, *iter, ifs.clone());
            let iter_t = self.transform(cx, iter, scope);
            let elem = self.types.iterated_elem(iter_t);
            self.bind(cx, scope, target, elem, BindingKind::Variable);
            for &f in &ifs {
                self.transform(cx, f, scope);
            }
        }
        scope
    }

    // --- names and attributes ----------------------------------------------

    /// Resolves a name in the lexical chain, recording a reference on every
    /// binding it hits. Unresolved names yield Unknown plus a diagnostic.
    pub(crate) fn resolve_name(&mut self, cx: &Cx, node: NodeId, state: ScopeId) -> TypeId {
        let NodeKind::Name { id } = cx.ast.kind(node) else {
            return UNKNOWN;
        };
        match self.scopes.lookup(state, id) {
            Some(list) => {
                let n = cx.ast.node(node);
                let (start, length) = (n.start, n.length());
                let file = cx.ast.file().to_owned();
                self.scopes.add_ref(&list, &file, start, length);
                self.scopes.bound_type(&mut self.types, &list)
            }
            None => {
                let id = id.clone();
                self.put_problem_node(cx, node, format!("undefined name: {id}"));
                UNKNOWN
            }
        }
    }

    /// Resolves `obj.attr`, recording references; fails to Unknown with an
    /// "attribute not found" problem on tables that should have the name.
    pub(crate) fn attr_load(&mut self, cx: &Cx, attr: NodeId, obj: TypeId) -> TypeId {
        let name = name_of(cx, attr);
        if let Some(list) = self.attr_bindings(obj, &name)
            && !list.is_empty()
        {
            let n = cx.ast.node(attr);
            let (start, length) = (n.start, n.length());
            let file = cx.ast.file().to_owned();
            self.scopes.add_ref(&list, &file, start, length);
            return self.scopes.bound_type(&mut self.types, &list);
        }
        if matches!(
            self.types.kind(obj),
            TypeKind::Instance { .. } | TypeKind::Class(_) | TypeKind::Module { .. }
        ) {
            self.put_problem_node(cx, attr, format!("attribute not found: {name}"));
        }
        UNKNOWN
    }

    fn attr_bindings(&self, obj: TypeId, name: &str) -> Option<Vec<crate::scopes::BindingId>> {
        match self.types.kind(obj) {
            TypeKind::Module { scope, .. } => self.scopes.lookup_attr(*scope, name),
            TypeKind::Class(cid) => self.class_attr(*cid, name, &mut Vec::new()),
            TypeKind::Instance { scope, class, .. } => self.scopes.lookup_attr(*scope, name).or_else(|| {
                match self.types.kind(*class) {
                    TypeKind::Class(cid) => self.class_attr(*cid, name, &mut Vec::new()),
                    _ => None,
                }
            }),
            TypeKind::Union(members) => {
                let mut out = Vec::new();
                for m in members {
                    if let Some(list) = self.attr_bindings(*m, name) {
                        out.extend(list);
                    }
                }
                if out.is_empty() { None } else { Some(out) }
            }
            _ => None,
        }
    }

    /// Own table first, then the bases in declaration order.
    fn class_attr(&self, cid: ClassId, name: &str, visited: &mut Vec<ClassId>) -> Option<Vec<crate::scopes::BindingId>> {
        if visited.contains(&cid) {
            return None;
        }
        visited.push(cid);
        let class = self.types.class(cid);
        if let Some(list) = self.scopes.lookup_attr(class.scope, name) {
            return Some(list);
        }
        for &base in &class.bases {
            if let TypeKind::Class(bid) = self.types.kind(base)
                && let Some(list) = self.class_attr(*bid, name, visited)
            {
                return Some(list);
            }
        }
        None
    }

    // --- calls -------------------------------------------------------------

    fn transform_call(&mut self, cx: &Cx, node: NodeId, state: ScopeId) -> TypeId {
        let NodeKind::Call {
            func,
            args,
            keywords,
            starargs,
            kwargs,
            blockarg,
        } = cx.ast.kind(node)
        else {
            return UNKNOWN;
        };
        let func = *func;
        let (args, keywords) = (args.clone(), keywords.clone());
        let (starargs, kwargs, blockarg) = (*starargs, *kwargs, *blockarg);

        // isinstance(x, C) produces an undecided bool carrying narrowed
        // branch states
        if let NodeKind::Name { id } = cx.ast.kind(func)
            && id == "isinstance"
            && args.len() == 2
        {
            self.resolve_name(cx, func, state);
            self.transform(cx, args[0], state);
            let class_t = self.transform(cx, args[1], state);
            if let NodeKind::Name { id } = cx.ast.kind(args[0])
                && matches!(self.types.kind(class_t), TypeKind::Class(_))
            {
                let id = id.clone();
                let narrowed = self.instance_of(class_t);
                let s1 = self.scopes.copy(state);
                self.bind_name(cx, s1, args[0], &id, narrowed, BindingKind::Variable);
                let s2 = self.scopes.copy(state);
                return self.types.bool_with_branches(s1, s2);
            }
            return BOOL;
        }

        let (callee, self_type) = match cx.ast.kind(func) {
            NodeKind::Attribute { value, attr } => {
                let (value, attr) = (*value, *attr);
                let obj = self.transform(cx, value, state);
                let method = self.attr_load(cx, attr, obj);
                // only instance receivers flow in as self
                let self_t = match self.types.kind(obj) {
                    TypeKind::Instance { .. } => Some(obj),
                    _ => None,
                };
                (method, self_t)
            }
            _ => (self.transform(cx, func, state), None),
        };

        let pos: Vec<TypeId> = args.iter().map(|&a| self.transform(cx, a, state)).collect();
        let mut kw = Vec::with_capacity(keywords.len());
        for &k in &keywords {
            if let NodeKind::Keyword { arg, value } = cx.ast.kind(k) {
                let (arg, value) = (arg.clone(), *value);
                let t = self.transform(cx, value, state);
                kw.push((arg, t));
            }
        }
        let star = starargs.map(|s| self.transform(cx, s, state));
        let kw_splat = kwargs.map(|s| self.transform(cx, s, state));
        let block = blockarg.map(|b| self.transform(cx, b, state));
        let call_args = CallArgs {
            pos,
            kw,
            star,
            kw_splat,
            block,
        };
        self.apply(callee, &call_args, self_type, Some(cx.node_ref(node)), Some((cx, node)))
    }

    /// Applies a callee type to actual argument types.
    pub(crate) fn apply(
        &mut self,
        callee: TypeId,
        args: &CallArgs,
        self_type: Option<TypeId>,
        call: Option<NodeRef>,
        caller: Option<(&Cx, NodeId)>,
    ) -> TypeId {
        match self.types.kind(callee).clone() {
            TypeKind::Function(fid) => self.apply_function(fid, args, self_type, call, caller),
            TypeKind::Class(cid) => self.apply_class(callee, cid, args, call, caller),
            TypeKind::Union(members) => {
                let results: Vec<TypeId> = members
                    .iter()
                    .map(|&m| self.apply(m, args, self_type, call, caller))
                    .collect();
                self.types.union_all(&results)
            }
            // calling an unknown value is not worth a warning; calling an
            // instance would need __call__ modeling
            TypeKind::Unknown | TypeKind::Instance { .. } | TypeKind::Module { .. } => UNKNOWN,
            other => {
                if let Some((cx, node)) = caller {
                    let shown = self.types.to_string(callee);
                    self.put_problem_node(cx, node, format!("calling non-callable: {shown}"));
                }
                let _ = other;
                UNKNOWN
            }
        }
    }

    /// The central call algorithm: cycle guard, fresh child state, parameter
    /// binding, memoization, body transform.
    pub(crate) fn apply_function(
        &mut self,
        fid: FunId,
        args: &CallArgs,
        self_type: Option<TypeId>,
        call: Option<NodeRef>,
        caller: Option<(&Cx, NodeId)>,
    ) -> TypeId {
        self.types.fun_mut(fid).called = true;
        self.uncalled.shift_remove(&fid);
        let fun = self.types.fun(fid).clone();
        let Some(def) = fun.def else {
            // builtins have no definition AST; they declare their result
            return fun.ret.unwrap_or(UNKNOWN);
        };
        if let Some(nr) = call {
            if self.call_stack.contains(&nr) {
                // recursive edge: answer Unknown, let the outer application
                // finish
                return UNKNOWN;
            }
            self.call_stack.push(nr);
        }
        let def_cx = self.module_cx(def.module);
        let child = self
            .scopes
            .new_scope(Some(fun.env), ScopeKind::Function, fun.qname.clone());
        let from_type = self.bind_params(&def_cx, def.node, child, &fun, args, self_type);

        // memoized result for this exact argument-type tuple?
        let cached = {
            let f = self.types.fun(fid);
            f.cache
                .iter()
                .find(|(from, _)| {
                    from.len() == from_type.len()
                        && from.iter().zip(from_type.iter()).all(|(a, b)| self.types.equal(*a, *b))
                })
                .map(|(_, to)| *to)
        };
        if let Some(to) = cached {
            if call.is_some() {
                self.call_stack.pop();
            }
            return to;
        }

        let NodeKind::FunctionDef {
            body, name, is_generator, ..
        } = def_cx.ast.kind(def.node)
        else {
            if call.is_some() {
                self.call_stack.pop();
            }
            return UNKNOWN;
        };
        let (body, name_node, is_generator) = (body.clone(), *name, *is_generator);
        let ret = self.transform_block(&def_cx, &body, child);

        let ret = if is_generator {
            // a generator call types as a sequence of its yields
            let stripped = self.types.without_cont(ret);
            let elem = if self.types.is_cont(stripped) { UNKNOWN } else { stripped };
            self.types.list_of(elem)
        } else {
            if self.types.contains(ret, CONT) {
                let stripped = self.types.without_cont(ret);
                let has_value = !self.types.is_cont(stripped) && !self.types.is_unknown(stripped);
                if has_value {
                    if let Some(n) = name_node {
                        self.put_problem_node(&def_cx, n, "function not always returns a value");
                    }
                    if let Some((cx, cnode)) = caller {
                        self.put_problem_node(cx, cnode, format!("call to {} may not return a value", fun.name));
                    }
                }
            }
            // fallthrough paths return None implicitly
            if self.types.contains(ret, CONT) {
                let stripped = self.types.without_cont(ret);
                if self.types.is_cont(stripped) {
                    NONE
                } else {
                    self.types.union(stripped, NONE)
                }
            } else {
                ret
            }
        };

        self.types.fun_mut(fid).cache.push((from_type, ret));
        if call.is_some() {
            self.call_stack.pop();
        }
        ret
    }

    /// Calling a class synthesizes an instance and runs `__init__` with the
    /// instance bound as the receiver.
    fn apply_class(
        &mut self,
        class_ty: TypeId,
        cid: ClassId,
        args: &CallArgs,
        call: Option<NodeRef>,
        caller: Option<(&Cx, NodeId)>,
    ) -> TypeId {
        let class = self.types.class(cid).clone();
        let scope = self
            .scopes
            .new_scope(Some(class.scope), ScopeKind::Instance, class.qname.clone());
        let inst = self.types.alloc(TypeKind::Instance {
            class: class_ty,
            scope,
            call,
            args: args.pos.clone(),
        });
        if let Some(init) = self.class_attr(cid, "__init__", &mut Vec::new()) {
            let init_t = self.scopes.bound_type(&mut self.types, &init);
            self.apply(init_t, args, Some(inst), call, caller);
        }
        inst
    }

    /// A bare instance of a class (no constructor run, no creating call
    /// node); used by isinstance narrowing and exception handlers.
    pub(crate) fn instance_of(&mut self, class_ty: TypeId) -> TypeId {
        match self.types.kind(class_ty) {
            TypeKind::Class(cid) => {
                let class = self.types.class(*cid).clone();
                let scope = self
                    .scopes
                    .new_scope(Some(class.scope), ScopeKind::Instance, class.qname.clone());
                self.types.alloc(TypeKind::Instance {
                    class: class_ty,
                    scope,
                    call: None,
                    args: Vec::new(),
                })
            }
            _ => UNKNOWN,
        }
    }

    fn exception_instance(&mut self, exc: TypeId) -> TypeId {
        match self.types.kind(exc).clone() {
            TypeKind::Class(_) => self.instance_of(exc),
            TypeKind::Tuple(elts) => {
                let instances: Vec<TypeId> = elts.iter().map(|&e| self.exception_instance(e)).collect();
                self.types.union_all(&instances)
            }
            _ => UNKNOWN,
        }
    }

    /// Binds the formals of one application, producing the `fromType` tuple
    /// for memoization.
    ///
    /// Resolution order per formal: positional, matching default, keyword,
    /// next stararg slot, Unknown-with-problem. Leftover keywords feed the
    /// `**kw` formal, leftover positionals feed `*rest`, and trailing
    /// formals after the rest take the tail of the extra positionals.
    fn bind_params(
        &mut self,
        def_cx: &Cx,
        def_node: NodeId,
        scope: ScopeId,
        fun: &FunctionData,
        args: &CallArgs,
        self_type: Option<TypeId>,
    ) -> Vec<TypeId> {
        let NodeKind::FunctionDef {
            args: formals,
            vararg,
            kwarg,
            after_rest,
            blockarg,
            ..
        } = def_cx.ast.kind(def_node)
        else {
            return Vec::new();
        };
        let formals = formals.clone();
        let (vararg, kwarg, blockarg) = (*vararg, *kwarg, *blockarg);
        let after_rest = after_rest.clone();

        let mut pos = args.pos.clone();
        if let Some(st) = self_type {
            // the receiver occupies the first formal
            pos.insert(0, st);
        }
        let mut kw: IndexMap<String, TypeId> = args.kw.iter().cloned().collect();
        let star_elts: Option<Vec<TypeId>> = match args.star.map(|s| self.types.kind(s).clone()) {
            Some(TypeKind::Tuple(elts)) => Some(elts.to_vec()),
            _ => None,
        };
        let star_elem: Option<TypeId> = match args.star {
            Some(s) => match self.types.kind(s) {
                TypeKind::List(_) | TypeKind::Set(_) | TypeKind::Str(_) | TypeKind::Dict { .. } => {
                    Some(self.types.iterated_elem(s))
                }
                _ => None,
            },
            None => None,
        };

        let p = formals.len();
        let d = fun.defaults.len();
        let a = pos.len();
        let mut star_j = 0usize;
        let mut from_type = Vec::with_capacity(p);
        for (i, &formal) in formals.iter().enumerate() {
            let fname = name_of(def_cx, formal);
            let mut ty = None;
            if i < a {
                ty = Some(pos[i]);
            } else if d > 0 && i + d >= p {
                ty = Some(fun.defaults[i + d - p]);
            } else if let Some(t) = kw.shift_remove(&fname) {
                ty = Some(t);
            } else if let Some(elts) = &star_elts {
                if star_j < elts.len() {
                    ty = Some(elts[star_j]);
                    star_j += 1;
                }
            } else if let Some(elem) = star_elem {
                ty = Some(elem);
            }
            let ty = ty.unwrap_or_else(|| {
                self.put_problem_node(def_cx, formal, format!("unable to bind argument: {fname}"));
                UNKNOWN
            });
            self.bind_name(def_cx, scope, formal, &fname, ty, BindingKind::Parameter);
            from_type.push(ty);
        }

        if let Some(kw_formal) = kwarg {
            let fname = name_of(def_cx, kw_formal);
            let ty = if kw.is_empty() {
                args.kw_splat.unwrap_or(UNKNOWN)
            } else {
                let values: Vec<TypeId> = kw.values().copied().collect();
                let value = self.types.union_all(&values);
                self.types.dict_of(STR, value)
            };
            self.bind_name(def_cx, scope, kw_formal, &fname, ty, BindingKind::Parameter);
        }

        if let Some(rest) = vararg {
            let fname = name_of(def_cx, rest);
            let ty = if a > p {
                let extra = &pos[p..];
                let n_after = after_rest.len();
                if n_after > 0 && extra.len() > n_after {
                    let middle = &extra[..extra.len() - n_after];
                    let tail = &extra[extra.len() - n_after..];
                    for (&formal, &t) in after_rest.iter().zip(tail.iter()) {
                        let name = name_of(def_cx, formal);
                        self.bind_name(def_cx, scope, formal, &name, t, BindingKind::Parameter);
                    }
                    self.types.tuple_of(middle.iter().copied())
                } else {
                    self.types.tuple_of(extra.iter().copied())
                }
            } else {
                UNKNOWN
            };
            self.bind_name(def_cx, scope, rest, &fname, ty, BindingKind::Parameter);
        }

        if let Some(block_formal) = blockarg
            && let Some(block_t) = args.block
        {
            let fname = name_of(def_cx, block_formal);
            self.bind_name(def_cx, scope, block_formal, &fname, block_t, BindingKind::Parameter);
        }

        from_type
    }

    // --- imports -----------------------------------------------------------

    fn transform_import(&mut self, cx: &Cx, names: &[NodeId], state: ScopeId) {
        for &alias_node in names {
            let NodeKind::Alias { name, asname } = cx.ast.kind(alias_node) else {
                continue;
            };
            let (name, asname) = (name.clone(), asname.clone());
            let full = self.resolve_module(cx, &name);
            let first_segment = name.split('.').next().unwrap_or(&name).to_owned();
            // `import a.b` binds `a`; `import a.b as c` binds `c` to a.b
            let (bind_as, bound) = match asname {
                Some(alias) => (alias, full),
                None if name.contains('.') => {
                    let top = self.resolve_module(cx, &first_segment);
                    (first_segment, top)
                }
                None => (first_segment, full),
            };
            if bound.is_none() && self.config.debug {
                self.put_problem_node(cx, alias_node, format!("import not found: {name}"));
            }
            let ty = bound.unwrap_or(UNKNOWN);
            let n = cx.ast.node(alias_node);
            let (start, length) = (n.start, n.length());
            self.scopes.insert(
                &mut self.types,
                state,
                &bind_as,
                Some(cx.node_ref(alias_node)),
                cx.ast.file(),
                start,
                length,
                ty,
                BindingKind::Module,
            );
        }
    }

    fn transform_import_from(&mut self, cx: &Cx, module: Option<&str>, names: &[NodeId], level: u32, state: ScopeId) {
        let module_ty = match module {
            Some(dotted) => self.resolve_module_with_level(cx, dotted, level),
            None => None,
        };
        for &alias_node in names {
            let NodeKind::Alias { name, asname } = cx.ast.kind(alias_node) else {
                continue;
            };
            let (name, asname) = (name.clone(), asname.clone());
            if name == "*" {
                if let Some(mt) = module_ty
                    && let TypeKind::Module { scope, .. } = self.types.kind(mt)
                {
                    let src = *scope;
                    self.scopes.import_all(state, src);
                }
                continue;
            }
            if module.is_none() {
                // `from . import sibling`: each name is itself a module
                let ty = self.resolve_module_with_level(cx, &name, level.max(1)).unwrap_or(UNKNOWN);
                let bind_as = asname.unwrap_or_else(|| name.clone());
                let n = cx.ast.node(alias_node);
                let (start, length) = (n.start, n.length());
                self.scopes.insert(
                    &mut self.types,
                    state,
                    &bind_as,
                    Some(cx.node_ref(alias_node)),
                    cx.ast.file(),
                    start,
                    length,
                    ty,
                    BindingKind::Module,
                );
                continue;
            }
            let attr_ty = module_ty.and_then(|mt| {
                let list = self.attr_bindings(mt, &name)?;
                let n = cx.ast.node(alias_node);
                let (start, length) = (n.start, n.length());
                let file = cx.ast.file().to_owned();
                self.scopes.add_ref(&list, &file, start, length);
                Some(self.scopes.bound_type(&mut self.types, &list))
            });
            if attr_ty.is_none() && self.config.debug {
                self.put_problem_node(cx, alias_node, format!("import not found: {name}"));
            }
            let ty = attr_ty.unwrap_or(UNKNOWN);
            let bind_as = asname.unwrap_or_else(|| name.clone());
            let n = cx.ast.node(alias_node);
            let (start, length) = (n.start, n.length());
            self.scopes.insert(
                &mut self.types,
                state,
                &bind_as,
                Some(cx.node_ref(alias_node)),
                cx.ast.file(),
                start,
                length,
                ty,
                BindingKind::Variable,
            );
        }
    }

    /// Resolves a dotted module name: builtin module table first, then the
    /// filesystem relative to the analysis root and the importing file.
    fn resolve_module(&mut self, cx: &Cx, dotted: &str) -> Option<TypeId> {
        self.resolve_module_with_level(cx, dotted, 0)
    }

    fn resolve_module_with_level(&mut self, cx: &Cx, dotted: &str, level: u32) -> Option<TypeId> {
        if level == 0
            && !dotted.contains('.')
            && let Some(list) = self.scopes.lookup_attr(self.builtins, dotted)
        {
            let t = self.scopes.bound_type(&mut self.types, &list);
            if matches!(self.types.kind(t), TypeKind::Module { .. }) {
                return Some(t);
            }
        }
        let file = cx.ast.file().to_owned();
        let path = self.resolve_import_path(dotted, level, &file)?;
        self.load_file(&path.to_string_lossy())
    }

    // --- operators ---------------------------------------------------------

    /// Binary operator typing. Integer operands propagate interval bounds;
    /// an infeasible result interval degrades to Unknown.
    pub(crate) fn binop_type(&mut self, op: BinOpKind, lt: TypeId, rt: TypeId) -> TypeId {
        if self.types.is_unknown(lt) || self.types.is_unknown(rt) {
            return UNKNOWN;
        }
        // distribute over union operands
        if let TypeKind::Union(members) = self.types.kind(lt).clone() {
            let parts: Vec<TypeId> = members.iter().map(|&m| self.binop_type(op, m, rt)).collect();
            return self.types.union_all(&parts);
        }
        if let TypeKind::Union(members) = self.types.kind(rt).clone() {
            let parts: Vec<TypeId> = members.iter().map(|&m| self.binop_type(op, lt, m)).collect();
            return self.types.union_all(&parts);
        }
        let li = self.types.as_int(lt).or_else(|| self.types.bool_as_int(lt));
        let ri = self.types.as_int(rt).or_else(|| self.types.bool_as_int(rt));
        if let (Some(a), Some(b)) = (li, ri) {
            let range = match op {
                BinOpKind::Add => Some(a.add(&b)),
                BinOpKind::Sub => Some(a.sub(&b)),
                BinOpKind::Mult => Some(a.mul(&b)),
                BinOpKind::FloorDiv => Some(a.div(&b)),
                // true division always yields a float
                BinOpKind::Div => return FLOAT,
                BinOpKind::Mod
                | BinOpKind::Pow
                | BinOpKind::LShift
                | BinOpKind::RShift
                | BinOpKind::BitOr
                | BinOpKind::BitXor
                | BinOpKind::BitAnd => Some(IntRange::UNBOUNDED),
                BinOpKind::MatMult => None,
            };
            return match range {
                Some(r) if r.is_feasible() => self.types.int_range(r),
                // infeasible intervals are treated as unknown numerically
                Some(_) => UNKNOWN,
                None => UNKNOWN,
            };
        }
        let l_num = li.is_some() || lt == FLOAT;
        let r_num = ri.is_some() || rt == FLOAT;
        if l_num && r_num {
            return FLOAT;
        }
        match (self.types.kind(lt).clone(), self.types.kind(rt).clone()) {
            (TypeKind::Str(a), TypeKind::Str(b)) if op == BinOpKind::Add => match (a, b) {
                (Some(x), Some(y)) => self.types.str_literal(&format!("{x}{y}")),
                _ => STR,
            },
            (TypeKind::Str(_), _) if op == BinOpKind::Mod => STR,
            (TypeKind::Str(_), TypeKind::Int(_)) | (TypeKind::Int(_), TypeKind::Str(_)) if op == BinOpKind::Mult => STR,
            (TypeKind::List(a), TypeKind::List(b)) if op == BinOpKind::Add => {
                let elem = self.types.union(a, b);
                self.types.list_of(elem)
            }
            (TypeKind::List(_), TypeKind::Int(_)) if op == BinOpKind::Mult => lt,
            (TypeKind::Int(_), TypeKind::List(_)) if op == BinOpKind::Mult => rt,
            (TypeKind::Tuple(a), TypeKind::Tuple(b)) if op == BinOpKind::Add => {
                self.types.tuple_of(a.iter().chain(b.iter()).copied())
            }
            (TypeKind::Set(a), TypeKind::Set(b))
                if matches!(
                    op,
                    BinOpKind::BitOr | BinOpKind::BitAnd | BinOpKind::Sub | BinOpKind::BitXor
                ) =>
            {
                let elem = self.types.union(a, b);
                self.types.set_of(elem)
            }
            (TypeKind::Dict { key: ka, value: va }, TypeKind::Dict { key: kb, value: vb })
                if op == BinOpKind::BitOr =>
            {
                let k = self.types.union(ka, kb);
                let v = self.types.union(va, vb);
                self.types.dict_of(k, v)
            }
            _ => UNKNOWN,
        }
    }

    fn unary_type(&mut self, op: UnaryOpKind, t: TypeId) -> TypeId {
        match op {
            UnaryOpKind::Not => match self.types.kind(t) {
                TypeKind::Bool {
                    branches: Some((s1, s2)),
                    ..
                } => {
                    let (s1, s2) = (*s1, *s2);
                    self.types.bool_with_branches(s2, s1)
                }
                TypeKind::Bool { value: Some(v), .. } => {
                    if *v {
                        FALSE
                    } else {
                        TRUE
                    }
                }
                _ => BOOL,
            },
            UnaryOpKind::USub => {
                if let Some(r) = self.types.as_int(t).or_else(|| self.types.bool_as_int(t)) {
                    self.types.int_range(r.negate())
                } else if t == FLOAT {
                    FLOAT
                } else {
                    UNKNOWN
                }
            }
            UnaryOpKind::UAdd => {
                if self.types.as_int(t).is_some() || t == FLOAT {
                    t
                } else if self.types.bool_as_int(t).is_some() {
                    let r = self.types.bool_as_int(t).expect("checked above");
                    self.types.int_range(r)
                } else {
                    UNKNOWN
                }
            }
            UnaryOpKind::Invert => {
                if let Some(r) = self.types.as_int(t).or_else(|| self.types.bool_as_int(t)) {
                    // ~x == -x - 1
                    let negated = r.negate().sub(&IntRange::value(1));
                    self.types.int_range(negated)
                } else {
                    UNKNOWN
                }
            }
        }
    }

    fn subscript_type(&mut self, obj: TypeId, idx: Option<TypeId>, slice: bool) -> TypeId {
        match self.types.kind(obj).clone() {
            TypeKind::List(e) => {
                if slice {
                    obj
                } else {
                    e
                }
            }
            TypeKind::Tuple(elts) => {
                if slice {
                    return obj;
                }
                if let Some(i) = idx.and_then(|t| self.types.as_int(t)).filter(IntRange::is_actual_value) {
                    let index = usize::try_from(i.lower).ok();
                    if let Some(ix) = index
                        && ix < elts.len()
                    {
                        return elts[ix];
                    }
                }
                self.types.union_all(&elts)
            }
            TypeKind::Dict { value, .. } => value,
            TypeKind::Str(_) => STR,
            TypeKind::Bytes => {
                if slice {
                    BYTES
                } else {
                    INT
                }
            }
            TypeKind::Union(members) => {
                let parts: Vec<TypeId> = members.iter().map(|&m| self.subscript_type(m, idx, slice)).collect();
                self.types.union_all(&parts)
            }
            _ => UNKNOWN,
        }
    }
}
