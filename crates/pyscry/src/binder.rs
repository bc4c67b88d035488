//! The binder: pattern-binds destructurable assignment targets to a type.
//!
//! Dispatches on the target variant: plain names insert directly, tuple and
//! list targets distribute the right-hand side (with starred targets
//! absorbing the middle slice as a list), attribute targets insert into the
//! object's own table, and subscript targets only transform their pieces for
//! the side effects.

use crate::{
    analyzer::{Analyzer, Cx},
    nodes::{NodeId, NodeKind},
    scopes::{BindingKind, ScopeId},
    types::{TypeId, TypeKind, UNKNOWN},
};

impl Analyzer {
    /// Binds `target` to `ty` in `state`, creating bindings of `kind`.
    pub(crate) fn bind(&mut self, cx: &Cx, state: ScopeId, target: NodeId, ty: TypeId, kind: BindingKind) {
        match cx.ast.kind(target) {
            NodeKind::Name { id } => {
                let id = id.clone();
                self.bind_name(cx, state, target, &id, ty, kind);
            }
            NodeKind::Tuple { elts } | NodeKind::List { elts } => {
                let elts = elts.clone();
                self.bind_sequence(cx, state, target, &elts, ty, kind);
            }
            NodeKind::Attribute { value, attr } => {
                let (value, attr) = (*value, *attr);
                let obj = self.transform(cx, value, state);
                self.bind_attr(cx, attr, obj, ty);
            }
            NodeKind::Subscript { value, index } => {
                // no binding is created, but the indexed pieces are still
                // transformed so their references are recorded
                let (value, index) = (*value, *index);
                self.transform(cx, value, state);
                if let Some(index) = index {
                    self.transform(cx, index, state);
                }
            }
            NodeKind::Starred { value } => {
                let value = *value;
                let absorbed = self.types.list_of(ty);
                self.bind(cx, state, value, absorbed, kind);
            }
            _ => {}
        }
    }

    /// Inserts a binding for a plain name target.
    pub(crate) fn bind_name(
        &mut self,
        cx: &Cx,
        state: ScopeId,
        target: NodeId,
        name: &str,
        ty: TypeId,
        kind: BindingKind,
    ) -> crate::scopes::BindingId {
        let node = cx.ast.node(target);
        let (start, length) = (node.start, node.length());
        self.scopes.insert(
            &mut self.types,
            state,
            name,
            Some(cx.node_ref(target)),
            cx.ast.file(),
            start,
            length,
            ty,
            kind,
        )
    }

    /// Distributes `rhs` over the elements of a tuple/list target.
    fn bind_sequence(
        &mut self,
        cx: &Cx,
        state: ScopeId,
        target: NodeId,
        elts: &[NodeId],
        rhs: TypeId,
        kind: BindingKind,
    ) {
        let star_pos = elts
            .iter()
            .position(|&e| matches!(cx.ast.kind(e), NodeKind::Starred { .. }));
        match self.types.kind(rhs).clone() {
            TypeKind::Tuple(rts) => {
                self.bind_tuple_elements(cx, state, target, elts, &rts, star_pos, kind);
            }
            TypeKind::List(_) | TypeKind::Set(_) | TypeKind::Dict { .. } | TypeKind::Str(_) | TypeKind::Bytes => {
                let elem = self.types.iterated_elem(rhs);
                for &e in elts {
                    self.bind(cx, state, e, elem, kind);
                }
            }
            TypeKind::Unknown => {
                for &e in elts {
                    self.bind(cx, state, e, UNKNOWN, kind);
                }
            }
            _ => {
                let shown = self.types.to_string(rhs);
                self.put_problem_node(cx, target, format!("cannot unpack {shown} into {} targets", elts.len()));
                for &e in elts {
                    self.bind(cx, state, e, UNKNOWN, kind);
                }
            }
        }
    }

    fn bind_tuple_elements(
        &mut self,
        cx: &Cx,
        state: ScopeId,
        target: NodeId,
        elts: &[NodeId],
        rts: &[TypeId],
        star_pos: Option<usize>,
        kind: BindingKind,
    ) {
        if let Some(sp) = star_pos {
            let fixed = elts.len() - 1;
            if rts.len() < fixed {
                self.put_problem_node(
                    cx,
                    target,
                    format!("cannot unpack {} values into {} targets", rts.len(), elts.len()),
                );
                for &e in elts {
                    self.bind(cx, state, e, UNKNOWN, kind);
                }
                return;
            }
            let after = fixed - sp;
            for (i, &e) in elts[..sp].iter().enumerate() {
                self.bind(cx, state, e, rts[i], kind);
            }
            // the starred target absorbs the middle slice as a list
            let middle = &rts[sp..rts.len() - after];
            let elem = self.types.union_all(middle);
            let elem = if middle.is_empty() { UNKNOWN } else { elem };
            let absorbed = self.types.list_of(elem);
            if let NodeKind::Starred { value } = cx.ast.kind(elts[sp]) {
                let value = *value;
                self.bind(cx, state, value, absorbed, kind);
            }
            for (i, &e) in elts[sp + 1..].iter().enumerate() {
                self.bind(cx, state, e, rts[rts.len() - after + i], kind);
            }
        } else if rts.len() == elts.len() {
            for (&e, &rt) in elts.iter().zip(rts.iter()) {
                self.bind(cx, state, e, rt, kind);
            }
        } else {
            self.put_problem_node(
                cx,
                target,
                format!("cannot unpack {} values into {} targets", rts.len(), elts.len()),
            );
            for &e in elts {
                self.bind(cx, state, e, UNKNOWN, kind);
            }
        }
    }

    /// Binds an attribute target (`obj.attr = value`) in the object's own
    /// table.
    pub(crate) fn bind_attr(&mut self, cx: &Cx, attr: NodeId, obj: TypeId, ty: TypeId) {
        let NodeKind::Name { id } = cx.ast.kind(attr) else {
            return;
        };
        let name = id.clone();
        match self.types.kind(obj).clone() {
            TypeKind::Instance { scope, .. } | TypeKind::Module { scope, .. } => {
                self.insert_attr(cx, attr, scope, &name, ty);
            }
            TypeKind::Class(cid) => {
                let scope = self.types.class(cid).scope;
                self.insert_attr(cx, attr, scope, &name, ty);
            }
            TypeKind::Union(members) => {
                for m in members {
                    self.bind_attr(cx, attr, m, ty);
                }
            }
            _ => {}
        }
    }

    fn insert_attr(&mut self, cx: &Cx, attr: NodeId, scope: ScopeId, name: &str, ty: TypeId) {
        let node = cx.ast.node(attr);
        let (start, length) = (node.start, node.length());
        self.scopes.insert(
            &mut self.types,
            scope,
            name,
            Some(cx.node_ref(attr)),
            cx.ast.file(),
            start,
            length,
            ty,
            BindingKind::Attribute,
        );
    }
}
