//! Lexical states (scopes), bindings and references.
//!
//! All scopes live in one pool addressed by `ScopeId`; a scope is a binding
//! table plus a parent link, a dotted qualified-name prefix and the scope
//! kind. Binding tables map names to *lists* of bindings because branch
//! merging can leave a name bound at several definition sites at once.

use ahash::AHashSet;
use indexmap::{IndexMap, IndexSet};

use crate::{
    nodes::NodeRef,
    types::{TypeId, TypeKind, TypePool},
};

/// Unique identifier for a scope stored in the [`ScopePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn new(index: usize) -> Self {
        Self(index.try_into().expect("scope pool overflow"))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Unique identifier for a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u32);

impl BindingId {
    pub fn new(index: usize) -> Self {
        Self(index.try_into().expect("binding pool overflow"))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What kind of program entity a scope belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
    Instance,
    Scope,
    Global,
}

/// What kind of definition site produced a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum BindingKind {
    Module,
    Class,
    Method,
    Function,
    Constructor,
    Parameter,
    Variable,
    Scope,
    Attribute,
}

/// One observed use of a binding. Hashed and compared by its source extent
/// alone, so the same occurrence reached twice collapses to one reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ref {
    pub file: String,
    pub start: u32,
    pub length: u32,
}

/// A name-to-type association at a specific definition site.
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    /// Defining AST node; None for builtins.
    pub node: Option<NodeRef>,
    pub ty: TypeId,
    pub kind: BindingKind,
    /// Dotted path from the enclosing module through nested scopes.
    pub qname: String,
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub refs: IndexSet<Ref>,
    pub builtin: bool,
    pub url: Option<String>,
    pub doc: Option<String>,
}

/// A lexical environment.
#[derive(Debug, Clone)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    table: IndexMap<String, Vec<BindingId>>,
    pub path: String,
    global_names: AHashSet<String>,
    /// For class scopes: the enclosing non-class scope. Function bodies
    /// defined inside a class capture this instead of the class scope, so
    /// method-local name lookup skips class attributes.
    pub forwarding: Option<ScopeId>,
}

/// Pool of scopes and bindings.
#[derive(Debug, Default)]
pub struct ScopePool {
    scopes: Vec<Scope>,
    bindings: Vec<Binding>,
    /// One binding per defining node, process-wide. Re-analysis of the same
    /// definition site (memoized calls, loops) refines the existing binding
    /// instead of minting duplicates.
    by_node: ahash::AHashMap<NodeRef, BindingId>,
}

impl ScopePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh scope. Class scopes compute their forwarding target
    /// from the parent chain at creation time.
    pub fn new_scope(&mut self, parent: Option<ScopeId>, kind: ScopeKind, path: String) -> ScopeId {
        let forwarding = if kind == ScopeKind::Class {
            parent.map(|p| self.forwarding(p))
        } else {
            None
        };
        let id = ScopeId::new(self.scopes.len());
        self.scopes.push(Scope {
            parent,
            kind,
            table: IndexMap::new(),
            path,
            global_names: AHashSet::new(),
            forwarding,
        });
        id
    }

    #[inline]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    #[inline]
    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    #[inline]
    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.index()]
    }

    #[inline]
    pub fn binding_mut(&mut self, id: BindingId) -> &mut Binding {
        &mut self.bindings[id.index()]
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn iter_bindings(&self) -> impl Iterator<Item = (BindingId, &Binding)> {
        self.bindings.iter().enumerate().map(|(i, b)| (BindingId::new(i), b))
    }

    /// The scope a nested function should capture: class scopes forward to
    /// their enclosing non-class scope, everything else captures itself.
    pub fn forwarding(&self, id: ScopeId) -> ScopeId {
        match self.scope(id).forwarding {
            Some(f) => f,
            None => id,
        }
    }

    /// Shallow snapshot: same parent, cloned table. Used for branch-flow
    /// analysis where the two arms must not see each other's bindings.
    pub fn copy(&mut self, id: ScopeId) -> ScopeId {
        let cloned = self.scope(id).clone();
        let new_id = ScopeId::new(self.scopes.len());
        self.scopes.push(cloned);
        new_id
    }

    /// Replaces the receiver's table with `other`'s (branch-join plumbing).
    pub fn overwrite(&mut self, dst: ScopeId, src: ScopeId) {
        let table = self.scope(src).table.clone();
        self.scope_mut(dst).table = table;
    }

    /// Per-key union of two scopes' binding lists, written into `dst`.
    pub fn merge_into(&mut self, dst: ScopeId, a: ScopeId, b: ScopeId) {
        let mut merged = self.scope(a).table.clone();
        for (name, ids) in self.scope(b).table.clone() {
            let entry = merged.entry(name).or_default();
            for id in ids {
                if !entry.contains(&id) {
                    entry.push(id);
                }
            }
        }
        self.scope_mut(dst).table = merged;
    }

    /// Marks names as module-global for this scope (the `global` statement).
    pub fn add_globals(&mut self, id: ScopeId, names: impl IntoIterator<Item = String>) {
        self.scope_mut(id).global_names.extend(names);
    }

    pub fn is_global_name(&self, id: ScopeId, name: &str) -> bool {
        self.scope(id).global_names.contains(name)
    }

    /// The nearest enclosing MODULE scope, if any.
    pub fn enclosing_module(&self, mut id: ScopeId) -> Option<ScopeId> {
        loop {
            let scope = self.scope(id);
            if scope.kind == ScopeKind::Module {
                return Some(id);
            }
            id = scope.parent?;
        }
    }

    /// Walks the parent chain; returns the binding list of the innermost
    /// scope that declares `name`.
    pub fn lookup(&self, mut id: ScopeId, name: &str) -> Option<Vec<BindingId>> {
        loop {
            if let Some(list) = self.scopes[id.index()].table.get(name) {
                return Some(list.clone());
            }
            id = self.scope(id).parent?;
        }
    }

    /// Single-level lookup, no parent walk. Attribute resolution against
    /// class/module/instance tables goes through this.
    pub fn lookup_attr(&self, id: ScopeId, name: &str) -> Option<Vec<BindingId>> {
        self.scope(id).table.get(name).cloned()
    }

    /// Extends a dotted qualified-name prefix with one segment.
    pub fn extend_path(&self, id: ScopeId, segment: &str) -> String {
        let path = &self.scope(id).path;
        if path.is_empty() {
            segment.to_owned()
        } else {
            format!("{path}.{segment}")
        }
    }

    /// Names declared directly in this scope, in insertion order.
    pub fn names(&self, id: ScopeId) -> impl Iterator<Item = &String> {
        self.scope(id).table.keys()
    }

    pub fn entries(&self, id: ScopeId) -> impl Iterator<Item = (&String, &Vec<BindingId>)> {
        self.scope(id).table.iter()
    }

    /// Create-or-refine a binding for `name` in `scope`.
    ///
    /// Same defining node: the types are unioned into the existing binding
    /// (re-analysis of a call site must stay stable). New defining node:
    /// the list is replaced (flow-sensitive last-write-wins), except
    /// ATTRIBUTE-kind bindings which accumulate. Names declared `global`
    /// redirect to the enclosing module scope.
    #[expect(clippy::too_many_arguments, reason = "binding sites carry their full identity")]
    pub fn insert(
        &mut self,
        types: &mut TypePool,
        scope: ScopeId,
        name: &str,
        node: Option<NodeRef>,
        file: &str,
        start: u32,
        length: u32,
        ty: TypeId,
        kind: BindingKind,
    ) -> BindingId {
        let scope = if self.is_global_name(scope, name) {
            self.enclosing_module(scope).unwrap_or(scope)
        } else {
            scope
        };
        let id = if let Some(&existing) = node.as_ref().and_then(|nr| self.by_node.get(nr)) {
            let old = self.binding(existing).ty;
            let refined = types.union(old, ty);
            self.binding_mut(existing).ty = refined;
            existing
        } else {
            let qname = match types.kind(ty) {
                TypeKind::Module { qname, .. } => qname.clone(),
                _ => self.extend_path(scope, name),
            };
            let id = BindingId::new(self.bindings.len());
            self.bindings.push(Binding {
                name: name.to_owned(),
                node,
                ty,
                kind,
                qname,
                file: file.to_owned(),
                start,
                length,
                refs: IndexSet::new(),
                builtin: false,
                url: None,
                doc: None,
            });
            if let Some(nr) = node {
                self.by_node.insert(nr, id);
            }
            id
        };

        let table = &mut self.scope_mut(scope).table;
        let entry = table.entry(name.to_owned()).or_default();
        if kind == BindingKind::Attribute {
            if !entry.contains(&id) {
                entry.push(id);
            }
        } else {
            *entry = vec![id];
        }
        id
    }

    /// Copies every public (non-underscore) entry of `src` into `dst`;
    /// the `from m import *` path. The bindings themselves are shared.
    pub fn import_all(&mut self, dst: ScopeId, src: ScopeId) {
        let entries: Vec<(String, Vec<BindingId>)> = self
            .scope(src)
            .table
            .iter()
            .filter(|(name, _)| !name.starts_with('_'))
            .map(|(name, ids)| (name.clone(), ids.clone()))
            .collect();
        for (name, ids) in entries {
            self.scope_mut(dst).table.insert(name, ids);
        }
    }

    /// Records a reference on every binding in the list.
    pub fn add_ref(&mut self, bindings: &[BindingId], file: &str, start: u32, length: u32) {
        for &b in bindings {
            self.binding_mut(b).refs.insert(Ref {
                file: file.to_owned(),
                start,
                length,
            });
        }
    }

    /// Joint type of a binding list.
    pub fn bound_type(&self, types: &mut TypePool, bindings: &[BindingId]) -> TypeId {
        let tys: Vec<TypeId> = bindings.iter().map(|&b| self.binding(b).ty).collect();
        match tys.as_slice() {
            [] => crate::types::UNKNOWN,
            [one] => *one,
            many => types.union_all(many),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{STR, UNKNOWN};

    fn pools() -> (ScopePool, TypePool) {
        (ScopePool::new(), TypePool::new())
    }

    #[test]
    fn lookup_walks_parent_chain() {
        let (mut scopes, mut types) = pools();
        let root = scopes.new_scope(None, ScopeKind::Global, String::new());
        let module = scopes.new_scope(Some(root), ScopeKind::Module, "m".to_owned());
        let one = types.int_value(1);
        scopes.insert(&mut types, root, "builtin_x", None, "", 0, 0, STR, BindingKind::Variable);
        scopes.insert(&mut types, module, "x", None, "m.py", 0, 1, one, BindingKind::Variable);

        assert!(scopes.lookup(module, "x").is_some());
        assert!(scopes.lookup(module, "builtin_x").is_some(), "parent chain walk");
        assert!(scopes.lookup(root, "x").is_none());
        // lookup_attr never walks parents
        assert!(scopes.lookup_attr(module, "builtin_x").is_none());
    }

    #[test]
    fn extend_path_handles_empty_prefix() {
        let (mut scopes, _) = pools();
        let root = scopes.new_scope(None, ScopeKind::Global, String::new());
        let module = scopes.new_scope(Some(root), ScopeKind::Module, "pkg.m".to_owned());
        assert_eq!(scopes.extend_path(root, "f"), "f");
        assert_eq!(scopes.extend_path(module, "f"), "pkg.m.f");
    }

    #[test]
    fn merge_unions_binding_lists() {
        let (mut scopes, mut types) = pools();
        let base = scopes.new_scope(None, ScopeKind::Module, "m".to_owned());
        let s1 = scopes.copy(base);
        let s2 = scopes.copy(base);
        let one = types.int_value(1);
        let b1 = scopes.insert(&mut types, s1, "x", None, "m.py", 10, 1, STR, BindingKind::Variable);
        let b2 = scopes.insert(&mut types, s2, "x", None, "m.py", 30, 1, one, BindingKind::Variable);

        scopes.merge_into(base, s1, s2);
        let list = scopes.lookup(base, "x").expect("merged binding");
        assert_eq!(list, vec![b1, b2]);
        let joint = scopes.bound_type(&mut types, &list);
        assert!(types.contains(joint, STR));
        assert!(types.contains(joint, one));
    }

    #[test]
    fn copy_is_isolated_from_original() {
        let (mut scopes, mut types) = pools();
        let base = scopes.new_scope(None, ScopeKind::Module, "m".to_owned());
        scopes.insert(&mut types, base, "x", None, "m.py", 0, 1, STR, BindingKind::Variable);
        let snap = scopes.copy(base);
        scopes.insert(&mut types, snap, "y", None, "m.py", 5, 1, UNKNOWN, BindingKind::Variable);
        assert!(scopes.lookup(base, "y").is_none());
        assert!(scopes.lookup(snap, "x").is_some());
    }

    #[test]
    fn class_scope_forwards_to_module() {
        let (mut scopes, _) = pools();
        let module = scopes.new_scope(None, ScopeKind::Module, "m".to_owned());
        let class = scopes.new_scope(Some(module), ScopeKind::Class, "m.C".to_owned());
        let inner = scopes.new_scope(Some(class), ScopeKind::Class, "m.C.D".to_owned());
        assert_eq!(scopes.forwarding(class), module);
        assert_eq!(scopes.forwarding(inner), module);
        assert_eq!(scopes.forwarding(module), module);
    }

    #[test]
    fn attribute_bindings_accumulate() {
        let (mut scopes, mut types) = pools();
        let obj = scopes.new_scope(None, ScopeKind::Instance, "m.C".to_owned());
        let one = types.int_value(1);
        let a = NodeRef::new(crate::nodes::ModuleId::new(0), crate::nodes::NodeId::new(1));
        let b = NodeRef::new(crate::nodes::ModuleId::new(0), crate::nodes::NodeId::new(2));
        scopes.insert(&mut types, obj, "x", Some(a), "m.py", 0, 1, one, BindingKind::Attribute);
        scopes.insert(&mut types, obj, "x", Some(b), "m.py", 9, 1, STR, BindingKind::Attribute);
        assert_eq!(scopes.lookup_attr(obj, "x").map(|l| l.len()), Some(2));
    }
}
