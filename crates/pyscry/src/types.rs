//! The type lattice.
//!
//! Types are allocated in a pool and addressed by `TypeId`; the singletons
//! (Unknown, Cont, None, True, False, Str, Float, Bytes) occupy fixed slots
//! so they can be compared by handle. Union types are always flat and
//! deduplicated. Function and class payloads live in side pools because they
//! carry mutable analysis state (the call memoization cache, the uncalled
//! flag) that outlives any single transform step.

use smallvec::SmallVec;

use crate::{nodes::NodeRef, scopes::ScopeId};

/// Unique identifier for a type stored in the [`TypePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub fn new(index: usize) -> Self {
        Self(index.try_into().expect("type pool overflow"))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Unique identifier for a function payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunId(u32);

impl FunId {
    pub fn new(index: usize) -> Self {
        Self(index.try_into().expect("function pool overflow"))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Unique identifier for a class payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(u32);

impl ClassId {
    pub fn new(index: usize) -> Self {
        Self(index.try_into().expect("class pool overflow"))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A bounded integer interval. Each side has its own boundedness flag; an
/// unbounded side keeps a placeholder endpoint that must not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntRange {
    pub lower: i64,
    pub upper: i64,
    pub lower_bounded: bool,
    pub upper_bounded: bool,
}

impl IntRange {
    pub const UNBOUNDED: Self = Self {
        lower: 0,
        upper: 0,
        lower_bounded: false,
        upper_bounded: false,
    };

    pub fn value(n: i64) -> Self {
        Self {
            lower: n,
            upper: n,
            lower_bounded: true,
            upper_bounded: true,
        }
    }

    pub fn bounded(lower: i64, upper: i64) -> Self {
        Self {
            lower,
            upper,
            lower_bounded: true,
            upper_bounded: true,
        }
    }

    /// True when the interval denotes exactly one integer.
    pub fn is_actual_value(&self) -> bool {
        self.lower_bounded && self.upper_bounded && self.lower == self.upper
    }

    /// A fully bounded interval is feasible when its endpoints are ordered.
    /// Interval arithmetic on division may produce infeasible results; the
    /// numeric callers treat those as Unknown.
    pub fn is_feasible(&self) -> bool {
        !(self.lower_bounded && self.upper_bounded) || self.lower <= self.upper
    }

    /// Zeroes the placeholder endpoint of unbounded sides so structurally
    /// equal intervals compare equal regardless of how they were computed.
    fn normalized(mut self) -> Self {
        if !self.lower_bounded {
            self.lower = 0;
        }
        if !self.upper_bounded {
            self.upper = 0;
        }
        self
    }

    pub fn add(&self, other: &Self) -> Self {
        Self {
            lower: self.lower.saturating_add(other.lower),
            upper: self.upper.saturating_add(other.upper),
            lower_bounded: self.lower_bounded && other.lower_bounded,
            upper_bounded: self.upper_bounded && other.upper_bounded,
        }
        .normalized()
    }

    pub fn negate(&self) -> Self {
        Self {
            lower: self.upper.saturating_neg(),
            upper: self.lower.saturating_neg(),
            lower_bounded: self.upper_bounded,
            upper_bounded: self.lower_bounded,
        }
        .normalized()
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.negate())
    }

    pub fn mul(&self, other: &Self) -> Self {
        let bounded = self.lower_bounded && self.upper_bounded && other.lower_bounded && other.upper_bounded;
        if !bounded {
            return Self::UNBOUNDED;
        }
        let products = [
            self.lower.saturating_mul(other.lower),
            self.lower.saturating_mul(other.upper),
            self.upper.saturating_mul(other.lower),
            self.upper.saturating_mul(other.upper),
        ];
        let lower = products.iter().copied().min().unwrap_or(0);
        let upper = products.iter().copied().max().unwrap_or(0);
        Self::bounded(lower, upper)
    }

    /// The smallest interval covering both operands.
    pub fn hull(&self, other: &Self) -> Self {
        Self {
            lower: self.lower.min(other.lower),
            upper: self.upper.max(other.upper),
            lower_bounded: self.lower_bounded && other.lower_bounded,
            upper_bounded: self.upper_bounded && other.upper_bounded,
        }
        .normalized()
    }

    /// Integer division: `lower/other.upper`, `upper/other.lower`. A divisor
    /// interval touching zero makes the result unbounded.
    pub fn div(&self, other: &Self) -> Self {
        let bounded = self.lower_bounded && self.upper_bounded && other.lower_bounded && other.upper_bounded;
        if !bounded || other.lower == 0 || other.upper == 0 {
            return Self::UNBOUNDED;
        }
        Self {
            lower: self.lower.saturating_div(other.upper),
            upper: self.upper.saturating_div(other.lower),
            lower_bounded: true,
            upper_bounded: true,
        }
    }
}

/// The payload of a function type.
///
/// Equality of function types is identity (`FunId`): a function is memoized
/// per definition, not per shape, which is what terminates mutually
/// recursive inference.
#[derive(Debug, Clone)]
pub struct FunctionData {
    pub name: String,
    /// Dotted qualified name; call scopes extend this, so locals inside a
    /// method keep the class segment in their qnames.
    pub qname: String,
    /// Defining AST node; None for builtins, which return `ret` directly.
    pub def: Option<NodeRef>,
    /// Captured lexical environment (the defining scope's forwarding target).
    pub env: ScopeId,
    /// Default-argument types covering the positional tail of the formals.
    pub defaults: Vec<TypeId>,
    /// Declared return type; only builtins carry one.
    pub ret: Option<TypeId>,
    /// Call memoization: actual-parameter-type tuple to result type.
    pub cache: Vec<(Vec<TypeId>, TypeId)>,
    pub called: bool,
    pub is_lambda: bool,
}

/// The payload of a class type.
#[derive(Debug, Clone)]
pub struct ClassData {
    pub name: String,
    pub qname: String,
    pub def: Option<NodeRef>,
    /// The class body scope; holds methods and class attributes.
    pub scope: ScopeId,
    pub bases: Vec<TypeId>,
}

/// Tagged type variant.
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// Bottom-ish element: nothing is known. Absorbing in arithmetic,
    /// a regular member in unions.
    Unknown,
    /// Sentinel for "control continues, no value": distinguishes statements
    /// that fall through from those that return a value.
    Cont,
    /// The None singleton.
    None,
    /// A boolean. `value` is present for the True/False singletons; an
    /// undecided bool may carry the two narrowed branch states produced by
    /// a refinable test.
    Bool {
        value: Option<bool>,
        branches: Option<(ScopeId, ScopeId)>,
    },
    Int(IntRange),
    Float,
    /// A string, with the literal value when it is statically known.
    Str(Option<String>),
    Bytes,
    /// An interned Ruby-style symbol; part of the family-wide lattice even
    /// though the Python frontend never constructs one.
    Symbol(String),
    List(TypeId),
    Tuple(SmallVec<[TypeId; 4]>),
    Dict { key: TypeId, value: TypeId },
    Set(TypeId),
    /// Flat, deduplicated member set. Never contains another union and never
    /// contains two structurally equal members.
    Union(SmallVec<[TypeId; 4]>),
    Function(FunId),
    Class(ClassId),
    /// An object produced by calling a class. The creating call node is the
    /// instance's identity; `args` are the constructor argument types.
    Instance {
        class: TypeId,
        scope: ScopeId,
        call: Option<NodeRef>,
        args: Vec<TypeId>,
    },
    Module {
        scope: ScopeId,
        file: String,
        qname: String,
    },
}

/// Arena of types plus the function/class side pools.
#[derive(Debug)]
pub struct TypePool {
    types: Vec<TypeKind>,
    funs: Vec<FunctionData>,
    classes: Vec<ClassData>,
}

/// Always-unknown type.
pub const UNKNOWN: TypeId = TypeId(0);
/// Continuation sentinel.
pub const CONT: TypeId = TypeId(1);
/// The None singleton.
pub const NONE: TypeId = TypeId(2);
/// The True singleton.
pub const TRUE: TypeId = TypeId(3);
/// The False singleton.
pub const FALSE: TypeId = TypeId(4);
/// The plain string type (no literal value).
pub const STR: TypeId = TypeId(5);
/// The float base type.
pub const FLOAT: TypeId = TypeId(6);
/// The bytes base type.
pub const BYTES: TypeId = TypeId(7);
/// An undecided bool with no branch states.
pub const BOOL: TypeId = TypeId(8);
/// The unbounded integer type.
pub const INT: TypeId = TypeId(9);

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}

impl TypePool {
    /// Creates a pool with the singletons pre-allocated at their fixed slots.
    pub fn new() -> Self {
        let types = vec![
            TypeKind::Unknown,
            TypeKind::Cont,
            TypeKind::None,
            TypeKind::Bool {
                value: Some(true),
                branches: None,
            },
            TypeKind::Bool {
                value: Some(false),
                branches: None,
            },
            TypeKind::Str(None),
            TypeKind::Float,
            TypeKind::Bytes,
            TypeKind::Bool {
                value: None,
                branches: None,
            },
            TypeKind::Int(IntRange::UNBOUNDED),
        ];
        Self {
            types,
            funs: Vec::new(),
            classes: Vec::new(),
        }
    }

    #[inline]
    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.types[id.index()]
    }

    pub fn alloc(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId::new(self.types.len());
        self.types.push(kind);
        id
    }

    pub fn alloc_fun(&mut self, data: FunctionData) -> (FunId, TypeId) {
        let fid = FunId::new(self.funs.len());
        self.funs.push(data);
        let tid = self.alloc(TypeKind::Function(fid));
        (fid, tid)
    }

    pub fn alloc_class(&mut self, data: ClassData) -> (ClassId, TypeId) {
        let cid = ClassId::new(self.classes.len());
        self.classes.push(data);
        let tid = self.alloc(TypeKind::Class(cid));
        (cid, tid)
    }

    #[inline]
    pub fn fun(&self, id: FunId) -> &FunctionData {
        &self.funs[id.index()]
    }

    #[inline]
    pub fn fun_mut(&mut self, id: FunId) -> &mut FunctionData {
        &mut self.funs[id.index()]
    }

    #[inline]
    pub fn class(&self, id: ClassId) -> &ClassData {
        &self.classes[id.index()]
    }

    pub fn fun_count(&self) -> usize {
        self.funs.len()
    }

    pub fn iter_funs(&self) -> impl Iterator<Item = (FunId, &FunctionData)> {
        self.funs.iter().enumerate().map(|(i, f)| (FunId::new(i), f))
    }

    pub fn int_value(&mut self, n: i64) -> TypeId {
        self.alloc(TypeKind::Int(IntRange::value(n)))
    }

    pub fn int_range(&mut self, range: IntRange) -> TypeId {
        if range == IntRange::UNBOUNDED {
            return INT;
        }
        self.alloc(TypeKind::Int(range))
    }

    pub fn str_literal(&mut self, value: &str) -> TypeId {
        self.alloc(TypeKind::Str(Some(value.to_owned())))
    }

    pub fn list_of(&mut self, elt: TypeId) -> TypeId {
        self.alloc(TypeKind::List(elt))
    }

    pub fn set_of(&mut self, elt: TypeId) -> TypeId {
        self.alloc(TypeKind::Set(elt))
    }

    pub fn tuple_of(&mut self, elts: impl IntoIterator<Item = TypeId>) -> TypeId {
        self.alloc(TypeKind::Tuple(elts.into_iter().collect()))
    }

    pub fn dict_of(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.alloc(TypeKind::Dict { key, value })
    }

    pub fn bool_with_branches(&mut self, s1: ScopeId, s2: ScopeId) -> TypeId {
        self.alloc(TypeKind::Bool {
            value: None,
            branches: Some((s1, s2)),
        })
    }

    pub fn is_unknown(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Unknown)
    }

    pub fn is_cont(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Cont)
    }

    pub fn is_function(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Function(_))
    }

    pub fn as_int(&self, id: TypeId) -> Option<IntRange> {
        match self.kind(id) {
            TypeKind::Int(r) => Some(*r),
            _ => None,
        }
    }

    /// Converts a bool type to the integer interval Python arithmetic treats
    /// it as.
    pub fn bool_as_int(&self, id: TypeId) -> Option<IntRange> {
        match self.kind(id) {
            TypeKind::Bool { value: Some(true), .. } => Some(IntRange::value(1)),
            TypeKind::Bool { value: Some(false), .. } => Some(IntRange::value(0)),
            TypeKind::Bool { value: None, .. } => Some(IntRange::bounded(0, 1)),
            _ => None,
        }
    }

    /// Structural equality with identity semantics for functions, classes
    /// and instances.
    pub fn equal(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        match (self.kind(a), self.kind(b)) {
            (TypeKind::Unknown, TypeKind::Unknown)
            | (TypeKind::Cont, TypeKind::Cont)
            | (TypeKind::None, TypeKind::None)
            | (TypeKind::Float, TypeKind::Float)
            | (TypeKind::Bytes, TypeKind::Bytes) => true,
            (TypeKind::Bool { value: va, .. }, TypeKind::Bool { value: vb, .. }) => va == vb,
            (TypeKind::Int(ra), TypeKind::Int(rb)) => ra == rb,
            (TypeKind::Str(sa), TypeKind::Str(sb)) => sa == sb,
            (TypeKind::Symbol(sa), TypeKind::Symbol(sb)) => sa == sb,
            (TypeKind::List(ea), TypeKind::List(eb)) | (TypeKind::Set(ea), TypeKind::Set(eb)) => self.equal(*ea, *eb),
            (TypeKind::Tuple(ea), TypeKind::Tuple(eb)) => {
                ea.len() == eb.len() && ea.iter().zip(eb.iter()).all(|(x, y)| self.equal(*x, *y))
            }
            (TypeKind::Dict { key: ka, value: va }, TypeKind::Dict { key: kb, value: vb }) => {
                self.equal(*ka, *kb) && self.equal(*va, *vb)
            }
            (TypeKind::Union(ma), TypeKind::Union(mb)) => {
                ma.len() == mb.len()
                    && ma.iter().all(|x| mb.iter().any(|y| self.equal(*x, *y)))
            }
            (TypeKind::Function(fa), TypeKind::Function(fb)) => fa == fb,
            (TypeKind::Class(ca), TypeKind::Class(cb)) => ca == cb,
            (
                TypeKind::Instance {
                    class: ca, call: na, ..
                },
                TypeKind::Instance {
                    class: cb, call: nb, ..
                },
            ) => self.equal(*ca, *cb) && na == nb,
            (TypeKind::Module { file: fa, .. }, TypeKind::Module { file: fb, .. }) => fa == fb,
            _ => false,
        }
    }

    /// Structural membership query, unwrapping unions on the left.
    pub fn contains(&self, t: TypeId, member: TypeId) -> bool {
        match self.kind(t) {
            TypeKind::Union(members) => members.iter().any(|m| self.equal(*m, member)),
            _ => self.equal(t, member),
        }
    }

    fn members(&self, t: TypeId) -> SmallVec<[TypeId; 4]> {
        match self.kind(t) {
            TypeKind::Union(members) => members.clone(),
            _ => SmallVec::from_slice(&[t]),
        }
    }

    /// The lattice join. The result union is flat and deduplicated; a
    /// one-element union collapses to that element. Integer members merge
    /// into their interval hull instead of piling up per-value. Unknown
    /// stays a visible member so that cycle-guard results remain observable
    /// in inferred return types.
    pub fn union(&mut self, a: TypeId, b: TypeId) -> TypeId {
        if a == b || self.equal(a, b) {
            return a;
        }
        let mut members: SmallVec<[TypeId; 4]> = SmallVec::new();
        let mut int_hull: Option<IntRange> = None;
        for m in self.members(a).into_iter().chain(self.members(b)) {
            if let TypeKind::Int(r) = self.kind(m) {
                int_hull = Some(match int_hull {
                    Some(h) => h.hull(r),
                    None => *r,
                });
                continue;
            }
            if !members.iter().any(|existing| self.equal(*existing, m)) {
                members.push(m);
            }
        }
        if let Some(h) = int_hull {
            let merged = self.int_range(h);
            if !members.iter().any(|existing| self.equal(*existing, merged)) {
                members.push(merged);
            }
        }
        if members.len() == 1 {
            return members[0];
        }
        self.alloc(TypeKind::Union(members))
    }

    /// Joins a whole list; the empty list joins to `CONT`.
    pub fn union_all(&mut self, types: &[TypeId]) -> TypeId {
        let mut iter = types.iter();
        let Some(&first) = iter.next() else {
            return CONT;
        };
        iter.fold(first, |acc, &t| self.union(acc, t))
    }

    /// Removes `CONT` from a type, collapsing the union as needed. Used when
    /// a function's fallthrough paths are rewritten to an implicit None.
    pub fn without_cont(&mut self, t: TypeId) -> TypeId {
        if self.is_cont(t) {
            return CONT;
        }
        let members = self.members(t);
        let kept: Vec<TypeId> = members.into_iter().filter(|m| !self.is_cont(*m)).collect();
        if kept.is_empty() {
            return CONT;
        }
        self.union_all(&kept)
    }

    /// Element type yielded by iterating a value of type `t`.
    pub fn iterated_elem(&mut self, t: TypeId) -> TypeId {
        match self.kind(t).clone() {
            TypeKind::List(e) | TypeKind::Set(e) => e,
            TypeKind::Tuple(elts) => self.union_all(&elts),
            TypeKind::Dict { key, .. } => key,
            TypeKind::Str(_) => STR,
            TypeKind::Bytes => INT,
            TypeKind::Union(members) => {
                let elems: Vec<TypeId> = members.iter().map(|m| self.iterated_elem(*m)).collect();
                self.union_all(&elems)
            }
            _ => UNKNOWN,
        }
    }

    /// Renders a type in the `Int[l,u]` / `Union{..}` notation used by
    /// diagnostics and the CLI report.
    pub fn to_string(&self, id: TypeId) -> String {
        match self.kind(id) {
            TypeKind::Unknown => "?".to_owned(),
            TypeKind::Cont => "Cont".to_owned(),
            TypeKind::None => "None".to_owned(),
            TypeKind::Bool { value: Some(true), .. } => "True".to_owned(),
            TypeKind::Bool { value: Some(false), .. } => "False".to_owned(),
            TypeKind::Bool { value: None, .. } => "Bool".to_owned(),
            TypeKind::Int(r) => {
                let lower = if r.lower_bounded {
                    r.lower.to_string()
                } else {
                    "-\u{221e}".to_owned()
                };
                let upper = if r.upper_bounded {
                    r.upper.to_string()
                } else {
                    "+\u{221e}".to_owned()
                };
                format!("Int[{lower},{upper}]")
            }
            TypeKind::Float => "Float".to_owned(),
            TypeKind::Str(Some(v)) => format!("Str({v:?})"),
            TypeKind::Str(None) => "Str".to_owned(),
            TypeKind::Bytes => "Bytes".to_owned(),
            TypeKind::Symbol(name) => format!(":{name}"),
            TypeKind::List(e) => format!("List[{}]", self.to_string(*e)),
            TypeKind::Set(e) => format!("Set[{}]", self.to_string(*e)),
            TypeKind::Tuple(elts) => {
                let inner: Vec<String> = elts.iter().map(|e| self.to_string(*e)).collect();
                format!("Tuple[{}]", inner.join(", "))
            }
            TypeKind::Dict { key, value } => {
                format!("Dict[{}, {}]", self.to_string(*key), self.to_string(*value))
            }
            TypeKind::Union(members) => {
                let inner: Vec<String> = members.iter().map(|m| self.to_string(*m)).collect();
                format!("Union{{{}}}", inner.join(", "))
            }
            TypeKind::Function(fid) => format!("fn {}", self.fun(*fid).name),
            TypeKind::Class(cid) => format!("class {}", self.class(*cid).name),
            TypeKind::Instance { class, .. } => match self.kind(*class) {
                TypeKind::Class(cid) => format!("instance {}", self.class(*cid).name),
                _ => "instance ?".to_owned(),
            },
            TypeKind::Module { qname, .. } => format!("module {qname}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_is_flat_and_deduplicated() {
        let mut pool = TypePool::new();
        let one = pool.int_value(1);
        let u1 = pool.union(one, STR);
        let u2 = pool.union(u1, NONE);
        let TypeKind::Union(members) = pool.kind(u2) else {
            panic!("expected a union");
        };
        assert_eq!(members.len(), 3);
        for m in members {
            assert!(!matches!(pool.kind(*m), TypeKind::Union(_)), "nested union");
        }
        // Joining an already present member changes nothing.
        let one_again = pool.int_value(1);
        let u3 = pool.union(u2, one_again);
        let TypeKind::Union(members) = pool.kind(u3) else {
            panic!("expected a union");
        };
        assert_eq!(members.len(), 3);
    }

    #[test]
    fn union_collapses_singletons() {
        let mut pool = TypePool::new();
        let a = pool.int_value(3);
        let b = pool.int_value(3);
        assert_eq!(pool.union(a, b), a);
        assert_eq!(pool.union(STR, STR), STR);
    }

    #[test]
    fn unknown_stays_a_union_member() {
        let mut pool = TypePool::new();
        let one = pool.int_value(1);
        let u = pool.union(one, UNKNOWN);
        assert!(pool.contains(u, UNKNOWN));
        assert!(pool.contains(u, one));
    }

    #[test]
    fn interval_add_and_mul() {
        let a = IntRange::value(3);
        let b = IntRange::value(2);
        assert_eq!(a.add(&b), IntRange::value(5));
        assert_eq!(a.mul(&b), IntRange::value(6));
        let neg = IntRange::bounded(-2, 5);
        assert_eq!(neg.mul(&IntRange::bounded(-1, 1)), IntRange::bounded(-5, 5));
    }

    #[test]
    fn interval_boundedness_is_conjunctive() {
        let bounded = IntRange::value(4);
        let half = IntRange {
            lower: 1,
            upper: 0,
            lower_bounded: true,
            upper_bounded: false,
        };
        let sum = bounded.add(&half);
        assert!(sum.lower_bounded);
        assert!(!sum.upper_bounded);
    }

    #[test]
    fn interval_div_endpoints() {
        let a = IntRange::bounded(10, 20);
        let b = IntRange::bounded(2, 5);
        // lower/upper.max, upper/lower.min per the propagation rule
        assert_eq!(a.div(&b), IntRange::bounded(2, 10));
        // divisor touching zero loses all bounds
        let z = IntRange::bounded(0, 3);
        assert_eq!(a.div(&z), IntRange::UNBOUNDED);
    }

    #[test]
    fn interval_negate_swaps_flags() {
        let half = IntRange {
            lower: 2,
            upper: 0,
            lower_bounded: true,
            upper_bounded: false,
        };
        let neg = half.negate();
        assert!(!neg.lower_bounded);
        assert!(neg.upper_bounded);
        assert_eq!(neg.upper, -2);
    }

    #[test]
    fn feasibility_after_ops() {
        let a = IntRange::bounded(1, 10);
        let b = IntRange::bounded(-3, 4);
        for r in [a.add(&b), a.sub(&b), a.mul(&b)] {
            assert!(r.is_feasible(), "result {r:?} must be feasible");
        }
    }

    #[test]
    fn without_cont_collapses() {
        let mut pool = TypePool::new();
        let one = pool.int_value(1);
        let u = pool.union(one, CONT);
        assert_eq!(pool.without_cont(u), one);
        assert_eq!(pool.without_cont(CONT), CONT);
    }

    #[test]
    fn iterated_elem_types() {
        let mut pool = TypePool::new();
        let list = pool.list_of(STR);
        assert_eq!(pool.iterated_elem(list), STR);
        let one = pool.int_value(1);
        let tup = pool.tuple_of([one, STR]);
        let elem = pool.iterated_elem(tup);
        assert!(pool.contains(elem, STR));
        assert!(pool.contains(elem, one));
        let dict = pool.dict_of(STR, FLOAT);
        assert_eq!(pool.iterated_elem(dict), STR);
    }
}
