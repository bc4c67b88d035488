#![doc = include_str!("../../../README.md")]

mod analyzer;
mod binder;
mod builtins;
mod cache;
mod nodes;
mod parse;
mod scopes;
mod transform;
mod types;

pub use crate::{
    analyzer::{Analyzer, Config, Diagnostic, LoadedModule, ProblemKey},
    cache::AstCache,
    nodes::{
        BinOpKind, BoolOpKind, CmpOpKind, ModuleAst, ModuleId, NameConstValue, Node, NodeId, NodeKind, NodeRef,
        UnaryOpKind,
    },
    parse::{MAX_NESTING_DEPTH, ParseError, parse_source, sha1_hex},
    scopes::{Binding, BindingId, BindingKind, Ref, Scope, ScopeId, ScopeKind, ScopePool},
    types::{
        BOOL, BYTES, CONT, ClassData, ClassId, FALSE, FLOAT, FunId, FunctionData, INT, IntRange, NONE, STR, TRUE,
        TypeId, TypeKind, TypePool, UNKNOWN,
    },
};
