//! Cross-cutting invariants checked over whole analysis runs.

use pretty_assertions::assert_eq;
use pyscry::{Analyzer, Config, TypeId, TypeKind, TypePool};

const PROGRAM: &str = "\
\"\"\"fixture module\"\"\"

class Shape:
    def __init__(self, name):
        self.name = name

    def describe(self):
        return self.name

def pick(flag):
    if flag:
        return \"many\"
    elif flag is None:
        return 0
    else:
        return [1, 2]

def recurse_a(n):
    return recurse_b(n - 1)

def recurse_b(n):
    return recurse_a(n - 1)

s = Shape(\"circle\")
d = s.describe()
r = pick(len(\"x\") == 1)
m = recurse_a(3)
";

fn analyzed() -> Analyzer {
    let mut az = Analyzer::new(Config::default());
    az.load_source("fixture.py", PROGRAM).expect("fixture must parse");
    az.finish();
    az
}

fn check_union_flat(types: &TypePool, t: TypeId, seen: &mut Vec<TypeId>) {
    if seen.contains(&t) {
        return;
    }
    seen.push(t);
    match types.kind(t) {
        TypeKind::Union(members) => {
            for (i, &m) in members.iter().enumerate() {
                assert!(
                    !matches!(types.kind(m), TypeKind::Union(_)),
                    "union member is itself a union"
                );
                for &other in &members[i + 1..] {
                    assert!(!types.equal(m, other), "duplicate union members");
                }
                check_union_flat(types, m, seen);
            }
        }
        TypeKind::List(e) | TypeKind::Set(e) => check_union_flat(types, *e, seen),
        TypeKind::Tuple(elts) => {
            for &e in elts {
                check_union_flat(types, e, seen);
            }
        }
        TypeKind::Dict { key, value } => {
            check_union_flat(types, *key, seen);
            check_union_flat(types, *value, seen);
        }
        _ => {}
    }
}

#[test]
fn unions_stay_flat_and_deduplicated() {
    let az = analyzed();
    let types = az.type_pool();
    let mut seen = Vec::new();
    for binding in az.get_all_bindings() {
        check_union_flat(types, binding.ty, &mut seen);
    }
}

#[test]
fn mutual_recursion_terminates() {
    // reaching this far at all proves the cycle guard; the result must
    // exist and the analysis must not have overflowed
    let az = analyzed();
    assert!(az.find_binding("fixture.m").is_some());
}

#[test]
fn qnames_are_deterministic_across_runs() {
    let first: Vec<String> = analyzed()
        .get_all_bindings()
        .filter(|b| !b.builtin)
        .map(|b| b.qname.clone())
        .collect();
    let second: Vec<String> = analyzed()
        .get_all_bindings()
        .filter(|b| !b.builtin)
        .map(|b| b.qname.clone())
        .collect();
    assert_eq!(first, second);
}

#[test]
fn reference_index_is_complete_both_ways() {
    let az = analyzed();
    let references = az.get_references();
    assert!(!references.is_empty(), "fixture must produce references");

    // every indexed reference is present on each binding it resolves to
    for (r, bindings) in references {
        assert!(!bindings.is_empty());
        for &b in bindings {
            assert!(
                az.binding(b).refs.contains(r),
                "binding {} lacks indexed ref at {}..{}",
                az.binding(b).qname,
                r.start,
                r.start + r.length
            );
        }
    }
    // and every recorded ref is indexed
    for (id, binding) in az.scope_pool().iter_bindings() {
        for r in &binding.refs {
            let resolved = references.get(r).expect("ref missing from index");
            assert!(resolved.contains(&id));
        }
    }
}

#[test]
fn ast_parents_are_consistent() {
    let az = analyzed();
    let ast = az.get_ast_for_file("fixture.py").expect("fixture ast");
    for id in ast.iter_ids() {
        match ast.node(id).parent {
            Some(parent) => assert!(
                ast.kind(parent).children().contains(&id),
                "node {id} not among its parent's children"
            ),
            None => assert_eq!(id, ast.root()),
        }
    }
    // every arena node is reachable from the root
    let mut reached = vec![false; ast.len()];
    ast.visit(ast.root(), &mut |id| reached[id.index()] = true);
    assert!(reached.iter().all(|r| *r), "orphaned arena nodes");
}

#[test]
fn branch_result_unions_every_arm() {
    let az = analyzed();
    let r = az.find_binding("fixture.r").expect("pick() result");
    let shown = az.type_to_string(r.ty);
    assert!(shown.contains("Str"), "got {shown}");
    assert!(shown.contains("Int"), "got {shown}");
    assert!(shown.contains("List"), "got {shown}");
}
