//! End-to-end inference scenarios driven through the public API.

use pretty_assertions::assert_eq;
use pyscry::{Analyzer, BindingKind, Config, Ref, TypeKind, UNKNOWN};

fn analyzed(code: &str) -> Analyzer {
    let mut az = Analyzer::new(Config::default());
    az.load_source("m.py", code).expect("module must parse");
    az.finish();
    az
}

fn type_of(az: &Analyzer, qname: &str) -> String {
    let binding = az.find_binding(qname).unwrap_or_else(|| panic!("no binding {qname}"));
    az.type_to_string(binding.ty)
}

#[test]
fn literal_arithmetic_propagates_intervals() {
    let az = analyzed("x = 1\ny = x + 2\n");
    assert_eq!(type_of(&az, "m.x"), "Int[1,1]");
    assert_eq!(type_of(&az, "m.y"), "Int[3,3]");
}

#[test]
fn calls_are_memoized_per_argument_tuple() {
    let az = analyzed("def f(a, b=2):\n    return a + b\n\nr1 = f(3)\nr2 = f(3, 4)\n");
    assert_eq!(type_of(&az, "m.r1"), "Int[5,5]");
    assert_eq!(type_of(&az, "m.r2"), "Int[7,7]");

    let types = az.type_pool();
    let (_, fun) = types
        .iter_funs()
        .find(|(_, f)| f.qname == "m.f")
        .expect("function payload for m.f");
    assert!(fun.called);
    let rendered: Vec<(Vec<String>, String)> = fun
        .cache
        .iter()
        .map(|(from, to)| {
            (
                from.iter().map(|t| types.to_string(*t)).collect(),
                types.to_string(*to),
            )
        })
        .collect();
    assert_eq!(
        rendered,
        vec![
            (vec!["Int[3,3]".to_owned(), "Int[2,2]".to_owned()], "Int[5,5]".to_owned()),
            (vec!["Int[3,3]".to_owned(), "Int[4,4]".to_owned()], "Int[7,7]".to_owned()),
        ]
    );
}

#[test]
fn recursion_terminates_with_unknown_edge() {
    let az = analyzed("def fact(n):\n    return 1 if n <= 1 else n * fact(n - 1)\n\nr = fact(5)\n");
    // the recursive edge answers Unknown under the cycle guard, so the
    // result is the union of the base case and Unknown
    let binding = az.find_binding("m.r").expect("binding r");
    let types = az.type_pool();
    assert!(types.contains(binding.ty, UNKNOWN));
    let TypeKind::Union(members) = types.kind(binding.ty) else {
        panic!("expected a union, got {}", az.type_to_string(binding.ty));
    };
    assert!(members.iter().any(|&m| matches!(types.kind(m), TypeKind::Int(_))));
}

#[test]
fn branches_union_and_share_references() {
    let code = "def use(v):\n    return v\n\ncond = len(\"a\") == 0\nif cond:\n    x = \"s\"\nelse:\n    x = 1\nr = use(x)\n";
    let az = analyzed(code);

    let x_bindings: Vec<_> = az.get_all_bindings().filter(|b| b.name == "x").collect();
    assert_eq!(x_bindings.len(), 2, "one binding per assignment arm");

    let joint = type_of(&az, "m.r");
    assert!(joint.contains("Str"), "joint type must include Str: {joint}");
    assert!(joint.contains("Int[1,1]"), "joint type must include Int: {joint}");

    // the single use(x) reference resolves to both assignments
    let offset = u32::try_from(code.rfind('x').expect("use site")).expect("offset");
    let use_ref = Ref {
        file: "m.py".to_owned(),
        start: offset,
        length: 1,
    };
    let resolved = az.get_references().get(&use_ref).expect("reference recorded at use(x)");
    assert_eq!(resolved.len(), 2);
}

#[test]
fn tuple_unpacking_binds_elementwise() {
    let az = analyzed("a, b = (1, \"hi\")\n");
    assert_eq!(type_of(&az, "m.a"), "Int[1,1]");
    assert!(type_of(&az, "m.b").starts_with("Str"));
}

#[test]
fn starred_target_absorbs_middle_slice() {
    let az = analyzed("first, *rest, last = (1, 2, 3, \"z\")\n");
    assert_eq!(type_of(&az, "m.first"), "Int[1,1]");
    assert!(type_of(&az, "m.last").starts_with("Str"));
    assert!(type_of(&az, "m.rest").starts_with("List["));
}

#[test]
fn identical_content_distinct_modules() {
    let mut az = Analyzer::new(Config::default());
    let code = "x = 1\n";
    az.load_source("one/m.py", code).expect("first");
    az.load_source("two/m.py", code).expect("second");
    az.finish();
    let modules: Vec<_> = az.loaded_modules().collect();
    assert_eq!(modules.len(), 2);
    assert_ne!(modules[0].file, modules[1].file);
    let a = az.get_ast_for_file("one/m.py").expect("ast one");
    let b = az.get_ast_for_file("two/m.py").expect("ast two");
    assert_eq!(a.sha1(), b.sha1());
    assert_eq!(a.len(), b.len());
    assert_ne!(a.file(), b.file());
}

#[test]
fn not_always_returning_function_is_flagged() {
    let az = analyzed("def f(c):\n    if c:\n        return 1\n\nr = f(2)\n");
    let messages: Vec<&str> = az
        .get_problems()
        .values()
        .flatten()
        .map(|d| d.message.as_str())
        .collect();
    assert!(
        messages.iter().any(|m| m.contains("not always returns")),
        "expected a not-always-returns diagnostic, got {messages:?}"
    );
    // fallthrough contributes an implicit None to the result
    let r = type_of(&az, "m.r");
    assert!(r.contains("Int[1,1]") && r.contains("None"), "got {r}");
}

#[test]
fn undefined_names_are_diagnosed_and_unknown() {
    let az = analyzed("y = missing + 1\n");
    let messages: Vec<&str> = az
        .get_problems()
        .values()
        .flatten()
        .map(|d| d.message.as_str())
        .collect();
    assert!(messages.iter().any(|m| m.contains("undefined name: missing")));
    assert_eq!(type_of(&az, "m.y"), "?");
}

#[test]
fn unbindable_argument_is_diagnosed() {
    let az = analyzed("def f(a, b):\n    return a\n\nf(1)\n");
    let messages: Vec<&str> = az
        .get_problems()
        .values()
        .flatten()
        .map(|d| d.message.as_str())
        .collect();
    assert!(messages.iter().any(|m| m.contains("unable to bind argument: b")));
}

#[test]
fn keyword_defaults_and_star_args_bind() {
    let code = "def f(a, b, c=3):\n    return (a, b, c)\n\nr = f(1, b=\"s\")\n";
    let az = analyzed(code);
    let r = type_of(&az, "m.r");
    // c comes from its default even though b arrived by keyword
    assert!(r.starts_with("Tuple["), "got {r}");
    assert!(r.contains("Int[1,1]"));
    assert!(r.contains("Int[3,3]"));
}

#[test]
fn uncalled_functions_are_applied_at_finish() {
    let az = analyzed("def helper(a, b):\n    return a + b\n");
    // finish() applied helper with Unknown arguments, so its parameters
    // and body bindings exist
    assert!(az.find_binding("m.helper.a").is_some());
    assert!(az.find_binding("m.helper.b").is_some());
    let (_, fun) = az
        .type_pool()
        .iter_funs()
        .find(|(_, f)| f.qname == "m.helper")
        .expect("helper payload");
    assert!(fun.called, "finish must mark uncalled functions as applied");
}

#[test]
fn lambda_is_a_function_value() {
    let az = analyzed("inc = lambda n: n + 1\nr = inc(4)\n");
    assert_eq!(type_of(&az, "m.r"), "Int[5,5]");
    let inc = az.find_binding("m.inc").expect("inc binding");
    assert!(az.type_pool().is_function(inc.ty));
}

#[test]
fn walrus_yields_its_bound_value() {
    let az = analyzed("y = (n := 5) + 1\nwhile (m := y - 1) > 0:\n    z = m\n");
    assert_eq!(type_of(&az, "m.n"), "Int[5,5]");
    assert_eq!(type_of(&az, "m.y"), "Int[6,6]");
    assert_eq!(type_of(&az, "m.m"), "Int[5,5]");
    assert_eq!(type_of(&az, "m.z"), "Int[5,5]");
}

#[test]
fn is_not_none_narrows_the_false_branch() {
    let az = analyzed("x = \"s\"\nif x is not None:\n    y = x\nelse:\n    y = x\n");
    let ys: Vec<String> = az
        .get_all_bindings()
        .filter(|b| b.name == "y")
        .map(|b| az.type_to_string(b.ty))
        .collect();
    assert_eq!(ys.len(), 2, "one binding per arm: {ys:?}");
    assert!(ys.iter().any(|t| t.starts_with("Str")), "true branch keeps the string: {ys:?}");
    assert!(ys.iter().any(|t| t == "None"), "false branch narrows to None: {ys:?}");
}

#[test]
fn isinstance_narrows_the_true_branch() {
    let code = "class A:\n    def go(self):\n        return 3\n\ndef f(v):\n    if isinstance(v, A):\n        return v.go()\n    return 0\n\nr = f(0)\n";
    let az = analyzed(code);
    // the method body types under the narrowed receiver; integer results
    // join into their interval hull
    assert_eq!(type_of(&az, "m.r"), "Int[0,3]");
}

#[test]
fn comprehensions_keep_their_variables_scoped() {
    let az = analyzed("xs = [n * 2 for n in (1, 2, 3)]\n");
    assert!(type_of(&az, "m.xs").starts_with("List[Int"));
    // the loop variable must not leak into the module scope
    assert!(az.find_binding("m.n").is_none());
}

#[test]
fn while_else_and_for_union_their_blocks() {
    let az = analyzed("def f(xs):\n    for x in xs:\n        if x:\n            return \"found\"\n    return None\n\nr = f([1])\n");
    let r = type_of(&az, "m.r");
    assert!(r.contains("Str"), "got {r}");
    assert!(r.contains("None"), "got {r}");
}

#[test]
fn generator_functions_type_as_sequences() {
    let az = analyzed("def gen(n):\n    yield n\n    yield n + 1\n\ng = gen(1)\nxs = [v for v in gen(1)]\n");
    assert_eq!(type_of(&az, "m.g"), "List[Int[1,2]]");
    assert_eq!(type_of(&az, "m.xs"), "List[Int[1,2]]");
    // a generator falling off its end is not a missing return
    let messages: Vec<&str> = az
        .get_problems()
        .values()
        .flatten()
        .map(|d| d.message.as_str())
        .collect();
    assert!(messages.is_empty(), "unexpected diagnostics: {messages:?}");
}

#[test]
fn docstrings_attach_to_bindings() {
    let code = "\"\"\"module doc\"\"\"\n\ndef f():\n    \"\"\"fn doc\"\"\"\n    return 1\n\nf()\n";
    let az = analyzed(code);
    assert_eq!(az.find_binding("m").expect("module binding").doc.as_deref(), Some("module doc"));
    assert_eq!(az.find_binding("m.f").expect("f binding").doc.as_deref(), Some("fn doc"));
}

#[test]
fn qualified_names_follow_nesting() {
    let code = "class Outer:\n    class Inner:\n        def m(self):\n            return 1\n\no = Outer()\n";
    let az = analyzed(code);
    assert!(az.find_binding("m.Outer").is_some());
    assert!(az.find_binding("m.Outer.Inner").is_some());
    assert!(az.find_binding("m.Outer.Inner.m").is_some());
    let m = az.find_binding("m.Outer.Inner.m").expect("method binding");
    assert_eq!(m.kind, BindingKind::Method);
}
