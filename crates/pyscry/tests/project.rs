//! Multi-file analysis: directory discovery, imports, builtin modules and
//! the on-disk AST cache.

use std::fs;

use pretty_assertions::assert_eq;
use pyscry::{Analyzer, Config};

fn write(dir: &std::path::Path, name: &str, code: &str) {
    fs::write(dir.join(name), code).expect("write fixture");
}

fn type_of(az: &Analyzer, qname: &str) -> String {
    let binding = az.find_binding(qname).unwrap_or_else(|| panic!("no binding {qname}"));
    az.type_to_string(binding.ty)
}

#[test]
fn imports_resolve_across_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "a.py", "VALUE = 42\n\ndef get():\n    return VALUE\n");
    write(dir.path(), "b.py", "import a\nfrom a import get\n\nx = a.VALUE\ny = get()\n");

    let mut az = Analyzer::new(Config::default());
    az.analyze(dir.path());
    az.finish();

    assert_eq!(type_of(&az, "a.VALUE"), "Int[42,42]");
    assert_eq!(type_of(&az, "b.x"), "Int[42,42]");
    assert_eq!(type_of(&az, "b.y"), "Int[42,42]");
    assert_eq!(az.loaded_modules().count(), 2);
}

#[test]
fn builtin_modules_resolve_without_files() {
    let mut az = Analyzer::new(Config::default());
    az.load_source("m.py", "import sys\nimport math\n\nv = sys.argv\np = math.pi\n")
        .expect("parse");
    az.finish();
    assert_eq!(type_of(&az, "m.v"), "List[Str]");
    assert_eq!(type_of(&az, "m.p"), "Float");
}

#[test]
fn parse_failures_skip_only_that_module() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "bad.py", "def broken(:\n");
    write(dir.path(), "good.py", "x = 1\n");

    let mut az = Analyzer::new(Config::default());
    az.analyze(dir.path());
    az.finish();

    assert_eq!(type_of(&az, "good.x"), "Int[1,1]");
    let file_problems = az
        .get_problems()
        .iter()
        .filter(|(key, _)| matches!(key, pyscry::ProblemKey::File(_)))
        .count();
    assert_eq!(file_problems, 1, "the bad module must carry a file problem");
}

#[test]
fn disk_cache_warms_second_analyzer() {
    let src_dir = tempfile::tempdir().expect("tempdir");
    let cache_dir = tempfile::tempdir().expect("cache dir");
    write(src_dir.path(), "m.py", "x = 1\ny = x + 2\n");

    let config = Config {
        cache_dir: Some(cache_dir.path().to_path_buf()),
        ..Config::default()
    };
    let mut first = Analyzer::new(config.clone());
    first.analyze(src_dir.path());
    first.finish();
    let entries = fs::read_dir(cache_dir.path()).expect("read cache").count();
    assert_eq!(entries, 1, "one serialized tree expected");

    // a fresh analyzer adopts the serialized tree and reaches the same result
    let mut second = Analyzer::new(config);
    second.analyze(src_dir.path());
    second.finish();
    assert_eq!(type_of(&second, "m.y"), "Int[3,3]");

    // close() clears the disk cache
    second.close();
    let remaining = fs::read_dir(cache_dir.path()).expect("read cache").count();
    assert_eq!(remaining, 0);
}

#[test]
fn exception_handlers_bind_instances() {
    let mut az = Analyzer::new(Config::default());
    az.load_source(
        "m.py",
        "try:\n    x = 1\nexcept ValueError as e:\n    x = 2\nfinally:\n    y = 3\n",
    )
    .expect("parse");
    az.finish();
    let e = az.find_binding("m.e").expect("handler binding");
    assert_eq!(e.kind, pyscry::BindingKind::Parameter);
    assert!(az.type_to_string(e.ty).starts_with("instance"), "except-as binds an instance");
}

#[test]
fn class_attributes_and_constructor() {
    let code = "class Point:\n    \"\"\"A 2-d point.\"\"\"\n\n    def __init__(self, x, y):\n        self.x = x\n        self.y = y\n\n    def norm(self):\n        return self.x\n\np = Point(1, 2)\nq = p.norm()\n";
    let mut az = Analyzer::new(Config::default());
    az.load_source("m.py", code).expect("parse");
    az.finish();

    assert_eq!(
        az.find_binding("m.Point").expect("class binding").doc.as_deref(),
        Some("A 2-d point.")
    );
    let init = az.find_binding("m.Point.__init__").expect("constructor binding");
    assert_eq!(init.kind, pyscry::BindingKind::Constructor);
    let x_attr = az.find_binding("m.Point.x").expect("instance attribute");
    assert_eq!(x_attr.kind, pyscry::BindingKind::Attribute);
    assert_eq!(type_of(&az, "m.q"), "Int[1,1]");
    assert!(type_of(&az, "m.p").starts_with("instance"));
}

#[test]
fn inherited_methods_resolve_through_bases() {
    let code = "class Base:\n    def ping(self):\n        return \"pong\"\n\nclass Child(Base):\n    pass\n\nc = Child()\nr = c.ping()\n";
    let mut az = Analyzer::new(Config::default());
    az.load_source("m.py", code).expect("parse");
    az.finish();
    assert!(type_of(&az, "m.r").starts_with("Str"));
}
