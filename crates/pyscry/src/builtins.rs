//! The builtin environment: a root GLOBAL scope populated with builtin
//! functions, base-type constructors, common exception classes and a few
//! standard-library module tables. Every binding created here is marked
//! `builtin` and the functions carry docs.python.org URLs.

use crate::{
    scopes::{BindingKind, ScopeId, ScopeKind, ScopePool},
    types::{BOOL, FLOAT, FunctionData, INT, NONE, STR, TypeId, TypeKind, TypePool, UNKNOWN, ClassData},
};

const FUNC_DOC_BASE: &str = "https://docs.python.org/3/library/functions.html";

/// Builds the root scope all module scopes hang off.
pub fn install(types: &mut TypePool, scopes: &mut ScopePool) -> ScopeId {
    let root = scopes.new_scope(None, ScopeKind::Global, String::new());

    let func = |types: &mut TypePool, scopes: &mut ScopePool, name: &str, ret: TypeId| {
        let (_, ty) = types.alloc_fun(FunctionData {
            name: name.to_owned(),
            qname: name.to_owned(),
            def: None,
            env: root,
            defaults: Vec::new(),
            ret: Some(ret),
            cache: Vec::new(),
            called: true,
            is_lambda: false,
        });
        let id = scopes.insert(types, root, name, None, "<builtin>", 0, 0, ty, BindingKind::Function);
        let binding = scopes.binding_mut(id);
        binding.builtin = true;
        binding.url = Some(format!("{FUNC_DOC_BASE}#{name}"));
    };

    // type constructors
    func(types, scopes, "int", INT);
    func(types, scopes, "float", FLOAT);
    func(types, scopes, "bool", BOOL);
    func(types, scopes, "str", STR);
    func(types, scopes, "bytes", crate::types::BYTES);
    let list_any = types.list_of(UNKNOWN);
    func(types, scopes, "list", list_any);
    let tuple_any = types.alloc(TypeKind::Tuple(smallvec::SmallVec::new()));
    func(types, scopes, "tuple", tuple_any);
    let dict_any = types.dict_of(UNKNOWN, UNKNOWN);
    func(types, scopes, "dict", dict_any);
    let set_any = types.set_of(UNKNOWN);
    func(types, scopes, "set", set_any);
    let frozenset_any = types.set_of(UNKNOWN);
    func(types, scopes, "frozenset", frozenset_any);

    // functions
    func(types, scopes, "len", INT);
    func(types, scopes, "abs", INT);
    func(types, scopes, "print", NONE);
    let range_ret = types.list_of(INT);
    func(types, scopes, "range", range_ret);
    func(types, scopes, "isinstance", BOOL);
    func(types, scopes, "issubclass", BOOL);
    func(types, scopes, "hasattr", BOOL);
    func(types, scopes, "callable", BOOL);
    func(types, scopes, "any", BOOL);
    func(types, scopes, "all", BOOL);
    func(types, scopes, "repr", STR);
    func(types, scopes, "format", STR);
    func(types, scopes, "input", STR);
    func(types, scopes, "chr", STR);
    func(types, scopes, "hex", STR);
    func(types, scopes, "oct", STR);
    func(types, scopes, "bin", STR);
    func(types, scopes, "ascii", STR);
    func(types, scopes, "ord", INT);
    func(types, scopes, "id", INT);
    func(types, scopes, "hash", INT);
    func(types, scopes, "round", INT);
    func(types, scopes, "sum", INT);
    func(types, scopes, "pow", INT);
    let divmod_ret = types.tuple_of([INT, INT]);
    func(types, scopes, "divmod", divmod_ret);
    let sorted_ret = types.list_of(UNKNOWN);
    func(types, scopes, "sorted", sorted_ret);
    let reversed_ret = types.list_of(UNKNOWN);
    func(types, scopes, "reversed", reversed_ret);
    let enumerate_inner = types.tuple_of([INT, UNKNOWN]);
    let enumerate_ret = types.list_of(enumerate_inner);
    func(types, scopes, "enumerate", enumerate_ret);
    let zip_ret = types.list_of(UNKNOWN);
    func(types, scopes, "zip", zip_ret);
    let map_ret = types.list_of(UNKNOWN);
    func(types, scopes, "map", map_ret);
    let filter_ret = types.list_of(UNKNOWN);
    func(types, scopes, "filter", filter_ret);
    func(types, scopes, "iter", UNKNOWN);
    func(types, scopes, "next", UNKNOWN);
    func(types, scopes, "getattr", UNKNOWN);
    func(types, scopes, "setattr", NONE);
    func(types, scopes, "delattr", NONE);
    func(types, scopes, "vars", dict_any);
    let globals_ret = types.dict_of(STR, UNKNOWN);
    func(types, scopes, "globals", globals_ret);
    let locals_ret = types.dict_of(STR, UNKNOWN);
    func(types, scopes, "locals", locals_ret);
    func(types, scopes, "open", UNKNOWN);
    func(types, scopes, "super", UNKNOWN);
    func(types, scopes, "type", UNKNOWN);
    func(types, scopes, "min", UNKNOWN);
    func(types, scopes, "max", UNKNOWN);
    let dir_ret = types.list_of(STR);
    func(types, scopes, "dir", dir_ret);

    // common exception classes
    for name in [
        "BaseException",
        "Exception",
        "ValueError",
        "TypeError",
        "KeyError",
        "IndexError",
        "AttributeError",
        "RuntimeError",
        "NotImplementedError",
        "StopIteration",
        "ZeroDivisionError",
        "OSError",
        "IOError",
        "FileNotFoundError",
        "KeyboardInterrupt",
    ] {
        let scope = scopes.new_scope(Some(root), ScopeKind::Class, name.to_owned());
        let (_, ty) = types.alloc_class(ClassData {
            name: name.to_owned(),
            qname: name.to_owned(),
            def: None,
            scope,
            bases: Vec::new(),
        });
        let id = scopes.insert(types, root, name, None, "<builtin>", 0, 0, ty, BindingKind::Class);
        let binding = scopes.binding_mut(id);
        binding.builtin = true;
        binding.url = Some(format!(
            "https://docs.python.org/3/library/exceptions.html#{name}"
        ));
    }

    install_module(types, scopes, root, "sys", |types, scopes, module| {
        let argv = types.list_of(STR);
        attr(types, scopes, module, "argv", argv);
        let path = types.list_of(STR);
        attr(types, scopes, module, "path", path);
        attr(types, scopes, module, "version", STR);
        attr(types, scopes, module, "platform", STR);
        attr(types, scopes, module, "maxsize", INT);
        module_func(types, scopes, root, module, "exit", NONE);
    });
    install_module(types, scopes, root, "os", |types, scopes, module| {
        attr(types, scopes, module, "sep", STR);
        attr(types, scopes, module, "linesep", STR);
        attr(types, scopes, module, "name", STR);
        let environ = types.dict_of(STR, STR);
        attr(types, scopes, module, "environ", environ);
        module_func(types, scopes, root, module, "getcwd", STR);
        let listdir_ret = types.list_of(STR);
        module_func(types, scopes, root, module, "listdir", listdir_ret);
    });
    install_module(types, scopes, root, "math", |types, scopes, module| {
        attr(types, scopes, module, "pi", FLOAT);
        attr(types, scopes, module, "e", FLOAT);
        attr(types, scopes, module, "tau", FLOAT);
        attr(types, scopes, module, "inf", FLOAT);
        attr(types, scopes, module, "nan", FLOAT);
        module_func(types, scopes, root, module, "sqrt", FLOAT);
        module_func(types, scopes, root, module, "floor", INT);
        module_func(types, scopes, root, module, "ceil", INT);
        module_func(types, scopes, root, module, "pow", FLOAT);
        module_func(types, scopes, root, module, "log", FLOAT);
    });

    root
}

fn attr(types: &mut TypePool, scopes: &mut ScopePool, module: ScopeId, name: &str, ty: TypeId) {
    let id = scopes.insert(types, module, name, None, "<builtin>", 0, 0, ty, BindingKind::Attribute);
    scopes.binding_mut(id).builtin = true;
}

fn module_func(
    types: &mut TypePool,
    scopes: &mut ScopePool,
    root: ScopeId,
    module: ScopeId,
    name: &str,
    ret: TypeId,
) {
    let (_, ty) = types.alloc_fun(FunctionData {
        name: name.to_owned(),
        qname: name.to_owned(),
        def: None,
        env: root,
        defaults: Vec::new(),
        ret: Some(ret),
        cache: Vec::new(),
        called: true,
        is_lambda: false,
    });
    let id = scopes.insert(types, module, name, None, "<builtin>", 0, 0, ty, BindingKind::Function);
    scopes.binding_mut(id).builtin = true;
}

fn install_module(
    types: &mut TypePool,
    scopes: &mut ScopePool,
    root: ScopeId,
    name: &str,
    fill: impl FnOnce(&mut TypePool, &mut ScopePool, ScopeId),
) {
    let module_scope = scopes.new_scope(Some(root), ScopeKind::Module, name.to_owned());
    fill(types, scopes, module_scope);
    let ty = types.alloc(TypeKind::Module {
        scope: module_scope,
        file: format!("<builtin:{name}>"),
        qname: name.to_owned(),
    });
    let id = scopes.insert(types, root, name, None, "<builtin>", 0, 0, ty, BindingKind::Module);
    let binding = scopes.binding_mut(id);
    binding.builtin = true;
    binding.url = Some(format!("https://docs.python.org/3/library/{name}.html"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_core_builtins() {
        let mut types = TypePool::new();
        let mut scopes = ScopePool::new();
        let root = install(&mut types, &mut scopes);
        for name in ["len", "print", "range", "isinstance", "ValueError", "sys", "math"] {
            let list = scopes.lookup(root, name).unwrap_or_else(|| panic!("missing builtin {name}"));
            assert!(scopes.binding(list[0]).builtin, "{name} must be marked builtin");
        }
        let len_ty = scopes.lookup(root, "len").expect("len")[0];
        assert!(types.is_function(scopes.binding(len_ty).ty));
    }

    #[test]
    fn builtin_modules_expose_attributes() {
        let mut types = TypePool::new();
        let mut scopes = ScopePool::new();
        let root = install(&mut types, &mut scopes);
        let sys = scopes.lookup(root, "sys").expect("sys module")[0];
        let TypeKind::Module { scope, .. } = types.kind(scopes.binding(sys).ty) else {
            panic!("sys must be a module type");
        };
        assert!(scopes.lookup_attr(*scope, "argv").is_some());
        // attribute lookup must not walk out of the module table
        assert!(scopes.lookup_attr(*scope, "len").is_none());
    }
}
