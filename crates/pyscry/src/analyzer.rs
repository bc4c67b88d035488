//! The analyzer: one explicit context struct owning every pool, the module
//! registry, the call stack, the uncalled-function set, the diagnostics map
//! and the reference index.
//!
//! There is deliberately no process-global instance; test suites create as
//! many fresh analyzers as they like.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use ahash::AHashMap;
use indexmap::{IndexMap, IndexSet};
use log::{debug, info};

use crate::{
    builtins,
    cache::AstCache,
    nodes::{ModuleAst, ModuleId, NodeId, NodeKind, NodeRef},
    scopes::{Binding, BindingId, BindingKind, Ref, ScopeId, ScopeKind, ScopePool},
    types::{FunId, TypeId, TypePool, UNKNOWN},
};

/// Analyzer configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Directory for the on-disk AST cache; None disables the disk layer.
    pub cache_dir: Option<PathBuf>,
    pub quiet: bool,
    pub debug: bool,
}

/// A recoverable problem attached to a node or a whole file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: String,
    pub start: u32,
    pub end: u32,
    pub message: String,
}

/// Where a diagnostic is anchored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProblemKey {
    Node(NodeRef),
    File(String),
}

/// A module registered with the analyzer.
#[derive(Debug, Clone)]
pub struct LoadedModule {
    pub ast: Arc<ModuleAst>,
    pub scope: ScopeId,
    pub ty: TypeId,
    pub file: String,
    pub qname: String,
}

/// Transform context: which module arena the node ids below refer to.
#[derive(Debug, Clone)]
pub(crate) struct Cx {
    pub ast: Arc<ModuleAst>,
    pub module: ModuleId,
}

impl Cx {
    pub fn node_ref(&self, node: NodeId) -> NodeRef {
        NodeRef::new(self.module, node)
    }
}

/// The whole-program analyzer.
pub struct Analyzer {
    pub(crate) types: TypePool,
    pub(crate) scopes: ScopePool,
    /// Root GLOBAL scope holding the builtin environment.
    pub(crate) builtins: ScopeId,
    /// Scope keyed by qualified module name, holding one MODULE binding per
    /// loaded module.
    pub(crate) module_table: ScopeId,
    modules: Vec<LoadedModule>,
    module_by_file: AHashMap<String, ModuleId>,
    /// Call-site nodes currently being applied; the recursion cycle guard.
    pub(crate) call_stack: Vec<NodeRef>,
    /// Functions defined but not yet invoked; applied with Unknown arguments
    /// by [`Analyzer::finish`].
    pub(crate) uncalled: IndexSet<FunId>,
    problems: IndexMap<ProblemKey, Vec<Diagnostic>>,
    references: IndexMap<Ref, Vec<BindingId>>,
    cache: AstCache,
    pub(crate) config: Config,
    root_dir: Option<PathBuf>,
    pub(crate) lambda_counter: u32,
}

impl Analyzer {
    pub fn new(config: Config) -> Self {
        let mut types = TypePool::new();
        let mut scopes = ScopePool::new();
        let builtins = builtins::install(&mut types, &mut scopes);
        let module_table = scopes.new_scope(None, ScopeKind::Global, String::new());
        let cache = AstCache::new(config.cache_dir.clone());
        Self {
            types,
            scopes,
            builtins,
            module_table,
            modules: Vec::new(),
            module_by_file: AHashMap::new(),
            call_stack: Vec::new(),
            uncalled: IndexSet::new(),
            problems: IndexMap::new(),
            references: IndexMap::new(),
            cache,
            config,
            root_dir: None,
            lambda_counter: 0,
        }
    }

    /// Analyzes a file or a directory tree of `.py` files. Files are visited
    /// in sorted order so qualified names come out deterministic.
    pub fn analyze(&mut self, path: &Path) {
        self.root_dir = Some(if path.is_dir() {
            path.to_path_buf()
        } else {
            path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        });
        let mut files: Vec<PathBuf> = if path.is_dir() {
            walkdir::WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| e.path().to_path_buf())
                .filter(|p| p.extension().is_some_and(|ext| ext == "py"))
                .collect()
        } else {
            vec![path.to_path_buf()]
        };
        files.sort();
        for file in files {
            self.load_file(&file.to_string_lossy());
        }
    }

    /// Returns the already-loaded module for `path`, or loads and transforms
    /// it. None means the file could not be read or parsed.
    pub fn load_file(&mut self, path: &str) -> Option<TypeId> {
        if let Some(&mid) = self.module_by_file.get(path) {
            return Some(self.modules[mid.index()].ty);
        }
        let ast = self.cache.get(path);
        self.drain_cache_errors();
        let ast = ast?;
        Some(self.register_module(path, ast))
    }

    /// Injects a module from in-memory source; the test and embedding entry
    /// point. The path only names the module, nothing is read from disk.
    pub fn load_source(&mut self, path: &str, code: &str) -> Option<TypeId> {
        if let Some(&mid) = self.module_by_file.get(path) {
            return Some(self.modules[mid.index()].ty);
        }
        let ast = self.cache.get_with_source(path, code);
        self.drain_cache_errors();
        let ast = ast?;
        Some(self.register_module(path, ast))
    }

    fn drain_cache_errors(&mut self) {
        for (file, message) in self.cache.take_errors() {
            log::warn!("{message}");
            self.problems.entry(ProblemKey::File(file.clone())).or_default().push(Diagnostic {
                file,
                start: 0,
                end: 0,
                message,
            });
        }
    }

    fn register_module(&mut self, path: &str, ast: Arc<ModuleAst>) -> TypeId {
        let qname = self.module_qname(path);
        debug!("analyzing module {qname} ({path})");
        let scope = self.scopes.new_scope(Some(self.builtins), ScopeKind::Module, qname.clone());
        let ty = self.types.alloc(crate::types::TypeKind::Module {
            scope,
            file: path.to_owned(),
            qname: qname.clone(),
        });
        let mid = ModuleId::new(self.modules.len());
        self.modules.push(LoadedModule {
            ast: ast.clone(),
            scope,
            ty,
            file: path.to_owned(),
            qname: qname.clone(),
        });
        self.module_by_file.insert(path.to_owned(), mid);

        let root = ast.root();
        let root_node = ast.node(root);
        let (root_start, root_length) = (root_node.start, root_node.length());
        let binding = self.scopes.insert(
            &mut self.types,
            self.module_table,
            &qname,
            Some(NodeRef::new(mid, root)),
            path,
            root_start,
            root_length,
            ty,
            BindingKind::Module,
        );
        let cx = Cx { ast: ast.clone(), module: mid };
        let NodeKind::Module { body } = ast.kind(root) else {
            panic!("module root must be a Module node");
        };
        if let Some(doc) = ast.doc_string(body) {
            self.scopes.binding_mut(binding).doc = Some(doc);
        }
        let body = body.clone();
        self.transform_block(&cx, &body, scope);
        ty
    }

    /// Dotted qualified name for a module path, relative to the analysis
    /// root when one is set.
    fn module_qname(&self, path: &str) -> String {
        let p = Path::new(path);
        let rel = self
            .root_dir
            .as_ref()
            .and_then(|root| p.strip_prefix(root).ok())
            .unwrap_or(p);
        let mut segments: Vec<String> = rel
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .filter(|s| !s.is_empty() && s != "." && s != ".." && s != "/")
            .collect();
        if segments.last().is_some_and(|s| s == "__init__") {
            segments.pop();
        }
        if segments.is_empty() {
            "module".to_owned()
        } else {
            segments.join(".")
        }
    }

    pub(crate) fn module(&self, id: ModuleId) -> &LoadedModule {
        &self.modules[id.index()]
    }

    pub(crate) fn module_cx(&self, id: ModuleId) -> Cx {
        Cx {
            ast: self.modules[id.index()].ast.clone(),
            module: id,
        }
    }

    /// Finishes the analysis: applies every function that was defined but
    /// never invoked (with Unknown arguments, recovering bindings that are
    /// only reached through indirect dispatch), then builds the reference
    /// index by inverting every binding's ref set.
    pub fn finish(&mut self) {
        while let Some(&fid) = self.uncalled.first() {
            self.uncalled.shift_remove(&fid);
            self.apply_uncalled(fid);
        }

        self.references.clear();
        for (bid, binding) in self.scopes.iter_bindings() {
            for r in &binding.refs {
                self.references.entry(r.clone()).or_default().push(bid);
            }
        }
        if !self.config.quiet {
            info!(
                "analysis finished: {} modules, {} bindings, {} references, {} problems",
                self.modules.len(),
                self.scopes.binding_count(),
                self.references.len(),
                self.problems.values().map(Vec::len).sum::<usize>(),
            );
        }
    }

    fn apply_uncalled(&mut self, fid: FunId) {
        let fun = self.types.fun(fid).clone();
        let Some(def) = fun.def else {
            return;
        };
        let cx = self.module_cx(def.module);
        let NodeKind::FunctionDef { args, .. } = cx.ast.kind(def.node) else {
            return;
        };
        let nargs = args.len();
        debug!("applying uncalled function {} with {nargs} unknown arguments", fun.qname);
        let call_args = crate::transform::CallArgs {
            pos: vec![UNKNOWN; nargs],
            ..Default::default()
        };
        self.apply_function(fid, &call_args, None, None, None);
    }

    /// Releases the AST cache (clearing its disk directory). Analysis
    /// results stay valid; only re-parsing becomes necessary again.
    pub fn close(&mut self) {
        self.cache.close();
    }

    // --- query surface -----------------------------------------------------

    pub fn get_ast_for_file(&self, path: &str) -> Option<Arc<ModuleAst>> {
        let mid = self.module_by_file.get(path)?;
        Some(self.modules[mid.index()].ast.clone())
    }

    pub fn get_all_bindings(&self) -> impl Iterator<Item = &Binding> {
        self.scopes.iter_bindings().map(|(_, b)| b)
    }

    /// The reference index: every observed reference, with the bindings it
    /// resolves to. Populated by [`Analyzer::finish`].
    pub fn get_references(&self) -> &IndexMap<Ref, Vec<BindingId>> {
        &self.references
    }

    pub fn get_problems(&self) -> &IndexMap<ProblemKey, Vec<Diagnostic>> {
        &self.problems
    }

    /// Records a file-level problem.
    pub fn put_problem(&mut self, file: &str, message: impl Into<String>) {
        self.problems
            .entry(ProblemKey::File(file.to_owned()))
            .or_default()
            .push(Diagnostic {
                file: file.to_owned(),
                start: 0,
                end: 0,
                message: message.into(),
            });
    }

    /// Records a problem anchored at a node of an already-loaded module.
    /// This is the post-analysis entry point for collaborators (linkers,
    /// stylers) that annotate nodes they resolved themselves.
    pub fn put_problem_at(&mut self, node: NodeRef, message: impl Into<String>) {
        let module = &self.modules[node.module.index()];
        let file = module.file.clone();
        let n = module.ast.node(node.node);
        let (start, end) = (n.start, n.end);
        self.problems.entry(ProblemKey::Node(node)).or_default().push(Diagnostic {
            file,
            start,
            end,
            message: message.into(),
        });
    }

    /// Records a problem anchored at a node.
    pub(crate) fn put_problem_node(&mut self, cx: &Cx, node: NodeId, message: impl Into<String>) {
        let n = cx.ast.node(node);
        self.problems
            .entry(ProblemKey::Node(cx.node_ref(node)))
            .or_default()
            .push(Diagnostic {
                file: cx.ast.file().to_owned(),
                start: n.start,
                end: n.end,
                message: message.into(),
            });
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        self.scopes.binding(id)
    }

    /// Convenience lookup by qualified name; first match in creation order.
    pub fn find_binding(&self, qname: &str) -> Option<&Binding> {
        self.get_all_bindings().find(|b| b.qname == qname)
    }

    /// Renders a type in the glossary notation (`Int[1,1]`, `Union{..}`).
    pub fn type_to_string(&self, ty: TypeId) -> String {
        self.types.to_string(ty)
    }

    /// Read access to the type pool, for downstream consumers that inspect
    /// inferred types structurally.
    pub fn type_pool(&self) -> &TypePool {
        &self.types
    }

    /// Read access to the scope/binding pool.
    pub fn scope_pool(&self) -> &ScopePool {
        &self.scopes
    }

    /// The loaded modules in registration order.
    pub fn loaded_modules(&self) -> impl Iterator<Item = &LoadedModule> {
        self.modules.iter()
    }

    pub(crate) fn resolve_import_path(&self, dotted: &str, level: u32, importing_file: &str) -> Option<PathBuf> {
        let parts: Vec<&str> = if dotted.is_empty() {
            Vec::new()
        } else {
            dotted.split('.').collect()
        };
        let mut bases: Vec<PathBuf> = Vec::new();
        if level > 0 {
            let mut dir = Path::new(importing_file).parent().map(Path::to_path_buf)?;
            for _ in 1..level {
                dir = dir.parent()?.to_path_buf();
            }
            bases.push(dir);
        } else {
            if let Some(root) = &self.root_dir {
                bases.push(root.clone());
            }
            if let Some(dir) = Path::new(importing_file).parent() {
                bases.push(dir.to_path_buf());
            }
        }
        for base in bases {
            let mut candidate = base.clone();
            for part in &parts {
                candidate.push(part);
            }
            let as_file = candidate.with_extension("py");
            if as_file.is_file() {
                return Some(as_file);
            }
            let as_pkg = candidate.join("__init__.py");
            if as_pkg.is_file() {
                return Some(as_pkg);
            }
        }
        None
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("modules", &self.modules.len())
            .field("bindings", &self.scopes.binding_count())
            .field("problems", &self.problems.len())
            .finish_non_exhaustive()
    }
}
