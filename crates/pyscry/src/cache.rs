//! Process-lifetime AST cache with an optional on-disk layer.
//!
//! The in-memory map is authoritative: a hit returns immediately, including
//! hits on the null sentinel left behind by a failed parse. On a miss the
//! disk layer is consulted, keyed by the SHA-1 of the source bytes, so files
//! with identical content share one cache entry regardless of path. Cache
//! I/O failures are logged and treated as misses, never propagated.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use ahash::AHashMap;
use log::{debug, warn};

use crate::{
    nodes::ModuleAst,
    parse::{parse_source, sha1_hex},
};

/// Internal cache I/O failure; logged and downgraded to a miss.
#[derive(Debug, thiserror::Error)]
enum CacheError {
    #[error("cache read failed: {0}")]
    Read(#[from] std::io::Error),
    #[error("cache entry corrupt: {0}")]
    Decode(#[from] postcard::Error),
}

/// Memoizing AST loader.
#[derive(Debug, Default)]
pub struct AstCache {
    mem: AHashMap<String, Option<Arc<ModuleAst>>>,
    cache_dir: Option<PathBuf>,
    /// Parse/read failures since the last drain, for file-level diagnostics.
    errors: Vec<(String, String)>,
}

impl AstCache {
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = &cache_dir
            && let Err(err) = fs::create_dir_all(dir)
        {
            warn!("could not create cache dir {}: {err}", dir.display());
        }
        Self {
            mem: AHashMap::new(),
            cache_dir,
            errors: Vec::new(),
        }
    }

    /// Loads the AST for `path`, reading the source from disk.
    ///
    /// Returns None for unreadable or unparsable files; the failure is
    /// remembered so repeated loads stay cheap, and the message is queued
    /// for [`AstCache::take_errors`].
    pub fn get(&mut self, path: &str) -> Option<Arc<ModuleAst>> {
        if let Some(hit) = self.mem.get(path) {
            return hit.clone();
        }
        let code = match fs::read_to_string(path) {
            Ok(code) => code,
            Err(err) => {
                self.errors.push((path.to_owned(), format!("cannot read {path}: {err}")));
                self.mem.insert(path.to_owned(), None);
                return None;
            }
        };
        self.get_with_source(path, &code)
    }

    /// Loads the AST for in-memory source. Entry point for injected modules.
    pub fn get_with_source(&mut self, path: &str, code: &str) -> Option<Arc<ModuleAst>> {
        if let Some(hit) = self.mem.get(path) {
            return hit.clone();
        }
        let sha = sha1_hex(code.as_bytes());
        if let Some(mut ast) = self.load_disk(path, &sha) {
            debug!("ast cache disk hit for {path}");
            ast.set_file(path);
            let arc = Arc::new(ast);
            self.mem.insert(path.to_owned(), Some(arc.clone()));
            return Some(arc);
        }
        match parse_source(code, path) {
            Ok(ast) => {
                self.store_disk(path, &sha, &ast);
                let arc = Arc::new(ast);
                self.mem.insert(path.to_owned(), Some(arc.clone()));
                Some(arc)
            }
            Err(err) => {
                self.errors.push((path.to_owned(), err.to_string()));
                self.mem.insert(path.to_owned(), None);
                None
            }
        }
    }

    /// Drains the queued parse/read failures as (path, message) pairs.
    pub fn take_errors(&mut self) -> Vec<(String, String)> {
        std::mem::take(&mut self.errors)
    }

    fn entry_path(&self, path: &str, sha: &str) -> Option<PathBuf> {
        let dir = self.cache_dir.as_ref()?;
        let basename = Path::new(path)
            .file_stem()
            .map_or_else(|| "module".to_owned(), |s| s.to_string_lossy().into_owned());
        Some(dir.join(format!("{basename}.{sha}.ast")))
    }

    fn load_disk(&self, path: &str, sha: &str) -> Option<ModuleAst> {
        let entry = self.entry_path(path, sha)?;
        if !entry.exists() {
            return None;
        }
        match self.try_load(&entry) {
            Ok(ast) => Some(ast),
            Err(err) => {
                warn!("dropping cache entry {}: {err}", entry.display());
                None
            }
        }
    }

    fn try_load(&self, entry: &Path) -> Result<ModuleAst, CacheError> {
        let bytes = fs::read(entry)?;
        Ok(postcard::from_bytes(&bytes)?)
    }

    fn store_disk(&self, path: &str, sha: &str, ast: &ModuleAst) {
        let Some(entry) = self.entry_path(path, sha) else {
            return;
        };
        match postcard::to_allocvec(ast) {
            Ok(bytes) => {
                if let Err(err) = fs::write(&entry, bytes) {
                    warn!("could not write cache entry {}: {err}", entry.display());
                }
            }
            Err(err) => warn!("could not serialize {path}: {err}"),
        }
    }

    /// Releases the cache: the in-memory map is dropped and the disk
    /// directory is cleared. Callers that want cross-run persistence must
    /// not call this.
    pub fn close(&mut self) {
        self.mem.clear();
        self.errors.clear();
        if let Some(dir) = &self.cache_dir {
            match fs::read_dir(dir) {
                Ok(entries) => {
                    for entry in entries.flatten() {
                        if entry.path().extension().is_some_and(|e| e == "ast")
                            && let Err(err) = fs::remove_file(entry.path())
                        {
                            warn!("could not remove {}: {err}", entry.path().display());
                        }
                    }
                }
                Err(err) => warn!("could not clear cache dir {}: {err}", dir.display()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serialized_tree_round_trips() {
        let ast = parse_source("def f(a, b=2):\n    return a + b\n", "m.py").expect("parse");
        let bytes = postcard::to_allocvec(&ast).expect("serialize");
        let mut back: ModuleAst = postcard::from_bytes(&bytes).expect("deserialize");
        back.set_file("elsewhere.py");
        assert_eq!(back.sha1(), ast.sha1());
        assert_eq!(back.len(), ast.len());
        for id in ast.iter_ids() {
            assert_eq!(back.node(id), ast.node(id), "node {id} differs after round trip");
        }
    }

    #[test]
    fn identical_content_shares_disk_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cache = AstCache::new(Some(dir.path().to_path_buf()));
        let code = "x = 1\n";
        let a = cache.get_with_source("one/mod.py", code).expect("parse a");
        let b = cache.get_with_source("two/mod.py", code).expect("parse b");
        // one .ast file on disk, two distinct module identities in memory
        let entries: Vec<_> = fs::read_dir(dir.path()).expect("read dir").flatten().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(a.file(), "one/mod.py");
        assert_eq!(b.file(), "two/mod.py");
        assert_eq!(a.sha1(), b.sha1());
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn null_sentinel_is_memoized() {
        let mut cache = AstCache::new(None);
        assert!(cache.get_with_source("bad.py", "def f(:\n").is_none());
        assert_eq!(cache.take_errors().len(), 1);
        // the second load hits the sentinel and queues no new error
        assert!(cache.get_with_source("bad.py", "def f(:\n").is_none());
        assert!(cache.take_errors().is_empty());
    }

    #[test]
    fn close_clears_disk_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cache = AstCache::new(Some(dir.path().to_path_buf()));
        cache.get_with_source("m.py", "x = 1\n").expect("parse");
        cache.close();
        let remaining: Vec<_> = fs::read_dir(dir.path()).expect("read dir").flatten().collect();
        assert!(remaining.is_empty(), "close() must clear the cache dir");
    }
}
