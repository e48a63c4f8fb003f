//! Patch-on-load entry point.

use std::fs;
use std::path::{Path, PathBuf};

use jit_patch::Patchers;
use tracing::{debug, trace};

use crate::{InterceptorConfig, LoaderError, PatchCache};

/// Loads class files through the patcher chain and the cache.
#[derive(Debug)]
pub struct Interceptor {
    config: InterceptorConfig,
    patchers: Patchers,
    cache: PatchCache,
}

impl Interceptor {
    pub fn new(config: InterceptorConfig, patchers: Patchers) -> Self {
        let cache = PatchCache::new(config.cache_dir.clone()).with_watch(config.watch.clone());
        Interceptor {
            config,
            patchers,
            cache,
        }
    }

    pub fn config(&self) -> &InterceptorConfig {
        &self.config
    }

    pub fn patchers(&self) -> &Patchers {
        &self.patchers
    }

    /// Mutable chain access. Changing the set of names changes the cache key,
    /// so stale entries are never served.
    pub fn patchers_mut(&mut self) -> &mut Patchers {
        &mut self.patchers
    }

    pub fn cache(&self) -> &PatchCache {
        &self.cache
    }

    /// Key identifying the output of the current patcher chain.
    pub fn cache_key(&self) -> String {
        let names: Vec<&str> = self.patchers.names().collect();
        format!("{}:{}", env!("CARGO_PKG_VERSION"), names.join(","))
    }

    /// Whether the file defining `class` should be patched.
    pub fn allowed(&self, class: &str) -> bool {
        self.config.admits(class) && self.patchers.patchable(class)
    }

    /// File to load for `class`, given the autoloader's pick.
    pub fn find_file(&self, class: &str, resolved: &Path) -> PathBuf {
        self.patchers.find_file(class, resolved)
    }

    /// Patch `source` in memory. `path` is the file it came from, if any.
    pub fn patch_source(&mut self, source: &str, path: Option<&Path>) -> Result<String, LoaderError> {
        self.patchers
            .process(source, path)
            .map_err(|e| LoaderError::Parse {
                path: path.map(Path::to_path_buf).unwrap_or_default(),
                source: e,
            })
    }

    /// Patched text of `path`, from the cache when fresh.
    pub fn load_file(&mut self, path: &Path) -> Result<String, LoaderError> {
        let key = self.cache_key();
        if let Some(text) = self.cache.get(path, &key) {
            trace!(path = %path.display(), "cache hit");
            return Ok(text);
        }
        let source = fs::read_to_string(path).map_err(|e| LoaderError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let patched = self.patch_source(&source, Some(path))?;
        self.cache.put(path, &key, &patched)?;
        debug!(path = %path.display(), "patched and cached");
        Ok(patched)
    }

    /// Text to evaluate for `class`: patched when allowed, raw otherwise.
    pub fn load_class(&mut self, class: &str, resolved: &Path) -> Result<String, LoaderError> {
        let path = self.find_file(class, resolved);
        if !self.allowed(class) {
            trace!(class, "not patchable, loading as is");
            return fs::read_to_string(&path).map_err(|e| LoaderError::Io { path, source: e });
        }
        self.load_file(&path)
    }
}
