//! Interceptor configuration.

use std::path::PathBuf;

/// Environment variable overriding [`InterceptorConfig::cache_dir`].
pub const CACHE_DIR_ENV: &str = "JIT_CACHE_DIR";

#[derive(Clone, Debug)]
pub struct InterceptorConfig {
    /// Root of the patched-file mirror.
    pub cache_dir: PathBuf,
    /// Class-name prefixes to patch. Empty means every class.
    pub include: Vec<String>,
    /// Class-name prefixes never patched. Wins over `include`.
    pub exclude: Vec<String>,
    /// Extra files whose modification invalidates every cache entry.
    pub watch: Vec<PathBuf>,
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        InterceptorConfig {
            cache_dir: std::env::temp_dir().join("jit-cache"),
            include: Vec::new(),
            exclude: Vec::new(),
            watch: Vec::new(),
        }
    }
}

impl InterceptorConfig {
    /// Defaults, with the cache directory taken from `JIT_CACHE_DIR` when set.
    pub fn from_env() -> Self {
        let mut config = InterceptorConfig::default();
        if let Some(dir) = std::env::var_os(CACHE_DIR_ENV).filter(|d| !d.is_empty()) {
            config.cache_dir = PathBuf::from(dir);
        }
        config
    }

    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    #[must_use]
    pub fn include(mut self, prefix: impl Into<String>) -> Self {
        self.include.push(prefix.into());
        self
    }

    #[must_use]
    pub fn exclude(mut self, prefix: impl Into<String>) -> Self {
        self.exclude.push(prefix.into());
        self
    }

    #[must_use]
    pub fn watch(mut self, path: impl Into<PathBuf>) -> Self {
        self.watch.push(path.into());
        self
    }

    /// Whether the include/exclude prefixes admit `class`.
    pub fn admits(&self, class: &str) -> bool {
        let class = class.trim_start_matches('\\');
        let under = |prefix: &String| class.starts_with(prefix.trim_start_matches('\\'));
        if self.exclude.iter().any(under) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(under)
    }
}
