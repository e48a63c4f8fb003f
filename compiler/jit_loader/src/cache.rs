//! Patched-file cache.
//!
//! # Directory structure
//!
//! ```text
//! <cache_dir>/
//! └── <absolute source path>/
//!     ├── file.php        # patched text
//!     └── file.php.meta   # bincode-encoded CacheMeta
//! ```
//!
//! An entry is fresh when the patched file is not older than its source
//! (nor than any watched file) and its metadata carries the current key.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::LoaderError;

/// Sidecar stored next to every cached file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CacheMeta {
    /// Identifies the patcher set that produced the entry.
    key: String,
    /// Original location, for diagnostics.
    source: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PatchCache {
    dir: PathBuf,
    watch: Vec<PathBuf>,
}

impl PatchCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        PatchCache {
            dir: dir.into(),
            watch: Vec::new(),
        }
    }

    /// Also treat entries older than any of `watch` as stale.
    #[must_use]
    pub fn with_watch(mut self, watch: Vec<PathBuf>) -> Self {
        self.watch = watch;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the patched copy of `source` lives.
    pub fn cache_path(&self, source: &Path) -> PathBuf {
        let mut path = self.dir.clone();
        for component in source.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::Prefix(prefix) => {
                    path.push(prefix.as_os_str().to_string_lossy().replace(':', ""));
                }
                Component::ParentDir => path.push("__"),
                Component::RootDir | Component::CurDir => {}
            }
        }
        path
    }

    /// Cached text for `source`, if fresh and produced under `key`.
    pub fn get(&self, source: &Path, key: &str) -> Option<String> {
        let cached = self.cache_path(source);
        let cached_at = modified(&cached)?;
        if modified(source).is_some_and(|t| t > cached_at) {
            trace!(path = %source.display(), "cache stale");
            return None;
        }
        if self
            .watch
            .iter()
            .any(|w| modified(w).is_some_and(|t| t > cached_at))
        {
            trace!(path = %source.display(), "cache invalidated by watched file");
            return None;
        }
        let meta: CacheMeta = bincode::deserialize(&fs::read(meta_path(&cached)).ok()?).ok()?;
        if meta.key != key {
            trace!(path = %source.display(), cached = %meta.key, key, "cache key mismatch");
            return None;
        }
        fs::read_to_string(&cached).ok()
    }

    /// Store `text` as the patched copy of `source`.
    pub fn put(&self, source: &Path, key: &str, text: &str) -> Result<PathBuf, LoaderError> {
        let cached = self.cache_path(source);
        if let Some(parent) = cached.parent() {
            fs::create_dir_all(parent).map_err(|e| LoaderError::CacheWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let meta = CacheMeta {
            key: key.to_string(),
            source: source.to_path_buf(),
        };
        let encoded = bincode::serialize(&meta).map_err(|e| LoaderError::Meta(e.to_string()))?;
        let meta_file = meta_path(&cached);
        fs::write(&meta_file, encoded).map_err(|e| LoaderError::CacheWrite {
            path: meta_file,
            source: e,
        })?;
        fs::write(&cached, text).map_err(|e| LoaderError::CacheWrite {
            path: cached.clone(),
            source: e,
        })?;
        debug!(path = %cached.display(), bytes = text.len(), "cached");
        Ok(cached)
    }

    /// Remove every entry.
    pub fn clear(&self) -> Result<(), LoaderError> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir).map_err(|e| LoaderError::Io {
                path: self.dir.clone(),
                source: e,
            })?;
        }
        Ok(())
    }
}

fn meta_path(cached: &Path) -> PathBuf {
    let mut path = cached.as_os_str().to_owned();
    path.push(".meta");
    PathBuf::from(path)
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
