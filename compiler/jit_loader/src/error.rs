//! Loader errors.

use std::io;
use std::path::PathBuf;

use jit_parse::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    /// The cache directory or a cache entry could not be written.
    #[error("cannot write cache entry {path}: {source}")]
    CacheWrite { path: PathBuf, source: io::Error },

    /// A source file could not be read.
    #[error("cannot read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    /// The source is structurally broken; nothing was patched or cached.
    #[error("cannot patch {path}: {source}")]
    Parse { path: PathBuf, source: ParseError },

    /// Cache metadata could not be encoded.
    #[error("cache metadata: {0}")]
    Meta(String),
}
