//! Patch errors.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// The name cannot be redirected without changing what it does, e.g.
    /// builtins that inspect the calling frame (`func_get_args`,
    /// `compact`).
    #[error("`{name}` cannot be patched")]
    UnsupportedPatchTarget { name: String },
}
