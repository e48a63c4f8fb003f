//! Stack growth guard for deep recursion.
//!
//! The unparser walks the node tree recursively, one level per nested
//! namespace, class and function body. Generated PHP (closures inside
//! closures) can nest far past the default thread stack, so every
//! recursive step goes through [`ensure_sufficient_stack`].
//!
//! # Platform Support
//!
//! - **Native targets**: `stacker` grows the stack on demand.
//! - **WASM targets**: no-op passthrough.

/// Minimum stack space to keep available (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Ensure sufficient stack space is available before executing `f`.
///
/// ```text
/// fn unparse_node(tree: &NodeTree, id: NodeId, out: &mut String) {
///     ensure_sufficient_stack(|| {
///         for &child in tree.children(id) {
///             unparse_node(tree, child, out);
///         }
///     })
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - just call directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
