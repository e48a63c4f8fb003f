//! JIT Patch - tree patchers for source instrumentation.
//!
//! A [`Patcher`] mutates a parsed [`NodeTree`] in place. [`Patchers`] is the
//! ordered, named chain the class loader runs over every intercepted file:
//! parse, run each patcher, unparse.
//!
//! Available patchers:
//! - [`Pointcut`]: method-entry hook for stubbing and call logging
//! - [`Monkey`]: indirection for global function and class references
//! - [`FinalClass`]: strips `final` so test doubles can extend
//! - [`Quit`]: routes `exit`/`die` through an interceptable hook
//! - [`Rebase`]: freezes `__DIR__`/`__FILE__` to the original location
//! - [`Isolator`]: keeps only function declarations and imports
//!
//! Patchers only touch what they mean to rewrite. Everything else, and every
//! node they cannot make sense of, is left byte-for-byte as parsed.

mod chain;
mod error;
mod final_class;
mod fragment;
mod isolator;
mod monkey;
mod pointcut;
mod quit;
mod rebase;

use std::path::{Path, PathBuf};

use jit_ir::NodeTree;

pub use chain::Patchers;
pub use error::PatchError;
pub use final_class::FinalClass;
pub use isolator::Isolator;
pub use monkey::{Monkey, MonkeyOptions, Substitutions};
pub use pointcut::{Pointcut, PointcutOptions};
pub use quit::{Quit, QuitOptions};
pub use rebase::Rebase;

/// A tree-to-tree rewrite.
///
/// `process` runs once per file. Implementations may keep counters across
/// a run but must reset them at the start of every call.
pub trait Patcher {
    /// Rewrite `tree` in place. `file` is the original path, when known.
    fn process(&mut self, tree: &mut NodeTree, file: Option<&Path>);

    /// Choose the file to load for `class`, given the autoloader's pick.
    fn find_file(&self, _class: &str, resolved: &Path) -> PathBuf {
        resolved.to_path_buf()
    }

    /// Whether the file defining `class` should go through this patcher.
    fn patchable(&self, _class: &str) -> bool {
        true
    }
}
