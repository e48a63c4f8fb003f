//! JIT IR - concrete node tree for source rewriting.
//!
//! This crate contains the structural model shared by the parser, the
//! unparser and every patcher:
//! - [`NodeId`]: index into the tree arena
//! - [`Node`]: a source fragment (`body`, `close`) plus ordered children
//! - [`NodeTree`]: arena owning every node of one parsed file
//!
//! # Design Philosophy
//!
//! - **Concrete, not abstract**: every byte of the source lives in exactly
//!   one node fragment, so a depth-first concatenation reproduces the file.
//! - **Flat storage**: nodes refer to each other through [`NodeId`]
//!   indices. Parent, namespace and function links are plain ids and never
//!   own anything.
//! - **Mutable in place**: patchers rewrite fragments and splice children
//!   directly; the tree lives for one patch-and-cache cycle.

mod node;
mod node_id;
mod tree;

pub use node::{ClassKind, LineContent, Lines, LiteralKind, Node, NodeFlags, NodeKind, Param};
pub use node_id::NodeId;
pub use tree::{NodeTree, Preorder};

/// Alias table of a `use` scope (`alias -> fully qualified name`).
pub type UseMap = rustc_hash::FxHashMap<String, String>;
