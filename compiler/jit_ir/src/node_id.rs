//! Node ids.

use std::fmt;

/// Index into a [`NodeTree`](crate::NodeTree) arena.
///
/// Ids are only meaningful for the tree that issued them. No tree ever
/// holds ids of another.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// The root of every tree.
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub const fn new(index: usize) -> Self {
        NodeId(index)
    }

    /// Index into the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}
