//! Node arena.
//!
//! [`NodeTree`] owns every node of one parsed file. Children are stored as
//! id lists; splicing a child in or out keeps the `parent` link in sync.
//! Removed nodes stay in the arena but become unreachable from the root,
//! so ids handed out earlier never dangle.

use std::ops::{Index, IndexMut};

use crate::{Node, NodeFlags, NodeId, NodeKind, UseMap};

/// Arena of nodes rooted at [`NodeId::ROOT`].
#[derive(Clone, Debug)]
pub struct NodeTree {
    nodes: Vec<Node>,
}

impl NodeTree {
    /// A tree holding only an empty root.
    pub fn new() -> Self {
        NodeTree {
            nodes: vec![Node::new(NodeKind::Root)],
        }
    }

    /// Pre-allocate based on token count (roughly one node per 4 tokens).
    pub fn with_capacity(tokens: usize) -> Self {
        let mut nodes = Vec::with_capacity(tokens / 4 + 1);
        nodes.push(Node::new(NodeKind::Root));
        NodeTree { nodes }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of allocated nodes, reachable or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        // The root always exists.
        false
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self[id].children
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self[id].parent
    }

    fn alloc(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        node.parent = Some(parent);
        node.children.clear();
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Append `node` as the last child of `parent`.
    pub fn push_child(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.alloc(parent, node);
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Insert `node` as child number `index` of `parent`.
    ///
    /// `index` is clamped to the child count.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, node: Node) -> NodeId {
        let id = self.alloc(parent, node);
        let children = &mut self.nodes[parent.index()].children;
        let index = index.min(children.len());
        children.insert(index, id);
        id
    }

    /// Detach child number `index` of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, index: usize) -> Option<NodeId> {
        let children = &mut self.nodes[parent.index()].children;
        if index >= children.len() {
            return None;
        }
        let id = children.remove(index);
        self.nodes[id.index()].parent = None;
        Some(id)
    }

    /// Swap child number `index` of `parent` for a fresh `node`.
    ///
    /// Returns the id of the new node, or `None` if there is no such child.
    pub fn replace_child(&mut self, parent: NodeId, index: usize, node: Node) -> Option<NodeId> {
        let old = *self.nodes[parent.index()].children.get(index)?;
        let id = self.alloc(parent, node);
        self.nodes[parent.index()].children[index] = id;
        self.nodes[old.index()].parent = None;
        Some(id)
    }

    /// Position of `child` among its parent's children.
    pub fn child_index(&self, child: NodeId) -> Option<usize> {
        let parent = self.parent(child)?;
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Depth-first, source-order walk of the subtree rooted at `id`.
    pub fn preorder(&self, id: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![id],
        }
    }

    /// Nearest enclosing class-like node.
    pub fn enclosing_class(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id).find(|&a| self[a].kind.is_class_like())
    }

    /// Import aliases visible from `id`.
    ///
    /// Namespace nodes carry their own table. Files without a namespace
    /// keep theirs on the root.
    pub fn uses_for(&self, id: NodeId) -> &UseMap {
        let scope = if self[id].kind == NodeKind::Namespace {
            id
        } else {
            self[id].namespace.unwrap_or(NodeId::ROOT)
        };
        &self[scope].uses
    }

    /// Name of the enclosing namespace, empty at global scope.
    pub fn namespace_name(&self, id: NodeId) -> &str {
        match self[id].namespace {
            Some(ns) => &self[ns].name,
            None => "",
        }
    }

    /// Fully qualified display name: `Ns\Class::method`, `Ns\function`,
    /// `Ns\Class`.
    ///
    /// Anonymous nodes render as `{closure}` / `class@anonymous`.
    pub fn qualified_name(&self, id: NodeId) -> String {
        let node = &self[id];
        let own = match node.kind {
            NodeKind::Function if node.has(NodeFlags::CLOSURE) => "{closure}",
            NodeKind::Class(_) if node.name.is_empty() => "class@anonymous",
            _ => node.name.as_str(),
        };
        let ns = self.namespace_name(id);
        let prefix = |name: &str| {
            if ns.is_empty() {
                name.to_string()
            } else {
                format!("{ns}\\{name}")
            }
        };
        if node.kind == NodeKind::Namespace {
            return node.name.clone();
        }
        if node.has(NodeFlags::METHOD) {
            if let Some(class) = self.enclosing_class(id) {
                return format!("{}::{own}", self.qualified_name(class));
            }
        }
        prefix(own)
    }

    /// Lines holding patcher-injected code, ascending and deduplicated.
    pub fn synthetic_lines(&self) -> Vec<u32> {
        let mut lines: Vec<u32> = self
            .preorder(NodeId::ROOT)
            .filter(|&id| self[id].has(NodeFlags::SYNTHETIC))
            .filter_map(|id| self[id].lines.start)
            .collect();
        lines.sort_unstable();
        lines.dedup();
        lines
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<NodeId> for NodeTree {
    type Output = Node;

    #[inline]
    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for NodeTree {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}

/// Iterator returned by [`NodeTree::preorder`].
pub struct Preorder<'a> {
    tree: &'a NodeTree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
