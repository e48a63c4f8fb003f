//! Tree to source text.
//!
//! Pure concatenation: `body`, each child, `close`. Nothing is validated,
//! so a patcher that drops a brace gets malformed output back.

use jit_ir::{NodeId, NodeTree};
use jit_stack::ensure_sufficient_stack;

/// Reconstruct the source of the whole file.
pub fn unparse(tree: &NodeTree) -> String {
    unparse_node(tree, tree.root())
}

/// Reconstruct the source text of one subtree.
pub fn unparse_node(tree: &NodeTree, id: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, id, &mut out);
    out
}

fn write_node(tree: &NodeTree, id: NodeId, out: &mut String) {
    ensure_sufficient_stack(|| {
        let node = &tree[id];
        out.push_str(&node.body);
        for &child in node.children() {
            write_node(tree, child, out);
        }
        out.push_str(&node.close);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use jit_ir::{Node, NodeKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn concatenates_body_children_close() {
        let mut tree = NodeTree::new();
        let root = tree.root();
        let mut func = Node::new(NodeKind::Function);
        func.body = "function a() {".to_string();
        func.close = "}".to_string();
        let f = tree.push_child(root, func);
        tree.push_child(f, Node::code(" return 1; "));
        tree.insert_child(root, 0, Node::code("<?php "));
        assert_eq!(unparse(&tree), "<?php function a() { return 1; }");
        assert_eq!(unparse_node(&tree, f), "function a() { return 1; }");
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let mut tree = NodeTree::new();
        let mut parent = tree.root();
        for _ in 0..50_000 {
            let mut node = Node::code("(");
            node.close = ")".to_string();
            parent = tree.push_child(parent, node);
        }
        let text = unparse(&tree);
        assert_eq!(text.len(), 100_000);
        assert!(text.starts_with("((") && text.ends_with("))"));
    }
}
