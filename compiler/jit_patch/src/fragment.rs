//! Helpers shared by patchers that rewrite code fragments.

use jit_ir::{NodeFlags, NodeId, NodeKind, NodeTree};
use jit_lexer::{TokenKind, TokenStream};
use jit_parse::unparse_node;

/// Processable in-PHP code nodes, in source order.
pub(crate) fn code_nodes(tree: &NodeTree) -> Vec<NodeId> {
    tree.preorder(tree.root())
        .filter(|&id| tree[id].is_patchable_code())
        .collect()
}

/// Re-lex `code` and rebuild it, letting `replace` swap single tokens.
///
/// Returns `None` when nothing was replaced.
pub(crate) fn rewrite(
    code: &str,
    mut replace: impl FnMut(&TokenStream, usize) -> Option<String>,
) -> Option<String> {
    let stream = TokenStream::from_code(code);
    let mut out = String::with_capacity(code.len() + 32);
    let mut changed = false;
    for i in 0..stream.count() {
        match replace(&stream, i) {
            Some(text) => {
                out.push_str(&text);
                changed = true;
            }
            None => out.push_str(stream[i].text()),
        }
    }
    changed.then_some(out)
}

/// Kind of the last significant token before `i`.
pub(crate) fn prev_kind(stream: &TokenStream, i: usize) -> Option<TokenKind> {
    stream.prev_significant(i).map(|p| stream[p].kind())
}

/// Index and kind of the first significant token after `i`.
pub(crate) fn next_kind(stream: &TokenStream, i: usize) -> Option<(usize, TokenKind)> {
    stream
        .next_significant(i + 1)
        .map(|n| (n, stream[n].kind()))
}

/// Open or close tag node (in PHP, never processable, not injected).
pub(crate) fn is_tag(tree: &NodeTree, id: NodeId) -> bool {
    let node = &tree[id];
    node.kind == NodeKind::Code
        && node.flags == NodeFlags::IN_PHP
        && (node.body.starts_with("<?") || node.body.starts_with("?>"))
}

/// Code node whose first statement is `declare(...)`.
pub(crate) fn is_declare(tree: &NodeTree, id: NodeId) -> bool {
    let node = &tree[id];
    if !node.is_patchable_code() {
        return false;
    }
    let stream = TokenStream::from_code(&node.body);
    stream
        .next_significant(0)
        .is_some_and(|first| stream[first].text_is("declare"))
}

/// Line on which text inserted as child `index` of `parent` would land.
///
/// Counts the newlines of everything that precedes the insertion point
/// in the unparsed file.
pub(crate) fn insertion_line(tree: &NodeTree, parent: NodeId, index: usize) -> u32 {
    let mut path: Vec<NodeId> = tree.ancestors(parent).collect();
    path.reverse();
    path.push(parent);

    let mut newlines = 0usize;
    for pair in path.windows(2) {
        let (outer, inner) = (pair[0], pair[1]);
        newlines += count_newlines(&tree[outer].body);
        for &sibling in tree.children(outer) {
            if sibling == inner {
                break;
            }
            newlines += count_newlines(&unparse_node(tree, sibling));
        }
    }
    newlines += count_newlines(&tree[parent].body);
    for &child in tree.children(parent).iter().take(index) {
        newlines += count_newlines(&unparse_node(tree, child));
    }
    u32::try_from(newlines + 1).unwrap_or(u32::MAX)
}

/// Only the newlines of `text`.
pub(crate) fn newlines_only(text: &str) -> String {
    text.chars().filter(|&c| c == '\n').collect()
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jit_ir::Node;
    use pretty_assertions::assert_eq;

    #[test]
    fn rewrite_reports_unchanged() {
        assert_eq!(rewrite("$a = 1;", |_, _| None), None);
        let out = rewrite("$a = 1;", |s, i| s[i].is(TokenKind::Number).then(|| "2".to_string()));
        assert_eq!(out.as_deref(), Some("$a = 2;"));
    }

    #[test]
    fn insertion_line_counts_preceding_text() {
        let mut tree = NodeTree::new();
        let root = tree.root();
        let mut tag = Node::code("<?php\n");
        tag.flags = NodeFlags::IN_PHP;
        tree.push_child(root, tag);
        let mut f = Node::new(NodeKind::Function);
        f.body = "\nfunction f()\n{".to_string();
        f.close = "}".to_string();
        let f = tree.push_child(root, f);
        tree.push_child(f, Node::code("\n  a();\n"));

        assert_eq!(insertion_line(&tree, root, 0), 1);
        assert_eq!(insertion_line(&tree, root, 1), 2);
        assert_eq!(insertion_line(&tree, f, 0), 4);
        assert_eq!(insertion_line(&tree, f, 1), 6);
        assert!(is_tag(&tree, tree.children(root)[0]));
    }

    #[test]
    fn newlines_only_keeps_line_count() {
        assert_eq!(newlines_only("a\nb\r\nc\n"), "\n\n\n");
    }
}
