//! Reduces a file to its function declarations.
//!
//! Loading a file of helper functions must not run its top-level code. The
//! isolator keeps tags, namespaces, imports, `declare` and named function
//! declarations; everything else is replaced by its newlines so line
//! numbers still match the original.
//!
//! A block `declare(...) { ... }` keeps its opening and its closing brace
//! so the output stays balanced.

use std::path::Path;

use jit_ir::{Node, NodeFlags, NodeId, NodeKind, NodeTree};
use jit_lexer::{TokenKind, TokenStream};
use jit_parse::unparse_node;
use tracing::trace;

use crate::fragment::{is_declare, is_tag, newlines_only};
use crate::Patcher;

#[derive(Clone, Copy, Debug, Default)]
pub struct Isolator;

impl Isolator {
    pub fn new() -> Self {
        Isolator
    }

    fn isolate(tree: &mut NodeTree, parent: NodeId) {
        let children = tree.children(parent).to_vec();
        // Brace depth of plain code at this level, and the depths at which
        // kept declare blocks opened.
        let mut depth = 0i32;
        let mut declares: Vec<i32> = Vec::new();
        for (index, child) in children.into_iter().enumerate() {
            let node = &tree[child];
            let plain_code =
                node.kind == NodeKind::Code && node.has(NodeFlags::IN_PHP) && !is_tag(tree, child);
            if plain_code {
                let balance = brace_balance(&node.body);
                if is_declare(tree, child) {
                    if balance > 0 {
                        declares.push(depth);
                    }
                    depth += balance;
                    continue;
                }
                depth += balance;
                if declares.last().is_some_and(|&open| depth <= open) {
                    declares.pop();
                    let blank = format!("{}}}", newlines_only(&node.body));
                    trace!(index, "kept declare block close");
                    tree.replace_child(parent, index, Node::code(blank));
                    continue;
                }
            }
            let node = &tree[child];
            let keep = match node.kind {
                NodeKind::Namespace => {
                    Self::isolate(tree, child);
                    true
                }
                NodeKind::Use => true,
                NodeKind::Function => !node.has(NodeFlags::CLOSURE),
                NodeKind::Code if is_tag(tree, child) => {
                    if node.body.starts_with("<?=") {
                        tree[child].body = echo_to_php(&tree[child].body);
                    }
                    true
                }
                _ => false,
            };
            if !keep {
                let blank = newlines_only(&unparse_node(tree, child));
                trace!(index, "isolated");
                tree.replace_child(parent, index, Node::code(blank));
            }
        }
    }
}

/// Opened minus closed braces in a code fragment.
fn brace_balance(code: &str) -> i32 {
    let stream = TokenStream::from_code(code);
    stream.tokens().iter().fold(0, |acc, t| match t.kind() {
        TokenKind::OpenBrace => acc + 1,
        TokenKind::CloseBrace => acc - 1,
        _ => acc,
    })
}

/// `<?=` cannot start a statement list, so it becomes `<?php `.
fn echo_to_php(tag: &str) -> String {
    format!("<?php {}", tag.strip_prefix("<?=").unwrap_or(tag))
}

impl Patcher for Isolator {
    fn process(&mut self, tree: &mut NodeTree, _file: Option<&Path>) {
        let root = tree.root();
        Self::isolate(tree, root);
    }
}
