//! Drops the `final` modifier from class declarations.

use std::path::Path;

use jit_ir::{NodeFlags, NodeId, NodeTree};
use jit_lexer::{TokenKind, TokenStream};
use tracing::trace;

use crate::Patcher;

#[derive(Clone, Debug, Default)]
pub struct FinalClass {
    stripped: usize,
}

impl FinalClass {
    pub fn new() -> Self {
        FinalClass::default()
    }

    /// Classes un-finalized by the last `process` call.
    pub fn stripped(&self) -> usize {
        self.stripped
    }
}

impl Patcher for FinalClass {
    fn process(&mut self, tree: &mut NodeTree, _file: Option<&Path>) {
        self.stripped = 0;
        let targets: Vec<NodeId> = tree
            .preorder(tree.root())
            .filter(|&id| tree[id].kind.is_class_like() && tree[id].has(NodeFlags::FINAL))
            .collect();

        for id in targets {
            let node = &mut tree[id];
            if let Some(body) = strip_final(&node.body) {
                trace!(class = %node.name, "final stripped");
                node.body = body;
                node.flags.remove(NodeFlags::FINAL);
                self.stripped += 1;
            }
        }
    }
}

/// Header text without its first `final` keyword and the whitespace after it.
fn strip_final(header: &str) -> Option<String> {
    let stream = TokenStream::from_code(header);
    let at = stream.tokens().iter().position(|t| t.is(TokenKind::Final))?;
    let skip_ws = stream.get(at + 1).is_some_and(|t| t.is(TokenKind::Whitespace));
    let resume = if skip_ws { at + 2 } else { at + 1 };
    Some(stream.text(0..at) + &stream.text(resume..stream.count()))
}
