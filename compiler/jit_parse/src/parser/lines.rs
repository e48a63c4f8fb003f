//! Line extents and the per-line content map.

use jit_ir::{LineContent, NodeId, NodeTree};
use jit_lexer::{TokenKind, TokenStream};

/// Fill `lines` on every reachable node from its token extent.
///
/// `start`/`stop` come from the first and last non-whitespace token.
/// Whitespace-only nodes get no extent. With `content`, the root also
/// receives one [`LineContent`] per source line.
pub(super) fn assign(
    tree: &mut NodeTree,
    stream: &TokenStream,
    extents: &[Option<(usize, usize)>],
    source: &str,
    content: bool,
) {
    let ids: Vec<NodeId> = tree.preorder(tree.root()).collect();
    for &id in &ids {
        let Some(&Some((first, last))) = extents.get(id.index()) else {
            continue;
        };
        let visible = |i: &usize| !stream[*i].is(TokenKind::Whitespace);
        let Some(head) = (first..=last).find(visible) else {
            continue;
        };
        let tail = (first..=last).rev().find(visible).unwrap_or(head);
        let lines = &mut tree[id].lines;
        lines.start = Some(stream[head].line());
        lines.stop = stream[tail].end_line();
    }

    if !content {
        return;
    }
    let mut map = std::collections::BTreeMap::new();
    let body = source.strip_suffix('\n').unwrap_or(source);
    if !source.is_empty() {
        for (number, text) in (1u32..).zip(body.split('\n')) {
            map.insert(
                number,
                LineContent {
                    body: text.to_string(),
                    nodes: Vec::new(),
                },
            );
        }
    }
    for &id in &ids {
        let lines = &tree[id].lines;
        let Some(start) = lines.start else { continue };
        for line in start..=lines.stop {
            if let Some(entry) = map.get_mut(&line) {
                entry.nodes.push(id);
            }
        }
    }
    tree[NodeId::ROOT].lines.content = map;
}
