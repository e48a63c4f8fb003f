//! Function and class indirection.
//!
//! Every global function call and class reference in executable code is
//! routed through a variable whose value the runtime resolver picks:
//!
//! ```text
//! function f() { rand(2, 5); }
//! // becomes
//! function f() {$__KMONKEY__0 = \Kahlan\Plugin\Monkey::patched(__NAMESPACE__, 'rand', true);
//!     $__KMONKEY__0(2, 5); }
//! ```
//!
//! Assignments are hoisted to the start of the enclosing function, or just
//! after the open tag, `declare` and `use` statements at file level. Each
//! distinct reference is resolved once per block. The hoisted line never
//! contains a newline, so line numbers are preserved.

mod blacklist;
mod substitutions;

use std::path::Path;

use jit_ir::{LiteralKind, Node, NodeFlags, NodeId, NodeKind, NodeTree, UseMap};
use jit_lexer::{TokenKind, TokenStream};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::fragment::{code_nodes, insertion_line, is_declare, is_tag, next_kind, prev_kind, rewrite};
use crate::Patcher;

pub use substitutions::Substitutions;

/// Monkey configuration.
#[derive(Clone, Debug)]
pub struct MonkeyOptions {
    /// Static call returning the name to use for a reference.
    pub resolver: String,
    /// Infix of the generated variable names (`$__{prefix}__N`).
    pub prefix: String,
}

impl Default for MonkeyOptions {
    fn default() -> Self {
        MonkeyOptions {
            resolver: "\\Kahlan\\Plugin\\Monkey::patched".to_string(),
            prefix: "KMONKEY".to_string(),
        }
    }
}

/// Namespace argument passed to the resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Scope {
    /// Relative to the namespace the code is written in.
    Current,
    /// Already fully qualified.
    Global,
}

impl Scope {
    fn as_php(self) -> &'static str {
        match self {
            Scope::Current => "__NAMESPACE__",
            Scope::Global => "null",
        }
    }
}

/// Hoisted assignments for one function body or file-level block.
struct Block {
    id: NodeId,
    /// Insertion index, `None` when the block cannot host assignments.
    index: Option<usize>,
    vars: FxHashMap<(Scope, String, bool), String>,
    decls: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct Monkey {
    options: MonkeyOptions,
    blacklist: FxHashSet<String>,
    counter: usize,
}

impl Default for Monkey {
    fn default() -> Self {
        Monkey::new(MonkeyOptions::default())
    }
}

impl Monkey {
    pub fn new(options: MonkeyOptions) -> Self {
        Monkey {
            options,
            blacklist: blacklist::BLACKLIST.iter().map(|s| (*s).to_string()).collect(),
            counter: 0,
        }
    }

    /// Never redirect `name` (case-insensitive).
    pub fn add_blacklist(&mut self, name: &str) {
        self.blacklist.insert(name.to_ascii_lowercase());
    }

    pub fn is_blacklisted(&self, name: &str) -> bool {
        self.blacklist
            .contains(&name.trim_start_matches('\\').to_ascii_lowercase())
    }

    /// Variables generated by the last `process` call.
    pub fn generated(&self) -> usize {
        self.counter
    }

    /// Rewrite references in one code fragment, recording hoisted lines.
    fn rewrite_code(&mut self, code: &str, uses: &UseMap, block: &mut Block) -> Option<String> {
        let mut attribute_depth = 0usize;
        rewrite(code, |stream, i| {
            let token = &stream[i];
            match token.kind() {
                TokenKind::AttributeOpen => attribute_depth = 1,
                TokenKind::OpenBracket if attribute_depth > 0 => attribute_depth += 1,
                TokenKind::CloseBracket if attribute_depth > 0 => attribute_depth -= 1,
                _ => {}
            }
            if attribute_depth > 0 || self.is_blacklisted(token.text()) {
                return None;
            }
            let is_function = call_style(stream, i)?;
            let (scope, name) = resolve(token.text(), uses);
            Some(self.variable(block, scope, name, is_function))
        })
    }

    /// Variable standing in for `name`, allocating it on first use.
    fn variable(&mut self, block: &mut Block, scope: Scope, name: String, is_function: bool) -> String {
        let key = (scope, name.to_ascii_lowercase(), is_function);
        if let Some(var) = block.vars.get(&key) {
            return var.clone();
        }
        let var = format!("$__{}__{}", self.options.prefix, self.counter);
        self.counter += 1;
        trace!(%name, %var, is_function, "monkey");
        block.decls.push(format!(
            "{var} = {}({}, '{name}', {is_function});",
            self.options.resolver,
            scope.as_php(),
        ));
        block.vars.insert(key, var.clone());
        var
    }
}

impl Patcher for Monkey {
    fn process(&mut self, tree: &mut NodeTree, _file: Option<&Path>) {
        self.counter = 0;
        let mut blocks: Vec<Block> = Vec::new();
        let mut slots: FxHashMap<NodeId, usize> = FxHashMap::default();

        for id in code_nodes(tree) {
            let Some(parent) = tree.parent(id) else {
                continue;
            };
            if !matches!(
                tree[parent].kind,
                NodeKind::Root | NodeKind::Namespace | NodeKind::Function
            ) {
                continue;
            }
            let slot = *slots.entry(parent).or_insert_with(|| {
                blocks.push(Block {
                    id: parent,
                    index: insertion_index(tree, parent),
                    vars: FxHashMap::default(),
                    decls: Vec::new(),
                });
                blocks.len() - 1
            });
            let block = &mut blocks[slot];
            if block.index.is_none() {
                continue;
            }
            let rewritten = self.rewrite_code(&tree[id].body, tree.uses_for(id), block);
            if let Some(body) = rewritten {
                tree[id].body = body;
            }
        }

        for block in blocks {
            let Some(index) = block.index else {
                continue;
            };
            if block.decls.is_empty() {
                continue;
            }
            let line = insertion_line(tree, block.id, index);
            tree.insert_child(block.id, index, Node::synthetic(block.decls.join(" "), Some(line)));
        }
        debug!(generated = self.counter, "monkey done");
    }
}

/// `Some(true)` for a function-style call, `Some(false)` for a class
/// reference, `None` when the token is not a redirectable reference.
fn call_style(stream: &TokenStream, i: usize) -> Option<bool> {
    if !matches!(
        stream[i].kind(),
        TokenKind::Ident | TokenKind::QualifiedName | TokenKind::FullyQualifiedName
    ) {
        return None;
    }
    if let Some(p) = stream.prev_significant(i) {
        if stream[p].text_is("const") {
            return None;
        }
    }
    match prev_kind(stream, i) {
        Some(TokenKind::New) => return Some(false),
        Some(
            TokenKind::Arrow
            | TokenKind::NullsafeArrow
            | TokenKind::DoubleColon
            | TokenKind::Function,
        ) => return None,
        _ => {}
    }
    match next_kind(stream, i)? {
        (_, TokenKind::OpenParen) => Some(true),
        (n, TokenKind::DoubleColon) => {
            let member = stream.next_significant(n + 1)?;
            (!stream[member].is(TokenKind::Class)).then_some(false)
        }
        _ => None,
    }
}

/// Scope and name to hand the resolver for `text` as written.
fn resolve(text: &str, uses: &UseMap) -> (Scope, String) {
    if let Some(stripped) = text.strip_prefix('\\') {
        return (Scope::Global, stripped.to_string());
    }
    let (first, rest) = match text.split_once('\\') {
        Some((first, rest)) => (first, Some(rest)),
        None => (text, None),
    };
    let alias = uses.get(first).or_else(|| {
        uses.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(first))
            .map(|(_, v)| v)
    });
    match (alias, rest) {
        (Some(fq), Some(rest)) => (Scope::Global, format!("{}\\{rest}", fq.trim_start_matches('\\'))),
        (Some(fq), None) => (Scope::Global, fq.trim_start_matches('\\').to_string()),
        (None, _) => (Scope::Current, text.to_string()),
    }
}

/// Where hoisted assignments go inside `block`.
///
/// Functions take them first thing. File-level blocks take them after the
/// leading open tag, `declare` and `use` statements. A file whose first tag
/// is `<?=` has no statement position, so it gets nothing.
fn insertion_index(tree: &NodeTree, block: NodeId) -> Option<usize> {
    let children = tree.children(block);
    let start = match tree[block].kind {
        NodeKind::Function => return Some(0),
        NodeKind::Namespace => 0,
        _ => {
            let first = children
                .iter()
                .position(|&c| is_tag(tree, c) && tree[c].body.starts_with("<?"))?;
            if tree[children[first]].body.starts_with("<?=") {
                return None;
            }
            first + 1
        }
    };

    let mut index = start;
    for (n, &child) in children.iter().enumerate().skip(start) {
        let node = &tree[child];
        let leading = node.kind == NodeKind::Use || is_declare(tree, child);
        let filler = matches!(
            node.kind,
            NodeKind::Literal(LiteralKind::Comment | LiteralKind::DocComment)
        ) || (node.kind == NodeKind::Code
            && node.has(NodeFlags::IN_PHP | NodeFlags::PROCESSABLE)
            && node.body.trim().is_empty());
        if leading {
            index = n + 1;
        } else if !filler {
            break;
        }
    }
    Some(index)
}

#[cfg(test)]
mod tests;
