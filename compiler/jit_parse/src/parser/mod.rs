//! Structural parser.
//!
//! Drives a [`TokenStream`] once from start to end and builds the concrete
//! node tree. The parser only tracks what patchers need: namespace, class
//! and function boundaries, statement extents and import aliases.
//!
//! # Frames
//!
//! Open constructs live on a frame stack (root, namespace, class,
//! function). Each frame counts the braces and parentheses opened inside
//! it, so a `}` at depth zero closes the frame and a `;` at paren depth
//! zero ends a statement.
//!
//! # Pending code
//!
//! Tokens that do not start a construct accumulate as a contiguous range
//! of pending code. The range is flushed into a plain-code node at every
//! statement boundary (`;`, `{`, `}`), before every construct and around
//! every literal. Every token ends up in exactly one fragment, which is
//! what makes the unparse the identity.

mod lines;
mod params;
mod uses;

use jit_ir::{ClassKind, LiteralKind, Node, NodeFlags, NodeId, NodeKind, NodeTree};
use jit_lexer::{Bracket, Token, TokenKind, TokenStream};
use tracing::{debug, trace, warn};

use crate::{ParseError, ParseOptions};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FrameKind {
    Root,
    Namespace { braced: bool },
    Class,
    Function,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    node: NodeId,
    /// Token index of the construct's first token.
    open: usize,
    braces: u32,
    parens: u32,
}

impl Frame {
    fn new(kind: FrameKind, node: NodeId, open: usize) -> Self {
        Frame {
            kind,
            node,
            open,
            braces: 0,
            parens: 0,
        }
    }
}

/// Parser state for one file.
pub(crate) struct Parser<'o> {
    stream: TokenStream,
    tree: NodeTree,
    stack: Vec<Frame>,
    /// Start of the pending code range; it ends at `pos`.
    pending: usize,
    pos: usize,
    /// Token extent (first, last) of each node, indexed by node id.
    extents: Vec<Option<(usize, usize)>>,
    /// Open arrow-function bodies: (token ending the body, frame depth).
    arrows: Vec<(usize, usize)>,
    options: &'o ParseOptions,
}

impl<'o> Parser<'o> {
    pub(crate) fn new(stream: TokenStream, options: &'o ParseOptions) -> Self {
        let tree = NodeTree::with_capacity(stream.count());
        Parser {
            stack: vec![Frame::new(FrameKind::Root, tree.root(), 0)],
            tree,
            stream,
            pending: 0,
            pos: 0,
            extents: Vec::new(),
            arrows: Vec::new(),
            options,
        }
    }

    /// Build the tree for `source`, the text the stream was built from.
    pub(crate) fn run(mut self, source: &str) -> Result<NodeTree, ParseError> {
        while self.pos < self.stream.count() {
            let i = self.pos;
            let kind = self.stream[i].kind();
            match kind {
                TokenKind::InlineHtml
                | TokenKind::OpenTag
                | TokenKind::OpenTagWithEcho
                | TokenKind::CloseTag => self.tag(i),
                k if k.is_literal() => self.literal(i),
                TokenKind::Namespace if self.at_file_level() => self.namespace(i),
                TokenKind::Use if self.at_file_level() && self.at_statement_start(i) => {
                    self.use_statement(i);
                }
                TokenKind::Class => self.class_like(i, ClassKind::Class)?,
                TokenKind::Interface => self.class_like(i, ClassKind::Interface)?,
                TokenKind::Trait => self.class_like(i, ClassKind::Trait)?,
                TokenKind::Ident if self.is_enum_declaration(i) => {
                    self.class_like(i, ClassKind::Enum)?;
                }
                TokenKind::Function => self.function(i)?,
                TokenKind::Ident if self.stream[i].text_is("fn") => {
                    self.arrow_function(i);
                    self.pos += 1;
                }
                TokenKind::Yield => {
                    if !self.in_arrow_body(i) {
                        self.mark_generator();
                    }
                    self.pos += 1;
                }
                TokenKind::OpenBrace => {
                    self.top_mut().braces += 1;
                    self.pos += 1;
                    self.flush(self.pos);
                }
                TokenKind::CloseBrace => self.close_brace(i),
                TokenKind::OpenParen => {
                    self.top_mut().parens += 1;
                    self.pos += 1;
                }
                TokenKind::CloseParen => {
                    let top = self.top_mut();
                    top.parens = top.parens.saturating_sub(1);
                    self.pos += 1;
                }
                TokenKind::Semicolon => {
                    self.pos += 1;
                    if self.top().parens == 0 {
                        self.flush(self.pos);
                    }
                }
                _ => self.pos += 1,
            }
        }
        self.finish(source)
    }

    // ─── Frames ─────────────────────────────────────────────────────────

    fn top(&self) -> &Frame {
        // The root frame is never popped.
        &self.stack[self.stack.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Frame {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn at_file_level(&self) -> bool {
        let top = self.top();
        matches!(top.kind, FrameKind::Root | FrameKind::Namespace { .. }) && top.braces == 0
    }

    /// No significant token is pending before `i`.
    fn at_statement_start(&self, i: usize) -> bool {
        self.stream
            .next_significant(self.pending)
            .is_none_or(|first| first >= i)
    }

    fn current_namespace(&self) -> Option<NodeId> {
        self.stack.iter().rev().find_map(|f| match f.kind {
            FrameKind::Namespace { .. } => Some(f.node),
            _ => None,
        })
    }

    fn current_function(&self) -> Option<NodeId> {
        self.stack
            .iter()
            .rev()
            .find(|f| f.kind == FrameKind::Function)
            .map(|f| f.node)
    }

    fn mark_generator(&mut self) {
        if let Some(function) = self.current_function() {
            self.tree[function].flags |= NodeFlags::GENERATOR;
        }
    }

    /// Whether token `i` sits directly in an arrow-function body, which
    /// makes the arrow function the generator rather than its enclosing
    /// function.
    fn in_arrow_body(&mut self, i: usize) -> bool {
        self.arrows.retain(|&(end, _)| end > i);
        let depth = self.stack.len();
        self.arrows.last().is_some_and(|&(_, d)| d == depth)
    }

    /// Pop the top frame, closing its node with `close` at token `last`.
    fn close_frame(&mut self, close: &str, last: usize) {
        if let Some(frame) = self.stack.pop() {
            self.tree[frame.node].close.push_str(close);
            self.set_extent(frame.node, frame.open, last);
            trace!(kind = ?frame.kind, node = ?frame.node, "closed frame");
        }
    }

    // ─── Node creation ──────────────────────────────────────────────────

    fn set_extent(&mut self, id: NodeId, first: usize, last: usize) {
        let index = id.index();
        if self.extents.len() <= index {
            self.extents.resize(index + 1, None);
        }
        self.extents[index] = Some((first, last));
    }

    /// Attach `node` to the innermost open construct.
    fn attach(&mut self, mut node: Node, first: usize, last: usize) -> NodeId {
        node.namespace = self.current_namespace();
        node.function = self.current_function();
        let parent = self.top().node;
        let id = self.tree.push_child(parent, node);
        self.set_extent(id, first, last);
        id
    }

    /// Turn the pending range up to `end` into a code node.
    fn flush(&mut self, end: usize) {
        let start = self.pending;
        self.pending = end;
        if start >= end {
            return;
        }
        let mut node = Node::code(self.stream.text(start..end));
        if self.is_coverable(start, end) {
            node.flags |= NodeFlags::COVERABLE;
        }
        self.attach(node, start, end - 1);
    }

    /// Statement-level code holding something other than braces.
    fn is_coverable(&self, start: usize, end: usize) -> bool {
        if self.top().kind == FrameKind::Class {
            return false;
        }
        (start..end).any(|i| {
            let kind = self.stream[i].kind();
            !kind.is_trivia() && !matches!(kind, TokenKind::OpenBrace | TokenKind::CloseBrace)
        })
    }

    fn tag(&mut self, i: usize) {
        self.flush(i);
        let token = &self.stream[i];
        let mut node = Node::code(token.text());
        node.flags = if token.is(TokenKind::InlineHtml) {
            NodeFlags::empty()
        } else {
            NodeFlags::IN_PHP
        };
        self.attach(node, i, i);
        self.pos = i + 1;
        self.pending = self.pos;
    }

    fn literal(&mut self, i: usize) {
        self.flush(i);
        let token = &self.stream[i];
        let kind = match token.kind() {
            TokenKind::Heredoc => LiteralKind::Heredoc,
            TokenKind::Comment => LiteralKind::Comment,
            TokenKind::DocComment => LiteralKind::DocComment,
            _ => LiteralKind::String,
        };
        let mut node = Node::new(NodeKind::Literal(kind));
        node.body = token.text().to_string();
        node.flags = NodeFlags::IN_PHP;
        self.attach(node, i, i);
        self.pos = i + 1;
        self.pending = self.pos;
    }

    /// Start of the modifier run (`final abstract public static ...`)
    /// directly preceding `i`, or `i` when there is none.
    fn modifier_run(&self, i: usize) -> usize {
        let mut start = i;
        let mut j = i;
        while j > self.pending {
            j -= 1;
            let kind = self.stream[j].kind();
            if kind.is_modifier() {
                start = j;
            } else if kind != TokenKind::Whitespace {
                break;
            }
        }
        start
    }

    fn modifier_flags(&self, start: usize, end: usize) -> NodeFlags {
        let mut flags = NodeFlags::empty();
        for i in start..end {
            match self.stream[i].kind() {
                TokenKind::Final => flags |= NodeFlags::FINAL,
                TokenKind::Abstract => flags |= NodeFlags::ABSTRACT,
                _ => {}
            }
        }
        flags
    }

    fn prev_significant_kind(&self, i: usize) -> Option<TokenKind> {
        self.stream
            .prev_significant(i)
            .map(|p| self.stream[p].kind())
    }

    fn line(&self, i: usize) -> u32 {
        self.stream.get(i).map_or(0, Token::line)
    }

    /// First token at or after `from` of one of `kinds` at paren depth zero.
    fn find_at_depth_zero(&self, from: usize, kinds: &[TokenKind]) -> Option<usize> {
        let mut depth = 0u32;
        for i in from..self.stream.count() {
            let kind = self.stream[i].kind();
            if depth == 0 && kinds.contains(&kind) {
                return Some(i);
            }
            match kind {
                TokenKind::OpenParen | TokenKind::OpenBracket => depth += 1,
                TokenKind::CloseParen | TokenKind::CloseBracket => {
                    depth = depth.saturating_sub(1);
                }
                _ => {}
            }
        }
        None
    }

    // ─── Constructs ─────────────────────────────────────────────────────

    fn namespace(&mut self, i: usize) {
        let mut name = String::new();
        let mut end = None;
        for j in i + 1..self.stream.count() {
            let token = &self.stream[j];
            match token.kind() {
                TokenKind::Semicolon | TokenKind::OpenBrace => {
                    end = Some(j);
                    break;
                }
                TokenKind::Ident | TokenKind::QualifiedName => name.push_str(token.text()),
                // `namespace Final;`
                k if k.is_keyword() && name.is_empty() => name.push_str(token.text()),
                k if k.is_trivia() => {}
                _ => break,
            }
        }
        let Some(end) = end else {
            // `namespace\foo()` and friends stay plain code.
            self.pos = i + 1;
            return;
        };

        self.flush(i);
        if self.top().kind == (FrameKind::Namespace { braced: false }) {
            self.close_frame("", i - 1);
        }
        let braced = self.stream[end].is(TokenKind::OpenBrace);
        let mut node = Node::new(NodeKind::Namespace);
        node.body = self.stream.text(i..end + 1);
        node.name = name;
        let id = self.attach(node, i, end);
        self.stack
            .push(Frame::new(FrameKind::Namespace { braced }, id, i));
        debug!(name = %self.tree[id].name, braced, "namespace");
        self.pos = end + 1;
        self.pending = self.pos;
    }

    fn use_statement(&mut self, i: usize) {
        let Some(end) = (i + 1..self.stream.count())
            .find(|&j| matches!(self.stream[j].kind(), TokenKind::Semicolon | TokenKind::CloseTag))
            .filter(|&j| self.stream[j].is(TokenKind::Semicolon))
        else {
            self.pos = i + 1;
            return;
        };

        let significant: Vec<&Token> = (i + 1..end)
            .map(|j| &self.stream[j])
            .filter(|t| !t.kind().is_trivia())
            .collect();
        match uses::parse_imports(&significant) {
            Ok(imports) => {
                self.flush(i);
                let mut node = Node::new(NodeKind::Use);
                node.body = self.stream.text(i..end + 1);
                self.attach(node, i, end);
                let scope = self.current_namespace().unwrap_or(NodeId::ROOT);
                for (alias, name) in imports {
                    trace!(%alias, %name, "import");
                    self.tree[scope].uses.insert(alias, name);
                }
                self.pos = end + 1;
                self.pending = self.pos;
            }
            Err(reason) => {
                let err = ParseError::MalformedUseStatement {
                    line: self.line(i),
                    reason,
                };
                warn!(%err, "use statement kept as plain code");
                // Stays pending; the `;` flushes it as code.
                self.pos = end;
            }
        }
    }

    fn is_enum_declaration(&self, i: usize) -> bool {
        if !self.stream[i].text_is("enum") || !self.at_statement_start(i) {
            return false;
        }
        let Some(name) = self.stream.next_significant(i + 1) else {
            return false;
        };
        if !self.stream[name].is(TokenKind::Ident) {
            return false;
        }
        self.stream
            .next_significant(name + 1)
            .map(|after| &self.stream[after])
            .is_some_and(|t| {
                matches!(t.kind(), TokenKind::OpenBrace | TokenKind::Colon)
                    || t.text_is("implements")
            })
    }

    fn class_like(&mut self, i: usize, class_kind: ClassKind) -> Result<(), ParseError> {
        let prev = self.prev_significant_kind(i);
        if prev.is_some_and(TokenKind::is_member_access) {
            // `Foo::class`
            self.pos = i + 1;
            return Ok(());
        }
        let anonymous = prev == Some(TokenKind::New);
        let name = if anonymous {
            String::new()
        } else {
            match self.stream.next_significant(i + 1) {
                Some(j) if self.stream[j].kind().is_identifier_like() => {
                    self.stream[j].text().to_string()
                }
                _ => {
                    self.pos = i + 1;
                    return Ok(());
                }
            }
        };

        let Some(brace) = self.find_at_depth_zero(i + 1, &[TokenKind::OpenBrace, TokenKind::Semicolon])
        else {
            return Err(ParseError::UnbalancedBracket {
                open: Bracket::Curly,
                line: self.line(i),
            });
        };
        if self.stream[brace].is(TokenKind::Semicolon) {
            self.pos = i + 1;
            return Ok(());
        }

        let start = if anonymous { i } else { self.modifier_run(i) };
        self.flush(start);
        let mut node = Node::new(NodeKind::Class(class_kind));
        node.body = self.stream.text(start..brace + 1);
        node.name = name;
        node.flags |= self.modifier_flags(start, i) | NodeFlags::HAS_BODY;
        let id = self.attach(node, start, brace);
        self.stack.push(Frame::new(FrameKind::Class, id, start));
        debug!(name = %self.tree[id].name, kind = ?class_kind, "class-like");
        self.pos = brace + 1;
        self.pending = self.pos;
        Ok(())
    }

    fn function(&mut self, i: usize) -> Result<(), ParseError> {
        if self.prev_significant_kind(i).is_some_and(TokenKind::is_member_access) {
            self.pos = i + 1;
            return Ok(());
        }
        let mut j = self.stream.next_significant(i + 1);
        if let Some(amp) = j.filter(|&a| self.stream[a].is(TokenKind::Ampersand)) {
            j = self.stream.next_significant(amp + 1);
        }
        let mut name = String::new();
        if let Some(n) = j.filter(|&n| self.stream[n].kind().is_identifier_like()) {
            name = self.stream[n].text().to_string();
            j = self.stream.next_significant(n + 1);
        }
        let Some(open) = j.filter(|&o| self.stream[o].is(TokenKind::OpenParen)) else {
            self.pos = i + 1;
            return Ok(());
        };

        self.stream.seek(open);
        self.stream.next_matching_bracket(Bracket::Paren)?;
        let close = self.stream.key();
        let args = params::split_params(&self.stream, open, close);

        let end = self
            .find_at_depth_zero(close + 1, &[TokenKind::OpenBrace, TokenKind::Semicolon])
            .ok_or(ParseError::UnbalancedBracket {
                open: Bracket::Curly,
                line: self.line(i),
            })?;
        let has_body = self.stream[end].is(TokenKind::OpenBrace);

        let start = self.modifier_run(i);
        self.flush(start);
        let mut node = Node::new(NodeKind::Function);
        node.body = self.stream.text(start..end + 1);
        node.args = args;
        node.flags |= self.modifier_flags(start, i);
        if self.top().kind == FrameKind::Class {
            node.flags |= NodeFlags::METHOD;
        }
        if name.is_empty() {
            node.flags |= NodeFlags::CLOSURE;
        }
        if has_body {
            node.flags |= NodeFlags::HAS_BODY;
        }
        node.flags |= self.return_type_flags(close, end);
        node.name = name;
        let id = self.attach(node, start, end);
        if has_body {
            self.stack.push(Frame::new(FrameKind::Function, id, start));
        }
        trace!(name = %self.tree[id].name, has_body, "function");
        self.pos = end + 1;
        self.pending = self.pos;
        Ok(())
    }

    /// `fn (...) => expr`: remember where the body ends.
    fn arrow_function(&mut self, i: usize) {
        if self.prev_significant_kind(i).is_some_and(TokenKind::is_member_access) {
            return;
        }
        let mut j = self.stream.next_significant(i + 1);
        if let Some(amp) = j.filter(|&a| self.stream[a].is(TokenKind::Ampersand)) {
            j = self.stream.next_significant(amp + 1);
        }
        let Some(open) = j.filter(|&o| self.stream[o].is(TokenKind::OpenParen)) else {
            return;
        };
        let Some(close) = self.find_at_depth_zero(open + 1, &[TokenKind::CloseParen]) else {
            return;
        };
        let arrow = self.find_at_depth_zero(
            close + 1,
            &[TokenKind::DoubleArrow, TokenKind::Semicolon, TokenKind::OpenBrace],
        );
        let Some(arrow) = arrow.filter(|&a| self.stream[a].is(TokenKind::DoubleArrow)) else {
            return;
        };
        let end = self.expression_end(arrow + 1);
        trace!(start = i, end, "arrow function");
        self.arrows.push((end, self.stack.len()));
    }

    /// First token at or after `from` that ends the expression starting
    /// there: `;`, `,` or a closing tag at depth zero, or an unmatched
    /// closing bracket.
    fn expression_end(&self, from: usize) -> usize {
        let mut depth = 0u32;
        for i in from..self.stream.count() {
            match self.stream[i].kind() {
                TokenKind::OpenParen | TokenKind::OpenBracket | TokenKind::OpenBrace => depth += 1,
                TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace => {
                    if depth == 0 {
                        return i;
                    }
                    depth -= 1;
                }
                TokenKind::Semicolon | TokenKind::Comma | TokenKind::CloseTag if depth == 0 => {
                    return i;
                }
                _ => {}
            }
        }
        self.stream.count()
    }

    /// `RETURNS_VOID` / `RETURNS_NEVER` when the tokens between the
    /// parameter list's `)` and the body end in `: void` or `: never`.
    fn return_type_flags(&self, close: usize, end: usize) -> NodeFlags {
        let Some(ty) = self.stream.prev_significant(end).filter(|&t| t > close) else {
            return NodeFlags::empty();
        };
        let colon = self.stream.prev_significant(ty).filter(|&c| c > close);
        if !colon.is_some_and(|c| self.stream[c].is(TokenKind::Colon)) {
            return NodeFlags::empty();
        }
        let token = &self.stream[ty];
        if token.text_is("void") {
            NodeFlags::RETURNS_VOID
        } else if token.text_is("never") {
            NodeFlags::RETURNS_NEVER
        } else {
            NodeFlags::empty()
        }
    }

    fn close_brace(&mut self, i: usize) {
        let top = self.top();
        let closes_frame = top.braces == 0
            && matches!(
                top.kind,
                FrameKind::Class | FrameKind::Function | FrameKind::Namespace { braced: true }
            );
        if closes_frame {
            self.flush(i);
            self.close_frame("}", i);
            self.pos = i + 1;
            self.pending = self.pos;
        } else {
            let top = self.top_mut();
            top.braces = top.braces.saturating_sub(1);
            self.pos = i + 1;
            self.flush(self.pos);
        }
    }

    fn finish(mut self, source: &str) -> Result<NodeTree, ParseError> {
        let count = self.stream.count();
        self.flush(count);
        let last = count.saturating_sub(1);
        while self.stack.len() > 1 {
            let top = self.top();
            if top.kind == (FrameKind::Namespace { braced: false }) {
                self.close_frame("", last);
                continue;
            }
            let line = self.line(top.open);
            warn!(kind = ?top.kind, line, "construct never closed");
            return Err(ParseError::UnbalancedBracket {
                open: Bracket::Curly,
                line,
            });
        }
        if count > 0 {
            self.set_extent(NodeId::ROOT, 0, last);
        }
        lines::assign(
            &mut self.tree,
            &self.stream,
            &self.extents,
            source,
            self.options.line_content,
        );
        debug!(tokens = count, nodes = self.tree.len(), "parsed");
        Ok(self.tree)
    }
}

#[cfg(test)]
mod tests;
