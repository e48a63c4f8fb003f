//! Seekable, random-access token stream.
//!
//! Wraps the eagerly scanned token list with a cursor. The cursor always
//! satisfies `0 <= key() <= count()`; it is [`valid`](TokenStream::valid)
//! while it points at a token.
//!
//! Navigation follows the host tokenizer wrapper the rewriting pipeline was
//! designed around: [`next`](TokenStream::next) moves first and then reports
//! the token it landed on, and the `*_until` variants return every text they
//! walked over, including the token they stopped at.

use std::ops::{Index, Range};

use tracing::trace;

use crate::error::LexError;
use crate::kind::{Bracket, TokenKind};
use crate::scanner::{Mode, Scanner};
use crate::Token;

/// Token stream with a cursor.
#[derive(Clone, Debug)]
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    /// Tokenize a whole file. Content before the first open tag is inline HTML.
    pub fn new(source: &str) -> Self {
        Self::scan(source, Mode::Html)
    }

    /// Tokenize a fragment that is already inside `<?php ... ?>`.
    pub fn from_code(code: &str) -> Self {
        Self::scan(code, Mode::Php)
    }

    fn scan(source: &str, mode: Mode) -> Self {
        let tokens: Vec<Token> = Scanner::new(source, mode).collect();
        trace!(count = tokens.len(), bytes = source.len(), "tokenized");
        TokenStream { tokens, pos: 0 }
    }

    /// Number of tokens.
    #[inline]
    pub fn count(&self) -> usize {
        self.tokens.len()
    }

    /// Current cursor index.
    #[inline]
    pub fn key(&self) -> usize {
        self.pos
    }

    /// Whether the cursor points at a token.
    #[inline]
    pub fn valid(&self) -> bool {
        self.pos < self.tokens.len()
    }

    /// Move the cursor to `index`, clamped to `count()`.
    pub fn seek(&mut self, index: usize) {
        self.pos = index.min(self.tokens.len());
    }

    /// Move the cursor back to the first token.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Text of the current token.
    #[inline]
    pub fn current(&self) -> Option<&str> {
        self.current_token().map(Token::text)
    }

    /// Current token with kind and line.
    #[inline]
    pub fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Kind of the current token.
    #[inline]
    pub fn current_kind(&self) -> Option<TokenKind> {
        self.current_token().map(Token::kind)
    }

    /// Token at `index`, if any.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// All tokens.
    #[inline]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Advance one token and return the text of the token landed on.
    ///
    /// Returns `None` once the cursor moves past the last token.
    pub fn next(&mut self) -> Option<&str> {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        self.current()
    }

    /// Advance until a token of one of `kinds`, returning the text walked over.
    ///
    /// The returned text starts with the token after the current one and
    /// ends with the matching token, on which the cursor rests. When no
    /// such token exists the cursor is left where it was and `None` is
    /// returned.
    pub fn next_until(&mut self, kinds: &[TokenKind]) -> Option<String> {
        let start = self.pos;
        let mut text = String::new();
        let mut i = start + 1;
        while let Some(token) = self.tokens.get(i) {
            text.push_str(token.text());
            if kinds.contains(&token.kind()) {
                self.pos = i;
                return Some(text);
            }
            i += 1;
        }
        None
    }

    /// Step back one token and return the text of the token landed on.
    ///
    /// Returns `None` (leaving the cursor in place) at the first token.
    pub fn prev(&mut self) -> Option<&str> {
        if self.pos == 0 {
            return None;
        }
        self.pos -= 1;
        self.current()
    }

    /// Step back until a token of one of `kinds`, returning the text walked
    /// over in source order.
    ///
    /// Symmetric to [`next_until`](Self::next_until): the text runs from the
    /// matching token up to, but excluding, the current one.
    pub fn prev_until(&mut self, kinds: &[TokenKind]) -> Option<String> {
        let mut i = self.pos;
        let mut parts = Vec::new();
        while i > 0 {
            i -= 1;
            let token = &self.tokens[i];
            parts.push(token.text());
            if kinds.contains(&token.kind()) {
                self.pos = i;
                return Some(parts.iter().rev().copied().collect());
            }
        }
        None
    }

    /// Extract a bracketed span.
    ///
    /// The current token must be the opening delimiter of `bracket`. Returns
    /// the source text from it through the depth-balanced closing delimiter
    /// and leaves the cursor on the closing delimiter. Strings and comments
    /// are single tokens, so delimiters inside them never count.
    ///
    /// On failure the cursor is restored.
    pub fn next_matching_bracket(&mut self, bracket: Bracket) -> Result<String, LexError> {
        let start = self.pos;
        let Some(open) = self.current_token().filter(|t| t.is(bracket.open())) else {
            return Err(LexError::NotAtBracket {
                expected: bracket,
                index: start,
                found: self.current().map(str::to_string),
            });
        };
        let line = open.line();

        let mut depth = 0usize;
        let mut text = String::new();
        let mut i = start;
        while let Some(token) = self.tokens.get(i) {
            text.push_str(token.text());
            if token.is(bracket.open()) {
                depth += 1;
            } else if token.is(bracket.close()) {
                depth -= 1;
                if depth == 0 {
                    self.pos = i;
                    return Ok(text);
                }
            }
            i += 1;
        }
        trace!(%bracket, line, "bracket never closed");
        Err(LexError::UnbalancedBracket {
            open: bracket,
            line,
        })
    }

    /// Concatenated text of the tokens in `range`.
    pub fn text(&self, range: Range<usize>) -> String {
        let end = range.end.min(self.tokens.len());
        let start = range.start.min(end);
        self.tokens[start..end].iter().map(Token::text).collect()
    }

    /// Index of the first non-trivia token at or after `from`.
    pub fn next_significant(&self, from: usize) -> Option<usize> {
        (from..self.tokens.len()).find(|&i| !self.tokens[i].kind().is_trivia())
    }

    /// Index of the last non-trivia token strictly before `before`.
    pub fn prev_significant(&self, before: usize) -> Option<usize> {
        (0..before.min(self.tokens.len()))
            .rev()
            .find(|&i| !self.tokens[i].kind().is_trivia())
    }
}

impl Index<usize> for TokenStream {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

impl<'a> IntoIterator for &'a TokenStream {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
