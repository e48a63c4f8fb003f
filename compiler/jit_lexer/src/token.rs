//! Tokens.

use crate::kind::TokenKind;
use crate::scanner::count_newlines;

/// A single token: kind, exact source text and starting line.
///
/// Tokens are immutable once produced; the fields are only readable
/// through accessors.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token {
    kind: TokenKind,
    text: Box<str>,
    line: u32,
}

impl Token {
    /// Create a token.
    pub fn new(kind: TokenKind, text: &str, line: u32) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
        }
    }

    #[inline]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// 1-based line the token starts on.
    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Line of the token's last byte.
    ///
    /// A trailing newline belongs to the line it terminates, so `"?>\n"`
    /// ends on the line it starts on.
    pub fn end_line(&self) -> u32 {
        let text = self.text.strip_suffix('\n').unwrap_or(&self.text);
        self.line + count_newlines(text.as_bytes())
    }

    #[inline]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Case-insensitive text comparison.
    #[inline]
    pub fn text_is(&self, word: &str) -> bool {
        self.text.eq_ignore_ascii_case(word)
    }
}
