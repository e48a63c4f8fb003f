//! Hand-written scanner producing PHP tokens.
//!
//! The scanner walks the source byte-by-byte and never fails: every byte
//! ends up in exactly one token, so concatenating token texts reproduces
//! the input. Unterminated strings, comments and heredocs simply extend to
//! the end of input.
//!
//! # Modes
//!
//! Scanning starts in [`Mode::Html`] for whole files, where everything up
//! to an open tag is a single `InlineHtml` token. `?>` switches back.
//! [`Mode::Php`] is used to re-lex code fragments that are already known
//! to sit between tags.

use memchr::{memchr2, memchr3, memmem};

use crate::kind::{keyword, TokenKind};
use crate::Token;

/// Index just past the string whose opening quote sits at `start`.
///
/// Double-quoted and backtick strings interpolate `{$expr}` and `${expr}`;
/// quotes and braces inside those expressions do not end the string.
fn skip_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut from = start + 1;
    while from < bytes.len() {
        let found = if quote == b'\'' {
            memchr2(quote, b'\\', &bytes[from..])
        } else {
            memchr3(quote, b'\\', b'{', &bytes[from..])
        };
        let Some(offset) = found else {
            break;
        };
        let at = from + offset;
        match bytes[at] {
            b'\\' => from = at + 2,
            b'{' if bytes.get(at + 1) == Some(&b'$') => from = skip_interpolation(bytes, at + 1),
            b'{' if at > from && bytes[at - 1] == b'$' => from = skip_interpolation(bytes, at + 1),
            b'{' => from = at + 1,
            _ => return at + 1,
        }
    }
    bytes.len()
}

/// Index just past the `}` closing an interpolation whose body starts at
/// `from`.
fn skip_interpolation(bytes: &[u8], from: usize) -> usize {
    let mut depth = 1u32;
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            q @ (b'\'' | b'"' | b'`') => i = skip_quoted(bytes, i, q),
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Scanner mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Outside `<?php ... ?>`.
    Html,
    /// Inside PHP code.
    Php,
}

/// Longest-match operator table. Order matters: longer spellings first.
const OPERATORS: &[(&str, TokenKind)] = &[
    ("**=", TokenKind::Operator),
    ("...", TokenKind::Ellipsis),
    ("<=>", TokenKind::Operator),
    ("===", TokenKind::Operator),
    ("!==", TokenKind::Operator),
    ("<<=", TokenKind::Operator),
    (">>=", TokenKind::Operator),
    ("??=", TokenKind::Operator),
    ("?->", TokenKind::NullsafeArrow),
    ("->", TokenKind::Arrow),
    ("=>", TokenKind::DoubleArrow),
    ("::", TokenKind::DoubleColon),
    ("**", TokenKind::Operator),
    ("++", TokenKind::Operator),
    ("--", TokenKind::Operator),
    ("+=", TokenKind::Operator),
    ("-=", TokenKind::Operator),
    ("*=", TokenKind::Operator),
    ("/=", TokenKind::Operator),
    (".=", TokenKind::Operator),
    ("%=", TokenKind::Operator),
    ("&=", TokenKind::Operator),
    ("|=", TokenKind::Operator),
    ("^=", TokenKind::Operator),
    ("==", TokenKind::Operator),
    ("!=", TokenKind::Operator),
    ("<>", TokenKind::Operator),
    ("<=", TokenKind::Operator),
    (">=", TokenKind::Operator),
    ("&&", TokenKind::Operator),
    ("||", TokenKind::Operator),
    ("??", TokenKind::Operator),
    ("<<", TokenKind::Operator),
    (">>", TokenKind::Operator),
    ("=", TokenKind::Assign),
    ("&", TokenKind::Ampersand),
    ("?", TokenKind::Question),
    (":", TokenKind::Colon),
    ("+", TokenKind::Operator),
    ("-", TokenKind::Operator),
    ("*", TokenKind::Operator),
    ("/", TokenKind::Operator),
    ("%", TokenKind::Operator),
    ("!", TokenKind::Operator),
    ("<", TokenKind::Operator),
    (">", TokenKind::Operator),
    (".", TokenKind::Operator),
    ("|", TokenKind::Operator),
    ("^", TokenKind::Operator),
    ("~", TokenKind::Operator),
    ("@", TokenKind::Operator),
];

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

#[inline]
fn is_ident_byte(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C)
}

/// Number of `\n` bytes in `bytes`.
#[inline]
pub(crate) fn count_newlines(bytes: &[u8]) -> u32 {
    u32::try_from(memchr::memchr_iter(b'\n', bytes).count()).unwrap_or(u32::MAX)
}

/// Recognize an open tag at the start of `rest`.
///
/// Returns the tag kind and its byte length. `<?php` swallows a single
/// following whitespace character (`\r\n` counts as one), matching the
/// host lexer.
fn open_tag(rest: &[u8]) -> Option<(TokenKind, usize)> {
    if !rest.starts_with(b"<?") {
        return None;
    }
    if rest.get(2) == Some(&b'=') {
        return Some((TokenKind::OpenTagWithEcho, 3));
    }
    if rest.len() >= 5 && rest[2..5].eq_ignore_ascii_case(b"php") {
        return match rest.get(5) {
            None => Some((TokenKind::OpenTag, 5)),
            Some(b'\r') if rest.get(6) == Some(&b'\n') => Some((TokenKind::OpenTag, 7)),
            Some(&b) if is_space(b) => Some((TokenKind::OpenTag, 6)),
            Some(_) => None,
        };
    }
    match rest.get(2) {
        None => Some((TokenKind::OpenTag, 2)),
        Some(&b) if is_space(b) => Some((TokenKind::OpenTag, 2)),
        Some(_) => None,
    }
}

/// PHP scanner.
pub(crate) struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    mode: Mode,
    /// Last non-trivia kind, so member names after `->` never lex as keywords.
    last: Option<TokenKind>,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(src: &'a str, mode: Mode) -> Self {
        Scanner {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
            mode,
            last: None,
        }
    }

    /// Produce the next token, or `None` at end of input.
    pub(crate) fn next_token(&mut self) -> Option<Token> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let start = self.pos;
        let kind = match self.mode {
            Mode::Html => self.html(),
            Mode::Php => self.php(),
        };
        debug_assert!(self.pos > start, "scanner made no progress at {start}");
        let text = &self.src[start..self.pos];
        let token = Token::new(kind, text, self.line);
        self.line = self.line.saturating_add(count_newlines(text.as_bytes()));
        if !kind.is_trivia() {
            self.last = Some(kind);
        }
        Some(token)
    }

    #[inline]
    fn peek(&self, n: usize) -> u8 {
        self.bytes.get(self.pos + n).copied().unwrap_or(0)
    }

    #[inline]
    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.pos < self.bytes.len() && pred(self.bytes[self.pos]) {
            self.pos += 1;
        }
    }

    // ─── Inline HTML ────────────────────────────────────────────────────

    fn html(&mut self) -> TokenKind {
        if let Some((kind, len)) = open_tag(self.rest()) {
            self.pos += len;
            self.mode = Mode::Php;
            return kind;
        }
        let mut from = self.pos + 1;
        while from < self.bytes.len() {
            match memmem::find(&self.bytes[from..], b"<?") {
                Some(offset) => {
                    let at = from + offset;
                    if open_tag(&self.bytes[at..]).is_some() {
                        self.pos = at;
                        return TokenKind::InlineHtml;
                    }
                    from = at + 1;
                }
                None => break,
            }
        }
        self.pos = self.bytes.len();
        TokenKind::InlineHtml
    }

    // ─── PHP dispatch ───────────────────────────────────────────────────

    fn php(&mut self) -> TokenKind {
        match self.peek(0) {
            b if is_space(b) => {
                self.eat_while(is_space);
                TokenKind::Whitespace
            }
            b'?' if self.peek(1) == b'>' => self.close_tag(),
            b'#' if self.peek(1) == b'[' => {
                self.pos += 2;
                TokenKind::AttributeOpen
            }
            b'#' => self.line_comment(),
            b'/' if self.peek(1) == b'/' => self.line_comment(),
            b'/' if self.peek(1) == b'*' => self.block_comment(),
            quote @ (b'\'' | b'"' | b'`') => self.quoted(quote),
            b'<' if self.rest().starts_with(b"<<<") => self.heredoc_or_operator(),
            b'$' => self.dollar(),
            b'0'..=b'9' => self.number(),
            b'.' if self.peek(1).is_ascii_digit() => self.number(),
            b'\\' => self.backslash(),
            b if is_ident_start(b) => self.name(),
            b'(' => self.single(TokenKind::OpenParen),
            b')' => self.single(TokenKind::CloseParen),
            b'[' => self.single(TokenKind::OpenBracket),
            b']' => self.single(TokenKind::CloseBracket),
            b'{' => self.single(TokenKind::OpenBrace),
            b'}' => self.single(TokenKind::CloseBrace),
            b';' => self.single(TokenKind::Semicolon),
            b',' => self.single(TokenKind::Comma),
            _ => self.operator(),
        }
    }

    #[inline]
    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn close_tag(&mut self) -> TokenKind {
        self.pos += 2;
        if self.peek(0) == b'\n' {
            self.pos += 1;
        } else if self.peek(0) == b'\r' && self.peek(1) == b'\n' {
            self.pos += 2;
        }
        self.mode = Mode::Html;
        TokenKind::CloseTag
    }

    // ─── Comments ───────────────────────────────────────────────────────

    /// `//` or `#` comment, ending before a newline or a `?>`.
    fn line_comment(&mut self) -> TokenKind {
        let mut from = self.pos + 1;
        loop {
            match memchr3(b'\n', b'\r', b'?', &self.bytes[from..]) {
                Some(offset) => {
                    let at = from + offset;
                    if self.bytes[at] == b'?' && self.bytes.get(at + 1) != Some(&b'>') {
                        from = at + 1;
                        continue;
                    }
                    self.pos = at;
                    return TokenKind::Comment;
                }
                None => {
                    self.pos = self.bytes.len();
                    return TokenKind::Comment;
                }
            }
        }
    }

    fn block_comment(&mut self) -> TokenKind {
        let doc = self.peek(2) == b'*' && self.peek(3) != b'/';
        match memmem::find(&self.bytes[self.pos + 2..], b"*/") {
            Some(offset) => self.pos += 2 + offset + 2,
            None => self.pos = self.bytes.len(),
        }
        if doc {
            TokenKind::DocComment
        } else {
            TokenKind::Comment
        }
    }

    // ─── Strings ────────────────────────────────────────────────────────

    fn quoted(&mut self, quote: u8) -> TokenKind {
        self.pos = skip_quoted(self.bytes, self.pos, quote);
        TokenKind::String
    }

    /// Heredoc/nowdoc when `<<<` starts a valid header, otherwise `<<` or `<`.
    fn heredoc_or_operator(&mut self) -> TokenKind {
        let mut i = self.pos + 3;
        while matches!(self.bytes.get(i), Some(b' ' | b'\t')) {
            i += 1;
        }
        let quote = match self.bytes.get(i) {
            Some(&q @ (b'\'' | b'"')) => {
                i += 1;
                Some(q)
            }
            _ => None,
        };
        let label_start = i;
        if !self.bytes.get(i).copied().is_some_and(is_ident_start) {
            return self.operator();
        }
        while self.bytes.get(i).copied().is_some_and(is_ident_byte) {
            i += 1;
        }
        let label = &self.bytes[label_start..i];
        if let Some(q) = quote {
            if self.bytes.get(i) != Some(&q) {
                return self.operator();
            }
            i += 1;
        }
        match self.bytes.get(i) {
            Some(b'\n') => i += 1,
            Some(b'\r') if self.bytes.get(i + 1) == Some(&b'\n') => i += 2,
            _ => return self.operator(),
        }

        // Body: find a line whose first non-blank text is the label.
        let mut line_start = i;
        loop {
            let mut j = line_start;
            while matches!(self.bytes.get(j), Some(b' ' | b'\t')) {
                j += 1;
            }
            if self.bytes[j..].starts_with(label)
                && !self
                    .bytes
                    .get(j + label.len())
                    .copied()
                    .is_some_and(is_ident_byte)
            {
                self.pos = j + label.len();
                return TokenKind::Heredoc;
            }
            match memchr::memchr(b'\n', &self.bytes[line_start..]) {
                Some(offset) => line_start += offset + 1,
                None => {
                    self.pos = self.bytes.len();
                    return TokenKind::Heredoc;
                }
            }
            if line_start >= self.bytes.len() {
                self.pos = self.bytes.len();
                return TokenKind::Heredoc;
            }
        }
    }

    // ─── Names & variables ──────────────────────────────────────────────

    fn dollar(&mut self) -> TokenKind {
        if is_ident_start(self.peek(1)) {
            self.pos += 1;
            self.eat_while(is_ident_byte);
            TokenKind::Variable
        } else {
            self.single(TokenKind::Dollar)
        }
    }

    fn backslash(&mut self) -> TokenKind {
        if is_ident_start(self.peek(1)) {
            self.pos += 1;
            self.eat_while(is_ident_byte);
            self.qualified_tail();
            TokenKind::FullyQualifiedName
        } else {
            self.single(TokenKind::NsSeparator)
        }
    }

    /// Consume `\Segment` repetitions. Returns whether any were consumed.
    fn qualified_tail(&mut self) -> bool {
        let mut consumed = false;
        while self.peek(0) == b'\\' && is_ident_start(self.peek(1)) {
            self.pos += 1;
            self.eat_while(is_ident_byte);
            consumed = true;
        }
        consumed
    }

    fn name(&mut self) -> TokenKind {
        let start = self.pos;
        self.eat_while(is_ident_byte);
        let first = &self.src[start..self.pos];
        if self.qualified_tail() {
            return if first.eq_ignore_ascii_case("namespace") {
                TokenKind::RelativeName
            } else {
                TokenKind::QualifiedName
            };
        }
        if matches!(
            self.last,
            Some(TokenKind::Arrow | TokenKind::NullsafeArrow)
        ) {
            return TokenKind::Ident;
        }
        keyword(first).unwrap_or(TokenKind::Ident)
    }

    // ─── Numbers ────────────────────────────────────────────────────────

    fn number(&mut self) -> TokenKind {
        if self.peek(0) == b'0' && matches!(self.peek(1), b'x' | b'X' | b'b' | b'B' | b'o' | b'O')
        {
            self.pos += 2;
            self.eat_while(|b| b.is_ascii_hexdigit() || b == b'_');
            return TokenKind::Number;
        }
        self.eat_while(|b| b.is_ascii_digit() || b == b'_');
        if self.peek(0) == b'.' && self.peek(1).is_ascii_digit() {
            self.pos += 1;
            self.eat_while(|b| b.is_ascii_digit() || b == b'_');
        }
        if matches!(self.peek(0), b'e' | b'E') {
            let signed = matches!(self.peek(1), b'+' | b'-');
            let digit_at = if signed { 2 } else { 1 };
            if self.peek(digit_at).is_ascii_digit() {
                self.pos += digit_at;
                self.eat_while(|b| b.is_ascii_digit() || b == b'_');
            }
        }
        TokenKind::Number
    }

    // ─── Operators ──────────────────────────────────────────────────────

    fn operator(&mut self) -> TokenKind {
        let rest = self.rest();
        for &(spelling, kind) in OPERATORS {
            if rest.starts_with(spelling.as_bytes()) {
                self.pos += spelling.len();
                return kind;
            }
        }
        let len = self.src[self.pos..].chars().next().map_or(1, char::len_utf8);
        self.pos += len;
        TokenKind::Unknown
    }
}

impl Iterator for Scanner<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}
