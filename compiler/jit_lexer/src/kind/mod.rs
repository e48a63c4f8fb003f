//! Token kinds.
//!
//! `TokenKind` is a compact `#[repr(u8)]` discriminant grouped into
//! semantic ranges, mirroring the host lexer's taxonomy closely enough for
//! the parser and patchers. Reserved words the pipeline never branches on
//! (`if`, `while`, `isset`, ...) stay [`TokenKind::Ident`]; patchers classify
//! them by text.

use std::fmt;

/// Token kind discriminant.
///
/// | Range   | Category                 |
/// |---------|--------------------------|
/// | 0-7     | Markup & trivia          |
/// | 16-23   | Literals & names         |
/// | 32-63   | Keywords                 |
/// | 80-111  | Punctuation & operators  |
/// | 255     | Unknown byte             |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenKind {
    // === Markup & trivia: 0-7 ===
    /// Text outside `<?php ... ?>`.
    InlineHtml = 0,
    /// `<?php` (with one trailing whitespace character) or `<?`.
    OpenTag = 1,
    /// `<?=`.
    OpenTagWithEcho = 2,
    /// `?>` (with one trailing newline).
    CloseTag = 3,
    Whitespace = 4,
    /// `//`, `#` and `/* */` comments.
    Comment = 5,
    /// `/** */` comments.
    DocComment = 6,

    // === Literals & names: 16-23 ===
    /// `$name`.
    Variable = 16,
    Number = 17,
    /// Single, double or backtick quoted string, kept whole.
    String = 18,
    /// Heredoc or nowdoc, from `<<<` through the closing label.
    Heredoc = 19,
    /// Unqualified name, including soft and unreserved keywords.
    Ident = 20,
    /// `A\B`.
    QualifiedName = 21,
    /// `\A\B`.
    FullyQualifiedName = 22,
    /// `namespace\A`.
    RelativeName = 23,

    // === Keywords: 32-63 ===
    Abstract = 32,
    As = 33,
    Class = 34,
    /// `exit` and `die`.
    Exit = 35,
    Final = 36,
    Function = 37,
    Interface = 38,
    Namespace = 39,
    New = 40,
    Private = 41,
    Protected = 42,
    Public = 43,
    Readonly = 44,
    Static = 45,
    Trait = 46,
    Use = 47,
    Var = 48,
    Yield = 49,
    /// `__DIR__`.
    MagicDir = 50,
    /// `__FILE__`.
    MagicFile = 51,

    // === Punctuation & operators: 80-111 ===
    OpenParen = 80,
    CloseParen = 81,
    OpenBracket = 82,
    CloseBracket = 83,
    OpenBrace = 84,
    CloseBrace = 85,
    Semicolon = 86,
    Comma = 87,
    Colon = 88,
    /// `::`.
    DoubleColon = 89,
    /// `->`.
    Arrow = 90,
    /// `?->`.
    NullsafeArrow = 91,
    /// `=>`.
    DoubleArrow = 92,
    /// `...`.
    Ellipsis = 93,
    Question = 94,
    Ampersand = 95,
    /// `=`.
    Assign = 96,
    /// A lone `\`.
    NsSeparator = 97,
    /// A lone `$`.
    Dollar = 98,
    /// `#[`.
    AttributeOpen = 99,
    /// Any other operator (`+`, `===`, `??=`, `.`, ...).
    Operator = 100,

    /// A byte the scanner has no rule for.
    Unknown = 255,
}

impl TokenKind {
    /// Host-lexer name of this kind (`T_STRING`, `T_OPEN_TAG`, ...).
    ///
    /// Single-character punctuation reports its own character, the way the
    /// host tokenizer returns bare strings for them.
    pub const fn name(self) -> &'static str {
        match self {
            TokenKind::InlineHtml => "T_INLINE_HTML",
            TokenKind::OpenTag => "T_OPEN_TAG",
            TokenKind::OpenTagWithEcho => "T_OPEN_TAG_WITH_ECHO",
            TokenKind::CloseTag => "T_CLOSE_TAG",
            TokenKind::Whitespace => "T_WHITESPACE",
            TokenKind::Comment => "T_COMMENT",
            TokenKind::DocComment => "T_DOC_COMMENT",
            TokenKind::Variable => "T_VARIABLE",
            TokenKind::Number => "T_LNUMBER",
            TokenKind::String => "T_CONSTANT_ENCAPSED_STRING",
            TokenKind::Heredoc => "T_START_HEREDOC",
            TokenKind::Ident => "T_STRING",
            TokenKind::QualifiedName => "T_NAME_QUALIFIED",
            TokenKind::FullyQualifiedName => "T_NAME_FULLY_QUALIFIED",
            TokenKind::RelativeName => "T_NAME_RELATIVE",
            TokenKind::Abstract => "T_ABSTRACT",
            TokenKind::As => "T_AS",
            TokenKind::Class => "T_CLASS",
            TokenKind::Exit => "T_EXIT",
            TokenKind::Final => "T_FINAL",
            TokenKind::Function => "T_FUNCTION",
            TokenKind::Interface => "T_INTERFACE",
            TokenKind::Namespace => "T_NAMESPACE",
            TokenKind::New => "T_NEW",
            TokenKind::Private => "T_PRIVATE",
            TokenKind::Protected => "T_PROTECTED",
            TokenKind::Public => "T_PUBLIC",
            TokenKind::Readonly => "T_READONLY",
            TokenKind::Static => "T_STATIC",
            TokenKind::Trait => "T_TRAIT",
            TokenKind::Use => "T_USE",
            TokenKind::Var => "T_VAR",
            TokenKind::Yield => "T_YIELD",
            TokenKind::MagicDir => "T_DIR",
            TokenKind::MagicFile => "T_FILE",
            TokenKind::OpenParen => "(",
            TokenKind::CloseParen => ")",
            TokenKind::OpenBracket => "[",
            TokenKind::CloseBracket => "]",
            TokenKind::OpenBrace => "{",
            TokenKind::CloseBrace => "}",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::DoubleColon => "T_DOUBLE_COLON",
            TokenKind::Arrow => "T_OBJECT_OPERATOR",
            TokenKind::NullsafeArrow => "T_NULLSAFE_OBJECT_OPERATOR",
            TokenKind::DoubleArrow => "T_DOUBLE_ARROW",
            TokenKind::Ellipsis => "T_ELLIPSIS",
            TokenKind::Question => "?",
            TokenKind::Ampersand => "&",
            TokenKind::Assign => "=",
            TokenKind::NsSeparator => "T_NS_SEPARATOR",
            TokenKind::Dollar => "$",
            TokenKind::AttributeOpen => "T_ATTRIBUTE",
            TokenKind::Operator => "T_OPERATOR",
            TokenKind::Unknown => "T_BAD_CHARACTER",
        }
    }

    /// Whitespace and comments.
    #[inline]
    pub const fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::DocComment
        )
    }

    /// Opaque text the parser lifts into literal nodes.
    #[inline]
    pub const fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::String | TokenKind::Heredoc | TokenKind::Comment | TokenKind::DocComment
        )
    }

    /// Name tokens in any qualification form.
    #[inline]
    pub const fn is_name(self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::QualifiedName
                | TokenKind::FullyQualifiedName
                | TokenKind::RelativeName
        )
    }

    /// Declaration modifiers that may precede `function` or `class`.
    #[inline]
    pub const fn is_modifier(self) -> bool {
        matches!(
            self,
            TokenKind::Abstract
                | TokenKind::Final
                | TokenKind::Private
                | TokenKind::Protected
                | TokenKind::Public
                | TokenKind::Readonly
                | TokenKind::Static
                | TokenKind::Var
        )
    }

    /// Reserved words that carry their own kind.
    #[inline]
    pub const fn is_keyword(self) -> bool {
        let tag = self as u8;
        tag >= TokenKind::Abstract as u8 && tag <= TokenKind::MagicFile as u8
    }

    /// Tokens that may be read as a member or declaration name.
    ///
    /// Keywords are valid method names (`function list()`, `$x->class`).
    #[inline]
    pub const fn is_identifier_like(self) -> bool {
        self.is_name() || self.is_keyword()
    }

    /// Object and static member access operators.
    #[inline]
    pub const fn is_member_access(self) -> bool {
        matches!(
            self,
            TokenKind::Arrow | TokenKind::NullsafeArrow | TokenKind::DoubleColon
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bracket pairs understood by bracket-matching extraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bracket {
    /// `(` `)`
    Paren,
    /// `[` `]`
    Square,
    /// `{` `}`
    Curly,
}

impl Bracket {
    /// Kind of the opening delimiter.
    pub const fn open(self) -> TokenKind {
        match self {
            Bracket::Paren => TokenKind::OpenParen,
            Bracket::Square => TokenKind::OpenBracket,
            Bracket::Curly => TokenKind::OpenBrace,
        }
    }

    /// Kind of the closing delimiter.
    pub const fn close(self) -> TokenKind {
        match self {
            Bracket::Paren => TokenKind::CloseParen,
            Bracket::Square => TokenKind::CloseBracket,
            Bracket::Curly => TokenKind::CloseBrace,
        }
    }

    /// Opening delimiter character.
    pub const fn open_char(self) -> char {
        match self {
            Bracket::Paren => '(',
            Bracket::Square => '[',
            Bracket::Curly => '{',
        }
    }
}

impl fmt::Display for Bracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.open_char())
    }
}

/// Resolve a bare word to its keyword kind, case-insensitively.
///
/// Returns `None` for words that lex as [`TokenKind::Ident`].
pub(crate) fn keyword(word: &str) -> Option<TokenKind> {
    // Longest keyword handled here is `protected` / `interface` (9 bytes).
    if word.len() > 9 || word.len() < 2 {
        return None;
    }
    let mut buf = [0u8; 9];
    for (dst, src) in buf.iter_mut().zip(word.bytes()) {
        *dst = src.to_ascii_lowercase();
    }
    let lower = &buf[..word.len()];
    let kind = match lower {
        b"abstract" => TokenKind::Abstract,
        b"as" => TokenKind::As,
        b"class" => TokenKind::Class,
        b"exit" | b"die" => TokenKind::Exit,
        b"final" => TokenKind::Final,
        b"function" => TokenKind::Function,
        b"interface" => TokenKind::Interface,
        b"namespace" => TokenKind::Namespace,
        b"new" => TokenKind::New,
        b"private" => TokenKind::Private,
        b"protected" => TokenKind::Protected,
        b"public" => TokenKind::Public,
        b"readonly" => TokenKind::Readonly,
        b"static" => TokenKind::Static,
        b"trait" => TokenKind::Trait,
        b"use" => TokenKind::Use,
        b"var" => TokenKind::Var,
        b"yield" => TokenKind::Yield,
        b"__dir__" => TokenKind::MagicDir,
        b"__file__" => TokenKind::MagicFile,
        _ => return None,
    };
    Some(kind)
}
