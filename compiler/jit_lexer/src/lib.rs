//! JIT Lexer - PHP tokens and the seekable token stream.
//!
//! This crate provides the lowest layer of the rewriting pipeline:
//! - [`TokenKind`]: token taxonomy mirroring the host lexer (`T_STRING`, ...)
//! - [`Token`]: immutable `(kind, text, line)` triple
//! - [`TokenStream`]: random-access cursor with bracket-matching extraction
//!
//! # Design
//!
//! Tokenization is total. Every input byte lands in exactly one token, so
//! concatenating all token texts reproduces the source byte-for-byte. This
//! is what lets the parser build a tree whose unparse is the identity.
//!
//! Strings, heredocs and comments are single opaque tokens. Brackets that
//! appear inside them are therefore never seen by bracket matching.

mod error;
mod kind;
mod scanner;
mod stream;
mod token;

pub use error::LexError;
pub use kind::{Bracket, TokenKind};
pub use stream::TokenStream;
pub use token::Token;

/// Tokenize a whole file into a token list.
///
/// Convenience for callers that do not need a cursor.
pub fn tokenize(source: &str) -> Vec<Token> {
    scanner::Scanner::new(source, scanner::Mode::Html).collect()
}
