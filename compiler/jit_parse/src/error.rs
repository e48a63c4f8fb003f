//! Parse errors.

use jit_lexer::{Bracket, LexError};
use thiserror::Error;

/// Errors raised while building the node tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A class, function or braced namespace body, or a parameter list,
    /// was never closed. The file must not be patched.
    #[error("unbalanced `{open}` opened on line {line}")]
    UnbalancedBracket { open: Bracket, line: u32 },

    /// A `use` clause could not be split into name/alias pairs.
    ///
    /// Never returned from [`parse`](crate::parse): the statement is kept
    /// as opaque code and the error is only logged.
    #[error("malformed use statement on line {line}: {reason}")]
    MalformedUseStatement { line: u32, reason: &'static str },

    #[error(transparent)]
    Lex(LexError),
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        match err {
            LexError::UnbalancedBracket { open, line } => {
                ParseError::UnbalancedBracket { open, line }
            }
            other @ LexError::NotAtBracket { .. } => ParseError::Lex(other),
        }
    }
}
