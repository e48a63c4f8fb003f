//! Lexer errors.

use thiserror::Error;

use crate::kind::Bracket;

/// Errors raised by [`TokenStream`](crate::TokenStream) navigation.
///
/// Tokenization itself never fails; only bracket-matching extraction can.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// The stream ended before the bracket opened on `line` was closed.
    #[error("unbalanced `{open}` opened on line {line}")]
    UnbalancedBracket { open: Bracket, line: u32 },

    /// Bracket matching was requested while the cursor is not on the
    /// expected opening delimiter.
    #[error("expected `{expected}` at token {index}, found {found:?}")]
    NotAtBracket {
        expected: Bracket,
        index: usize,
        found: Option<String>,
    },
}
