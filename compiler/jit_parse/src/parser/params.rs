//! Parameter list splitting.

use jit_ir::Param;
use jit_lexer::{TokenKind, TokenStream};

/// Split the parameters between the parentheses at `open` and `close`.
///
/// Commas only separate parameters at nesting depth zero, so defaults like
/// `[1, 2]` or `foo(1, 2)` stay whole. Each parameter contributes its
/// variable token and the trimmed text after a top-level `=`. Segments
/// without a variable (a trailing comma) are skipped.
pub(super) fn split_params(stream: &TokenStream, open: usize, close: usize) -> Vec<Param> {
    let mut params = Vec::new();
    let mut depth = 0u32;
    let mut start = open + 1;
    for i in open + 1..=close {
        let kind = stream[i].kind();
        match kind {
            TokenKind::OpenParen | TokenKind::OpenBracket | TokenKind::OpenBrace => depth += 1,
            TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace
                if i != close =>
            {
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
        let ends_segment = i == close || (kind == TokenKind::Comma && depth == 0);
        if ends_segment {
            if let Some(param) = param(stream, start, i) {
                params.push(param);
            }
            start = i + 1;
        }
    }
    params
}

/// One parameter from the tokens in `start..end`.
fn param(stream: &TokenStream, start: usize, end: usize) -> Option<Param> {
    let mut depth = 0u32;
    let mut name = None;
    for i in start..end {
        match stream[i].kind() {
            TokenKind::OpenParen | TokenKind::OpenBracket | TokenKind::OpenBrace => depth += 1,
            TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace => {
                depth = depth.saturating_sub(1);
            }
            TokenKind::Variable if depth == 0 && name.is_none() => {
                name = Some(stream[i].text().to_string());
            }
            TokenKind::Assign if depth == 0 => {
                if let Some(name) = name.take() {
                    return Some(Param {
                        name,
                        default: stream.text(i + 1..end).trim().to_string(),
                    });
                }
            }
            _ => {}
        }
    }
    name.map(|name| Param {
        name,
        default: String::new(),
    })
}
