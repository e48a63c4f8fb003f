//! JIT Parse - structural parser, unparser and debug dump.
//!
//! Builds the concrete [`NodeTree`] patchers operate on and turns it back
//! into text.
//!
//! # Round trip
//!
//! For every input, `unparse(&parse(s)?) == s`. The parser never drops or
//! normalizes a byte: whitespace, comments, tags and inline HTML all end up
//! in some node fragment.
//!
//! # Errors
//!
//! Only structural damage is fatal: a class, function or braced namespace
//! that is never closed, or a parameter list without its `)`. Everything
//! else (stray braces, malformed `use` clauses) is kept as plain code.

mod debug;
mod error;
mod parser;
mod unparse;

pub use debug::debug;
pub use error::ParseError;
pub use unparse::{unparse, unparse_node};

use jit_ir::NodeTree;
use jit_lexer::TokenStream;

/// Parser configuration.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Fill the per-line content map on the root.
    pub line_content: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { line_content: true }
    }
}

impl ParseOptions {
    #[must_use]
    pub fn with_line_content(mut self, line_content: bool) -> Self {
        self.line_content = line_content;
        self
    }
}

/// Parse a whole file with default options.
pub fn parse(source: &str) -> Result<NodeTree, ParseError> {
    parse_with(source, &ParseOptions::default())
}

/// Parse a whole file.
pub fn parse_with(source: &str, options: &ParseOptions) -> Result<NodeTree, ParseError> {
    let stream = TokenStream::new(source);
    parser::Parser::new(stream, options).run(source)
}
