//! `use` import clauses.
//!
//! Grammar handled here (significant tokens only, after the `use` keyword):
//!
//! ```text
//! use      := kind? clause ("," clause)*
//! clause   := name ("as" alias)?
//!           | name "\" "{" inner ("," inner)* ","? "}"
//! inner    := kind? name ("as" alias)?
//! kind     := "function" | "const"
//! ```

use jit_lexer::{Token, TokenKind};

/// One import: `(alias, fully qualified name)`.
pub(super) type Import = (String, String);

/// Parse the significant tokens between `use` and `;`.
///
/// The error is a short reason for the log line.
pub(super) fn parse_imports(tokens: &[&Token]) -> Result<Vec<Import>, &'static str> {
    let mut clauses = Clauses { tokens, pos: 0 };
    clauses.import_kind();

    let mut imports = Vec::new();
    loop {
        let name = clauses.name().ok_or("expected a name")?;
        if clauses.eat(TokenKind::NsSeparator) {
            if !clauses.eat(TokenKind::OpenBrace) {
                return Err("expected `{` after group prefix");
            }
            clauses.group(&name, &mut imports)?;
        } else {
            let alias = clauses.alias()?;
            imports.push((alias.unwrap_or_else(|| last_segment(&name)), name));
        }

        if clauses.eat(TokenKind::Comma) {
            continue;
        }
        if clauses.at_end() {
            break;
        }
        return Err("unexpected token after clause");
    }
    Ok(imports)
}

/// Last `\`-separated segment of a name.
pub(super) fn last_segment(name: &str) -> String {
    name.rsplit('\\').next().unwrap_or(name).to_string()
}

struct Clauses<'t> {
    tokens: &'t [&'t Token],
    pos: usize,
}

impl<'t> Clauses<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().is_some_and(|t| t.is(kind)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Skip a `function` / `const` import marker.
    fn import_kind(&mut self) {
        if self
            .peek()
            .is_some_and(|t| t.is(TokenKind::Function) || t.text_is("const"))
        {
            self.pos += 1;
        }
    }

    /// A name with any leading `\` removed.
    fn name(&mut self) -> Option<String> {
        let token = self.peek()?;
        let name = match token.kind() {
            TokenKind::Ident | TokenKind::QualifiedName => token.text(),
            TokenKind::FullyQualifiedName => token.text().trim_start_matches('\\'),
            _ => return None,
        };
        self.pos += 1;
        Some(name.to_string())
    }

    fn alias(&mut self) -> Result<Option<String>, &'static str> {
        if !self.eat(TokenKind::As) {
            return Ok(None);
        }
        match self.peek() {
            Some(t) if t.kind().is_identifier_like() && !t.text().contains('\\') => {
                let alias = t.text().to_string();
                self.pos += 1;
                Ok(Some(alias))
            }
            _ => Err("expected an alias after `as`"),
        }
    }

    /// Members of `Prefix\{ ... }` up to and including the `}`.
    fn group(&mut self, prefix: &str, imports: &mut Vec<Import>) -> Result<(), &'static str> {
        loop {
            if self.eat(TokenKind::CloseBrace) {
                return Ok(());
            }
            self.import_kind();
            let inner = match self.peek() {
                Some(t) if t.is(TokenKind::FullyQualifiedName) => {
                    return Err("group member cannot be fully qualified");
                }
                _ => self.name().ok_or("expected a group member")?,
            };
            let alias = self.alias()?;
            imports.push((
                alias.unwrap_or_else(|| last_segment(&inner)),
                format!("{prefix}\\{inner}"),
            ));
            if self.eat(TokenKind::Comma) {
                continue;
            }
            if self.eat(TokenKind::CloseBrace) {
                return Ok(());
            }
            return Err("expected `,` or `}` in group");
        }
    }
}
