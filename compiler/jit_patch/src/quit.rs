//! Routes `exit` and `die` through an interceptable hook.

use std::path::Path;

use jit_ir::NodeTree;
use jit_lexer::TokenKind;
use tracing::trace;

use crate::fragment::{code_nodes, next_kind, prev_kind, rewrite};
use crate::Patcher;

#[derive(Clone, Debug)]
pub struct QuitOptions {
    /// Static call replacing `exit`.
    pub hook: String,
}

impl Default for QuitOptions {
    fn default() -> Self {
        QuitOptions {
            hook: "\\Kahlan\\Plugin\\Quit::quit".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Quit {
    options: QuitOptions,
}

impl Quit {
    pub fn new(options: QuitOptions) -> Self {
        Quit { options }
    }
}

impl Patcher for Quit {
    fn process(&mut self, tree: &mut NodeTree, _file: Option<&Path>) {
        let hook = &self.options.hook;
        for id in code_nodes(tree) {
            let rewritten = rewrite(&tree[id].body, |stream, i| {
                if !stream[i].is(TokenKind::Exit) {
                    return None;
                }
                if matches!(
                    prev_kind(stream, i),
                    Some(
                        TokenKind::Arrow
                            | TokenKind::NullsafeArrow
                            | TokenKind::DoubleColon
                            | TokenKind::Function
                    )
                ) {
                    return None;
                }
                trace!(line = stream[i].line(), "quit");
                match next_kind(stream, i) {
                    Some((_, TokenKind::OpenParen)) => Some(hook.clone()),
                    _ => Some(format!("{hook}()")),
                }
            });
            if let Some(body) = rewritten {
                tree[id].body = body;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jit_parse::{parse, unparse};
    use pretty_assertions::assert_eq;

    fn patched(source: &str) -> String {
        let mut tree = parse(source).unwrap_or_else(|e| panic!("parse failed: {e}"));
        Quit::default().process(&mut tree, None);
        unparse(&tree)
    }

    #[test]
    fn exit_with_argument() {
        assert_eq!(patched("<?php exit(-1);"), "<?php \\Kahlan\\Plugin\\Quit::quit(-1);");
    }

    #[test]
    fn die_without_argument() {
        assert_eq!(patched("<?php die();"), "<?php \\Kahlan\\Plugin\\Quit::quit();");
        assert_eq!(patched("<?php exit;"), "<?php \\Kahlan\\Plugin\\Quit::quit();");
        assert_eq!(patched("<?php DIE ;"), "<?php \\Kahlan\\Plugin\\Quit::quit() ;");
    }

    #[test]
    fn lookalikes_are_unchanged() {
        let source = "<?php fooexit(); $instance->exit(); Foo::exit(); $s = 'exit();';";
        assert_eq!(patched(source), source);
    }

    #[test]
    fn method_named_exit_is_unchanged() {
        let source = "<?php\nclass A {\n    public function exit() { exit(1); }\n}\n";
        assert_eq!(
            patched(source),
            "<?php\nclass A {\n    public function exit() { \\Kahlan\\Plugin\\Quit::quit(1); }\n}\n"
        );
    }

    #[test]
    fn custom_hook() {
        let mut tree = parse("<?php exit(2);").unwrap_or_default();
        Quit::new(QuitOptions {
            hook: "my_exit".to_string(),
        })
        .process(&mut tree, None);
        assert_eq!(unparse(&tree), "<?php my_exit(2);");
    }
}
