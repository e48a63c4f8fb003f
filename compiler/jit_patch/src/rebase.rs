//! Freezes `__DIR__` and `__FILE__` to the original source location.
//!
//! Patched code runs from the cache directory, so the magic constants would
//! otherwise point there.

use std::path::{Path, PathBuf};

use jit_ir::NodeTree;
use jit_lexer::TokenKind;
use tracing::trace;

use crate::fragment::{code_nodes, rewrite};
use crate::Patcher;

#[derive(Clone, Debug, Default)]
pub struct Rebase {
    path: Option<PathBuf>,
}

impl Rebase {
    pub fn new() -> Self {
        Rebase::default()
    }

    /// Always rebase onto `path`, whatever file is being processed.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Rebase {
            path: Some(path.into()),
        }
    }
}

impl Patcher for Rebase {
    fn process(&mut self, tree: &mut NodeTree, file: Option<&Path>) {
        let Some(path) = self.path.as_deref().or(file) else {
            return;
        };
        let file = quote(&path.to_string_lossy());
        let dir = quote(
            &path
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        trace!(path = %path.display(), "rebase");

        for id in code_nodes(tree) {
            let rewritten = rewrite(&tree[id].body, |stream, i| match stream[i].kind() {
                TokenKind::MagicDir => Some(dir.clone()),
                TokenKind::MagicFile => Some(file.clone()),
                _ => None,
            });
            if let Some(body) = rewritten {
                tree[id].body = body;
            }
        }
    }
}

/// Single-quoted PHP string literal for `text`.
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jit_parse::{parse, unparse};
    use pretty_assertions::assert_eq;

    fn patched(rebase: &mut Rebase, source: &str, file: Option<&Path>) -> String {
        let mut tree = parse(source).unwrap_or_else(|e| panic!("parse failed: {e}"));
        rebase.process(&mut tree, file);
        unparse(&tree)
    }

    #[test]
    fn magic_constants_use_the_processed_file() {
        let out = patched(
            &mut Rebase::new(),
            "<?php require __DIR__ . '/boot.php'; echo __FILE__;",
            Some(Path::new("/app/src/index.php")),
        );
        assert_eq!(
            out,
            "<?php require '/app/src' . '/boot.php'; echo '/app/src/index.php';"
        );
    }

    #[test]
    fn fixed_path_wins() {
        let out = patched(
            &mut Rebase::with_path("/fixed/a.php"),
            "<?php echo __DIR__;",
            Some(Path::new("/other/b.php")),
        );
        assert_eq!(out, "<?php echo '/fixed';");
    }

    #[test]
    fn without_a_path_nothing_changes() {
        let source = "<?php echo __DIR__;";
        assert_eq!(patched(&mut Rebase::new(), source, None), source);
    }

    #[test]
    fn quotes_are_escaped() {
        assert_eq!(quote("C:\\it's"), "'C:\\\\it\\'s'");
    }

    #[test]
    fn strings_and_members_are_untouched() {
        let source = "<?php echo '__DIR__'; $o->__FILE__;";
        let out = patched(&mut Rebase::new(), source, Some(Path::new("/a/b.php")));
        assert_eq!(out, source);
    }
}
