//! Named, ordered patcher chain.

use std::path::{Path, PathBuf};

use jit_ir::NodeTree;
use jit_parse::{parse_with, unparse, ParseError, ParseOptions};
use tracing::{debug, trace};

use crate::Patcher;

/// Patchers keyed by name, applied in insertion order.
///
/// Adding under an existing name replaces that patcher in place, so the
/// chain order is fixed by first registration.
#[derive(Default)]
pub struct Patchers {
    entries: Vec<(String, Box<dyn Patcher>)>,
}

impl Patchers {
    pub fn new() -> Self {
        Patchers::default()
    }

    /// Register `patcher` under `name`.
    pub fn add(&mut self, name: impl Into<String>, patcher: impl Patcher + 'static) {
        let name = name.into();
        let patcher: Box<dyn Patcher> = Box::new(patcher);
        match self.position(&name) {
            Some(i) => self.entries[i].1 = patcher,
            None => self.entries.push((name, patcher)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Patcher> {
        self.position(name).map(|i| self.entries[i].1.as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Patcher + 'static)> {
        match self.position(name) {
            Some(i) => Some(self.entries[i].1.as_mut()),
            None => None,
        }
    }

    /// Unregister `name`. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names in chain order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Parse `source`, run every patcher, unparse.
    ///
    /// # Errors
    ///
    /// Returns the parse error when `source` has unbalanced braces.
    pub fn process(&mut self, source: &str, file: Option<&Path>) -> Result<String, ParseError> {
        let options = ParseOptions::default().with_line_content(false);
        let mut tree = parse_with(source, &options)?;
        self.process_tree(&mut tree, file);
        Ok(unparse(&tree))
    }

    /// Run every patcher over an already parsed tree.
    pub fn process_tree(&mut self, tree: &mut NodeTree, file: Option<&Path>) {
        for (name, patcher) in &mut self.entries {
            trace!(patcher = %name, "running patcher");
            patcher.process(tree, file);
        }
        debug!(patchers = self.entries.len(), file = ?file, "patched");
    }

    /// Thread `resolved` through every patcher's `find_file`.
    pub fn find_file(&self, class: &str, resolved: &Path) -> PathBuf {
        self.entries
            .iter()
            .fold(resolved.to_path_buf(), |path, (_, patcher)| {
                patcher.find_file(class, &path)
            })
    }

    /// True only when every patcher accepts `class`.
    pub fn patchable(&self, class: &str) -> bool {
        self.entries
            .iter()
            .all(|(_, patcher)| patcher.patchable(class))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }
}

impl std::fmt::Debug for Patchers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FinalClass, Quit};
    use jit_ir::Node;
    use pretty_assertions::assert_eq;

    /// Appends a marker comment to the root.
    struct Marker(&'static str);

    impl Patcher for Marker {
        fn process(&mut self, tree: &mut NodeTree, _file: Option<&Path>) {
            let root = tree.root();
            tree.push_child(root, Node::synthetic(format!("/*{}*/", self.0), None));
        }

        fn find_file(&self, _class: &str, resolved: &Path) -> PathBuf {
            resolved.join(self.0)
        }

        fn patchable(&self, class: &str) -> bool {
            class != self.0
        }
    }

    #[test]
    fn registry_operations() {
        let mut patchers = Patchers::new();
        assert!(patchers.is_empty());
        patchers.add("final", FinalClass::new());
        patchers.add("quit", Quit::default());
        assert!(patchers.exists("quit"));
        assert!(patchers.get("final").is_some());
        assert!(patchers.get_mut("quit").is_some());
        assert_eq!(patchers.names().collect::<Vec<_>>(), vec!["final", "quit"]);

        assert!(patchers.remove("final"));
        assert!(!patchers.remove("final"));
        assert!(patchers.get("final").is_none());
        assert_eq!(patchers.len(), 1);

        patchers.clear();
        assert!(!patchers.exists("quit"));
    }

    #[test]
    fn patchers_run_in_order() {
        let mut patchers = Patchers::new();
        patchers.add("a", Marker("a"));
        patchers.add("b", Marker("b"));
        let out = patchers.process("<?php\n", None).unwrap_or_default();
        assert_eq!(out, "<?php\n/*a*//*b*/");
    }

    #[test]
    fn re_adding_keeps_position() {
        let mut patchers = Patchers::new();
        patchers.add("a", Marker("a"));
        patchers.add("b", Marker("b"));
        patchers.add("a", Marker("c"));
        assert_eq!(patchers.names().collect::<Vec<_>>(), vec!["a", "b"]);
        let out = patchers.process("<?php\n", None).unwrap_or_default();
        assert_eq!(out, "<?php\n/*c*//*b*/");
    }

    #[test]
    fn find_file_is_chained() {
        let mut patchers = Patchers::new();
        assert_eq!(patchers.find_file("X", Path::new("/src")), PathBuf::from("/src"));
        patchers.add("a", Marker("a"));
        patchers.add("b", Marker("b"));
        assert_eq!(
            patchers.find_file("X", Path::new("/src")),
            PathBuf::from("/src/a/b")
        );
    }

    #[test]
    fn patchable_requires_every_patcher() {
        let mut patchers = Patchers::new();
        assert!(patchers.patchable("a"));
        patchers.add("a", Marker("a"));
        patchers.add("b", Marker("b"));
        assert!(patchers.patchable("z"));
        assert!(!patchers.patchable("a"));
        assert!(!patchers.patchable("b"));
    }

    #[test]
    fn parse_errors_propagate() {
        let mut patchers = Patchers::new();
        patchers.add("quit", Quit::default());
        assert!(patchers.process("<?php\nfunction f() {\n", None).is_err());
    }
}
