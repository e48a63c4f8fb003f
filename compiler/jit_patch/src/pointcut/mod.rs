//! Method-entry interception.
//!
//! Every function or method with a body gets a one-line preamble as its
//! first child. At runtime the hook decides whether to let the original
//! body run or to return a stubbed value instead.
//!
//! `void` functions discard the stubbed value; `never` functions cannot
//! return at all and are left alone.

use std::path::Path;

use jit_ir::{Node, NodeFlags, NodeId, NodeTree};
use tracing::{debug, trace};

use crate::fragment::insertion_line;
use crate::Patcher;

/// Pointcut configuration.
#[derive(Clone, Debug)]
pub struct PointcutOptions {
    /// Static call receiving `(name, self, args)`.
    pub hook: String,
    /// Infix of the generated variable names (`$__{prefix}_ARGS__`).
    pub prefix: String,
    /// Function and method names never instrumented (case-insensitive).
    pub exclude_names: Vec<String>,
    /// When non-empty, only classes under one of these prefixes are patched.
    pub include: Vec<String>,
    /// Classes under these prefixes are never patched.
    pub exclude: Vec<String>,
}

impl Default for PointcutOptions {
    fn default() -> Self {
        PointcutOptions {
            hook: "\\Kahlan\\Plugin\\Pointcut::before".to_string(),
            prefix: "KPOINTCUT".to_string(),
            exclude_names: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl PointcutOptions {
    #[must_use]
    pub fn with_hook(mut self, hook: impl Into<String>) -> Self {
        self.hook = hook.into();
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn exclude_name(mut self, name: impl Into<String>) -> Self {
        self.exclude_names.push(name.into());
        self
    }

    #[must_use]
    pub fn include_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.include.push(prefix.into());
        self
    }

    #[must_use]
    pub fn exclude_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.exclude.push(prefix.into());
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct Pointcut {
    options: PointcutOptions,
    patched: usize,
}

impl Pointcut {
    pub fn new(options: PointcutOptions) -> Self {
        Pointcut {
            options,
            patched: 0,
        }
    }

    pub fn options(&self) -> &PointcutOptions {
        &self.options
    }

    /// Functions instrumented by the last `process` call.
    pub fn patched(&self) -> usize {
        self.patched
    }

    fn excluded(&self, name: &str) -> bool {
        self.options
            .exclude_names
            .iter()
            .any(|n| n.eq_ignore_ascii_case(name))
    }

    /// One-line preamble for `node`.
    fn preamble(&self, node: &Node) -> String {
        let p = &self.options.prefix;
        let args = format!("$__{p}_ARGS__");
        let this = format!("$__{p}_SELF__");
        let ret = format!("$__{p}_RETURN__");

        let method = node.has(NodeFlags::METHOD);
        let self_expr = if method {
            "isset($this) ? $this : get_called_class()"
        } else {
            "null"
        };
        let name = if method { "__METHOD__" } else { "__FUNCTION__" };
        let call = format!("{ret}({args}, {this})");

        let bail = if node.has(NodeFlags::GENERATOR) {
            format!(
                "foreach ({call} as $__{p}_KEY__ => $__{p}_VALUE__) {{ yield $__{p}_KEY__ => $__{p}_VALUE__; }} return;"
            )
        } else if node.has(NodeFlags::RETURNS_VOID) {
            format!("{call}; return;")
        } else {
            format!("return {call};")
        };

        format!(
            "{args} = func_get_args(); {this} = {self_expr}; if ({ret} = {hook}({name}, {this}, {args})) {{ {bail} }}",
            hook = self.options.hook,
        )
    }
}

impl Patcher for Pointcut {
    fn process(&mut self, tree: &mut NodeTree, _file: Option<&Path>) {
        self.patched = 0;
        let targets: Vec<NodeId> = tree
            .preorder(tree.root())
            .filter(|&id| {
                let node = &tree[id];
                node.is_named_function()
                    && !node.has(NodeFlags::RETURNS_NEVER)
                    && !self.excluded(&node.name)
            })
            .collect();

        for id in targets {
            let line = insertion_line(tree, id, 0);
            let code = self.preamble(&tree[id]);
            trace!(function = %tree.qualified_name(id), line, "pointcut");
            tree.insert_child(id, 0, Node::synthetic(code, Some(line)));
            self.patched += 1;
        }
        debug!(patched = self.patched, "pointcut done");
    }

    fn patchable(&self, class: &str) -> bool {
        let class = class.trim_start_matches('\\');
        if self.options.exclude.iter().any(|p| class.starts_with(p.as_str())) {
            return false;
        }
        self.options.include.is_empty()
            || self
                .options
                .include
                .iter()
                .any(|p| class.starts_with(p.as_str()))
    }
}
