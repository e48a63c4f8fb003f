//! Node kinds, flags and per-node payload.

use std::collections::BTreeMap;

use bitflags::bitflags;

use crate::{NodeId, UseMap};

/// Flavour of a class-like declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Trait,
    Enum,
}

/// Opaque fragments that are never rewritten.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    String,
    Heredoc,
    Comment,
    DocComment,
}

/// What a node stands for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The file itself. Always [`NodeId::ROOT`].
    Root,
    /// `namespace Foo;` or `namespace Foo { ... }`.
    Namespace,
    /// A namespace-level `use` import statement.
    Use,
    Class(ClassKind),
    /// Named function, method or closure.
    Function,
    /// Plain code, open/close tags and inline HTML.
    Code,
    Literal(LiteralKind),
}

impl NodeKind {
    /// One-letter tag used by parser debug dumps.
    pub const fn abbr(self) -> char {
        match self {
            NodeKind::Root => 'F',
            NodeKind::Namespace => 'N',
            NodeKind::Use => 'U',
            NodeKind::Class(ClassKind::Class) => 'C',
            NodeKind::Class(ClassKind::Interface) => 'I',
            NodeKind::Class(ClassKind::Trait) => 'T',
            NodeKind::Class(ClassKind::Enum) => 'E',
            NodeKind::Function => 'f',
            NodeKind::Code => 'c',
            NodeKind::Literal(LiteralKind::String | LiteralKind::Heredoc) => 's',
            NodeKind::Literal(LiteralKind::Comment | LiteralKind::DocComment) => '#',
        }
    }

    #[inline]
    pub const fn is_class_like(self) -> bool {
        matches!(self, NodeKind::Class(_))
    }
}

bitflags! {
    /// Per-node properties set by the parser and consulted by patchers.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct NodeFlags: u16 {
        /// Anonymous function.
        const CLOSURE = 1 << 0;
        /// Function declared directly in a class-like body.
        const METHOD = 1 << 1;
        /// Function whose own body contains `yield`.
        const GENERATOR = 1 << 2;
        /// `final` modifier present.
        const FINAL = 1 << 3;
        /// `abstract` modifier present.
        const ABSTRACT = 1 << 4;
        /// Declaration has a `{ ... }` body (not `;`).
        const HAS_BODY = 1 << 5;
        /// Statement eligible for line coverage.
        const COVERABLE = 1 << 6;
        /// Fragment sits between PHP tags.
        const IN_PHP = 1 << 7;
        /// Patchers may rewrite this fragment.
        const PROCESSABLE = 1 << 8;
        /// Injected by a patcher, not present in the source.
        const SYNTHETIC = 1 << 9;
        /// Declared return type is `void`.
        const RETURNS_VOID = 1 << 10;
        /// Declared return type is `never`.
        const RETURNS_NEVER = 1 << 11;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        NodeFlags::IN_PHP | NodeFlags::PROCESSABLE
    }
}

/// One declared parameter of a function node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Param {
    /// Variable token text, e.g. `$name`.
    pub name: String,
    /// Raw default expression after `=`, or empty.
    pub default: String,
}

/// Source text of one line and the nodes whose extent overlaps it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineContent {
    pub body: String,
    pub nodes: Vec<NodeId>,
}

/// Line extent of a node.
///
/// `content` is only populated on the root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Lines {
    /// First significant line, `None` for nodes without tokens.
    pub start: Option<u32>,
    pub stop: u32,
    pub content: BTreeMap<u32, LineContent>,
}

impl Lines {
    /// Extent covering `start..=stop`.
    pub fn span(start: u32, stop: u32) -> Self {
        Lines {
            start: Some(start),
            stop,
            content: BTreeMap::new(),
        }
    }

    /// Whether `line` falls within the extent.
    pub fn contains(&self, line: u32) -> bool {
        self.start.is_some_and(|start| start <= line && line <= self.stop)
    }
}

/// A node of the concrete tree.
///
/// The text of a node is `body`, then the text of each child in order,
/// then `close`. Structural links (`children`, `parent`) are maintained by
/// [`NodeTree`](crate::NodeTree); everything else is free for patchers to
/// rewrite.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    /// Leading fragment, e.g. `class Foo {`.
    pub body: String,
    /// Trailing fragment, e.g. `}`.
    pub close: String,
    /// Declared identifier, or the namespace name on namespace nodes.
    pub name: String,
    pub flags: NodeFlags,
    pub args: Vec<Param>,
    /// Import aliases, on namespace nodes and on the root of namespace-less
    /// files.
    pub uses: UseMap,
    pub lines: Lines,
    /// Nearest enclosing namespace.
    pub namespace: Option<NodeId>,
    /// Nearest enclosing function.
    pub function: Option<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    /// A detached node with default flags and empty fragments.
    pub fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            body: String::new(),
            close: String::new(),
            name: String::new(),
            flags: NodeFlags::default(),
            args: Vec::new(),
            uses: UseMap::default(),
            lines: Lines::default(),
            namespace: None,
            function: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Plain code node holding `body`.
    pub fn code(body: impl Into<String>) -> Self {
        Node {
            body: body.into(),
            ..Node::new(NodeKind::Code)
        }
    }

    /// Code injected by a patcher on `line`.
    ///
    /// Synthetic nodes are never processable, so later patchers in the
    /// chain leave them alone.
    pub fn synthetic(body: impl Into<String>, line: Option<u32>) -> Self {
        let mut node = Node::code(body);
        node.flags = NodeFlags::IN_PHP | NodeFlags::SYNTHETIC;
        if let Some(line) = line {
            node.lines = Lines::span(line, line);
        }
        node
    }

    /// Debug-dump tag: the kind abbreviation, `h` for inline HTML.
    pub fn abbr(&self) -> char {
        if self.kind == NodeKind::Code && !self.has(NodeFlags::IN_PHP) {
            'h'
        } else {
            self.kind.abbr()
        }
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn has(&self, flags: NodeFlags) -> bool {
        self.flags.contains(flags)
    }

    /// In-PHP code a patcher may rewrite.
    #[inline]
    pub fn is_patchable_code(&self) -> bool {
        self.kind == NodeKind::Code && self.has(NodeFlags::IN_PHP | NodeFlags::PROCESSABLE)
    }

    /// Named function or method with a body.
    #[inline]
    pub fn is_named_function(&self) -> bool {
        self.kind == NodeKind::Function
            && self.has(NodeFlags::HAS_BODY)
            && !self.has(NodeFlags::CLOSURE)
    }
}
