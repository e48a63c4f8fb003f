use jit_ir::{ClassKind, LiteralKind, NodeFlags, NodeId, NodeKind, NodeTree, Param};
use jit_lexer::Bracket;
use pretty_assertions::assert_eq;

use crate::{parse, unparse, ParseError};

fn parsed(source: &str) -> NodeTree {
    match parse(source) {
        Ok(tree) => tree,
        Err(err) => panic!("parse failed: {err}"),
    }
}

fn nodes_of(tree: &NodeTree, pred: impl Fn(NodeKind) -> bool) -> Vec<NodeId> {
    tree.preorder(tree.root())
        .filter(|&id| pred(tree[id].kind))
        .collect()
}

fn functions(tree: &NodeTree) -> Vec<NodeId> {
    nodes_of(tree, |k| k == NodeKind::Function)
}

fn by_name(tree: &NodeTree, name: &str) -> NodeId {
    match tree
        .preorder(tree.root())
        .find(|&id| tree[id].name == name)
    {
        Some(id) => id,
        None => panic!("no node named {name}"),
    }
}

// === Round trip & shape ===

#[test]
fn class_with_method_round_trips() {
    let src = "<?php class Foo { public function bar() { return 1; } }";
    let tree = parsed(src);
    assert_eq!(unparse(&tree), src);

    let root = tree.children(tree.root());
    assert_eq!(root.len(), 2);
    assert_eq!(tree[root[0]].body, "<?php ");

    let class = root[1];
    assert_eq!(tree[class].kind, NodeKind::Class(ClassKind::Class));
    assert_eq!(tree[class].name, "Foo");
    assert_eq!(tree[class].body, "class Foo {");
    assert_eq!(tree[class].close, "}");

    let method = by_name(&tree, "bar");
    assert_eq!(tree.parent(method), Some(class));
    assert_eq!(tree[method].body, "public function bar() {");
    assert!(tree[method].has(NodeFlags::METHOD | NodeFlags::HAS_BODY));
    assert!(!tree[method].has(NodeFlags::CLOSURE));

    let body: Vec<&str> = tree
        .children(method)
        .iter()
        .map(|&id| tree[id].body.as_str())
        .collect();
    assert_eq!(body, vec![" return 1;", " "]);
}

#[test]
fn empty_and_html_only_sources() {
    for src in ["", "just html\n", "<?php", "<?php\n"] {
        assert_eq!(unparse(&parsed(src)), src);
    }
}

#[test]
fn tags_and_inline_html_are_separate_nodes() {
    let tree = parsed("<h1><?= $t ?></h1>");
    let kids: Vec<(String, NodeFlags)> = tree
        .children(tree.root())
        .iter()
        .map(|&id| (tree[id].body.clone(), tree[id].flags))
        .collect();
    assert_eq!(
        kids,
        vec![
            ("<h1>".to_string(), NodeFlags::empty()),
            ("<?=".to_string(), NodeFlags::IN_PHP),
            (" $t ".to_string(), NodeFlags::IN_PHP | NodeFlags::PROCESSABLE | NodeFlags::COVERABLE),
            ("?>".to_string(), NodeFlags::IN_PHP),
            ("</h1>".to_string(), NodeFlags::empty()),
        ]
    );
}

#[test]
fn literals_are_opaque_nodes() {
    let src = "<?php\n/** doc */\n$a = 'rand(2, 5)'; // tail\n$b = <<<EOT\n{ function x() {\nEOT;\n";
    let tree = parsed(src);
    assert_eq!(unparse(&tree), src);
    assert!(functions(&tree).is_empty());

    let literals: Vec<(LiteralKind, bool)> = tree
        .preorder(tree.root())
        .filter_map(|id| match tree[id].kind {
            NodeKind::Literal(kind) => Some((kind, tree[id].has(NodeFlags::PROCESSABLE))),
            _ => None,
        })
        .collect();
    assert_eq!(
        literals,
        vec![
            (LiteralKind::DocComment, false),
            (LiteralKind::String, false),
            (LiteralKind::Comment, false),
            (LiteralKind::Heredoc, false),
        ]
    );
}

// === Namespaces ===

#[test]
fn unbraced_namespaces_close_each_other() {
    let src = "<?php\nnamespace A;\nfunction f() {}\nnamespace B\\C;\nclass D {}\n";
    let tree = parsed(src);
    assert_eq!(unparse(&tree), src);

    let namespaces = nodes_of(&tree, |k| k == NodeKind::Namespace);
    assert_eq!(namespaces.len(), 2);
    assert_eq!(tree[namespaces[0]].name, "A");
    assert_eq!(tree[namespaces[0]].body, "namespace A;");
    assert_eq!(tree[namespaces[0]].close, "");
    assert_eq!(tree[namespaces[1]].name, "B\\C");
    assert_eq!(tree.parent(namespaces[1]), Some(tree.root()));

    let f = by_name(&tree, "f");
    assert_eq!(tree[f].namespace, Some(namespaces[0]));
    assert_eq!(tree.qualified_name(f), "A\\f");
    assert_eq!(tree.qualified_name(by_name(&tree, "D")), "B\\C\\D");
}

#[test]
fn braced_namespaces_including_global() {
    let src = "<?php namespace A { function f() {} } namespace { g(); }";
    let tree = parsed(src);
    assert_eq!(unparse(&tree), src);
    let namespaces = nodes_of(&tree, |k| k == NodeKind::Namespace);
    assert_eq!(namespaces.len(), 2);
    assert_eq!(tree[namespaces[0]].close, "}");
    assert_eq!(tree[namespaces[1]].name, "");
    assert_eq!(tree[namespaces[1]].body, "namespace {");
}

#[test]
fn keyword_namespace_names() {
    for (src, name) in [
        ("<?php namespace Match;\nfunction f() {}", "Match"),
        ("<?php namespace Final;\nfunction f() {}", "Final"),
    ] {
        let tree = parsed(src);
        assert_eq!(unparse(&tree), src);
        let namespaces = nodes_of(&tree, |k| k == NodeKind::Namespace);
        assert_eq!(namespaces.len(), 1, "{src}");
        assert_eq!(tree[namespaces[0]].name, name);
    }
}

#[test]
fn relative_name_is_not_a_declaration() {
    let src = "<?php namespace\\foo();";
    let tree = parsed(src);
    assert!(nodes_of(&tree, |k| k == NodeKind::Namespace).is_empty());
    assert_eq!(unparse(&tree), src);
}

// === Use imports ===

#[test]
fn use_clauses_populate_namespace_aliases() {
    let src = "<?php\nnamespace App;\nuse Foo\\Bar;\nuse Baz\\Qux as Q, \\Top;\nuse function Lib\\helper;\nuse Grp\\{One, Two\\Three as T,};\n";
    let tree = parsed(src);
    assert_eq!(unparse(&tree), src);

    let ns = nodes_of(&tree, |k| k == NodeKind::Namespace)[0];
    let mut uses: Vec<(&str, &str)> = tree[ns]
        .uses
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    uses.sort_unstable();
    assert_eq!(
        uses,
        vec![
            ("Bar", "Foo\\Bar"),
            ("One", "Grp\\One"),
            ("Q", "Baz\\Qux"),
            ("T", "Grp\\Two\\Three"),
            ("Top", "Top"),
            ("helper", "Lib\\helper"),
        ]
    );
    assert_eq!(nodes_of(&tree, |k| k == NodeKind::Use).len(), 4);
}

#[test]
fn use_without_namespace_lands_on_root() {
    let tree = parsed("<?php use kahlan\\A as F;");
    assert_eq!(
        tree[tree.root()].uses.get("F").map(String::as_str),
        Some("kahlan\\A")
    );
}

#[test]
fn malformed_use_is_kept_as_code() {
    let src = "<?php use Foo as ; use Bar\\{A B};";
    let tree = parsed(src);
    assert_eq!(unparse(&tree), src);
    assert!(nodes_of(&tree, |k| k == NodeKind::Use).is_empty());
    assert!(tree[tree.root()].uses.is_empty());
    let code: Vec<&str> = tree
        .children(tree.root())
        .iter()
        .map(|&id| tree[id].body.as_str())
        .collect();
    assert_eq!(code, vec!["<?php ", "use Foo as ;", " use Bar\\{A B};"]);
}

#[test]
fn trait_use_inside_class_is_code() {
    let tree = parsed("<?php class A { use T; }");
    assert!(nodes_of(&tree, |k| k == NodeKind::Use).is_empty());
    assert!(tree[tree.root()].uses.is_empty());
}

// === Functions ===

#[test]
fn parameters_are_split_on_top_level_commas() {
    let tree = parsed("<?php function f($a, array $b = [1, 2], &$c = null, ...$rest) {}");
    let f = by_name(&tree, "f");
    let param = |name: &str, default: &str| Param {
        name: name.to_string(),
        default: default.to_string(),
    };
    assert_eq!(
        tree[f].args,
        vec![
            param("$a", ""),
            param("$b", "[1, 2]"),
            param("$c", "null"),
            param("$rest", ""),
        ]
    );
}

#[test]
fn defaults_with_calls_and_strings() {
    let tree = parsed("<?php function f($a = foo(1, 2), $b = 'x, y',) {}");
    let f = by_name(&tree, "f");
    let defaults: Vec<&str> = tree[f].args.iter().map(|p| p.default.as_str()).collect();
    assert_eq!(defaults, vec!["foo(1, 2)", "'x, y'"]);
}

#[test]
fn closures_and_generators() {
    let src = "<?php function gen() { $f = function() use ($x) { yield 1; }; return 2; }\nfunction g2() { yield 1; }";
    let tree = parsed(src);
    assert_eq!(unparse(&tree), src);

    let gen = by_name(&tree, "gen");
    assert!(!tree[gen].has(NodeFlags::GENERATOR));
    assert!(tree[by_name(&tree, "g2")].has(NodeFlags::GENERATOR));

    let closure = functions(&tree)
        .into_iter()
        .find(|&id| tree[id].has(NodeFlags::CLOSURE));
    let Some(closure) = closure else {
        panic!("closure not found");
    };
    assert!(tree[closure].has(NodeFlags::GENERATOR));
    assert_eq!(tree[closure].body, "function() use ($x) {");
    assert_eq!(tree[closure].function, Some(gen));
}

#[test]
fn yield_inside_arrow_function_is_not_the_enclosing_generator() {
    let src = "<?php function f() { $g = fn() => yield 1; $h = array_map(fn($x) => $x, [1]); return 5; }\nfunction g() { $a = fn() => 1; yield 2; }";
    let tree = parsed(src);
    assert_eq!(unparse(&tree), src);
    assert!(!tree[by_name(&tree, "f")].has(NodeFlags::GENERATOR));
    assert!(tree[by_name(&tree, "g")].has(NodeFlags::GENERATOR));
}

#[test]
fn closure_inside_arrow_function_tracks_its_own_yield() {
    let src = "<?php function f() { $g = fn() => function () { yield 1; }; }";
    let tree = parsed(src);
    assert!(!tree[by_name(&tree, "f")].has(NodeFlags::GENERATOR));
    let closure = functions(&tree)
        .into_iter()
        .find(|&id| tree[id].has(NodeFlags::CLOSURE));
    let Some(closure) = closure else {
        panic!("closure not found");
    };
    assert!(tree[closure].has(NodeFlags::GENERATOR));
}

#[test]
fn void_and_never_return_types() {
    let src = "<?php class A {\n  function a(): void {}\n  function b(): never { exit; }\n  function c(): ?int { return 1; }\n  abstract function d(): VOID;\n}\n$f = function () use ($x): void {};";
    let tree = parsed(src);
    assert_eq!(unparse(&tree), src);
    assert!(tree[by_name(&tree, "a")].has(NodeFlags::RETURNS_VOID));
    assert!(tree[by_name(&tree, "b")].has(NodeFlags::RETURNS_NEVER));
    let c = &tree[by_name(&tree, "c")];
    assert!(!c.has(NodeFlags::RETURNS_VOID) && !c.has(NodeFlags::RETURNS_NEVER));
    assert!(tree[by_name(&tree, "d")].has(NodeFlags::RETURNS_VOID));
    let closure = functions(&tree)
        .into_iter()
        .find(|&id| tree[id].has(NodeFlags::CLOSURE));
    assert!(closure.is_some_and(|id| tree[id].has(NodeFlags::RETURNS_VOID)));
}

#[test]
fn interpolated_braces_do_not_close_the_function() {
    let src = "<?php\nfunction f() {\n    $s = \"{$m(\"}\")}\";\n    rand();\n}\n";
    let tree = parsed(src);
    assert_eq!(unparse(&tree), src);
    let f = by_name(&tree, "f");
    assert_eq!(tree[f].lines.start, Some(2));
    assert_eq!(tree[f].lines.stop, 5);
}

#[test]
fn closures_inside_array_literals() {
    let src = "<?php $map = [\n  'a' => function ($x) { return $x; },\n  'b' => static function () { return [1, 2]; },\n];\n";
    let tree = parsed(src);
    assert_eq!(unparse(&tree), src);
    let closures = functions(&tree);
    assert_eq!(closures.len(), 2);
    assert_eq!(tree[closures[1]].body, "static function () {");
}

#[test]
fn declarations_without_body() {
    let src = "<?php abstract class A { abstract public function f(); final public function g(): static {} }\ninterface I { function h(); }";
    let tree = parsed(src);
    assert_eq!(unparse(&tree), src);

    assert!(tree[by_name(&tree, "A")].has(NodeFlags::ABSTRACT));
    let f = by_name(&tree, "f");
    assert!(!tree[f].has(NodeFlags::HAS_BODY));
    assert!(tree[f].has(NodeFlags::ABSTRACT | NodeFlags::METHOD));
    assert_eq!(tree[f].body, "abstract public function f();");
    assert!(tree[by_name(&tree, "g")].has(NodeFlags::FINAL | NodeFlags::HAS_BODY));
    assert_eq!(
        tree[by_name(&tree, "I")].kind,
        NodeKind::Class(ClassKind::Interface)
    );
    assert!(tree[by_name(&tree, "h")].has(NodeFlags::METHOD));
}

#[test]
fn keyword_method_names() {
    let tree = parsed("<?php class A { function list() {} public static function new() {} }");
    assert!(tree[by_name(&tree, "list")].has(NodeFlags::METHOD));
    assert!(tree[by_name(&tree, "new")].has(NodeFlags::METHOD));
}

// === Classes ===

#[test]
fn class_constant_and_anonymous_class() {
    let src = "<?php $n = Foo::class; $o = new class(1) extends B { public $x; };";
    let tree = parsed(src);
    assert_eq!(unparse(&tree), src);
    let classes = nodes_of(&tree, NodeKind::is_class_like);
    assert_eq!(classes.len(), 1);
    assert_eq!(tree[classes[0]].name, "");
    assert_eq!(tree[classes[0]].body, "class(1) extends B {");
}

#[test]
fn final_modifier_is_pulled_into_class_body() {
    let tree = parsed("<?php\nfinal class Foo extends Bar implements Baz {}");
    let class = by_name(&tree, "Foo");
    assert_eq!(tree[class].body, "final class Foo extends Bar implements Baz {");
    assert!(tree[class].has(NodeFlags::FINAL));
}

#[test]
fn enums_and_traits() {
    let tree = parsed("<?php enum Suit: string { case H = 'h'; }\ntrait T {}\nenum(1);");
    assert_eq!(
        tree[by_name(&tree, "Suit")].kind,
        NodeKind::Class(ClassKind::Enum)
    );
    assert_eq!(tree[by_name(&tree, "T")].kind, NodeKind::Class(ClassKind::Trait));
    assert_eq!(nodes_of(&tree, NodeKind::is_class_like).len(), 2);
}

// === Coverage & lines ===

#[test]
fn coverable_statements() {
    let tree = parsed("<?php class A { public $x = 1; function f() { if ($a) { b(); } } }");
    let coverable: Vec<&str> = tree
        .preorder(tree.root())
        .filter(|&id| tree[id].has(NodeFlags::COVERABLE))
        .map(|id| tree[id].body.as_str())
        .collect();
    assert_eq!(coverable, vec![" if ($a) {", " b();"]);
}

#[test]
fn line_extents() {
    let src = "<?php\nclass A\n{\n    function f()\n    {\n        return 1;\n    }\n}\n";
    let tree = parsed(src);
    let class = by_name(&tree, "A");
    assert_eq!((tree[class].lines.start, tree[class].lines.stop), (Some(2), 8));
    let f = by_name(&tree, "f");
    assert_eq!((tree[f].lines.start, tree[f].lines.stop), (Some(4), 7));

    let content = &tree[tree.root()].lines.content;
    assert_eq!(content.len(), 8);
    assert_eq!(content.get(&6).map(|c| c.body.as_str()), Some("        return 1;"));
    assert_eq!(content.get(&6).map(|c| c.nodes.len()), Some(4));
}

// === Errors ===

#[test]
fn unclosed_constructs_are_errors() {
    assert_eq!(
        parse("<?php class A {").err(),
        Some(ParseError::UnbalancedBracket {
            open: Bracket::Curly,
            line: 1
        })
    );
    assert_eq!(
        parse("<?php\nfunction f($a {").err(),
        Some(ParseError::UnbalancedBracket {
            open: Bracket::Paren,
            line: 2
        })
    );
    assert_eq!(
        parse("<?php\n\nnamespace A {\n").err(),
        Some(ParseError::UnbalancedBracket {
            open: Bracket::Curly,
            line: 3
        })
    );
}

#[test]
fn stray_closing_brace_is_code() {
    let src = "<?php } foo();";
    assert_eq!(unparse(&parsed(src)), src);
}
