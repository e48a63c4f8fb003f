use super::*;
use jit_parse::{parse, unparse};
use pretty_assertions::assert_eq;

fn patched(source: &str) -> String {
    let mut tree = parse(source).unwrap_or_else(|e| panic!("parse failed: {e}"));
    Monkey::default().process(&mut tree, None);
    unparse(&tree)
}

#[test]
fn function_call_in_namespaced_function() {
    let source = "<?php\nnamespace A;\nfunction f() {\n    rand(2, 5);\n}\n";
    assert_eq!(
        patched(source),
        "<?php\nnamespace A;\nfunction f() {\
         $__KMONKEY__0 = \\Kahlan\\Plugin\\Monkey::patched(__NAMESPACE__, 'rand', true);\
         \n    $__KMONKEY__0(2, 5);\n}\n"
    );
}

#[test]
fn interpolated_string_braces_keep_the_function_block() {
    let source = "<?php\nfunction f() {\n    $s = \"{$m(\"}\")}\";\n    rand();\n}\n";
    assert_eq!(
        patched(source),
        "<?php\nfunction f() {\
         $__KMONKEY__0 = \\Kahlan\\Plugin\\Monkey::patched(__NAMESPACE__, 'rand', true);\
         \n    $s = \"{$m(\"}\")}\";\n    $__KMONKEY__0();\n}\n"
    );
}

#[test]
fn line_count_is_preserved() {
    let source = "<?php\nnamespace A;\n\nfunction f() {\n    $a = time();\n    return new \\DateTime();\n}\n";
    let mut tree = parse(source).unwrap_or_else(|e| panic!("parse failed: {e}"));
    Monkey::default().process(&mut tree, None);
    let out = unparse(&tree);
    assert_eq!(out.lines().count(), source.lines().count());
    assert_eq!(tree.synthetic_lines(), vec![4]);
}

#[test]
fn one_variable_per_distinct_reference() {
    let source = "<?php\nfunction f() {\n    rand(); rand(); RAND(); \\rand();\n}\n";
    let out = patched(source);
    assert!(out.contains("$__KMONKEY__0(); $__KMONKEY__0(); $__KMONKEY__0(); $__KMONKEY__1();"));
    assert!(out.contains("$__KMONKEY__1 = \\Kahlan\\Plugin\\Monkey::patched(null, 'rand', true);"));
    assert_eq!(out.matches("Monkey::patched(").count(), 2);
}

#[test]
fn class_references() {
    let source = "<?php\nfunction f() {\n    $a = new Foo();\n    $b = Bar::create();\n    $c = Baz::class;\n    $d = new \\Qux;\n}\n";
    let out = patched(source);
    assert!(out.contains("$a = new $__KMONKEY__0();"));
    assert!(out.contains("$b = $__KMONKEY__1::create();"));
    assert!(out.contains("$c = Baz::class;"));
    assert!(out.contains("$d = new $__KMONKEY__2;"));
    assert!(out.contains("$__KMONKEY__0 = \\Kahlan\\Plugin\\Monkey::patched(__NAMESPACE__, 'Foo', false);"));
    assert!(out.contains("$__KMONKEY__2 = \\Kahlan\\Plugin\\Monkey::patched(null, 'Qux', false);"));
}

#[test]
fn aliases_resolve_to_fully_qualified_names() {
    let source = "<?php\nnamespace App;\nuse kahlan\\A as F;\nfunction g() {\n    return F::foo();\n}\n";
    let out = patched(source);
    assert!(out.contains("$__KMONKEY__0 = \\Kahlan\\Plugin\\Monkey::patched(null, 'kahlan\\A', false);"));
    assert!(out.contains("return $__KMONKEY__0::foo();"));
}

#[test]
fn qualified_names_expand_their_alias() {
    let source = "<?php\nuse Vendor\\Util;\nfunction g() {\n    Util\\helper();\n    Other\\thing();\n}\n";
    let out = patched(source);
    assert!(out.contains("patched(null, 'Vendor\\Util\\helper', true);"));
    assert!(out.contains("patched(__NAMESPACE__, 'Other\\thing', true);"));
}

#[test]
fn members_and_declarations_are_left_alone() {
    let source = "<?php\nfunction f($o) {\n    $o->rand();\n    $o?->time();\n    Foo::bar();\n}\n";
    let out = patched(source);
    assert!(out.contains("$o->rand();"));
    assert!(out.contains("$o?->time();"));
    assert!(out.contains("$__KMONKEY__0::bar();"));
    assert_eq!(out.matches("Monkey::patched(").count(), 1);
}

#[test]
fn strings_are_untouched() {
    let source = "<?php\nfunction f() {\n    $a = 'rand(2, 5)';\n    $b = \"rand(1)\";\n}\n";
    assert_eq!(patched(source), source);
}

#[test]
fn blacklisted_names_are_never_redirected() {
    for word in blacklist::BLACKLIST {
        for variant in [word.to_string(), word.to_ascii_uppercase()] {
            let source = format!("<?php\nfunction f() {{ {variant}(1); }}\n");
            let Ok(mut tree) = parse(&source) else {
                continue;
            };
            Monkey::default().process(&mut tree, None);
            let out = unparse(&tree);
            assert!(!out.contains("KMONKEY"), "{variant} was redirected: {out}");
        }
    }
}

#[test]
fn keyword_blocks_in_any_case() {
    for source in [
        "<?php\nfunction f() { TRY{} catch (E $e) {} }\n",
        "<?php\nfunction f() { try{} finally {} }\n",
        "<?php\nfunction f() { IF ($a) {} ELSEIF ($b) {} }\n",
    ] {
        let out = patched(source);
        assert!(!out.contains("'TRY'") && !out.contains("'try'"));
        assert!(!out.contains("'IF'") && !out.contains("'ELSEIF'"));
    }
}

#[test]
fn custom_blacklist_entries() {
    let mut monkey = Monkey::default();
    monkey.add_blacklist("Dump");
    assert!(monkey.is_blacklisted("dump"));
    assert!(monkey.is_blacklisted("\\DUMP"));
    let mut tree = parse("<?php\nfunction f() { dump(1); }\n").unwrap_or_default();
    monkey.process(&mut tree, None);
    assert_eq!(monkey.generated(), 0);
}

#[test]
fn file_level_assignments_follow_header() {
    let source = "<?php\ndeclare(strict_types=1);\n\nuse Foo\\Bar;\n\n$x = strlen('a');\n";
    let out = patched(source);
    assert_eq!(
        out,
        "<?php\ndeclare(strict_types=1);\n\nuse Foo\\Bar;\
         $__KMONKEY__0 = \\Kahlan\\Plugin\\Monkey::patched(__NAMESPACE__, 'strlen', true);\
         \n\n$x = $__KMONKEY__0('a');\n"
    );
}

#[test]
fn namespace_level_assignments() {
    let source = "<?php\nnamespace A {\n    echo time();\n}\n";
    let out = patched(source);
    assert!(out.starts_with("<?php\nnamespace A {$__KMONKEY__0 = "));
    assert!(out.contains("echo $__KMONKEY__0();"));
}

#[test]
fn class_bodies_and_attributes_are_skipped() {
    let source = "<?php\n#[Attribute(Attribute::TARGET_CLASS)]\nclass A {\n    const B = C::D;\n    public $e = [F::G];\n}\n";
    assert_eq!(patched(source), source);
}

#[test]
fn echo_tag_templates_are_skipped() {
    let source = "<p><?= strtoupper($name) ?></p>\n";
    assert_eq!(patched(source), source);
}

#[test]
fn counter_resets_per_file() {
    let mut monkey = Monkey::default();
    let mut a = parse("<?php\nfunction f() { a(); b(); }\n").unwrap_or_default();
    monkey.process(&mut a, None);
    assert_eq!(monkey.generated(), 2);
    let mut b = parse("<?php\nfunction g() { c(); }\n").unwrap_or_default();
    monkey.process(&mut b, None);
    assert_eq!(monkey.generated(), 1);
    assert!(unparse(&b).contains("$__KMONKEY__0 = "));
}

#[test]
fn closures_get_their_own_block() {
    let source = "<?php\nfunction f() {\n    return function () { return time(); };\n}\n";
    let out = patched(source);
    assert!(out.contains("function () {$__KMONKEY__0 = "));
    assert!(out.contains("return $__KMONKEY__0(); };"));
}
