//! Names that look like calls but must never be redirected.

/// Language constructs, reserved words and scope-inspecting builtins.
///
/// Stored lowercase; PHP names compare case-insensitively.
pub(crate) const BLACKLIST: &[&str] = &[
    "__halt_compiler",
    "abstract",
    "and",
    "array",
    "as",
    "break",
    "callable",
    "case",
    "catch",
    "class",
    "clone",
    "compact",
    "const",
    "continue",
    "declare",
    "default",
    "die",
    "do",
    "echo",
    "else",
    "elseif",
    "empty",
    "enddeclare",
    "endfor",
    "endforeach",
    "endif",
    "endswitch",
    "endwhile",
    "eval",
    "exit",
    "extends",
    "extract",
    "final",
    "finally",
    "fn",
    "for",
    "foreach",
    "func_get_arg",
    "func_get_args",
    "func_num_args",
    "function",
    "get_defined_vars",
    "global",
    "goto",
    "if",
    "implements",
    "include",
    "include_once",
    "instanceof",
    "insteadof",
    "interface",
    "isset",
    "list",
    "match",
    "namespace",
    "new",
    "or",
    "parent",
    "print",
    "private",
    "protected",
    "public",
    "readonly",
    "require",
    "require_once",
    "return",
    "self",
    "static",
    "switch",
    "throw",
    "trait",
    "try",
    "unset",
    "use",
    "var",
    "while",
    "xor",
    "yield",
];

/// Builtins whose behavior depends on the calling frame.
pub(crate) const UNSUPPORTED: &[&str] = &[
    "compact",
    "extract",
    "func_get_arg",
    "func_get_args",
    "func_num_args",
    "get_defined_vars",
];
