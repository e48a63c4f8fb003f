//! Line-annotated tree dump for parser fixtures.
//!
//! One row per source line:
//!
//! ```text
//! #1     [           F,c           ] <?php
//! #2     [          F,N,c          ] namespace App;
//! ```
//!
//! The bracketed column lists the kind abbreviation of every node whose
//! extent overlaps the line, outermost first. Inline HTML shows as `h`.

use jit_ir::NodeTree;

use crate::{parse_with, ParseError, ParseOptions};

/// Parse `source` and render the annotated dump.
pub fn debug(source: &str) -> Result<String, ParseError> {
    let tree = parse_with(source, &ParseOptions::default().with_line_content(true))?;
    Ok(render(&tree))
}

pub(crate) fn render(tree: &NodeTree) -> String {
    let mut out = String::new();
    for (line, content) in &tree[tree.root()].lines.content {
        let kinds: Vec<String> = content
            .nodes
            .iter()
            .map(|&id| tree[id].abbr().to_string())
            .collect();
        out.push_str(&format!(
            "#{line:<6}[{:^25}] {}\n",
            kinds.join(","),
            content.body
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rows_per_line() {
        let out = debug("<?php\nfunction f() {\n    return 1;\n}\n").unwrap_or_default();
        let rows: Vec<&str> = out.lines().collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], format!("#1     [{:^25}] <?php", "F,c"));
        assert_eq!(rows[1], format!("#2     [{:^25}] function f() {{", "F,f"));
        assert_eq!(rows[2], format!("#3     [{:^25}]     return 1;", "F,f,c"));
        assert_eq!(rows[3], format!("#4     [{:^25}] }}", "F,f"));
    }

    #[test]
    fn literal_and_html_abbreviations() {
        let out = debug("<p>\n<?php // hi\n$a = 'x';").unwrap_or_default();
        let rows: Vec<&str> = out.lines().collect();
        assert!(rows[0].contains(&format!("[{:^25}]", "F,h")));
        assert!(rows[1].contains(&format!("[{:^25}]", "F,c,#")));
        assert!(rows[2].contains(&format!("[{:^25}]", "F,c,s,c")));
    }

    #[test]
    fn unbalanced_input_is_an_error() {
        assert!(debug("<?php class A {").is_err());
    }
}
