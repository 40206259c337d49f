//! Turns TypeScript source into plain JavaScript the embedded engine can
//! run (spec §4.B "Transform source to executable form").
//!
//! This is a type-erasure pass, not a type checker: it deletes the syntax
//! that only TypeScript understands (type annotations, interfaces, type
//! aliases, generic parameter lists, accessibility modifiers, `as`/
//! `satisfies` assertions) and leaves everything else untouched, byte for
//! byte, so column offsets in any remaining diagnostics still line up with
//! the original file. The Source Analyzer (§4.A) already extracted the
//! catalog from the typed source directly; this pass only feeds the
//! execution engine.

use tree_sitter::{Node, Parser};

const ERASED_NODE_KINDS: &[&str] = &[
    "type_annotation",
    "type_parameters",
    "type_arguments",
    "type_alias_declaration",
    "interface_declaration",
    "definite_assignment_assertion",
];

const ERASED_TOKEN_KINDS: &[&str] = &["accessibility_modifier", "readonly", "abstract", "declare"];

fn make_parser() -> Parser {
    let mut parser = Parser::new();
    let language: tree_sitter::Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
    parser
        .set_language(&language)
        .expect("tree-sitter-typescript grammar loads");
    parser
}

fn blank(buf: &mut [u8], start: usize, end: usize) {
    for byte in &mut buf[start..end] {
        *byte = if *byte == b'\n' { b'\n' } else { b' ' };
    }
}

fn collect_erasures(node: Node, out: &mut Vec<(usize, usize)>) {
    if ERASED_NODE_KINDS.contains(&node.kind()) {
        out.push((node.start_byte(), node.end_byte()));
        return;
    }
    if ERASED_TOKEN_KINDS.contains(&node.kind()) {
        out.push((node.start_byte(), node.end_byte()));
    }
    if node.kind() == "as_expression" || node.kind() == "satisfies_expression" {
        if let Some(expr) = node.child(0) {
            out.push((expr.end_byte(), node.end_byte()));
        }
        return;
    }
    if node.kind() == "non_null_expression" {
        // `expr!` — erase the trailing `!` only.
        out.push((node.end_byte() - 1, node.end_byte()));
    }
    if (node.kind() == "export" || node.kind() == "default")
        && node.parent().map(|p| p.kind()) == Some("export_statement")
    {
        // `export default class X {}` → a plain class declaration: QuickJS
        // evaluates this runtime's photons as scripts, not ES modules.
        out.push((node.start_byte(), node.end_byte()));
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_erasures(child, out);
    }
}

/// Strips TypeScript-only syntax from `source`, returning plain JavaScript
/// of the same byte length.
pub fn strip_types(source: &str) -> anyhow::Result<String> {
    let mut parser = make_parser();
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| anyhow::anyhow!("tree-sitter failed to produce a parse tree"))?;

    let mut erasures = Vec::new();
    collect_erasures(tree.root_node(), &mut erasures);

    let mut buf = source.as_bytes().to_vec();
    for (start, end) in erasures {
        if end > start && end <= buf.len() {
            blank(&mut buf, start, end);
        }
    }

    Ok(String::from_utf8(buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_parameter_and_return_types() {
        let js = strip_types("function add(a: number, b: number): number { return a + b; }").unwrap();
        assert!(!js.contains(':'));
        assert!(js.contains("function add(a"));
    }

    #[test]
    fn strips_interface_declarations() {
        let js = strip_types("interface Foo { a: string }\nconst x = 1;").unwrap();
        assert!(js.contains("const x = 1;"));
        assert!(!js.contains("interface"));
    }

    #[test]
    fn strips_accessibility_modifiers() {
        let js = strip_types("class C { constructor(private apiKey: string) {} }").unwrap();
        assert!(!js.contains("private"));
    }

    #[test]
    fn strips_export_default_to_plain_class() {
        let js = strip_types("export default class Demo { echo() {} }").unwrap();
        assert!(!js.contains("export"));
        assert!(!js.contains("default"));
        assert!(js.contains("class Demo"));
    }

    #[test]
    fn preserves_byte_length() {
        let src = "const a: number = 1;";
        let js = strip_types(src).unwrap();
        assert_eq!(src.len(), js.len());
    }
}
